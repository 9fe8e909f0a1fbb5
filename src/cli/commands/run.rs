//! `ingest-harness <stage>`
//!
//! Wires the OS adapters into an orchestrator, runs the stage and reports.
//! The run races a deadline and Ctrl-C; on either, everything is stopped
//! and the partial report is printed as a failure.

use crate::application::{pipeline_catalog, Harness, Orchestrator, ReportOutput, RunnerOptions};
use crate::cli::output::{RunSummary, TableFormatter};
use crate::domain::models::{Component, Config};
use crate::infrastructure::backend::{DpnCluster, PharosBackend};
use crate::infrastructure::process::{OsProcessSupervisor, SupervisorSettings};
use crate::infrastructure::toolchain::{GoBuilder, GoTestRunner};
use crate::infrastructure::workspace::Workspace;
use anyhow::{Context, Result};
use chrono::Utc;
use std::time::Duration;
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct RunArgs {
    pub stage: String,
    pub json: bool,
    pub plan: bool,
    pub keep_workspace: bool,
}

enum Ending {
    Finished(bool),
    Interrupted(String),
}

/// Real adapters for every port, sharing one set of resolved settings.
pub fn os_harness(config: &Config, components: &[Component]) -> Harness {
    let settings = SupervisorSettings::from_config(config);
    let go = &config.toolchain.go_binary;

    Harness {
        supervisor: Box::new(OsProcessSupervisor::new(
            settings.clone(),
            Box::new(GoBuilder::new(settings.clone(), go.clone())),
            components,
        )),
        checks: Box::new(GoTestRunner::new(settings.clone(), go.clone())),
        backend: Box::new(PharosBackend::new(settings.clone(), config.backend.clone())),
        cluster: Box::new(DpnCluster::new(settings, config.cluster.clone())),
    }
}

/// Run a stage; `Ok(true)` when every recorded check passed.
pub async fn execute(args: RunArgs, config: Config) -> Result<bool> {
    let registry = pipeline_catalog::registry(&config).context("Invalid pipeline definition")?;

    if args.plan {
        let order = registry.execution_order(&args.stage)?;
        if args.json {
            println!("{}", serde_json::to_string_pretty(&order)?);
        } else {
            println!("{}", TableFormatter::new().format_plan(&order));
        }
        return Ok(true);
    }

    Workspace::from_paths(&config.paths)
        .prepare(!args.keep_workspace)
        .await
        .context("Failed to prepare workspace")?;

    let harness = os_harness(&config, registry.components());
    let options = RunnerOptions {
        report_output: if args.json {
            ReportOutput::Silent
        } else {
            ReportOutput::Stdout
        },
        revive_prerequisite_services: config.runner.revive_prerequisite_services,
    };
    let mut orchestrator = Orchestrator::new(registry, harness, options);

    let run_id = Uuid::new_v4();
    let started_at = Utc::now();
    let span = info_span!("run", run_id = %run_id, stage = %args.stage);
    let timeout = config.timing.run_timeout_secs.map(Duration::from_secs);

    let ending = async {
        info!("Starting harness run");
        let run = orchestrator.run(&args.stage, false);
        tokio::pin!(run);
        tokio::select! {
            result = &mut run => result.map(Ending::Finished),
            () = deadline(timeout) => Ok(Ending::Interrupted("run timeout elapsed".to_string())),
            signal = tokio::signal::ctrl_c() => {
                if let Err(e) = signal {
                    warn!(error = %e, "Could not listen for interrupt");
                }
                Ok(Ending::Interrupted("interrupted".to_string()))
            }
        }
    }
    .instrument(span.clone())
    .await?;

    let (passed, interrupted) = match ending {
        Ending::Finished(passed) => (passed, None),
        Ending::Interrupted(reason) => {
            async {
                warn!(reason = %reason, "Run stopped early, shutting everything down");
                orchestrator.shutdown().await;
            }
            .instrument(span)
            .await;
            if !args.json {
                println!("{}", orchestrator.report().render());
            }
            (false, Some(reason))
        }
    };

    if args.json {
        let summary = RunSummary::new(
            run_id,
            &args.stage,
            started_at,
            orchestrator.report(),
            orchestrator.stage_states(),
        )
        .with_outcome(passed, interrupted);
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        let states = orchestrator.stage_states();
        if !states.is_empty() {
            println!("{}", TableFormatter::new().format_states(&states));
        }
    }

    Ok(passed)
}

async fn deadline(timeout: Option<Duration>) {
    match timeout {
        Some(duration) => tokio::time::sleep(duration).await,
        None => std::future::pending().await,
    }
}
