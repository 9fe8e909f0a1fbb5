//! Ingest harness CLI entry point.

use std::process::ExitCode;

use clap::{CommandFactory, Parser};

use ingest_harness::application::pipeline_catalog;
use ingest_harness::cli::commands::{list, run};
use ingest_harness::cli::{Cli, EXIT_FAILURE, EXIT_USAGE};
use ingest_harness::domain::models::Config;
use ingest_harness::infrastructure::config::ConfigLoader;
use ingest_harness::infrastructure::logging::{LogConfig, LoggerImpl};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Stage names do not depend on configuration, so usage errors are
    // reported before any environment is required.
    let catalog = match pipeline_catalog::registry(&Config::default()) {
        Ok(registry) => registry,
        Err(err) => {
            eprintln!("Invalid pipeline definition: {err}");
            return ExitCode::from(EXIT_FAILURE);
        }
    };
    let usage = || list::usage(&Cli::command().render_usage().to_string(), &catalog);

    if cli.list {
        return match list::execute(&catalog, cli.json) {
            Ok(()) => ExitCode::SUCCESS,
            Err(err) => {
                eprintln!("Error: {err:#}");
                ExitCode::from(EXIT_FAILURE)
            }
        };
    }

    let Some(stage) = cli.stage.clone() else {
        eprintln!("{}", usage());
        return ExitCode::from(EXIT_USAGE);
    };
    if let Err(err) = catalog.stage(&stage) {
        eprintln!("{err}\n\n{}", usage());
        return ExitCode::from(EXIT_USAGE);
    }

    let mut config = match ConfigLoader::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("Configuration error: {err:#}");
            return ExitCode::from(EXIT_USAGE);
        }
    };
    if cli.initialize {
        config.cluster.initialize = true;
    }
    if cli.timeout.is_some() {
        config.timing.run_timeout_secs = cli.timeout;
    }

    let _logger = match LoggerImpl::init(&LogConfig::from_settings(&config.logging, cli.verbose)) {
        Ok(logger) => logger,
        Err(err) => {
            eprintln!("Failed to initialize logging: {err:#}");
            return ExitCode::from(EXIT_FAILURE);
        }
    };

    let args = run::RunArgs {
        stage,
        json: cli.json,
        plan: cli.plan,
        keep_workspace: cli.keep_workspace,
    };

    match run::execute(args, config).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(EXIT_FAILURE),
        Err(err) => {
            tracing::error!(error = %format!("{err:#}"), "Harness run failed");
            ExitCode::from(EXIT_FAILURE)
        }
    }
}
