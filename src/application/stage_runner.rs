//! Stage execution
//!
//! Runs one stage at a time: prerequisites, builds, starts, checks, and a
//! cleanup that happens on every exit path. Prerequisites run with
//! `more_stages_follow = true` so their services stay up for the dependent
//! stage instead of being torn down and bootstrapped again.

use crate::application::stage_registry::StageRegistry;
use crate::domain::errors::{HarnessError, HarnessResult};
use crate::domain::models::{Component, LifecycleKind, Stage, StageState, Step};
use crate::domain::ports::{CheckRunner, ClusterControl, ProcessSupervisor, RestBackend};
use crate::services::{ReadinessWatcher, ResultReport};
use futures::future::BoxFuture;
use futures::FutureExt;
use std::any::Any;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use tracing::{debug, error, info, info_span, warn, Instrument};

/// The external collaborators a stage drives.
pub struct Harness {
    pub supervisor: Box<dyn ProcessSupervisor>,
    pub checks: Box<dyn CheckRunner>,
    pub backend: Box<dyn RestBackend>,
    pub cluster: Box<dyn ClusterControl>,
}

/// Where the final report goes when the top-level stage finishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportOutput {
    #[default]
    Stdout,
    Silent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunnerOptions {
    pub report_output: ReportOutput,
    /// Restart services of a memoized prerequisite that have since died.
    pub revive_prerequisite_services: bool,
}

impl Default for RunnerOptions {
    fn default() -> Self {
        Self {
            report_output: ReportOutput::Stdout,
            revive_prerequisite_services: true,
        }
    }
}

/// Executes stages against a [`Harness`] and accumulates their outcomes.
pub struct StageRunner {
    harness: Harness,
    options: RunnerOptions,
    watcher: ReadinessWatcher,
    report: ResultReport,
    states: HashMap<String, StageState>,
    in_progress: Vec<String>,
}

impl StageRunner {
    pub fn new(harness: Harness, options: RunnerOptions) -> Self {
        Self {
            harness,
            options,
            watcher: ReadinessWatcher::new(),
            report: ResultReport::new(),
            states: HashMap::new(),
            in_progress: Vec::new(),
        }
    }

    pub const fn report(&self) -> &ResultReport {
        &self.report
    }

    pub fn state(&self, stage: &str) -> StageState {
        self.states.get(stage).copied().unwrap_or(StageState::Pending)
    }

    /// One-time check preparation; failure is logged and the run continues.
    pub async fn prepare(&mut self) {
        if let Err(e) = self.harness.checks.prepare().await {
            warn!(error = %e, "Check preparation failed");
        }
    }

    /// Outcome of a stage that already ran in this process, if any.
    ///
    /// A stage counts as run once its memo check has a recorded outcome
    /// or it reached a terminal state. The outcome is the same aggregate a
    /// fresh run returns: false if the stage did not complete, otherwise
    /// whether everything recorded so far passed.
    pub fn memoized_outcome(&self, stage: &Stage) -> Option<bool> {
        let state = self.state(stage.name());
        if !self.report.contains(stage.memo_key()) && !state.is_terminal() {
            return None;
        }

        match state {
            StageState::Skipped | StageState::Aborted => Some(false),
            _ => Some(self.report.all_passed()),
        }
    }

    /// Run a stage and everything it depends on.
    ///
    /// Never fails: aborts and panics inside the stage become a `false`
    /// outcome. When `more_stages_follow` is false every process is stopped
    /// and the report is emitted before returning.
    pub fn run_stage<'a>(
        &'a mut self,
        registry: &'a StageRegistry,
        stage: &'a Stage,
        more_stages_follow: bool,
    ) -> BoxFuture<'a, bool> {
        let span = info_span!("stage", stage = %stage.name(), more_stages_follow);

        async move {
            if let Some(outcome) = self.memoized_outcome(stage) {
                info!(outcome, "Stage already ran, reusing recorded outcome");
                return self.finish(more_stages_follow, outcome).await;
            }

            if let Some(pos) = self.in_progress.iter().position(|n| n == stage.name()) {
                let mut cycle = self.in_progress[pos..].to_vec();
                cycle.push(stage.name().to_string());
                let err = HarnessError::DependencyCycle(cycle);
                error!(error = %err, "Refusing to re-enter stage");
                return false;
            }

            self.in_progress.push(stage.name().to_string());
            self.states
                .insert(stage.name().to_string(), StageState::Running);
            info!(description = stage.description(), "Running stage");

            let state = match self.resolve_prerequisites(registry, stage).await {
                Err(e) => {
                    warn!(error = %e, "Skipping {} because of prior failures", stage.name());
                    StageState::Skipped
                }
                Ok(memoized) => {
                    let body = AssertUnwindSafe(self.execute(registry, stage, &memoized))
                        .catch_unwind()
                        .await;
                    match body {
                        Ok(Ok(())) => {
                            let passed = stage
                                .check_names()
                                .all(|name| self.report.get(name) == Some(true));
                            if passed {
                                StageState::Passed
                            } else {
                                StageState::Failed
                            }
                        }
                        Ok(Err(e)) => {
                            error!(error = %e, "Stage aborted");
                            StageState::Aborted
                        }
                        Err(panic) => {
                            error!(panic = %panic_message(panic.as_ref()), "Stage panicked");
                            StageState::Aborted
                        }
                    }
                }
            };

            self.states.insert(stage.name().to_string(), state);
            self.in_progress.pop();
            info!(state = %state, "Stage finished");

            let completed = matches!(state, StageState::Passed | StageState::Failed);
            let outcome = completed && self.report.all_passed();
            self.finish(more_stages_follow, outcome).await
        }
        .instrument(span)
        .boxed()
    }

    /// Stop everything this runner started, workers first.
    pub async fn shutdown(&mut self) {
        info!("Stopping all services");
        self.harness.supervisor.stop_all().await;
        self.harness.cluster.stop().await;
    }

    async fn finish(&mut self, more_stages_follow: bool, outcome: bool) -> bool {
        if !more_stages_follow {
            self.shutdown().await;
            if self.options.report_output == ReportOutput::Stdout {
                println!("{}", self.report.render());
            }
        }
        outcome
    }

    /// Run prerequisites not yet run; returns the ones that were memoized.
    async fn resolve_prerequisites<'a>(
        &mut self,
        registry: &'a StageRegistry,
        stage: &Stage,
    ) -> HarnessResult<Vec<&'a Stage>> {
        let mut memoized = Vec::new();

        for name in stage.prerequisites() {
            let prereq = registry.stage(name)?;
            let passed = if let Some(outcome) = self.memoized_outcome(prereq) {
                debug!(prerequisite = %name, outcome, "Prerequisite already ran");
                memoized.push(prereq);
                outcome
            } else {
                self.run_stage(registry, prereq, true).await
            };

            if !passed {
                return Err(HarnessError::PrerequisiteFailure {
                    stage: stage.name().to_string(),
                    prerequisite: name.clone(),
                });
            }
        }

        Ok(memoized)
    }

    async fn execute(
        &mut self,
        registry: &StageRegistry,
        stage: &Stage,
        memoized: &[&Stage],
    ) -> HarnessResult<()> {
        for name in stage.build_list() {
            let component = registry.component(name)?;
            let artifact = self.harness.supervisor.build(component).await?;
            debug!(component = %name, binary = %artifact.binary.display(), "Built component");
        }

        if self.options.revive_prerequisite_services {
            for prereq in memoized {
                self.revive(registry, prereq).await?;
            }
        }

        for step in stage.start_list() {
            self.perform(registry, step).await?;
        }

        for step in stage.checks() {
            self.perform(registry, step).await?;
        }

        Ok(())
    }

    /// Restart services a memoized prerequisite left behind that have died.
    async fn revive(&mut self, registry: &StageRegistry, prereq: &Stage) -> HarnessResult<()> {
        for name in prereq.started_components() {
            let component = registry.component(name)?;
            let alive = match component.kind() {
                LifecycleKind::Application => continue,
                LifecycleKind::Special => self.harness.cluster.is_running().await,
                LifecycleKind::Service => self.harness.supervisor.is_running(name).await,
            };
            if !alive {
                info!(component = %name, prerequisite = %prereq.name(), "Reviving service");
                self.start_component(component).await?;
            }
        }
        Ok(())
    }

    async fn perform(&mut self, registry: &StageRegistry, step: &Step) -> HarnessResult<()> {
        match step {
            Step::Start(name) => {
                let component = registry.component(name)?;
                self.start_component(component).await
            }
            Step::ResetBackend => {
                info!("Resetting backend state");
                self.harness.backend.reset_state().await
            }
            Step::LoadFixtures => {
                info!("Loading backend fixtures");
                self.harness.backend.load_fixtures().await
            }
            Step::Settle(duration) => {
                debug!(secs = duration.as_secs_f64(), "Settling");
                tokio::time::sleep(*duration).await;
                Ok(())
            }
            Step::Verify(check) => match self.harness.checks.run(check).await {
                Ok(passed) => {
                    info!(check = %check.name, passed, "Check finished");
                    self.report.record(check.name.clone(), passed);
                    Ok(())
                }
                Err(e) => {
                    self.report.record(check.name.clone(), false);
                    Err(e)
                }
            },
            Step::AwaitLog(condition) => {
                if !self.watcher.wait_for_pattern(condition).await {
                    warn!(
                        source = %condition.source().display(),
                        "No readiness signal, continuing with checks"
                    );
                }
                Ok(())
            }
        }
    }

    async fn start_component(&mut self, component: &Component) -> HarnessResult<()> {
        if component.is_special() {
            self.harness.cluster.start(component).await
        } else {
            self.harness.supervisor.start(component).await
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
