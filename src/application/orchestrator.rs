//! Stage orchestration
//!
//! Entry point for a harness run: resolves a stage by name and hands it to
//! the [`StageRunner`]. One orchestrator per process invocation, so every
//! run starts from an empty report.

use crate::application::stage_registry::StageRegistry;
use crate::application::stage_runner::{Harness, RunnerOptions, StageRunner};
use crate::domain::errors::HarnessResult;
use crate::domain::models::StageState;
use crate::services::ResultReport;
use tracing::info;

/// Dispatches stage requests and owns the run's shared state
pub struct Orchestrator {
    registry: StageRegistry,
    runner: StageRunner,
    prepared: bool,
}

impl Orchestrator {
    pub fn new(registry: StageRegistry, harness: Harness, options: RunnerOptions) -> Self {
        Self {
            registry,
            runner: StageRunner::new(harness, options),
            prepared: false,
        }
    }

    /// Run a stage by name.
    ///
    /// # Returns
    ///
    /// * `Ok(bool)` - Aggregate outcome of everything recorded so far
    /// * `Err(UnknownStage)` - Usage error; nothing was attempted
    pub async fn run(&mut self, stage_name: &str, more_stages_follow: bool) -> HarnessResult<bool> {
        let stage = self.registry.stage(stage_name)?;

        if !self.prepared {
            self.prepared = true;
            self.runner.prepare().await;
        }

        info!(stage = %stage_name, more_stages_follow, "Starting stage run");
        Ok(self
            .runner
            .run_stage(&self.registry, stage, more_stages_follow)
            .await)
    }

    /// Stages a request for `stage_name` would execute, prerequisites first.
    pub fn plan(&self, stage_name: &str) -> HarnessResult<Vec<String>> {
        self.registry.execution_order(stage_name)
    }

    /// Stop everything; used when a run is cancelled from outside.
    pub async fn shutdown(&mut self) {
        self.runner.shutdown().await;
    }

    pub const fn report(&self) -> &ResultReport {
        self.runner.report()
    }

    pub fn all_passed(&self) -> bool {
        self.runner.report().all_passed()
    }

    pub fn stage_state(&self, stage_name: &str) -> StageState {
        self.runner.state(stage_name)
    }

    /// States of every stage touched so far, in registry order.
    pub fn stage_states(&self) -> Vec<(String, StageState)> {
        self.registry
            .stage_names()
            .map(|name| (name.to_string(), self.runner.state(name)))
            .filter(|(_, state)| *state != StageState::Pending)
            .collect()
    }

    pub const fn registry(&self) -> &StageRegistry {
        &self.registry
    }
}
