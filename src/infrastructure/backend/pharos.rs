use crate::domain::errors::{HarnessError, HarnessResult};
use crate::domain::models::BackendConfig;
use crate::domain::ports::RestBackend;
use crate::infrastructure::process::command::{argv_command, display_argv, run_to_completion};
use crate::infrastructure::process::SupervisorSettings;
use async_trait::async_trait;
use tracing::info;

/// Runs the backend's maintenance tasks in its source root.
pub struct PharosBackend {
    settings: SupervisorSettings,
    commands: BackendConfig,
}

impl PharosBackend {
    pub fn new(settings: SupervisorSettings, commands: BackendConfig) -> Self {
        Self { settings, commands }
    }

    async fn run(&self, operation: &str, argv: &[String]) -> HarnessResult<()> {
        let backend_error = |reason: String| HarnessError::Backend {
            operation: operation.to_string(),
            reason,
        };

        info!(operation, command = %display_argv(argv), "Running backend task");
        let mut command = argv_command(argv, &self.settings.pharos_root, &self.settings)
            .map_err(|e| backend_error(e.to_string()))?;
        run_to_completion(&mut command)
            .await
            .map_err(|e| backend_error(e.to_string()))?;
        info!(operation, "Backend task finished");
        Ok(())
    }
}

#[async_trait]
impl RestBackend for PharosBackend {
    async fn reset_state(&self) -> HarnessResult<()> {
        self.run("reset", &self.commands.reset_command).await
    }

    async fn load_fixtures(&self) -> HarnessResult<()> {
        self.run("load_fixtures", &self.commands.fixtures_command).await
    }
}
