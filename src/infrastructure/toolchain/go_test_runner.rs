use crate::domain::errors::{HarnessError, HarnessResult};
use crate::domain::models::Check;
use crate::domain::ports::CheckRunner;
use crate::infrastructure::process::SupervisorSettings;
use async_trait::async_trait;
use std::process::Stdio;
use tokio::process::Command;
use tracing::info;

/// Runs checks as `go test <target>`; exit status 0 means pass.
pub struct GoTestRunner {
    settings: SupervisorSettings,
    go_binary: String,
}

impl GoTestRunner {
    pub fn new(settings: SupervisorSettings, go_binary: impl Into<String>) -> Self {
        Self {
            settings,
            go_binary: go_binary.into(),
        }
    }
}

#[async_trait]
impl CheckRunner for GoTestRunner {
    /// Clear the test cache, or unchanged test files would report cached
    /// results instead of checking the services again.
    async fn prepare(&self) -> HarnessResult<()> {
        info!("Clearing the Go test cache");
        let status = Command::new(&self.go_binary)
            .args(["clean", "-testcache"])
            .envs(&self.settings.env)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .status()
            .await
            .map_err(|e| HarnessError::Check {
                check: "go clean -testcache".to_string(),
                reason: e.to_string(),
            })?;
        if status.success() {
            Ok(())
        } else {
            Err(HarnessError::Check {
                check: "go clean -testcache".to_string(),
                reason: format!("exited with {status}"),
            })
        }
    }

    async fn run(&self, check: &Check) -> HarnessResult<bool> {
        let dir = self.settings.exchange_root.join(&check.dir);
        let mut command = Command::new(&self.go_binary);
        command
            .args(["test", check.target.as_str()])
            .current_dir(&dir)
            .envs(&self.settings.env)
            .stdin(Stdio::null())
            .kill_on_drop(true);
        if check.integration {
            command.env("RUN_EXCHANGE_INTEGRATION", "true");
        }

        info!(check = %check.name, target = %check.target, dir = %dir.display(), "Running check");
        let status = command.status().await.map_err(|e| HarnessError::Check {
            check: check.name.clone(),
            reason: e.to_string(),
        })?;
        Ok(status.success())
    }
}
