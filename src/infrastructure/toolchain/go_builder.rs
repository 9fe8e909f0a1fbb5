use crate::domain::errors::{HarnessError, HarnessResult};
use crate::domain::models::Component;
use crate::domain::ports::{BuildArtifact, ComponentBuilder};
use crate::infrastructure::process::command::display_argv;
use crate::infrastructure::process::SupervisorSettings;
use async_trait::async_trait;
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, info};

/// Lines of compiler output kept in a build error.
const ERROR_TAIL_LINES: usize = 20;

/// Builds `<exchange_root>/apps/<name>/<name>.go` into the bin dir.
pub struct GoBuilder {
    settings: SupervisorSettings,
    go_binary: String,
}

impl GoBuilder {
    pub fn new(settings: SupervisorSettings, go_binary: impl Into<String>) -> Self {
        Self {
            settings,
            go_binary: go_binary.into(),
        }
    }
}

#[async_trait]
impl ComponentBuilder for GoBuilder {
    async fn build(&self, component: &Component) -> HarnessResult<BuildArtifact> {
        let name = component.name();
        let binary = component
            .binary_name()
            .ok_or_else(|| HarnessError::build(name, "component is not built from source"))?;

        tokio::fs::create_dir_all(&self.settings.bin_dir)
            .await
            .map_err(|e| HarnessError::build(name, format!("cannot create bin dir: {e}")))?;

        let output_path = self.settings.bin_dir.join(binary);
        let source_dir = self.settings.exchange_root.join("apps").join(binary);
        let args = vec![
            "build".to_string(),
            "-o".to_string(),
            output_path.display().to_string(),
            format!("{binary}.go"),
        ];
        info!(component = %name, command = %format!("{} {}", self.go_binary, display_argv(&args)), "Building");

        let output = Command::new(&self.go_binary)
            .args(&args)
            .current_dir(&source_dir)
            .envs(&self.settings.env)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| HarnessError::build(name, format!("{}: {e}", self.go_binary)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let tail: Vec<&str> = stderr.lines().rev().take(ERROR_TAIL_LINES).collect();
            let reason = if tail.is_empty() {
                format!("compiler exited with {}", output.status)
            } else {
                tail.into_iter().rev().collect::<Vec<_>>().join("\n")
            };
            return Err(HarnessError::build(name, reason));
        }

        debug!(component = %name, binary = %output_path.display(), "Build succeeded");
        Ok(BuildArtifact {
            component: name.to_string(),
            binary: output_path,
        })
    }
}
