//! Local replication cluster
//!
//! One process impersonating every replication node. Bring-up is
//! optionally preceded by setup and migrate phases, each blocking and
//! logging to its own file in the log dir.

use crate::domain::errors::{HarnessError, HarnessResult};
use crate::domain::models::{ClusterConfig, Component};
use crate::domain::ports::ClusterControl;
use crate::infrastructure::process::command::{argv_command, display_argv, log_file, run_to_completion};
use crate::infrastructure::process::{signal, SupervisorSettings};
use async_trait::async_trait;
use std::process::Stdio;
use tokio::process::{Child, Command};
use tracing::{debug, info, warn};

pub struct DpnCluster {
    settings: SupervisorSettings,
    config: ClusterConfig,
    initialized: bool,
    running: Option<Child>,
}

impl DpnCluster {
    pub fn new(settings: SupervisorSettings, config: ClusterConfig) -> Self {
        Self {
            settings,
            config,
            initialized: false,
            running: None,
        }
    }

    fn command(&self, argv: &[String], log_name: &str) -> std::io::Result<Command> {
        let mut command = argv_command(argv, &self.settings.dpn_server_root, &self.settings)?;
        let out = log_file(&self.settings, log_name)?;
        let err = out.try_clone()?;
        command.stdout(Stdio::from(out)).stderr(Stdio::from(err));
        Ok(command)
    }

    async fn run_phase(&self, name: &str, phase: &str, argv: &[String]) -> HarnessResult<()> {
        info!(component = %name, phase, command = %display_argv(argv), "Running cluster phase");
        let mut command = self
            .command(argv, &format!("{name}_{phase}.log"))
            .map_err(|e| HarnessError::start(name, format!("{phase}: {e}")))?;
        run_to_completion(&mut command)
            .await
            .map_err(|e| HarnessError::start(name, format!("{phase}: {e}")))
    }

    /// Per-node logs from an earlier run would confuse the next one.
    async fn remove_stale_logs(&self) -> std::io::Result<usize> {
        let mut removed = 0;
        let mut entries = match tokio::fs::read_dir(&self.settings.dpn_server_root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(e),
        };
        while let Some(entry) = entries.next_entry().await? {
            let is_stale = entry
                .file_name()
                .to_str()
                .is_some_and(|n| n.starts_with(&self.config.stale_log_prefix));
            if is_stale && entry.file_type().await?.is_file() {
                tokio::fs::remove_file(entry.path()).await?;
                removed += 1;
            }
        }
        Ok(removed)
    }
}

#[async_trait]
impl ClusterControl for DpnCluster {
    async fn start(&mut self, component: &Component) -> HarnessResult<()> {
        let name = component.name();
        if self.is_running().await {
            debug!(component = %name, "Cluster already running");
            return Ok(());
        }

        if self.config.initialize && !self.initialized {
            self.run_phase(name, "setup", &self.config.setup_command).await?;
            self.run_phase(name, "migrate", &self.config.migrate_command).await?;
            self.initialized = true;
        }

        match self.remove_stale_logs().await {
            Ok(removed) => debug!(component = %name, removed, "Deleted old cluster logs"),
            Err(e) => warn!(component = %name, error = %e, "Could not delete old cluster logs"),
        }

        let mut command = self
            .command(&self.config.run_command, &format!("{name}.log"))
            .map_err(|e| HarnessError::start(name, e))?;
        #[cfg(unix)]
        command.process_group(0);

        let child = command
            .spawn()
            .map_err(|e| HarnessError::start(name, format!("{}: {e}", display_argv(&self.config.run_command))))?;
        info!(component = %name, pid = ?child.id(), "Started cluster");
        self.running = Some(child);
        Ok(())
    }

    async fn stop(&mut self) {
        let Some(mut child) = self.running.take() else {
            return;
        };

        if let Some(pid) = child.id() {
            info!(pid, "Stopping cluster");
            if let Err(errno) = signal::terminate(pid) {
                let err = HarnessError::Stop {
                    component: "cluster".to_string(),
                    reason: errno.to_string(),
                };
                warn!(error = %err, "Could not signal cluster");
            }
        }

        match tokio::time::timeout(self.settings.stop_grace, child.wait()).await {
            Ok(Ok(status)) => debug!(%status, "Cluster exited"),
            Ok(Err(e)) => warn!(error = %e, "Error waiting for cluster to exit"),
            Err(_) => {
                warn!("Cluster shutdown timeout, forcing kill");
                if let Err(e) = child.kill().await {
                    warn!(error = %e, "Kill failed");
                }
            }
        }
    }

    async fn is_running(&mut self) -> bool {
        let Some(child) = self.running.as_mut() else {
            return false;
        };
        match child.try_wait() {
            Ok(None) => true,
            Ok(Some(status)) => {
                warn!(%status, "Cluster exited on its own");
                self.running = None;
                false
            }
            Err(e) => {
                warn!(error = %e, "Could not poll cluster");
                true
            }
        }
    }
}

impl Drop for DpnCluster {
    fn drop(&mut self) {
        if let Some(mut child) = self.running.take() {
            let _ = child.start_kill();
        }
    }
}
