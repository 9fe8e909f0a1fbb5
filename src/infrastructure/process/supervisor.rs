//! OS process supervisor
//!
//! Spawns services and applications with the shared settings, tracks them
//! in the [`RunningProcessTable`], and stops them with SIGTERM followed by a
//! bounded wait.

use super::command::{component_command, program_path};
use super::settings::SupervisorSettings;
use super::signal;
use super::table::{ProcessSlot, RunningProcessTable};
use crate::domain::errors::{HarnessError, HarnessResult};
use crate::domain::models::{Component, LifecycleKind};
use crate::domain::ports::{BuildArtifact, ComponentBuilder, ProcessSupervisor};
use async_trait::async_trait;
use tracing::{debug, info, warn};

pub struct OsProcessSupervisor {
    settings: SupervisorSettings,
    builder: Box<dyn ComponentBuilder>,
    table: RunningProcessTable,
}

impl OsProcessSupervisor {
    /// Create a supervisor with one table slot per non-special component.
    pub fn new(
        settings: SupervisorSettings,
        builder: Box<dyn ComponentBuilder>,
        components: &[Component],
    ) -> Self {
        let table = RunningProcessTable::new(
            components
                .iter()
                .filter(|c| !c.is_special())
                .map(Component::name),
        );
        Self {
            settings,
            builder,
            table,
        }
    }

    pub const fn table(&self) -> &RunningProcessTable {
        &self.table
    }

    async fn spawn_service(&mut self, component: &Component) -> HarnessResult<()> {
        let name = component.name();
        let mut command =
            component_command(component, &self.settings).map_err(|e| HarnessError::start(name, e))?;

        let child = command.spawn().map_err(|e| {
            HarnessError::start(
                name,
                format!("{}: {e}", program_path(component, &self.settings).display()),
            )
        })?;
        let pid = child
            .id()
            .ok_or_else(|| HarnessError::start(name, "process exited before its pid was read"))?;

        self.table
            .mark_running(name, pid, component.tier(), Some(child));
        info!(component = %name, pid, "Started service");
        Ok(())
    }

    async fn run_application(&mut self, component: &Component) -> HarnessResult<()> {
        let name = component.name();
        let mut command =
            component_command(component, &self.settings).map_err(|e| HarnessError::start(name, e))?;
        command.kill_on_drop(true);

        info!(component = %name, "Running application to completion");
        let status = command.status().await.map_err(|e| {
            HarnessError::start(
                name,
                format!("{}: {e}", program_path(component, &self.settings).display()),
            )
        })?;

        self.table.mark_exited(name, status.code());
        if status.success() {
            info!(component = %name, "Application finished");
            Ok(())
        } else {
            Err(HarnessError::start(name, format!("exited with {status}")))
        }
    }
}

#[async_trait]
impl ProcessSupervisor for OsProcessSupervisor {
    async fn build(&mut self, component: &Component) -> HarnessResult<BuildArtifact> {
        self.builder.build(component).await
    }

    async fn start(&mut self, component: &Component) -> HarnessResult<()> {
        let name = component.name();
        if component.is_special() {
            return Err(refuse_special(name));
        }
        if !self.table.contains(name) {
            return Err(HarnessError::UnknownComponent(name.to_string()));
        }
        if self.is_running(name).await {
            debug!(component = %name, "Already running");
            return Ok(());
        }

        match component.kind() {
            LifecycleKind::Service => self.spawn_service(component).await,
            LifecycleKind::Application => self.run_application(component).await,
            LifecycleKind::Special => Err(refuse_special(name)),
        }
    }

    async fn stop(&mut self, name: &str) {
        let Some(mut tracked) = self.table.take(name) else {
            debug!(component = %name, "Not running, nothing to stop");
            return;
        };

        match signal::terminate(tracked.pid) {
            Ok(true) => info!(component = %name, pid = tracked.pid, "Sent SIGTERM"),
            Ok(false) => debug!(component = %name, pid = tracked.pid, "Process already gone"),
            Err(errno) => {
                let err = HarnessError::Stop {
                    component: name.to_string(),
                    reason: errno.to_string(),
                };
                warn!(error = %err, "Could not signal process");
            }
        }

        if let Some(mut child) = tracked.child.take() {
            match tokio::time::timeout(self.settings.stop_grace, child.wait()).await {
                Ok(Ok(status)) => debug!(component = %name, %status, "Process exited"),
                Ok(Err(e)) => warn!(component = %name, error = %e, "Error waiting for process to exit"),
                Err(_) => {
                    warn!(component = %name, "Shutdown timeout, forcing kill");
                    if let Err(e) = child.kill().await {
                        warn!(component = %name, error = %e, "Kill failed");
                    }
                }
            }
        }
    }

    async fn stop_all(&mut self) {
        for name in self.table.shutdown_order() {
            self.stop(&name).await;
        }
    }

    async fn is_running(&mut self, name: &str) -> bool {
        let exited = match self.table.slot_mut(name) {
            Some(ProcessSlot::Running(tracked)) => match tracked.child.as_mut() {
                Some(child) => match child.try_wait() {
                    Ok(Some(status)) => Some(status),
                    Ok(None) => return true,
                    Err(e) => {
                        warn!(component = %name, error = %e, "Could not poll process");
                        return true;
                    }
                },
                None => return true,
            },
            _ => return false,
        };

        if let Some(status) = exited {
            warn!(component = %name, %status, "Service exited on its own");
            self.table.mark_exited(name, status.code());
        }
        false
    }
}

fn refuse_special(name: &str) -> HarnessError {
    HarnessError::invalid_operation(
        name,
        "special components are not started by the process supervisor",
    )
}

impl Drop for OsProcessSupervisor {
    fn drop(&mut self) {
        // Ensure child processes are killed when the supervisor is dropped
        for name in self.table.shutdown_order() {
            if let Some(mut child) = self.table.take(&name).and_then(|t| t.child) {
                let _ = child.start_kill();
            }
        }
    }
}
