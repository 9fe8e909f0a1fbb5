use crate::domain::errors::HarnessResult;
use crate::domain::models::Component;
use crate::domain::ports::builder::BuildArtifact;
use async_trait::async_trait;

/// Port for starting, stopping and tracking component processes.
///
/// One running/not-running slot per known non-special component.
#[async_trait]
pub trait ProcessSupervisor: Send + Sync {
    /// Build the component through the build collaborator.
    async fn build(&mut self, component: &Component) -> HarnessResult<BuildArtifact>;

    /// Start the component.
    ///
    /// No-op when already running. Services return once spawned;
    /// applications block until they exit and fail on a non-zero status.
    /// Special components are refused with `InvalidOperation`.
    async fn start(&mut self, component: &Component) -> HarnessResult<()>;

    /// Signal the component to terminate if it is tracked as running.
    ///
    /// Idempotent; failures are logged, never returned.
    async fn stop(&mut self, name: &str);

    /// Stop every running component, workers before shared infrastructure.
    async fn stop_all(&mut self);

    /// Whether the component is currently tracked as running.
    async fn is_running(&mut self, name: &str) -> bool;
}
