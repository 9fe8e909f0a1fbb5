use crate::domain::errors::HarnessResult;
use crate::domain::models::Component;
use async_trait::async_trait;

/// Bespoke start/stop for special components the generic supervisor refuses.
#[async_trait]
pub trait ClusterControl: Send + Sync {
    /// Bring the component up. No-op when already running.
    async fn start(&mut self, component: &Component) -> HarnessResult<()>;

    /// Tear everything this controller started down. Idempotent.
    async fn stop(&mut self);

    /// Whether the started process is still alive; a process found dead
    /// is forgotten so the next `start` brings it up again.
    async fn is_running(&mut self) -> bool;
}
