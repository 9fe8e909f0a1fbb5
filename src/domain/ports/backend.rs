use crate::domain::errors::HarnessResult;
use async_trait::async_trait;

/// Out-of-band operations on the REST backend. Both block until done.
#[async_trait]
pub trait RestBackend: Send + Sync {
    async fn reset_state(&self) -> HarnessResult<()>;

    async fn load_fixtures(&self) -> HarnessResult<()>;
}
