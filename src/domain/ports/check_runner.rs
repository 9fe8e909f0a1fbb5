use crate::domain::errors::HarnessResult;
use crate::domain::models::Check;
use async_trait::async_trait;

/// Port for executing verification checks.
#[async_trait]
pub trait CheckRunner: Send + Sync {
    /// One-time preparation before any check runs (e.g. clearing caches).
    async fn prepare(&self) -> HarnessResult<()> {
        Ok(())
    }

    /// Run a check.
    ///
    /// # Returns
    ///
    /// * `Ok(true)` / `Ok(false)` - The check ran and passed or failed
    /// * `Err` - The check could not be run at all
    async fn run(&self, check: &Check) -> HarnessResult<bool>;
}
