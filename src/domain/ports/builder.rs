use crate::domain::errors::HarnessResult;
use crate::domain::models::Component;
use async_trait::async_trait;
use std::path::PathBuf;

/// Output of a successful build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildArtifact {
    pub component: String,
    pub binary: PathBuf,
}

/// Port for the external build step.
///
/// Implementations place the binary in the directory the supervisor spawns
/// from. A non-zero compiler exit is a `HarnessError::Build`.
#[async_trait]
pub trait ComponentBuilder: Send + Sync {
    async fn build(&self, component: &Component) -> HarnessResult<BuildArtifact>;
}
