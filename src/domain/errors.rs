//! Domain errors for the integration harness.

use thiserror::Error;

/// Format a cycle path as a human-readable string: `a -> b -> c -> a`.
fn format_cycle_path(path: &[String]) -> String {
    path.join(" -> ")
}

/// Errors raised while building, starting, and verifying pipeline stages.
///
/// Everything below the orchestrator boundary returns these; the stage
/// runner turns them into a failed outcome instead of letting them escape.
#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("Build failed for {component}: {reason}")]
    Build { component: String, reason: String },

    #[error("Failed to start {component}: {reason}")]
    Start { component: String, reason: String },

    #[error("Invalid operation on {component}: {reason}")]
    InvalidOperation { component: String, reason: String },

    #[error("Stage {stage} skipped: prerequisite {prerequisite} failed")]
    PrerequisiteFailure { stage: String, prerequisite: String },

    #[error("Unknown component: {0}")]
    UnknownComponent(String),

    #[error("Unknown stage: {0}")]
    UnknownStage(String),

    #[error("Failed to stop {component}: {reason}")]
    Stop { component: String, reason: String },

    #[error("Stage dependency cycle detected: {}", format_cycle_path(.0))]
    DependencyCycle(Vec<String>),

    #[error("Check {check} could not run: {reason}")]
    Check { check: String, reason: String },

    #[error("Backend operation {operation} failed: {reason}")]
    Backend { operation: String, reason: String },

    #[error("Invalid readiness pattern {pattern:?}: {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("Invalid stage definition {stage}: {reason}")]
    InvalidStage { stage: String, reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type HarnessResult<T> = Result<T, HarnessError>;

impl HarnessError {
    pub fn build(component: impl Into<String>, reason: impl ToString) -> Self {
        Self::Build {
            component: component.into(),
            reason: reason.to_string(),
        }
    }

    pub fn start(component: impl Into<String>, reason: impl ToString) -> Self {
        Self::Start {
            component: component.into(),
            reason: reason.to_string(),
        }
    }

    pub fn invalid_operation(component: impl Into<String>, reason: impl ToString) -> Self {
        Self::InvalidOperation {
            component: component.into(),
            reason: reason.to_string(),
        }
    }

    /// Usage errors are reported to the operator; no work was attempted.
    pub const fn is_usage_error(&self) -> bool {
        matches!(self, Self::UnknownStage(_) | Self::UnknownComponent(_))
    }
}
