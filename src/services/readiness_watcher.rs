//! Log-based readiness waits
//!
//! Polls a worker's append-only log until a line matches, so a stage can
//! wait for specific data to be processed instead of sleeping blindly.

use crate::domain::models::ReadinessCondition;
use std::io;
use tracing::{debug, info, warn};

/// Condition-based synchronization against a worker's log file.
///
/// Stages use this instead of a fixed sleep when they need to know a
/// downstream worker has processed specific data.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReadinessWatcher;

impl ReadinessWatcher {
    pub const fn new() -> Self {
        Self
    }

    /// Poll the source until a line matches or the timeout elapses.
    ///
    /// The file is re-read from the start on every poll. A missing file
    /// counts as "not matched yet": the worker may not have created it.
    pub async fn wait_for_pattern(&self, condition: &ReadinessCondition) -> bool {
        let source = condition.source().display().to_string();
        let pattern = condition.pattern().as_str();
        let polls = condition.max_polls();

        for attempt in 0..polls {
            let waited = condition.poll_interval() * attempt;
            if attempt % 2 == 0 {
                info!(source = %source, pattern, waited_secs = waited.as_secs(), "Checking log for pattern");
            }

            match scan(condition).await {
                Ok(true) => {
                    info!(source = %source, pattern, "Found pattern");
                    return true;
                }
                Ok(false) => {}
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    debug!(source = %source, "Log file does not exist yet");
                }
                Err(e) => {
                    warn!(source = %source, error = %e, "Failed to read log file");
                }
            }

            tokio::time::sleep(condition.poll_interval()).await;
        }

        warn!(
            source = %source,
            pattern,
            timeout_secs = condition.timeout().as_secs(),
            "Timed out waiting for pattern"
        );
        false
    }
}

async fn scan(condition: &ReadinessCondition) -> io::Result<bool> {
    let bytes = tokio::fs::read(condition.source()).await?;
    let contents = String::from_utf8_lossy(&bytes);
    Ok(contents.lines().any(|line| condition.matches_line(line)))
}
