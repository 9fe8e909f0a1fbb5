use crate::domain::errors::{HarnessError, HarnessResult};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// What to wait for in a worker's append-only log, and for how long.
#[derive(Debug, Clone)]
pub struct ReadinessCondition {
    source: PathBuf,
    pattern: Regex,
    poll_interval: Duration,
    timeout: Duration,
}

impl ReadinessCondition {
    pub fn new(
        source: impl Into<PathBuf>,
        pattern: &str,
        poll_interval: Duration,
        timeout: Duration,
    ) -> HarnessResult<Self> {
        if poll_interval.is_zero() {
            return Err(HarnessError::InvalidPattern {
                pattern: pattern.to_string(),
                reason: "poll interval must be non-zero".to_string(),
            });
        }

        let pattern = Regex::new(pattern).map_err(|e| HarnessError::InvalidPattern {
            pattern: pattern.to_string(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            source: source.into(),
            pattern,
            poll_interval,
            timeout,
        })
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub const fn pattern(&self) -> &Regex {
        &self.pattern
    }

    pub const fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Number of polls before giving up; at least one.
    pub fn max_polls(&self) -> u32 {
        let polls = self.timeout.as_millis() / self.poll_interval.as_millis().max(1);
        u32::try_from(polls).unwrap_or(u32::MAX).max(1)
    }

    pub fn matches_line(&self, line: &str) -> bool {
        self.pattern.is_match(line)
    }
}
