use crate::domain::models::StageState;
use crate::services::{ResultEntry, ResultReport};
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize)]
pub struct StageSummary {
    pub name: String,
    pub state: StageState,
}

/// Machine-readable outcome of one harness invocation (`--json`)
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub stage: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub passed: bool,
    /// Why the run stopped early (timeout, interrupt), if it did
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interrupted: Option<String>,
    pub checks: Vec<ResultEntry>,
    pub stages: Vec<StageSummary>,
}

impl RunSummary {
    pub fn new(
        run_id: Uuid,
        stage: impl Into<String>,
        started_at: DateTime<Utc>,
        report: &ResultReport,
        states: Vec<(String, StageState)>,
    ) -> Self {
        Self {
            run_id,
            stage: stage.into(),
            started_at,
            finished_at: Utc::now(),
            passed: report.all_passed(),
            interrupted: None,
            checks: report.entries().to_vec(),
            stages: states
                .into_iter()
                .map(|(name, state)| StageSummary { name, state })
                .collect(),
        }
    }

    #[must_use]
    pub fn with_outcome(mut self, passed: bool, interrupted: Option<String>) -> Self {
        self.passed = passed;
        self.interrupted = interrupted;
        self
    }
}
