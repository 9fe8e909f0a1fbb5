use crate::domain::errors::{HarnessError, HarnessResult};
use crate::domain::models::readiness::ReadinessCondition;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// A verification run whose pass/fail outcome lands in the report.
///
/// Runs `go test <target>` inside `dir` (relative to the exchange root).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Check {
    pub name: String,
    pub dir: String,
    pub target: String,
    /// Integration checks talk to the locally running services.
    pub integration: bool,
}

impl Check {
    /// A post-condition test from the integration directory.
    pub fn post_test(name: impl Into<String>, file: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            dir: "integration".to_string(),
            target: file.into(),
            integration: true,
        }
    }

    /// An integration test living outside the integration directory.
    pub fn integration_in(
        name: impl Into<String>,
        dir: impl Into<String>,
        file: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            dir: dir.into(),
            target: file.into(),
            integration: true,
        }
    }

    /// A plain unit-test suite that needs no running services.
    pub fn suite(name: impl Into<String>, dir: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            dir: dir.into(),
            target: target.into(),
            integration: false,
        }
    }
}

/// One ordered action inside a stage.
#[derive(Debug, Clone)]
pub enum Step {
    /// Start a component with the semantics of its lifecycle kind.
    Start(String),
    /// Empty the REST backend's database.
    ResetBackend,
    /// Load the REST backend's fixture data.
    LoadFixtures,
    /// Fixed pause so queues can settle before the next consumer attaches.
    Settle(Duration),
    /// Run a check and record its outcome.
    Verify(Check),
    /// Poll a log until a pattern shows up or the wait times out.
    AwaitLog(ReadinessCondition),
}

/// A named test procedure with prerequisites, builds, starts and checks.
#[derive(Debug, Clone)]
pub struct Stage {
    name: String,
    description: String,
    prerequisites: Vec<String>,
    build_list: Vec<String>,
    start_list: Vec<Step>,
    checks: Vec<Step>,
    memo_key: String,
}

impl Stage {
    pub fn builder(name: impl Into<String>) -> StageBuilder {
        StageBuilder {
            name: name.into(),
            description: String::new(),
            prerequisites: Vec::new(),
            build_list: Vec::new(),
            start_list: Vec::new(),
            checks: Vec::new(),
            memo_key: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn prerequisites(&self) -> &[String] {
        &self.prerequisites
    }

    pub fn build_list(&self) -> &[String] {
        &self.build_list
    }

    pub fn start_list(&self) -> &[Step] {
        &self.start_list
    }

    pub fn checks(&self) -> &[Step] {
        &self.checks
    }

    /// Check name whose recorded outcome marks this stage as already run.
    pub fn memo_key(&self) -> &str {
        &self.memo_key
    }

    /// Names of every check the stage records, in order.
    pub fn check_names(&self) -> impl Iterator<Item = &str> {
        self.steps().filter_map(|step| match step {
            Step::Verify(check) => Some(check.name.as_str()),
            _ => None,
        })
    }

    /// Every component the stage starts, from either phase.
    pub fn started_components(&self) -> impl Iterator<Item = &str> {
        self.steps().filter_map(|step| match step {
            Step::Start(name) => Some(name.as_str()),
            _ => None,
        })
    }

    fn steps(&self) -> impl Iterator<Item = &Step> {
        self.start_list.iter().chain(self.checks.iter())
    }
}

/// Builder for [`Stage`]; `start`/`settle`/`reset_backend`/`load_fixtures`
/// append to the start phase, the `then_*`, `verify` and `await_log`
/// methods append to the check phase.
#[derive(Debug, Clone)]
pub struct StageBuilder {
    name: String,
    description: String,
    prerequisites: Vec<String>,
    build_list: Vec<String>,
    start_list: Vec<Step>,
    checks: Vec<Step>,
    memo_key: Option<String>,
}

impl StageBuilder {
    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn requires(mut self, stage: impl Into<String>) -> Self {
        self.prerequisites.push(stage.into());
        self
    }

    pub fn build<I, S>(mut self, components: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for component in components {
            let component = component.into();
            if !self.build_list.contains(&component) {
                self.build_list.push(component);
            }
        }
        self
    }

    pub fn start(mut self, component: impl Into<String>) -> Self {
        self.start_list.push(Step::Start(component.into()));
        self
    }

    pub fn reset_backend(mut self) -> Self {
        self.start_list.push(Step::ResetBackend);
        self
    }

    pub fn load_fixtures(mut self) -> Self {
        self.start_list.push(Step::LoadFixtures);
        self
    }

    pub fn settle(mut self, duration: Duration) -> Self {
        self.start_list.push(Step::Settle(duration));
        self
    }

    pub fn verify(mut self, check: Check) -> Self {
        self.checks.push(Step::Verify(check));
        self
    }

    pub fn then_start(mut self, component: impl Into<String>) -> Self {
        self.checks.push(Step::Start(component.into()));
        self
    }

    pub fn then_settle(mut self, duration: Duration) -> Self {
        self.checks.push(Step::Settle(duration));
        self
    }

    pub fn await_log(mut self, condition: ReadinessCondition) -> Self {
        self.checks.push(Step::AwaitLog(condition));
        self
    }

    /// Use a specific check as the "already ran" marker instead of the last one.
    pub fn memoize_on(mut self, check_name: impl Into<String>) -> Self {
        self.memo_key = Some(check_name.into());
        self
    }

    pub fn finish(self) -> HarnessResult<Stage> {
        let invalid = |reason: &str| HarnessError::InvalidStage {
            stage: self.name.clone(),
            reason: reason.to_string(),
        };

        if self.name.is_empty() {
            return Err(invalid("stage name cannot be empty"));
        }

        let check_names: Vec<&str> = self
            .start_list
            .iter()
            .chain(self.checks.iter())
            .filter_map(|step| match step {
                Step::Verify(check) => Some(check.name.as_str()),
                _ => None,
            })
            .collect();

        let Some(last) = check_names.last() else {
            return Err(invalid("a stage must record at least one check"));
        };

        for (i, name) in check_names.iter().enumerate() {
            if check_names[..i].contains(name) {
                return Err(invalid(&format!("check {name} is recorded twice")));
            }
        }

        let memo_key = match &self.memo_key {
            Some(key) if !check_names.contains(&key.as_str()) => {
                return Err(invalid(&format!("memo key {key} is not one of its checks")));
            }
            Some(key) => key.clone(),
            None => (*last).to_string(),
        };

        Ok(Stage {
            name: self.name,
            description: self.description,
            prerequisites: self.prerequisites,
            build_list: self.build_list,
            start_list: self.start_list,
            checks: self.checks,
            memo_key,
        })
    }
}

/// Lifecycle of a stage within one orchestrator run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageState {
    Pending,
    Running,
    Passed,
    Failed,
    /// A prerequisite failed; nothing was built or started.
    Skipped,
    /// A build, start, or check invocation errored out.
    Aborted,
}

impl StageState {
    pub const fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::Passed | Self::Failed | Self::Skipped | Self::Aborted
        )
    }
}

impl fmt::Display for StageState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Passed => "passed",
            Self::Failed => "failed",
            Self::Skipped => "skipped",
            Self::Aborted => "aborted",
        };
        write!(f, "{label}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memo_key_defaults_to_last_check() {
        let stage = Stage::builder("apt_queue")
            .requires("apt_ingest")
            .build(["apt_queue"])
            .verify(Check::post_test("apt_mark_for_restore", "apt_mark_for_restore_test.go"))
            .then_settle(Duration::from_secs(5))
            .then_start("apt_queue")
            .verify(Check::post_test("apt_queue_test", "apt_queue_post_test.go"))
            .finish()
            .unwrap();

        assert_eq!(stage.memo_key(), "apt_queue_test");
        assert_eq!(
            stage.check_names().collect::<Vec<_>>(),
            ["apt_mark_for_restore", "apt_queue_test"]
        );
        assert_eq!(stage.started_components().collect::<Vec<_>>(), ["apt_queue"]);
    }

    #[test]
    fn test_explicit_memo_key_must_be_a_check() {
        let result = Stage::builder("apt_ingest")
            .verify(Check::post_test("apt_fetch_test", "apt_fetch_post_test.go"))
            .memoize_on("apt_record_test")
            .finish();
        assert!(matches!(result, Err(HarnessError::InvalidStage { .. })));
    }

    #[test]
    fn test_stage_without_checks_rejected() {
        let result = Stage::builder("empty").start("nsq_service").finish();
        assert!(result.is_err());
    }

    #[test]
    fn test_duplicate_check_rejected() {
        let result = Stage::builder("dup")
            .verify(Check::post_test("a", "a_test.go"))
            .verify(Check::post_test("a", "a_test.go"))
            .finish();
        assert!(result.is_err());
    }

    #[test]
    fn test_build_list_deduplicates() {
        let stage = Stage::builder("s")
            .build(["nsq_service", "apt_fetch"])
            .build(["nsq_service"])
            .verify(Check::suite("unit_tests", ".", "./..."))
            .finish()
            .unwrap();
        assert_eq!(stage.build_list(), ["nsq_service", "apt_fetch"]);
    }

    #[test]
    fn test_terminal_states() {
        assert!(!StageState::Pending.is_terminal());
        assert!(!StageState::Running.is_terminal());
        assert!(StageState::Skipped.is_terminal());
        assert_eq!(StageState::Aborted.to_string(), "aborted");
    }
}
