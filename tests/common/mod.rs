//! Common test utilities for integration tests
//!
//! In-memory fakes for every harness port. They share one event log so
//! tests can assert on the exact order of builds, starts, checks and
//! shutdowns.

#![allow(dead_code)]

use async_trait::async_trait;
use ingest_harness::domain::models::{Check, Component, LifecycleKind};
use ingest_harness::domain::ports::{
    BuildArtifact, CheckRunner, ClusterControl, ProcessSupervisor, RestBackend,
};
use ingest_harness::{Harness, HarnessError, HarnessResult, Stage, StageRegistry};
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

/// Create a temporary directory for test isolation
pub fn temp_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

/// Setup test logging
pub fn setup_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

/// Wait for a condition to be true with timeout
///
/// Polls the predicate every 50ms until it returns true or timeout is reached.
pub async fn wait_for<F>(mut predicate: F, timeout_ms: u64) -> bool
where
    F: FnMut() -> bool,
{
    let start = std::time::Instant::now();
    let timeout = std::time::Duration::from_millis(timeout_ms);

    while start.elapsed() < timeout {
        if predicate() {
            return true;
        }
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    }

    false
}

/// Ordered log of everything the fakes were asked to do
#[derive(Clone, Default)]
pub struct Events(Arc<Mutex<Vec<String>>>);

impl Events {
    pub fn push(&self, event: impl Into<String>) {
        self.0.lock().unwrap().push(event.into());
    }

    pub fn all(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    pub fn count(&self, event: &str) -> usize {
        self.0.lock().unwrap().iter().filter(|e| *e == event).count()
    }

    pub fn position(&self, event: &str) -> Option<usize> {
        self.0.lock().unwrap().iter().position(|e| e == event)
    }

    pub fn contains(&self, event: &str) -> bool {
        self.position(event).is_some()
    }

    pub fn clear(&self) {
        self.0.lock().unwrap().clear();
    }
}

/// What a fake check does when run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckOutcome {
    Pass,
    Fail,
    Error,
    Panic,
}

/// Configures a set of fakes and hands out a [`Harness`] wired to them
#[derive(Clone, Default)]
pub struct FakeWorld {
    pub events: Events,
    /// Services the fake supervisor considers alive
    pub running: Arc<Mutex<HashSet<String>>>,
    /// Whether the fake cluster considers itself up
    pub cluster_running: Arc<Mutex<bool>>,
    fail_build: HashSet<String>,
    fail_start: HashSet<String>,
    checks: HashMap<String, CheckOutcome>,
}

impl FakeWorld {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_build(mut self, component: &str) -> Self {
        self.fail_build.insert(component.to_string());
        self
    }

    pub fn fail_start(mut self, component: &str) -> Self {
        self.fail_start.insert(component.to_string());
        self
    }

    pub fn check(mut self, name: &str, outcome: CheckOutcome) -> Self {
        self.checks.insert(name.to_string(), outcome);
        self
    }

    /// Simulate a service dying outside the harness's control.
    pub fn kill(&self, component: &str) {
        self.running.lock().unwrap().remove(component);
    }

    /// Simulate the cluster process dying.
    pub fn kill_cluster(&self) {
        *self.cluster_running.lock().unwrap() = false;
    }

    pub fn is_alive(&self, component: &str) -> bool {
        self.running.lock().unwrap().contains(component)
    }

    pub fn harness(&self) -> Harness {
        Harness {
            supervisor: Box::new(FakeSupervisor {
                events: self.events.clone(),
                running: Arc::clone(&self.running),
                fail_build: self.fail_build.clone(),
                fail_start: self.fail_start.clone(),
            }),
            checks: Box::new(FakeCheckRunner {
                events: self.events.clone(),
                outcomes: self.checks.clone(),
            }),
            backend: Box::new(FakeBackend {
                events: self.events.clone(),
            }),
            cluster: Box::new(FakeCluster {
                events: self.events.clone(),
                running: Arc::clone(&self.cluster_running),
            }),
        }
    }
}

pub struct FakeSupervisor {
    events: Events,
    running: Arc<Mutex<HashSet<String>>>,
    fail_build: HashSet<String>,
    fail_start: HashSet<String>,
}

#[async_trait]
impl ProcessSupervisor for FakeSupervisor {
    async fn build(&mut self, component: &Component) -> HarnessResult<BuildArtifact> {
        self.events.push(format!("build:{}", component.name()));
        if self.fail_build.contains(component.name()) {
            return Err(HarnessError::build(component.name(), "exit status 2"));
        }
        Ok(BuildArtifact {
            component: component.name().to_string(),
            binary: PathBuf::from("/fake/bin").join(component.name()),
        })
    }

    async fn start(&mut self, component: &Component) -> HarnessResult<()> {
        let name = component.name();
        if component.is_special() {
            return Err(HarnessError::invalid_operation(name, "special component"));
        }
        if self.running.lock().unwrap().contains(name) {
            return Ok(());
        }
        self.events.push(format!("start:{name}"));
        if self.fail_start.contains(name) {
            return Err(HarnessError::start(name, "exited with status 1"));
        }
        if component.kind() == LifecycleKind::Service {
            self.running.lock().unwrap().insert(name.to_string());
        }
        Ok(())
    }

    async fn stop(&mut self, name: &str) {
        if self.running.lock().unwrap().remove(name) {
            self.events.push(format!("stop:{name}"));
        }
    }

    async fn stop_all(&mut self) {
        self.events.push("stop_all");
        self.running.lock().unwrap().clear();
    }

    async fn is_running(&mut self, name: &str) -> bool {
        self.running.lock().unwrap().contains(name)
    }
}

pub struct FakeCheckRunner {
    events: Events,
    outcomes: HashMap<String, CheckOutcome>,
}

#[async_trait]
impl CheckRunner for FakeCheckRunner {
    async fn prepare(&self) -> HarnessResult<()> {
        self.events.push("prepare");
        Ok(())
    }

    async fn run(&self, check: &Check) -> HarnessResult<bool> {
        self.events.push(format!("check:{}", check.name));
        match self.outcomes.get(&check.name).copied().unwrap_or(CheckOutcome::Pass) {
            CheckOutcome::Pass => Ok(true),
            CheckOutcome::Fail => Ok(false),
            CheckOutcome::Error => Err(HarnessError::Check {
                check: check.name.clone(),
                reason: "toolchain missing".to_string(),
            }),
            CheckOutcome::Panic => panic!("check {} blew up", check.name),
        }
    }
}

pub struct FakeBackend {
    events: Events,
}

#[async_trait]
impl RestBackend for FakeBackend {
    async fn reset_state(&self) -> HarnessResult<()> {
        self.events.push("reset");
        Ok(())
    }

    async fn load_fixtures(&self) -> HarnessResult<()> {
        self.events.push("fixtures");
        Ok(())
    }
}

pub struct FakeCluster {
    events: Events,
    running: Arc<Mutex<bool>>,
}

#[async_trait]
impl ClusterControl for FakeCluster {
    async fn start(&mut self, component: &Component) -> HarnessResult<()> {
        let mut running = self.running.lock().unwrap();
        if !*running {
            self.events.push(format!("cluster_start:{}", component.name()));
            *running = true;
        }
        Ok(())
    }

    async fn stop(&mut self) {
        let mut running = self.running.lock().unwrap();
        if *running {
            self.events.push("cluster_stop");
            *running = false;
        }
    }

    async fn is_running(&mut self) -> bool {
        *self.running.lock().unwrap()
    }
}

/// Small pipeline: `store` needs `fetch` needs `bucket_reader`;
/// `audit` needs `replicate`, which runs on the cluster.
pub fn small_registry() -> StageRegistry {
    let components = vec![
        Component::service("nsq_service").infrastructure(),
        Component::worker("bucket_reader", LifecycleKind::Application),
        Component::worker("fetch", LifecycleKind::Service),
        Component::worker("store", LifecycleKind::Service),
        Component::special("cluster"),
    ];

    let stages = vec![
        Stage::builder("bucket_reader")
            .build(["nsq_service", "bucket_reader"])
            .start("nsq_service")
            .start("bucket_reader")
            .verify(Check::post_test("bucket_reader_test", "bucket_reader_post_test.go"))
            .finish()
            .unwrap(),
        Stage::builder("fetch")
            .requires("bucket_reader")
            .build(["fetch"])
            .start("fetch")
            .verify(Check::post_test("fetch_test", "fetch_post_test.go"))
            .finish()
            .unwrap(),
        Stage::builder("store")
            .requires("fetch")
            .build(["store"])
            .start("store")
            .verify(Check::post_test("store_test", "store_post_test.go"))
            .verify(Check::post_test("store_files_test", "store_files_post_test.go"))
            .memoize_on("store_test")
            .finish()
            .unwrap(),
        Stage::builder("replicate")
            .start("cluster")
            .verify(Check::post_test("replicate_test", "replicate_post_test.go"))
            .finish()
            .unwrap(),
        Stage::builder("audit")
            .requires("replicate")
            .verify(Check::post_test("audit_test", "audit_post_test.go"))
            .finish()
            .unwrap(),
    ];

    StageRegistry::new(components, stages).unwrap()
}
