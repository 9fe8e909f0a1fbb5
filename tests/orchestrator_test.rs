//! Stage engine behavior against in-memory fakes

mod common;

use common::{small_registry, CheckOutcome, FakeWorld};
use ingest_harness::application::ReportOutput;
use ingest_harness::domain::models::StageState;
use ingest_harness::{HarnessError, Orchestrator, RunnerOptions};

fn orchestrator(world: &FakeWorld) -> Orchestrator {
    orchestrator_with(world, true)
}

fn orchestrator_with(world: &FakeWorld, revive: bool) -> Orchestrator {
    Orchestrator::new(
        small_registry(),
        world.harness(),
        RunnerOptions {
            report_output: ReportOutput::Silent,
            revive_prerequisite_services: revive,
        },
    )
}

#[tokio::test]
async fn test_fetch_runs_bucket_reader_first() {
    let world = FakeWorld::new();
    let mut orchestrator = orchestrator(&world);

    let passed = orchestrator.run("fetch", false).await.unwrap();
    assert!(passed);

    assert_eq!(
        world.events.all(),
        [
            "prepare",
            "build:nsq_service",
            "build:bucket_reader",
            "start:nsq_service",
            "start:bucket_reader",
            "check:bucket_reader_test",
            "build:fetch",
            "start:fetch",
            "check:fetch_test",
            "stop_all",
        ]
    );

    let names: Vec<&str> = orchestrator
        .report()
        .entries()
        .iter()
        .map(|e| e.name.as_str())
        .collect();
    assert_eq!(names, ["bucket_reader_test", "fetch_test"]);
    assert_eq!(orchestrator.stage_state("bucket_reader"), StageState::Passed);
    assert_eq!(orchestrator.stage_state("fetch"), StageState::Passed);
}

#[tokio::test]
async fn test_failed_prerequisite_skips_dependent() {
    let world = FakeWorld::new().check("bucket_reader_test", CheckOutcome::Fail);
    let mut orchestrator = orchestrator(&world);

    let passed = orchestrator.run("fetch", false).await.unwrap();
    assert!(!passed);

    assert!(!world.events.contains("build:fetch"));
    assert!(!world.events.contains("start:fetch"));
    assert!(!orchestrator.report().contains("fetch_test"));
    assert_eq!(orchestrator.report().get("bucket_reader_test"), Some(false));
    assert_eq!(orchestrator.stage_state("bucket_reader"), StageState::Failed);
    assert_eq!(orchestrator.stage_state("fetch"), StageState::Skipped);
    assert_eq!(world.events.count("stop_all"), 1);
}

#[tokio::test]
async fn test_skip_cascades_through_chain() {
    let world = FakeWorld::new().fail_build("bucket_reader");
    let mut orchestrator = orchestrator(&world);

    assert!(!orchestrator.run("store", false).await.unwrap());
    assert_eq!(orchestrator.stage_state("bucket_reader"), StageState::Aborted);
    assert_eq!(orchestrator.stage_state("fetch"), StageState::Skipped);
    assert_eq!(orchestrator.stage_state("store"), StageState::Skipped);
    assert!(orchestrator.report().is_empty());
    assert_eq!(world.events.count("stop_all"), 1);
}

#[tokio::test]
async fn test_memoized_stage_not_rerun() {
    let world = FakeWorld::new();
    let mut orchestrator = orchestrator(&world);

    assert!(orchestrator.run("bucket_reader", true).await.unwrap());
    assert!(!world.events.contains("stop_all"));

    assert!(orchestrator.run("fetch", false).await.unwrap());
    assert_eq!(world.events.count("build:bucket_reader"), 1);
    assert_eq!(world.events.count("start:bucket_reader"), 1);
    assert_eq!(world.events.count("check:bucket_reader_test"), 1);

    // requested again directly: same outcome, no side effects
    world.events.clear();
    assert!(orchestrator.run("bucket_reader", false).await.unwrap());
    assert_eq!(world.events.all(), ["stop_all"]);
}

#[tokio::test]
async fn test_memoized_failure_is_reused() {
    let world = FakeWorld::new().check("fetch_test", CheckOutcome::Fail);
    let mut orchestrator = orchestrator(&world);

    assert!(!orchestrator.run("fetch", true).await.unwrap());
    assert!(!orchestrator.run("store", false).await.unwrap());
    assert_eq!(world.events.count("check:fetch_test"), 1);
    assert_eq!(orchestrator.stage_state("store"), StageState::Skipped);
    assert!(!world.events.contains("build:store"));
}

#[tokio::test]
async fn test_repeated_request_returns_first_outcome() {
    let world = FakeWorld::new().check("replicate_test", CheckOutcome::Fail);
    let mut orchestrator = orchestrator(&world);

    assert!(!orchestrator.run("replicate", true).await.unwrap());
    let first = orchestrator.run("bucket_reader", true).await.unwrap();
    let second = orchestrator.run("bucket_reader", true).await.unwrap();

    assert!(!first);
    assert_eq!(first, second);
    assert_eq!(world.events.count("check:bucket_reader_test"), 1);
}

#[tokio::test]
async fn test_memoized_prerequisite_counts_earlier_failures() {
    let world = FakeWorld::new().check("replicate_test", CheckOutcome::Fail);
    let mut orchestrator = orchestrator(&world);

    // fresh prerequisite: the earlier failure makes it report false
    orchestrator.run("replicate", true).await.unwrap();
    assert!(!orchestrator.run("fetch", true).await.unwrap());
    assert_eq!(orchestrator.stage_state("fetch"), StageState::Skipped);

    // memoized prerequisite: same decision
    let world = FakeWorld::new().check("replicate_test", CheckOutcome::Fail);
    let mut orchestrator = crate::orchestrator(&world);
    orchestrator.run("bucket_reader", true).await.unwrap();
    orchestrator.run("replicate", true).await.unwrap();
    assert!(!orchestrator.run("fetch", true).await.unwrap());
    assert_eq!(orchestrator.stage_state("fetch"), StageState::Skipped);
}

#[tokio::test]
async fn test_checks_continue_after_a_failure() {
    let world = FakeWorld::new().check("store_test", CheckOutcome::Fail);
    let mut orchestrator = orchestrator(&world);

    assert!(!orchestrator.run("store", false).await.unwrap());
    assert!(world.events.contains("check:store_files_test"));
    assert_eq!(orchestrator.report().get("store_files_test"), Some(true));
    assert_eq!(orchestrator.stage_state("store"), StageState::Failed);
}

#[tokio::test]
async fn test_check_error_aborts_and_cleans_up() {
    let world = FakeWorld::new().check("fetch_test", CheckOutcome::Error);
    let mut orchestrator = orchestrator(&world);

    assert!(!orchestrator.run("fetch", false).await.unwrap());
    assert_eq!(orchestrator.report().get("fetch_test"), Some(false));
    assert_eq!(orchestrator.stage_state("fetch"), StageState::Aborted);
    assert_eq!(world.events.count("stop_all"), 1);
    assert!(!world.is_alive("fetch"));
}

#[tokio::test]
async fn test_panicking_check_does_not_escape() {
    let world = FakeWorld::new().check("bucket_reader_test", CheckOutcome::Panic);
    let mut orchestrator = orchestrator(&world);

    let passed = orchestrator.run("bucket_reader", false).await.unwrap();
    assert!(!passed);
    assert_eq!(orchestrator.stage_state("bucket_reader"), StageState::Aborted);
    assert_eq!(world.events.count("stop_all"), 1);
}

#[tokio::test]
async fn test_start_failure_aborts_before_checks() {
    let world = FakeWorld::new().fail_start("bucket_reader");
    let mut orchestrator = orchestrator(&world);

    assert!(!orchestrator.run("bucket_reader", false).await.unwrap());
    assert!(!world.events.contains("check:bucket_reader_test"));
    assert_eq!(orchestrator.stage_state("bucket_reader"), StageState::Aborted);
    assert!(world.events.contains("stop_all"));
}

#[tokio::test]
async fn test_more_stages_follow_keeps_services_up() {
    let world = FakeWorld::new();
    let mut orchestrator = orchestrator(&world);

    assert!(orchestrator.run("fetch", true).await.unwrap());
    assert!(!world.events.contains("stop_all"));
    assert!(world.is_alive("nsq_service"));
    assert!(world.is_alive("fetch"));

    orchestrator.shutdown().await;
    assert!(!world.is_alive("fetch"));
}

#[tokio::test]
async fn test_unknown_stage_is_usage_error() {
    let world = FakeWorld::new();
    let mut orchestrator = orchestrator(&world);

    let err = orchestrator.run("nope", false).await.unwrap_err();
    assert!(matches!(err, HarnessError::UnknownStage(ref name) if name == "nope"));
    assert!(err.is_usage_error());
    assert!(world.events.all().is_empty());
}

#[tokio::test]
async fn test_dead_prerequisite_service_is_revived() {
    let world = FakeWorld::new();
    let mut orchestrator = orchestrator(&world);

    assert!(orchestrator.run("bucket_reader", true).await.unwrap());
    world.kill("nsq_service");

    assert!(orchestrator.run("fetch", false).await.unwrap());
    assert_eq!(world.events.count("start:nsq_service"), 2);
    // applications are never re-run by a revive
    assert_eq!(world.events.count("start:bucket_reader"), 1);
}

#[tokio::test]
async fn test_revive_can_be_disabled() {
    let world = FakeWorld::new();
    let mut orchestrator = orchestrator_with(&world, false);

    assert!(orchestrator.run("bucket_reader", true).await.unwrap());
    world.kill("nsq_service");

    assert!(orchestrator.run("fetch", false).await.unwrap());
    assert_eq!(world.events.count("start:nsq_service"), 1);
}

#[tokio::test]
async fn test_special_component_goes_to_cluster() {
    let world = FakeWorld::new();
    let mut orchestrator = orchestrator(&world);

    assert!(orchestrator.run("replicate", false).await.unwrap());
    let events = world.events.all();
    let start = world.events.position("cluster_start:cluster").unwrap();
    let check = world.events.position("check:replicate_test").unwrap();
    assert!(start < check);
    assert_eq!(events.last().map(String::as_str), Some("cluster_stop"));
}

#[tokio::test]
async fn test_dead_cluster_is_revived() {
    let world = FakeWorld::new();
    let mut orchestrator = orchestrator(&world);

    assert!(orchestrator.run("replicate", true).await.unwrap());
    world.kill_cluster();

    assert!(orchestrator.run("audit", false).await.unwrap());
    assert_eq!(world.events.count("cluster_start:cluster"), 2);
    assert_eq!(world.events.count("check:replicate_test"), 1);
}

#[tokio::test]
async fn test_prepare_runs_once_per_orchestrator() {
    let world = FakeWorld::new();
    let mut orchestrator = orchestrator(&world);

    orchestrator.run("bucket_reader", true).await.unwrap();
    orchestrator.run("replicate", false).await.unwrap();
    assert_eq!(world.events.count("prepare"), 1);
}

#[tokio::test]
async fn test_report_keeps_recording_order() {
    let world = FakeWorld::new();
    let mut orchestrator = orchestrator(&world);

    // replicate first, then a chain whose prerequisites record later
    orchestrator.run("replicate", true).await.unwrap();
    orchestrator.run("store", false).await.unwrap();

    let rendered = orchestrator.report().render();
    let position = |name: &str| rendered.find(name).unwrap();
    assert!(position("replicate_test") < position("bucket_reader_test"));
    assert!(position("bucket_reader_test") < position("fetch_test"));
    assert!(position("fetch_test") < position("store_test"));
    assert_eq!(orchestrator.stage_states().len(), 4);
}

#[test]
fn test_plan_lists_prerequisites_first() {
    let world = FakeWorld::new();
    let orchestrator = orchestrator(&world);
    assert_eq!(
        orchestrator.plan("store").unwrap(),
        ["bucket_reader", "fetch", "store"]
    );
}
