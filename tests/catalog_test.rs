//! The full pipeline catalog driven against fakes, on a paused clock so
//! settle periods cost nothing.

mod common;

use common::{temp_dir, CheckOutcome, FakeWorld};
use ingest_harness::application::{pipeline_catalog, ReportOutput};
use ingest_harness::domain::models::StageState;
use ingest_harness::{Config, Orchestrator, RunnerOptions};
use std::time::Duration;
use tempfile::TempDir;

/// Config whose log dir already holds both updated-bag fingerprints.
fn config_with_recorder_log() -> (TempDir, Config) {
    let dir = temp_dir();
    std::fs::write(
        dir.path().join("apt_record.json"),
        "{\"etag\":\"ec520876f7c87e24f926a8efea390b26\"}\n\
         {\"etag\":\"bf01126663915a4f5d135a37443b8349\"}\n",
    )
    .unwrap();

    let mut config = Config::default();
    config.paths.log_dir = dir.path().display().to_string();
    (dir, config)
}

fn orchestrator(world: &FakeWorld, config: &Config) -> Orchestrator {
    Orchestrator::new(
        pipeline_catalog::registry(config).unwrap(),
        world.harness(),
        RunnerOptions {
            report_output: ReportOutput::Silent,
            revive_prerequisite_services: true,
        },
    )
}

fn recorded_names(orchestrator: &Orchestrator) -> Vec<String> {
    orchestrator
        .report()
        .entries()
        .iter()
        .map(|e| e.name.clone())
        .collect()
}

#[tokio::test(start_paused = true)]
async fn test_fixity_runs_whole_ingest_chain() {
    let (_dir, config) = config_with_recorder_log();
    let world = FakeWorld::new();
    let mut orchestrator = orchestrator(&world, &config);

    assert!(orchestrator.run("apt_fixity", false).await.unwrap());

    assert_eq!(
        recorded_names(&orchestrator),
        [
            "apt_bucket_reader_test",
            "apt_fetch_test",
            "apt_store_test",
            "apt_record_test",
            "apt_ingest_test",
            "apt_update_test",
            "apt_mark_for_restore",
            "apt_mark_for_delete",
            "apt_queue_test",
            "apt_restore_test",
            "apt_fixity_test",
        ]
    );
    for stage in ["apt_bucket_reader", "apt_ingest", "apt_queue", "apt_restore", "apt_fixity"] {
        assert_eq!(orchestrator.stage_state(stage), StageState::Passed, "{stage}");
    }
    assert_eq!(world.events.count("stop_all"), 1);
}

#[tokio::test(start_paused = true)]
async fn test_bucket_reader_resets_backend_before_starting() {
    let (_dir, config) = config_with_recorder_log();
    let world = FakeWorld::new();
    let mut orchestrator = orchestrator(&world, &config);

    let started = tokio::time::Instant::now();
    assert!(orchestrator.run("apt_bucket_reader", false).await.unwrap());

    let reset = world.events.position("reset").unwrap();
    let fixtures = world.events.position("fixtures").unwrap();
    let backend = world.events.position("start:pharos").unwrap();
    let build = world.events.position("build:apt_bucket_reader").unwrap();
    assert!(build < reset);
    assert!(reset < fixtures);
    assert!(fixtures < backend);

    // 10s for the broker, 5s for the reader's items to land
    assert!(started.elapsed() >= Duration::from_secs(15));
}

#[tokio::test(start_paused = true)]
async fn test_ingest_reruns_bucket_reader_for_update() {
    let (_dir, config) = config_with_recorder_log();
    let world = FakeWorld::new();
    let mut orchestrator = orchestrator(&world, &config);

    assert!(orchestrator.run("apt_ingest", false).await.unwrap());
    assert_eq!(world.events.count("start:apt_bucket_reader"), 2);

    let rerun = world
        .events
        .all()
        .iter()
        .rposition(|e| e == "start:apt_bucket_reader")
        .unwrap();
    let update = world.events.position("check:apt_update_test").unwrap();
    let ingest = world.events.position("check:apt_ingest_test").unwrap();
    assert!(ingest < rerun);
    assert!(rerun < update);
}

#[tokio::test(start_paused = true)]
async fn test_update_check_runs_without_readiness_signal() {
    let dir = temp_dir();
    let mut config = Config::default();
    config.paths.log_dir = dir.path().display().to_string();
    config.timing.readiness_timeout_secs = 20;

    let world = FakeWorld::new();
    let mut orchestrator = orchestrator(&world, &config);

    assert!(orchestrator.run("apt_ingest", false).await.unwrap());
    assert!(world.events.contains("check:apt_update_test"));
}

#[tokio::test(start_paused = true)]
async fn test_queue_and_delete_share_memoized_ingest() {
    let (_dir, config) = config_with_recorder_log();
    let world = FakeWorld::new();
    let mut orchestrator = orchestrator(&world, &config);

    assert!(orchestrator.run("apt_restore", true).await.unwrap());
    assert!(orchestrator.run("apt_delete", false).await.unwrap());

    assert_eq!(world.events.count("check:apt_record_test"), 1);
    assert_eq!(world.events.count("check:apt_queue_test"), 1);
    assert_eq!(world.events.count("check:apt_delete_test"), 1);
    assert_eq!(world.events.count("stop_all"), 1);
}

#[tokio::test(start_paused = true)]
async fn test_failed_store_check_skips_queue() {
    let (_dir, config) = config_with_recorder_log();
    let world = FakeWorld::new().check("apt_store_test", CheckOutcome::Fail);
    let mut orchestrator = orchestrator(&world, &config);

    assert!(!orchestrator.run("apt_queue", false).await.unwrap());
    assert_eq!(orchestrator.stage_state("apt_ingest"), StageState::Failed);
    assert_eq!(orchestrator.stage_state("apt_queue"), StageState::Skipped);
    assert!(!world.events.contains("build:apt_queue"));
    assert_eq!(orchestrator.report().get("apt_store_test"), Some(false));
}

#[tokio::test(start_paused = true)]
async fn test_replication_starts_cluster_once() {
    let (_dir, config) = config_with_recorder_log();
    let world = FakeWorld::new();
    let mut orchestrator = orchestrator(&world, &config);

    assert!(orchestrator.run("dpn_replicate", false).await.unwrap());

    assert_eq!(world.events.count("cluster_start:dpn_cluster"), 1);
    assert_eq!(orchestrator.stage_state("dpn_sync"), StageState::Passed);
    assert_eq!(orchestrator.stage_state("dpn_rest_client"), StageState::Passed);
    assert_eq!(
        world.events.all().last().map(String::as_str),
        Some("cluster_stop")
    );
}

#[tokio::test(start_paused = true)]
async fn test_units_start_nothing() {
    let (_dir, config) = config_with_recorder_log();
    let world = FakeWorld::new();
    let mut orchestrator = orchestrator(&world, &config);

    assert!(orchestrator.run("units", false).await.unwrap());
    assert_eq!(world.events.all(), ["prepare", "check:unit_tests", "stop_all"]);
}
