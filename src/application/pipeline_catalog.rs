//! The ingest and replication pipeline as stages and components
//!
//! Ingest chain, each stage running the one before it first:
//!
//! 1. `apt_bucket_reader` scans receiving buckets, creates work items in the
//!    REST backend and queues them on the broker's fetch topic.
//! 2. `apt_ingest` runs fetch, store and record against those items, then
//!    re-ingests an updated bag and waits for its fingerprints to show up
//!    in the recorder's log.
//! 3. `apt_queue` marks objects for restore/delete and queues the requests.
//! 4. `apt_restore`, `apt_delete` and `apt_fixity` work off that queue.
//!
//! The replication stages run against a locally started node cluster.

use crate::application::stage_registry::StageRegistry;
use crate::domain::errors::HarnessResult;
use crate::domain::models::{
    Check, Component, Config, LifecycleKind, ReadinessCondition, Stage, WorkingDir,
};
use std::path::Path;
use std::time::Duration;

/// Fingerprints of the updated bags the update check expects to be recorded.
const UPDATED_BAG_ETAG: &str = "ec520876f7c87e24f926a8efea390b26";
const UPDATED_GLACIER_BAG_ETAG: &str = "bf01126663915a4f5d135a37443b8349";

/// Log the recorder writes one line per processed item to.
const RECORDER_LOG: &str = "apt_record.json";

const fn secs(n: u64) -> Duration {
    Duration::from_secs(n)
}

/// Every component the pipeline stages reference.
pub fn components() -> Vec<Component> {
    use LifecycleKind::{Application, Service};

    vec![
        Component::service("pharos")
            .external("rbenv")
            .with_args(["exec", "rails", "server"])
            .in_dir(WorkingDir::PharosRoot)
            .log_to("pharos.log")
            .infrastructure(),
        Component::service("nsq_service")
            .with_args(["-config", "{queue_config}"])
            .discard_output()
            .infrastructure(),
        Component::special("dpn_cluster"),
        Component::worker("apt_bucket_reader", Application),
        Component::worker("apt_volume_service", Service),
        Component::worker("apt_fetch", Service),
        Component::worker("apt_store", Service),
        Component::worker("apt_record", Service),
        Component::worker("apt_queue", Application),
        Component::worker("apt_restore", Service),
        Component::worker("apt_file_restore", Service),
        Component::worker("apt_file_delete", Service),
        Component::worker("apt_queue_fixity", Application).with_args(["-maxfiles=10"]),
        Component::worker("apt_fixity_check", Service),
        Component::worker("test_push_to_dpn", Application),
        Component::worker("dpn_queue", Application),
        Component::worker("dpn_package", Service),
        Component::worker("dpn_ingest_store", Service),
        Component::worker("dpn_ingest_record", Service),
        Component::worker("dpn_sync", Application),
        Component::worker("dpn_pharos_sync", Application),
        Component::worker("dpn_copy", Service),
        Component::worker("dpn_validate", Service),
        Component::worker("dpn_replication_store", Service),
    ]
}

/// Wait for a fingerprint in the recorder's log.
fn recorded(config: &Config, etag: &str) -> HarnessResult<ReadinessCondition> {
    ReadinessCondition::new(
        Path::new(&config.paths.log_dir).join(RECORDER_LOG),
        etag,
        secs(config.timing.readiness_poll_secs),
        secs(config.timing.readiness_timeout_secs),
    )
}

/// Every stage, in the order they are listed to the operator.
pub fn stages(config: &Config) -> HarnessResult<Vec<Stage>> {
    Ok(vec![
        Stage::builder("apt_bucket_reader")
            .describe("Test the bucket reader")
            .build(["nsq_service", "apt_bucket_reader"])
            .reset_backend()
            .load_fixtures()
            .start("pharos")
            .start("nsq_service")
            .settle(secs(10))
            .start("apt_bucket_reader")
            .then_settle(secs(5))
            .verify(Check::post_test("apt_bucket_reader_test", "apt_bucket_reader_post_test.go"))
            .finish()?,
        Stage::builder("apt_ingest")
            .describe("Test the ingest process: fetch, store, record and update")
            .requires("apt_bucket_reader")
            .build(["apt_volume_service", "apt_fetch", "apt_store", "apt_record"])
            .start("apt_volume_service")
            .settle(secs(5))
            .start("apt_fetch")
            // let the store topic fill before its consumer connects
            .settle(secs(30))
            .start("apt_store")
            .settle(secs(30))
            .start("apt_record")
            .settle(secs(30))
            .verify(Check::post_test("apt_fetch_test", "apt_fetch_post_test.go"))
            .verify(Check::post_test("apt_store_test", "apt_store_post_test.go"))
            .verify(Check::post_test("apt_record_test", "apt_record_post_test.go"))
            .verify(Check::post_test("apt_ingest_test", "apt_ingest_post_test.go"))
            .then_start("apt_bucket_reader")
            .await_log(recorded(config, UPDATED_BAG_ETAG)?)
            .await_log(recorded(config, UPDATED_GLACIER_BAG_ETAG)?)
            .verify(Check::post_test("apt_update_test", "apt_update_post_test.go"))
            .memoize_on("apt_record_test")
            .finish()?,
        Stage::builder("apt_queue")
            .describe("Test queueing of work items (runs apt_ingest)")
            .requires("apt_ingest")
            .build(["apt_queue"])
            .verify(Check::post_test("apt_mark_for_restore", "apt_mark_for_restore_test.go"))
            .verify(Check::post_test("apt_mark_for_delete", "apt_mark_for_delete_test.go"))
            // marking for delete runs a multi-step transaction in the backend
            .then_settle(secs(5))
            .then_start("apt_queue")
            .then_settle(secs(5))
            .verify(Check::post_test("apt_queue_test", "apt_queue_post_test.go"))
            .finish()?,
        Stage::builder("apt_restore")
            .describe("Test the restore processes (runs apt_queue)")
            .requires("apt_queue")
            .build(["apt_restore", "apt_file_restore", "apt_file_delete"])
            .start("apt_restore")
            .start("apt_file_restore")
            .start("apt_file_delete")
            .settle(secs(90))
            .verify(Check::post_test("apt_restore_test", "apt_restore_post_test.go"))
            .finish()?,
        Stage::builder("apt_delete")
            .describe("Test file deletion (runs apt_queue)")
            .requires("apt_queue")
            .build(["apt_file_delete"])
            .start("apt_file_delete")
            .settle(secs(60))
            .verify(Check::post_test("apt_delete_test", "apt_delete_post_test.go"))
            .finish()?,
        Stage::builder("apt_fixity")
            .describe("Test fixity checking (runs apt_restore)")
            .requires("apt_restore")
            .build(["apt_queue_fixity", "apt_fixity_check"])
            .start("apt_queue_fixity")
            .start("apt_fixity_check")
            .settle(secs(45))
            .verify(Check::post_test("apt_fixity_test", "apt_fixity_check_post_test.go"))
            .finish()?,
        Stage::builder("dpn_rest_client")
            .describe("Test the replication REST client against a local cluster")
            .start("dpn_cluster")
            .settle(secs(10))
            .verify(Check::integration_in(
                "dpn_rest_client_test",
                "dpn/network",
                "dpn_rest_client_test.go",
            ))
            .finish()?,
        Stage::builder("dpn_sync")
            .describe("Test replication sync against a local cluster")
            .build(["dpn_sync"])
            .reset_backend()
            .load_fixtures()
            .start("pharos")
            .start("dpn_cluster")
            .settle(secs(10))
            .start("dpn_sync")
            .verify(Check::post_test("dpn_sync_test", "dpn_sync_post_test.go"))
            .finish()?,
        Stage::builder("dpn_pharos_sync")
            .describe("Sync replicated bag records to the backend (runs dpn_sync)")
            .requires("dpn_sync")
            .build(["dpn_pharos_sync"])
            .start("dpn_pharos_sync")
            .verify(Check::post_test("dpn_pharos_sync_test", "dpn_pharos_sync_post_test.go"))
            .finish()?,
        Stage::builder("dpn_replicate")
            .describe("Test replication (runs dpn_sync and dpn_rest_client)")
            .requires("dpn_sync")
            .requires("dpn_rest_client")
            .build([
                "nsq_service",
                "dpn_queue",
                "dpn_copy",
                "dpn_validate",
                "dpn_replication_store",
            ])
            .start("nsq_service")
            .settle(secs(10))
            .start("dpn_queue")
            .settle(secs(5))
            .start("dpn_copy")
            .settle(secs(30))
            .start("dpn_validate")
            .settle(secs(30))
            .start("dpn_replication_store")
            .settle(secs(30))
            .verify(Check::post_test("dpn_queue_test", "dpn_queue_post_test.go"))
            .verify(Check::post_test("dpn_copy_test", "dpn_copy_post_test.go"))
            .verify(Check::post_test("dpn_validate_test", "dpn_validate_post_test.go"))
            .verify(Check::post_test(
                "dpn_replication_store_test",
                "dpn_replication_store_post_test.go",
            ))
            .finish()?,
        Stage::builder("dpn_ingest")
            .describe("Test pushing ingested bags to replication (runs apt_ingest)")
            .requires("apt_ingest")
            .build([
                "test_push_to_dpn",
                "dpn_queue",
                "dpn_package",
                "dpn_ingest_store",
                "dpn_ingest_record",
            ])
            .start("test_push_to_dpn")
            .verify(Check::post_test("apt_push_to_dpn_test", "apt_push_to_dpn_test.go"))
            .then_start("dpn_queue")
            .then_settle(secs(5))
            .then_start("dpn_package")
            .then_settle(secs(30))
            .verify(Check::post_test("dpn_package_test", "dpn_package_post_test.go"))
            .then_start("dpn_ingest_store")
            .then_settle(secs(30))
            .verify(Check::post_test("dpn_ingest_store_test", "dpn_ingest_store_post_test.go"))
            .then_start("dpn_ingest_record")
            .then_settle(secs(30))
            .verify(Check::post_test("dpn_ingest_record_test", "dpn_ingest_record_post_test.go"))
            .finish()?,
        Stage::builder("units")
            .describe("Run all unit tests; starts no services")
            .verify(Check::suite("unit_tests", ".", "./..."))
            .finish()?,
    ])
}

/// Validated registry of the whole pipeline.
pub fn registry(config: &Config) -> HarnessResult<StageRegistry> {
    StageRegistry::new(components(), stages(config)?)
}
