//! Configuration management infrastructure
//!
//! Hierarchical configuration using figment:
//! - YAML file loading
//! - Legacy root variables (`EXCHANGE_ROOT`, `PHAROS_ROOT`, `DPN_SERVER_ROOT`)
//! - `INGEST_HARNESS_*` environment overrides
//! - Configuration validation

pub mod loader;

pub use loader::{ConfigError, ConfigLoader};
