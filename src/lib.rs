//! Ingest Harness - integration-test orchestrator for the ingest pipeline
//!
//! Builds the pipeline's worker binaries, starts the services they depend
//! on, runs verification checks stage by stage and tears everything down,
//! running prerequisite stages first and only once per invocation.
//!
//! # Architecture
//!
//! - **Domain Layer** (`domain`): Components, stages, errors and port traits
//! - **Service Layer** (`services`): Result report, readiness polling, stage graph
//! - **Application Layer** (`application`): Stage registry, runner and orchestrator
//! - **Infrastructure Layer** (`infrastructure`): OS processes, toolchain, config, logging
//! - **CLI Layer** (`cli`): Command-line interface
//!
//! # Example
//!
//! ```ignore
//! use ingest_harness::application::{pipeline_catalog, Orchestrator, RunnerOptions};
//! use ingest_harness::cli::commands::run::os_harness;
//!
//! let config = ingest_harness::ConfigLoader::load(None)?;
//! let registry = pipeline_catalog::registry(&config)?;
//! let harness = os_harness(&config, registry.components());
//! let mut orchestrator = Orchestrator::new(registry, harness, RunnerOptions::default());
//! let passed = orchestrator.run("apt_ingest", false).await?;
//! ```

pub mod application;
pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export commonly used types for convenience
pub use application::{Harness, Orchestrator, RunnerOptions, StageRegistry, StageRunner};
pub use domain::models::{Check, Component, Config, LifecycleKind, Stage, StageState, Step};
pub use domain::ports::{CheckRunner, ClusterControl, ComponentBuilder, ProcessSupervisor, RestBackend};
pub use domain::{HarnessError, HarnessResult};
pub use infrastructure::config::{ConfigError, ConfigLoader};
pub use services::{DependencyResolver, ReadinessWatcher, ResultReport};
