//! Application layer
//!
//! Stage registry, stage runner and orchestrator, plus the concrete
//! pipeline catalog they run.

pub mod orchestrator;
pub mod pipeline_catalog;
pub mod stage_registry;
pub mod stage_runner;

pub use orchestrator::Orchestrator;
pub use stage_registry::StageRegistry;
pub use stage_runner::{Harness, ReportOutput, RunnerOptions, StageRunner};
