//! Service layer
//!
//! Stateless helpers the stage runner composes: outcome bookkeeping,
//! log-based readiness waits, and prerequisite resolution.

pub mod dependency_resolver;
pub mod readiness_watcher;
pub mod result_report;

pub use dependency_resolver::DependencyResolver;
pub use readiness_watcher::ReadinessWatcher;
pub use result_report::{ResultEntry, ResultReport};
