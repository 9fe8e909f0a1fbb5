//! Port trait definitions (Hexagonal Architecture)
//!
//! Async trait interfaces the stage runner drives and infrastructure
//! adapters implement:
//! - ComponentBuilder: compile a component into a binary
//! - ProcessSupervisor: start/stop components and track what is running
//! - CheckRunner: execute verification checks
//! - RestBackend: out-of-band reset and fixture loading for the REST backend
//! - ClusterControl: bespoke bring-up for special components

pub mod backend;
pub mod builder;
pub mod check_runner;
pub mod cluster;
pub mod supervisor;

pub use backend::RestBackend;
pub use builder::{BuildArtifact, ComponentBuilder};
pub use check_runner::CheckRunner;
pub use cluster::ClusterControl;
pub use supervisor::ProcessSupervisor;
