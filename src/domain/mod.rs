//! Domain layer for the integration harness
//!
//! Core types (components, stages, checks, configuration), the error
//! taxonomy, and the port traits every external collaborator implements.

pub mod errors;
pub mod models;
pub mod ports;

pub use errors::{HarnessError, HarnessResult};
