//! Infrastructure layer module
//!
//! Adapters behind the domain ports plus the ambient plumbing:
//! - Configuration loading (figment)
//! - Logging (tracing-subscriber)
//! - OS process supervision
//! - Go toolchain builds and checks
//! - REST backend and replication cluster control
//! - Scratch workspace preparation

pub mod backend;
pub mod config;
pub mod logging;
pub mod process;
pub mod toolchain;
pub mod workspace;
