//! Command-line interface
//!
//! One positional stage name plus flags. Output goes to stdout (report,
//! tables, JSON); logs go to stderr.

pub mod commands;
pub mod output;
pub mod types;

pub use types::Cli;

/// Exit status for usage errors: missing or unknown stage, bad configuration.
pub const EXIT_USAGE: u8 = 2;

/// Exit status when any check failed or the run was interrupted.
pub const EXIT_FAILURE: u8 = 1;
