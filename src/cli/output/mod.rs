//! CLI output formatting module
//!
//! Stage tables for humans and a serializable run summary for `--json`.

pub mod summary;
pub mod table;

pub use summary::{RunSummary, StageSummary};
pub use table::TableFormatter;
