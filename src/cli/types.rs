//! CLI type definitions
//!
//! This module contains the clap structure that defines the CLI interface.

use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "ingest-harness")]
#[command(about = "Builds, starts and verifies the ingest pipeline end to end", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Stage to run (see --list)
    pub stage: Option<String>,

    /// Debug-level logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Set up and migrate the replication cluster before starting it
    #[arg(short, long)]
    pub initialize: bool,

    /// Print a JSON run summary instead of the text report
    #[arg(long)]
    pub json: bool,

    /// Show the stages a run would execute, without running anything
    #[arg(long)]
    pub plan: bool,

    /// List the available stages
    #[arg(long)]
    pub list: bool,

    /// Extra configuration file, layered over the project config
    #[arg(short, long, env = "INGEST_HARNESS_CONFIG")]
    pub config: Option<PathBuf>,

    /// Abort the whole run after this many seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Do not clear logs, staging, restore, binaries and broker data first
    #[arg(long)]
    pub keep_workspace: bool,
}
