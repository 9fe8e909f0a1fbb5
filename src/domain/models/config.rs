use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Main configuration structure for the harness
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    /// Source roots and scratch directories
    #[serde(default)]
    pub paths: PathsConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Waits, grace periods and the optional run timeout
    #[serde(default)]
    pub timing: TimingConfig,

    /// Environment shared by every spawned process
    #[serde(default)]
    pub process: ProcessConfig,

    /// REST backend maintenance commands
    #[serde(default)]
    pub backend: BackendConfig,

    /// Replication cluster bring-up commands
    #[serde(default)]
    pub cluster: ClusterConfig,

    /// Go toolchain used for builds and checks
    #[serde(default)]
    pub toolchain: ToolchainConfig,

    /// Stage runner behavior
    #[serde(default)]
    pub runner: RunnerConfig,
}

/// Source roots and scratch directories
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct PathsConfig {
    /// Root of the pipeline source tree (apps/, integration/, config/)
    #[serde(default)]
    pub exchange_root: String,

    /// Root of the REST backend application
    #[serde(default)]
    pub pharos_root: String,

    /// Root of the replication cluster scripts
    #[serde(default)]
    pub dpn_server_root: String,

    /// Where built binaries land
    #[serde(default = "default_bin_dir")]
    pub bin_dir: String,

    /// Where component logs are written
    #[serde(default = "default_log_dir")]
    pub log_dir: String,

    /// Worker staging area, emptied before each run
    #[serde(default = "default_staging_dir")]
    pub staging_dir: String,

    /// Restoration output, emptied before each run
    #[serde(default = "default_restore_dir")]
    pub restore_dir: String,

    /// Message broker data, emptied before each run
    #[serde(default = "default_nsq_data_dir")]
    pub nsq_data_dir: String,
}

fn home_tmp(leaf: &str) -> String {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    format!("{home}/tmp/{leaf}")
}

fn default_bin_dir() -> String {
    home_tmp("bin")
}

fn default_log_dir() -> String {
    home_tmp("logs")
}

fn default_staging_dir() -> String {
    home_tmp("staging")
}

fn default_restore_dir() -> String {
    home_tmp("restore")
}

fn default_nsq_data_dir() -> String {
    home_tmp("nsq")
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            exchange_root: String::new(),
            pharos_root: String::new(),
            dpn_server_root: String::new(),
            bin_dir: default_bin_dir(),
            log_dir: default_log_dir(),
            staging_dir: default_staging_dir(),
            restore_dir: default_restore_dir(),
            nsq_data_dir: default_nsq_data_dir(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: json or pretty
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Optional JSON log file, in addition to stderr
    #[serde(default)]
    pub file: Option<String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            file: None,
        }
    }
}

/// Waits, grace periods and the optional run timeout
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct TimingConfig {
    /// How long a stopped service gets to exit before it is killed
    #[serde(default = "default_stop_grace_secs")]
    pub stop_grace_secs: u64,

    /// Log polling cadence for readiness waits
    #[serde(default = "default_readiness_poll_secs")]
    pub readiness_poll_secs: u64,

    /// Upper bound for a single readiness wait
    #[serde(default = "default_readiness_timeout_secs")]
    pub readiness_timeout_secs: u64,

    /// Abort the whole run after this many seconds
    #[serde(default)]
    pub run_timeout_secs: Option<u64>,
}

const fn default_stop_grace_secs() -> u64 {
    10
}

const fn default_readiness_poll_secs() -> u64 {
    5
}

const fn default_readiness_timeout_secs() -> u64 {
    120
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            stop_grace_secs: default_stop_grace_secs(),
            readiness_poll_secs: default_readiness_poll_secs(),
            readiness_timeout_secs: default_readiness_timeout_secs(),
            run_timeout_secs: None,
        }
    }
}

/// Environment shared by every spawned process
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ProcessConfig {
    /// Worker config, relative to the exchange root
    #[serde(default = "default_integration_config")]
    pub integration_config: String,

    /// Message broker config, relative to the exchange root
    #[serde(default = "default_queue_config")]
    pub queue_config: String,

    /// Extra variables layered over the inherited environment
    #[serde(default = "default_env")]
    pub env: BTreeMap<String, String>,

    /// File in the backend root naming the ruby version to run with
    #[serde(default = "default_ruby_version_file")]
    pub ruby_version_file: String,
}

fn default_integration_config() -> String {
    "config/integration.json".to_string()
}

fn default_queue_config() -> String {
    "config/nsq/integration.config".to_string()
}

fn default_env() -> BTreeMap<String, String> {
    BTreeMap::from([("RAILS_ENV".to_string(), "integration".to_string())])
}

fn default_ruby_version_file() -> String {
    ".ruby-version".to_string()
}

impl Default for ProcessConfig {
    fn default() -> Self {
        Self {
            integration_config: default_integration_config(),
            queue_config: default_queue_config(),
            env: default_env(),
            ruby_version_file: default_ruby_version_file(),
        }
    }
}

/// REST backend maintenance commands, run in the backend root
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct BackendConfig {
    #[serde(default = "default_reset_command")]
    pub reset_command: Vec<String>,

    #[serde(default = "default_fixtures_command")]
    pub fixtures_command: Vec<String>,
}

fn words(command: &str) -> Vec<String> {
    command.split_whitespace().map(String::from).collect()
}

fn default_reset_command() -> Vec<String> {
    words("rbenv exec rake pharos:empty_db")
}

fn default_fixtures_command() -> Vec<String> {
    words("rbenv exec rake db:fixtures:load")
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            reset_command: default_reset_command(),
            fixtures_command: default_fixtures_command(),
        }
    }
}

/// Replication cluster bring-up, run in the cluster root
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ClusterConfig {
    /// Run the setup and migrate phases before starting the cluster
    #[serde(default)]
    pub initialize: bool,

    #[serde(default = "default_setup_command")]
    pub setup_command: Vec<String>,

    #[serde(default = "default_migrate_command")]
    pub migrate_command: Vec<String>,

    #[serde(default = "default_run_command")]
    pub run_command: Vec<String>,

    /// Prefix of per-node log files removed before each start
    #[serde(default = "default_stale_log_prefix")]
    pub stale_log_prefix: String,
}

fn default_setup_command() -> Vec<String> {
    words("bundle exec ./script/setup_cluster.rb")
}

fn default_migrate_command() -> Vec<String> {
    words("bundle exec ./script/migrate_cluster.rb")
}

fn default_run_command() -> Vec<String> {
    words("bundle exec ./script/run_cluster.rb")
}

fn default_stale_log_prefix() -> String {
    "impersonate".to_string()
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            initialize: false,
            setup_command: default_setup_command(),
            migrate_command: default_migrate_command(),
            run_command: default_run_command(),
            stale_log_prefix: default_stale_log_prefix(),
        }
    }
}

/// Go toolchain used for builds and checks
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ToolchainConfig {
    #[serde(default = "default_go_binary")]
    pub go_binary: String,
}

fn default_go_binary() -> String {
    "go".to_string()
}

impl Default for ToolchainConfig {
    fn default() -> Self {
        Self {
            go_binary: default_go_binary(),
        }
    }
}

/// Stage runner behavior
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RunnerConfig {
    /// Restart services of a memoized prerequisite that are no longer running
    #[serde(default = "default_true")]
    pub revive_prerequisite_services: bool,
}

const fn default_true() -> bool {
    true
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            revive_prerequisite_services: true,
        }
    }
}
