use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use std::path::Path;
use thiserror::Error;

use crate::domain::models::config::Config;

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("paths.{0} must be set (or the matching root variable exported)")]
    MissingPath(&'static str),

    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("Invalid log format: {0}. Must be one of: json, pretty")]
    InvalidLogFormat(String),

    #[error("Invalid readiness_poll_secs: 0. Must be at least 1")]
    ZeroPollInterval,

    #[error(
        "Invalid readiness timing: readiness_timeout_secs ({0}) must be at least readiness_poll_secs ({1})"
    )]
    InvalidReadinessTimeout(u64, u64),

    #[error("{0} cannot be empty")]
    EmptyCommand(&'static str),
}

/// Legacy variables the harness has always been driven by.
const ROOT_VARIABLES: [&str; 3] = ["EXCHANGE_ROOT", "PHAROS_ROOT", "DPN_SERVER_ROOT"];

/// Configuration loader with hierarchical merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with hierarchical merging
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults (Serialized)
    /// 2. .ingest-harness/config.yaml
    /// 3. .ingest-harness/local.yaml
    /// 4. `explicit` file, when given
    /// 5. `EXCHANGE_ROOT`, `PHAROS_ROOT`, `DPN_SERVER_ROOT`
    /// 6. `INGEST_HARNESS_*` variables, `__` separating sections
    pub fn load(explicit: Option<&Path>) -> Result<Config> {
        let mut figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(".ingest-harness/config.yaml"))
            .merge(Yaml::file(".ingest-harness/local.yaml"));

        if let Some(path) = explicit {
            if !path.exists() {
                anyhow::bail!("Config file {} does not exist", path.display());
            }
            figment = figment.merge(Yaml::file(path));
        }

        let config: Config = figment
            .merge(Self::root_variables())
            .merge(Env::prefixed("INGEST_HARNESS_").split("__"))
            .extract()
            .context("Failed to extract configuration from figment")?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific file, ignoring the environment
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(path.as_ref()))
            .extract()
            .context(format!(
                "Failed to load config from {}",
                path.as_ref().display()
            ))?;

        Self::validate(&config)?;
        Ok(config)
    }

    fn root_variables() -> Env {
        Env::raw()
            .only(&ROOT_VARIABLES)
            .map(|key| format!("paths.{}", key.as_str().to_ascii_lowercase()).into())
    }

    /// Validate configuration after loading
    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        let paths = &config.paths;
        for (field, value) in [
            ("exchange_root", &paths.exchange_root),
            ("pharos_root", &paths.pharos_root),
            ("dpn_server_root", &paths.dpn_server_root),
            ("bin_dir", &paths.bin_dir),
            ("log_dir", &paths.log_dir),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::MissingPath(field));
            }
        }

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&config.logging.level.as_str()) {
            return Err(ConfigError::InvalidLogLevel(config.logging.level.clone()));
        }

        let valid_log_formats = ["json", "pretty"];
        if !valid_log_formats.contains(&config.logging.format.as_str()) {
            return Err(ConfigError::InvalidLogFormat(config.logging.format.clone()));
        }

        let timing = &config.timing;
        if timing.readiness_poll_secs == 0 {
            return Err(ConfigError::ZeroPollInterval);
        }
        if timing.readiness_timeout_secs < timing.readiness_poll_secs {
            return Err(ConfigError::InvalidReadinessTimeout(
                timing.readiness_timeout_secs,
                timing.readiness_poll_secs,
            ));
        }

        for (field, command) in [
            ("backend.reset_command", &config.backend.reset_command),
            ("backend.fixtures_command", &config.backend.fixtures_command),
            ("cluster.setup_command", &config.cluster.setup_command),
            ("cluster.migrate_command", &config.cluster.migrate_command),
            ("cluster.run_command", &config.cluster.run_command),
        ] {
            if command.is_empty() {
                return Err(ConfigError::EmptyCommand(field));
            }
        }

        Ok(())
    }
}
