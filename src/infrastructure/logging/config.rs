use crate::domain::models::config::LoggingConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format (json, pretty)
    #[serde(default = "default_format")]
    pub format: LogFormat,

    /// JSON log file written alongside stderr (optional)
    pub file: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    Pretty,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_format(),
            file: None,
        }
    }
}

impl LogConfig {
    /// Build from the loaded configuration; `verbose` forces debug level.
    pub fn from_settings(settings: &LoggingConfig, verbose: bool) -> Self {
        let level = if verbose {
            "debug".to_string()
        } else {
            settings.level.clone()
        };
        let format = if settings.format == "json" {
            LogFormat::Json
        } else {
            LogFormat::Pretty
        };
        Self {
            level,
            format,
            file: settings.file.as_ref().map(PathBuf::from),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

const fn default_format() -> LogFormat {
    LogFormat::Pretty
}
