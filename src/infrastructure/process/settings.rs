//! Resolved process settings
//!
//! The loaded configuration is turned into this once at startup and handed
//! to every adapter that spawns a process, so directories, environment and
//! argument placeholders are enumerated in a single place.

use crate::domain::models::{Config, WorkingDir};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

#[derive(Debug, Clone)]
pub struct SupervisorSettings {
    pub exchange_root: PathBuf,
    pub pharos_root: PathBuf,
    pub dpn_server_root: PathBuf,
    pub bin_dir: PathBuf,
    pub log_dir: PathBuf,
    /// Layered over the inherited environment of every child
    pub env: BTreeMap<String, String>,
    pub stop_grace: Duration,
    placeholders: Vec<(String, String)>,
}

impl SupervisorSettings {
    pub fn from_config(config: &Config) -> Self {
        let paths = &config.paths;
        let exchange_root = PathBuf::from(&paths.exchange_root);
        let pharos_root = PathBuf::from(&paths.pharos_root);

        let mut env = config.process.env.clone();
        if !env.contains_key("RBENV_VERSION") {
            if let Some(version) =
                read_ruby_version(&pharos_root.join(&config.process.ruby_version_file))
            {
                env.insert("RBENV_VERSION".to_string(), version);
            }
        }

        let integration_config = exchange_root.join(&config.process.integration_config);
        let queue_config = exchange_root.join(&config.process.queue_config);

        let placeholders = vec![
            ("{exchange_root}".to_string(), paths.exchange_root.clone()),
            ("{pharos_root}".to_string(), paths.pharos_root.clone()),
            ("{dpn_server_root}".to_string(), paths.dpn_server_root.clone()),
            ("{bin_dir}".to_string(), paths.bin_dir.clone()),
            ("{log_dir}".to_string(), paths.log_dir.clone()),
            (
                "{integration_config}".to_string(),
                integration_config.display().to_string(),
            ),
            (
                "{queue_config}".to_string(),
                queue_config.display().to_string(),
            ),
        ];

        Self {
            exchange_root,
            pharos_root,
            dpn_server_root: PathBuf::from(&paths.dpn_server_root),
            bin_dir: PathBuf::from(&paths.bin_dir),
            log_dir: PathBuf::from(&paths.log_dir),
            env,
            stop_grace: Duration::from_secs(config.timing.stop_grace_secs),
            placeholders,
        }
    }

    /// Replace `{placeholder}` tokens in a component argument.
    pub fn expand(&self, arg: &str) -> String {
        if !arg.contains('{') {
            return arg.to_string();
        }
        self.placeholders
            .iter()
            .fold(arg.to_string(), |acc, (token, value)| acc.replace(token, value))
    }

    pub fn dir(&self, dir: WorkingDir) -> &Path {
        match dir {
            WorkingDir::BinDir => &self.bin_dir,
            WorkingDir::ExchangeRoot => &self.exchange_root,
            WorkingDir::PharosRoot => &self.pharos_root,
            WorkingDir::DpnServerRoot => &self.dpn_server_root,
        }
    }

    pub fn log_path(&self, file_name: &str) -> PathBuf {
        self.log_dir.join(file_name)
    }
}

fn read_ruby_version(path: &Path) -> Option<String> {
    match std::fs::read_to_string(path) {
        Ok(contents) => {
            let version = contents.trim();
            if version.is_empty() {
                None
            } else {
                debug!(version, "Using backend ruby version");
                Some(version.to_string())
            }
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Could not read ruby version file");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn config_with(pharos_root: &Path) -> Config {
        let mut config = Config::default();
        config.paths.exchange_root = "/src/exchange".to_string();
        config.paths.pharos_root = pharos_root.display().to_string();
        config.paths.bin_dir = "/tmp/harness/bin".to_string();
        config
    }

    #[test]
    fn test_expand_placeholders() {
        let dir = TempDir::new().unwrap();
        let settings = SupervisorSettings::from_config(&config_with(dir.path()));
        assert_eq!(
            settings.expand("-config={integration_config}"),
            "-config=/src/exchange/config/integration.json"
        );
        assert_eq!(
            settings.expand("{queue_config}"),
            "/src/exchange/config/nsq/integration.config"
        );
        assert_eq!(settings.expand("-maxfiles=10"), "-maxfiles=10");
        assert_eq!(settings.dir(WorkingDir::BinDir), Path::new("/tmp/harness/bin"));
    }

    #[test]
    fn test_ruby_version_from_backend_root() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(".ruby-version"), "2.4.1\n").unwrap();
        let settings = SupervisorSettings::from_config(&config_with(dir.path()));
        assert_eq!(settings.env.get("RBENV_VERSION").map(String::as_str), Some("2.4.1"));
        assert_eq!(settings.env.get("RAILS_ENV").map(String::as_str), Some("integration"));
    }

    #[test]
    fn test_missing_ruby_version_is_fine() {
        let dir = TempDir::new().unwrap();
        let settings = SupervisorSettings::from_config(&config_with(dir.path()));
        assert!(!settings.env.contains_key("RBENV_VERSION"));
    }
}
