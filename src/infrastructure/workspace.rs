//! Scratch directory preparation
//!
//! Logs, staging, restore output, binaries and broker data from an earlier
//! run would leak into the next one's checks, so they are emptied first.

use crate::domain::errors::{HarnessError, HarnessResult};
use crate::domain::models::PathsConfig;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

#[derive(Debug, Clone)]
pub struct Workspace {
    dirs: Vec<PathBuf>,
}

impl Workspace {
    pub fn from_paths(paths: &PathsConfig) -> Self {
        let dirs = [
            &paths.log_dir,
            &paths.staging_dir,
            &paths.restore_dir,
            &paths.bin_dir,
            &paths.nsq_data_dir,
        ]
        .into_iter()
        .filter(|dir| !dir.trim().is_empty())
        .map(PathBuf::from)
        .collect();
        Self { dirs }
    }

    pub fn dirs(&self) -> &[PathBuf] {
        &self.dirs
    }

    /// Create every scratch dir; with `clear`, empty them too.
    pub async fn prepare(&self, clear: bool) -> HarnessResult<()> {
        for dir in &self.dirs {
            if clear {
                let removed = clear_dir(dir).await?;
                debug!(dir = %dir.display(), removed, "Cleared scratch dir");
            }
            tokio::fs::create_dir_all(dir).await?;
        }
        info!(dirs = self.dirs.len(), cleared = clear, "Workspace ready");
        Ok(())
    }
}

async fn clear_dir(dir: &Path) -> HarnessResult<usize> {
    if dir.parent().is_none() {
        return Err(HarnessError::invalid_operation(
            dir.display().to_string(),
            "refusing to clear a filesystem root",
        ));
    }

    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
        Err(e) => return Err(e.into()),
    };

    let mut removed = 0;
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if entry.file_type().await?.is_dir() {
            tokio::fs::remove_dir_all(&path).await?;
        } else {
            tokio::fs::remove_file(&path).await?;
        }
        removed += 1;
    }
    Ok(removed)
}
