//! Per-folder session counters. Informational only.

use crate::config::FOLDER_STATS_FILE_NAME;
use crate::file_utils::{read_json_tolerant, write_json_atomic};
use log::error;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

pub struct FolderStats {
    file: PathBuf,
    counts: BTreeMap<PathBuf, u64>,
}

impl FolderStats {
    pub fn load(file: PathBuf) -> Self {
        let counts = read_json_tolerant(&file).unwrap_or_default();
        Self { file, counts }
    }

    pub fn in_dir(dir: &Path) -> Self {
        Self::load(dir.join(FOLDER_STATS_FILE_NAME))
    }

    /// Bumps the view count of `folder` and persists. Returns the new count.
    pub fn increment(&mut self, folder: &Path) -> u64 {
        let count = self.counts.entry(folder.to_path_buf()).or_insert(0);
        *count += 1;
        let count = *count;

        if let Err(e) = write_json_atomic(&self.file, &self.counts) {
            error!("Failed to save folder stats: {}", e);
        }
        count
    }

    pub fn count(&self, folder: &Path) -> u64 {
        self.counts.get(folder).copied().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn counts_increase_and_persist() {
        let dir = tempdir().unwrap();
        let mut stats = FolderStats::in_dir(dir.path());
        assert_eq!(stats.increment(Path::new("/refs/hands")), 1);
        assert_eq!(stats.increment(Path::new("/refs/hands")), 2);
        stats.increment(Path::new("/refs/feet"));

        let reloaded = FolderStats::in_dir(dir.path());
        assert_eq!(reloaded.count(Path::new("/refs/hands")), 2);
        assert_eq!(reloaded.count(Path::new("/refs/feet")), 1);
        assert_eq!(reloaded.count(Path::new("/refs/faces")), 0);

        let raw: serde_json::Value = serde_json::from_str(
            &std::fs::read_to_string(dir.path().join(FOLDER_STATS_FILE_NAME)).unwrap(),
        )
        .unwrap();
        assert_eq!(raw["/refs/hands"], 2);
    }
}
