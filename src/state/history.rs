//! Viewing history shared by all sessions of the process.

use crate::config::HISTORY_FILE_NAME;
use crate::error::Result;
use crate::file_utils::{read_json_tolerant, write_json_atomic};
use log::{debug, error, info};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Ordered set of shown image paths, mirrored to a JSON array on disk.
pub struct HistoryStore {
    file: PathBuf,
    persist: bool,
    order: Vec<PathBuf>,
    members: HashSet<PathBuf>,
}

impl HistoryStore {
    /// Loads history from `file`. Missing or corrupt files yield an empty history.
    pub fn load(file: PathBuf, persist: bool) -> Self {
        let order: Vec<PathBuf> = if persist {
            read_json_tolerant(&file).unwrap_or_default()
        } else {
            Vec::new()
        };

        let mut store = Self {
            file,
            persist,
            order: Vec::with_capacity(order.len()),
            members: HashSet::with_capacity(order.len()),
        };
        for path in order {
            if store.members.insert(path.clone()) {
                store.order.push(path);
            }
        }
        info!("Loaded {} history entries", store.order.len());
        store
    }

    pub fn in_dir(dir: &Path, persist: bool) -> Self {
        Self::load(dir.join(HISTORY_FILE_NAME), persist)
    }

    /// In-memory only history.
    #[cfg(test)]
    pub fn ephemeral() -> Self {
        Self {
            file: PathBuf::new(),
            persist: false,
            order: Vec::new(),
            members: HashSet::new(),
        }
    }

    /// Enables or disables writing to disk.
    ///
    /// Enabling merges what is already on disk in front of the entries
    /// recorded in memory, then writes the union back.
    pub fn set_persist(&mut self, persist: bool) {
        let enabling = persist && !self.persist;
        self.persist = persist;
        if enabling {
            self.merge_from_disk();
            self.flush();
        }
    }

    fn merge_from_disk(&mut self) {
        let saved: Vec<PathBuf> = read_json_tolerant(&self.file).unwrap_or_default();
        if saved.is_empty() {
            return;
        }
        let mut members = HashSet::with_capacity(saved.len() + self.order.len());
        let mut order = Vec::with_capacity(saved.len() + self.order.len());
        for path in saved.into_iter().chain(self.order.drain(..)) {
            if members.insert(path.clone()) {
                order.push(path);
            }
        }
        debug!("Merged history from disk: {} entries", order.len());
        self.order = order;
        self.members = members;
    }

    /// Appends `path` if absent. Returns whether it was new.
    pub fn record(&mut self, path: &Path) -> bool {
        if !self.members.insert(path.to_path_buf()) {
            return false;
        }
        self.order.push(path.to_path_buf());
        debug!("History += {}", path.display());
        self.flush();
        true
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.members.contains(path)
    }

    pub fn remove(&mut self, path: &Path) -> bool {
        if !self.members.remove(path) {
            return false;
        }
        self.order.retain(|p| p != path);
        self.flush();
        true
    }

    pub fn clear(&mut self) {
        self.order.clear();
        self.members.clear();
        info!("History cleared");
        self.flush();
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Paths in the order they were first shown.
    #[cfg(test)]
    pub fn paths(&self) -> &[PathBuf] {
        &self.order
    }

    fn flush(&self) {
        if !self.persist {
            return;
        }
        if let Err(e) = self.save() {
            error!("Failed to save history to {}: {}", self.file.display(), e);
        }
    }

    fn save(&self) -> Result<()> {
        write_json_atomic(&self.file, &self.order)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn record_is_idempotent_and_ordered() {
        let mut history = HistoryStore::ephemeral();
        assert!(history.record(Path::new("/b.png")));
        assert!(history.record(Path::new("/a.png")));
        assert!(!history.record(Path::new("/b.png")));

        assert_eq!(
            history.paths(),
            &[PathBuf::from("/b.png"), PathBuf::from("/a.png")]
        );
        assert!(history.contains(Path::new("/a.png")));
    }

    #[test]
    fn remove_keeps_set_and_order_in_sync() {
        let mut history = HistoryStore::ephemeral();
        history.record(Path::new("/a.png"));
        history.record(Path::new("/b.png"));

        assert!(history.remove(Path::new("/a.png")));
        assert!(!history.remove(Path::new("/a.png")));
        assert!(!history.contains(Path::new("/a.png")));
        assert_eq!(history.paths(), &[PathBuf::from("/b.png")]);
    }

    #[test]
    fn persists_every_mutation() {
        let dir = tempdir().unwrap();
        let mut history = HistoryStore::in_dir(dir.path(), true);
        history.record(Path::new("/a.png"));
        history.record(Path::new("/b.png"));
        history.remove(Path::new("/a.png"));

        let reloaded = HistoryStore::in_dir(dir.path(), true);
        assert_eq!(reloaded.paths(), &[PathBuf::from("/b.png")]);

        history.clear();
        let reloaded = HistoryStore::in_dir(dir.path(), true);
        assert!(reloaded.is_empty());
    }

    #[test]
    fn disabled_persistence_writes_nothing() {
        let dir = tempdir().unwrap();
        let mut history = HistoryStore::in_dir(dir.path(), false);
        history.record(Path::new("/a.png"));
        assert!(!dir.path().join(HISTORY_FILE_NAME).exists());

        history.set_persist(true);
        let reloaded = HistoryStore::in_dir(dir.path(), true);
        assert_eq!(reloaded.len(), 1);
    }

    #[test]
    fn enabling_persistence_keeps_saved_entries() {
        let dir = tempdir().unwrap();
        let mut saved = HistoryStore::in_dir(dir.path(), true);
        saved.record(Path::new("/a.png"));
        saved.record(Path::new("/b.png"));

        let mut history = HistoryStore::in_dir(dir.path(), false);
        history.record(Path::new("/c.png"));
        history.record(Path::new("/a.png"));
        history.set_persist(true);
        assert!(history.contains(Path::new("/b.png")));

        let reloaded = HistoryStore::in_dir(dir.path(), true);
        assert_eq!(
            reloaded.paths(),
            &[
                PathBuf::from("/a.png"),
                PathBuf::from("/b.png"),
                PathBuf::from("/c.png")
            ]
        );
    }

    #[test]
    fn corrupt_file_loads_as_empty() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join(HISTORY_FILE_NAME), "{\"oops\": 1}").unwrap();
        let history = HistoryStore::in_dir(dir.path(), true);
        assert!(history.is_empty());
    }

    #[test]
    fn duplicate_entries_on_disk_are_collapsed() {
        let dir = tempdir().unwrap();
        std::fs::write(
            dir.path().join(HISTORY_FILE_NAME),
            r#"["/a.png", "/b.png", "/a.png"]"#,
        )
        .unwrap();
        let history = HistoryStore::in_dir(dir.path(), true);
        assert_eq!(history.len(), 2);
    }
}
