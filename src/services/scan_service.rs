//! Recursive folder scanning off the control thread.
//!
//! The walk runs on the rayon pool and reports back over the application
//! channel. Each scan carries a generation number; starting a new scan or
//! stopping the current one cancels the walk and makes its generation stale,
//! so late results are never applied.

use crate::app::AppMessage;
use crate::config::{PROGRESS_INTERVAL, SUPPORTED_IMAGE_EXTENSIONS};
use crate::error::ScanError;
use crate::file_utils::{absolute_path, has_supported_extension};
use log::{debug, info, warn};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use walkdir::{DirEntry, WalkDir};

#[derive(Debug)]
pub enum ScanMessage {
    Progress {
        generation: u64,
        processed: usize,
        total: usize,
    },
    Finished {
        generation: u64,
        root: PathBuf,
        result: Result<Vec<PathBuf>, ScanError>,
    },
}

/// Checks that `root` is a readable directory.
fn check_root(root: &Path) -> Result<(), ScanError> {
    let metadata = fs::metadata(root).map_err(|e| match e.kind() {
        ErrorKind::NotFound => ScanError::NotFound(root.to_path_buf()),
        _ => ScanError::PermissionDenied(root.to_path_buf()),
    })?;
    if !metadata.is_dir() {
        return Err(ScanError::NotFound(root.to_path_buf()));
    }
    fs::read_dir(root).map_err(|e| match e.kind() {
        ErrorKind::NotFound => ScanError::NotFound(root.to_path_buf()),
        _ => ScanError::PermissionDenied(root.to_path_buf()),
    })?;
    Ok(())
}

/// Walks `root` and yields matching regular files, logging and skipping
/// unreadable entries. Stops early once `cancel` is set.
fn matching_entries<'a>(
    root: &Path,
    extensions: &'a [&'a str],
    cancel: &'a AtomicBool,
) -> impl Iterator<Item = DirEntry> + 'a {
    WalkDir::new(root)
        .into_iter()
        .take_while(move |_| !cancel.load(Ordering::Relaxed))
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!("Skipping unreadable entry: {}", e);
                None
            }
        })
        .filter(move |entry| {
            entry.file_type().is_file() && has_supported_extension(entry.path(), extensions)
        })
}

/// Scans `root` recursively for files matching `extensions`.
///
/// A relative `root` is resolved against the working directory, so every
/// returned path is absolute.
///
/// The tree is walked twice: once to count, once to collect, so progress
/// totals are exact. `on_progress(processed, total)` fires every
/// [`PROGRESS_INTERVAL`] files and once at the end.
pub fn scan_folder<F>(
    root: &Path,
    extensions: &[&str],
    cancel: &AtomicBool,
    mut on_progress: F,
) -> Result<Vec<PathBuf>, ScanError>
where
    F: FnMut(usize, usize),
{
    let start = std::time::Instant::now();
    let root = &absolute_path(root);
    check_root(root)?;

    let total = matching_entries(root, extensions, cancel).count();
    if cancel.load(Ordering::Relaxed) {
        return Err(ScanError::Cancelled);
    }
    debug!("Counted {} images under {}", total, root.display());

    let mut files = Vec::with_capacity(total);
    for entry in matching_entries(root, extensions, cancel) {
        files.push(entry.into_path());
        if files.len() % PROGRESS_INTERVAL == 0 {
            on_progress(files.len(), total.max(files.len()));
        }
    }
    if cancel.load(Ordering::Relaxed) {
        return Err(ScanError::Cancelled);
    }
    on_progress(files.len(), total.max(files.len()));

    if files.is_empty() {
        return Err(ScanError::EmptyResult(root.to_path_buf()));
    }

    files.sort();
    info!(
        "Scanned {} images under {} in {:?}",
        files.len(),
        root.display(),
        start.elapsed()
    );
    Ok(files)
}

/// Runs one folder scan at a time on the rayon pool.
pub struct FolderScanner {
    sender: Sender<AppMessage>,
    generation: u64,
    cancel: Option<Arc<AtomicBool>>,
}

impl FolderScanner {
    pub fn new(sender: Sender<AppMessage>) -> Self {
        Self {
            sender,
            generation: 0,
            cancel: None,
        }
    }

    /// Cancels any running scan and starts scanning `root`.
    ///
    /// Returns the generation the results will be tagged with.
    pub fn start(&mut self, root: PathBuf) -> u64 {
        self.stop();
        let root = absolute_path(&root);
        let generation = self.generation;
        let cancel = Arc::new(AtomicBool::new(false));
        self.cancel = Some(cancel.clone());
        let sender = self.sender.clone();

        info!("Scanning {} (generation {})", root.display(), generation);
        rayon::spawn(move || {
            let progress_sender = sender.clone();
            let result = scan_folder(&root, &SUPPORTED_IMAGE_EXTENSIONS, &cancel, |processed, total| {
                let _ = progress_sender.send(AppMessage::Scan(ScanMessage::Progress {
                    generation,
                    processed,
                    total,
                }));
            });

            if matches!(result, Err(ScanError::Cancelled)) {
                debug!("Scan generation {} cancelled", generation);
                return;
            }
            let _ = sender.send(AppMessage::Scan(ScanMessage::Finished {
                generation,
                root,
                result,
            }));
        });

        generation
    }

    /// Cancels the running scan, if any. Its results become stale.
    pub fn stop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel.store(true, Ordering::Relaxed);
        }
        self.generation += 1;
    }

    pub fn is_current(&self, generation: u64) -> bool {
        self.cancel.is_some() && generation == self.generation
    }

    /// Marks the scan of `generation` as done so `is_current` turns false.
    pub fn finish(&mut self, generation: u64) {
        if generation == self.generation {
            self.cancel = None;
        }
    }
}
