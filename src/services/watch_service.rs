//! Watches the session folder for images added or removed behind our back.
//!
//! Files can disappear at any time (deleted in a file manager, moved by a
//! sync tool). The watcher turns debounced filesystem events into
//! `FileVanished`/`FileAppeared` messages for the control thread.

use crate::app::AppMessage;
use crate::config::{WATCH_DEBOUNCE_MS, WATCH_POLL_INTERVAL_SECS};
use crate::error::{AppError, Result};
use crate::file_utils::{PathExt, is_supported_image};
use log::{debug, warn};
use notify::{PollWatcher, RecursiveMode};
use notify_debouncer_mini::{Config, DebounceEventResult, DebouncedEvent, Debouncer, new_debouncer_opt};
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use std::time::Duration;

/// Keeps the watcher alive; dropping it stops watching.
pub struct FolderWatcher {
    folder: PathBuf,
    _debouncer: Debouncer<PollWatcher>,
}

impl FolderWatcher {
    pub fn folder(&self) -> &Path {
        &self.folder
    }
}

/// Translates debounced events into file messages.
///
/// Only supported image files are considered; whether a path vanished or
/// appeared is decided by checking the filesystem now.
fn classify_events(events: Vec<DebouncedEvent>) -> Vec<AppMessage> {
    let mut paths: Vec<PathBuf> = events
        .into_iter()
        .map(|event| event.path)
        .filter(|path| is_supported_image(path))
        .collect();
    paths.sort();
    paths.dedup();

    paths
        .into_iter()
        .map(|path| {
            debug!("Watched change: {}", path.format_for_log());
            if path.is_file() {
                AppMessage::FileAppeared(path)
            } else {
                AppMessage::FileVanished(path)
            }
        })
        .collect()
}

/// Starts a recursive poll watcher on `folder`.
pub fn start_watching(folder: &Path, sender: Sender<AppMessage>) -> Result<FolderWatcher> {
    let notify_config =
        notify::Config::default().with_poll_interval(Duration::from_secs(WATCH_POLL_INTERVAL_SECS));
    let debouncer_config = Config::default()
        .with_timeout(Duration::from_millis(WATCH_DEBOUNCE_MS))
        .with_notify_config(notify_config);

    let mut debouncer = new_debouncer_opt::<_, PollWatcher>(
        debouncer_config,
        move |res: DebounceEventResult| match res {
            Ok(events) => {
                for message in classify_events(events) {
                    if sender.send(message).is_err() {
                        return;
                    }
                }
            }
            Err(error) => {
                let error_msg = error.to_string();
                if !error_msg.contains(".tmp") {
                    warn!("File watcher error: {}", error);
                }
            }
        },
    )
    .map_err(|e| AppError::Watch(format!("Failed to create debouncer: {}", e)))?;

    debouncer
        .watcher()
        .watch(folder, RecursiveMode::Recursive)
        .map_err(|e| AppError::Watch(format!("Failed to watch directory: {}", e)))?;

    Ok(FolderWatcher {
        folder: folder.to_path_buf(),
        _debouncer: debouncer,
    })
}
