//! Console rendering of the slideshow.
//!
//! There is no canvas; the presenter reports what would be on screen
//! through the log so the slideshow can run headless or in a terminal.

use crate::config::STATUS_LINE_WIDTH;
use crate::file_utils::PathExt;
use crate::image_cache::CachedImage;
use crate::image_loader::Transform;
use crate::settings::TimerPosition;
use crate::state::{Notice, Severity, StatusSnapshot};
use crate::ui::{Presenter, notice_line, status_line, transform_label};
use log::{debug, error, info, warn};
use std::path::{Path, PathBuf};

pub struct ConsolePresenter {
    timer_position: TimerPosition,
    current: Option<PathBuf>,
    last_status: Option<StatusSnapshot>,
}

impl ConsolePresenter {
    pub fn new(timer_position: TimerPosition) -> Self {
        Self {
            timer_position,
            current: None,
            last_status: None,
        }
    }

    pub fn current(&self) -> Option<&Path> {
        self.current.as_deref()
    }
}

impl Presenter for ConsolePresenter {
    fn present(&mut self, path: &Path, image: &CachedImage, transform: Transform) {
        let label = transform_label(&transform);
        if label.is_empty() {
            info!("Showing {} ({}x{})", path.format_for_log(), image.width, image.height);
        } else {
            info!(
                "Showing {} ({}x{}, {})",
                path.format_for_log(),
                image.width,
                image.height,
                label
            );
        }
        self.current = Some(path.to_path_buf());
    }

    fn notify(&mut self, notice: &Notice) {
        let line = notice_line(notice);
        match notice.severity {
            Severity::Info => info!("{}", line),
            Severity::Warning => warn!("{}", line),
            Severity::Error => error!("{}", line),
        }
    }

    fn status(&mut self, status: &StatusSnapshot) {
        if self.last_status.as_ref() == Some(status) {
            return;
        }
        // per-second countdown updates stay at debug
        let state_changed = self
            .last_status
            .as_ref()
            .is_none_or(|last| last.state != status.state || last.position != status.position);
        let line = status_line(status, self.timer_position, STATUS_LINE_WIDTH);
        if state_changed {
            info!("{}", line.trim());
        } else {
            debug!("{}", line);
        }
        self.last_status = Some(status.clone());
    }

    fn scan_progress(&mut self, processed: usize, total: usize) {
        debug!("Scanning: {}/{}", processed, total);
    }
}
