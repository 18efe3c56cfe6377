//! Session planning and the ordered queue of images for one session.

use crate::settings::{Limit, Settings};
use crate::state::HistoryStore;
use log::{debug, info, warn};
use rand::Rng;
use rand::seq::SliceRandom;
use std::path::{Path, PathBuf};

/// Result of a cursor move.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    Moved(PathBuf),
    /// Already at the boundary; nothing changed.
    Stayed,
    /// Moved past the last image.
    Exhausted,
}

/// Ordered images of the running session plus a cursor.
///
/// While non-empty the cursor is always a valid index. `reserve` holds the
/// shuffled candidates that did not fit into the session; they stand in for
/// images that fail to load.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionQueue {
    items: Vec<PathBuf>,
    cursor: usize,
    reserve: Vec<PathBuf>,
}

impl SessionQueue {
    pub fn new(items: Vec<PathBuf>) -> Self {
        Self::with_reserve(items, Vec::new())
    }

    pub fn with_reserve(items: Vec<PathBuf>, reserve: Vec<PathBuf>) -> Self {
        Self {
            items,
            cursor: 0,
            reserve,
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Zero-based cursor.
    pub fn position(&self) -> usize {
        self.cursor
    }

    pub fn current(&self) -> Option<&Path> {
        self.items.get(self.cursor).map(PathBuf::as_path)
    }

    #[cfg(test)]
    pub fn items(&self) -> &[PathBuf] {
        &self.items
    }

    pub fn reserve_len(&self) -> usize {
        self.reserve.len()
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.items.iter().any(|p| p == path)
    }

    pub fn peek_next(&self) -> Option<&Path> {
        self.items.get(self.cursor + 1).map(PathBuf::as_path)
    }

    pub fn peek_previous(&self) -> Option<&Path> {
        self.cursor
            .checked_sub(1)
            .and_then(|i| self.items.get(i))
            .map(PathBuf::as_path)
    }

    /// Moves forward, or reports exhaustion at the last image.
    pub fn advance(&mut self) -> Step {
        if self.items.is_empty() || self.cursor + 1 >= self.items.len() {
            return Step::Exhausted;
        }
        self.cursor += 1;
        Step::Moved(self.items[self.cursor].clone())
    }

    /// Moves back; a no-op at the first image.
    pub fn go_previous(&mut self) -> Step {
        if self.cursor == 0 || self.items.is_empty() {
            return Step::Stayed;
        }
        self.cursor -= 1;
        Step::Moved(self.items[self.cursor].clone())
    }

    /// Drops the current image without marking it viewed.
    ///
    /// The cursor then points at the image that followed it (clamped to the
    /// new last index). Returns the dropped path.
    pub fn skip(&mut self) -> Option<PathBuf> {
        if self.items.is_empty() {
            return None;
        }
        let removed = self.items.remove(self.cursor);
        self.clamp_cursor();
        Some(removed)
    }

    /// Removes `path` wherever it sits. Returns whether the current image changed.
    pub fn remove(&mut self, path: &Path) -> bool {
        self.reserve.retain(|p| p != path);
        let Some(index) = self.items.iter().position(|p| p == path) else {
            return false;
        };
        self.items.remove(index);
        let current_changed = index == self.cursor;
        if index < self.cursor {
            self.cursor -= 1;
        }
        self.clamp_cursor();
        current_changed
    }

    /// Replaces the current image, which failed to load, with a reserve image.
    ///
    /// The replacement joins the end of the queue so the upcoming order is
    /// kept; the session length is unchanged while the reserve lasts.
    pub fn replace_current(&mut self) -> Option<PathBuf> {
        if self.items.is_empty() {
            return None;
        }
        let failed = self.items.remove(self.cursor);
        if let Some(substitute) = self.reserve.pop() {
            debug!(
                "Replacing {} with {}",
                failed.display(),
                substitute.display()
            );
            self.items.push(substitute);
        }
        self.clamp_cursor();
        Some(failed)
    }

    fn clamp_cursor(&mut self) {
        if self.items.is_empty() {
            self.cursor = 0;
        } else if self.cursor >= self.items.len() {
            self.cursor = self.items.len() - 1;
        }
    }
}

/// A freshly planned session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionPlan {
    pub queue: SessionQueue,
    /// Every file had been shown before, so history was cleared.
    pub history_reset: bool,
}

/// Builds a session from the folder's files, the viewing history and settings.
///
/// With history exclusion on, already shown files are not candidates. When
/// that leaves nothing, history is cleared and every file is a candidate
/// again. Candidates are fully shuffled and the first `image_count` taken.
pub fn plan<R: Rng + ?Sized>(
    all_files: &[PathBuf],
    history: &mut HistoryStore,
    settings: &Settings,
    rng: &mut R,
) -> SessionPlan {
    let mut candidates: Vec<PathBuf> = if settings.exclude_history_from_candidates {
        all_files
            .iter()
            .filter(|p| !history.contains(p))
            .cloned()
            .collect()
    } else {
        all_files.to_vec()
    };

    let mut history_reset = false;
    if candidates.is_empty() && !all_files.is_empty() {
        warn!("All {} images were shown already, resetting history", all_files.len());
        history.clear();
        candidates = all_files.to_vec();
        history_reset = true;
    }

    candidates.shuffle(rng);
    let session_len = match settings.image_count {
        Limit::Unlimited => candidates.len(),
        Limit::Bounded(n) => (n as usize).min(candidates.len()),
    };
    let reserve = candidates.split_off(session_len);

    info!(
        "Planned session of {} images ({} in reserve)",
        candidates.len(),
        reserve.len()
    );
    SessionPlan {
        queue: SessionQueue::with_reserve(candidates, reserve),
        history_reset,
    }
}
