//! Presentation boundary.
//!
//! The application drives a `Presenter`; the console front end renders
//! through the log and reads commands from stdin. Everything the user sees
//! goes through this trait, so other front ends only need to implement it.

pub mod handlers;
pub mod image_display;
mod state_helpers;

use crate::image_cache::CachedImage;
use crate::image_loader::Transform;
use crate::state::{Notice, StatusSnapshot};
use std::path::Path;

pub use image_display::ConsolePresenter;
pub use state_helpers::*;

pub trait Presenter {
    /// Shows a decoded image with the transform already applied.
    fn present(&mut self, path: &Path, image: &CachedImage, transform: Transform);

    fn notify(&mut self, notice: &Notice);

    /// Countdown, position or state changed.
    fn status(&mut self, status: &StatusSnapshot);

    fn scan_progress(&mut self, processed: usize, total: usize);
}
