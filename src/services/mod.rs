//! Service layer: background work and filesystem collaborators.
//!
//! Services never mutate session state themselves; they report back to the
//! control thread through `AppMessage`s.

pub mod scan_service;
pub mod ticker;
pub mod trash_service;
pub mod watch_service;

pub use scan_service::{FolderScanner, ScanMessage};
pub use ticker::Ticker;
pub use trash_service::{SystemTrash, Trash};
pub use watch_service::FolderWatcher;
