//! State management for slideshow sessions.

pub mod folder_stats;
pub mod history;
pub mod scheduler;
pub mod session;

pub use folder_stats::FolderStats;
pub use history::HistoryStore;
pub use scheduler::{
    Notice, SchedulerCommand, SchedulerEvent, SessionScheduler, SessionState, Severity,
    StatusSnapshot, Timing,
};
