//! Application configuration constants.

/// Supported image file extensions for scanning directories.
pub const SUPPORTED_IMAGE_EXTENSIONS: [&str; 6] = ["jpg", "jpeg", "png", "gif", "bmp", "webp"];

/// Scan progress is reported every this many collected files.
pub const PROGRESS_INTERVAL: usize = 10;

/// Directory name under the user config dir holding all persisted state.
pub const APP_DIR_NAME: &str = "gestart";

pub const SETTINGS_FILE_NAME: &str = "settings.json";
pub const HISTORY_FILE_NAME: &str = "history.json";
pub const FOLDER_STATS_FILE_NAME: &str = "folder_stats.json";

/// Countdown granularity.
pub const TICK_INTERVAL_MS: u64 = 1000;

/// Debounce window for folder watcher events.
pub const WATCH_DEBOUNCE_MS: u64 = 500;

/// Poll interval of the folder watcher backend.
pub const WATCH_POLL_INTERVAL_SECS: u64 = 2;

/// Old settings files stored "unlimited" as a large integer.
pub const LEGACY_UNLIMITED_SENTINEL: u32 = 9999;

pub const MAX_DISPLAY_TIME_SECS: u32 = 3600;

/// Largest bounded image count; anything at the sentinel or above reads back as unlimited.
pub const MAX_IMAGE_COUNT: u32 = LEGACY_UNLIMITED_SENTINEL - 1;

/// Column width used to align the console status line.
pub const STATUS_LINE_WIDTH: usize = 60;
