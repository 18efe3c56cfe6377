//! User settings persisted as a flat JSON object.
//!
//! Loading never fails: saved keys are merged one by one over the defaults,
//! so a missing or invalid value only resets that key. Unknown keys are
//! ignored and an unreadable file falls back to defaults with a warning.

use crate::config::{
    LEGACY_UNLIMITED_SENTINEL, MAX_DISPLAY_TIME_SECS, MAX_IMAGE_COUNT, SETTINGS_FILE_NAME,
};
use crate::error::{AppError, Result};
use crate::file_utils::{absolute_path, read_json_tolerant, write_json_atomic};
use log::{debug, info, warn};
use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;
use std::fmt;
use std::path::{Path, PathBuf};

const UNLIMITED_KEYWORD: &str = "unlimited";

/// A count or duration that may be switched off entirely.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Limit {
    Unlimited,
    Bounded(u32),
}

impl Limit {
    pub fn bounded(self) -> Option<u32> {
        match self {
            Limit::Unlimited => None,
            Limit::Bounded(n) => Some(n),
        }
    }

    /// Clamps a bounded value into `min..=max`.
    fn clamped(self, min: u32, max: u32) -> Self {
        match self {
            Limit::Unlimited => Limit::Unlimited,
            Limit::Bounded(n) => Limit::Bounded(n.clamp(min, max)),
        }
    }
}

impl Serialize for Limit {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Limit::Unlimited => serializer.serialize_str(UNLIMITED_KEYWORD),
            Limit::Bounded(n) => serializer.serialize_u32(*n),
        }
    }
}

struct LimitVisitor;

impl Visitor<'_> for LimitVisitor {
    type Value = Limit;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "a non-negative integer or \"{}\"", UNLIMITED_KEYWORD)
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> std::result::Result<Limit, E> {
        if v >= u64::from(LEGACY_UNLIMITED_SENTINEL) {
            Ok(Limit::Unlimited)
        } else {
            Ok(Limit::Bounded(v as u32))
        }
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> std::result::Result<Limit, E> {
        if v < 0 {
            return Err(E::invalid_value(de::Unexpected::Signed(v), &self));
        }
        self.visit_u64(v as u64)
    }

    fn visit_str<E: de::Error>(self, v: &str) -> std::result::Result<Limit, E> {
        if v.eq_ignore_ascii_case(UNLIMITED_KEYWORD) {
            Ok(Limit::Unlimited)
        } else {
            Err(E::invalid_value(de::Unexpected::Str(v), &self))
        }
    }
}

impl<'de> Deserialize<'de> for Limit {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        deserializer.deserialize_any(LimitVisitor)
    }
}

/// Where the countdown label sits on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TimerPosition {
    Left,
    Center,
    #[default]
    Right,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub folder: Option<PathBuf>,
    /// Seconds each image stays on screen.
    pub display_time: Limit,
    /// Images per session.
    pub image_count: Limit,
    /// Persist viewing history to disk across restarts.
    pub save_history: bool,
    /// Leave previously shown images out of new sessions.
    #[serde(rename = "no_repeat")]
    pub exclude_history_from_candidates: bool,
    pub use_break: bool,
    /// Break length in seconds.
    pub break_duration: u32,
    pub theme: String,
    pub language: String,
    pub grid_horizontal: u32,
    pub grid_vertical: u32,
    pub timer_volume: u8,
    pub timer_position: TimerPosition,
    pub cache_capacity: usize,
    /// Consecutive load failures after which a session is abandoned.
    pub max_load_failures: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            folder: None,
            display_time: Limit::Bounded(30),
            image_count: Limit::Bounded(10),
            save_history: true,
            exclude_history_from_candidates: true,
            use_break: false,
            break_duration: 300,
            theme: String::from("dark"),
            language: String::from("en"),
            grid_horizontal: 0,
            grid_vertical: 0,
            timer_volume: 50,
            timer_position: TimerPosition::default(),
            cache_capacity: 10,
            max_load_failures: 5,
        }
    }
}

impl Settings {
    /// Whether shown images have to be tracked at all.
    pub fn tracks_history(&self) -> bool {
        self.save_history || self.exclude_history_from_candidates
    }

    /// Brings every field back into its valid range.
    pub fn normalized(mut self) -> Self {
        self.display_time = self.display_time.clamped(1, MAX_DISPLAY_TIME_SECS);
        self.image_count = self.image_count.clamped(1, MAX_IMAGE_COUNT);
        self.folder = self.folder.as_deref().map(absolute_path);
        self.break_duration = self.break_duration.max(1);
        self.timer_volume = self.timer_volume.min(100);
        self.cache_capacity = self.cache_capacity.max(1);
        self.max_load_failures = self.max_load_failures.max(1);
        self
    }

    /// Parses a settings object, accepting the legacy `enable_breaks` key.
    ///
    /// `use_break` wins when both keys are present. Each saved key is laid
    /// over the defaults on its own; a value that does not fit its field
    /// is logged and the default kept.
    pub fn from_json_value(value: Value) -> Result<Self> {
        let Value::Object(mut saved) = value else {
            return Err(AppError::InvalidSetting {
                key: "<root>".to_string(),
                message: "expected a JSON object".to_string(),
            });
        };
        if let Some(legacy) = saved.remove("enable_breaks") {
            if !saved.contains_key("use_break") {
                debug!("Migrating legacy enable_breaks setting");
                saved.insert("use_break".to_string(), legacy);
            }
        }

        let Value::Object(mut merged) = serde_json::to_value(Settings::default())? else {
            return Ok(Settings::default());
        };
        for (key, saved_value) in saved {
            let Some(default_value) = merged.insert(key.clone(), saved_value) else {
                merged.remove(&key);
                debug!("Ignoring unknown setting {}", key);
                continue;
            };
            if let Err(e) = serde_json::from_value::<Settings>(Value::Object(merged.clone())) {
                warn!("Invalid value for setting {}, keeping default: {}", key, e);
                merged.insert(key, default_value);
            }
        }

        let settings: Settings = serde_json::from_value(Value::Object(merged))?;
        Ok(settings.normalized())
    }

    /// Returns a copy with `key` set from user input.
    ///
    /// `raw` is read as JSON when it parses (`45`, `true`, `"unlimited"`) and
    /// as a plain string otherwise, so `folder /refs/hands` works unquoted.
    pub fn with_value(&self, key: &str, raw: &str) -> Result<Self> {
        let Value::Object(mut map) = serde_json::to_value(self)? else {
            return Ok(self.clone());
        };
        if !map.contains_key(key) {
            return Err(AppError::InvalidSetting {
                key: key.to_string(),
                message: "unknown key".to_string(),
            });
        }
        let parsed = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
        map.insert(key.to_string(), parsed);

        let settings: Settings =
            serde_json::from_value(Value::Object(map)).map_err(|e| AppError::InvalidSetting {
                key: key.to_string(),
                message: e.to_string(),
            })?;
        Ok(settings.normalized())
    }
}

/// Loads and saves [`Settings`] at a fixed path.
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn in_dir(dir: &Path) -> Self {
        Self::new(dir.join(SETTINGS_FILE_NAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Settings {
        let Some(value) = read_json_tolerant::<Value>(&self.path) else {
            info!("Using default settings");
            return Settings::default();
        };

        match Settings::from_json_value(value) {
            Ok(settings) => settings,
            Err(e) => {
                warn!(
                    "Invalid settings in {}, using defaults: {}",
                    self.path.display(),
                    e
                );
                Settings::default()
            }
        }
    }

    /// Writes the normalized form, so whatever is saved loads back unchanged.
    pub fn save(&self, settings: &Settings) -> Result<()> {
        write_json_atomic(&self.path, &settings.clone().normalized())
    }
}
