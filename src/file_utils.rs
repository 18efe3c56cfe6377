use crate::config::{APP_DIR_NAME, SUPPORTED_IMAGE_EXTENSIONS};
use crate::error::Result;
use log::warn;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

/// Returns true when the path has one of the supported image extensions.
pub fn is_supported_image(path: &Path) -> bool {
    has_supported_extension(path, &SUPPORTED_IMAGE_EXTENSIONS)
}

pub fn has_supported_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext_str| {
            let ext_lower = ext_str.to_lowercase();
            extensions.contains(&ext_lower.as_str())
        })
        .unwrap_or(false)
}

pub trait PathExt {
    /// Short form for log lines: file name plus parent directory name.
    fn format_for_log(&self) -> String;
}

impl PathExt for Path {
    fn format_for_log(&self) -> String {
        let name = self
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.display().to_string());
        match self
            .parent()
            .and_then(|p| p.file_name())
            .map(|p| p.to_string_lossy().into_owned())
        {
            Some(parent) => format!("{}/{}", parent, name),
            None => name,
        }
    }
}

impl PathExt for PathBuf {
    fn format_for_log(&self) -> String {
        self.as_path().format_for_log()
    }
}

/// Resolves `path` against the working directory.
///
/// Stored image paths, history entries and folder keys are always absolute.
pub fn absolute_path(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|e| {
        warn!("Cannot resolve {}: {}", path.display(), e);
        path.to_path_buf()
    })
}

/// Per-user directory for settings, history and folder stats.
///
/// Falls back to the home directory, then to the working directory.
pub fn app_data_dir() -> PathBuf {
    dirs::config_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR_NAME)
}

/// Serializes `value` as pretty JSON next to `path` and renames it into place.
///
/// A crash mid-write leaves the previous file untouched.
pub fn write_json_atomic<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let mut tmp_name = path.file_name().unwrap_or_default().to_os_string();
    tmp_name.push(".tmp");
    let tmp_path = path.with_file_name(tmp_name);

    let json = serde_json::to_vec_pretty(value)?;
    {
        let mut file = fs::File::create(&tmp_path)?;
        file.write_all(&json)?;
        file.sync_all()?;
    }
    fs::rename(&tmp_path, path)?;
    Ok(())
}

/// Reads a JSON file, treating a missing or corrupt file as absent.
///
/// Corruption is logged; callers fall back to their defaults.
pub fn read_json_tolerant<T: DeserializeOwned>(path: &Path) -> Option<T> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => return None,
        Err(e) => {
            warn!("Failed to read {}: {}", path.display(), e);
            return None;
        }
    };

    match serde_json::from_str(&content) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!("Ignoring corrupt {}: {}", path.display(), e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn relative_paths_become_absolute() {
        let resolved = absolute_path(Path::new("refs/hands"));
        assert!(resolved.is_absolute());
        assert!(resolved.ends_with("refs/hands"));

        let already = Path::new("/refs/feet");
        assert_eq!(absolute_path(already), already);
    }

    #[test]
    fn extension_match_is_case_insensitive() {
        assert!(is_supported_image(Path::new("/a/b/pose.JPG")));
        assert!(is_supported_image(Path::new("pose.webp")));
        assert!(!is_supported_image(Path::new("notes.txt")));
        assert!(!is_supported_image(Path::new("no_extension")));
    }

    #[test]
    fn format_for_log_keeps_parent_and_name() {
        assert_eq!(Path::new("/refs/hands/a.png").format_for_log(), "hands/a.png");
    }

    #[test]
    fn atomic_write_then_tolerant_read() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("data.json");
        write_json_atomic(&path, &vec!["a", "b"]).unwrap();

        let read: Option<Vec<String>> = read_json_tolerant(&path);
        assert_eq!(read, Some(vec!["a".to_string(), "b".to_string()]));
        assert!(!path.with_file_name("data.json.tmp").exists());
    }

    #[test]
    fn tolerant_read_of_missing_and_corrupt_files() {
        let dir = tempdir().unwrap();
        let missing: Option<Vec<String>> = read_json_tolerant(&dir.path().join("none.json"));
        assert!(missing.is_none());

        let corrupt = dir.path().join("corrupt.json");
        fs::write(&corrupt, "[\"unterminated").unwrap();
        let read: Option<Vec<String>> = read_json_tolerant(&corrupt);
        assert!(read.is_none());
    }
}
