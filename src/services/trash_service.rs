//! Deleting images the user no longer wants in the folder.

use log::info;
use std::io;
use std::path::Path;

/// Removes a file on the user's behalf. Implementations report failure
/// instead of panicking; the caller turns it into an error notice.
pub trait Trash {
    fn trash(&self, path: &Path) -> io::Result<()>;
}

/// Moves files to the desktop trash / recycle bin so they can be restored.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemTrash;

impl Trash for SystemTrash {
    fn trash(&self, path: &Path) -> io::Result<()> {
        if !path.exists() {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("{} does not exist", path.display()),
            ));
        }
        trash::delete(path).map_err(|e| io::Error::other(e.to_string()))?;
        info!("Moved {} to trash", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_file_is_not_found() {
        let dir = tempdir().unwrap();
        let err = SystemTrash.trash(&dir.path().join("gone.png")).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }
}
