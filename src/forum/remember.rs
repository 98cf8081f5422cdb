//! Remembered login identifier, kept in a small JSON file for a week.

use serde::{Deserialize, Serialize};
use std::{
    fs, io,
    path::{Path, PathBuf},
    time::{Duration, SystemTime, UNIX_EPOCH},
};
use thiserror::Error;
use tracing::debug;

pub const REMEMBER_FOR: Duration = Duration::from_secs(7 * 24 * 60 * 60);

#[derive(Debug, Error)]
pub enum RememberError {
    #[error("failed to access remembered login: {0}")]
    Io(#[from] io::Error),
    #[error("failed to encode remembered login: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Serialize, Deserialize)]
struct Entry {
    identifier: String,
    expires_at: u64,
}

#[derive(Debug, Clone)]
pub struct RememberStore {
    path: PathBuf,
}

fn epoch_secs(at: SystemTime) -> u64 {
    at.duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or_default()
}

impl RememberStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<config dir>/wangshu/remembered_user.json`
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("wangshu").join("remembered_user.json"))
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The remembered identifier, unless it is missing, unreadable or expired.
    #[must_use]
    pub fn load(&self) -> Option<String> {
        self.load_at(SystemTime::now())
    }

    fn load_at(&self, now: SystemTime) -> Option<String> {
        let raw = fs::read_to_string(&self.path).ok()?;
        let entry: Entry = match serde_json::from_str(&raw) {
            Ok(entry) => entry,
            Err(err) => {
                debug!("ignoring unreadable remembered login: {err}");
                return None;
            }
        };

        if entry.expires_at <= epoch_secs(now) {
            debug!("remembered login expired");
            if let Err(err) = self.clear() {
                debug!("failed to remove expired remembered login: {err}");
            }
            return None;
        }

        Some(entry.identifier)
    }

    /// # Errors
    /// Returns an error if the file cannot be written.
    pub fn store(&self, identifier: &str) -> Result<(), RememberError> {
        self.store_at(identifier, SystemTime::now())
    }

    fn store_at(&self, identifier: &str, now: SystemTime) -> Result<(), RememberError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let entry = Entry {
            identifier: identifier.to_string(),
            expires_at: epoch_secs(now + REMEMBER_FOR),
        };
        fs::write(&self.path, serde_json::to_vec_pretty(&entry)?)?;

        Ok(())
    }

    /// Removes the remembered identifier; a missing file is not an error.
    ///
    /// # Errors
    /// Returns an error if an existing file cannot be removed.
    pub fn clear(&self) -> Result<(), RememberError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store(dir: &TempDir) -> RememberStore {
        RememberStore::new(dir.path().join("nested").join("remembered_user.json"))
    }

    #[test]
    fn stores_and_loads_identifier() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);

        assert_eq!(store.load(), None);
        store.store("reader@example.com").unwrap();
        assert_eq!(store.load().as_deref(), Some("reader@example.com"));
    }

    #[test]
    fn expires_after_a_week() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        let now = SystemTime::now();

        store.store_at("reader", now).unwrap();
        let almost = now + REMEMBER_FOR - Duration::from_secs(60);
        assert_eq!(store.load_at(almost).as_deref(), Some("reader"));

        let later = now + REMEMBER_FOR + Duration::from_secs(1);
        assert_eq!(store.load_at(later), None);
        assert!(!store.path().exists());
    }

    #[test]
    fn clear_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);

        store.clear().unwrap();
        store.store("reader").unwrap();
        store.clear().unwrap();
        assert_eq!(store.load(), None);
    }

    #[test]
    fn garbage_file_is_ignored() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("remembered_user.json");
        fs::write(&path, "not json").unwrap();

        assert_eq!(RememberStore::new(path).load(), None);
    }
}
