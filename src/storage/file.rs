//! File-backed storage in the platform data directory
//!
//! Each value is a JSON file (`session.json`, `profile.json`, ...) under an
//! XDG-compliant directory (`~/.local/share/invoicedesk/` on Linux). Files are
//! replaced atomically and, on unix, created with mode `0600`.

use async_trait::async_trait;
use directories::ProjectDirs;
use serde::{de::DeserializeOwned, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::warn;

use super::{SecureStorage, StorageError};
use crate::session::{Session, User};

/// Reads and writes JSON files in a single directory
#[derive(Debug, Clone)]
pub struct FileStorage {
    /// Directory where storage files live
    dir: PathBuf,
}

impl FileStorage {
    /// Creates a FileStorage using the XDG-compliant data directory
    ///
    /// Returns `None` if the directory cannot be determined (e.g., no home directory).
    pub fn new() -> Option<Self> {
        let project_dirs = ProjectDirs::from("", "", "invoicedesk")?;
        Some(Self {
            dir: project_dirs.data_dir().to_path_buf(),
        })
    }

    /// Creates a FileStorage rooted at a custom directory
    pub fn with_dir(dir: PathBuf) -> Self {
        Self { dir }
    }

    /// Returns the directory holding the storage files
    pub fn dir(&self) -> &PathBuf {
        &self.dir
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }

    async fn write<T: Serialize + Sync>(&self, key: &str, value: Option<&T>) -> Result<(), StorageError> {
        let path = self.path(key);
        match value {
            Some(v) => {
                fs::create_dir_all(&self.dir).await?;
                let json = serde_json::to_string_pretty(v)?;
                write_private(&path, json.as_bytes()).await?;
            }
            None => match fs::remove_file(&path).await {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            },
        }
        Ok(())
    }

    async fn read<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let content = fs::read_to_string(self.path(key)).await.ok()?;
        match serde_json::from_str(&content) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(key, error = %e, "ignoring unreadable storage file");
                None
            }
        }
    }
}

/// Writes `contents` to a sibling temp file readable only by the owner, then
/// renames it over `path`
///
/// Readers see either the old or the new file, never a partial one.
async fn write_private(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    let tmp = path.with_extension("json.tmp");
    match fs::remove_file(&tmp).await {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(e),
    }

    let mut options = fs::OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    options.mode(0o600);

    let mut file = options.open(&tmp).await?;
    file.write_all(contents).await?;
    file.sync_all().await?;
    drop(file);
    fs::rename(&tmp, path).await
}

#[async_trait]
impl SecureStorage for FileStorage {
    async fn save_session(&self, session: Option<&Session>) -> Result<(), StorageError> {
        self.write("session", session).await
    }

    async fn get_session(&self) -> Option<Session> {
        self.read("session").await
    }

    async fn is_onboarding_completed(&self) -> bool {
        self.read("onboarding").await.unwrap_or(false)
    }

    async fn set_onboarding_completed(&self, completed: bool) -> Result<(), StorageError> {
        self.write("onboarding", Some(&completed)).await
    }

    async fn get_profile(&self) -> Option<User> {
        self.read("profile").await
    }

    async fn save_profile(&self, profile: Option<&User>) -> Result<(), StorageError> {
        self.write("profile", profile).await
    }
}
