//! Persistent Storage Abstractions
//!
//! The core persists a handful of small JSON records (saved credentials,
//! overlay settings, play counts, offline settings). Each record lives under a
//! single string key, so the host only needs to provide a scoped string store.
//!
//! Downloaded audio lives on the host file system and is reached through
//! [`FileSystemAccess`].

use async_trait::async_trait;
use std::path::{Path, PathBuf};

use crate::error::Result;

/// Durable string key-value store
///
/// Abstracts platform-specific local storage:
/// - iOS: UserDefaults / AsyncStorage
/// - Android: SharedPreferences / DataStore
/// - Desktop: SQLite database in the application data directory
/// - Web: localStorage
///
/// Values must survive process restarts. All operations may fail; callers in
/// the core treat a failed read as "no value" and report failed writes.
///
/// # Example
///
/// ```ignore
/// use bridge_traits::storage::KeyValueStore;
///
/// async fn remember_theme(store: &dyn KeyValueStore) -> Result<()> {
///     store.set("theme", "dark").await?;
///     assert_eq!(store.get("theme").await?, Some("dark".to_string()));
///     Ok(())
/// }
/// ```
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Retrieve the value stored under `key`
    ///
    /// # Returns
    ///
    /// Returns `Ok(None)` if the key doesn't exist.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Store `value` under `key`, replacing any previous value
    async fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Remove the value stored under `key`
    ///
    /// Removing a missing key is not an error.
    async fn remove(&self, key: &str) -> Result<()>;

    /// Check if a key exists without keeping its value
    async fn has_key(&self, key: &str) -> Result<bool> {
        Ok(self.get(key).await?.is_some())
    }
}

/// File metadata information
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileMetadata {
    pub size: u64,
    /// Unix timestamp in seconds, when the platform reports it
    pub created_at: Option<i64>,
    pub modified_at: Option<i64>,
    pub is_directory: bool,
}

/// File system access trait
///
/// Covers what the core needs to manage downloaded audio:
/// - Desktop: a directory under the user's data directory
/// - iOS/Android: the app's document directory
///
/// # Example
///
/// ```ignore
/// use bridge_traits::storage::FileSystemAccess;
///
/// async fn downloaded_bytes(fs: &dyn FileSystemAccess) -> Result<u64> {
///     let dir = fs.get_downloads_directory().await?;
///     let mut total = 0;
///     for path in fs.list_directory(&dir).await? {
///         total += fs.metadata(&path).await?.size;
///     }
///     Ok(total)
/// }
/// ```
#[async_trait]
pub trait FileSystemAccess: Send + Sync {
    /// Directory downloaded audio is written to
    async fn get_downloads_directory(&self) -> Result<PathBuf>;

    /// Check if a file or directory exists
    async fn exists(&self, path: &Path) -> Result<bool>;

    /// Get metadata for a file or directory
    async fn metadata(&self, path: &Path) -> Result<FileMetadata>;

    /// List all entries in a directory
    async fn list_directory(&self, path: &Path) -> Result<Vec<PathBuf>>;

    /// Delete a file
    async fn delete_file(&self, path: &Path) -> Result<()>;
}
