//! Downloads catalog
//!
//! Lists the audio files stored in the host's downloads directory and tracks
//! the progress of downloads in flight. The transfer itself is the host's
//! job; it reports progress here and the catalog re-lists the directory when
//! a download finishes.

use crate::error::{LibraryError, Result};
use bridge_traits::storage::FileSystemAccess;
use bridge_traits::time::Clock;
use core_runtime::events::{CoreEvent, EventBus, LibraryEvent, Notice};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, instrument, trace, warn};

/// Extensions listed as downloaded audio.
pub const DOWNLOAD_EXTENSIONS: &[&str] = &["mp3", "m4a", "webm"];

/// An audio file in the downloads directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadedFile {
    pub filename: String,
    pub file_path: String,
    /// Size in bytes, 0 when unknown
    pub file_size: u64,
    /// Unix timestamp in seconds
    pub created_at: i64,
}

#[derive(Default)]
struct CatalogState {
    files: Vec<DownloadedFile>,
    /// Item id to percent complete
    downloading: HashMap<String, u8>,
}

/// Downloads catalog handle. Cheap to clone.
#[derive(Clone)]
pub struct DownloadsCatalog {
    state: Arc<RwLock<CatalogState>>,
    fs: Arc<dyn FileSystemAccess>,
    clock: Arc<dyn Clock>,
    events: EventBus,
}

impl DownloadsCatalog {
    pub fn new(fs: Arc<dyn FileSystemAccess>, clock: Arc<dyn Clock>, events: EventBus) -> Self {
        Self {
            state: Arc::new(RwLock::new(CatalogState::default())),
            fs,
            clock,
            events,
        }
    }

    /// Re-list the downloads directory and return the number of files found.
    ///
    /// A file whose metadata cannot be read is still listed, with size 0 and
    /// the current time. When the directory itself cannot be listed the
    /// previous catalog is kept.
    ///
    /// # Errors
    ///
    /// [`LibraryError::Persistence`] when the directory cannot be listed.
    #[instrument(skip(self))]
    pub async fn refresh(&self) -> Result<usize> {
        let dir = self.fs.get_downloads_directory().await?;
        let entries = self.fs.list_directory(&dir).await.map_err(|e| {
            warn!(error = %e, "Failed to list downloads directory");
            LibraryError::from(e)
        })?;

        let mut files = Vec::new();
        for path in entries {
            let Some(filename) = audio_file_name(&path) else {
                continue;
            };
            let now = self.clock.now().timestamp();
            let (file_size, created_at) = match self.fs.metadata(&path).await {
                Ok(meta) if meta.is_directory => continue,
                Ok(meta) => (meta.size, meta.modified_at.or(meta.created_at).unwrap_or(now)),
                Err(e) => {
                    debug!(file = %filename, error = %e, "No metadata for downloaded file");
                    (0, now)
                }
            };
            files.push(DownloadedFile {
                filename,
                file_path: path.to_string_lossy().into_owned(),
                file_size,
                created_at,
            });
        }

        let count = files.len();
        self.state.write().await.files = files;
        info!(count, "Loaded downloaded files");
        self.publish(LibraryEvent::DownloadsRefreshed { count });
        Ok(count)
    }

    pub async fn files(&self) -> Vec<DownloadedFile> {
        self.state.read().await.files.clone()
    }

    pub async fn get(&self, filename: &str) -> Option<DownloadedFile> {
        self.state
            .read()
            .await
            .files
            .iter()
            .find(|file| file.filename == filename)
            .cloned()
    }

    /// Whether `url` matches a downloaded file: a path containing it, or a
    /// file name it contains.
    pub async fn is_downloaded(&self, url: &str) -> bool {
        if url.is_empty() {
            return false;
        }
        self.state
            .read()
            .await
            .files
            .iter()
            .any(|file| file.file_path.contains(url) || url.contains(&file.filename))
    }

    /// Start tracking a download at 0%.
    ///
    /// Returns `false` and leaves the catalog alone when `url` is already
    /// downloaded or `item_id` is already in flight.
    pub async fn start_download(&self, item_id: &str, url: &str) -> bool {
        if self.is_downloaded(url).await {
            self.events.notify(Notice::info(
                "Already Downloaded",
                "This file is already on your device",
            ));
            return false;
        }

        let mut state = self.state.write().await;
        if state.downloading.contains_key(item_id) {
            debug!(item_id, "Download already in progress");
            return false;
        }
        state.downloading.insert(item_id.to_string(), 0);
        drop(state);

        info!(item_id, url, "Download started");
        self.publish(LibraryEvent::DownloadProgress {
            item_id: item_id.to_string(),
            percent: 0,
        });
        true
    }

    /// Record progress for a tracked download. Values above 100 are clamped.
    /// Unknown items are ignored and return `None`.
    pub async fn update_progress(&self, item_id: &str, percent: u8) -> Option<u8> {
        let percent = percent.min(100);
        let mut state = self.state.write().await;
        let entry = state.downloading.get_mut(item_id)?;
        if *entry == percent {
            return Some(percent);
        }
        *entry = percent;
        drop(state);

        trace!(item_id, percent, "Download progress");
        self.publish(LibraryEvent::DownloadProgress {
            item_id: item_id.to_string(),
            percent,
        });
        Some(percent)
    }

    /// Stop tracking `item_id` and re-list the directory so the new file
    /// shows up.
    ///
    /// # Errors
    ///
    /// [`LibraryError::NotFound`] when the item was not being tracked, or the
    /// refresh error.
    pub async fn finish_download(&self, item_id: &str) -> Result<usize> {
        if self.state.write().await.downloading.remove(item_id).is_none() {
            return Err(LibraryError::not_found("download", item_id));
        }

        info!(item_id, "Download finished");
        self.publish(LibraryEvent::DownloadCompleted {
            item_id: item_id.to_string(),
        });
        self.events.notify(Notice::success(
            "Download Complete",
            "The song was downloaded",
        ));
        self.refresh().await
    }

    /// Stop tracking `item_id` after the host reported a failed transfer.
    /// Returns whether the item was being tracked.
    pub async fn fail_download(&self, item_id: &str, message: &str) -> bool {
        if self.state.write().await.downloading.remove(item_id).is_none() {
            return false;
        }

        warn!(item_id, message, "Download failed");
        self.publish(LibraryEvent::DownloadFailed {
            item_id: item_id.to_string(),
            message: message.to_string(),
        });
        self.events
            .notify(Notice::error("Download Failed", message.to_string()));
        true
    }

    /// Downloads in flight, item id to percent complete.
    pub async fn downloading(&self) -> HashMap<String, u8> {
        self.state.read().await.downloading.clone()
    }

    pub async fn progress(&self, item_id: &str) -> Option<u8> {
        self.state.read().await.downloading.get(item_id).copied()
    }

    /// Delete a downloaded file from disk and from the catalog.
    ///
    /// # Errors
    ///
    /// - [`LibraryError::NotFound`] when no listed file has that name
    /// - [`LibraryError::Persistence`] when the file could not be deleted; the
    ///   catalog is left unchanged
    #[instrument(skip(self))]
    pub async fn delete_file(&self, filename: &str) -> Result<()> {
        let mut state = self.state.write().await;
        let Some(index) = state.files.iter().position(|f| f.filename == filename) else {
            return Err(self.fail(LibraryError::not_found("downloaded file", filename)));
        };

        let path = state.files[index].file_path.clone();
        if let Err(e) = self.fs.delete_file(Path::new(&path)).await {
            return Err(self.fail(e.into()));
        }
        state.files.remove(index);
        drop(state);

        info!(filename, "Deleted downloaded file");
        self.publish(LibraryEvent::DownloadDeleted {
            filename: filename.to_string(),
        });
        self.events
            .notify(Notice::success("File Deleted", format!("{filename} was deleted")));
        Ok(())
    }

    fn fail(&self, error: LibraryError) -> LibraryError {
        warn!(error = %error, "Downloads operation failed");
        self.events
            .notify(Notice::error("Could Not Delete File", error.to_string()));
        error
    }

    fn publish(&self, event: LibraryEvent) {
        if self.events.emit(CoreEvent::Library(event)).is_err() {
            trace!("No subscribers for library event");
        }
    }
}

impl std::fmt::Debug for DownloadsCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DownloadsCatalog").finish_non_exhaustive()
    }
}

fn audio_file_name(path: &Path) -> Option<String> {
    let extension = path.extension()?.to_str()?;
    if !DOWNLOAD_EXTENSIONS
        .iter()
        .any(|ext| extension.eq_ignore_ascii_case(ext))
    {
        return None;
    }
    path.file_name().map(|name| name.to_string_lossy().into_owned())
}
