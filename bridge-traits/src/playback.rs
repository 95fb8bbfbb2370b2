//! Audio engine bridge and supporting media types.
//!
//! The core never decodes audio itself. It hands a [`MediaRequest`] to the
//! host's [`AudioEngine`] and expects the host to report progress and
//! end-of-media back into the playback session.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::error::Result;

/// Where the audio data for a track lives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MediaLocator {
    /// Remote HTTP(S) stream fetched by the host.
    Remote { url: String },
    /// Downloaded file on the device.
    LocalFile { path: PathBuf },
}

impl MediaLocator {
    /// Classify a raw locator string.
    ///
    /// `http://` and `https://` URLs are remote, `file://` URLs and anything
    /// else are treated as local paths.
    ///
    /// # Example
    ///
    /// ```
    /// use bridge_traits::playback::MediaLocator;
    ///
    /// assert!(MediaLocator::parse("https://cdn.example.com/a.mp3").is_remote());
    /// assert!(!MediaLocator::parse("file:///music/a.mp3").is_remote());
    /// ```
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        let lower = trimmed.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            MediaLocator::Remote {
                url: trimmed.to_string(),
            }
        } else if lower.starts_with("file://") {
            MediaLocator::LocalFile {
                path: PathBuf::from(&trimmed["file://".len()..]),
            }
        } else {
            MediaLocator::LocalFile {
                path: PathBuf::from(trimmed),
            }
        }
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, MediaLocator::Remote { .. })
    }

    /// Last path segment of the locator, if there is one.
    pub fn file_name(&self) -> Option<String> {
        let name = match self {
            MediaLocator::Remote { url } => {
                let without_query = url.split(['?', '#']).next().unwrap_or(url);
                without_query.rsplit('/').next().map(str::to_string)
            }
            MediaLocator::LocalFile { path } => path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned()),
        };
        name.filter(|n| !n.is_empty())
    }
}

impl std::fmt::Display for MediaLocator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MediaLocator::Remote { url } => f.write_str(url),
            MediaLocator::LocalFile { path } => write!(f, "{}", path.display()),
        }
    }
}

/// Display metadata passed along with a request so the host can populate
/// lock-screen and notification controls.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MediaMetadata {
    pub track_id: Option<String>,
    pub title: Option<String>,
    pub artist: Option<String>,
    pub artwork: Option<String>,
}

/// Request describing the media the engine should load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaRequest {
    pub locator: MediaLocator,
    pub metadata: MediaMetadata,
}

impl MediaRequest {
    pub fn new(locator: MediaLocator) -> Self {
        Self {
            locator,
            metadata: MediaMetadata::default(),
        }
    }

    pub fn with_metadata(mut self, metadata: MediaMetadata) -> Self {
        self.metadata = metadata;
        self
    }
}

/// What the engine learned while loading the media.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MediaInfo {
    /// Total duration, when the container reports one.
    pub duration: Option<Duration>,
}

/// Platform audio engine
///
/// Implementations drive AVPlayer, ExoPlayer, a desktop output device, or a
/// test double. Only one item is loaded at a time; loading a new item replaces
/// the previous one.
///
/// The engine reports progress back to the core by calling
/// `PlaybackSession::report_progress` and `PlaybackSession::report_finished`.
#[async_trait]
pub trait AudioEngine: Send + Sync {
    /// Load media, replacing whatever is currently loaded.
    ///
    /// Errors leave the previously loaded media untouched.
    async fn load(&self, request: MediaRequest) -> Result<MediaInfo>;

    /// Start or resume output of the loaded media.
    async fn play(&self) -> Result<()>;

    /// Pause output without releasing the media.
    async fn pause(&self) -> Result<()>;

    /// Seek to an absolute position within the loaded media.
    async fn seek(&self, position: Duration) -> Result<()>;

    /// Release the loaded media.
    async fn unload(&self) -> Result<()>;
}
