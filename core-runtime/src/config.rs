//! # Core Configuration Module
//!
//! Provides configuration management for the player core.
//!
//! ## Overview
//!
//! The configuration system uses a builder pattern to construct a `CoreConfig`
//! instance that holds all bridges and settings the core needs. It enforces
//! fail-fast validation so a misconfigured host learns about it at startup,
//! not when the first overlay probe or playlist write happens.
//!
//! ## Required Dependencies
//!
//! - `KeyValueStore` - Durable records (credentials, overlay settings, play counts)
//! - `AudioEngine` - Plays the media the playback session loads
//!
//! ## Optional Dependencies
//!
//! - `UrlLauncher` - Companion-app probing (required by the map overlay feature)
//! - `LifecycleObserver` - App foreground/background transitions
//! - `NetworkMonitor` - Connectivity changes (required by network awareness)
//! - `FileSystemAccess` - Downloaded audio; without it there is no downloads catalog
//! - `Clock` - Defaults to the system clock
//!
//! When the `desktop-shims` feature is enabled, a SQLite-backed
//! `KeyValueStore` is injected automatically if none is provided.
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::{CoreConfig, QueueBoundary};
//! use std::sync::Arc;
//!
//! let config = CoreConfig::builder()
//!     .key_value_store(Arc::new(MyStore))
//!     .audio_engine(Arc::new(MyEngine))
//!     .url_launcher(Arc::new(MyLauncher))
//!     .queue_boundary(QueueBoundary::Wrap)
//!     .enable_map_overlay(true)
//!     .build()
//!     .expect("Failed to build config");
//! ```
//!
//! ## Error Handling
//!
//! ```should_panic
//! use core_runtime::config::CoreConfig;
//!
//! // Missing audio engine
//! let config = CoreConfig::builder()
//!     .build()
//!     .expect("Should fail - missing required bridges");
//! ```

use crate::error::{Error, Result};
use crate::events::DEFAULT_EVENT_BUFFER_SIZE;
use bridge_traits::{
    AudioEngine, Clock, FileSystemAccess, KeyValueStore, LifecycleObserver, NetworkMonitor,
    SystemClock, UrlLauncher,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Owner id stamped on playlists when the host does not provide one.
pub const DEFAULT_OWNER_ID: &str = "local";

/// Companion map applications probed by the map overlay, in order.
pub const DEFAULT_MAP_APP_URLS: &[&str] = &["comgooglemaps://", "http://maps.apple.com/"];

/// `previous()` restarts the current track instead of moving back once more
/// than this much of it has played.
pub const DEFAULT_RESTART_THRESHOLD: Duration = Duration::from_secs(3);

const MAX_EVENT_BUFFER_SIZE: usize = 10_000;
const MAX_RESTART_THRESHOLD: Duration = Duration::from_secs(60);

/// What `next()`/`previous()` do at the ends of the active queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueueBoundary {
    /// Stay on the current track (no-op).
    #[default]
    Stop,
    /// Jump to the opposite end of the queue.
    Wrap,
}

/// Playback session settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaybackSettings {
    pub queue_boundary: QueueBoundary,
    pub restart_threshold: Duration,
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        Self {
            queue_boundary: QueueBoundary::Stop,
            restart_threshold: DEFAULT_RESTART_THRESHOLD,
        }
    }
}

/// Feature flags control optional functionality.
///
/// Features may require corresponding bridge implementations to function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeatureFlags {
    /// Track foreground map apps and drive the floating overlay
    /// (requires UrlLauncher)
    pub enable_map_overlay: bool,

    /// Follow connectivity changes for automatic offline mode
    /// (requires NetworkMonitor)
    pub enable_network_awareness: bool,

    /// Record a play count every time a track starts
    pub enable_play_counts: bool,
}

impl Default for FeatureFlags {
    fn default() -> Self {
        Self {
            enable_map_overlay: false,
            enable_network_awareness: false,
            enable_play_counts: true,
        }
    }
}

/// Core configuration for the player core.
///
/// Use [`CoreConfigBuilder`] to construct instances.
#[derive(Clone)]
pub struct CoreConfig {
    /// Durable key-value storage (required)
    pub key_value_store: Arc<dyn KeyValueStore>,

    /// Audio output (required)
    pub audio_engine: Arc<dyn AudioEngine>,

    /// Capability probe for companion apps (optional)
    pub url_launcher: Option<Arc<dyn UrlLauncher>>,

    /// App lifecycle observer (optional)
    pub lifecycle_observer: Option<Arc<dyn LifecycleObserver>>,

    /// Network connectivity monitor (optional)
    pub network_monitor: Option<Arc<dyn NetworkMonitor>>,

    /// Access to the downloads directory (optional)
    pub file_system: Option<Arc<dyn FileSystemAccess>>,

    /// Time source
    pub clock: Arc<dyn Clock>,

    /// Owner stamped on newly created playlists
    pub owner_id: String,

    /// URLs probed to decide whether a map app is available
    pub map_app_urls: Vec<String>,

    pub playback: PlaybackSettings,

    /// Event bus capacity per subscriber
    pub event_buffer_size: usize,

    pub features: FeatureFlags,
}

impl std::fmt::Debug for CoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoreConfig")
            .field("key_value_store", &"KeyValueStore { ... }")
            .field("audio_engine", &"AudioEngine { ... }")
            .field(
                "url_launcher",
                &self.url_launcher.as_ref().map(|_| "UrlLauncher { ... }"),
            )
            .field(
                "lifecycle_observer",
                &self
                    .lifecycle_observer
                    .as_ref()
                    .map(|_| "LifecycleObserver { ... }"),
            )
            .field(
                "network_monitor",
                &self
                    .network_monitor
                    .as_ref()
                    .map(|_| "NetworkMonitor { ... }"),
            )
            .field(
                "file_system",
                &self.file_system.as_ref().map(|_| "FileSystemAccess { ... }"),
            )
            .field("owner_id", &self.owner_id)
            .field("map_app_urls", &self.map_app_urls)
            .field("playback", &self.playback)
            .field("event_buffer_size", &self.event_buffer_size)
            .field("features", &self.features)
            .finish()
    }
}

impl CoreConfig {
    pub fn builder() -> CoreConfigBuilder {
        CoreConfigBuilder::default()
    }

    /// Validates the configuration and returns an error if invalid.
    ///
    /// This checks:
    /// - Owner id is not blank
    /// - Event buffer size is within `1..=10_000`
    /// - Restart threshold is at most 60 seconds
    /// - Feature flags are consistent with available bridges
    pub fn validate(&self) -> Result<()> {
        if self.owner_id.trim().is_empty() {
            return Err(Error::Config("Owner id cannot be empty".to_string()));
        }

        if self.event_buffer_size == 0 {
            return Err(Error::Config(
                "Event buffer size must be greater than 0".to_string(),
            ));
        }

        if self.event_buffer_size > MAX_EVENT_BUFFER_SIZE {
            return Err(Error::Config(format!(
                "Event buffer size exceeds maximum of {}",
                MAX_EVENT_BUFFER_SIZE
            )));
        }

        if self.playback.restart_threshold > MAX_RESTART_THRESHOLD {
            return Err(Error::Config(
                "Restart threshold exceeds maximum of 60 seconds".to_string(),
            ));
        }

        if self.features.enable_map_overlay {
            if self.url_launcher.is_none() {
                return Err(Error::Config(
                    "Map overlay enabled but no UrlLauncher provided. \
                     Disable the feature or inject a UrlLauncher implementation."
                        .to_string(),
                ));
            }
            if self.map_app_urls.iter().all(|url| url.trim().is_empty()) {
                return Err(Error::Config(
                    "Map overlay enabled but no map app URLs configured".to_string(),
                ));
            }
        }

        if self.features.enable_network_awareness && self.network_monitor.is_none() {
            return Err(Error::Config(
                "Network awareness enabled but no NetworkMonitor provided. \
                 Disable the feature or inject a NetworkMonitor implementation."
                    .to_string(),
            ));
        }

        Ok(())
    }
}

fn audio_engine_missing_error() -> Error {
    Error::CapabilityMissing {
        capability: "AudioEngine".to_string(),
        message: "AudioEngine implementation is required for playback. \
                 Mobile: inject the platform player (AVPlayer/ExoPlayer). \
                 Desktop and tests: inject an output device or a recording engine."
            .to_string(),
    }
}

#[cfg(not(feature = "desktop-shims"))]
fn key_value_store_missing_error() -> Error {
    Error::CapabilityMissing {
        capability: "KeyValueStore".to_string(),
        message: "KeyValueStore implementation is required for saved credentials and settings. \
                 Desktop: ensure the 'desktop-shims' feature is enabled to use the default SqliteKeyValueStore. \
                 Mobile: inject platform-native storage (UserDefaults/DataStore)."
            .to_string(),
    }
}

#[cfg(feature = "desktop-shims")]
fn provide_default_key_value_store(
    storage_path: Option<PathBuf>,
) -> Result<Arc<dyn KeyValueStore>> {
    use bridge_desktop::{SqliteKeyValueStore, DEFAULT_DB_FILE};
    use std::thread;
    use tokio::runtime::{Builder, Handle};

    let path = match storage_path {
        Some(path) => path,
        None => dirs::data_dir()
            .map(|dir| dir.join("groovify").join(DEFAULT_DB_FILE))
            .ok_or_else(|| {
                Error::Config(
                    "No application data directory found. Use .storage_path() to set one."
                        .to_string(),
                )
            })?,
    };

    let init_store = |path: PathBuf| -> Result<SqliteKeyValueStore> {
        let runtime = Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| {
                Error::Internal(format!(
                    "Failed to create Tokio runtime for default KeyValueStore: {}",
                    e
                ))
            })?;

        runtime
            .block_on(SqliteKeyValueStore::new(path))
            .map_err(|e| {
                Error::Internal(format!("Failed to initialize default KeyValueStore: {}", e))
            })
    };

    // A runtime cannot block inside another runtime, so build on a fresh thread
    let store = match Handle::try_current() {
        Ok(_) => thread::spawn(move || init_store(path))
            .join()
            .map_err(|_| {
                Error::Internal(
                    "Worker thread panicked while creating default KeyValueStore".to_string(),
                )
            })??,
        Err(_) => init_store(path)?,
    };

    let store: Arc<dyn KeyValueStore> = Arc::new(store);
    Ok(store)
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_key_value_store(
    _storage_path: Option<PathBuf>,
) -> Result<Arc<dyn KeyValueStore>> {
    Err(key_value_store_missing_error())
}

/// Builder for constructing [`CoreConfig`] instances.
#[derive(Default)]
pub struct CoreConfigBuilder {
    key_value_store: Option<Arc<dyn KeyValueStore>>,
    audio_engine: Option<Arc<dyn AudioEngine>>,
    url_launcher: Option<Arc<dyn UrlLauncher>>,
    lifecycle_observer: Option<Arc<dyn LifecycleObserver>>,
    network_monitor: Option<Arc<dyn NetworkMonitor>>,
    file_system: Option<Arc<dyn FileSystemAccess>>,
    clock: Option<Arc<dyn Clock>>,
    storage_path: Option<PathBuf>,
    owner_id: Option<String>,
    map_app_urls: Option<Vec<String>>,
    playback: PlaybackSettings,
    event_buffer_size: Option<usize>,
    features: FeatureFlags,
}

impl CoreConfigBuilder {
    /// Sets the key-value store implementation (required).
    ///
    /// Without it the `desktop-shims` feature opens a SQLite store at
    /// [`storage_path`](Self::storage_path) or in the platform data directory.
    pub fn key_value_store(mut self, store: Arc<dyn KeyValueStore>) -> Self {
        self.key_value_store = Some(store);
        self
    }

    /// Sets the audio engine implementation (required).
    pub fn audio_engine(mut self, engine: Arc<dyn AudioEngine>) -> Self {
        self.audio_engine = Some(engine);
        self
    }

    /// Sets the URL launcher used to probe for companion map apps.
    pub fn url_launcher(mut self, launcher: Arc<dyn UrlLauncher>) -> Self {
        self.url_launcher = Some(launcher);
        self
    }

    /// Sets the lifecycle observer implementation (optional).
    ///
    /// When present and the map overlay is enabled, foreground/background
    /// transitions are forwarded to the overlay automatically.
    pub fn lifecycle_observer(mut self, observer: Arc<dyn LifecycleObserver>) -> Self {
        self.lifecycle_observer = Some(observer);
        self
    }

    /// Sets the network monitor implementation (optional).
    pub fn network_monitor(mut self, monitor: Arc<dyn NetworkMonitor>) -> Self {
        self.network_monitor = Some(monitor);
        self
    }

    /// Sets the file system used by the downloads catalog (optional).
    pub fn file_system(mut self, file_system: Arc<dyn FileSystemAccess>) -> Self {
        self.file_system = Some(file_system);
        self
    }

    /// Sets the time source. Default: [`SystemClock`].
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Sets the database file used by the default desktop store.
    ///
    /// # Examples
    ///
    /// ```
    /// use core_runtime::config::CoreConfig;
    ///
    /// let builder = CoreConfig::builder()
    ///     .storage_path("/path/to/groovify.db");
    /// ```
    pub fn storage_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.storage_path = Some(path.into());
        self
    }

    /// Sets the owner id for new playlists. Default: `"local"`.
    pub fn owner_id(mut self, owner_id: impl Into<String>) -> Self {
        self.owner_id = Some(owner_id.into());
        self
    }

    /// Replaces the list of probed map app URLs.
    pub fn map_app_urls<I, S>(mut self, urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.map_app_urls = Some(urls.into_iter().map(Into::into).collect());
        self
    }

    /// Sets the queue boundary policy. Default: [`QueueBoundary::Stop`].
    pub fn queue_boundary(mut self, boundary: QueueBoundary) -> Self {
        self.playback.queue_boundary = boundary;
        self
    }

    /// Sets how far into a track `previous()` restarts it instead of
    /// going back. Default: 3 seconds.
    pub fn restart_threshold(mut self, threshold: Duration) -> Self {
        self.playback.restart_threshold = threshold;
        self
    }

    /// Sets the event bus capacity. Default: 100.
    pub fn event_buffer_size(mut self, size: usize) -> Self {
        self.event_buffer_size = Some(size);
        self
    }

    /// Enables or disables the map overlay.
    ///
    /// Requires a `UrlLauncher` to be provided.
    ///
    /// Default: false
    pub fn enable_map_overlay(mut self, enabled: bool) -> Self {
        self.features.enable_map_overlay = enabled;
        self
    }

    /// Enables or disables network awareness.
    ///
    /// Requires a `NetworkMonitor` to be provided.
    ///
    /// Default: false
    pub fn enable_network_awareness(mut self, enabled: bool) -> Self {
        self.features.enable_network_awareness = enabled;
        self
    }

    /// Enables or disables play count tracking.
    ///
    /// Default: true
    pub fn enable_play_counts(mut self, enabled: bool) -> Self {
        self.features.enable_play_counts = enabled;
        self
    }

    /// Sets all feature flags at once.
    pub fn features(mut self, features: FeatureFlags) -> Self {
        self.features = features;
        self
    }

    /// Builds the final `CoreConfig` instance.
    ///
    /// # Returns
    ///
    /// Returns `Ok(CoreConfig)` on success, or an error if:
    /// - Required bridges are missing (KeyValueStore, AudioEngine)
    /// - Configuration values are invalid
    /// - Feature flags are inconsistent with available bridges
    pub fn build(self) -> Result<CoreConfig> {
        let audio_engine = self.audio_engine.ok_or_else(audio_engine_missing_error)?;

        let key_value_store = match self.key_value_store {
            Some(store) => store,
            None => provide_default_key_value_store(self.storage_path)?,
        };

        let config = CoreConfig {
            key_value_store,
            audio_engine,
            url_launcher: self.url_launcher,
            lifecycle_observer: self.lifecycle_observer,
            network_monitor: self.network_monitor,
            file_system: self.file_system,
            clock: self.clock.unwrap_or_else(|| Arc::new(SystemClock)),
            owner_id: self
                .owner_id
                .unwrap_or_else(|| DEFAULT_OWNER_ID.to_string()),
            map_app_urls: self.map_app_urls.unwrap_or_else(|| {
                DEFAULT_MAP_APP_URLS
                    .iter()
                    .map(|url| url.to_string())
                    .collect()
            }),
            playback: self.playback,
            event_buffer_size: self.event_buffer_size.unwrap_or(DEFAULT_EVENT_BUFFER_SIZE),
            features: self.features,
        };

        config.validate()?;

        Ok(config)
    }
}
