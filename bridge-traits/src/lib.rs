//! # Host Bridge Traits
//!
//! Platform abstraction traits that must be implemented by each host platform.
//!
//! ## Overview
//!
//! This crate defines the contract between the player core and the host
//! application. Each trait represents a capability the core needs but cannot
//! provide itself: durable storage, app lifecycle, URL probing, audio output.
//!
//! ## Traits
//!
//! ### Storage
//! - [`KeyValueStore`](storage::KeyValueStore) - Durable string key-value records
//! - [`FileSystemAccess`](storage::FileSystemAccess) - Downloaded audio files
//!
//! ### Platform Integration
//! - [`LifecycleObserver`](lifecycle::LifecycleObserver) - App foreground/background transitions
//! - [`UrlLauncher`](linking::UrlLauncher) - "Can this URL be opened?" capability probe
//! - [`NetworkMonitor`](network::NetworkMonitor) - Connectivity changes
//! - [`AudioEngine`](playback::AudioEngine) - Loads and plays media
//!
//! ### Utilities
//! - [`Clock`](time::Clock) - Time source for deterministic testing
//! - [`LoggerSink`](time::LoggerSink) - Forward structured logs to host logging
//!
//! ## Platform Requirements
//!
//! | Platform | Implementation Crate | Status |
//! |----------|---------------------|--------|
//! | Desktop  | `bridge-desktop`    | ✅ Available |
//! | iOS      | TBD                 | 📋 Planned |
//! | Android  | TBD                 | 📋 Planned |
//!
//! ## Error Handling
//!
//! All bridge traits use the [`BridgeError`](error::BridgeError) type. Platform
//! implementations should convert native errors into it and keep messages
//! actionable.
//!
//! ## Thread Safety
//!
//! All bridge traits require `Send + Sync` so a single instance can be shared
//! across the core's async tasks behind an `Arc`.
//!
//! ## Examples
//!
//! ### Implementing UrlLauncher
//!
//! ```ignore
//! use bridge_traits::linking::UrlLauncher;
//! use bridge_traits::error::Result;
//! use async_trait::async_trait;
//!
//! pub struct InstalledApps {
//!     schemes: Vec<String>,
//! }
//!
//! #[async_trait]
//! impl UrlLauncher for InstalledApps {
//!     async fn can_open(&self, url: &str) -> Result<bool> {
//!         Ok(self.schemes.iter().any(|s| url.starts_with(s.as_str())))
//!     }
//! }
//! ```

pub mod error;
pub mod lifecycle;
pub mod linking;
pub mod network;
pub mod playback;
pub mod storage;
pub mod time;

pub use error::BridgeError;

// Re-export commonly used types
pub use lifecycle::{LifecycleChangeStream, LifecycleObserver, LifecycleState};
pub use linking::UrlLauncher;
pub use network::{NetworkChangeStream, NetworkInfo, NetworkMonitor, NetworkStatus, NetworkType};
pub use playback::{AudioEngine, MediaInfo, MediaLocator, MediaMetadata, MediaRequest};
pub use storage::{FileMetadata, FileSystemAccess, KeyValueStore};
pub use time::{Clock, LogEntry, LogLevel, LoggerSink, ManualClock, SystemClock};
