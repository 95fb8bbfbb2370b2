//! # Desktop Bridge Implementations
//!
//! Default implementations of bridge traits for desktop platforms
//! (macOS, Windows, Linux).
//!
//! ## Overview
//!
//! - `KeyValueStore` using a SQLite database (`sqlx`)
//! - `FileSystemAccess` using `tokio::fs`
//! - `LifecycleObserver` as no-op (desktop always active)
//! - `UrlLauncher` that accepts web URLs and registered schemes
//! - `NetworkMonitor` using a TCP reachability probe
//!
//! There is no desktop `AudioEngine`; hosts supply their own output device.
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_desktop::{DesktopUrlLauncher, SqliteKeyValueStore};
//!
//! #[tokio::main]
//! async fn main() {
//!     let store = SqliteKeyValueStore::open_default().await.unwrap();
//!     let launcher = DesktopUrlLauncher::new();
//!
//!     // Use in core configuration
//! }
//! ```

mod filesystem;
mod lifecycle;
mod linking;
mod network;
mod storage;

pub use filesystem::TokioFileSystem;
pub use lifecycle::DesktopLifecycleObserver;
pub use linking::DesktopUrlLauncher;
pub use network::DesktopNetworkMonitor;
pub use storage::{SqliteKeyValueStore, DEFAULT_DB_FILE};
