//! Core service façade and bootstrap helpers.
//!
//! This crate wires the host-provided bridges (key-value store, audio engine,
//! file system, URL launcher, lifecycle observer, network monitor) into the
//! player core and keeps the background listeners that connect them running.
//!
//! Desktop apps typically enable the `desktop-shims` feature, which fills in
//! the bridges from `bridge-desktop` via [`desktop_config_builder`]; mobile
//! hosts inject their own implementations through
//! [`CoreConfig::builder`](core_runtime::config::CoreConfig::builder).
//!
//! ```ignore
//! use core_service::CoreService;
//! use core_runtime::config::CoreConfig;
//!
//! let config = CoreConfig::builder()
//!     .key_value_store(store)
//!     .audio_engine(engine)
//!     .build()?;
//! let core = CoreService::bootstrap(config).await?;
//! core.playlists().create("Road trip", None).await?;
//! ```

pub mod error;
mod listeners;
mod service;

pub use error::{CoreError, Result};
pub use service::CoreService;

pub use core_auth as auth;
pub use core_device as device;
pub use core_library as library;
pub use core_playback as playback;
pub use core_runtime::{config, events, logging};

#[cfg(all(feature = "desktop-shims", not(target_arch = "wasm32")))]
mod desktop {
    use bridge_desktop::{
        DesktopLifecycleObserver, DesktopNetworkMonitor, DesktopUrlLauncher, TokioFileSystem,
    };
    use core_runtime::config::{CoreConfig, CoreConfigBuilder};
    use std::sync::Arc;

    /// Config builder with the desktop bridges already injected. The host
    /// still provides the audio engine.
    pub fn desktop_config_builder() -> CoreConfigBuilder {
        CoreConfig::builder()
            .url_launcher(Arc::new(DesktopUrlLauncher::new()))
            .lifecycle_observer(Arc::new(DesktopLifecycleObserver::new()))
            .network_monitor(Arc::new(DesktopNetworkMonitor::new()))
            .file_system(Arc::new(TokioFileSystem::new()))
    }
}

#[cfg(all(feature = "desktop-shims", not(target_arch = "wasm32")))]
pub use desktop::desktop_config_builder;
