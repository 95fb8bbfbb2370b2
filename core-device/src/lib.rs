//! # Device Module
//!
//! State that follows the host device rather than the user's library.
//!
//! ## Overview
//!
//! - [`MapOverlayState`]: shows a floating player over companion map apps.
//!   Follows app lifecycle transitions and probes whether a map app can be
//!   opened.
//! - [`ConnectivityState`]: tracks connectivity and the offline mode, switching
//!   it automatically when configured to.
//!
//! Both persist their settings through the host key-value store and treat
//! storage and probe failures as non-fatal.

pub mod connectivity;
pub mod error;
pub mod map_overlay;

pub use connectivity::{
    ConnectivitySnapshot, ConnectivityState, OfflineSettings, OFFLINE_SETTINGS_KEY,
};
pub use error::{DeviceError, Result};
pub use map_overlay::{
    MapOverlayState, OverlaySettings, OverlaySnapshot, MAP_OVERLAY_SETTINGS_KEY,
};
