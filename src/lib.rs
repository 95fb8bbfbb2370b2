//! Groovify player core.
//!
//! Umbrella crate for host applications. Enable `desktop-shims` (default)
//! for the desktop bridges, or `core` to inject every bridge yourself.

#[cfg(any(feature = "core", feature = "desktop-shims"))]
pub use core_service::*;
