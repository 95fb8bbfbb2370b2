//! URL Capability Probe
//!
//! Lets the core ask the host whether a URL (usually a custom scheme such as
//! `comgooglemaps://`) can be opened, which is the only portable way to learn
//! whether a companion application is installed.

use async_trait::async_trait;

use crate::error::Result;

/// URL launcher trait
///
/// # Platform Support
///
/// - **iOS**: `UIApplication.canOpenURL` (schemes must be whitelisted)
/// - **Android**: `PackageManager.resolveActivity` for the intent
/// - **Desktop**: registered protocol handlers
/// - **Web**: not supported, report `false`
///
/// A positive answer only means the URL *could* be opened, not that the
/// target application is currently in the foreground.
#[async_trait]
pub trait UrlLauncher: Send + Sync {
    /// Check whether `url` can be opened on this device
    async fn can_open(&self, url: &str) -> Result<bool>;
}
