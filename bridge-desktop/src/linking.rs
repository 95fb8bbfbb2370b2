//! URL capability probe for desktop

use async_trait::async_trait;
use bridge_traits::{error::Result, linking::UrlLauncher};
use tracing::debug;

/// Desktop URL launcher
///
/// Web URLs are always openable through the default browser. Custom schemes
/// are openable only when registered with [`with_scheme`](Self::with_scheme);
/// mobile app schemes such as `comgooglemaps://` are absent on desktop.
#[derive(Debug, Clone, Default)]
pub struct DesktopUrlLauncher {
    extra_schemes: Vec<String>,
}

impl DesktopUrlLauncher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Treat `scheme` (without `://`) as openable.
    pub fn with_scheme(mut self, scheme: impl Into<String>) -> Self {
        self.extra_schemes.push(scheme.into().to_ascii_lowercase());
        self
    }
}

fn scheme_of(url: &str) -> Option<String> {
    let (scheme, _) = url.split_once(':')?;
    if scheme.is_empty() {
        return None;
    }
    Some(scheme.to_ascii_lowercase())
}

#[async_trait]
impl UrlLauncher for DesktopUrlLauncher {
    async fn can_open(&self, url: &str) -> Result<bool> {
        let openable = match scheme_of(url) {
            Some(scheme) if scheme == "http" || scheme == "https" => true,
            Some(scheme) => self.extra_schemes.contains(&scheme),
            None => false,
        };
        debug!(url = url, openable, "Probed URL");
        Ok(openable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_web_urls_are_openable() {
        let launcher = DesktopUrlLauncher::new();
        assert!(launcher.can_open("http://maps.apple.com/").await.unwrap());
        assert!(launcher.can_open("HTTPS://example.com").await.unwrap());
    }

    #[tokio::test]
    async fn test_app_schemes_need_registration() {
        let launcher = DesktopUrlLauncher::new();
        assert!(!launcher.can_open("comgooglemaps://").await.unwrap());

        let launcher = launcher.with_scheme("comgooglemaps");
        assert!(launcher.can_open("comgooglemaps://").await.unwrap());
    }

    #[tokio::test]
    async fn test_garbage_is_not_openable() {
        let launcher = DesktopUrlLauncher::new();
        assert!(!launcher.can_open("not a url").await.unwrap());
        assert!(!launcher.can_open("://nothing").await.unwrap());
    }
}
