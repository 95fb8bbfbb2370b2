//! Map Overlay State
//!
//! Decides whether the floating player overlay is shown on top of a
//! companion map application.
//!
//! ## Behaviour
//!
//! - Coming to the foreground probes the configured map app URLs. If any can
//!   be opened and the overlay is enabled, the overlay becomes visible.
//! - Going to the background hides the overlay unconditionally.
//! - Disabling the overlay hides it. Enabling it never shows it by itself;
//!   only a later probe or an explicit `show_overlay()` does.
//!
//! Settings changes are persisted under [`MAP_OVERLAY_SETTINGS_KEY`]. Probe
//! and storage failures are logged and never surfaced: a failed probe counts
//! as "no map app available".

use crate::error::{DeviceError, Result};
use bridge_traits::lifecycle::LifecycleState;
use bridge_traits::linking::UrlLauncher;
use bridge_traits::storage::KeyValueStore;
use core_runtime::events::{CoreEvent, DeviceEvent, EventBus};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, trace, warn};

/// Storage key of the persisted overlay settings
pub const MAP_OVERLAY_SETTINGS_KEY: &str = "map_overlay_settings";

fn default_enabled() -> bool {
    true
}

/// Persisted overlay settings.
///
/// Serialized as `{"overlayEnabled": bool, "isOverlayVisible": bool}`;
/// `overlayVisible` is accepted when reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverlaySettings {
    #[serde(rename = "overlayEnabled", default = "default_enabled")]
    pub overlay_enabled: bool,
    #[serde(rename = "isOverlayVisible", alias = "overlayVisible", default)]
    pub overlay_visible: bool,
}

impl Default for OverlaySettings {
    fn default() -> Self {
        Self {
            overlay_enabled: true,
            overlay_visible: false,
        }
    }
}

/// Settings plus the runtime-only map app flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OverlaySnapshot {
    pub overlay_enabled: bool,
    pub overlay_visible: bool,
    /// A map app was found by the last foreground probe
    pub maps_app_active: bool,
}

#[derive(Debug, Default)]
struct OverlayState {
    settings: OverlaySettings,
    maps_app_active: bool,
}

impl OverlayState {
    fn snapshot(&self) -> OverlaySnapshot {
        OverlaySnapshot {
            overlay_enabled: self.settings.overlay_enabled,
            overlay_visible: self.settings.overlay_visible,
            maps_app_active: self.maps_app_active,
        }
    }
}

#[derive(Clone)]
pub struct MapOverlayState {
    state: Arc<Mutex<OverlayState>>,
    launcher: Arc<dyn UrlLauncher>,
    store: Arc<dyn KeyValueStore>,
    events: EventBus,
    map_app_urls: Arc<[String]>,
}

impl MapOverlayState {
    pub fn new(
        launcher: Arc<dyn UrlLauncher>,
        store: Arc<dyn KeyValueStore>,
        events: EventBus,
        map_app_urls: Vec<String>,
    ) -> Self {
        Self {
            state: Arc::new(Mutex::new(OverlayState::default())),
            launcher,
            store,
            events,
            map_app_urls: map_app_urls.into(),
        }
    }

    pub async fn snapshot(&self) -> OverlaySnapshot {
        self.state.lock().await.snapshot()
    }

    pub async fn settings(&self) -> OverlaySettings {
        self.state.lock().await.settings
    }

    /// Restore persisted settings. Missing or malformed records fall back to
    /// the defaults (enabled, hidden). A record that is visible while
    /// disabled loads hidden.
    pub async fn load(&self) -> OverlaySettings {
        let mut state = self.state.lock().await;
        let mut settings: OverlaySettings = match self.store.get(MAP_OVERLAY_SETTINGS_KEY).await {
            Ok(Some(raw)) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                warn!(error = %e, "Malformed overlay settings, using defaults");
                OverlaySettings::default()
            }),
            Ok(None) => OverlaySettings::default(),
            Err(e) => {
                warn!(error = %e, "Failed to read overlay settings, using defaults");
                OverlaySettings::default()
            }
        };
        settings.overlay_visible &= settings.overlay_enabled;

        let before = state.snapshot();
        state.settings = settings;
        debug!(
            overlay_enabled = settings.overlay_enabled,
            overlay_visible = settings.overlay_visible,
            "Loaded overlay settings"
        );
        self.publish_if_changed(before, &state);
        settings
    }

    /// React to an app lifecycle transition. Only `Active` and `Background`
    /// matter; other states are ignored.
    pub async fn handle_lifecycle(&self, lifecycle: LifecycleState) -> OverlaySnapshot {
        match lifecycle {
            LifecycleState::Active => {
                self.probe_maps_apps().await;
            }
            LifecycleState::Background => {
                let mut state = self.state.lock().await;
                let before = state.snapshot();
                state.maps_app_active = false;
                state.settings.overlay_visible = false;
                self.commit(before, &state).await;
            }
            other => trace!(state = ?other, "Ignoring lifecycle state"),
        }
        self.snapshot().await
    }

    /// Probe the configured map apps and show or hide the overlay.
    ///
    /// Returns whether any map app can be opened.
    pub async fn probe_maps_apps(&self) -> bool {
        let mut state = self.state.lock().await;

        let mut available = false;
        for url in self.map_app_urls.iter() {
            match self.launcher.can_open(url).await {
                Ok(true) => {
                    available = true;
                    break;
                }
                Ok(false) => trace!(url = %url, "Map app not available"),
                Err(e) => {
                    let error = DeviceError::Probe {
                        url: url.clone(),
                        message: e.to_string(),
                    };
                    warn!(error = %error, "Treating map app as unavailable");
                }
            }
        }

        let before = state.snapshot();
        let show = available && state.settings.overlay_enabled;
        state.maps_app_active = show;
        state.settings.overlay_visible = show;
        if show {
            info!("Map app detected, showing overlay");
        }
        self.commit(before, &state).await;
        available
    }

    /// Enable or disable the overlay. Disabling hides it; enabling leaves it
    /// hidden until the next probe or `show_overlay()`.
    pub async fn set_overlay_enabled(&self, enabled: bool) -> OverlaySnapshot {
        let mut state = self.state.lock().await;
        let before = state.snapshot();
        state.settings.overlay_enabled = enabled;
        if !enabled {
            state.settings.overlay_visible = false;
        }
        info!(enabled, "Overlay enabled changed");
        self.commit(before, &state).await;
        state.snapshot()
    }

    /// Show the overlay if it is enabled. Returns whether it is visible.
    pub async fn show_overlay(&self) -> bool {
        let mut state = self.state.lock().await;
        let before = state.snapshot();
        if state.settings.overlay_enabled {
            state.settings.overlay_visible = true;
        }
        self.commit(before, &state).await;
        state.settings.overlay_visible
    }

    pub async fn hide_overlay(&self) {
        let mut state = self.state.lock().await;
        let before = state.snapshot();
        state.settings.overlay_visible = false;
        self.commit(before, &state).await;
    }

    /// Returns whether the overlay is visible afterwards.
    pub async fn toggle_overlay(&self) -> bool {
        let visible = self.state.lock().await.settings.overlay_visible;
        if visible {
            self.hide_overlay().await;
            false
        } else {
            self.show_overlay().await
        }
    }

    /// Persist when the settings changed and publish when anything changed.
    async fn commit(&self, before: OverlaySnapshot, state: &OverlayState) {
        let after = state.snapshot();
        if before.overlay_enabled != after.overlay_enabled
            || before.overlay_visible != after.overlay_visible
        {
            if let Err(e) = self.persist(&state.settings).await {
                warn!(error = %e, "Overlay settings kept in memory only");
            }
        }
        self.publish_if_changed(before, state);
    }

    async fn persist(&self, settings: &OverlaySettings) -> Result<()> {
        let json = serde_json::to_string(settings)?;
        self.store
            .set(MAP_OVERLAY_SETTINGS_KEY, &json)
            .await
            .map_err(|e| DeviceError::Persistence {
                key: MAP_OVERLAY_SETTINGS_KEY.to_string(),
                message: e.to_string(),
            })
    }

    fn publish_if_changed(&self, before: OverlaySnapshot, state: &OverlayState) {
        let after = state.snapshot();
        if before == after {
            return;
        }
        let event = DeviceEvent::OverlayChanged {
            overlay_enabled: after.overlay_enabled,
            overlay_visible: after.overlay_visible,
            maps_app_active: after.maps_app_active,
        };
        if self.events.emit(CoreEvent::Device(event)).is_err() {
            trace!("No subscribers for device event");
        }
    }
}

impl std::fmt::Debug for MapOverlayState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MapOverlayState")
            .field("map_app_urls", &self.map_app_urls)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_record_format() {
        let json = serde_json::to_value(OverlaySettings::default()).unwrap();
        assert_eq!(json["overlayEnabled"], true);
        assert_eq!(json["isOverlayVisible"], false);
    }

    #[test]
    fn test_settings_defaults_for_missing_fields() {
        let settings: OverlaySettings = serde_json::from_str("{}").unwrap();
        assert_eq!(settings, OverlaySettings::default());

        let settings: OverlaySettings =
            serde_json::from_str(r#"{"overlayVisible":true}"#).unwrap();
        assert!(settings.overlay_enabled);
        assert!(settings.overlay_visible);
    }

    #[test]
    fn test_disabled_hidden_round_trip() {
        let settings = OverlaySettings {
            overlay_enabled: false,
            overlay_visible: false,
        };
        let json = serde_json::to_string(&settings).unwrap();
        let restored: OverlaySettings = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, settings);
    }
}
