//! Connectivity and offline mode
//!
//! Tracks what the network monitor reports and maintains the user's offline
//! mode. With `auto_offline_mode` the mode switches on when the network
//! drops; with `sync_on_reconnect` it switches back off when the network
//! returns and a [`DeviceEvent::SyncRequested`] is published.

use crate::error::{DeviceError, Result};
use bridge_traits::network::{NetworkInfo, NetworkStatus};
use bridge_traits::storage::KeyValueStore;
use core_runtime::events::{CoreEvent, DeviceEvent, EventBus, Notice};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, trace, warn};

/// Storage key of the persisted offline settings
pub const OFFLINE_SETTINGS_KEY: &str = "offline_settings";

fn default_sync_on_reconnect() -> bool {
    true
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OfflineSettings {
    #[serde(default)]
    pub auto_offline_mode: bool,
    #[serde(default = "default_sync_on_reconnect")]
    pub sync_on_reconnect: bool,
}

impl Default for OfflineSettings {
    fn default() -> Self {
        Self {
            auto_offline_mode: false,
            sync_on_reconnect: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectivitySnapshot {
    pub is_online: bool,
    pub offline_mode: bool,
    /// Label of the active connection, `None` while offline or unknown
    pub connection_type: Option<String>,
    pub settings: OfflineSettings,
}

impl Default for ConnectivitySnapshot {
    fn default() -> Self {
        Self {
            is_online: true,
            offline_mode: false,
            connection_type: None,
            settings: OfflineSettings::default(),
        }
    }
}

#[derive(Clone)]
pub struct ConnectivityState {
    state: Arc<Mutex<ConnectivitySnapshot>>,
    store: Arc<dyn KeyValueStore>,
    events: EventBus,
}

impl ConnectivityState {
    pub fn new(store: Arc<dyn KeyValueStore>, events: EventBus) -> Self {
        Self {
            state: Arc::new(Mutex::new(ConnectivitySnapshot::default())),
            store,
            events,
        }
    }

    pub async fn snapshot(&self) -> ConnectivitySnapshot {
        self.state.lock().await.clone()
    }

    pub async fn is_offline_mode(&self) -> bool {
        self.state.lock().await.offline_mode
    }

    /// Restore persisted settings, falling back to defaults.
    pub async fn load(&self) -> OfflineSettings {
        let settings = match self.store.get(OFFLINE_SETTINGS_KEY).await {
            Ok(Some(raw)) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                warn!(error = %e, "Malformed offline settings, using defaults");
                OfflineSettings::default()
            }),
            Ok(None) => OfflineSettings::default(),
            Err(e) => {
                warn!(error = %e, "Failed to read offline settings, using defaults");
                OfflineSettings::default()
            }
        };
        self.state.lock().await.settings = settings;
        debug!(
            auto_offline_mode = settings.auto_offline_mode,
            sync_on_reconnect = settings.sync_on_reconnect,
            "Loaded offline settings"
        );
        settings
    }

    /// Apply a network report. Indeterminate reports are ignored.
    pub async fn handle_network_change(&self, network: NetworkInfo) -> ConnectivitySnapshot {
        let online = match network.status {
            NetworkStatus::Connected => true,
            NetworkStatus::Disconnected => false,
            NetworkStatus::Indeterminate => {
                trace!("Ignoring indeterminate network status");
                return self.snapshot().await;
            }
        };

        let mut state = self.state.lock().await;
        let was_online = state.is_online;
        let connection_type = if online {
            network.network_type.map(|t| t.label().to_string())
        } else {
            None
        };

        if was_online != online || state.connection_type != connection_type {
            state.is_online = online;
            state.connection_type = connection_type;
            info!(
                is_online = online,
                connection_type = ?state.connection_type,
                "Connectivity changed"
            );
            self.publish(DeviceEvent::ConnectivityChanged {
                is_online: online,
                connection_type: state.connection_type.clone(),
            });
        }

        if was_online && !online && state.settings.auto_offline_mode && !state.offline_mode {
            state.offline_mode = true;
            info!("Network lost, entering offline mode");
            self.publish(DeviceEvent::OfflineModeChanged { enabled: true });
        } else if !was_online && online && state.offline_mode && state.settings.sync_on_reconnect {
            state.offline_mode = false;
            info!("Network restored, leaving offline mode");
            self.publish(DeviceEvent::OfflineModeChanged { enabled: false });
            self.publish(DeviceEvent::SyncRequested);
        }

        state.clone()
    }

    /// Flip offline mode. Returns the new value.
    pub async fn toggle_offline_mode(&self) -> bool {
        let mut state = self.state.lock().await;
        state.offline_mode = !state.offline_mode;
        let enabled = state.offline_mode;

        info!(enabled, "Offline mode toggled");
        self.publish(DeviceEvent::OfflineModeChanged { enabled });
        if enabled {
            self.events
                .notify(Notice::info("Offline Mode", "Only downloaded files will play"));
        } else if state.is_online {
            self.publish(DeviceEvent::SyncRequested);
        }
        enabled
    }

    pub async fn set_auto_offline_mode(&self, enabled: bool) -> OfflineSettings {
        self.update_settings(|settings| settings.auto_offline_mode = enabled)
            .await
    }

    pub async fn set_sync_on_reconnect(&self, enabled: bool) -> OfflineSettings {
        self.update_settings(|settings| settings.sync_on_reconnect = enabled)
            .await
    }

    async fn update_settings(&self, apply: impl FnOnce(&mut OfflineSettings)) -> OfflineSettings {
        let mut state = self.state.lock().await;
        let before = state.settings;
        apply(&mut state.settings);
        let settings = state.settings;

        if settings != before {
            if let Err(e) = self.persist(&settings).await {
                warn!(error = %e, "Offline settings kept in memory only");
            }
        }
        settings
    }

    async fn persist(&self, settings: &OfflineSettings) -> Result<()> {
        let json = serde_json::to_string(settings)?;
        self.store
            .set(OFFLINE_SETTINGS_KEY, &json)
            .await
            .map_err(|e| DeviceError::Persistence {
                key: OFFLINE_SETTINGS_KEY.to_string(),
                message: e.to_string(),
            })
    }

    fn publish(&self, event: DeviceEvent) {
        if self.events.emit(CoreEvent::Device(event)).is_err() {
            trace!("No subscribers for device event");
        }
    }
}

impl std::fmt::Debug for ConnectivityState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectivityState").finish_non_exhaustive()
    }
}
