//! # Equalizer Settings
//!
//! Five-band equalizer state with named presets. The settings are persisted
//! as one JSON record; the host reads them back (or [`AudioAdjustments`]) to
//! shape its output.

use crate::error::{PlaybackError, Result};
use bridge_traits::storage::KeyValueStore;
use core_runtime::events::{CoreEvent, EventBus, PlaybackEvent};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, trace, warn};

/// Storage key of the persisted equalizer settings
pub const EQUALIZER_SETTINGS_KEY: &str = "equalizer_settings";

/// Number of bands, lowest frequency first.
pub const BAND_COUNT: usize = 5;

/// Gains are clamped to +/- this many dB.
pub const MAX_GAIN_DB: f32 = 12.0;

pub const FLAT_PRESET: &str = "Flat";

/// Preset name used once the bands are edited by hand.
pub const CUSTOM_PRESET: &str = "Personalizado";

/// Built-in presets, in display order.
pub const PRESETS: &[(&str, [f32; BAND_COUNT])] = &[
    (FLAT_PRESET, [0.0, 0.0, 0.0, 0.0, 0.0]),
    ("Rock", [5.0, 3.0, -2.0, 2.0, 6.0]),
    ("Pop", [2.0, 4.0, 4.0, 3.0, 1.0]),
    ("Reggaeton", [8.0, 6.0, 2.0, 1.0, 3.0]),
    ("RKT", [9.0, 7.0, 3.0, 2.0, 4.0]),
    ("Electrónica", [6.0, 4.0, 0.0, 3.0, 7.0]),
    ("Jazz", [3.0, 2.0, 0.0, 2.0, 4.0]),
    ("Clásica", [4.0, 2.0, -1.0, 3.0, 5.0]),
    ("Hip Hop", [7.0, 5.0, 1.0, 0.0, 2.0]),
    ("Bajos Extremos", [10.0, 8.0, 3.0, 1.0, 0.0]),
];

/// Band gains of a built-in preset.
pub fn preset_values(name: &str) -> Option<[f32; BAND_COUNT]> {
    PRESETS
        .iter()
        .find(|(preset, _)| *preset == name)
        .map(|(_, values)| *values)
}

/// Persisted equalizer state (`{"preset","values","isCustom"}`).
///
/// Missing fields fall back to the flat preset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EqualizerSettings {
    pub preset: String,
    /// Gain per band in dB
    pub values: [f32; BAND_COUNT],
    pub is_custom: bool,
}

impl Default for EqualizerSettings {
    fn default() -> Self {
        Self {
            preset: FLAT_PRESET.to_string(),
            values: [0.0; BAND_COUNT],
            is_custom: false,
        }
    }
}

impl EqualizerSettings {
    /// Approximate the bands with rate and volume for engines that have no
    /// real equalizer.
    ///
    /// Bass moves the rate (0.5 to 2.0); the three middle bands move the
    /// volume (0.1 to 1.0).
    pub fn audio_adjustments(&self) -> AudioAdjustments {
        let [bass, mid_low, mid, mid_high, _treble] = self.values;
        AudioAdjustments {
            rate: (1.0 + bass / 20.0).clamp(0.5, 2.0),
            volume: (1.0 + (mid_low + mid + mid_high) / 60.0).clamp(0.1, 1.0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AudioAdjustments {
    pub rate: f32,
    pub volume: f32,
}

/// Equalizer settings handle. Cheap to clone.
#[derive(Clone)]
pub struct EqualizerStore {
    settings: Arc<Mutex<EqualizerSettings>>,
    store: Arc<dyn KeyValueStore>,
    events: EventBus,
}

impl EqualizerStore {
    pub fn new(store: Arc<dyn KeyValueStore>, events: EventBus) -> Self {
        Self {
            settings: Arc::new(Mutex::new(EqualizerSettings::default())),
            store,
            events,
        }
    }

    pub async fn settings(&self) -> EqualizerSettings {
        self.settings.lock().await.clone()
    }

    /// Restore persisted settings. Missing or malformed records fall back to
    /// the flat preset.
    pub async fn load(&self) -> EqualizerSettings {
        let loaded = match self.store.get(EQUALIZER_SETTINGS_KEY).await {
            Ok(Some(raw)) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                warn!(error = %e, "Malformed equalizer settings, using defaults");
                EqualizerSettings::default()
            }),
            Ok(None) => EqualizerSettings::default(),
            Err(e) => {
                warn!(error = %e, "Failed to read equalizer settings, using defaults");
                EqualizerSettings::default()
            }
        };

        let mut settings = self.settings.lock().await;
        *settings = loaded.clone();
        debug!(preset = %loaded.preset, is_custom = loaded.is_custom, "Loaded equalizer settings");
        loaded
    }

    /// Switch to a built-in preset.
    ///
    /// # Errors
    ///
    /// [`PlaybackError::UnknownPreset`] when no built-in preset has that name.
    pub async fn apply_preset(&self, name: &str) -> Result<EqualizerSettings> {
        let values =
            preset_values(name).ok_or_else(|| PlaybackError::UnknownPreset(name.to_string()))?;
        info!(preset = name, "Applying equalizer preset");
        Ok(self
            .commit(EqualizerSettings {
                preset: name.to_string(),
                values,
                is_custom: false,
            })
            .await)
    }

    /// Set every band by hand. The preset becomes [`CUSTOM_PRESET`] and gains
    /// are clamped to [`MAX_GAIN_DB`].
    ///
    /// # Errors
    ///
    /// [`PlaybackError::InvalidEqualizerGain`] for a NaN or infinite gain.
    pub async fn set_values(&self, values: [f32; BAND_COUNT]) -> Result<EqualizerSettings> {
        if let Some(band) = values.iter().position(|gain| !gain.is_finite()) {
            return Err(PlaybackError::InvalidEqualizerGain { band });
        }
        let values = values.map(|gain| gain.clamp(-MAX_GAIN_DB, MAX_GAIN_DB));
        Ok(self
            .commit(EqualizerSettings {
                preset: CUSTOM_PRESET.to_string(),
                values,
                is_custom: true,
            })
            .await)
    }

    /// Back to the flat preset.
    pub async fn reset(&self) -> EqualizerSettings {
        info!("Resetting equalizer");
        self.commit(EqualizerSettings::default()).await
    }

    pub async fn audio_adjustments(&self) -> AudioAdjustments {
        self.settings.lock().await.audio_adjustments()
    }

    async fn commit(&self, next: EqualizerSettings) -> EqualizerSettings {
        let mut settings = self.settings.lock().await;
        if *settings == next {
            return next;
        }
        *settings = next.clone();

        // in-memory settings stay authoritative if the write fails
        match serde_json::to_string(&next) {
            Ok(json) => {
                if let Err(e) = self.store.set(EQUALIZER_SETTINGS_KEY, &json).await {
                    warn!(error = %e, "Failed to persist equalizer settings");
                }
            }
            Err(e) => warn!(error = %e, "Failed to encode equalizer settings"),
        }
        drop(settings);

        let event = PlaybackEvent::EqualizerChanged {
            preset: next.preset.clone(),
            is_custom: next.is_custom,
        };
        if self.events.emit(CoreEvent::Playback(event)).is_err() {
            trace!("No subscribers for equalizer event");
        }
        next
    }
}

impl std::fmt::Debug for EqualizerStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EqualizerStore").finish_non_exhaustive()
    }
}
