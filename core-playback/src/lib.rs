//! # Playback Module
//!
//! Owns what is playing: the track model, the active play queue and the
//! playback session state machine that drives the host audio engine.
//!
//! ## Overview
//!
//! This module handles:
//! - Loading, pausing, resuming and seeking through the host `AudioEngine`
//! - Queue navigation with a configurable end-of-queue policy
//! - Auto-advance when a track ends
//! - Publishing `PlaybackEvent`s and error notices on the event bus
//! - Persisted equalizer presets and band gains

pub mod equalizer;
pub mod error;
pub mod queue;
pub mod session;
pub mod track;

pub use core_runtime::config::{PlaybackSettings, QueueBoundary};
pub use equalizer::{
    AudioAdjustments, EqualizerSettings, EqualizerStore, EQUALIZER_SETTINGS_KEY, PRESETS,
};
pub use error::{PlaybackError, Result};
pub use queue::PlayQueue;
pub use session::{PlaybackSession, SessionSnapshot, SessionStatus};
pub use track::Track;
