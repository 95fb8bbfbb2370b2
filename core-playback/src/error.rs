//! # Playback Error Types
//!
//! Error types for the playback session and its queue.

use bridge_traits::error::BridgeError;
use thiserror::Error;

/// Errors that can occur during playback operations.
#[derive(Error, Debug)]
pub enum PlaybackError {
    // ========================================================================
    // Engine Errors
    // ========================================================================
    /// The host audio engine rejected a load, play, pause, seek or unload.
    #[error("Audio engine error: {0}")]
    Engine(#[from] BridgeError),

    // ========================================================================
    // Playback Control Errors
    // ========================================================================
    /// Attempted operation when no track is loaded.
    #[error("No track loaded")]
    NoTrackLoaded,

    // ========================================================================
    // Queue Errors
    // ========================================================================
    /// A queue operation was given no tracks.
    #[error("Queue is empty")]
    EmptyQueue,

    /// Start index does not point into the queue.
    #[error("Queue index {index} out of range (queue length {len})")]
    InvalidQueueIndex { index: usize, len: usize },

    // ========================================================================
    // Equalizer Errors
    // ========================================================================
    /// No built-in equalizer preset has this name.
    #[error("Unknown equalizer preset: {0}")]
    UnknownPreset(String),

    /// A band gain was NaN or infinite.
    #[error("Invalid gain for equalizer band {band}")]
    InvalidEqualizerGain { band: usize },

    // ========================================================================
    // Generic Errors
    // ========================================================================
    /// Internal error (should not occur in normal operation).
    #[error("Internal error: {0}")]
    Internal(String),
}

impl PlaybackError {
    /// Returns `true` if the host audio engine caused this error.
    pub fn is_engine_error(&self) -> bool {
        matches!(self, PlaybackError::Engine(_))
    }

    /// Returns `true` if this error comes from an invalid queue request.
    pub fn is_queue_error(&self) -> bool {
        matches!(
            self,
            PlaybackError::EmptyQueue | PlaybackError::InvalidQueueIndex { .. }
        )
    }
}

/// Result type for playback operations.
pub type Result<T> = std::result::Result<T, PlaybackError>;
