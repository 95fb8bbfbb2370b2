use thiserror::Error;

/// Errors raised while talking to device bridges.
///
/// Both kinds are fail-soft: the state machines log them and keep working
/// from memory.
#[derive(Error, Debug)]
pub enum DeviceError {
    #[error("Failed to persist {key}: {message}")]
    Persistence { key: String, message: String },

    #[error("Capability probe for {url} failed: {message}")]
    Probe { url: String, message: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, DeviceError>;
