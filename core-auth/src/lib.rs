//! # Account Module
//!
//! Remembers the credentials a user chose to save on this device.
//!
//! ## Overview
//!
//! The user data store keeps a single saved record (username and activation
//! key) in the host key-value store. Saving overwrites the slot, clearing
//! removes it, and loading never fails: a missing or corrupted record simply
//! means nothing is saved.
//!
//! Activation keys are never written to logs or `Debug` output.

pub mod error;
pub mod user_data;

pub use error::{AuthError, Result};
pub use user_data::{SavedCredentials, UserDataStore, USER_DATA_KEY};
