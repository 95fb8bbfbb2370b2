//! # Core Runtime Module
//!
//! Provides foundational runtime infrastructure for the player core:
//! - Logging and tracing infrastructure
//! - Configuration management
//! - Event bus and user notices
//!
//! ## Overview
//!
//! Every other core crate depends on this one. It fixes the logging
//! conventions, the shape of the configuration handed in by the host, and the
//! events stores publish instead of showing UI themselves.

pub mod config;
pub mod error;
pub mod events;
pub mod logging;

pub use error::{Error, Result};
