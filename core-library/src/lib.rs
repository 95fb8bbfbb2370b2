//! # Library Management Module
//!
//! Owns the user's playlists and listening history.
//!
//! ## Overview
//!
//! This module manages:
//! - In-memory playlists with ordered songs (`PlaylistStore`)
//! - Per-song play counts persisted through the host key-value store
//!   (`PlayCountStore`)
//! - The catalog of downloaded audio files and downloads in flight
//!   (`DownloadsCatalog`)
//! - Validation of user input and default metadata for songs

pub mod downloads;
pub mod error;
pub mod models;
pub mod play_counts;
pub mod playlists;

pub use downloads::{DownloadedFile, DownloadsCatalog, DOWNLOAD_EXTENSIONS};
pub use error::{LibraryError, Result};
pub use models::{
    PlayCount, PlayedSong, Playlist, PlaylistSong, PlaylistUpdate, SongInput, UNKNOWN_ARTIST,
    UNKNOWN_FILE_NAME, UNKNOWN_TITLE,
};
pub use play_counts::{PlayCountStore, PLAY_COUNTS_KEY};
pub use playlists::PlaylistStore;
