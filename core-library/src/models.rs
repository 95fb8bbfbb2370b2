//! Domain models for playlists and listening history
//!
//! This module contains the playlist and play count models together with the
//! input types used to create and update them.

use bridge_traits::playback::MediaLocator;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const UNKNOWN_TITLE: &str = "Unknown Title";
pub const UNKNOWN_ARTIST: &str = "Unknown Artist";
pub const UNKNOWN_FILE_NAME: &str = "unknown";

/// Extensions stripped from file names when deriving a song title.
const AUDIO_EXTENSIONS: &[&str] = &["mp3", "m4a", "webm", "wav", "aac", "flac"];

// =============================================================================
// Playlists
// =============================================================================

/// User playlist with its songs in play order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Playlist {
    /// Unique identifier
    pub id: String,
    /// User that created the playlist
    pub owner_id: String,
    /// Display name, never blank
    pub name: String,
    pub description: Option<String>,
    pub songs: Vec<PlaylistSong>,
    pub created_at: DateTime<Utc>,
    /// Bumped by every mutation
    pub updated_at: DateTime<Utc>,
}

impl Playlist {
    /// Create an empty playlist. `name` and `description` are normalized
    /// with [`normalize_name`](Self::normalize_name) and
    /// [`normalize_description`](Self::normalize_description).
    pub fn new(
        owner_id: impl Into<String>,
        name: &str,
        description: Option<&str>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            owner_id: owner_id.into(),
            name: Self::normalize_name(name),
            description: description.and_then(Self::normalize_description),
            songs: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Validate playlist data
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("Playlist name cannot be empty".to_string());
        }

        if self.updated_at < self.created_at {
            return Err("Playlist updated before it was created".to_string());
        }

        Ok(())
    }

    pub fn song_count(&self) -> usize {
        self.songs.len()
    }

    /// Sum of known song durations in milliseconds
    pub fn total_duration_ms(&self) -> u64 {
        self.songs.iter().filter_map(|song| song.duration_ms).sum()
    }

    pub fn contains_song(&self, song_id: &str) -> bool {
        self.songs.iter().any(|song| song.id == song_id)
    }

    pub fn normalize_name(name: &str) -> String {
        name.trim().to_string()
    }

    /// Trimmed description, `None` when nothing is left
    pub fn normalize_description(description: &str) -> Option<String> {
        let trimmed = description.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    }
}

/// One entry of a playlist.
///
/// Every add creates a new entry id, so the same song can appear more than
/// once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaylistSong {
    /// Entry identifier, unique within the playlist
    pub id: String,
    pub title: String,
    pub artist: String,
    pub file_name: String,
    /// URL or local path of the audio
    pub file_locator: String,
    pub thumbnail: Option<String>,
    pub duration_ms: Option<u64>,
    pub added_at: DateTime<Utc>,
}

impl PlaylistSong {
    /// Copy a song-like input, filling defaults for missing fields.
    pub fn from_input(input: SongInput, now: DateTime<Utc>) -> Self {
        let file_locator = input.file_locator.unwrap_or_default();
        let file_name = non_blank(input.file_name).or_else(|| file_name_from_locator(&file_locator));

        let title = non_blank(input.title)
            .or_else(|| file_name.as_deref().and_then(title_from_file_name))
            .unwrap_or_else(|| UNKNOWN_TITLE.to_string());
        let artist = non_blank(input.artist).unwrap_or_else(|| UNKNOWN_ARTIST.to_string());

        Self {
            id: Uuid::new_v4().to_string(),
            title,
            artist,
            file_name: file_name.unwrap_or_else(|| UNKNOWN_FILE_NAME.to_string()),
            file_locator,
            thumbnail: non_blank(input.thumbnail),
            duration_ms: input.duration_ms.filter(|ms| *ms > 0),
            added_at: now,
        }
    }
}

/// Song-like input accepted by `PlaylistStore::add_song`.
///
/// Every field is optional; see [`PlaylistSong::from_input`] for defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SongInput {
    pub title: Option<String>,
    pub artist: Option<String>,
    pub file_name: Option<String>,
    pub file_locator: Option<String>,
    pub thumbnail: Option<String>,
    pub duration_ms: Option<u64>,
}

impl SongInput {
    pub fn from_locator(locator: impl Into<String>) -> Self {
        Self {
            file_locator: Some(locator.into()),
            ..Self::default()
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_artist(mut self, artist: impl Into<String>) -> Self {
        self.artist = Some(artist.into());
        self
    }

    pub fn with_file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = Some(file_name.into());
        self
    }

    pub fn with_thumbnail(mut self, thumbnail: impl Into<String>) -> Self {
        self.thumbnail = Some(thumbnail.into());
        self
    }

    pub fn with_duration_ms(mut self, duration_ms: u64) -> Self {
        self.duration_ms = Some(duration_ms);
        self
    }
}

/// Partial playlist update. `None` fields are left untouched; an empty
/// description clears it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaylistUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
}

impl PlaylistUpdate {
    pub fn rename(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            description: None,
        }
    }

    pub fn describe(description: impl Into<String>) -> Self {
        Self {
            name: None,
            description: Some(description.into()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.description.is_none()
    }
}

// =============================================================================
// Play counts
// =============================================================================

/// How often a song was played. Stored as JSON, so the field names follow
/// the host's record format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayCount {
    #[serde(rename = "id")]
    pub song_id: String,
    pub title: String,
    pub artist: String,
    pub play_count: u64,
    /// Unix timestamp in milliseconds
    pub last_played: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    #[serde(rename = "url", default, skip_serializing_if = "Option::is_none")]
    pub locator: Option<String>,
}

/// A song that just started playing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlayedSong {
    pub id: String,
    pub title: String,
    pub artist: String,
    pub thumbnail: Option<String>,
    pub locator: Option<String>,
}

impl PlayedSong {
    pub fn new(id: impl Into<String>, title: impl Into<String>, artist: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            artist: artist.into(),
            thumbnail: None,
            locator: None,
        }
    }
}

// =============================================================================
// Helpers
// =============================================================================

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Last path segment of a locator. URL segments are percent-decoded; local
/// paths are taken as they are.
fn file_name_from_locator(locator: &str) -> Option<String> {
    let locator = MediaLocator::parse(locator);
    let name = locator.file_name()?;
    if !locator.is_remote() {
        return Some(name);
    }
    match urlencoding::decode(&name) {
        Ok(decoded) => Some(decoded.into_owned()),
        Err(_) => Some(name),
    }
}

/// File name without a known audio extension, `None` if nothing is left.
pub fn title_from_file_name(file_name: &str) -> Option<String> {
    let stem = match file_name.rsplit_once('.') {
        Some((stem, ext)) if AUDIO_EXTENSIONS.iter().any(|e| ext.eq_ignore_ascii_case(e)) => stem,
        _ => file_name,
    };
    let stem = stem.trim();
    (!stem.is_empty()).then(|| stem.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> DateTime<Utc> {
        DateTime::<Utc>::UNIX_EPOCH + chrono::Duration::days(20_000)
    }

    #[test]
    fn test_playlist_new_normalizes_input() {
        let playlist = Playlist::new("local", "  Road Trip  ", Some("   "), now());

        assert_eq!(playlist.name, "Road Trip");
        assert_eq!(playlist.description, None);
        assert_eq!(playlist.owner_id, "local");
        assert_eq!(playlist.created_at, playlist.updated_at);
        assert!(playlist.validate().is_ok());
    }

    #[test]
    fn test_playlist_validation() {
        let mut playlist = Playlist::new("local", "Chill", None, now());
        playlist.name = "   ".to_string();
        assert!(playlist.validate().is_err());
    }

    #[test]
    fn test_title_from_file_name() {
        assert_eq!(title_from_file_name("Song.MP3").as_deref(), Some("Song"));
        assert_eq!(title_from_file_name("mix.flac").as_deref(), Some("mix"));
        assert_eq!(title_from_file_name("voice.ogg").as_deref(), Some("voice.ogg"));
        assert_eq!(title_from_file_name("no_extension").as_deref(), Some("no_extension"));
        assert_eq!(title_from_file_name(".mp3"), None);
    }

    #[test]
    fn test_song_defaults_from_locator() {
        let song = PlaylistSong::from_input(
            SongInput::from_locator("https://cdn.example.com/music/Night%20Drive.m4a?token=abc"),
            now(),
        );

        assert_eq!(song.file_name, "Night Drive.m4a");
        assert_eq!(song.title, "Night Drive");
        assert_eq!(song.artist, UNKNOWN_ARTIST);
        assert_eq!(song.added_at, now());
    }

    #[test]
    fn test_title_from_encoded_url_segment() {
        let song = PlaylistSong::from_input(
            SongInput::from_locator("https://cdn.example.com/Caf%C3%A9%20del%20Mar%20%26%20Co.mp3"),
            now(),
        );
        assert_eq!(song.title, "Café del Mar & Co");

        // invalid UTF-8 keeps the raw segment
        let song = PlaylistSong::from_input(
            SongInput::from_locator("https://cdn.example.com/bad%FF.mp3"),
            now(),
        );
        assert_eq!(song.title, "bad%FF");
    }

    #[test]
    fn test_local_path_is_not_decoded() {
        let song = PlaylistSong::from_input(SongInput::from_locator("/music/100%25 Hits.mp3"), now());
        assert_eq!(song.title, "100%25 Hits");
    }

    #[test]
    fn test_song_defaults_without_anything() {
        let song = PlaylistSong::from_input(SongInput::default(), now());

        assert_eq!(song.title, UNKNOWN_TITLE);
        assert_eq!(song.artist, UNKNOWN_ARTIST);
        assert_eq!(song.file_name, UNKNOWN_FILE_NAME);
        assert_eq!(song.file_locator, "");
        assert_eq!(song.thumbnail, None);
    }

    #[test]
    fn test_song_keeps_provided_fields() {
        let input = SongInput::from_locator("/music/a.mp3")
            .with_title("Real Title")
            .with_artist("Real Artist")
            .with_file_name("custom.wav")
            .with_duration_ms(215_000);
        let song = PlaylistSong::from_input(input, now());

        assert_eq!(song.title, "Real Title");
        assert_eq!(song.artist, "Real Artist");
        assert_eq!(song.file_name, "custom.wav");
        assert_eq!(song.duration_ms, Some(215_000));
    }

    #[test]
    fn test_play_count_record_format() {
        let record = PlayCount {
            song_id: "s1".to_string(),
            title: "Song".to_string(),
            artist: "Artist".to_string(),
            play_count: 3,
            last_played: 1_700_000_000_000,
            thumbnail: None,
            locator: Some("https://cdn.example.com/s1.mp3".to_string()),
        };

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["id"], "s1");
        assert_eq!(json["playCount"], 3);
        assert_eq!(json["lastPlayed"], 1_700_000_000_000_i64);
        assert_eq!(json["url"], "https://cdn.example.com/s1.mp3");
        assert!(json.get("thumbnail").is_none());
    }
}
