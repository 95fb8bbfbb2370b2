//! Playable track model

use bridge_traits::playback::{MediaLocator, MediaMetadata, MediaRequest};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// An immutable playable item.
///
/// The session and queue share tracks through `Arc<Track>`; nothing mutates a
/// track after construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    pub id: String,
    pub title: String,
    pub artist: String,
    pub locator: MediaLocator,
    /// Artwork URL
    pub cover: Option<String>,
    /// Duration known ahead of loading, used when the engine cannot tell
    pub duration: Option<Duration>,
}

impl Track {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        artist: impl Into<String>,
        locator: MediaLocator,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            artist: artist.into(),
            locator,
            cover: None,
            duration: None,
        }
    }

    pub fn with_cover(mut self, cover: impl Into<String>) -> Self {
        self.cover = Some(cover.into());
        self
    }

    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = Some(duration);
        self
    }

    /// Builds the engine load request for this track.
    pub fn media_request(&self) -> MediaRequest {
        MediaRequest::new(self.locator.clone()).with_metadata(MediaMetadata {
            track_id: Some(self.id.clone()),
            title: Some(self.title.clone()),
            artist: Some(self.artist.clone()),
            artwork: self.cover.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_media_request_carries_metadata() {
        let track = Track::new(
            "t1",
            "Intro",
            "The xx",
            MediaLocator::parse("https://cdn.example.com/intro.mp3"),
        )
        .with_cover("https://cdn.example.com/intro.jpg");

        let request = track.media_request();
        assert_eq!(request.locator, track.locator);
        assert_eq!(request.metadata.track_id.as_deref(), Some("t1"));
        assert_eq!(request.metadata.title.as_deref(), Some("Intro"));
        assert_eq!(request.metadata.artist.as_deref(), Some("The xx"));
        assert_eq!(
            request.metadata.artwork.as_deref(),
            Some("https://cdn.example.com/intro.jpg")
        );
    }
}
