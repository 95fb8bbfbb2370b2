//! Active play queue
//!
//! An ordered list of tracks with a cursor. Navigation never reorders the
//! list; it only moves the cursor, so `previous()` after `next()` lands on
//! the same entry again.

use crate::error::{PlaybackError, Result};
use crate::track::Track;
use core_runtime::config::QueueBoundary;
use std::sync::Arc;

#[derive(Debug, Clone, Default)]
pub struct PlayQueue {
    tracks: Vec<Arc<Track>>,
    cursor: Option<usize>,
}

impl PlayQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a queue positioned at `start_index`.
    pub fn from_tracks(tracks: Vec<Arc<Track>>, start_index: usize) -> Result<Self> {
        if tracks.is_empty() {
            return Err(PlaybackError::EmptyQueue);
        }
        if start_index >= tracks.len() {
            return Err(PlaybackError::InvalidQueueIndex {
                index: start_index,
                len: tracks.len(),
            });
        }
        Ok(Self {
            tracks,
            cursor: Some(start_index),
        })
    }

    /// Queue holding a single track.
    pub fn single(track: Arc<Track>) -> Self {
        Self {
            tracks: vec![track],
            cursor: Some(0),
        }
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    pub fn tracks(&self) -> &[Arc<Track>] {
        &self.tracks
    }

    pub fn get(&self, index: usize) -> Option<&Arc<Track>> {
        self.tracks.get(index)
    }

    pub fn current(&self) -> Option<&Arc<Track>> {
        self.cursor.and_then(|index| self.tracks.get(index))
    }

    /// Index of the first entry with this track id.
    pub fn position_of(&self, track_id: &str) -> Option<usize> {
        self.tracks.iter().position(|track| track.id == track_id)
    }

    /// Moves the cursor. Out-of-range indices are ignored.
    pub fn focus(&mut self, index: usize) {
        if index < self.tracks.len() {
            self.cursor = Some(index);
        }
    }

    /// Entry after the cursor under `boundary`, `None` when there is none.
    pub fn next_index(&self, boundary: QueueBoundary) -> Option<usize> {
        let cursor = self.cursor?;
        if cursor + 1 < self.tracks.len() {
            return Some(cursor + 1);
        }
        match boundary {
            QueueBoundary::Stop => None,
            QueueBoundary::Wrap => Some(0),
        }
    }

    /// Entry before the cursor under `boundary`, `None` when there is none.
    pub fn previous_index(&self, boundary: QueueBoundary) -> Option<usize> {
        let cursor = self.cursor?;
        if cursor > 0 {
            return Some(cursor - 1);
        }
        match boundary {
            QueueBoundary::Stop => None,
            QueueBoundary::Wrap => Some(self.tracks.len() - 1),
        }
    }

    pub fn clear(&mut self) {
        self.tracks.clear();
        self.cursor = None;
    }
}
