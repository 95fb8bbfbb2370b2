//! Play count store
//!
//! Counts how often each song started playing. The list is persisted as a
//! single JSON record; persistence failures are logged and the in-memory
//! counts stay authoritative.

use crate::error::Result;
use crate::models::{PlayCount, PlayedSong};
use bridge_traits::storage::KeyValueStore;
use bridge_traits::time::Clock;
use core_runtime::events::{CoreEvent, EventBus, LibraryEvent};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, trace, warn};

/// Storage key of the persisted play count list
pub const PLAY_COUNTS_KEY: &str = "playCounts";

#[derive(Clone)]
pub struct PlayCountStore {
    counts: Arc<RwLock<Vec<PlayCount>>>,
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    events: EventBus,
}

impl PlayCountStore {
    pub fn new(store: Arc<dyn KeyValueStore>, clock: Arc<dyn Clock>, events: EventBus) -> Self {
        Self {
            counts: Arc::new(RwLock::new(Vec::new())),
            store,
            clock,
            events,
        }
    }

    /// Restore counts from storage. Missing, unreadable or malformed records
    /// leave the store empty. Returns the number of songs restored.
    pub async fn load(&self) -> usize {
        let restored = match self.store.get(PLAY_COUNTS_KEY).await {
            Ok(Some(raw)) => match serde_json::from_str::<Vec<PlayCount>>(&raw) {
                Ok(counts) => counts,
                Err(e) => {
                    warn!(error = %e, "Discarding malformed play counts");
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!(error = %e, "Failed to read play counts");
                Vec::new()
            }
        };

        let len = restored.len();
        *self.counts.write().await = restored;
        debug!(songs = len, "Loaded play counts");
        len
    }

    /// Record one play of `song`, returning its updated entry.
    pub async fn increment(&self, song: PlayedSong) -> PlayCount {
        let now = self.clock.unix_timestamp_millis();
        let mut counts = self.counts.write().await;

        let entry = match counts.iter_mut().find(|pc| pc.song_id == song.id) {
            Some(existing) => {
                existing.play_count += 1;
                existing.last_played = now;
                existing.clone()
            }
            None => {
                let created = PlayCount {
                    song_id: song.id,
                    title: song.title,
                    artist: song.artist,
                    play_count: 1,
                    last_played: now,
                    thumbnail: song.thumbnail,
                    locator: song.locator,
                };
                counts.push(created.clone());
                created
            }
        };

        if let Err(e) = self.persist(&counts).await {
            warn!(song_id = %entry.song_id, error = %e, "Failed to persist play counts");
        }
        drop(counts);

        trace!(song_id = %entry.song_id, play_count = entry.play_count, "Incremented play count");
        self.publish(LibraryEvent::PlayCountUpdated {
            song_id: entry.song_id.clone(),
            play_count: entry.play_count,
        });
        entry
    }

    /// Up to `limit` entries, most played first; ties go to the most
    /// recently played.
    pub async fn most_played(&self, limit: usize) -> Vec<PlayCount> {
        let mut sorted = self.counts.read().await.clone();
        sorted.sort_by(|a, b| {
            b.play_count
                .cmp(&a.play_count)
                .then_with(|| b.last_played.cmp(&a.last_played))
        });
        sorted.truncate(limit);
        sorted
    }

    pub async fn total_plays(&self) -> u64 {
        self.counts.read().await.iter().map(|pc| pc.play_count).sum()
    }

    pub async fn get(&self, song_id: &str) -> Option<PlayCount> {
        self.counts
            .read()
            .await
            .iter()
            .find(|pc| pc.song_id == song_id)
            .cloned()
    }

    /// Forget all counts, in memory and in storage.
    pub async fn clear(&self) {
        let mut counts = self.counts.write().await;
        counts.clear();
        if let Err(e) = self.store.remove(PLAY_COUNTS_KEY).await {
            warn!(error = %e, "Failed to remove stored play counts");
        }
        drop(counts);

        info!("Cleared play counts");
        self.publish(LibraryEvent::PlayHistoryCleared);
    }

    async fn persist(&self, counts: &[PlayCount]) -> Result<()> {
        let json = serde_json::to_string(counts)?;
        self.store.set(PLAY_COUNTS_KEY, &json).await?;
        Ok(())
    }

    fn publish(&self, event: LibraryEvent) {
        if self.events.emit(CoreEvent::Library(event)).is_err() {
            trace!("No subscribers for library event");
        }
    }
}

impl std::fmt::Debug for PlayCountStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlayCountStore").finish_non_exhaustive()
    }
}
