//! Playlist store
//!
//! Holds the user's playlists in memory, newest first. Every successful
//! mutation publishes a [`LibraryEvent`] and a success notice; every failure
//! publishes an error notice and is returned to the caller.

use crate::error::{LibraryError, Result};
use crate::models::{Playlist, PlaylistSong, PlaylistUpdate, SongInput};
use bridge_traits::time::Clock;
use core_runtime::events::{CoreEvent, EventBus, LibraryEvent, Notice};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, instrument, trace, warn};

const ENTITY: &str = "playlist";

/// In-memory playlist store handle.
///
/// Cheap to clone; all clones share the same playlists.
#[derive(Clone)]
pub struct PlaylistStore {
    playlists: Arc<RwLock<Vec<Playlist>>>,
    clock: Arc<dyn Clock>,
    events: EventBus,
    owner_id: String,
}

impl PlaylistStore {
    pub fn new(clock: Arc<dyn Clock>, events: EventBus, owner_id: impl Into<String>) -> Self {
        Self {
            playlists: Arc::new(RwLock::new(Vec::new())),
            clock,
            events,
            owner_id: owner_id.into(),
        }
    }

    pub fn owner_id(&self) -> &str {
        &self.owner_id
    }

    /// Create a playlist. The name is trimmed and must not be empty; a blank
    /// description is dropped. The new playlist is listed first.
    #[instrument(skip(self, description))]
    pub async fn create(&self, name: &str, description: Option<&str>) -> Result<Playlist> {
        let mut playlist = Playlist::new(self.owner_id.clone(), name, description, self.clock.now());
        if let Err(message) = playlist.validate() {
            return Err(self.fail(LibraryError::invalid_input("name", message)));
        }

        let mut playlists = self.playlists.write().await;
        while playlists.iter().any(|p| p.id == playlist.id) {
            playlist.id = uuid::Uuid::new_v4().to_string();
        }
        playlists.insert(0, playlist.clone());
        drop(playlists);

        info!(playlist_id = %playlist.id, name = %playlist.name, "Created playlist");
        self.publish(LibraryEvent::PlaylistCreated {
            playlist_id: playlist.id.clone(),
            name: playlist.name.clone(),
        });
        self.events.notify(Notice::success(
            "Playlist Created",
            format!("\"{}\" was created", playlist.name),
        ));
        Ok(playlist)
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: &str) -> Result<()> {
        let mut playlists = self.playlists.write().await;
        let Some(index) = playlists.iter().position(|p| p.id == id) else {
            return Err(self.fail(LibraryError::not_found(ENTITY, id)));
        };
        let removed = playlists.remove(index);
        drop(playlists);

        info!(playlist_id = %id, "Deleted playlist");
        self.publish(LibraryEvent::PlaylistDeleted {
            playlist_id: id.to_string(),
        });
        self.events.notify(Notice::success(
            "Playlist Deleted",
            format!("\"{}\" was deleted", removed.name),
        ));
        Ok(())
    }

    /// Append a song to a playlist. Each call creates a new entry, even for a
    /// song that is already in the playlist.
    #[instrument(skip(self, song))]
    pub async fn add_song(&self, id: &str, song: SongInput) -> Result<PlaylistSong> {
        let now = self.clock.now();
        let mut playlists = self.playlists.write().await;
        let Some(playlist) = playlists.iter_mut().find(|p| p.id == id) else {
            return Err(self.fail(LibraryError::not_found(ENTITY, id)));
        };

        let mut entry = PlaylistSong::from_input(song, now);
        while playlist.contains_song(&entry.id) {
            entry.id = uuid::Uuid::new_v4().to_string();
        }
        playlist.songs.push(entry.clone());
        playlist.updated_at = now;
        let playlist_name = playlist.name.clone();
        drop(playlists);

        debug!(playlist_id = %id, song_id = %entry.id, title = %entry.title, "Added song");
        self.publish(LibraryEvent::SongAdded {
            playlist_id: id.to_string(),
            song_id: entry.id.clone(),
        });
        self.events.notify(Notice::success(
            "Song Added",
            format!("\"{}\" was added to \"{}\"", entry.title, playlist_name),
        ));
        Ok(entry)
    }

    /// Remove every entry with `song_id`. Returns how many were removed;
    /// removing nothing leaves the playlist untouched.
    #[instrument(skip(self))]
    pub async fn remove_song(&self, id: &str, song_id: &str) -> Result<usize> {
        let now = self.clock.now();
        let mut playlists = self.playlists.write().await;
        let Some(playlist) = playlists.iter_mut().find(|p| p.id == id) else {
            return Err(self.fail(LibraryError::not_found(ENTITY, id)));
        };

        let before = playlist.songs.len();
        playlist.songs.retain(|song| song.id != song_id);
        let removed = before - playlist.songs.len();
        if removed == 0 {
            trace!(playlist_id = %id, song_id = %song_id, "No matching song to remove");
            return Ok(0);
        }
        playlist.updated_at = now;
        drop(playlists);

        debug!(playlist_id = %id, song_id = %song_id, removed, "Removed song");
        self.publish(LibraryEvent::SongRemoved {
            playlist_id: id.to_string(),
            song_id: song_id.to_string(),
            removed,
        });
        self.events
            .notify(Notice::success("Song Removed", "The song was removed from the playlist"));
        Ok(removed)
    }

    /// Apply a partial update. A provided name is trimmed and must not be
    /// empty; a blank description clears it.
    #[instrument(skip(self, update))]
    pub async fn update(&self, id: &str, update: PlaylistUpdate) -> Result<Playlist> {
        let name = match update.name.as_deref().map(Playlist::normalize_name) {
            Some(name) if name.is_empty() => {
                return Err(self.fail(LibraryError::invalid_input(
                    "name",
                    "Playlist name cannot be empty",
                )))
            }
            other => other,
        };

        let now = self.clock.now();
        let mut playlists = self.playlists.write().await;
        let Some(playlist) = playlists.iter_mut().find(|p| p.id == id) else {
            return Err(self.fail(LibraryError::not_found(ENTITY, id)));
        };

        if update.is_empty() {
            return Ok(playlist.clone());
        }

        let change_type = match (&name, &update.description) {
            (Some(_), Some(_)) => "details",
            (Some(_), None) => "renamed",
            _ => "description",
        };
        if let Some(name) = name {
            playlist.name = name;
        }
        if let Some(description) = update.description.as_deref() {
            playlist.description = Playlist::normalize_description(description);
        }
        playlist.updated_at = now;
        let updated = playlist.clone();
        drop(playlists);

        info!(playlist_id = %id, change_type, "Updated playlist");
        self.publish(LibraryEvent::PlaylistUpdated {
            playlist_id: id.to_string(),
            change_type: change_type.to_string(),
        });
        self.events.notify(Notice::success(
            "Playlist Updated",
            format!("\"{}\" was updated", updated.name),
        ));
        Ok(updated)
    }

    pub async fn get_by_id(&self, id: &str) -> Option<Playlist> {
        self.playlists
            .read()
            .await
            .iter()
            .find(|p| p.id == id)
            .cloned()
    }

    /// Snapshot of all playlists, newest first
    pub async fn list(&self) -> Vec<Playlist> {
        self.playlists.read().await.clone()
    }

    pub async fn count(&self) -> usize {
        self.playlists.read().await.len()
    }

    fn fail(&self, error: LibraryError) -> LibraryError {
        warn!(error = %error, "Playlist operation failed");
        self.events
            .notify(Notice::error("Playlist Error", error.to_string()));
        error
    }

    fn publish(&self, event: LibraryEvent) {
        if self.events.emit(CoreEvent::Library(event)).is_err() {
            trace!("No subscribers for library event");
        }
    }
}

impl std::fmt::Debug for PlaylistStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaylistStore")
            .field("owner_id", &self.owner_id)
            .finish_non_exhaustive()
    }
}
