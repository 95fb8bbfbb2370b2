use crate::error::{CoreError, Result};
use crate::listeners;
use bridge_traits::playback::MediaLocator;
use core_auth::UserDataStore;
use core_device::{ConnectivityState, MapOverlayState};
use core_library::{DownloadsCatalog, PlayCountStore, PlaylistSong, PlaylistStore};
use core_playback::{EqualizerStore, PlaybackSession, Track};
use core_runtime::config::{CoreConfig, FeatureFlags};
use core_runtime::events::{EventBus, EventStream};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

/// Primary façade exposed to host applications.
///
/// Owns one instance of every store, all sharing a single [`EventBus`] and
/// clock. Cheap to clone.
#[derive(Clone)]
pub struct CoreService {
    events: EventBus,
    playback: PlaybackSession,
    equalizer: EqualizerStore,
    playlists: PlaylistStore,
    play_counts: PlayCountStore,
    downloads: Option<DownloadsCatalog>,
    user_data: UserDataStore,
    map_overlay: Option<MapOverlayState>,
    connectivity: ConnectivityState,
    features: FeatureFlags,
    listeners: Arc<Mutex<Vec<JoinHandle<()>>>>,
}

impl CoreService {
    /// Build every store from `config`, restore persisted state and start
    /// the background listeners.
    ///
    /// Must be called from within a Tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Runtime`] when the configuration is invalid and
    /// [`CoreError::InitializationFailed`] outside a runtime.
    #[instrument(skip(config), fields(owner_id = %config.owner_id))]
    pub async fn bootstrap(config: CoreConfig) -> Result<Self> {
        config.validate()?;
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| CoreError::InitializationFailed(e.to_string()))?;

        let events = EventBus::new(config.event_buffer_size);
        let store = config.key_value_store.clone();
        let clock = config.clock.clone();

        let playback = PlaybackSession::new(
            config.audio_engine.clone(),
            events.clone(),
            config.playback,
        );
        let equalizer = EqualizerStore::new(store.clone(), events.clone());
        let playlists = PlaylistStore::new(clock.clone(), events.clone(), config.owner_id.clone());
        let play_counts = PlayCountStore::new(store.clone(), clock.clone(), events.clone());
        let downloads = config
            .file_system
            .clone()
            .map(|fs| DownloadsCatalog::new(fs, clock.clone(), events.clone()));
        let user_data = UserDataStore::new(store.clone(), clock, events.clone());
        let connectivity = ConnectivityState::new(store.clone(), events.clone());
        let map_overlay = match (&config.url_launcher, config.features.enable_map_overlay) {
            (Some(launcher), true) => Some(MapOverlayState::new(
                launcher.clone(),
                store,
                events.clone(),
                config.map_app_urls.clone(),
            )),
            _ => None,
        };

        user_data.load().await;
        equalizer.load().await;
        let restored_counts = play_counts.load().await;
        connectivity.load().await;
        if let Some(overlay) = &map_overlay {
            overlay.load().await;
        }
        if let Some(downloads) = &downloads {
            if let Err(e) = downloads.refresh().await {
                warn!(error = %e, "Downloads catalog starts empty");
            }
        }
        debug!(restored_counts, "Restored persisted state");

        let mut handles = Vec::new();
        if config.features.enable_play_counts {
            let stream = EventStream::new(events.subscribe()).filter(listeners::is_track_start);
            handles.push(runtime.spawn(listeners::run_play_count_listener(
                stream,
                play_counts.clone(),
            )));
        }
        if let (Some(overlay), Some(observer)) = (&map_overlay, &config.lifecycle_observer) {
            handles.push(runtime.spawn(listeners::run_lifecycle_listener(
                observer.clone(),
                overlay.clone(),
            )));
        }
        if config.features.enable_network_awareness {
            if let Some(monitor) = &config.network_monitor {
                handles.push(runtime.spawn(listeners::run_network_listener(
                    monitor.clone(),
                    connectivity.clone(),
                )));
            }
        }

        info!(
            listeners = handles.len(),
            map_overlay = map_overlay.is_some(),
            downloads = downloads.is_some(),
            "Core service started"
        );

        Ok(Self {
            events,
            playback,
            equalizer,
            playlists,
            play_counts,
            downloads,
            user_data,
            map_overlay,
            connectivity,
            features: config.features,
            listeners: Arc::new(Mutex::new(handles)),
        })
    }

    /// Stop the background listeners. Stores stay usable afterwards; they
    /// just stop reacting to bridge and bus events.
    pub async fn shutdown(&self) {
        let handles: Vec<_> = self.listeners.lock().await.drain(..).collect();
        let count = handles.len();
        for handle in handles {
            handle.abort();
        }
        info!(listeners = count, "Core service stopped");
    }

    /// Number of listeners still running.
    pub async fn active_listeners(&self) -> usize {
        self.listeners
            .lock()
            .await
            .iter()
            .filter(|handle| !handle.is_finished())
            .count()
    }

    /// Replace the queue with a playlist's songs and start at `start_index`.
    pub async fn play_playlist(&self, playlist_id: &str, start_index: usize) -> Result<()> {
        let playlist = self.playlists.get_by_id(playlist_id).await.ok_or_else(|| {
            CoreError::Library(core_library::LibraryError::not_found("playlist", playlist_id))
        })?;
        let tracks = playlist.songs.iter().map(track_from_song).collect();
        self.playback.play_queue(tracks, start_index).await?;
        Ok(())
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// New subscription to every core event.
    pub fn subscribe(&self) -> EventStream {
        EventStream::new(self.events.subscribe())
    }

    pub fn playback(&self) -> &PlaybackSession {
        &self.playback
    }

    pub fn equalizer(&self) -> &EqualizerStore {
        &self.equalizer
    }

    pub fn playlists(&self) -> &PlaylistStore {
        &self.playlists
    }

    pub fn play_counts(&self) -> &PlayCountStore {
        &self.play_counts
    }

    /// `None` when no file system bridge was configured.
    pub fn downloads(&self) -> Option<&DownloadsCatalog> {
        self.downloads.as_ref()
    }

    pub fn user_data(&self) -> &UserDataStore {
        &self.user_data
    }

    /// `None` unless the map overlay feature is enabled.
    pub fn map_overlay(&self) -> Option<&MapOverlayState> {
        self.map_overlay.as_ref()
    }

    pub fn connectivity(&self) -> &ConnectivityState {
        &self.connectivity
    }

    pub fn features(&self) -> FeatureFlags {
        self.features
    }
}

impl std::fmt::Debug for CoreService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoreService")
            .field("features", &self.features)
            .field("map_overlay", &self.map_overlay.is_some())
            .field("downloads", &self.downloads.is_some())
            .finish_non_exhaustive()
    }
}

fn track_from_song(song: &PlaylistSong) -> Arc<Track> {
    let mut track = Track::new(
        song.id.clone(),
        song.title.clone(),
        song.artist.clone(),
        MediaLocator::parse(&song.file_locator),
    );
    if let Some(thumbnail) = &song.thumbnail {
        track = track.with_cover(thumbnail.clone());
    }
    if let Some(ms) = song.duration_ms {
        track = track.with_duration(Duration::from_millis(ms));
    }
    Arc::new(track)
}
