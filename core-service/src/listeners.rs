//! Background tasks that feed bridge and bus events into the stores.
//!
//! Each listener runs until its source ends or the task is aborted by
//! [`CoreService::shutdown`](crate::CoreService::shutdown).

use bridge_traits::lifecycle::LifecycleObserver;
use bridge_traits::network::NetworkMonitor;
use core_device::{ConnectivityState, MapOverlayState};
use core_library::{PlayCountStore, PlayedSong};
use core_runtime::events::{CoreEvent, EventStream, PlaybackEvent};
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};

/// Apply the current lifecycle state, then every change.
pub(crate) async fn run_lifecycle_listener(
    observer: Arc<dyn LifecycleObserver>,
    overlay: MapOverlayState,
) {
    match observer.get_state().await {
        Ok(state) => {
            overlay.handle_lifecycle(state).await;
        }
        Err(e) => warn!(error = %e, "Failed to read initial lifecycle state"),
    }

    let mut changes = match observer.subscribe_changes().await {
        Ok(changes) => changes,
        Err(e) => {
            warn!(error = %e, "Lifecycle changes unavailable, overlay will not follow the app");
            return;
        }
    };

    while let Some(state) = changes.next().await {
        debug!(state = ?state, "Lifecycle changed");
        overlay.handle_lifecycle(state).await;
    }
    info!("Lifecycle listener finished");
}

/// Apply the current network state, then every change.
pub(crate) async fn run_network_listener(
    monitor: Arc<dyn NetworkMonitor>,
    connectivity: ConnectivityState,
) {
    match monitor.get_network_info().await {
        Ok(network) => {
            connectivity.handle_network_change(network).await;
        }
        Err(e) => warn!(error = %e, "Failed to read initial network state"),
    }

    let mut changes = match monitor.subscribe_changes().await {
        Ok(changes) => changes,
        Err(e) => {
            warn!(error = %e, "Network changes unavailable, offline mode stays manual");
            return;
        }
    };

    while let Some(network) = changes.next().await {
        connectivity.handle_network_change(network).await;
    }
    info!("Network listener finished");
}

/// Count a play for every track that starts playing.
///
/// The stream must be subscribed before the session can publish, otherwise
/// early starts are missed.
pub(crate) async fn run_play_count_listener(mut stream: EventStream, play_counts: PlayCountStore) {
    loop {
        match stream.recv().await {
            Ok(CoreEvent::Playback(PlaybackEvent::Started {
                track_id,
                title,
                artist,
                cover,
                locator,
            })) => {
                let mut song = PlayedSong::new(track_id, title, artist);
                song.thumbnail = cover;
                song.locator = Some(locator);
                play_counts.increment(song).await;
            }
            Ok(_) => {}
            Err(RecvError::Lagged(skipped)) => {
                warn!(skipped, "Play count listener lagged, some plays were not counted");
            }
            Err(RecvError::Closed) => break,
        }
    }
    debug!("Play count listener finished");
}

pub(crate) fn is_track_start(event: &CoreEvent) -> bool {
    matches!(event, CoreEvent::Playback(PlaybackEvent::Started { .. }))
}
