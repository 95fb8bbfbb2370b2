//! # Playback Session
//!
//! The single source of truth for what is playing. The session drives the
//! host [`AudioEngine`] and consumes its progress reports.
//!
//! ## States
//!
//! | Status    | current | playing | elapsed            |
//! |-----------|---------|---------|--------------------|
//! | `Idle`    | none    | false   | 0                  |
//! | `Playing` | some    | true    | `<= total`         |
//! | `Paused`  | some    | false   | `<= total`         |
//! | `Ended`   | some    | false   | `== total`         |
//!
//! Every operation holds the session lock for its whole duration, including
//! the engine round-trip, so mutations apply in call order.

use crate::error::{PlaybackError, Result};
use crate::queue::PlayQueue;
use crate::track::Track;
use bridge_traits::error::BridgeError;
use bridge_traits::playback::AudioEngine;
use core_runtime::config::{PlaybackSettings, QueueBoundary};
use core_runtime::events::{CoreEvent, EventBus, Notice, PlaybackEvent};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, error, info, instrument, trace};

/// Coarse session state derived from the fields of a [`SessionSnapshot`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Idle,
    Playing,
    Paused,
    /// Track reached its end with nothing after it. The track stays loaded.
    Ended,
}

/// Point-in-time copy of the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub status: SessionStatus,
    pub track: Option<Arc<Track>>,
    pub playing: bool,
    pub elapsed: Duration,
    /// `None` while the duration is unknown.
    pub total: Option<Duration>,
    pub queue_length: usize,
    pub queue_index: Option<usize>,
}

impl SessionSnapshot {
    pub fn track_id(&self) -> Option<&str> {
        self.track.as_ref().map(|track| track.id.as_str())
    }
}

#[derive(Debug, Default)]
struct SessionState {
    queue: PlayQueue,
    current: Option<Arc<Track>>,
    playing: bool,
    ended: bool,
    elapsed: Duration,
    total: Option<Duration>,
}

impl SessionState {
    fn status(&self) -> SessionStatus {
        match (&self.current, self.playing, self.ended) {
            (None, _, _) => SessionStatus::Idle,
            (Some(_), true, _) => SessionStatus::Playing,
            (Some(_), false, true) => SessionStatus::Ended,
            (Some(_), false, false) => SessionStatus::Paused,
        }
    }

    fn current_id(&self) -> Option<String> {
        self.current.as_ref().map(|track| track.id.clone())
    }

    fn reset(&mut self) {
        self.current = None;
        self.playing = false;
        self.ended = false;
        self.elapsed = Duration::ZERO;
        self.total = None;
    }

    fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            status: self.status(),
            track: self.current.clone(),
            playing: self.playing,
            elapsed: self.elapsed,
            total: self.total,
            queue_length: self.queue.len(),
            queue_index: self.queue.cursor(),
        }
    }
}

struct SessionInner {
    state: Mutex<SessionState>,
    engine: Arc<dyn AudioEngine>,
    events: EventBus,
    settings: PlaybackSettings,
}

/// Playback session handle.
///
/// Cheap to clone; all clones share the same session.
#[derive(Clone)]
pub struct PlaybackSession {
    inner: Arc<SessionInner>,
}

impl PlaybackSession {
    pub fn new(engine: Arc<dyn AudioEngine>, events: EventBus, settings: PlaybackSettings) -> Self {
        Self {
            inner: Arc::new(SessionInner {
                state: Mutex::new(SessionState::default()),
                engine,
                events,
                settings,
            }),
        }
    }

    pub fn settings(&self) -> PlaybackSettings {
        self.inner.settings
    }

    pub async fn snapshot(&self) -> SessionSnapshot {
        self.inner.state.lock().await.snapshot()
    }

    /// Loads `track` into the engine and starts it from the beginning.
    ///
    /// When the track is part of the active queue the cursor moves to it;
    /// otherwise the queue becomes just this track. On engine failure the
    /// previous session state is kept.
    #[instrument(skip(self, track), fields(track_id = %track.id))]
    pub async fn load_and_play(&self, track: Arc<Track>) -> Result<()> {
        let mut state = self.inner.state.lock().await;
        self.start_track(&mut state, track.clone(), true).await?;

        match state.queue.position_of(&track.id) {
            Some(index) => state.queue.focus(index),
            None => {
                state.queue = PlayQueue::single(track);
                self.publish_queue(&state);
            }
        }
        Ok(())
    }

    /// Playing → Paused. No-op in any other state.
    pub async fn pause(&self) -> Result<()> {
        let mut state = self.inner.state.lock().await;
        if state.status() != SessionStatus::Playing {
            trace!("Pause ignored, session is not playing");
            return Ok(());
        }

        if let Err(e) = self.inner.engine.pause().await {
            return Err(self.engine_failure(state.current_id(), e));
        }
        state.playing = false;

        if let Some(track_id) = state.current_id() {
            self.publish(PlaybackEvent::Paused {
                track_id,
                position_ms: millis(state.elapsed),
            });
        }
        Ok(())
    }

    /// Paused → Playing, only while the track has time left or its length is
    /// unknown. No-op in any other state.
    pub async fn resume(&self) -> Result<()> {
        let mut state = self.inner.state.lock().await;
        if state.status() != SessionStatus::Paused {
            trace!("Resume ignored, session is not paused");
            return Ok(());
        }
        if let Some(total) = state.total {
            if state.elapsed >= total {
                trace!("Resume ignored, track has no time left");
                return Ok(());
            }
        }

        if let Err(e) = self.inner.engine.play().await {
            return Err(self.engine_failure(state.current_id(), e));
        }
        state.playing = true;

        if let Some(track_id) = state.current_id() {
            self.publish(PlaybackEvent::Resumed {
                track_id,
                position_ms: millis(state.elapsed),
            });
        }
        Ok(())
    }

    /// Moves to the following queue entry.
    ///
    /// A paused session stays paused, a playing or ended one plays. At the
    /// end of the queue the configured boundary policy applies.
    pub async fn next(&self) -> Result<()> {
        let mut state = self.inner.state.lock().await;
        match state.queue.next_index(self.inner.settings.queue_boundary) {
            Some(index) => self.move_to(&mut state, index).await,
            None => {
                debug!("Already at the end of the queue");
                Ok(())
            }
        }
    }

    /// Moves to the preceding queue entry, or restarts the current track when
    /// more than the restart threshold of it has played.
    pub async fn previous(&self) -> Result<()> {
        let mut state = self.inner.state.lock().await;

        if state.current.is_some() && state.elapsed > self.inner.settings.restart_threshold {
            return self.restart_current(&mut state).await;
        }

        match state.queue.previous_index(self.inner.settings.queue_boundary) {
            Some(index) => self.move_to(&mut state, index).await,
            None => {
                debug!("Already at the start of the queue");
                Ok(())
            }
        }
    }

    /// Accepts a progress report from the engine.
    ///
    /// Values are clamped to the track length and values behind the current
    /// position are ignored. Reaching the end advances to the next queue
    /// entry when there is one, otherwise the session ends with the track
    /// still loaded.
    pub async fn report_progress(&self, elapsed: Duration) -> Result<()> {
        let mut state = self.inner.state.lock().await;
        if state.status() != SessionStatus::Playing {
            trace!("Progress ignored, session is not playing");
            return Ok(());
        }
        if elapsed < state.elapsed {
            trace!(
                reported_ms = millis(elapsed),
                elapsed_ms = millis(state.elapsed),
                "Progress ignored, position went backwards"
            );
            return Ok(());
        }

        match state.total {
            Some(total) if elapsed >= total => {
                state.elapsed = total;
                self.finish_track(&mut state).await
            }
            _ => {
                state.elapsed = elapsed;
                self.publish_position(&state);
                Ok(())
            }
        }
    }

    /// End-of-media signal from the engine. Needed for tracks whose length is
    /// unknown, where progress alone cannot tell that the track ended.
    pub async fn report_finished(&self) -> Result<()> {
        let mut state = self.inner.state.lock().await;
        if state.status() != SessionStatus::Playing {
            trace!("Finish ignored, session is not playing");
            return Ok(());
        }

        let total = state.total.unwrap_or(state.elapsed);
        state.total = Some(total);
        state.elapsed = total;
        self.finish_track(&mut state).await
    }

    /// Seeks within the current track. The position is clamped to the track
    /// length. Seeking an ended track back from the end leaves it paused.
    pub async fn seek(&self, position: Duration) -> Result<()> {
        let mut state = self.inner.state.lock().await;
        if state.current.is_none() {
            return Err(PlaybackError::NoTrackLoaded);
        }

        let position = match state.total {
            Some(total) => position.min(total),
            None => position,
        };

        if let Err(e) = self.inner.engine.seek(position).await {
            return Err(self.engine_failure(state.current_id(), e));
        }
        state.elapsed = position;
        if state.ended && state.total.map_or(true, |total| position < total) {
            state.ended = false;
        }

        self.publish_position(&state);
        Ok(())
    }

    /// Replaces the active queue without touching the loaded track.
    pub async fn set_queue(&self, tracks: Vec<Arc<Track>>, start_index: usize) -> Result<()> {
        let queue = PlayQueue::from_tracks(tracks, start_index)?;
        let mut state = self.inner.state.lock().await;
        state.queue = queue;
        self.publish_queue(&state);
        Ok(())
    }

    /// Replaces the active queue and starts playing `start_index`.
    ///
    /// On engine failure both the previous queue and the previous track are
    /// kept.
    pub async fn play_queue(&self, tracks: Vec<Arc<Track>>, start_index: usize) -> Result<()> {
        let queue = PlayQueue::from_tracks(tracks, start_index)?;
        let track = queue
            .current()
            .cloned()
            .ok_or_else(|| PlaybackError::Internal("queue has no current entry".to_string()))?;

        let mut state = self.inner.state.lock().await;
        self.start_track(&mut state, track, true).await?;
        state.queue = queue;
        self.publish_queue(&state);
        Ok(())
    }

    /// Unloads the current track and returns to idle. The queue is kept.
    pub async fn stop(&self) -> Result<()> {
        let mut state = self.inner.state.lock().await;
        let Some(track_id) = state.current_id() else {
            return Ok(());
        };

        if let Err(e) = self.inner.engine.unload().await {
            return Err(self.engine_failure(Some(track_id), e));
        }
        state.reset();

        info!(track_id = %track_id, "Playback stopped");
        self.publish(PlaybackEvent::Stopped { track_id });
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Internals (called with the state lock held)
    // ------------------------------------------------------------------------

    async fn start_track(
        &self,
        state: &mut SessionState,
        track: Arc<Track>,
        autoplay: bool,
    ) -> Result<()> {
        let info = match self.inner.engine.load(track.media_request()).await {
            Ok(info) => info,
            Err(e) => return Err(self.engine_failure(Some(track.id.clone()), e)),
        };
        if autoplay {
            if let Err(e) = self.inner.engine.play().await {
                return Err(self.engine_failure(Some(track.id.clone()), e));
            }
        }

        state.total = info.duration.or(track.duration);
        state.elapsed = Duration::ZERO;
        state.playing = autoplay;
        state.ended = false;
        state.current = Some(track.clone());

        info!(
            track_id = %track.id,
            duration_ms = state.total.map(millis),
            autoplay,
            "Track loaded"
        );
        if autoplay {
            self.publish(PlaybackEvent::Started {
                track_id: track.id.clone(),
                title: track.title.clone(),
                artist: track.artist.clone(),
                cover: track.cover.clone(),
                locator: track.locator.to_string(),
            });
        }
        Ok(())
    }

    async fn move_to(&self, state: &mut SessionState, index: usize) -> Result<()> {
        let Some(track) = state.queue.get(index).cloned() else {
            return Err(PlaybackError::InvalidQueueIndex {
                index,
                len: state.queue.len(),
            });
        };
        let autoplay = state.playing || state.ended;

        self.start_track(state, track, autoplay).await?;
        state.queue.focus(index);
        Ok(())
    }

    async fn restart_current(&self, state: &mut SessionState) -> Result<()> {
        if let Err(e) = self.inner.engine.seek(Duration::ZERO).await {
            return Err(self.engine_failure(state.current_id(), e));
        }
        if state.ended {
            if let Err(e) = self.inner.engine.play().await {
                return Err(self.engine_failure(state.current_id(), e));
            }
            state.ended = false;
            state.playing = true;
        }
        state.elapsed = Duration::ZERO;

        debug!(track_id = ?state.current_id(), "Restarted current track");
        self.publish_position(state);
        Ok(())
    }

    /// Marks the current track as ended, then advances without wrapping.
    async fn finish_track(&self, state: &mut SessionState) -> Result<()> {
        state.playing = false;
        state.ended = true;

        let Some(track_id) = state.current_id() else {
            return Ok(());
        };

        match state.queue.next_index(QueueBoundary::Stop) {
            Some(index) => {
                debug!(track_id = %track_id, next_index = index, "Advancing to next track");
                self.move_to(state, index).await
            }
            None => {
                info!(track_id = %track_id, "Reached the end of the queue");
                self.publish(PlaybackEvent::Completed { track_id });
                Ok(())
            }
        }
    }

    fn engine_failure(&self, track_id: Option<String>, err: BridgeError) -> PlaybackError {
        error!(track_id = ?track_id, error = %err, "Audio engine operation failed");
        self.publish(PlaybackEvent::Error {
            track_id,
            message: err.to_string(),
        });
        self.inner
            .events
            .notify(Notice::error("Playback Error", err.to_string()));
        PlaybackError::Engine(err)
    }

    fn publish_position(&self, state: &SessionState) {
        if let Some(track_id) = state.current_id() {
            self.publish(PlaybackEvent::PositionChanged {
                track_id,
                position_ms: millis(state.elapsed),
                duration_ms: state.total.map(millis).unwrap_or(0),
            });
        }
    }

    fn publish_queue(&self, state: &SessionState) {
        self.publish(PlaybackEvent::QueueChanged {
            length: state.queue.len(),
            index: state.queue.cursor().unwrap_or(0),
        });
    }

    fn publish(&self, event: PlaybackEvent) {
        if self.inner.events.emit(CoreEvent::Playback(event)).is_err() {
            trace!("No subscribers for playback event");
        }
    }
}

impl std::fmt::Debug for PlaybackSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaybackSession")
            .field("settings", &self.inner.settings)
            .finish_non_exhaustive()
    }
}

fn millis(duration: Duration) -> u64 {
    duration.as_millis().try_into().unwrap_or(u64::MAX)
}
