//! Playback session behaviour against a recording audio engine
//!
//! This test suite verifies:
//! - State transitions (Idle, Playing, Paused, Ended)
//! - Queue navigation and the end-of-queue policy
//! - Progress handling, clamping and auto-advance
//! - Engine failures leave the session untouched

use async_trait::async_trait;
use bridge_traits::error::{BridgeError, Result as BridgeResult};
use bridge_traits::playback::{AudioEngine, MediaInfo, MediaLocator, MediaRequest};
use core_playback::{
    PlaybackError, PlaybackSession, PlaybackSettings, QueueBoundary, SessionSnapshot,
    SessionStatus, Track,
};
use core_runtime::events::{CoreEvent, EventBus, EventStream, PlaybackEvent};
use mockall::mock;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

// ============================================================================
// Recording AudioEngine
// ============================================================================

#[derive(Default)]
struct RecordingEngine {
    calls: Mutex<Vec<String>>,
    /// Durations reported on load, by track id
    reported: HashMap<String, Duration>,
}

impl RecordingEngine {
    fn reporting(track_id: &str, duration: Duration) -> Self {
        let mut reported = HashMap::new();
        reported.insert(track_id.to_string(), duration);
        Self {
            calls: Mutex::new(Vec::new()),
            reported,
        }
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: impl Into<String>) {
        self.calls.lock().unwrap().push(call.into());
    }
}

#[async_trait]
impl AudioEngine for RecordingEngine {
    async fn load(&self, request: MediaRequest) -> BridgeResult<MediaInfo> {
        let track_id = request.metadata.track_id.unwrap_or_default();
        self.record(format!("load:{track_id}"));
        Ok(MediaInfo {
            duration: self.reported.get(&track_id).copied(),
        })
    }

    async fn play(&self) -> BridgeResult<()> {
        self.record("play");
        Ok(())
    }

    async fn pause(&self) -> BridgeResult<()> {
        self.record("pause");
        Ok(())
    }

    async fn seek(&self, position: Duration) -> BridgeResult<()> {
        self.record(format!("seek:{}", position.as_secs()));
        Ok(())
    }

    async fn unload(&self) -> BridgeResult<()> {
        self.record("unload");
        Ok(())
    }
}

mock! {
    Engine {}

    #[async_trait]
    impl AudioEngine for Engine {
        async fn load(&self, request: MediaRequest) -> BridgeResult<MediaInfo>;
        async fn play(&self) -> BridgeResult<()>;
        async fn pause(&self) -> BridgeResult<()>;
        async fn seek(&self, position: Duration) -> BridgeResult<()>;
        async fn unload(&self) -> BridgeResult<()>;
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn track(id: &str, secs: u64) -> Arc<Track> {
    Arc::new(
        Track::new(
            id,
            format!("Song {id}"),
            "Test Artist",
            MediaLocator::parse(&format!("https://cdn.example.com/{id}.mp3")),
        )
        .with_duration(Duration::from_secs(secs)),
    )
}

fn session_with(
    engine: Arc<dyn AudioEngine>,
    boundary: QueueBoundary,
) -> (PlaybackSession, EventStream) {
    let events = EventBus::new(100);
    let stream = EventStream::new(events.subscribe());
    let settings = PlaybackSettings {
        queue_boundary: boundary,
        ..PlaybackSettings::default()
    };
    (PlaybackSession::new(engine, events, settings), stream)
}

fn session() -> (PlaybackSession, Arc<RecordingEngine>, EventStream) {
    let engine = Arc::new(RecordingEngine::default());
    let (session, stream) = session_with(engine.clone(), QueueBoundary::Stop);
    (session, engine, stream)
}

fn playback_events(stream: &mut EventStream) -> Vec<PlaybackEvent> {
    stream
        .drain()
        .into_iter()
        .filter_map(|event| match event {
            CoreEvent::Playback(event) => Some(event),
            _ => None,
        })
        .collect()
}

fn assert_invariants(snapshot: &SessionSnapshot) {
    match &snapshot.track {
        None => {
            assert!(!snapshot.playing, "idle session must not play");
            assert_eq!(snapshot.elapsed, Duration::ZERO);
            assert_eq!(snapshot.status, SessionStatus::Idle);
        }
        Some(_) => {
            if let Some(total) = snapshot.total {
                assert!(snapshot.elapsed <= total, "elapsed beyond total");
            }
        }
    }
}

// ============================================================================
// Basic transitions
// ============================================================================

#[tokio::test]
async fn test_new_session_is_idle() {
    let (session, _, _) = session();
    let snapshot = session.snapshot().await;

    assert_eq!(snapshot.status, SessionStatus::Idle);
    assert!(snapshot.track.is_none());
    assert_eq!(snapshot.queue_length, 0);
    assert_invariants(&snapshot);
}

#[tokio::test]
async fn test_load_and_play_starts_track() {
    let (session, engine, mut events) = session();

    session.load_and_play(track("a", 200)).await.unwrap();

    let snapshot = session.snapshot().await;
    assert_eq!(snapshot.status, SessionStatus::Playing);
    assert_eq!(snapshot.track_id(), Some("a"));
    assert_eq!(snapshot.elapsed, Duration::ZERO);
    assert_eq!(snapshot.total, Some(Duration::from_secs(200)));
    assert_eq!(snapshot.queue_length, 1);
    assert_eq!(engine.calls(), vec!["load:a", "play"]);

    let events = playback_events(&mut events);
    assert!(events.iter().any(|event| matches!(
        event,
        PlaybackEvent::Started { track_id, title, artist, .. }
            if track_id == "a" && title == "Song a" && artist == "Test Artist"
    )));
}

#[tokio::test]
async fn test_engine_duration_wins_over_track_duration() {
    let engine = Arc::new(RecordingEngine::reporting("a", Duration::from_secs(187)));
    let (session, _) = session_with(engine, QueueBoundary::Stop);

    session.load_and_play(track("a", 200)).await.unwrap();

    assert_eq!(session.snapshot().await.total, Some(Duration::from_secs(187)));
}

#[tokio::test]
async fn test_pause_and_resume() {
    let (session, engine, _) = session();

    // No-ops while idle
    session.pause().await.unwrap();
    session.resume().await.unwrap();
    assert!(engine.calls().is_empty());

    session.load_and_play(track("a", 200)).await.unwrap();
    session.report_progress(Duration::from_secs(30)).await.unwrap();

    session.pause().await.unwrap();
    let snapshot = session.snapshot().await;
    assert_eq!(snapshot.status, SessionStatus::Paused);
    assert_eq!(snapshot.elapsed, Duration::from_secs(30));

    // Pausing twice does not reach the engine again
    session.pause().await.unwrap();

    session.resume().await.unwrap();
    let snapshot = session.snapshot().await;
    assert_eq!(snapshot.status, SessionStatus::Playing);
    assert_eq!(snapshot.elapsed, Duration::from_secs(30));

    assert_eq!(engine.calls(), vec!["load:a", "play", "pause", "play"]);
}

#[tokio::test]
async fn test_stop_returns_to_idle() {
    let (session, engine, mut events) = session();
    session.load_and_play(track("a", 200)).await.unwrap();
    session.report_progress(Duration::from_secs(12)).await.unwrap();

    session.stop().await.unwrap();

    let snapshot = session.snapshot().await;
    assert_eq!(snapshot.status, SessionStatus::Idle);
    assert_invariants(&snapshot);
    assert_eq!(snapshot.queue_length, 1, "queue survives stop");
    assert_eq!(engine.calls().last().map(String::as_str), Some("unload"));
    assert!(playback_events(&mut events).contains(&PlaybackEvent::Stopped {
        track_id: "a".to_string()
    }));
}

// ============================================================================
// Progress
// ============================================================================

#[tokio::test]
async fn test_progress_is_clamped_and_monotonic() {
    let (session, _, _) = session();
    session.load_and_play(track("a", 200)).await.unwrap();

    session.report_progress(Duration::from_secs(50)).await.unwrap();
    session.report_progress(Duration::from_secs(40)).await.unwrap();
    assert_eq!(session.snapshot().await.elapsed, Duration::from_secs(50));

    session.report_progress(Duration::from_secs(60)).await.unwrap();
    assert_eq!(session.snapshot().await.elapsed, Duration::from_secs(60));
}

#[tokio::test]
async fn test_track_end_without_next_keeps_track_loaded() {
    let (session, _, mut events) = session();
    session.load_and_play(track("a", 200)).await.unwrap();

    session.report_progress(Duration::from_secs(200)).await.unwrap();

    let snapshot = session.snapshot().await;
    assert!(!snapshot.playing);
    assert_eq!(snapshot.status, SessionStatus::Ended);
    assert_eq!(snapshot.track_id(), Some("a"));
    assert_eq!(snapshot.elapsed, Duration::from_secs(200));
    assert!(playback_events(&mut events).contains(&PlaybackEvent::Completed {
        track_id: "a".to_string()
    }));

    // No time left, resume stays put
    session.resume().await.unwrap();
    assert_eq!(session.snapshot().await.status, SessionStatus::Ended);
}

#[tokio::test]
async fn test_progress_past_total_is_clamped() {
    let (session, _, _) = session();
    session.load_and_play(track("a", 200)).await.unwrap();

    session.report_progress(Duration::from_secs(250)).await.unwrap();

    let snapshot = session.snapshot().await;
    assert_eq!(snapshot.elapsed, Duration::from_secs(200));
    assert_invariants(&snapshot);
}

#[tokio::test]
async fn test_track_end_advances_through_queue() {
    let (session, engine, _) = session();
    session
        .play_queue(vec![track("a", 100), track("b", 120)], 0)
        .await
        .unwrap();

    session.report_progress(Duration::from_secs(100)).await.unwrap();

    let snapshot = session.snapshot().await;
    assert_eq!(snapshot.status, SessionStatus::Playing);
    assert_eq!(snapshot.track_id(), Some("b"));
    assert_eq!(snapshot.elapsed, Duration::ZERO);
    assert_eq!(snapshot.queue_index, Some(1));
    assert_eq!(engine.calls(), vec!["load:a", "play", "load:b", "play"]);
}

#[tokio::test]
async fn test_track_end_never_wraps_but_next_does() {
    let engine = Arc::new(RecordingEngine::default());
    let (session, _) = session_with(engine, QueueBoundary::Wrap);
    session
        .play_queue(vec![track("a", 100), track("b", 120)], 1)
        .await
        .unwrap();

    session.report_progress(Duration::from_secs(120)).await.unwrap();

    let snapshot = session.snapshot().await;
    assert_eq!(snapshot.status, SessionStatus::Ended);
    assert_eq!(snapshot.track_id(), Some("b"));

    // An explicit next still wraps and starts playing
    session.next().await.unwrap();
    let snapshot = session.snapshot().await;
    assert_eq!(snapshot.status, SessionStatus::Playing);
    assert_eq!(snapshot.track_id(), Some("a"));
}

#[tokio::test]
async fn test_finished_signal_ends_track_of_unknown_length() {
    let (session, _, _) = session();
    let live = Arc::new(Track::new(
        "live",
        "Live Set",
        "DJ",
        MediaLocator::parse("https://radio.example.com/live"),
    ));
    session.load_and_play(live).await.unwrap();
    assert_eq!(session.snapshot().await.total, None);

    session.report_progress(Duration::from_secs(900)).await.unwrap();
    session.report_finished().await.unwrap();

    let snapshot = session.snapshot().await;
    assert_eq!(snapshot.status, SessionStatus::Ended);
    assert_eq!(snapshot.total, Some(Duration::from_secs(900)));
    assert_invariants(&snapshot);
}

// ============================================================================
// Navigation
// ============================================================================

#[tokio::test]
async fn test_next_keeps_paused_state() {
    let (session, engine, _) = session();
    session
        .play_queue(vec![track("a", 100), track("b", 120)], 0)
        .await
        .unwrap();
    session.pause().await.unwrap();

    session.next().await.unwrap();

    let snapshot = session.snapshot().await;
    assert_eq!(snapshot.status, SessionStatus::Paused);
    assert_eq!(snapshot.track_id(), Some("b"));
    assert_eq!(snapshot.elapsed, Duration::ZERO);
    assert_eq!(engine.calls(), vec!["load:a", "play", "pause", "load:b"]);
}

#[tokio::test]
async fn test_previous_from_ended_restarts_and_plays() {
    let (session, _, _) = session();
    session
        .play_queue(vec![track("a", 100), track("b", 120)], 0)
        .await
        .unwrap();
    session.next().await.unwrap();
    session.report_progress(Duration::from_secs(120)).await.unwrap();
    assert_eq!(session.snapshot().await.status, SessionStatus::Ended);

    session.previous().await.unwrap();

    let snapshot = session.snapshot().await;
    assert_eq!(snapshot.status, SessionStatus::Playing);
    assert_eq!(snapshot.elapsed, Duration::ZERO);
}

#[tokio::test]
async fn test_stop_boundary_is_a_no_op() {
    let (session, engine, _) = session();
    session
        .play_queue(vec![track("a", 100), track("b", 120)], 1)
        .await
        .unwrap();

    session.next().await.unwrap();
    assert_eq!(session.snapshot().await.track_id(), Some("b"));

    session.previous().await.unwrap();
    session.previous().await.unwrap();
    assert_eq!(session.snapshot().await.track_id(), Some("a"));

    assert_eq!(
        engine.calls(),
        vec!["load:b", "play", "load:a", "play"],
        "boundary moves never reach the engine"
    );
}

#[tokio::test]
async fn test_wrap_boundary() {
    let engine = Arc::new(RecordingEngine::default());
    let (session, _) = session_with(engine, QueueBoundary::Wrap);
    session
        .play_queue(vec![track("a", 100), track("b", 120), track("c", 90)], 2)
        .await
        .unwrap();

    session.next().await.unwrap();
    assert_eq!(session.snapshot().await.track_id(), Some("a"));

    session.previous().await.unwrap();
    assert_eq!(session.snapshot().await.track_id(), Some("c"));
}

#[tokio::test]
async fn test_previous_restarts_after_threshold() {
    let (session, engine, _) = session();
    session
        .play_queue(vec![track("a", 100), track("b", 120)], 1)
        .await
        .unwrap();
    session.report_progress(Duration::from_secs(10)).await.unwrap();

    session.previous().await.unwrap();

    let snapshot = session.snapshot().await;
    assert_eq!(snapshot.track_id(), Some("b"));
    assert_eq!(snapshot.elapsed, Duration::ZERO);
    assert_eq!(engine.calls().last().map(String::as_str), Some("seek:0"));

    // Inside the threshold it moves back
    session.previous().await.unwrap();
    assert_eq!(session.snapshot().await.track_id(), Some("a"));
}

#[tokio::test]
async fn test_load_and_play_focuses_queued_track() {
    let (session, _, _) = session();
    let tracks = vec![track("a", 100), track("b", 120), track("c", 90)];
    session.set_queue(tracks.clone(), 0).await.unwrap();

    session.load_and_play(tracks[2].clone()).await.unwrap();
    let snapshot = session.snapshot().await;
    assert_eq!(snapshot.queue_length, 3);
    assert_eq!(snapshot.queue_index, Some(2));

    session.load_and_play(track("z", 60)).await.unwrap();
    let snapshot = session.snapshot().await;
    assert_eq!(snapshot.queue_length, 1);
    assert_eq!(snapshot.queue_index, Some(0));
}

#[tokio::test]
async fn test_queue_validation() {
    let (session, _, _) = session();

    let err = session.play_queue(Vec::new(), 0).await.unwrap_err();
    assert!(matches!(err, PlaybackError::EmptyQueue));

    let err = session.set_queue(vec![track("a", 100)], 3).await.unwrap_err();
    assert!(matches!(
        err,
        PlaybackError::InvalidQueueIndex { index: 3, len: 1 }
    ));
}

// ============================================================================
// Seeking
// ============================================================================

#[tokio::test]
async fn test_seek() {
    let (session, engine, _) = session();

    let err = session.seek(Duration::from_secs(5)).await.unwrap_err();
    assert!(matches!(err, PlaybackError::NoTrackLoaded));

    session.load_and_play(track("a", 200)).await.unwrap();
    session.seek(Duration::from_secs(500)).await.unwrap();
    assert_eq!(session.snapshot().await.elapsed, Duration::from_secs(200));
    assert_eq!(engine.calls().last().map(String::as_str), Some("seek:200"));
}

#[tokio::test]
async fn test_seek_back_from_end_pauses() {
    let (session, _, _) = session();
    session.load_and_play(track("a", 200)).await.unwrap();
    session.report_progress(Duration::from_secs(200)).await.unwrap();

    session.seek(Duration::from_secs(20)).await.unwrap();
    assert_eq!(session.snapshot().await.status, SessionStatus::Paused);

    session.resume().await.unwrap();
    assert_eq!(session.snapshot().await.status, SessionStatus::Playing);
}

// ============================================================================
// Failures
// ============================================================================

#[tokio::test]
async fn test_engine_load_failure_keeps_previous_state() {
    let mut engine = MockEngine::new();
    let mut loads = 0;
    engine.expect_load().returning(move |_| {
        loads += 1;
        if loads == 1 {
            Ok(MediaInfo::default())
        } else {
            Err(BridgeError::OperationFailed("unsupported codec".into()))
        }
    });
    engine.expect_play().returning(|| Ok(()));

    let (session, mut events) = session_with(Arc::new(engine), QueueBoundary::Stop);
    session.load_and_play(track("a", 200)).await.unwrap();
    let before = session.snapshot().await;
    events.drain();

    let err = session.load_and_play(track("b", 100)).await.unwrap_err();
    assert!(err.is_engine_error());

    let after = session.snapshot().await;
    assert_eq!(before, after);

    let drained = events.drain();
    assert!(drained.iter().any(|event| matches!(
        event,
        CoreEvent::Playback(PlaybackEvent::Error { track_id: Some(id), .. }) if id == "b"
    )));
    assert!(drained
        .iter()
        .any(|event| matches!(event, CoreEvent::Notice(notice) if notice.is_error())));
}

#[tokio::test]
async fn test_engine_pause_failure_keeps_playing() {
    let mut engine = MockEngine::new();
    engine.expect_load().returning(|_| Ok(MediaInfo::default()));
    engine.expect_play().returning(|| Ok(()));
    engine
        .expect_pause()
        .returning(|| Err(BridgeError::NotAvailable("audio focus lost".into())));

    let (session, _) = session_with(Arc::new(engine), QueueBoundary::Stop);
    session.load_and_play(track("a", 200)).await.unwrap();

    assert!(session.pause().await.is_err());
    assert_eq!(session.snapshot().await.status, SessionStatus::Playing);
}

// ============================================================================
// Invariants
// ============================================================================

#[tokio::test]
async fn test_invariants_hold_across_operations() {
    let (session, _, _) = session();
    let tracks = vec![track("a", 30), track("b", 45), track("c", 20)];

    session.play_queue(tracks.clone(), 0).await.unwrap();
    assert_invariants(&session.snapshot().await);

    for secs in [5, 10, 31, 2] {
        session.report_progress(Duration::from_secs(secs)).await.unwrap();
        assert_invariants(&session.snapshot().await);
    }

    session.pause().await.unwrap();
    assert_invariants(&session.snapshot().await);
    session.next().await.unwrap();
    assert_invariants(&session.snapshot().await);
    session.seek(Duration::from_secs(100)).await.unwrap();
    assert_invariants(&session.snapshot().await);
    session.resume().await.unwrap();
    assert_invariants(&session.snapshot().await);
    session.report_finished().await.unwrap();
    assert_invariants(&session.snapshot().await);
    session.stop().await.unwrap();
    assert_invariants(&session.snapshot().await);
}
