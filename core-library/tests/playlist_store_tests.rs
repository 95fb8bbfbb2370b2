//! Playlist store behaviour
//!
//! This test suite verifies:
//! - Name and description normalization
//! - Ordering and id uniqueness
//! - Song entries and their defaults
//! - Events and notices for successes and failures

use bridge_traits::time::ManualClock;
use core_library::{
    LibraryError, PlaylistStore, PlaylistUpdate, SongInput, UNKNOWN_ARTIST, UNKNOWN_TITLE,
};
use core_runtime::events::{CoreEvent, EventBus, EventStream, LibraryEvent, NoticeKind};
use std::collections::HashSet;
use std::sync::Arc;

fn store() -> (PlaylistStore, Arc<ManualClock>, EventStream) {
    let clock = Arc::new(ManualClock::default());
    let events = EventBus::new(256);
    let stream = EventStream::new(events.subscribe());
    (PlaylistStore::new(clock.clone(), events, "user-1"), clock, stream)
}

fn notice_kinds(stream: &mut EventStream) -> Vec<NoticeKind> {
    stream
        .drain()
        .into_iter()
        .filter_map(|event| match event {
            CoreEvent::Notice(notice) => Some(notice.kind),
            _ => None,
        })
        .collect()
}

// ============================================================================
// create / delete
// ============================================================================

#[tokio::test]
async fn test_create_trims_and_lists_first() {
    let (store, clock, mut events) = store();

    let first = store.create("  Morning  ", Some("  wake up  ")).await.unwrap();
    clock.advance(chrono::Duration::seconds(1));
    let second = store.create("Evening", Some("   ")).await.unwrap();

    assert_eq!(first.name, "Morning");
    assert_eq!(first.description.as_deref(), Some("wake up"));
    assert_eq!(first.owner_id, "user-1");
    assert!(first.songs.is_empty());
    assert_eq!(second.description, None);

    let names: Vec<String> = store.list().await.into_iter().map(|p| p.name).collect();
    assert_eq!(names, vec!["Evening", "Morning"]);

    let drained = events.drain();
    assert!(drained.iter().any(|event| matches!(
        event,
        CoreEvent::Library(LibraryEvent::PlaylistCreated { name, .. }) if name == "Morning"
    )));
}

#[tokio::test]
async fn test_create_rejects_blank_name() {
    let (store, _, mut events) = store();

    let err = store.create("   ", None).await.unwrap_err();

    assert!(matches!(err, LibraryError::InvalidInput { ref field, .. } if field == "name"));
    assert_eq!(store.count().await, 0);
    assert_eq!(notice_kinds(&mut events), vec![NoticeKind::Error]);
}

#[tokio::test]
async fn test_ids_stay_unique_across_create_and_delete() {
    let (store, _, _) = store();
    let mut seen = HashSet::new();

    for round in 0..20 {
        let playlist = store.create(&format!("List {round}"), None).await.unwrap();
        assert!(seen.insert(playlist.id.clone()), "duplicate id {}", playlist.id);
        if round % 3 == 0 {
            store.delete(&playlist.id).await.unwrap();
        }
    }

    let live: HashSet<String> = store.list().await.into_iter().map(|p| p.id).collect();
    assert_eq!(live.len(), store.count().await);
}

#[tokio::test]
async fn test_delete_unknown_id_reports_not_found() {
    let (store, _, mut events) = store();
    store.create("Keep me", None).await.unwrap();
    events.drain();

    let err = store.delete("missing").await.unwrap_err();

    assert!(matches!(err, LibraryError::NotFound { ref id, .. } if id == "missing"));
    assert_eq!(store.count().await, 1);
    assert_eq!(notice_kinds(&mut events), vec![NoticeKind::Error]);
}

#[tokio::test]
async fn test_delete_removes_playlist() {
    let (store, _, _) = store();
    let playlist = store.create("Temp", None).await.unwrap();

    store.delete(&playlist.id).await.unwrap();

    assert!(store.get_by_id(&playlist.id).await.is_none());
    assert!(store.list().await.is_empty());
}

// ============================================================================
// songs
// ============================================================================

#[tokio::test]
async fn test_add_song_applies_defaults() {
    let (store, _, _) = store();
    let playlist = store.create("Downloads", None).await.unwrap();

    let song = store
        .add_song(&playlist.id, SongInput::from_locator("/storage/music/Track 01.webm"))
        .await
        .unwrap();

    assert_eq!(song.title, "Track 01");
    assert_eq!(song.artist, UNKNOWN_ARTIST);
    assert_eq!(song.file_name, "Track 01.webm");
    assert_eq!(song.file_locator, "/storage/music/Track 01.webm");

    let blank = store.add_song(&playlist.id, SongInput::default()).await.unwrap();
    assert_eq!(blank.title, UNKNOWN_TITLE);
}

#[tokio::test]
async fn test_add_song_allows_duplicates_with_distinct_ids() {
    let (store, _, _) = store();
    let playlist = store.create("Repeat", None).await.unwrap();
    let input = SongInput::from_locator("https://cdn.example.com/a.mp3").with_title("A");

    let first = store.add_song(&playlist.id, input.clone()).await.unwrap();
    let second = store.add_song(&playlist.id, input).await.unwrap();

    assert_ne!(first.id, second.id);
    let stored = store.get_by_id(&playlist.id).await.unwrap();
    assert_eq!(stored.song_count(), 2);
}

#[tokio::test]
async fn test_add_then_remove_restores_songs() {
    let (store, clock, _) = store();
    let playlist = store.create("Mix", None).await.unwrap();
    store
        .add_song(&playlist.id, SongInput::from_locator("/music/one.mp3"))
        .await
        .unwrap();
    let before = store.get_by_id(&playlist.id).await.unwrap();

    clock.advance(chrono::Duration::minutes(5));
    let added = store
        .add_song(&playlist.id, SongInput::from_locator("/music/two.mp3"))
        .await
        .unwrap();
    let removed = store.remove_song(&playlist.id, &added.id).await.unwrap();

    let after = store.get_by_id(&playlist.id).await.unwrap();
    assert_eq!(removed, 1);
    assert_eq!(after.songs, before.songs);
    assert!(after.updated_at > before.updated_at);
}

#[tokio::test]
async fn test_remove_unknown_song_is_a_no_op() {
    let (store, clock, _) = store();
    let playlist = store.create("Mix", None).await.unwrap();
    clock.advance(chrono::Duration::minutes(1));

    let removed = store.remove_song(&playlist.id, "nope").await.unwrap();

    assert_eq!(removed, 0);
    let stored = store.get_by_id(&playlist.id).await.unwrap();
    assert_eq!(stored.updated_at, playlist.updated_at);
}

#[tokio::test]
async fn test_song_ops_on_missing_playlist() {
    let (store, _, _) = store();

    let err = store
        .add_song("missing", SongInput::default())
        .await
        .unwrap_err();
    assert!(matches!(err, LibraryError::NotFound { .. }));

    let err = store.remove_song("missing", "song").await.unwrap_err();
    assert!(matches!(err, LibraryError::NotFound { .. }));
}

// ============================================================================
// update
// ============================================================================

#[tokio::test]
async fn test_update_is_partial() {
    let (store, clock, _) = store();
    let playlist = store.create("Old", Some("desc")).await.unwrap();
    clock.advance(chrono::Duration::seconds(10));

    let renamed = store
        .update(&playlist.id, PlaylistUpdate::rename("  New  "))
        .await
        .unwrap();
    assert_eq!(renamed.name, "New");
    assert_eq!(renamed.description.as_deref(), Some("desc"));
    assert!(renamed.updated_at > playlist.updated_at);

    let cleared = store
        .update(&playlist.id, PlaylistUpdate::describe(""))
        .await
        .unwrap();
    assert_eq!(cleared.name, "New");
    assert_eq!(cleared.description, None);
}

#[tokio::test]
async fn test_update_rejects_blank_name() {
    let (store, _, mut events) = store();
    let playlist = store.create("Name", None).await.unwrap();
    events.drain();

    let err = store
        .update(&playlist.id, PlaylistUpdate::rename("   "))
        .await
        .unwrap_err();

    assert!(matches!(err, LibraryError::InvalidInput { .. }));
    assert_eq!(store.get_by_id(&playlist.id).await.unwrap().name, "Name");
    assert_eq!(notice_kinds(&mut events), vec![NoticeKind::Error]);
}

#[tokio::test]
async fn test_update_missing_playlist() {
    let (store, _, _) = store();
    let err = store
        .update("missing", PlaylistUpdate::rename("x"))
        .await
        .unwrap_err();
    assert!(matches!(err, LibraryError::NotFound { .. }));
}
