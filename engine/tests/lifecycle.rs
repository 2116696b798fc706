//! Lifecycle tests for convoy-engine
//!
//! These drive a conversation through create, read, update and delete against
//! the in-memory platform, checking the remote traffic each step produces.

use convoy_engine::{
    info_cache_key, ApiError, CacheStore, ConversationSpec, DestroyAction, Error, ManualClock,
    MockApi, MockCall, Reconciler, RemoteCall,
};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

fn proj_x() -> ConversationSpec {
    ConversationSpec::new("proj-x", false).with_action_on_destroy(DestroyAction::Archive)
}

// ============================================================================
// End to end
// ============================================================================

#[tokio::test]
async fn create_read_update_archive() {
    let dir = TempDir::new().unwrap();
    let cache = CacheStore::new(dir.path());
    let api = MockApi::with_id_seed(123);
    let engine = Reconciler::new(&api, &cache);

    let outcome = engine.create(&proj_x()).await.unwrap();
    let mut state = outcome.state;
    assert_eq!(state.id, "C123");

    engine.read(&mut state).await.unwrap();
    assert!(!state.is_shared);
    assert!(!state.is_private);

    api.clear_calls();
    let renamed = ConversationSpec::new("proj-x-renamed", false)
        .with_action_on_destroy(DestroyAction::Archive);
    engine.update(&mut state, &renamed).await.unwrap();
    assert_eq!(
        api.calls(),
        vec![
            MockCall::Rename("C123".into(), "proj-x-renamed".into()),
            MockCall::Info("C123".into()),
        ]
    );
    assert_eq!(state.name, "proj-x-renamed");

    api.clear_calls();
    engine.delete(&state).await.unwrap();
    assert_eq!(api.calls(), vec![MockCall::Archive("C123".into())]);
    assert!(api.is_archived("C123"));
}

#[tokio::test]
async fn update_with_every_field_changed() {
    let dir = TempDir::new().unwrap();
    let cache = CacheStore::new(dir.path());
    let api = MockApi::new();
    let engine = Reconciler::new(&api, &cache);

    let mut state = engine.create(&proj_x()).await.unwrap().state;
    api.clear_calls();

    let desired = ConversationSpec::new("proj-y", false)
        .with_topic("Roadmap")
        .with_purpose("Planning")
        .with_action_on_destroy(DestroyAction::None);
    let diagnostics = engine.update(&mut state, &desired).await.unwrap();

    assert!(diagnostics.is_empty());
    let kinds: Vec<_> = api.calls().iter().map(MockCall::kind).collect();
    assert_eq!(
        kinds,
        vec![
            RemoteCall::Rename,
            RemoteCall::SetTopic,
            RemoteCall::SetPurpose,
            RemoteCall::Info
        ]
    );
    assert_eq!(state.name, "proj-y");
    assert_eq!(state.topic, "Roadmap");
    assert_eq!(state.purpose, "Planning");
    assert_eq!(state.action_on_destroy, DestroyAction::None);
}

#[tokio::test]
async fn unchanged_update_only_reads_back() {
    let dir = TempDir::new().unwrap();
    let cache = CacheStore::new(dir.path());
    let api = MockApi::new();
    let engine = Reconciler::new(&api, &cache);

    let mut state = engine.create(&proj_x()).await.unwrap().state;
    let before = state.clone();
    api.clear_calls();

    engine.update(&mut state, &proj_x()).await.unwrap();
    assert_eq!(api.calls(), vec![MockCall::Info(before.id.clone())]);
    assert_eq!(state, before);
}

#[tokio::test]
async fn rename_collision_surfaces_platform_error() {
    let dir = TempDir::new().unwrap();
    let cache = CacheStore::new(dir.path());
    let api = MockApi::new();
    let engine = Reconciler::new(&api, &cache);

    engine
        .create(&ConversationSpec::new("taken", false))
        .await
        .unwrap();
    let mut state = engine.create(&proj_x()).await.unwrap().state;
    let before = state.clone();

    let err = engine
        .update(&mut state, &ConversationSpec::new("taken", false))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        Error::Remote {
            call: RemoteCall::Rename,
            target: before.id.clone(),
            source: ApiError::Platform("name_taken".into()),
        }
    );
    assert_eq!(state, before);
}

// ============================================================================
// Cache window
// ============================================================================

#[tokio::test]
async fn read_goes_remote_once_window_passes() {
    let dir = TempDir::new().unwrap();
    let clock = Arc::new(ManualClock::starting_now());
    let cache = CacheStore::with_clock(dir.path(), clock.clone());
    let api = MockApi::new();
    let engine = Reconciler::new(&api, &cache);

    let mut state = engine.create(&proj_x()).await.unwrap().state;
    api.clear_calls();

    engine.read(&mut state).await.unwrap();
    assert!(api.calls().is_empty());

    clock.advance(Duration::from_secs(7));
    engine.read(&mut state).await.unwrap();
    assert_eq!(api.calls(), vec![MockCall::Info(state.id.clone())]);
}

#[tokio::test]
async fn read_picks_up_out_of_band_changes_after_window() {
    let dir = TempDir::new().unwrap();
    let clock = Arc::new(ManualClock::starting_now());
    let cache = CacheStore::with_clock(dir.path(), clock.clone());
    let api = MockApi::new();
    let engine = Reconciler::new(&api, &cache);

    let mut state = engine.create(&proj_x()).await.unwrap().state;

    // Someone edits the channel in the Slack UI.
    let mut edited = api.conversation(&state.id).unwrap();
    edited.name = "proj-x-old".into();
    edited.topic = "set by hand".into();
    api.insert(edited);

    engine.read(&mut state).await.unwrap();
    assert_eq!(state.name, "proj-x");

    clock.advance(Duration::from_secs(7));
    engine.read(&mut state).await.unwrap();
    assert_eq!(state.name, "proj-x-old");
    assert_eq!(state.topic, "set by hand");
    assert_eq!(state.action_on_destroy, DestroyAction::Archive);

    // The next update pushes the declared values back.
    let desired = proj_x().with_topic("release train");
    engine.update(&mut state, &desired).await.unwrap();
    assert_eq!(state.name, "proj-x");
    assert_eq!(state.topic, "release train");
}

#[tokio::test]
async fn cached_read_matches_remote_read() {
    let dir = TempDir::new().unwrap();
    let clock = Arc::new(ManualClock::starting_now());
    let cache = CacheStore::with_clock(dir.path(), clock.clone());
    let api = MockApi::new();
    let engine = Reconciler::new(&api, &cache);

    let mut cached = engine.create(&proj_x()).await.unwrap().state;
    let mut remote = cached.clone();

    engine.read(&mut cached).await.unwrap();
    clock.advance(Duration::from_secs(60));
    engine.read(&mut remote).await.unwrap();

    assert_eq!(cached, remote);
}

#[tokio::test]
async fn read_survives_garbage_in_cache() {
    let dir = TempDir::new().unwrap();
    let cache = CacheStore::new(dir.path());
    let api = MockApi::new();
    let engine = Reconciler::new(&api, &cache);

    let mut state = engine.create(&proj_x()).await.unwrap().state;
    std::fs::write(dir.path().join(info_cache_key(&state.id)), [0xff, 0xfe, 0x00]).unwrap();

    engine.read(&mut state).await.unwrap();
    assert_eq!(state.name, "proj-x");
}
