//! Integration tests for stores, session loading and the persister.

use mixdesk_core::{Color, ErrorCategory, MixdeskConfig, ProjectId};
use mixdesk_session::{ChannelKind, ChannelPatch, MixerAction, StaticDirectory};
use mixdesk_store::{
    load_session, open_session, JsonFileStore, MemoryStore, PersistEvent, Persister,
    ProjectStore,
};
use std::sync::Arc;
use tempfile::TempDir;

fn config_for(dir: &TempDir) -> MixdeskConfig {
    MixdeskConfig {
        store_dir: dir.path().to_path_buf(),
        ..Default::default()
    }
}

#[tokio::test]
async fn session_survives_save_and_reload() {
    let dir = TempDir::new().unwrap();
    let config = config_for(&dir);
    let store = Arc::new(JsonFileStore::new(&config.store_dir));
    let project = ProjectId::from("album");
    let directory = StaticDirectory::default();

    let mut session = load_session(store.as_ref(), &project, &directory, &config);
    let fx = match session.dispatch(MixerAction::AddChannel { kind: ChannelKind::Fx }).unwrap() {
        mixdesk_session::Applied::Channel(id) => id,
        other => panic!("{other:?}"),
    };
    let audio = session.state().channels.of_kind(ChannelKind::Audio).next().unwrap().id;
    session.dispatch(MixerAction::AddSend { channel: audio, target: fx }).unwrap();
    session
        .dispatch(MixerAction::CreateGroup {
            channels: vec![audio, fx],
            name: "Verb".into(),
        })
        .unwrap();
    session.capture_snapshot("Mix 1");

    let (persister, mut events) = Persister::spawn(store.clone(), project.clone());
    persister.save_session(&session);
    persister.shutdown().await.unwrap();
    assert!(matches!(events.recv().await, Some(PersistEvent::Saved { .. })));

    let reloaded = load_session(store.as_ref(), &project, &directory, &config);
    assert_eq!(reloaded.state().channels, session.state().channels);
    assert_eq!(reloaded.state().groups, session.state().groups);
    assert_eq!(reloaded.snapshots(), session.snapshots());
}

#[tokio::test]
async fn save_failure_keeps_state_and_reports() {
    let store = Arc::new(MemoryStore::new());
    store.set_fail_saves(true);
    let project = ProjectId::from("p");
    let mut session = load_session(
        store.as_ref(),
        &project,
        &StaticDirectory::default(),
        &MixdeskConfig::default(),
    );
    let audio = session.state().channels.of_kind(ChannelKind::Audio).next().unwrap().id;
    session
        .dispatch(MixerAction::UpdateChannel {
            id: audio,
            patch: ChannelPatch::volume(10.0),
        })
        .unwrap();
    let state = session.shared();

    let (persister, mut events) = Persister::spawn(store.clone(), project);
    persister.save_session(&session);
    persister.shutdown().await.unwrap();
    match events.recv().await {
        Some(PersistEvent::Failed { error, .. }) => session.report(&error),
        other => panic!("unexpected {other:?}"),
    }

    assert!(Arc::ptr_eq(&state, &session.shared()));
    assert_eq!(session.state().channels.get(audio).unwrap().volume, 10.0);
    let notices = session.drain_notices();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].category, ErrorCategory::Persistence);
}

#[test]
fn legacy_bare_state_file_loads() {
    let dir = TempDir::new().unwrap();
    let store = JsonFileStore::new(dir.path());
    let project = ProjectId::from("legacy");
    let channels = mixdesk_session::ChannelRegistry::with_defaults().into_channels();
    let project_dir = store.project_dir(&project);
    std::fs::create_dir_all(&project_dir).unwrap();
    std::fs::write(
        project_dir.join("mixer.json"),
        serde_json::to_vec(&serde_json::json!({ "channels": channels })).unwrap(),
    )
    .unwrap();

    let doc = store.load_mixer_state(&project).unwrap().unwrap();
    assert_eq!(doc.channels, channels);
    assert!(doc.groups.is_empty());
}

#[test]
fn corrupt_file_falls_back_to_defaults() {
    let dir = TempDir::new().unwrap();
    let config = config_for(&dir);
    let store = JsonFileStore::new(dir.path());
    let project = ProjectId::from("corrupt");
    let project_dir = store.project_dir(&project);
    std::fs::create_dir_all(&project_dir).unwrap();
    std::fs::write(project_dir.join("mixer.json"), b"\x00\x01garbage").unwrap();

    let mut session = load_session(&store, &project, &StaticDirectory::default(), &config);
    assert_eq!(session.state().channels.len(), 5);
    assert_eq!(session.state().channels.count_of(ChannelKind::Master), 1);
    let notices = session.drain_notices();
    assert_eq!(notices[0].category, ErrorCategory::Deserialization);
}

#[test]
fn odd_stored_colors_do_not_discard_the_mix() {
    let dir = TempDir::new().unwrap();
    let config = config_for(&dir);
    let store = JsonFileStore::new(dir.path());
    let project = ProjectId::from("colors");
    let channels = mixdesk_session::ChannelRegistry::with_defaults().into_channels();
    let mut value = serde_json::to_value(&channels).unwrap();
    value[0]["color"] = serde_json::json!("#FFF");
    value[1]["color"] = serde_json::json!("cornflower");
    let project_dir = store.project_dir(&project);
    std::fs::create_dir_all(&project_dir).unwrap();
    std::fs::write(
        project_dir.join("mixer.json"),
        serde_json::to_vec(&serde_json::json!({ "channels": value })).unwrap(),
    )
    .unwrap();

    let opened = open_session(&store, &project, &StaticDirectory::default(), &config);
    assert!(!opened.recovered);
    let state = opened.session.state();
    assert_eq!(state.channels.as_slice()[0].id, channels[0].id);
    assert_eq!(state.channels.as_slice()[0].color, Color::rgb(255, 255, 255));
    assert_eq!(state.channels.as_slice()[1].color, Color::FALLBACK);
}
