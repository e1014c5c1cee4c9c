//! Integration tests for the console session: registry, routing, groups
//! and snapshots driven through `Session::dispatch`.

use mixdesk_core::{ChannelId, ErrorCategory, GroupId, MixdeskError, ValidationError};
use mixdesk_session::{
    Applied, ChannelKind, ChannelPatch, MixerAction, SendPatch, Session,
};

// ── Helpers ────────────────────────────────────────────────────

fn add(session: &mut Session, kind: ChannelKind) -> ChannelId {
    match session.dispatch(MixerAction::AddChannel { kind }).unwrap() {
        Applied::Channel(id) => id,
        other => panic!("expected a channel, got {other:?}"),
    }
}

fn set_volume(session: &mut Session, id: ChannelId, volume: f64) {
    session
        .dispatch(MixerAction::UpdateChannel {
            id,
            patch: ChannelPatch::volume(volume),
        })
        .unwrap();
}

fn volume(session: &Session, id: ChannelId) -> f64 {
    session.state().channels.get(id).unwrap().volume
}

fn group(session: &mut Session, channels: Vec<ChannelId>) -> GroupId {
    match session
        .dispatch(MixerAction::CreateGroup {
            channels,
            name: "Group".into(),
        })
        .unwrap()
    {
        Applied::Group(id) => id,
        other => panic!("expected a group, got {other:?}"),
    }
}

fn first_bus(session: &Session) -> ChannelId {
    session.state().channels.of_kind(ChannelKind::Bus).next().unwrap().id
}

// ── Channel registry ───────────────────────────────────────────

#[test]
fn add_channel_numbers_per_kind() {
    let mut session = Session::with_defaults();
    let a = add(&mut session, ChannelKind::Audio);
    let fx = add(&mut session, ChannelKind::Fx);
    let channels = &session.state().channels;
    assert_eq!(channels.get(a).unwrap().number, 3);
    assert_eq!(channels.get(fx).unwrap().number, 1);
}

#[test]
fn delete_master_is_rejected_without_change() {
    let mut session = Session::with_defaults();
    let before = session.state().clone();
    let master = before.channels.master().unwrap().id;

    let err = session.dispatch(MixerAction::DeleteChannel { id: master }).unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Validation);
    assert_eq!(session.state(), &before);
    assert_eq!(session.state().channels.len(), 5);
}

#[test]
fn delete_bus_is_rejected_without_change() {
    let mut session = Session::with_defaults();
    let before = session.state().clone();
    let bus = first_bus(&session);
    assert!(session.dispatch(MixerAction::DeleteChannel { id: bus }).is_err());
    assert_eq!(session.state(), &before);
}

#[test]
fn duplicate_copies_fields_under_new_id() {
    let mut session = Session::with_defaults();
    let fx = add(&mut session, ChannelKind::Fx);
    set_volume(&mut session, fx, 33.0);
    let copy = match session.dispatch(MixerAction::DuplicateChannel { id: fx }).unwrap() {
        Applied::Channel(id) => id,
        other => panic!("{other:?}"),
    };
    let copy = session.state().channels.get(copy).unwrap();
    assert_ne!(copy.id, fx);
    assert_eq!(copy.name, "FX 1 (Copy)");
    assert_eq!(copy.volume, 33.0);

    let master = session.state().channels.master().unwrap().id;
    assert!(session.dispatch(MixerAction::DuplicateChannel { id: master }).is_err());
}

#[test]
fn delete_cascades_to_sends_groups_and_selection() {
    let mut session = Session::with_defaults();
    let fx = add(&mut session, ChannelKind::Fx);
    let a = add(&mut session, ChannelKind::Audio);
    let b = add(&mut session, ChannelKind::Audio);
    session.dispatch(MixerAction::AddSend { channel: a, target: fx }).unwrap();
    let gid = group(&mut session, vec![b, fx]);
    session.dispatch(MixerAction::Select { channels: vec![fx] }).unwrap();

    session.dispatch(MixerAction::DeleteChannel { id: fx }).unwrap();
    let state = session.state();
    assert!(state.channels.get(a).unwrap().sends().is_empty());
    assert_eq!(state.groups.get(gid).unwrap().channel_ids, vec![b]);
    assert!(state.selected.is_empty());
}

#[test]
fn reorder_outside_partition_is_silent() {
    let mut session = Session::with_defaults();
    let audio = add(&mut session, ChannelKind::Audio);
    let before = session.state().clone();
    assert!(session
        .dispatch(MixerAction::ReorderChannel { id: audio, index: 1 })
        .is_err());
    assert_eq!(session.state(), &before);
    assert!(session.drain_notices().is_empty());
}

#[test]
fn reorder_within_partition() {
    let mut session = Session::with_defaults();
    let last = add(&mut session, ChannelKind::Audio);
    session
        .dispatch(MixerAction::ReorderChannel { id: last, index: 3 })
        .unwrap();
    assert_eq!(session.state().channels.index_of(last), Some(3));
}

// ── Sends ──────────────────────────────────────────────────────

#[test]
fn duplicate_send_is_rejected() {
    let mut session = Session::with_defaults();
    let c1 = add(&mut session, ChannelKind::Audio);
    let bus = first_bus(&session);

    session.dispatch(MixerAction::AddSend { channel: c1, target: bus }).unwrap();
    let err = session
        .dispatch(MixerAction::AddSend { channel: c1, target: bus })
        .unwrap_err();
    assert!(matches!(
        err,
        MixdeskError::Validation(ValidationError::DuplicateSend { .. })
    ));
    assert_eq!(session.state().channels.get(c1).unwrap().sends().len(), 1);
    assert_eq!(session.drain_notices().len(), 1);
}

#[test]
fn send_defaults_and_updates() {
    let mut session = Session::with_defaults();
    let c1 = add(&mut session, ChannelKind::Audio);
    let bus = first_bus(&session);
    session.dispatch(MixerAction::AddSend { channel: c1, target: bus }).unwrap();

    let send = &session.state().channels.get(c1).unwrap().sends()[0];
    assert_eq!(send.level, 0.0);
    assert!(!send.pre_fader);
    assert_eq!(send.target, "Bus 1");

    session
        .dispatch(MixerAction::UpdateSend {
            channel: c1,
            index: 0,
            patch: SendPatch {
                level: Some(140.0),
                pre_fader: Some(true),
            },
        })
        .unwrap();
    let send = &session.state().channels.get(c1).unwrap().sends()[0];
    assert_eq!(send.level, 100.0);
    assert!(send.pre_fader);

    // Out-of-range index is a no-op.
    let before = session.state().clone();
    session
        .dispatch(MixerAction::RemoveSend { channel: c1, index: 7 })
        .unwrap();
    assert_eq!(session.state(), &before);
}

#[test]
fn sends_only_to_bus_fx_or_master() {
    let mut session = Session::with_defaults();
    let a = add(&mut session, ChannelKind::Audio);
    let b = add(&mut session, ChannelKind::Audio);
    let master = session.state().channels.master().unwrap().id;
    assert!(session.dispatch(MixerAction::AddSend { channel: a, target: b }).is_err());
    assert!(session
        .dispatch(MixerAction::AddSend { channel: master, target: a })
        .is_err());
    assert!(session
        .dispatch(MixerAction::AddSend { channel: a, target: master })
        .is_ok());
}

#[test]
fn routing_cycle_is_rejected() {
    let mut session = Session::with_defaults();
    let fx1 = add(&mut session, ChannelKind::Fx);
    let fx2 = add(&mut session, ChannelKind::Fx);
    session.dispatch(MixerAction::AddSend { channel: fx1, target: fx2 }).unwrap();
    let err = session
        .dispatch(MixerAction::AddSend { channel: fx2, target: fx1 })
        .unwrap_err();
    assert!(matches!(
        err,
        MixdeskError::Validation(ValidationError::RoutingCycle { .. })
    ));
}

#[test]
fn rename_refreshes_send_labels() {
    let mut session = Session::with_defaults();
    let a = add(&mut session, ChannelKind::Audio);
    let bus = first_bus(&session);
    session.dispatch(MixerAction::AddSend { channel: a, target: bus }).unwrap();
    session
        .dispatch(MixerAction::RenameChannel {
            id: bus,
            name: "Drum Bus".into(),
        })
        .unwrap();
    assert_eq!(session.state().channels.get(a).unwrap().sends()[0].target, "Drum Bus");
}

// ── Groups ─────────────────────────────────────────────────────

#[test]
fn group_volume_scales_members() {
    let mut session = Session::with_defaults();
    let c1 = add(&mut session, ChannelKind::Audio);
    let c2 = add(&mut session, ChannelKind::Audio);
    set_volume(&mut session, c1, 80.0);
    set_volume(&mut session, c2, 60.0);
    let gid = group(&mut session, vec![c1, c2]);

    session
        .dispatch(MixerAction::SetGroupVolume { group: gid, slider: 50.0 })
        .unwrap();
    assert_eq!(volume(&session, c1), 40.0);
    assert_eq!(volume(&session, c2), 30.0);

    // The scale compounds.
    session
        .dispatch(MixerAction::SetGroupVolume { group: gid, slider: 50.0 })
        .unwrap();
    assert_eq!(volume(&session, c1), 20.0);
}

#[test]
fn group_needs_two_channels() {
    let mut session = Session::with_defaults();
    let c1 = add(&mut session, ChannelKind::Audio);
    let before = session.state().clone();
    let err = session
        .dispatch(MixerAction::CreateGroup {
            channels: vec![c1, c1],
            name: "Solo".into(),
        })
        .unwrap_err();
    assert!(matches!(
        err,
        MixdeskError::Validation(ValidationError::GroupTooSmall { count: 1 })
    ));
    assert_eq!(session.state(), &before);
}

#[test]
fn group_mute_twice_restores_uniform_state() {
    let mut session = Session::with_defaults();
    let c1 = add(&mut session, ChannelKind::Audio);
    let c2 = add(&mut session, ChannelKind::Audio);
    let gid = group(&mut session, vec![c1, c2]);
    let muted = |s: &Session, id| s.state().channels.get(id).unwrap().muted;

    session.dispatch(MixerAction::ToggleGroupMute { group: gid }).unwrap();
    assert!(muted(&session, c1) && muted(&session, c2));
    session.dispatch(MixerAction::ToggleGroupMute { group: gid }).unwrap();
    assert!(!muted(&session, c1) && !muted(&session, c2));
}

#[test]
fn group_mute_mixed_state_goes_uniform() {
    let mut session = Session::with_defaults();
    let c1 = add(&mut session, ChannelKind::Audio);
    let c2 = add(&mut session, ChannelKind::Audio);
    session
        .dispatch(MixerAction::UpdateChannel {
            id: c1,
            patch: ChannelPatch::muted(true),
        })
        .unwrap();
    let gid = group(&mut session, vec![c1, c2]);

    let applied = session.dispatch(MixerAction::ToggleGroupMute { group: gid }).unwrap();
    assert_eq!(applied, Applied::Flag(true));
    session.dispatch(MixerAction::ToggleGroupMute { group: gid }).unwrap();
    // Mixed start: two toggles do not restore the original mix.
    assert!(!session.state().channels.get(c1).unwrap().muted);
}

#[test]
fn group_solo_and_rollup() {
    let mut session = Session::with_defaults();
    let c1 = add(&mut session, ChannelKind::Audio);
    let c2 = add(&mut session, ChannelKind::Audio);
    set_volume(&mut session, c1, 80.0);
    set_volume(&mut session, c2, 60.0);
    let gid = group(&mut session, vec![c1, c2]);
    session.dispatch(MixerAction::ToggleGroupSolo { group: gid }).unwrap();

    let rollups = session.state().group_rollups();
    let (id, rollup) = &rollups[0];
    assert_eq!(*id, gid);
    assert_eq!(rollup.member_count, 2);
    assert_eq!(rollup.mean_volume, 70.0);
    assert!(rollup.any_solo);
    assert!(!rollup.all_muted);
    assert_eq!(session.state().audible_channels(), vec![c1, c2]);
}

// ── Snapshots ──────────────────────────────────────────────────

#[test]
fn snapshot_recall_restores_captured_volume() {
    let mut session = Session::with_defaults();
    let c1 = add(&mut session, ChannelKind::Audio);
    let c2 = add(&mut session, ChannelKind::Audio);
    set_volume(&mut session, c1, 80.0);
    session.capture_snapshot("A");
    set_volume(&mut session, c1, 20.0);
    let c2_before = session.state().channels.get(c2).unwrap().clone();

    session.recall_snapshot_named("A").unwrap();
    assert_eq!(volume(&session, c1), 80.0);
    assert_eq!(session.state().channels.get(c2).unwrap(), &c2_before);
}

#[test]
fn snapshot_roundtrip_is_identity() {
    let mut session = Session::with_defaults();
    let a = add(&mut session, ChannelKind::Audio);
    let fx = add(&mut session, ChannelKind::Fx);
    session.dispatch(MixerAction::AddSend { channel: a, target: fx }).unwrap();
    let before = session.state().channels.clone();
    let id = session.capture_snapshot("A");
    session.recall_snapshot(id).unwrap();
    assert_eq!(session.state().channels, before);
}

#[test]
fn recall_leaves_unprojected_fields() {
    let mut session = Session::with_defaults();
    let a = add(&mut session, ChannelKind::Audio);
    let id = session.capture_snapshot("A");
    session
        .dispatch(MixerAction::RenameChannel {
            id: a,
            name: "Lead Vox".into(),
        })
        .unwrap();
    session.recall_snapshot(id).unwrap();
    assert_eq!(session.state().channels.get(a).unwrap().name, "Lead Vox");
}

// ── Undo ───────────────────────────────────────────────────────

#[test]
fn undo_walks_back_through_actions() {
    let mut session = Session::with_defaults();
    let initial = session.state().clone();
    let c1 = add(&mut session, ChannelKind::Audio);
    set_volume(&mut session, c1, 10.0);

    assert!(session.undo());
    assert_eq!(volume(&session, c1), 75.0);
    assert!(session.undo());
    assert_eq!(session.state(), &initial);
    assert!(session.redo());
    assert!(session.state().channels.contains(c1));
}
