//! Integration tests for percentage splits driven through the session.

use mixdesk_core::{MixdeskError, OwnerId, PersonaId, ValidationError};
use mixdesk_session::{
    MixerAction, Persona, PersonaType, Session, SplitMember, SplitTable, StaticDirectory,
};
use proptest::prelude::*;

// ── Helpers ────────────────────────────────────────────────────

fn persona(id: &str, owner: &str, kind: &str) -> Persona {
    Persona {
        id: PersonaId::from(id),
        name: id.to_string(),
        avatar: None,
        persona_type: PersonaType::from(kind.to_string()),
        owner_id: OwnerId::from(owner),
    }
}

fn session_with(personas: Vec<Persona>, auto: bool) -> Session {
    let directory = StaticDirectory::new(personas);
    let mut session = Session::with_defaults();
    session.sync_split_members(&directory).unwrap();
    session.dispatch(MixerAction::SetAutoSplit { on: auto }).unwrap();
    session
}

fn pct(session: &Session, id: &str) -> f64 {
    session.state().splits.percentage(&PersonaId::from(id)).unwrap()
}

// ── Scenarios ──────────────────────────────────────────────────

#[test]
fn one_owner_two_personas_manual_edit() {
    let mut session = session_with(
        vec![persona("a", "o1", "producer"), persona("b", "o1", "mixer")],
        false,
    );
    assert_eq!(pct(&session, "a"), 50.0);
    session
        .dispatch(MixerAction::SetSplitPercentage {
            persona: PersonaId::from("a"),
            value: 70.0,
        })
        .unwrap();
    assert!((pct(&session, "b") - 30.0).abs() < 1e-9);
}

#[test]
fn auto_split_two_owners() {
    let session = session_with(
        vec![
            persona("a", "o1", "producer"),
            persona("b", "o1", "composer"),
            persona("c", "o2", "dj"),
        ],
        true,
    );
    assert_eq!(pct(&session, "a"), 25.0);
    assert_eq!(pct(&session, "b"), 25.0);
    assert_eq!(pct(&session, "c"), 50.0);
}

#[test]
fn manual_edit_rejected_while_auto() {
    let mut session = session_with(
        vec![persona("a", "o1", "producer"), persona("b", "o1", "mixer")],
        true,
    );
    let before = session.state().splits.clone();
    let err = session
        .dispatch(MixerAction::SetSplitPercentage {
            persona: PersonaId::from("a"),
            value: 70.0,
        })
        .unwrap_err();
    assert!(matches!(
        err,
        MixdeskError::Validation(ValidationError::AutoSplitActive)
    ));
    assert_eq!(session.state().splits, before);
    assert_eq!(session.drain_notices().len(), 1);
}

#[test]
fn reset_recomputes_without_flipping_flag() {
    let mut session = session_with(
        vec![persona("a", "o1", "producer"), persona("b", "o1", "mixer")],
        false,
    );
    session
        .dispatch(MixerAction::SetSplitPercentage {
            persona: PersonaId::from("a"),
            value: 90.0,
        })
        .unwrap();
    session.dispatch(MixerAction::ResetSplits).unwrap();
    assert_eq!(pct(&session, "a"), 50.0);
    assert!(!session.state().splits.auto_split());
}

#[test]
fn split_edits_are_undoable() {
    let mut session = session_with(
        vec![persona("a", "o1", "producer"), persona("b", "o1", "mixer")],
        false,
    );
    session
        .dispatch(MixerAction::SetSplitPercentage {
            persona: PersonaId::from("a"),
            value: 80.0,
        })
        .unwrap();
    assert!(session.undo());
    assert_eq!(pct(&session, "a"), 50.0);
}

// ── Properties ─────────────────────────────────────────────────

fn roster() -> impl Strategy<Value = Vec<SplitMember>> {
    prop::collection::vec(0u8..5, 2..12).prop_map(|owners| {
        owners
            .into_iter()
            .enumerate()
            .map(|(i, owner)| SplitMember {
                persona_id: PersonaId::from(format!("persona-{i}")),
                owner_id: OwnerId::from(format!("owner-{owner}")),
            })
            .collect()
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn sum_stays_at_100_through_edits(
        members in roster(),
        edits in prop::collection::vec((any::<prop::sample::Index>(), -10.0f64..110.0), 1..30),
    ) {
        let mut table = SplitTable::with_members(members.clone(), false);
        for (index, value) in edits {
            let persona = &index.get(&members).persona_id;
            let before = table.clone();
            if table.set_percentage(persona, value).is_err() {
                prop_assert_eq!(&table, &before);
            }
            prop_assert!((table.total() - 100.0).abs() <= 0.01);
        }
    }

    #[test]
    fn auto_split_is_idempotent(members in roster()) {
        let mut table = SplitTable::with_members(members, true);
        let first = table.clone();
        table.set_auto_split(true);
        prop_assert_eq!(table, first);
    }
}
