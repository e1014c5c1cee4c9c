//! Opening a session from the store.

use mixdesk_core::{ErrorCategory, MixdeskConfig, Notice, ProjectId};
use mixdesk_session::{
    MixerState, PersonaDirectory, Session, SnapshotBook, SplitMember, SplitTable,
};
use tracing::{debug, info, warn};

use crate::ProjectStore;

/// A freshly opened session and whether any stored part had to be replaced.
pub struct OpenedSession {
    pub session: Session,
    /// True when some stored data could not be read and a fallback was used.
    /// Saving such a session would overwrite data that may still be
    /// recoverable.
    pub recovered: bool,
}

/// Load a project into a new session. Never fails.
///
/// A project that was never saved starts from the built-in console. A load
/// failure or malformed data also falls back to the built-in console (or an
/// empty snapshot list, or ownership-based splits), logs a warning and
/// queues a notice on the returned session.
pub fn load_session(
    store: &dyn ProjectStore,
    project: &ProjectId,
    directory: &dyn PersonaDirectory,
    config: &MixdeskConfig,
) -> Session {
    open_session(store, project, directory, config).session
}

/// Like [`load_session`], but also reports whether anything fell back.
pub fn open_session(
    store: &dyn ProjectStore,
    project: &ProjectId,
    directory: &dyn PersonaDirectory,
    config: &MixdeskConfig,
) -> OpenedSession {
    let mut notices = Vec::new();
    let mut recovered = false;

    let mut state = match store.load_mixer_state(project) {
        Ok(Some(document)) => {
            debug!(project = %project, channels = document.channels.len(), "Mixer state loaded");
            MixerState::from_document(document)
        }
        Ok(None) => {
            info!(project = %project, "No saved mixer state, starting from defaults");
            MixerState::default()
        }
        Err(err) => {
            warn!(project = %project, error = %err, "Mixer state unavailable, using defaults");
            notices.push(Notice::from_error(&err));
            recovered = true;
            MixerState::default()
        }
    };

    let members: Vec<SplitMember> =
        directory.personas().iter().map(|p| p.split_member()).collect();
    let mut splits = SplitTable::with_members(members, true);
    match store.load_splits(project) {
        Ok(Some(record)) => {
            if !splits.apply_record(&record) {
                warn!(project = %project, "Stored splits did not add up, redistributed");
                notices.push(Notice::info(
                    ErrorCategory::Deserialization,
                    "Saved percentage splits were inconsistent and have been reset",
                ));
            }
        }
        Ok(None) => {}
        Err(err) => {
            warn!(project = %project, error = %err, "Splits unavailable, using auto-split");
            notices.push(Notice::from_error(&err));
            recovered = true;
        }
    }
    state.splits = splits;

    let snapshots = match store.load_snapshots(project) {
        Ok(book) => book,
        Err(err) => {
            warn!(project = %project, error = %err, "Snapshots unavailable");
            notices.push(Notice::from_error(&err));
            recovered = true;
            SnapshotBook::new()
        }
    };

    let mut session = Session::new(state, snapshots, config);
    for notice in notices {
        session.notify(notice);
    }
    OpenedSession { session, recovered }
}
