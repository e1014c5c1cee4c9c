//! The live editing session: one writer, many readers.
//!
//! Every change goes through [`Session::dispatch`], which applies the action
//! to a copy of the current state and swaps the copy in only when the action
//! succeeds. Each accepted state is published on a watch channel; meters and
//! the persister only ever see complete states.

use mixdesk_core::{
    ChannelId, ErrorCategory, MixdeskConfig, MixdeskError, Notice, NoticeQueue, PersonaId, Result,
    SnapshotId, ValidationError,
};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::history::UndoStack;
use crate::persona::PersonaDirectory;
use crate::serialization::MixerDocument;
use crate::snapshot::{RecallReport, Snapshot, SnapshotBook};
use crate::split::SplitRecord;
use crate::state::{Applied, MixerAction, MixerState};

pub struct Session {
    state: Arc<MixerState>,
    history: UndoStack<Arc<MixerState>>,
    snapshots: SnapshotBook,
    notices: NoticeQueue,
    publisher: watch::Sender<Arc<MixerState>>,
    /// Bumped whenever persisted content changes.
    revision: u64,
}

impl Session {
    pub fn new(state: MixerState, snapshots: SnapshotBook, config: &MixdeskConfig) -> Self {
        let state = Arc::new(state);
        let (publisher, _) = watch::channel(Arc::clone(&state));
        Self {
            state,
            history: UndoStack::new(config.undo_depth),
            snapshots,
            notices: NoticeQueue::new(config.notice_capacity),
            publisher,
            revision: 0,
        }
    }

    /// A session over the built-in starter console.
    pub fn with_defaults() -> Self {
        Self::new(MixerState::default(), SnapshotBook::new(), &MixdeskConfig::default())
    }

    pub fn state(&self) -> &MixerState {
        &self.state
    }

    /// Shared handle to the current state.
    pub fn shared(&self) -> Arc<MixerState> {
        Arc::clone(&self.state)
    }

    /// Receiver that always holds the latest accepted state.
    pub fn subscribe(&self) -> watch::Receiver<Arc<MixerState>> {
        self.publisher.subscribe()
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Apply an action atomically.
    ///
    /// On rejection nothing changes, the error is logged and (unless the
    /// rejection is a silent one, like an invalid drag) a notice is queued.
    pub fn dispatch(&mut self, action: MixerAction) -> Result<Applied> {
        let name = action.name();
        let persistent = action.is_persistent();
        let mut next = MixerState::clone(&self.state);
        match next.apply(action) {
            Ok(applied) => {
                if next != *self.state {
                    let previous = std::mem::replace(&mut self.state, Arc::new(next));
                    self.history.push(previous);
                    if persistent {
                        self.revision += 1;
                    }
                    self.publish();
                }
                Ok(applied)
            }
            Err(err) => {
                self.reject(name, &err);
                Err(err)
            }
        }
    }

    fn reject(&mut self, action: &str, err: &MixdeskError) {
        if err.as_validation().is_some_and(ValidationError::is_silent) {
            debug!(action, error = %err, "Action rejected silently");
            return;
        }
        warn!(action, error = %err, "Action rejected");
        self.notices.push(Notice::from_error(err));
    }

    fn publish(&self) {
        self.publisher.send_replace(Arc::clone(&self.state));
    }

    /// Step back to the previous state. Returns false when there is none.
    pub fn undo(&mut self) -> bool {
        let current = Arc::clone(&self.state);
        let Some(previous) = self.history.undo(current) else {
            return false;
        };
        self.switch_to(previous);
        debug!(remaining = self.history.undo_count(), "Undo");
        true
    }

    pub fn redo(&mut self) -> bool {
        let current = Arc::clone(&self.state);
        let Some(next) = self.history.redo(current) else {
            return false;
        };
        self.switch_to(next);
        debug!(remaining = self.history.redo_count(), "Redo");
        true
    }

    /// Swap in a state from history. Only steps that touched persisted
    /// content move the revision.
    fn switch_to(&mut self, state: Arc<MixerState>) {
        if !state.same_persisted(&self.state) {
            self.revision += 1;
        }
        self.state = state;
        self.publish();
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    // ── Snapshots ──────────────────────────────────────────────

    pub fn snapshots(&self) -> &SnapshotBook {
        &self.snapshots
    }

    /// Capture the live console under `name`. Not undoable.
    pub fn capture_snapshot(&mut self, name: impl Into<String>) -> SnapshotId {
        let snapshot = Snapshot::capture(name, &self.state.channels);
        let id = snapshot.id;
        info!(snapshot = %id, name = %snapshot.name, "Snapshot captured");
        self.snapshots.push(snapshot);
        self.revision += 1;
        id
    }

    /// Merge a stored snapshot onto the live console. The recall itself is
    /// an ordinary undoable action.
    pub fn recall_snapshot(&mut self, id: SnapshotId) -> Result<RecallReport> {
        let snapshot = match self.snapshots.require(id) {
            Ok(snapshot) => snapshot.clone(),
            Err(err) => {
                self.reject("recall_snapshot", &err);
                return Err(err);
            }
        };
        let applied = self.dispatch(MixerAction::RecallSnapshot {
            snapshot: Box::new(snapshot),
        })?;
        let report = match applied {
            Applied::Recalled(report) => report,
            _ => RecallReport::default(),
        };
        if report.is_partial() {
            self.notices.push(Notice::info(
                ErrorCategory::Validation,
                format!(
                    "{} channel(s) in the snapshot no longer exist and were skipped",
                    report.missing.len()
                ),
            ));
        }
        Ok(report)
    }

    /// Recall the most recent snapshot called `name`.
    pub fn recall_snapshot_named(&mut self, name: &str) -> Result<RecallReport> {
        match self.snapshots.find_by_name(name).map(|s| s.id) {
            Some(id) => self.recall_snapshot(id),
            None => {
                let err: MixdeskError = ValidationError::UnknownSnapshot(name.to_string()).into();
                self.reject("recall_snapshot", &err);
                Err(err)
            }
        }
    }

    /// Remove a stored snapshot. Live channels are unaffected.
    pub fn delete_snapshot(&mut self, id: SnapshotId) -> Result<Snapshot> {
        match self.snapshots.delete(id) {
            Ok(snapshot) => {
                info!(snapshot = %id, "Snapshot deleted");
                self.revision += 1;
                Ok(snapshot)
            }
            Err(err) => {
                self.reject("delete_snapshot", &err);
                Err(err)
            }
        }
    }

    // ── Personas ───────────────────────────────────────────────

    /// Assign a persona from `directory` to a channel.
    pub fn assign_persona(
        &mut self,
        directory: &dyn PersonaDirectory,
        channel: ChannelId,
        persona: &PersonaId,
    ) -> Result<Applied> {
        let Some(found) = directory.find(persona) else {
            let err: MixdeskError = ValidationError::UnknownPersona(persona.clone()).into();
            self.reject("assign_persona", &err);
            return Err(err);
        };
        self.dispatch(MixerAction::AssignPersona {
            id: channel,
            persona: Some(found.to_ref()),
        })
    }

    /// Make the split table cover every persona of `directory`.
    pub fn sync_split_members(&mut self, directory: &dyn PersonaDirectory) -> Result<Applied> {
        let members = directory.personas().iter().map(|p| p.split_member()).collect();
        self.dispatch(MixerAction::SetSplitMembers { members })
    }

    // ── Notices and persistence views ──────────────────────────

    /// Queue a notice raised outside the session (store failures and the
    /// like).
    pub fn notify(&mut self, notice: Notice) {
        self.notices.push(notice);
    }

    /// Queue a notice for an error that happened outside `dispatch`.
    pub fn report(&mut self, err: &MixdeskError) {
        self.notices.push(Notice::from_error(err));
    }

    /// Take all pending notices, oldest first.
    pub fn drain_notices(&mut self) -> Vec<Notice> {
        self.notices.drain()
    }

    pub fn pending_notices(&self) -> usize {
        self.notices.len()
    }

    /// The persisted part of the current state.
    pub fn document(&self) -> MixerDocument {
        self.state.to_document()
    }

    pub fn split_record(&self) -> SplitRecord {
        self.state.splits.record()
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::with_defaults()
    }
}
