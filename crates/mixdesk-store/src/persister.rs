//! Background saving with at most one save in flight.
//!
//! Requests go through a watch channel, so while a save is running newer
//! requests overwrite each other and only the latest one is written next.
//! Results come back as [`PersistEvent`]s. A failed save never touches the
//! session; the caller turns the event into a notice.

use mixdesk_core::{MixdeskError, ProjectId, Result};
use mixdesk_session::{MixerDocument, Session, SnapshotBook, SplitRecord};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::ProjectStore;

/// Everything that is written for one save.
#[derive(Debug, Clone)]
pub struct PersistJob {
    /// Session revision the job was taken at.
    pub revision: u64,
    pub mixer: MixerDocument,
    pub snapshots: SnapshotBook,
    pub splits: SplitRecord,
}

impl PersistJob {
    pub fn from_session(session: &Session) -> Self {
        Self {
            revision: session.revision(),
            mixer: session.document(),
            snapshots: session.snapshots().clone(),
            splits: session.split_record(),
        }
    }
}

/// Outcome of one save.
#[derive(Debug)]
pub enum PersistEvent {
    Saved { revision: u64 },
    Failed { revision: u64, error: MixdeskError },
}

pub struct Persister {
    jobs: watch::Sender<Option<Arc<PersistJob>>>,
    handle: JoinHandle<()>,
}

impl Persister {
    /// Start the save worker for `project`. Must be called inside a tokio
    /// runtime.
    pub fn spawn(
        store: Arc<dyn ProjectStore>,
        project: ProjectId,
    ) -> (Self, mpsc::UnboundedReceiver<PersistEvent>) {
        let (jobs, mut rx) = watch::channel::<Option<Arc<PersistJob>>>(None);
        let (events, events_rx) = mpsc::unbounded_channel();
        let handle = tokio::spawn(async move {
            while rx.changed().await.is_ok() {
                let Some(job) = rx.borrow_and_update().clone() else {
                    continue;
                };
                let revision = job.revision;
                let store = Arc::clone(&store);
                let target = project.clone();
                let result =
                    tokio::task::spawn_blocking(move || write_job(store.as_ref(), &target, &job))
                        .await
                        .map_err(|e| MixdeskError::Internal(format!("Save task failed: {e}")))
                        .and_then(|r| r);
                let event = match result {
                    Ok(()) => {
                        debug!(project = %project, revision, "Project saved");
                        PersistEvent::Saved { revision }
                    }
                    Err(err) => {
                        error!(project = %project, revision, error = %err, "Project save failed");
                        PersistEvent::Failed { revision, error: err }
                    }
                };
                // Nobody listening is fine.
                let _ = events.send(event);
            }
            debug!(project = %project, "Persister finished");
        });
        info!("Persister started");
        (Self { jobs, handle }, events_rx)
    }

    /// Queue a save, replacing any save that has not started yet.
    pub fn submit(&self, job: PersistJob) {
        debug!(revision = job.revision, "Save queued");
        self.jobs.send_replace(Some(Arc::new(job)));
    }

    /// Queue a save of the session's current content.
    pub fn save_session(&self, session: &Session) {
        self.submit(PersistJob::from_session(session));
    }

    /// Finish the pending save, if any, and stop the worker.
    pub async fn shutdown(self) -> Result<()> {
        let Self { jobs, handle } = self;
        drop(jobs);
        handle
            .await
            .map_err(|e| MixdeskError::Internal(format!("Persister task failed: {e}")))
    }
}

fn write_job(store: &dyn ProjectStore, project: &ProjectId, job: &PersistJob) -> Result<()> {
    store.save_mixer_state(project, &job.mixer)?;
    store.save_snapshots(project, &job.snapshots)?;
    store.save_splits(project, &job.splits)
}
