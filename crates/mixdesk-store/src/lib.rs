//! Mixdesk Store - Persistence
//!
//! The project store is an external collaborator: the in-memory session is
//! always the source of truth and the store is a lagging mirror.
//!
//! - `ProjectStore`: load/save of mixer state, snapshots and splits
//! - `JsonFileStore`: one directory of JSON files per project
//! - `MemoryStore`: in-process store with injectable failures
//! - `load_session`/`open_session`: open a session, falling back to defaults on failure
//! - `Persister`: single-flight background saver (last write wins)

pub mod file;
pub mod loader;
pub mod memory;
pub mod persister;

pub use file::JsonFileStore;
pub use loader::{load_session, open_session, OpenedSession};
pub use memory::MemoryStore;
pub use persister::{PersistEvent, PersistJob, Persister};

use mixdesk_core::{ProjectId, Result};
use mixdesk_session::{MixerDocument, SnapshotBook, SplitRecord};

/// Backing store for projects.
///
/// Calls are blocking; async callers go through [`Persister`].
pub trait ProjectStore: Send + Sync {
    /// `Ok(None)` when the project has never been saved.
    fn load_mixer_state(&self, project: &ProjectId) -> Result<Option<MixerDocument>>;

    fn save_mixer_state(&self, project: &ProjectId, mixer: &MixerDocument) -> Result<()>;

    /// An empty book when nothing was saved yet.
    fn load_snapshots(&self, project: &ProjectId) -> Result<SnapshotBook>;

    fn save_snapshots(&self, project: &ProjectId, snapshots: &SnapshotBook) -> Result<()>;

    fn load_splits(&self, project: &ProjectId) -> Result<Option<SplitRecord>>;

    fn save_splits(&self, project: &ProjectId, splits: &SplitRecord) -> Result<()>;
}
