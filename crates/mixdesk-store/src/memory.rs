//! In-process store, mainly for tests and offline sessions.

use mixdesk_core::{MixdeskError, ProjectId, Result};
use mixdesk_session::{MixerDocument, MixerFile, SnapshotBook, SplitRecord};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::Duration;

use crate::ProjectStore;

#[derive(Debug, Default)]
struct Project {
    /// Mixer state as the encoded file, so malformed data can be planted.
    mixer: Option<Vec<u8>>,
    snapshots: SnapshotBook,
    splits: Option<SplitRecord>,
}

#[derive(Debug, Default)]
struct Faults {
    fail_loads: bool,
    fail_saves: bool,
    save_delay: Option<Duration>,
}

/// Store backed by a mutex-guarded map.
#[derive(Debug, Default)]
pub struct MemoryStore {
    projects: Mutex<HashMap<ProjectId, Project>>,
    faults: Mutex<Faults>,
    saves: Mutex<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every load fail with a persistence error.
    pub fn set_fail_loads(&self, fail: bool) {
        self.faults.lock().fail_loads = fail;
    }

    /// Make every save fail with a persistence error.
    pub fn set_fail_saves(&self, fail: bool) {
        self.faults.lock().fail_saves = fail;
    }

    /// Block each save for `delay`.
    pub fn set_save_delay(&self, delay: Option<Duration>) {
        self.faults.lock().save_delay = delay;
    }

    /// Store raw bytes as a project's mixer file.
    pub fn put_raw_mixer(&self, project: &ProjectId, data: impl Into<Vec<u8>>) {
        self.projects.lock().entry(project.clone()).or_default().mixer = Some(data.into());
    }

    /// Number of successful mixer saves.
    pub fn save_count(&self) -> usize {
        *self.saves.lock()
    }

    fn check_load(&self) -> Result<()> {
        if self.faults.lock().fail_loads {
            return Err(MixdeskError::Persistence("store unavailable".to_string()));
        }
        Ok(())
    }

    fn check_save(&self) -> Result<()> {
        let (fail, delay) = {
            let faults = self.faults.lock();
            (faults.fail_saves, faults.save_delay)
        };
        if let Some(delay) = delay {
            std::thread::sleep(delay);
        }
        if fail {
            return Err(MixdeskError::Persistence("store unavailable".to_string()));
        }
        Ok(())
    }
}

impl ProjectStore for MemoryStore {
    fn load_mixer_state(&self, project: &ProjectId) -> Result<Option<MixerDocument>> {
        self.check_load()?;
        let data = self.projects.lock().get(project).and_then(|p| p.mixer.clone());
        match data {
            Some(data) => Ok(Some(MixerFile::from_json(&data)?.mixer)),
            None => Ok(None),
        }
    }

    fn save_mixer_state(&self, project: &ProjectId, mixer: &MixerDocument) -> Result<()> {
        self.check_save()?;
        let data = MixerFile::new(mixer.clone()).to_json()?;
        self.projects.lock().entry(project.clone()).or_default().mixer = Some(data);
        *self.saves.lock() += 1;
        Ok(())
    }

    fn load_snapshots(&self, project: &ProjectId) -> Result<SnapshotBook> {
        self.check_load()?;
        Ok(self
            .projects
            .lock()
            .get(project)
            .map(|p| p.snapshots.clone())
            .unwrap_or_default())
    }

    fn save_snapshots(&self, project: &ProjectId, snapshots: &SnapshotBook) -> Result<()> {
        self.check_save()?;
        self.projects.lock().entry(project.clone()).or_default().snapshots = snapshots.clone();
        Ok(())
    }

    fn load_splits(&self, project: &ProjectId) -> Result<Option<SplitRecord>> {
        self.check_load()?;
        Ok(self.projects.lock().get(project).and_then(|p| p.splits.clone()))
    }

    fn save_splits(&self, project: &ProjectId, splits: &SplitRecord) -> Result<()> {
        self.check_save()?;
        self.projects.lock().entry(project.clone()).or_default().splits = Some(splits.clone());
        Ok(())
    }
}
