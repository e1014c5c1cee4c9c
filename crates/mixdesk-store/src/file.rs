//! JSON files on disk, one directory per project.
//!
//! Layout:
//! ```text
//! store/
//!   {project}/
//!     mixer.json       # versioned mixer file
//!     snapshots.json   # snapshot list
//!     splits.json      # split record
//! ```

use mixdesk_core::{MixdeskError, ProjectId, Result};
use mixdesk_session::{MixerDocument, MixerFile, SnapshotBook, SplitRecord};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::PathBuf;
use tracing::debug;

use crate::ProjectStore;

const MIXER_FILE: &str = "mixer.json";
const SNAPSHOTS_FILE: &str = "snapshots.json";
const SPLITS_FILE: &str = "splits.json";

pub struct JsonFileStore {
    root: PathBuf,
}

impl JsonFileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Directory holding one project's files. Characters that could escape
    /// the store root are replaced.
    pub fn project_dir(&self, project: &ProjectId) -> PathBuf {
        let name: String = project
            .as_str()
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.root.join(name)
    }

    /// List projects that have a directory in the store.
    pub fn list_projects(&self) -> Result<Vec<ProjectId>> {
        if !self.root.exists() {
            return Ok(Vec::new());
        }
        let mut ids = Vec::new();
        for entry in std::fs::read_dir(&self.root)? {
            let entry = entry?;
            if entry.file_type()?.is_dir() {
                if let Some(name) = entry.file_name().to_str() {
                    ids.push(ProjectId::from(name));
                }
            }
        }
        ids.sort();
        Ok(ids)
    }

    fn read(&self, project: &ProjectId, file: &str) -> Result<Option<Vec<u8>>> {
        let path = self.project_dir(project).join(file);
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(std::fs::read(&path)?))
    }

    fn read_json<T: DeserializeOwned>(&self, project: &ProjectId, file: &str) -> Result<Option<T>> {
        let Some(data) = self.read(project, file)? else {
            return Ok(None);
        };
        serde_json::from_slice(&data)
            .map(Some)
            .map_err(|e| MixdeskError::Serialization(format!("Failed to parse {file}: {e}")))
    }

    fn write_json<T: Serialize>(&self, project: &ProjectId, file: &str, value: &T) -> Result<()> {
        let data = serde_json::to_vec_pretty(value)
            .map_err(|e| MixdeskError::Serialization(format!("Failed to serialize {file}: {e}")))?;
        self.write(project, file, &data)
    }

    /// Write through a temp file and rename, so readers never see a torn file.
    fn write(&self, project: &ProjectId, file: &str, data: &[u8]) -> Result<()> {
        let dir = self.project_dir(project);
        std::fs::create_dir_all(&dir)?;
        let path = dir.join(file);
        let tmp = dir.join(format!("{file}.tmp"));
        std::fs::write(&tmp, data)?;
        std::fs::rename(&tmp, &path)?;
        debug!(path = %path.display(), bytes = data.len(), "Wrote store file");
        Ok(())
    }
}

impl ProjectStore for JsonFileStore {
    fn load_mixer_state(&self, project: &ProjectId) -> Result<Option<MixerDocument>> {
        match self.read(project, MIXER_FILE)? {
            Some(data) => Ok(Some(MixerFile::from_json(&data)?.mixer)),
            None => Ok(None),
        }
    }

    fn save_mixer_state(&self, project: &ProjectId, mixer: &MixerDocument) -> Result<()> {
        let data = MixerFile::new(mixer.clone()).to_json()?;
        self.write(project, MIXER_FILE, &data)
    }

    fn load_snapshots(&self, project: &ProjectId) -> Result<SnapshotBook> {
        Ok(self.read_json(project, SNAPSHOTS_FILE)?.unwrap_or_default())
    }

    fn save_snapshots(&self, project: &ProjectId, snapshots: &SnapshotBook) -> Result<()> {
        self.write_json(project, SNAPSHOTS_FILE, snapshots)
    }

    fn load_splits(&self, project: &ProjectId) -> Result<Option<SplitRecord>> {
        self.read_json(project, SPLITS_FILE)
    }

    fn save_splits(&self, project: &ProjectId, splits: &SplitRecord) -> Result<()> {
        self.write_json(project, SPLITS_FILE, splits)
    }
}
