//! Persisted mixer layout with versioning, migration and repair.
//!
//! Uses JSON with a schema version field for forward-compatible persistence.
//! Whatever comes off disk is normalized before it reaches a session, so
//! the rest of the crate can rely on its invariants.

use mixdesk_core::{MixdeskError, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::channel::{Channel, ChannelKind};
use crate::group::{Group, GroupManager};
use crate::registry::ChannelRegistry;

/// Current schema version.
pub const CURRENT_VERSION: u32 = 1;

/// The stored shape of a console: its channels and groups.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MixerDocument {
    pub channels: Vec<Channel>,
    /// Absent in data written before groups were persisted.
    #[serde(default)]
    pub groups: Vec<Group>,
}

impl MixerDocument {
    /// Repair a document so it satisfies the registry invariants:
    /// exactly one master at index 0, levels in range, no dangling sends and
    /// group membership mirrored by every channel's `group_id`.
    ///
    /// Returns how many repairs were made.
    pub fn normalize(&mut self) -> usize {
        let mut repairs = 0;

        let mut seen_master = false;
        let before = self.channels.len();
        self.channels.retain(|c| {
            if c.kind() != ChannelKind::Master {
                return true;
            }
            let keep = !seen_master;
            seen_master = true;
            keep
        });
        if self.channels.len() != before {
            debug!(dropped = before - self.channels.len(), "Extra master channels dropped");
            repairs += before - self.channels.len();
        }
        match self.channels.iter().position(|c| c.kind() == ChannelKind::Master) {
            Some(0) => {}
            Some(index) => {
                let master = self.channels.remove(index);
                self.channels.insert(0, master);
                debug!(from = index, "Master moved to the front");
                repairs += 1;
            }
            None => {
                self.channels.insert(0, Channel::new(ChannelKind::Master, 1));
                debug!("Missing master recreated");
                repairs += 1;
            }
        }

        for channel in &mut self.channels {
            let (volume, pan) = (channel.volume, channel.pan);
            channel.clamp_levels();
            if channel.volume != volume || channel.pan != pan {
                debug!(channel = %channel.id, "Channel levels clamped");
                repairs += 1;
            }
        }

        let mut registry = ChannelRegistry::from_channels(std::mem::take(&mut self.channels));
        let stripped = registry.strip_dangling_sends();
        if stripped > 0 {
            debug!(stripped, "Dangling sends dropped");
            repairs += stripped;
        }
        let mut groups = GroupManager::from_groups(std::mem::take(&mut self.groups));
        let reconciled = groups.reconcile(&mut registry);
        if reconciled > 0 {
            debug!(reconciled, "Group membership repaired");
            repairs += reconciled;
        }
        self.channels = registry.into_channels();
        self.groups = groups.iter().cloned().collect();
        repairs
    }
}

/// Versioned mixer file wrapper.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MixerFile {
    /// Schema version for migration.
    pub version: u32,
    /// Application version that wrote this file.
    pub app_version: String,
    pub mixer: MixerDocument,
}

impl MixerFile {
    pub fn new(mixer: MixerDocument) -> Self {
        Self {
            version: CURRENT_VERSION,
            app_version: env!("CARGO_PKG_VERSION").to_string(),
            mixer,
        }
    }

    /// Serialize to JSON bytes.
    pub fn to_json(&self) -> Result<Vec<u8>> {
        serde_json::to_vec_pretty(self)
            .map_err(|e| MixdeskError::Serialization(format!("Failed to serialize mixer: {}", e)))
    }

    /// Deserialize from JSON bytes, migrating and normalizing as needed.
    pub fn from_json(data: &[u8]) -> Result<Self> {
        let raw: serde_json::Value = serde_json::from_slice(data)
            .map_err(|e| MixdeskError::Serialization(format!("Invalid JSON: {}", e)))?;
        if !raw.is_object() {
            return Err(MixdeskError::Serialization(
                "Mixer state must be a JSON object".to_string(),
            ));
        }

        let version = raw.get("version").and_then(|v| v.as_u64()).unwrap_or(0) as u32;
        if version > CURRENT_VERSION {
            return Err(MixdeskError::Serialization(format!(
                "Mixer file version {} is newer than supported version {}",
                version, CURRENT_VERSION
            )));
        }

        let migrated = migrate(raw, version)?;
        let mut file: Self = serde_json::from_value(migrated)
            .map_err(|e| MixdeskError::Serialization(format!("Failed to parse mixer: {}", e)))?;
        let repairs = file.mixer.normalize();
        if repairs > 0 {
            debug!(repairs, "Mixer state normalized on load");
        }
        Ok(file)
    }
}

/// Apply sequential migrations from `from_version` to CURRENT_VERSION.
fn migrate(mut data: serde_json::Value, from_version: u32) -> Result<serde_json::Value> {
    let mut version = from_version;

    while version < CURRENT_VERSION {
        match version {
            0 => {
                // v0 → v1: the whole value is a bare `{ channels }` state
                if data.get("mixer").is_none() {
                    data = serde_json::json!({
                        "version": 1,
                        "app_version": "0.0.0",
                        "mixer": data,
                    });
                }
                version = 1;
            }
            _ => {
                return Err(MixdeskError::Serialization(format!(
                    "No migration path from version {}",
                    version
                )));
            }
        }
    }

    Ok(data)
}
