//! Snapshot capture and recall.
//!
//! A snapshot stores a fixed projection of each channel's mix-relevant
//! fields. Recall merges that projection back onto channels that still
//! exist; names, colors, kinds and everything else outside the projection
//! are never touched.

use chrono::{DateTime, Utc};
use mixdesk_core::{ChannelId, GroupId, Result, SnapshotId, ValidationError};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::channel::{clamp_level, clamp_pan, AutomationMode, Channel, ChannelSend, MeterMode};
use crate::group::GroupManager;
use crate::registry::ChannelRegistry;

/// The captured fields of one channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelState {
    pub id: ChannelId,
    pub volume: f64,
    pub pan: f64,
    pub is_muted: bool,
    pub is_solo: bool,
    #[serde(default)]
    pub automation_mode: AutomationMode,
    #[serde(default)]
    pub is_prefader_metering: bool,
    #[serde(default)]
    pub meter_mode: Option<MeterMode>,
    /// Absent for channel kinds without sends.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sends: Option<Vec<ChannelSend>>,
    #[serde(default)]
    pub group_id: Option<GroupId>,
}

impl ChannelState {
    pub fn capture(channel: &Channel) -> Self {
        Self {
            id: channel.id,
            volume: channel.volume,
            pan: channel.pan,
            is_muted: channel.muted,
            is_solo: channel.solo,
            automation_mode: channel.automation_mode,
            is_prefader_metering: channel.prefader_metering,
            meter_mode: channel.meter_mode,
            sends: channel.kind().has_sends().then(|| channel.sends().to_vec()),
            group_id: channel.group_id,
        }
    }

    /// Overwrite the projected fields of `channel`. The group back-reference
    /// is left to the caller, which must keep membership lists in step.
    fn apply_to(&self, channel: &mut Channel) {
        channel.volume = clamp_level(self.volume);
        channel.pan = clamp_pan(self.pan);
        channel.muted = self.is_muted;
        channel.solo = self.is_solo;
        channel.automation_mode = self.automation_mode;
        channel.prefader_metering = self.is_prefader_metering;
        channel.meter_mode = self.meter_mode;
        if let (Some(sends), Some(live)) = (&self.sends, channel.sends_mut()) {
            *live = sends.clone();
        }
    }
}

/// A named, timestamped capture of the console.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub id: SnapshotId,
    pub name: String,
    pub timestamp: DateTime<Utc>,
    pub channel_states: Vec<ChannelState>,
}

impl Snapshot {
    /// Capture every live channel.
    pub fn capture(name: impl Into<String>, registry: &ChannelRegistry) -> Self {
        Self {
            id: SnapshotId::new(),
            name: name.into(),
            timestamp: Utc::now(),
            channel_states: registry.iter().map(ChannelState::capture).collect(),
        }
    }

    /// Merge the snapshot onto the live console.
    ///
    /// Channels deleted since the capture are skipped and counted in the
    /// report. Group membership follows the captured `group_id` when that
    /// group still exists. Sends to channels that no longer exist are
    /// dropped afterwards.
    pub fn recall(
        &self,
        registry: &mut ChannelRegistry,
        groups: &mut GroupManager,
    ) -> RecallReport {
        let mut report = RecallReport::default();
        for state in &self.channel_states {
            let Some(channel) = registry.get_mut(state.id) else {
                report.missing.push(state.id);
                continue;
            };
            state.apply_to(channel);
            groups.assign(state.id, state.group_id, registry);
            report.applied += 1;
        }
        report.dropped_sends = registry.strip_dangling_sends();
        info!(
            snapshot = %self.name,
            applied = report.applied,
            missing = report.missing.len(),
            "Snapshot recalled"
        );
        report
    }
}

/// Outcome of a snapshot recall.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecallReport {
    /// Channels that received the captured values.
    pub applied: usize,
    /// Captured channels that no longer exist.
    pub missing: Vec<ChannelId>,
    /// Restored sends removed because their target is gone.
    pub dropped_sends: usize,
}

impl RecallReport {
    pub fn is_partial(&self) -> bool {
        !self.missing.is_empty()
    }
}

/// The stored snapshot list of a project, oldest first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SnapshotBook {
    snapshots: Vec<Snapshot>,
}

impl SnapshotBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_snapshots(snapshots: Vec<Snapshot>) -> Self {
        Self { snapshots }
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Snapshot> {
        self.snapshots.iter()
    }

    pub fn as_slice(&self) -> &[Snapshot] {
        &self.snapshots
    }

    pub fn push(&mut self, snapshot: Snapshot) {
        debug!(snapshot = %snapshot.id, name = %snapshot.name, "Snapshot stored");
        self.snapshots.push(snapshot);
    }

    pub fn get(&self, id: SnapshotId) -> Option<&Snapshot> {
        self.snapshots.iter().find(|s| s.id == id)
    }

    pub fn require(&self, id: SnapshotId) -> Result<&Snapshot> {
        self.get(id)
            .ok_or_else(|| ValidationError::UnknownSnapshot(id.to_string()).into())
    }

    /// Most recent snapshot with this name.
    pub fn find_by_name(&self, name: &str) -> Option<&Snapshot> {
        self.snapshots.iter().rev().find(|s| s.name == name)
    }

    pub fn delete(&mut self, id: SnapshotId) -> Result<Snapshot> {
        let index = self
            .snapshots
            .iter()
            .position(|s| s.id == id)
            .ok_or_else(|| ValidationError::UnknownSnapshot(id.to_string()))?;
        Ok(self.snapshots.remove(index))
    }
}
