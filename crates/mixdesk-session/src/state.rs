//! The owned console state and the closed set of actions that change it.
//!
//! `MixerState::apply` is the only mutation path. Callers apply an action to
//! a copy and keep the copy only when `apply` succeeds, so a rejected action
//! never leaves a half-applied state behind.

use mixdesk_core::{ChannelId, Color, GroupId, PersonaId, Result};
use std::collections::BTreeSet;
use tracing::debug;

use crate::channel::{AutomationMode, ChannelKind, ChannelPatch, MeterMode, SendPatch};
use crate::group::{GroupManager, GroupRollup};
use crate::persona::PersonaRef;
use crate::registry::ChannelRegistry;
use crate::serialization::MixerDocument;
use crate::snapshot::{RecallReport, Snapshot};
use crate::split::{SplitMember, SplitTable};

/// Console-wide display flags.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ViewState {
    pub meter_mode: MeterMode,
    pub prefader_metering: bool,
    /// Ids of collapsed UI sections.
    pub collapsed_sections: BTreeSet<String>,
    pub training_mode: bool,
}

/// Everything the console knows about one session.
#[derive(Debug, Clone, PartialEq)]
pub struct MixerState {
    pub channels: ChannelRegistry,
    pub groups: GroupManager,
    pub splits: SplitTable,
    /// Selected channels, in selection order.
    pub selected: Vec<ChannelId>,
    pub view: ViewState,
}

impl Default for MixerState {
    fn default() -> Self {
        Self::with_channels(ChannelRegistry::with_defaults())
    }
}

impl MixerState {
    pub fn with_channels(channels: ChannelRegistry) -> Self {
        Self {
            channels,
            groups: GroupManager::new(),
            splits: SplitTable::default(),
            selected: Vec::new(),
            view: ViewState::default(),
        }
    }

    /// Build from a persisted document. The document is expected to be
    /// normalized already.
    pub fn from_document(document: MixerDocument) -> Self {
        let mut state = Self::with_channels(ChannelRegistry::from_channels(document.channels));
        state.groups = GroupManager::from_groups(document.groups);
        state
    }

    /// The persisted part of the state.
    pub fn to_document(&self) -> MixerDocument {
        MixerDocument {
            channels: self.channels.as_slice().to_vec(),
            groups: self.groups.iter().cloned().collect(),
        }
    }

    /// Whether two states agree on everything that gets saved. Selection
    /// and view flags are ignored.
    pub fn same_persisted(&self, other: &MixerState) -> bool {
        self.channels == other.channels
            && self.groups == other.groups
            && self.splits == other.splits
    }

    /// Rollups for every group, in group order.
    pub fn group_rollups(&self) -> Vec<(GroupId, GroupRollup)> {
        self.groups
            .iter()
            .filter_map(|g| self.groups.rollup(g.id, &self.channels).map(|r| (g.id, r)))
            .collect()
    }

    /// Channels that are currently heard, honoring mute, solo and solo-safe.
    pub fn audible_channels(&self) -> Vec<ChannelId> {
        self.channels
            .iter()
            .filter(|c| self.channels.is_audible(c))
            .map(|c| c.id)
            .collect()
    }

    /// Apply one action in place.
    ///
    /// On error the state may be partially modified; callers that need
    /// all-or-nothing semantics apply to a clone (see `Session::dispatch`).
    pub fn apply(&mut self, action: MixerAction) -> Result<Applied> {
        use MixerAction as A;
        let applied = match action {
            A::AddChannel { kind } => Applied::Channel(self.channels.add_channel(kind)),
            A::UpdateChannel { id, patch } => {
                self.channels.update_channel(id, &patch);
                Applied::Done
            }
            A::DuplicateChannel { id } => Applied::Channel(self.channels.duplicate_channel(id)?),
            A::DeleteChannel { id } => {
                self.channels.remove_channel(id)?;
                self.groups.detach(id);
                self.selected.retain(|&s| s != id);
                Applied::Done
            }
            A::ReorderChannel { id, index } => {
                self.channels.reorder_channel(id, index)?;
                Applied::Done
            }
            A::RenameChannel { id, name } => {
                self.channels.rename_channel(id, name)?;
                Applied::Done
            }
            A::RecolorChannel { id, color } => {
                self.channels.recolor_channel(id, color)?;
                Applied::Done
            }
            A::SetAutomationMode { id, mode } => {
                self.channels.set_automation_mode(id, mode)?;
                Applied::Done
            }
            A::AssignPersona { id, persona } => {
                self.channels.assign_persona(id, persona)?;
                Applied::Done
            }

            A::AddSend { channel, target } => {
                Applied::Send(self.channels.add_send(channel, target)?)
            }
            A::UpdateSend { channel, index, patch } => {
                self.channels.update_send(channel, index, &patch);
                Applied::Done
            }
            A::RemoveSend { channel, index } => {
                self.channels.remove_send(channel, index);
                Applied::Done
            }

            A::CreateGroup { channels, name } => {
                Applied::Group(self.groups.create_group(&channels, name, &mut self.channels)?)
            }
            A::SetGroupVolume { group, slider } => {
                self.groups.set_group_volume(group, slider, &mut self.channels)?;
                Applied::Done
            }
            A::ToggleGroupMute { group } => {
                Applied::Flag(self.groups.toggle_group_mute(group, &mut self.channels)?)
            }
            A::ToggleGroupSolo { group } => {
                Applied::Flag(self.groups.toggle_group_solo(group, &mut self.channels)?)
            }
            A::RenameGroup { group, name } => {
                self.groups.rename_group(group, name)?;
                Applied::Done
            }
            A::ToggleGroupExpand { group } => Applied::Flag(self.groups.toggle_expand(group)?),
            A::RecolorGroup { group, color } => {
                self.groups.recolor_group(group, color)?;
                Applied::Done
            }
            A::DissolveGroup { group } => {
                self.groups.dissolve_group(group, &mut self.channels)?;
                Applied::Done
            }

            A::SetSplitMembers { members } => Applied::Flag(self.splits.set_members(members)),
            A::SetAutoSplit { on } => {
                self.splits.set_auto_split(on);
                Applied::Done
            }
            A::SetSplitPercentage { persona, value } => {
                self.splits.set_percentage(&persona, value)?;
                Applied::Done
            }
            A::ResetSplits => {
                self.splits.reset();
                Applied::Done
            }

            A::RecallSnapshot { snapshot } => {
                let report = snapshot.recall(&mut self.channels, &mut self.groups);
                Applied::Recalled(report)
            }

            A::Select { channels } => {
                self.selected = channels
                    .into_iter()
                    .filter(|&id| self.channels.contains(id))
                    .fold(Vec::new(), |mut acc, id| {
                        if !acc.contains(&id) {
                            acc.push(id);
                        }
                        acc
                    });
                Applied::Done
            }
            A::ToggleSelect { id } => {
                if let Some(pos) = self.selected.iter().position(|&s| s == id) {
                    self.selected.remove(pos);
                    Applied::Flag(false)
                } else if self.channels.contains(id) {
                    self.selected.push(id);
                    Applied::Flag(true)
                } else {
                    Applied::Flag(false)
                }
            }
            A::ClearSelection => {
                self.selected.clear();
                Applied::Done
            }

            A::SetMeterMode { mode } => {
                self.view.meter_mode = mode;
                Applied::Done
            }
            A::SetPrefaderMetering { on } => {
                self.view.prefader_metering = on;
                Applied::Done
            }
            A::ToggleSection { section } => {
                let collapsed = if self.view.collapsed_sections.remove(&section) {
                    false
                } else {
                    self.view.collapsed_sections.insert(section);
                    true
                };
                Applied::Flag(collapsed)
            }
            A::SetTrainingMode { on } => {
                self.view.training_mode = on;
                Applied::Done
            }
        };
        debug!(?applied, "Action applied");
        Ok(applied)
    }
}

/// Every named change the console accepts.
#[derive(Debug, Clone, PartialEq)]
pub enum MixerAction {
    AddChannel { kind: ChannelKind },
    UpdateChannel { id: ChannelId, patch: ChannelPatch },
    DuplicateChannel { id: ChannelId },
    DeleteChannel { id: ChannelId },
    ReorderChannel { id: ChannelId, index: usize },
    RenameChannel { id: ChannelId, name: String },
    RecolorChannel { id: ChannelId, color: Color },
    SetAutomationMode { id: ChannelId, mode: AutomationMode },
    AssignPersona { id: ChannelId, persona: Option<PersonaRef> },

    AddSend { channel: ChannelId, target: ChannelId },
    UpdateSend { channel: ChannelId, index: usize, patch: SendPatch },
    RemoveSend { channel: ChannelId, index: usize },

    CreateGroup { channels: Vec<ChannelId>, name: String },
    SetGroupVolume { group: GroupId, slider: f64 },
    ToggleGroupMute { group: GroupId },
    ToggleGroupSolo { group: GroupId },
    RenameGroup { group: GroupId, name: String },
    ToggleGroupExpand { group: GroupId },
    RecolorGroup { group: GroupId, color: Color },
    DissolveGroup { group: GroupId },

    SetSplitMembers { members: Vec<SplitMember> },
    SetAutoSplit { on: bool },
    SetSplitPercentage { persona: PersonaId, value: f64 },
    ResetSplits,

    RecallSnapshot { snapshot: Box<Snapshot> },

    Select { channels: Vec<ChannelId> },
    ToggleSelect { id: ChannelId },
    ClearSelection,

    SetMeterMode { mode: MeterMode },
    SetPrefaderMetering { on: bool },
    ToggleSection { section: String },
    SetTrainingMode { on: bool },
}

impl MixerAction {
    /// Short name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::AddChannel { .. } => "add_channel",
            Self::UpdateChannel { .. } => "update_channel",
            Self::DuplicateChannel { .. } => "duplicate_channel",
            Self::DeleteChannel { .. } => "delete_channel",
            Self::ReorderChannel { .. } => "reorder_channel",
            Self::RenameChannel { .. } => "rename_channel",
            Self::RecolorChannel { .. } => "recolor_channel",
            Self::SetAutomationMode { .. } => "set_automation_mode",
            Self::AssignPersona { .. } => "assign_persona",
            Self::AddSend { .. } => "add_send",
            Self::UpdateSend { .. } => "update_send",
            Self::RemoveSend { .. } => "remove_send",
            Self::CreateGroup { .. } => "create_group",
            Self::SetGroupVolume { .. } => "set_group_volume",
            Self::ToggleGroupMute { .. } => "toggle_group_mute",
            Self::ToggleGroupSolo { .. } => "toggle_group_solo",
            Self::RenameGroup { .. } => "rename_group",
            Self::ToggleGroupExpand { .. } => "toggle_group_expand",
            Self::RecolorGroup { .. } => "recolor_group",
            Self::DissolveGroup { .. } => "dissolve_group",
            Self::SetSplitMembers { .. } => "set_split_members",
            Self::SetAutoSplit { .. } => "set_auto_split",
            Self::SetSplitPercentage { .. } => "set_split_percentage",
            Self::ResetSplits => "reset_splits",
            Self::RecallSnapshot { .. } => "recall_snapshot",
            Self::Select { .. } => "select",
            Self::ToggleSelect { .. } => "toggle_select",
            Self::ClearSelection => "clear_selection",
            Self::SetMeterMode { .. } => "set_meter_mode",
            Self::SetPrefaderMetering { .. } => "set_prefader_metering",
            Self::ToggleSection { .. } => "toggle_section",
            Self::SetTrainingMode { .. } => "set_training_mode",
        }
    }

    /// Whether the action changes what gets persisted (channels, groups or
    /// splits) rather than selection or view flags only.
    pub fn is_persistent(&self) -> bool {
        !matches!(
            self,
            Self::Select { .. }
                | Self::ToggleSelect { .. }
                | Self::ClearSelection
                | Self::SetMeterMode { .. }
                | Self::SetPrefaderMetering { .. }
                | Self::ToggleSection { .. }
                | Self::SetTrainingMode { .. }
        )
    }
}

/// What an accepted action produced.
#[derive(Debug, Clone, PartialEq)]
pub enum Applied {
    Done,
    /// A channel was created.
    Channel(ChannelId),
    /// A group was created.
    Group(GroupId),
    /// Index of a newly added send.
    Send(usize),
    /// New value of a toggled flag.
    Flag(bool),
    Recalled(RecallReport),
}
