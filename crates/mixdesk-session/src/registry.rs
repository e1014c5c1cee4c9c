//! The channel registry: the ordered, canonical list of channels.

use mixdesk_core::{ChannelId, Color, Result, ValidationError};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::channel::{AutomationMode, Channel, ChannelKind, ChannelPatch};
use crate::persona::PersonaRef;

/// Ordered list of channels. The master channel, when present, is always
/// at index 0.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChannelRegistry {
    channels: Vec<Channel>,
}

impl ChannelRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in starter console: master, two buses, two audio channels.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        for kind in [
            ChannelKind::Master,
            ChannelKind::Bus,
            ChannelKind::Bus,
            ChannelKind::Audio,
            ChannelKind::Audio,
        ] {
            registry.add_channel(kind);
        }
        registry
    }

    /// Build from an existing channel list, without any checks.
    pub fn from_channels(channels: Vec<Channel>) -> Self {
        Self { channels }
    }

    pub fn into_channels(self) -> Vec<Channel> {
        self.channels
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Channel> {
        self.channels.iter()
    }

    pub fn as_slice(&self) -> &[Channel] {
        &self.channels
    }

    pub(crate) fn channels_mut(&mut self) -> &mut Vec<Channel> {
        &mut self.channels
    }

    pub fn get(&self, id: ChannelId) -> Option<&Channel> {
        self.channels.iter().find(|c| c.id == id)
    }

    pub fn get_mut(&mut self, id: ChannelId) -> Option<&mut Channel> {
        self.channels.iter_mut().find(|c| c.id == id)
    }

    /// Like `get_mut`, but a missing channel is a validation error.
    pub fn require_mut(&mut self, id: ChannelId) -> Result<&mut Channel> {
        self.get_mut(id)
            .ok_or_else(|| ValidationError::UnknownChannel(id).into())
    }

    pub fn contains(&self, id: ChannelId) -> bool {
        self.index_of(id).is_some()
    }

    pub fn index_of(&self, id: ChannelId) -> Option<usize> {
        self.channels.iter().position(|c| c.id == id)
    }

    pub fn master(&self) -> Option<&Channel> {
        self.channels
            .first()
            .filter(|c| c.kind() == ChannelKind::Master)
    }

    pub fn count_of(&self, kind: ChannelKind) -> usize {
        self.channels.iter().filter(|c| c.kind() == kind).count()
    }

    pub fn of_kind(&self, kind: ChannelKind) -> impl Iterator<Item = &Channel> {
        self.channels.iter().filter(move |c| c.kind() == kind)
    }

    /// Add a channel of `kind` with that kind's defaults.
    ///
    /// The master is a singleton: asking for a second one returns the id of
    /// the existing master.
    pub fn add_channel(&mut self, kind: ChannelKind) -> ChannelId {
        if kind == ChannelKind::Master {
            if let Some(master) = self.master() {
                debug!(channel = %master.id, "Master already present");
                return master.id;
            }
        }
        let number = self.count_of(kind) as u32 + 1;
        let channel = Channel::new(kind, number);
        let id = channel.id;
        if kind == ChannelKind::Master {
            self.channels.insert(0, channel);
        } else {
            self.channels.push(channel);
        }
        info!(channel = %id, kind = %kind, number, "Channel added");
        id
    }

    /// Apply a partial update. Returns false (and changes nothing) when the
    /// id is unknown.
    pub fn update_channel(&mut self, id: ChannelId, patch: &ChannelPatch) -> bool {
        let Some(channel) = self.get_mut(id) else {
            debug!(channel = %id, "Update for unknown channel ignored");
            return false;
        };
        patch.apply(channel);
        if let Some(name) = patch.name.clone() {
            self.refresh_send_labels(id, &name);
        }
        true
    }

    /// Clone a channel under a new id, inserted right after the original.
    pub fn duplicate_channel(&mut self, id: ChannelId) -> Result<ChannelId> {
        let index = self
            .index_of(id)
            .ok_or(ValidationError::UnknownChannel(id))?;
        let source = &self.channels[index];
        if source.is_protected() {
            return Err(ValidationError::ProtectedChannel {
                kind: source.kind().to_string(),
                action: "duplicated",
            }
            .into());
        }
        let number = self.count_of(source.kind()) as u32 + 1;
        let copy = source.duplicate(number);
        let copy_id = copy.id;
        self.channels.insert(index + 1, copy);
        info!(source = %id, channel = %copy_id, "Channel duplicated");
        Ok(copy_id)
    }

    /// Remove a channel and strip every send that targets it.
    ///
    /// Master and bus channels are protected and are never removed.
    pub fn remove_channel(&mut self, id: ChannelId) -> Result<Channel> {
        let index = self
            .index_of(id)
            .ok_or(ValidationError::UnknownChannel(id))?;
        if self.channels[index].is_protected() {
            return Err(ValidationError::ProtectedChannel {
                kind: self.channels[index].kind().to_string(),
                action: "deleted",
            }
            .into());
        }
        let removed = self.channels.remove(index);
        let stripped = self.strip_sends_to(id);
        info!(channel = %id, stripped_sends = stripped, "Channel deleted");
        Ok(removed)
    }

    /// Move a channel to `new_index`.
    ///
    /// Only moves inside the channel's own kind are allowed: the slot at
    /// `new_index` must hold a channel of the same kind. The master never
    /// moves, and audio channels never land at or before the last
    /// master/bus channel.
    pub fn reorder_channel(&mut self, id: ChannelId, new_index: usize) -> Result<()> {
        let from = self
            .index_of(id)
            .ok_or(ValidationError::UnknownChannel(id))?;
        let kind = self.channels[from].kind();
        let rejected = || -> mixdesk_core::MixdeskError {
            ValidationError::InvalidReorder {
                channel: id,
                index: new_index,
            }
            .into()
        };

        if kind == ChannelKind::Master || new_index >= self.channels.len() {
            return Err(rejected());
        }
        if from == new_index {
            return Ok(());
        }
        if self.channels[new_index].kind() != kind {
            return Err(rejected());
        }
        if kind == ChannelKind::Audio {
            let last_fixed = self
                .channels
                .iter()
                .rposition(|c| matches!(c.kind(), ChannelKind::Master | ChannelKind::Bus));
            if last_fixed.is_some_and(|last| new_index <= last) {
                return Err(rejected());
            }
        }

        let channel = self.channels.remove(from);
        self.channels.insert(new_index, channel);
        debug!(channel = %id, from, to = new_index, "Channel reordered");
        Ok(())
    }

    pub fn rename_channel(&mut self, id: ChannelId, name: impl Into<String>) -> Result<()> {
        let name = name.into();
        self.require_mut(id)?.name = name.clone();
        self.refresh_send_labels(id, &name);
        Ok(())
    }

    pub fn recolor_channel(&mut self, id: ChannelId, color: Color) -> Result<()> {
        self.require_mut(id)?.color = color;
        Ok(())
    }

    pub fn set_automation_mode(&mut self, id: ChannelId, mode: AutomationMode) -> Result<()> {
        self.require_mut(id)?.automation_mode = mode;
        Ok(())
    }

    pub fn assign_persona(&mut self, id: ChannelId, persona: Option<PersonaRef>) -> Result<()> {
        self.require_mut(id)?.persona = persona;
        Ok(())
    }

    /// Whether any channel is soloed.
    pub fn any_solo(&self) -> bool {
        self.channels.iter().any(|c| c.solo)
    }

    /// Whether a channel is heard, taking mute and global solo into account.
    /// Solo-safe channels are never silenced by someone else's solo.
    pub fn is_audible(&self, channel: &Channel) -> bool {
        if channel.muted {
            return false;
        }
        !self.any_solo() || channel.solo || channel.solo_safe
    }
}

impl<'a> IntoIterator for &'a ChannelRegistry {
    type Item = &'a Channel;
    type IntoIter = std::slice::Iter<'a, Channel>;

    fn into_iter(self) -> Self::IntoIter {
        self.channels.iter()
    }
}
