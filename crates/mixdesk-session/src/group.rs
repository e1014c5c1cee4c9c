//! Channel groups with cascading volume, mute and solo.
//!
//! The group owns its membership list; each member channel carries a
//! `group_id` back-reference. Both sides are plain ids resolved through the
//! registry, never pointers.

use mixdesk_core::{ChannelId, Color, GroupId, Result, ValidationError};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::registry::ChannelRegistry;

/// A named, colored collection of channels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    pub id: GroupId,
    pub name: String,
    #[serde(deserialize_with = "Color::deserialize_lenient")]
    pub color: Color,
    pub channel_ids: Vec<ChannelId>,
    #[serde(default)]
    pub is_expanded: bool,
}

impl Group {
    pub fn has_member(&self, id: ChannelId) -> bool {
        self.channel_ids.contains(&id)
    }
}

/// Summary of a group's members, recomputed on demand.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupRollup {
    pub member_count: usize,
    pub mean_volume: f64,
    pub all_muted: bool,
    pub any_solo: bool,
}

/// Every group of a session, in creation order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupManager {
    groups: Vec<Group>,
}

impl GroupManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_groups(groups: Vec<Group>) -> Self {
        Self { groups }
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Group> {
        self.groups.iter()
    }

    pub(crate) fn groups_mut(&mut self) -> &mut Vec<Group> {
        &mut self.groups
    }

    pub fn get(&self, id: GroupId) -> Option<&Group> {
        self.groups.iter().find(|g| g.id == id)
    }

    fn require_mut(&mut self, id: GroupId) -> Result<&mut Group> {
        self.groups
            .iter_mut()
            .find(|g| g.id == id)
            .ok_or_else(|| ValidationError::UnknownGroup(id).into())
    }

    /// Group that currently owns `channel`, if any.
    pub fn group_of(&self, channel: ChannelId) -> Option<&Group> {
        self.groups.iter().find(|g| g.has_member(channel))
    }

    /// Create a group from a selection of at least two distinct channels.
    ///
    /// Channels already in another group move to the new one.
    pub fn create_group(
        &mut self,
        selection: &[ChannelId],
        name: impl Into<String>,
        registry: &mut ChannelRegistry,
    ) -> Result<GroupId> {
        let mut members: Vec<ChannelId> = Vec::with_capacity(selection.len());
        for &id in selection {
            if !registry.contains(id) {
                return Err(ValidationError::UnknownChannel(id).into());
            }
            if !members.contains(&id) {
                members.push(id);
            }
        }
        if members.len() < 2 {
            return Err(ValidationError::GroupTooSmall {
                count: members.len(),
            }
            .into());
        }

        for &id in &members {
            self.detach(id);
        }

        let group = Group {
            id: GroupId::new(),
            name: name.into(),
            color: Color::group_default(self.groups.len()),
            channel_ids: members,
            is_expanded: true,
        };
        for &id in &group.channel_ids {
            if let Some(channel) = registry.get_mut(id) {
                channel.group_id = Some(group.id);
            }
        }
        let id = group.id;
        info!(group = %id, members = group.channel_ids.len(), "Group created");
        self.groups.push(group);
        Ok(id)
    }

    /// Scale every member's volume by `slider / 100`.
    ///
    /// The scale is relative to each member's current volume, so applying
    /// the same slider value twice compounds.
    pub fn set_group_volume(
        &self,
        group_id: GroupId,
        slider: f64,
        registry: &mut ChannelRegistry,
    ) -> Result<()> {
        let group = self
            .get(group_id)
            .ok_or(ValidationError::UnknownGroup(group_id))?;
        let ratio = crate::channel::clamp_level(slider) / 100.0;
        for &id in &group.channel_ids {
            if let Some(channel) = registry.get_mut(id) {
                channel.volume = crate::channel::clamp_level(channel.volume * ratio);
            }
        }
        debug!(group = %group_id, slider, "Group volume scaled");
        Ok(())
    }

    /// If any member is unmuted, mute all members; otherwise unmute all.
    pub fn toggle_group_mute(
        &self,
        group_id: GroupId,
        registry: &mut ChannelRegistry,
    ) -> Result<bool> {
        self.flip_uniform(group_id, registry, |c| &mut c.muted)
    }

    /// If any member is not soloed, solo all members; otherwise unsolo all.
    pub fn toggle_group_solo(
        &self,
        group_id: GroupId,
        registry: &mut ChannelRegistry,
    ) -> Result<bool> {
        self.flip_uniform(group_id, registry, |c| &mut c.solo)
    }

    fn flip_uniform<F>(
        &self,
        group_id: GroupId,
        registry: &mut ChannelRegistry,
        mut flag: F,
    ) -> Result<bool>
    where
        F: FnMut(&mut crate::channel::Channel) -> &mut bool,
    {
        let group = self
            .get(group_id)
            .ok_or(ValidationError::UnknownGroup(group_id))?;
        let mut any_off = false;
        for &id in &group.channel_ids {
            if let Some(channel) = registry.get_mut(id) {
                any_off |= !*flag(channel);
            }
        }
        let value = any_off;
        for &id in &group.channel_ids {
            if let Some(channel) = registry.get_mut(id) {
                *flag(channel) = value;
            }
        }
        Ok(value)
    }

    pub fn rename_group(&mut self, group_id: GroupId, name: impl Into<String>) -> Result<()> {
        self.require_mut(group_id)?.name = name.into();
        Ok(())
    }

    pub fn toggle_expand(&mut self, group_id: GroupId) -> Result<bool> {
        let group = self.require_mut(group_id)?;
        group.is_expanded = !group.is_expanded;
        Ok(group.is_expanded)
    }

    pub fn recolor_group(&mut self, group_id: GroupId, color: Color) -> Result<()> {
        self.require_mut(group_id)?.color = color;
        Ok(())
    }

    /// Remove a group and clear its members' back-references.
    pub fn dissolve_group(
        &mut self,
        group_id: GroupId,
        registry: &mut ChannelRegistry,
    ) -> Result<Group> {
        let index = self
            .groups
            .iter()
            .position(|g| g.id == group_id)
            .ok_or(ValidationError::UnknownGroup(group_id))?;
        let group = self.groups.remove(index);
        for &id in &group.channel_ids {
            if let Some(channel) = registry.get_mut(id) {
                channel.group_id = None;
            }
        }
        info!(group = %group_id, "Group dissolved");
        Ok(group)
    }

    /// Drop a channel from whatever group holds it. Groups left empty are
    /// removed; their ids are returned.
    pub fn detach(&mut self, channel: ChannelId) -> Vec<GroupId> {
        for group in &mut self.groups {
            group.channel_ids.retain(|&id| id != channel);
        }
        let emptied: Vec<GroupId> = self
            .groups
            .iter()
            .filter(|g| g.channel_ids.is_empty())
            .map(|g| g.id)
            .collect();
        self.groups.retain(|g| !g.channel_ids.is_empty());
        for id in &emptied {
            debug!(group = %id, "Empty group removed");
        }
        emptied
    }

    /// Make `channel` a member of `group` (or of no group), keeping both
    /// sides of the relation in step. An unknown group counts as none.
    pub fn assign(
        &mut self,
        channel: ChannelId,
        group: Option<GroupId>,
        registry: &mut ChannelRegistry,
    ) {
        let target = group.filter(|g| self.get(*g).is_some());
        let current = self.group_of(channel).map(|g| g.id);
        if current != target {
            self.detach(channel);
            if let Some(gid) = target {
                if let Ok(g) = self.require_mut(gid) {
                    g.channel_ids.push(channel);
                }
            }
        }
        if let Some(ch) = registry.get_mut(channel) {
            ch.group_id = target;
        }
    }

    /// Rebuild consistency between membership lists and back-references:
    /// unknown channels leave their groups, empty groups go, and every
    /// channel's `group_id` mirrors the membership lists.
    pub fn reconcile(&mut self, registry: &mut ChannelRegistry) -> usize {
        let mut repairs = 0;
        let mut claimed: Vec<ChannelId> = Vec::new();
        for group in &mut self.groups {
            let before = group.channel_ids.len();
            group
                .channel_ids
                .retain(|&id| registry.contains(id) && !claimed.contains(&id));
            claimed.extend(group.channel_ids.iter().copied());
            repairs += before - group.channel_ids.len();
        }
        let before = self.groups.len();
        self.groups.retain(|g| !g.channel_ids.is_empty());
        repairs += before - self.groups.len();

        let owners: Vec<(ChannelId, Option<GroupId>)> = registry
            .iter()
            .map(|c| (c.id, self.group_of(c.id).map(|g| g.id)))
            .collect();
        for (id, owner) in owners {
            if let Some(channel) = registry.get_mut(id) {
                if channel.group_id != owner {
                    channel.group_id = owner;
                    repairs += 1;
                }
            }
        }
        repairs
    }

    /// Derived summary of a group's live members.
    pub fn rollup(&self, group_id: GroupId, registry: &ChannelRegistry) -> Option<GroupRollup> {
        let group = self.get(group_id)?;
        let members: Vec<_> = group
            .channel_ids
            .iter()
            .filter_map(|&id| registry.get(id))
            .collect();
        let member_count = members.len();
        let mean_volume = if member_count == 0 {
            0.0
        } else {
            members.iter().map(|c| c.volume).sum::<f64>() / member_count as f64
        };
        Some(GroupRollup {
            member_count,
            mean_volume,
            all_muted: member_count > 0 && members.iter().all(|c| c.muted),
            any_solo: members.iter().any(|c| c.solo),
        })
    }
}
