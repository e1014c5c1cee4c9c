//! Send routing between channels.
//!
//! Sends are stored on the source channel, ordered, and addressed by index.
//! Valid targets are bus, fx and master channels. A send that would let the
//! signal flow back into its own source is refused.

use mixdesk_core::{ChannelId, Result, ValidationError};
use std::collections::HashSet;
use tracing::{debug, info};

use crate::channel::{ChannelSend, SendPatch};
use crate::registry::ChannelRegistry;

impl ChannelRegistry {
    /// Append a send from `channel_id` to `target_id` at level 0, post-fader.
    ///
    /// Returns the index of the new send.
    pub fn add_send(&mut self, channel_id: ChannelId, target_id: ChannelId) -> Result<usize> {
        let source = self
            .get(channel_id)
            .ok_or(ValidationError::UnknownChannel(channel_id))?;
        let target = self
            .get(target_id)
            .ok_or(ValidationError::UnknownChannel(target_id))?;

        if channel_id == target_id {
            return Err(ValidationError::SelfSend.into());
        }
        if !source.kind().has_sends() {
            return Err(ValidationError::SendsUnsupported {
                kind: source.kind().to_string(),
            }
            .into());
        }
        if !target.kind().accepts_sends() {
            return Err(ValidationError::InvalidSendTarget {
                target: target_id,
                kind: target.kind().to_string(),
            }
            .into());
        }
        if source.sends_to(target_id) {
            return Err(ValidationError::DuplicateSend {
                channel: channel_id,
                target: target_id,
            }
            .into());
        }
        if self.routes_to(target_id, channel_id) {
            return Err(ValidationError::RoutingCycle {
                channel: channel_id,
                target: target_id,
            }
            .into());
        }

        let send = ChannelSend {
            target: target.name.clone(),
            target_id,
            level: 0.0,
            pre_fader: false,
        };
        let sends = self
            .require_mut(channel_id)?
            .sends_mut()
            .ok_or_else(|| mixdesk_core::MixdeskError::Internal("send list vanished".into()))?;
        sends.push(send);
        let index = sends.len() - 1;
        info!(channel = %channel_id, target = %target_id, index, "Send added");
        Ok(index)
    }

    /// Update the send at `index`. Returns false for an unknown channel or an
    /// out-of-range index.
    pub fn update_send(&mut self, channel_id: ChannelId, index: usize, patch: &SendPatch) -> bool {
        match self
            .get_mut(channel_id)
            .and_then(|c| c.sends_mut())
            .and_then(|sends| sends.get_mut(index))
        {
            Some(send) => {
                patch.apply(send);
                true
            }
            None => {
                debug!(channel = %channel_id, index, "Update for unknown send ignored");
                false
            }
        }
    }

    /// Remove the send at `index`, if there is one.
    pub fn remove_send(&mut self, channel_id: ChannelId, index: usize) -> Option<ChannelSend> {
        let sends = self.get_mut(channel_id)?.sends_mut()?;
        if index < sends.len() {
            let removed = sends.remove(index);
            debug!(channel = %channel_id, index, "Send removed");
            Some(removed)
        } else {
            None
        }
    }

    /// Remove every send pointing at `target_id`. Returns how many went.
    pub fn strip_sends_to(&mut self, target_id: ChannelId) -> usize {
        let mut stripped = 0;
        for channel in self.channels_mut() {
            if let Some(sends) = channel.sends_mut() {
                let before = sends.len();
                sends.retain(|s| s.target_id != target_id);
                stripped += before - sends.len();
            }
        }
        stripped
    }

    /// Remove sends whose target no longer exists or can no longer receive
    /// sends. Returns how many went.
    pub fn strip_dangling_sends(&mut self) -> usize {
        let valid: HashSet<ChannelId> = self
            .iter()
            .filter(|c| c.kind().accepts_sends())
            .map(|c| c.id)
            .collect();
        let mut stripped = 0;
        for channel in self.channels_mut() {
            let own_id = channel.id;
            if let Some(sends) = channel.sends_mut() {
                let before = sends.len();
                let mut seen = HashSet::new();
                sends.retain(|s| {
                    valid.contains(&s.target_id)
                        && s.target_id != own_id
                        && seen.insert(s.target_id)
                });
                stripped += before - sends.len();
            }
        }
        stripped
    }

    /// Keep the display label of sends in step with their target's name.
    pub fn refresh_send_labels(&mut self, target_id: ChannelId, name: &str) {
        for channel in self.channels_mut() {
            if let Some(sends) = channel.sends_mut() {
                for send in sends.iter_mut().filter(|s| s.target_id == target_id) {
                    send.target = name.to_string();
                }
            }
        }
    }

    /// Whether signal from `from` reaches `to` by following sends.
    pub fn routes_to(&self, from: ChannelId, to: ChannelId) -> bool {
        let mut stack = vec![from];
        let mut visited = HashSet::new();
        while let Some(current) = stack.pop() {
            if current == to {
                return true;
            }
            if !visited.insert(current) {
                continue;
            }
            if let Some(channel) = self.get(current) {
                stack.extend(channel.sends().iter().map(|s| s.target_id));
            }
        }
        false
    }

    /// Channels that `channel_id` could add a send to right now.
    pub fn send_candidates(&self, channel_id: ChannelId) -> Vec<ChannelId> {
        let Some(source) = self.get(channel_id) else {
            return Vec::new();
        };
        if !source.kind().has_sends() {
            return Vec::new();
        }
        self.iter()
            .filter(|c| c.kind().accepts_sends())
            .filter(|c| c.id != channel_id && !source.sends_to(c.id))
            .filter(|c| !self.routes_to(c.id, channel_id))
            .map(|c| c.id)
            .collect()
    }
}
