//! The meter capability.

use mixdesk_core::ChannelId;
use mixdesk_session::{MeterMode, MixerState};

/// One channel's meter values, each in 0..=1.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeterReading {
    pub channel_id: ChannelId,
    pub left: f32,
    pub right: f32,
    /// Held peak, decaying over time.
    pub peak: f32,
    /// Ballistics the levels were computed with.
    pub mode: MeterMode,
    /// Taken before the fader.
    pub pre_fader: bool,
}

impl MeterReading {
    pub fn is_silent(&self) -> bool {
        self.left == 0.0 && self.right == 0.0
    }
}

/// Readings for every channel at one tick.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeterFrame {
    pub tick: u64,
    pub readings: Vec<MeterReading>,
}

impl MeterFrame {
    pub fn get(&self, channel: ChannelId) -> Option<&MeterReading> {
        self.readings.iter().find(|r| r.channel_id == channel)
    }
}

/// Something that can produce meter readings for a console state.
///
/// Implementations get read-only access to the state; a real analysis feed
/// can replace the simulated one without touching the session.
pub trait MeterSource: Send {
    /// Readings for every channel of `state`, in channel order.
    fn read(&mut self, state: &MixerState) -> Vec<MeterReading>;
}
