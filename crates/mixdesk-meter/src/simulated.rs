//! Volume-driven meters with random display jitter.

use mixdesk_core::ranges::LEVEL_MAX;
use mixdesk_core::{ChannelId, MixdeskConfig};
use mixdesk_session::{MeterMode, MixerState};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashMap;

use crate::gain::stereo_gain;
use crate::source::{MeterReading, MeterSource};

/// Simulated meters: the level follows the fader and pan, muted channels
/// and channels silenced by someone else's solo read zero, and a little
/// noise keeps the display alive. Peaks are held and decay each tick.
///
/// Pre-fader metering (per channel or console-wide) reads the signal at
/// unity gain. RMS and VU modes read a sine's average level, 3 dB under
/// its peak.
#[derive(Debug)]
pub struct SimulatedMeterSource {
    rng: StdRng,
    /// Relative jitter amplitude (0..=1).
    jitter: f32,
    /// Per-tick multiplier for held peaks (0..=1).
    peak_decay: f32,
    peaks: HashMap<ChannelId, f32>,
}

impl SimulatedMeterSource {
    pub fn new(jitter: f32, peak_decay: f32) -> Self {
        Self::with_rng(StdRng::from_os_rng(), jitter, peak_decay)
    }

    /// Deterministic source for tests and replays.
    pub fn seeded(seed: u64, jitter: f32, peak_decay: f32) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed), jitter, peak_decay)
    }

    pub fn from_config(config: &MixdeskConfig) -> Self {
        Self::new(config.meter_jitter, config.peak_decay)
    }

    fn with_rng(rng: StdRng, jitter: f32, peak_decay: f32) -> Self {
        Self {
            rng,
            jitter: jitter.clamp(0.0, 1.0),
            peak_decay: peak_decay.clamp(0.0, 1.0),
            peaks: HashMap::new(),
        }
    }

    fn wobble(&mut self, value: f32) -> f32 {
        if value == 0.0 || self.jitter == 0.0 {
            return value;
        }
        let factor = 1.0 + self.rng.random_range(-self.jitter..=self.jitter);
        (value * factor).clamp(0.0, 1.0)
    }
}

fn ballistics(mode: MeterMode) -> f32 {
    match mode {
        MeterMode::Peak => 1.0,
        MeterMode::Rms | MeterMode::Vu => std::f32::consts::FRAC_1_SQRT_2,
    }
}

impl MeterSource for SimulatedMeterSource {
    fn read(&mut self, state: &MixerState) -> Vec<MeterReading> {
        let registry = &state.channels;
        let mut readings = Vec::with_capacity(registry.len());
        for channel in registry {
            let mode = channel.effective_meter_mode(state.view.meter_mode);
            let pre_fader = channel.prefader_metering || state.view.prefader_metering;
            let (left, right) = if registry.is_audible(channel) {
                let level = if pre_fader { LEVEL_MAX } else { channel.volume };
                let (l, r) = stereo_gain(level, channel.pan);
                let scale = ballistics(mode);
                (self.wobble(l * scale), self.wobble(r * scale))
            } else {
                (0.0, 0.0)
            };
            let held = self.peaks.get(&channel.id).copied().unwrap_or(0.0) * self.peak_decay;
            let peak = held.max(left).max(right);
            self.peaks.insert(channel.id, peak);
            readings.push(MeterReading {
                channel_id: channel.id,
                left,
                right,
                peak,
                mode,
                pre_fader,
            });
        }
        self.peaks.retain(|id, _| registry.contains(*id));
        readings
    }
}
