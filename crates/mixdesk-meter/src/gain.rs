//! Level and pan to stereo gain.

use mixdesk_core::ranges::{LEVEL_MAX, PAN_MAX};

/// Left/right gain in 0..=1 for a fader level (0..=100) and pan
/// position (-50..=50), using constant-power panning.
pub fn stereo_gain(volume: f64, pan: f64) -> (f32, f32) {
    let level = (volume / LEVEL_MAX).clamp(0.0, 1.0) as f32;
    let pan = (pan / PAN_MAX).clamp(-1.0, 1.0) as f32;
    let angle = (pan + 1.0) * 0.25 * std::f32::consts::PI;
    (level * angle.cos(), level * angle.sin())
}
