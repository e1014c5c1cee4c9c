//! Mixdesk Meter - Display meters
//!
//! Meters are ephemeral display data derived from the console state. They
//! read channel volume, pan, mute, solo and the metering flags; nothing
//! here writes back into the session.
//!
//! Architecture:
//! - `MeterSource`: capability that turns a state into per-channel readings
//! - `SimulatedMeterSource`: volume-driven readings with display jitter
//! - `MeterTicker`: fixed-interval task publishing `MeterFrame`s

pub mod gain;
pub mod simulated;
pub mod source;
pub mod ticker;

pub use gain::stereo_gain;
pub use simulated::SimulatedMeterSource;
pub use source::{MeterFrame, MeterReading, MeterSource};
pub use ticker::MeterTicker;
