//! Mixdesk Core - Foundation types for the mixing console
//!
//! This crate provides the types shared by every other mixdesk crate:
//! - Stable identifiers (ChannelId, GroupId, SnapshotId, PersonaId, OwnerId)
//! - The error taxonomy (validation, persistence, deserialization)
//! - User-facing notices for non-fatal failures
//! - Channel and group colors
//! - Application configuration

pub mod color;
pub mod config;
pub mod error;
pub mod id;
pub mod notice;

pub use color::Color;
pub use config::MixdeskConfig;
pub use error::{ErrorCategory, MixdeskError, Result, ValidationError};
pub use id::{ChannelId, GroupId, OwnerId, PersonaId, ProjectId, SnapshotId};
pub use notice::{Notice, NoticeQueue, Severity};

/// Value ranges shared across the console model.
pub mod ranges {
    /// Minimum channel or send level.
    pub const LEVEL_MIN: f64 = 0.0;

    /// Maximum channel or send level.
    pub const LEVEL_MAX: f64 = 100.0;

    /// Hard-left pan position.
    pub const PAN_MIN: f64 = -50.0;

    /// Hard-right pan position.
    pub const PAN_MAX: f64 = 50.0;

    /// Allowed drift of a split total away from 100.
    pub const SPLIT_TOLERANCE: f64 = 0.01;
}
