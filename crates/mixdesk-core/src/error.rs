//! Error types for Mixdesk.

use crate::id::{ChannelId, GroupId, PersonaId};
use thiserror::Error;

/// A mutation that was rejected before touching any state.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Channel {channel} already sends to {target}")]
    DuplicateSend { channel: ChannelId, target: ChannelId },

    #[error("Channel {target} is a {kind} channel and cannot receive sends")]
    InvalidSendTarget { target: ChannelId, kind: String },

    #[error("A channel cannot send to itself")]
    SelfSend,

    #[error("Send from {channel} to {target} would create a routing cycle")]
    RoutingCycle { channel: ChannelId, target: ChannelId },

    #[error("{kind} channels have no sends")]
    SendsUnsupported { kind: String },

    #[error("A group needs at least 2 channels, got {count}")]
    GroupTooSmall { count: usize },

    #[error("{kind} channels cannot be {action}")]
    ProtectedChannel { kind: String, action: &'static str },

    #[error("Channel {channel} cannot be moved to index {index}")]
    InvalidReorder { channel: ChannelId, index: usize },

    #[error("Percentage {value} is outside 0..=100")]
    PercentageOutOfRange { value: f64 },

    #[error("Percentage {value} exceeds the owner's combined share of {available}")]
    PercentageExceedsOwnerShare { value: f64, available: f64 },

    #[error("Percentages cannot be edited while auto-split is on")]
    AutoSplitActive,

    #[error("Persona {persona} has no sibling personas to absorb the change")]
    NoSiblings { persona: PersonaId },

    #[error("Channel not found: {0}")]
    UnknownChannel(ChannelId),

    #[error("Group not found: {0}")]
    UnknownGroup(GroupId),

    #[error("Snapshot not found: {0}")]
    UnknownSnapshot(String),

    #[error("Persona not found: {0}")]
    UnknownPersona(PersonaId),
}

impl ValidationError {
    /// Rejections the user never sees a notice for (an invalid drag just
    /// snaps back).
    pub fn is_silent(&self) -> bool {
        matches!(self, Self::InvalidReorder { .. })
    }
}

/// Main error type for Mixdesk operations.
#[derive(Error, Debug)]
pub enum MixdeskError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// How a failure is presented to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Rejected synchronously, nothing changed.
    Validation,
    /// The store could not be read or written; in-memory state is kept.
    Persistence,
    /// Stored data was malformed and defaults were substituted.
    Deserialization,
    /// Everything else.
    Internal,
}

impl MixdeskError {
    /// Classify this error for user-facing notification.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Validation(_) => ErrorCategory::Validation,
            Self::Io(_) | Self::Persistence(_) => ErrorCategory::Persistence,
            Self::Serialization(_) => ErrorCategory::Deserialization,
            Self::Config(_) | Self::Internal(_) => ErrorCategory::Internal,
        }
    }

    /// The validation failure, if this is one.
    pub fn as_validation(&self) -> Option<&ValidationError> {
        match self {
            Self::Validation(v) => Some(v),
            _ => None,
        }
    }
}

/// Result type alias for Mixdesk operations.
pub type Result<T> = std::result::Result<T, MixdeskError>;
