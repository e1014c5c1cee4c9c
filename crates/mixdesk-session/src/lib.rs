//! Mixdesk Session - Console state model
//!
//! Implements the state core of the mixing console:
//! - Channel registry with typed channel variants
//! - Send routing between channels
//! - Channel groups with cascading volume/mute/solo
//! - Percentage splits between collaborating personas
//! - Snapshot capture and recall
//! - A reducer-style session with undo/redo and versioned persistence

pub mod channel;
pub mod group;
pub mod history;
pub mod persona;
pub mod registry;
pub mod routing;
pub mod serialization;
pub mod session;
pub mod snapshot;
pub mod split;
pub mod state;

pub use channel::{
    AutomationMode, Channel, ChannelKind, ChannelPatch, ChannelRole, ChannelSend, MeterMode,
    SendPatch,
};
pub use group::{Group, GroupManager, GroupRollup};
pub use history::UndoStack;
pub use persona::{Persona, PersonaDirectory, PersonaRef, PersonaType, StaticDirectory};
pub use registry::ChannelRegistry;
pub use serialization::{MixerDocument, MixerFile};
pub use session::Session;
pub use snapshot::{ChannelState, RecallReport, Snapshot, SnapshotBook};
pub use split::{SplitEntry, SplitMember, SplitRecord, SplitTable};
pub use state::{Applied, MixerAction, MixerState, ViewState};
