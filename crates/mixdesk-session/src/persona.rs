//! Collaborator personas and which channels they may be assigned to.
//!
//! Persona profiles live in an external directory. The console only keeps a
//! weak reference (id, name, avatar) on the channel, plus the compatibility
//! matrix between channel kinds and persona types.

use mixdesk_core::{OwnerId, PersonaId};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::channel::ChannelKind;
use crate::split::SplitMember;

/// Weak reference to a persona, stored on a channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonaRef {
    pub id: PersonaId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

/// Role a persona plays in a production.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PersonaType {
    Mastering,
    Mixer,
    AudioEngineer,
    Mix,
    Producer,
    Instrumentalist,
    Composer,
    Dj,
    Arranger,
    /// Any other role (vocalist, songwriter, ...), kept verbatim.
    Other(String),
}

impl PersonaType {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Mastering => "mastering",
            Self::Mixer => "mixer",
            Self::AudioEngineer => "audio-engineer",
            Self::Mix => "mix",
            Self::Producer => "producer",
            Self::Instrumentalist => "instrumentalist",
            Self::Composer => "composer",
            Self::Dj => "dj",
            Self::Arranger => "arranger",
            Self::Other(s) => s,
        }
    }

    fn is_master_type(&self) -> bool {
        matches!(self, Self::Mastering | Self::Mixer | Self::AudioEngineer)
    }

    fn is_bus_type(&self) -> bool {
        matches!(
            self,
            Self::Mix | Self::Mixer | Self::Producer | Self::AudioEngineer
        )
    }

    fn is_instrument_type(&self) -> bool {
        matches!(
            self,
            Self::Instrumentalist | Self::Composer | Self::Dj | Self::Arranger
        )
    }
}

impl From<String> for PersonaType {
    fn from(s: String) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "mastering" => Self::Mastering,
            "mixer" => Self::Mixer,
            "audio-engineer" | "audio_engineer" => Self::AudioEngineer,
            "mix" => Self::Mix,
            "producer" => Self::Producer,
            "instrumentalist" => Self::Instrumentalist,
            "composer" => Self::Composer,
            "dj" => Self::Dj,
            "arranger" => Self::Arranger,
            _ => Self::Other(s),
        }
    }
}

impl From<&str> for PersonaType {
    fn from(s: &str) -> Self {
        Self::from(s.to_string())
    }
}

impl From<PersonaType> for String {
    fn from(t: PersonaType) -> Self {
        t.as_str().to_string()
    }
}

impl fmt::Display for PersonaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether a persona of `persona_type` may be assigned to a `kind` channel.
///
/// Audio, fx and input channels accept every type that none of the master,
/// bus or instrument rules claim.
pub fn accepts(kind: ChannelKind, persona_type: &PersonaType) -> bool {
    match kind {
        ChannelKind::Master => persona_type.is_master_type(),
        ChannelKind::Bus => persona_type.is_bus_type(),
        ChannelKind::Instrument => persona_type.is_instrument_type(),
        ChannelKind::Audio | ChannelKind::Fx | ChannelKind::Input => {
            !persona_type.is_master_type()
                && !persona_type.is_bus_type()
                && !persona_type.is_instrument_type()
        }
    }
}

/// A persona profile as supplied by the directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Persona {
    pub id: PersonaId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    #[serde(rename = "type")]
    pub persona_type: PersonaType,
    pub owner_id: OwnerId,
}

impl Persona {
    /// Reference to store on a channel.
    pub fn to_ref(&self) -> PersonaRef {
        PersonaRef {
            id: self.id.clone(),
            name: self.name.clone(),
            avatar: self.avatar.clone(),
        }
    }

    /// Membership record for the percentage split table.
    pub fn split_member(&self) -> SplitMember {
        SplitMember {
            persona_id: self.id.clone(),
            owner_id: self.owner_id.clone(),
        }
    }

    pub fn fits(&self, kind: ChannelKind) -> bool {
        accepts(kind, &self.persona_type)
    }
}

/// Source of candidate personas.
pub trait PersonaDirectory {
    /// Every persona available to this session.
    fn personas(&self) -> Vec<Persona>;

    /// Personas that may be assigned to a channel of `kind`.
    fn candidates_for(&self, kind: ChannelKind) -> Vec<Persona> {
        self.personas().into_iter().filter(|p| p.fits(kind)).collect()
    }

    fn find(&self, id: &PersonaId) -> Option<Persona> {
        self.personas().into_iter().find(|p| &p.id == id)
    }
}

/// A fixed in-memory directory.
#[derive(Debug, Clone, Default)]
pub struct StaticDirectory {
    personas: Vec<Persona>,
}

impl StaticDirectory {
    pub fn new(personas: Vec<Persona>) -> Self {
        Self { personas }
    }
}

impl PersonaDirectory for StaticDirectory {
    fn personas(&self) -> Vec<Persona> {
        self.personas.clone()
    }
}
