//! Channel types.
//!
//! A channel is a routable node of the console. Which fields exist depends on
//! the channel kind: only bus, audio, instrument and fx channels carry sends,
//! so the master and input variants have no `sends` field at all.

use mixdesk_core::ranges::{LEVEL_MAX, LEVEL_MIN, PAN_MAX, PAN_MIN};
use mixdesk_core::{ChannelId, Color, GroupId};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::persona::PersonaRef;

/// Kind of channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelKind {
    Master,
    Bus,
    Audio,
    Instrument,
    Fx,
    Input,
}

impl ChannelKind {
    pub const ALL: [ChannelKind; 6] = [
        Self::Master,
        Self::Bus,
        Self::Audio,
        Self::Instrument,
        Self::Fx,
        Self::Input,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Master => "master",
            Self::Bus => "bus",
            Self::Audio => "audio",
            Self::Instrument => "instrument",
            Self::Fx => "fx",
            Self::Input => "input",
        }
    }

    /// Whether channels of this kind own a send list.
    pub fn has_sends(self) -> bool {
        matches!(self, Self::Bus | Self::Audio | Self::Instrument | Self::Fx)
    }

    /// Whether channels of this kind can be the target of a send.
    pub fn accepts_sends(self) -> bool {
        matches!(self, Self::Bus | Self::Fx | Self::Master)
    }

    /// Master and bus channels cannot be deleted or duplicated.
    pub fn is_protected(self) -> bool {
        matches!(self, Self::Master | Self::Bus)
    }

    pub fn default_color(self) -> Color {
        match self {
            Self::Master => Color::MASTER,
            Self::Bus => Color::BUS,
            Self::Audio => Color::AUDIO,
            Self::Instrument => Color::INSTRUMENT,
            Self::Fx => Color::FX,
            Self::Input => Color::INPUT,
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::Master => "Master",
            Self::Bus => "Bus",
            Self::Audio => "Audio",
            Self::Instrument => "Instrument",
            Self::Fx => "FX",
            Self::Input => "Input",
        }
    }
}

impl fmt::Display for ChannelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ChannelKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|k| k.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown channel type '{s}'"))
    }
}

/// Automation playback/record mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AutomationMode {
    #[default]
    Off,
    Read,
    Write,
    Touch,
    Latch,
}

/// Meter display ballistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MeterMode {
    #[default]
    Peak,
    Rms,
    Vu,
}

/// A parallel route from one channel to another.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelSend {
    /// Display name of the target, refreshed when the target is renamed.
    pub target: String,
    pub target_id: ChannelId,
    /// Send level (0..=100).
    pub level: f64,
    pub pre_fader: bool,
}

/// Partial update for a send.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SendPatch {
    pub level: Option<f64>,
    pub pre_fader: Option<bool>,
}

impl SendPatch {
    pub fn apply(&self, send: &mut ChannelSend) {
        if let Some(level) = self.level {
            send.level = clamp_level(level);
        }
        if let Some(pre_fader) = self.pre_fader {
            send.pre_fader = pre_fader;
        }
    }
}

/// Kind-specific part of a channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ChannelRole {
    Master,
    Bus {
        #[serde(default)]
        sends: Vec<ChannelSend>,
    },
    Audio {
        #[serde(default)]
        sends: Vec<ChannelSend>,
    },
    Instrument {
        #[serde(default)]
        sends: Vec<ChannelSend>,
    },
    Fx {
        #[serde(default)]
        sends: Vec<ChannelSend>,
    },
    Input,
}

impl ChannelRole {
    /// Empty role for a channel kind.
    pub fn new(kind: ChannelKind) -> Self {
        match kind {
            ChannelKind::Master => Self::Master,
            ChannelKind::Bus => Self::Bus { sends: Vec::new() },
            ChannelKind::Audio => Self::Audio { sends: Vec::new() },
            ChannelKind::Instrument => Self::Instrument { sends: Vec::new() },
            ChannelKind::Fx => Self::Fx { sends: Vec::new() },
            ChannelKind::Input => Self::Input,
        }
    }

    pub fn kind(&self) -> ChannelKind {
        match self {
            Self::Master => ChannelKind::Master,
            Self::Bus { .. } => ChannelKind::Bus,
            Self::Audio { .. } => ChannelKind::Audio,
            Self::Instrument { .. } => ChannelKind::Instrument,
            Self::Fx { .. } => ChannelKind::Fx,
            Self::Input => ChannelKind::Input,
        }
    }

    pub fn sends(&self) -> &[ChannelSend] {
        match self {
            Self::Bus { sends }
            | Self::Audio { sends }
            | Self::Instrument { sends }
            | Self::Fx { sends } => sends,
            Self::Master | Self::Input => &[],
        }
    }

    pub fn sends_mut(&mut self) -> Option<&mut Vec<ChannelSend>> {
        match self {
            Self::Bus { sends }
            | Self::Audio { sends }
            | Self::Instrument { sends }
            | Self::Fx { sends } => Some(sends),
            Self::Master | Self::Input => None,
        }
    }
}

/// A routable node in the console.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Channel {
    pub id: ChannelId,
    /// Display ordinal within the channel's kind.
    pub number: u32,
    pub name: String,
    #[serde(flatten)]
    pub role: ChannelRole,
    /// Fader level (0..=100).
    pub volume: f64,
    /// Pan position (-50..=50).
    pub pan: f64,
    #[serde(rename = "isMuted")]
    pub muted: bool,
    #[serde(rename = "isSolo")]
    pub solo: bool,
    /// Solo-safe channels are never silenced by another channel's solo.
    #[serde(rename = "isSoloSafe", default)]
    pub solo_safe: bool,
    #[serde(deserialize_with = "Color::deserialize_lenient")]
    pub color: Color,
    #[serde(default)]
    pub automation_mode: AutomationMode,
    /// Free-form routing labels, display only.
    #[serde(default)]
    pub inputs: Vec<String>,
    #[serde(default)]
    pub outputs: Vec<String>,
    /// Back-reference to the owning group, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_id: Option<GroupId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub persona: Option<PersonaRef>,
    /// Overrides the global meter mode when set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meter_mode: Option<MeterMode>,
    #[serde(rename = "isPrefaderMetering", default)]
    pub prefader_metering: bool,
}

impl Channel {
    /// Create a channel of `kind` with that kind's defaults.
    pub fn new(kind: ChannelKind, number: u32) -> Self {
        let name = match kind {
            ChannelKind::Master => kind.label().to_string(),
            _ => format!("{} {}", kind.label(), number),
        };
        let (volume, inputs, outputs) = match kind {
            ChannelKind::Master => (80.0, Vec::new(), vec!["Main Out".to_string()]),
            ChannelKind::Bus => (75.0, Vec::new(), vec!["Master".to_string()]),
            ChannelKind::Audio => (
                75.0,
                vec![format!("Input {number}")],
                vec!["Master".to_string()],
            ),
            ChannelKind::Instrument => (75.0, vec!["MIDI".to_string()], vec!["Master".to_string()]),
            ChannelKind::Fx => (70.0, vec!["Aux".to_string()], vec!["Master".to_string()]),
            ChannelKind::Input => (
                75.0,
                vec![format!("Hardware In {number}")],
                vec!["Audio".to_string()],
            ),
        };
        Self {
            id: ChannelId::new(),
            number,
            name,
            role: ChannelRole::new(kind),
            volume,
            pan: 0.0,
            muted: false,
            solo: false,
            solo_safe: false,
            color: kind.default_color(),
            automation_mode: AutomationMode::Off,
            inputs,
            outputs,
            group_id: None,
            persona: None,
            meter_mode: None,
            prefader_metering: false,
        }
    }

    pub fn kind(&self) -> ChannelKind {
        self.role.kind()
    }

    pub fn sends(&self) -> &[ChannelSend] {
        self.role.sends()
    }

    pub fn sends_mut(&mut self) -> Option<&mut Vec<ChannelSend>> {
        self.role.sends_mut()
    }

    pub fn is_protected(&self) -> bool {
        self.kind().is_protected()
    }

    /// Whether this channel already has a send to `target`.
    pub fn sends_to(&self, target: ChannelId) -> bool {
        self.sends().iter().any(|s| s.target_id == target)
    }

    /// Meter mode in effect, given the console-wide default.
    pub fn effective_meter_mode(&self, global: MeterMode) -> MeterMode {
        self.meter_mode.unwrap_or(global)
    }

    /// Copy of this channel under a new id. Group membership is not copied.
    pub fn duplicate(&self, number: u32) -> Self {
        Self {
            id: ChannelId::new(),
            number,
            name: format!("{} (Copy)", self.name),
            group_id: None,
            ..self.clone()
        }
    }

    /// Keep volume and pan inside their ranges.
    pub fn clamp_levels(&mut self) {
        self.volume = clamp_level(self.volume);
        self.pan = clamp_pan(self.pan);
        if let Some(sends) = self.sends_mut() {
            for send in sends {
                send.level = clamp_level(send.level);
            }
        }
    }
}

/// Partial update for a channel. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChannelPatch {
    pub name: Option<String>,
    pub volume: Option<f64>,
    pub pan: Option<f64>,
    pub muted: Option<bool>,
    pub solo: Option<bool>,
    pub solo_safe: Option<bool>,
    pub color: Option<Color>,
    pub automation_mode: Option<AutomationMode>,
    pub inputs: Option<Vec<String>>,
    pub outputs: Option<Vec<String>>,
    pub persona: Option<Option<PersonaRef>>,
    pub meter_mode: Option<Option<MeterMode>>,
    pub prefader_metering: Option<bool>,
}

impl ChannelPatch {
    pub fn volume(volume: f64) -> Self {
        Self {
            volume: Some(volume),
            ..Default::default()
        }
    }

    pub fn muted(muted: bool) -> Self {
        Self {
            muted: Some(muted),
            ..Default::default()
        }
    }

    pub fn solo(solo: bool) -> Self {
        Self {
            solo: Some(solo),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Overwrite the fields present in this patch.
    pub fn apply(&self, channel: &mut Channel) {
        if let Some(name) = &self.name {
            channel.name = name.clone();
        }
        if let Some(volume) = self.volume {
            channel.volume = clamp_level(volume);
        }
        if let Some(pan) = self.pan {
            channel.pan = clamp_pan(pan);
        }
        if let Some(muted) = self.muted {
            channel.muted = muted;
        }
        if let Some(solo) = self.solo {
            channel.solo = solo;
        }
        if let Some(solo_safe) = self.solo_safe {
            channel.solo_safe = solo_safe;
        }
        if let Some(color) = self.color {
            channel.color = color;
        }
        if let Some(mode) = self.automation_mode {
            channel.automation_mode = mode;
        }
        if let Some(inputs) = &self.inputs {
            channel.inputs = inputs.clone();
        }
        if let Some(outputs) = &self.outputs {
            channel.outputs = outputs.clone();
        }
        if let Some(persona) = &self.persona {
            channel.persona = persona.clone();
        }
        if let Some(mode) = self.meter_mode {
            channel.meter_mode = mode;
        }
        if let Some(prefader) = self.prefader_metering {
            channel.prefader_metering = prefader;
        }
    }
}

/// Clamp a fader or send level into 0..=100. NaN becomes 0.
pub fn clamp_level(value: f64) -> f64 {
    if value.is_nan() {
        LEVEL_MIN
    } else {
        value.clamp(LEVEL_MIN, LEVEL_MAX)
    }
}

/// Clamp a pan position into -50..=50. NaN becomes center.
pub fn clamp_pan(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(PAN_MIN, PAN_MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_factory_defaults_per_kind() {
        let mut master = Channel::new(ChannelKind::Master, 1);
        assert_eq!(master.name, "Master");
        assert!(master.sends_mut().is_none());

        let fx = Channel::new(ChannelKind::Fx, 2);
        assert_eq!(fx.name, "FX 2");
        assert_eq!(fx.kind(), ChannelKind::Fx);
        assert!(fx.sends().is_empty());
        assert_eq!(fx.color, Color::FX);

        let input = Channel::new(ChannelKind::Input, 1);
        assert!(input.sends().is_empty());
        assert_eq!(input.inputs, vec!["Hardware In 1".to_string()]);
    }

    #[test]
    fn test_only_routing_kinds_have_sends() {
        for kind in ChannelKind::ALL {
            let mut ch = Channel::new(kind, 1);
            assert_eq!(ch.sends_mut().is_some(), kind.has_sends(), "{kind}");
        }
    }

    #[test]
    fn test_patch_clamps() {
        let mut ch = Channel::new(ChannelKind::Audio, 1);
        let patch = ChannelPatch {
            volume: Some(140.0),
            pan: Some(-80.0),
            ..Default::default()
        };
        patch.apply(&mut ch);
        assert_eq!(ch.volume, 100.0);
        assert_eq!(ch.pan, -50.0);
    }

    #[test]
    fn test_patch_leaves_absent_fields() {
        let mut ch = Channel::new(ChannelKind::Audio, 1);
        ch.solo = true;
        ChannelPatch::muted(true).apply(&mut ch);
        assert!(ch.muted);
        assert!(ch.solo);
        assert_eq!(ch.name, "Audio 1");
    }

    #[test]
    fn test_duplicate_gets_new_id_and_copy_suffix() {
        let mut ch = Channel::new(ChannelKind::Audio, 1);
        ch.group_id = Some(GroupId::new());
        let copy = ch.duplicate(2);
        assert_ne!(copy.id, ch.id);
        assert_eq!(copy.name, "Audio 1 (Copy)");
        assert_eq!(copy.number, 2);
        assert!(copy.group_id.is_none());
    }

    #[test]
    fn test_serde_shape() {
        let mut ch = Channel::new(ChannelKind::Bus, 1);
        ch.muted = true;
        let json = serde_json::to_value(&ch).unwrap();
        assert_eq!(json["type"], "bus");
        assert_eq!(json["isMuted"], true);
        assert_eq!(json["automationMode"], "off");
        assert!(json["sends"].as_array().unwrap().is_empty());
        assert!(json.get("groupId").is_none());

        let master = serde_json::to_value(Channel::new(ChannelKind::Master, 1)).unwrap();
        assert_eq!(master["type"], "master");
        assert!(master.get("sends").is_none());
    }

    #[test]
    fn test_serde_roundtrip_with_sends() {
        let mut ch = Channel::new(ChannelKind::Audio, 3);
        ch.sends_mut().unwrap().push(ChannelSend {
            target: "Bus 1".into(),
            target_id: ChannelId::new(),
            level: 42.5,
            pre_fader: true,
        });
        ch.meter_mode = Some(MeterMode::Rms);
        let json = serde_json::to_string(&ch).unwrap();
        let back: Channel = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ch);
    }

    #[test]
    fn test_kind_from_str() {
        assert_eq!("FX".parse::<ChannelKind>(), Ok(ChannelKind::Fx));
        assert!("synth".parse::<ChannelKind>().is_err());
    }

    #[test]
    fn test_clamp_nan() {
        assert_eq!(clamp_level(f64::NAN), 0.0);
        assert_eq!(clamp_pan(f64::NAN), 0.0);
    }
}
