//! Display colors for channels and groups.
//!
//! Colors are stored as 8-bit RGB and serialized as `#rrggbb` strings.
//! `#rgb` shorthand is accepted on input.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use tracing::debug;

/// An sRGB display color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    /// Create a color from 8-bit components.
    #[inline]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse `#rrggbb` or `#rgb`, with or without the `#`, in either case.
    pub fn from_hex(s: &str) -> Option<Self> {
        let s = s.trim();
        let hex = s.strip_prefix('#').unwrap_or(s);
        if !hex.is_ascii() {
            return None;
        }
        match hex.len() {
            6 => {
                let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
                Some(Self::rgb(channel(0)?, channel(2)?, channel(4)?))
            }
            3 => {
                let channel =
                    |i: usize| u8::from_str_radix(&hex[i..i + 1], 16).ok().map(|v| v * 17);
                Some(Self::rgb(channel(0)?, channel(1)?, channel(2)?))
            }
            _ => None,
        }
    }

    /// Deserializer for stored colors that never fails the surrounding
    /// document: anything unparseable becomes [`Color::FALLBACK`].
    pub fn deserialize_lenient<'de, D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = serde_json::Value::deserialize(deserializer)?;
        let parsed = value.as_str().and_then(Self::from_hex);
        Ok(parsed.unwrap_or_else(|| {
            debug!(color = %value, "Unreadable stored color replaced");
            Self::FALLBACK
        }))
    }

    /// Format as `#rrggbb`.
    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    // Default channel colors
    pub const MASTER: Self = Self::rgb(0xe5, 0x48, 0x4d);
    pub const BUS: Self = Self::rgb(0x8e, 0x4e, 0xc6);
    pub const AUDIO: Self = Self::rgb(0x3e, 0x9b, 0xff);
    pub const INSTRUMENT: Self = Self::rgb(0x30, 0xa4, 0x6c);
    pub const FX: Self = Self::rgb(0xf5, 0xa5, 0x24);
    pub const INPUT: Self = Self::rgb(0x8b, 0x8d, 0x98);
    /// Neutral grey for stored colors that could not be read.
    pub const FALLBACK: Self = Self::INPUT;

    /// Rotation used when a new group is created.
    pub const GROUP_PALETTE: [Self; 6] = [
        Self::rgb(0x4a, 0x9e, 0xff),
        Self::rgb(0xff, 0x6b, 0x6b),
        Self::rgb(0x51, 0xcf, 0x66),
        Self::rgb(0xfc, 0xc4, 0x19),
        Self::rgb(0xcc, 0x5d, 0xe8),
        Self::rgb(0x22, 0xb8, 0xcf),
    ];

    /// Palette color for the `n`th group.
    pub fn group_default(n: usize) -> Self {
        Self::GROUP_PALETTE[n % Self::GROUP_PALETTE.len()]
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl Serialize for Color {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Color {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid color '{s}'")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_roundtrip() {
        let c = Color::rgb(0x12, 0xab, 0xff);
        assert_eq!(c.to_hex(), "#12abff");
        assert_eq!(Color::from_hex("#12abff"), Some(c));
        assert_eq!(Color::from_hex("12ABFF"), Some(c));
    }

    #[test]
    fn test_hex_rejects_garbage() {
        assert_eq!(Color::from_hex("#12ab"), None);
        assert_eq!(Color::from_hex(""), None);
        assert_eq!(Color::from_hex("#zzzzzz"), None);
        assert_eq!(Color::from_hex("#ééé"), None);
    }

    #[test]
    fn test_serde_as_string() {
        let json = serde_json::to_string(&Color::FX).unwrap();
        assert_eq!(json, "\"#f5a524\"");
        assert!(serde_json::from_str::<Color>("\"nope\"").is_err());
    }

    #[test]
    fn test_group_palette_wraps() {
        assert_eq!(Color::group_default(0), Color::group_default(6));
    }

    #[test]
    fn test_shorthand_hex() {
        assert_eq!(Color::from_hex("#f80"), Some(Color::rgb(0xff, 0x88, 0x00)));
        assert_eq!(Color::from_hex("ABC"), Some(Color::rgb(0xaa, 0xbb, 0xcc)));
    }

    #[derive(Deserialize)]
    struct Painted {
        #[serde(deserialize_with = "Color::deserialize_lenient")]
        color: Color,
    }

    #[test]
    fn test_lenient_color_falls_back() {
        let ok: Painted = serde_json::from_str(r##"{ "color": "#FFF" }"##).unwrap();
        assert_eq!(ok.color, Color::rgb(255, 255, 255));
        let bad: Painted = serde_json::from_str(r#"{ "color": "teal" }"#).unwrap();
        assert_eq!(bad.color, Color::FALLBACK);
        let odd: Painted = serde_json::from_str(r#"{ "color": 42 }"#).unwrap();
        assert_eq!(odd.color, Color::FALLBACK);
    }
}
