//! RGB colour keys used by centre-pixel rules.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{Result, TileError};

/// An opaque RGB triplet compared by exact equality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Take the RGB channels of an RGBA pixel, ignoring alpha.
    pub const fn from_rgba(px: [u8; 4]) -> Self {
        Self::new(px[0], px[1], px[2])
    }

    /// Parse a colour key.
    ///
    /// Supports formats:
    /// - `#RGB` (3 digits, expanded to 6)
    /// - `#RRGGBB` (6 digits)
    /// - `rgb(r,g,b)` with decimal channels
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();

        if let Some(inner) = s.strip_prefix("rgb(").and_then(|rest| rest.strip_suffix(')')) {
            let channels: Vec<&str> = inner.split(',').map(str::trim).collect();
            if channels.len() != 3 {
                return Err(invalid(s));
            }
            let r = channels[0].parse::<u8>().map_err(|_| invalid(s))?;
            let g = channels[1].parse::<u8>().map_err(|_| invalid(s))?;
            let b = channels[2].parse::<u8>().map_err(|_| invalid(s))?;
            return Ok(Self::new(r, g, b));
        }

        let hex = s.strip_prefix('#').unwrap_or(s);
        if !hex.is_ascii() {
            return Err(invalid(s));
        }
        match hex.len() {
            3 => {
                let digit = |i: usize| u8::from_str_radix(&hex[i..i + 1], 16).map_err(|_| invalid(s));
                let (r, g, b) = (digit(0)?, digit(1)?, digit(2)?);
                Ok(Self::new(r << 4 | r, g << 4 | g, b << 4 | b))
            }
            6 => {
                let byte = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| invalid(s));
                Ok(Self::new(byte(0)?, byte(2)?, byte(4)?))
            }
            _ => Err(invalid(s)),
        }
    }
}

fn invalid(s: &str) -> TileError {
    TileError::Parse {
        message: format!("Invalid colour: {}", s),
        help: Some("Use #RGB, #RRGGBB, or rgb(r,g,b) format".to_string()),
    }
}

impl FromStr for Rgb {
    type Err = TileError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

impl Serialize for Rgb {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Rgb {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Rgb::parse(&s).map_err(serde::de::Error::custom)
    }
}
