use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ColorError {
    #[error("invalid hex color '{0}'; expected #RGB or #RRGGBB")]
    InvalidHex(String),
}

/// Channel triplet parsed from a hex code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parses `#RGB` or `#RRGGBB` (any case). The leading `#` is required.
    pub fn parse_hex(value: &str) -> Result<Self, ColorError> {
        let invalid = || ColorError::InvalidHex(value.trim().to_string());
        let raw = value.trim();
        let body = raw.strip_prefix('#').ok_or_else(invalid)?;
        if !body.chars().all(|ch| ch.is_ascii_hexdigit()) {
            return Err(invalid());
        }
        let expanded = match body.len() {
            3 => body.chars().flat_map(|ch| [ch, ch]).collect::<String>(),
            6 => body.to_string(),
            _ => return Err(invalid()),
        };
        let channel = |idx: usize| {
            u8::from_str_radix(&expanded[idx..idx + 2], 16).map_err(|_| invalid())
        };
        Ok(Self {
            r: channel(0)?,
            g: channel(2)?,
            b: channel(4)?,
        })
    }

    pub fn to_hex(self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }

    pub fn css(self) -> String {
        format!("rgb({}, {}, {})", self.r, self.g, self.b)
    }

    /// `0.299R + 0.587G + 0.114B`, scaled by 1000 so comparisons stay exact.
    pub fn luminance_milli(self) -> u32 {
        299 * u32::from(self.r) + 587 * u32::from(self.g) + 114 * u32::from(self.b)
    }

    pub fn luminance(self) -> f64 {
        f64::from(self.luminance_milli()) / 1000.0
    }
}

/// A named palette entry. `hex` is normalized to uppercase `#RRGGBB` and the
/// css `rgb(...)` form is always derived from it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "ColorRecord", into = "ColorRecord")]
pub struct Color {
    hex: String,
    name: String,
    channels: Rgb,
}

impl Color {
    pub fn new(hex: &str, name: impl Into<String>) -> Result<Self, ColorError> {
        let channels = Rgb::parse_hex(hex)?;
        Ok(Self::from_rgb(channels, name))
    }

    /// Blank names are replaced by a coarse description of the channels.
    pub fn from_rgb(channels: Rgb, name: impl Into<String>) -> Self {
        let name = name.into().trim().to_string();
        let name = if name.is_empty() {
            describe_channels(channels).to_string()
        } else {
            name
        };
        Self {
            hex: channels.to_hex(),
            name,
            channels,
        }
    }

    pub fn hex(&self) -> &str {
        &self.hex
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn rgb(&self) -> String {
        self.channels.css()
    }

    pub fn channels(&self) -> Rgb {
        self.channels
    }

    pub fn luminance(&self) -> f64 {
        self.channels.luminance()
    }

    pub fn with_hex(&self, hex: &str) -> Result<Self, ColorError> {
        let channels = Rgb::parse_hex(hex)?;
        Ok(Self {
            hex: channels.to_hex(),
            name: self.name.clone(),
            channels,
        })
    }

    pub fn with_name(&self, name: impl Into<String>) -> Self {
        Self::from_rgb(self.channels, name)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.hex)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ColorRecord {
    hex: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    rgb: Option<String>,
}

impl TryFrom<ColorRecord> for Color {
    type Error = ColorError;

    fn try_from(record: ColorRecord) -> Result<Self, Self::Error> {
        // A supplied `rgb` is advisory only; the hex code is authoritative.
        Color::new(&record.hex, record.name)
    }
}

impl From<Color> for ColorRecord {
    fn from(color: Color) -> Self {
        let rgb = Some(color.rgb());
        Self {
            hex: color.hex,
            name: color.name,
            rgb,
        }
    }
}

/// Formats the css `rgb(r, g, b)` form of a hex code.
pub fn rgb_of(hex: &str) -> Result<String, ColorError> {
    Rgb::parse_hex(hex).map(Rgb::css)
}

pub fn describe_channels(channels: Rgb) -> &'static str {
    let (r, g, b) = (
        f64::from(channels.r),
        f64::from(channels.g),
        f64::from(channels.b),
    );
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let brightness = ((r + g + b) / (255.0 * 3.0)).clamp(0.0, 1.0);
    if max - min < 18.0 {
        if brightness > 0.78 {
            return "soft neutral";
        }
        if brightness < 0.22 {
            return "deep neutral";
        }
        return "muted neutral";
    }
    if max == r && g > b && g * 2.0 >= r {
        "warm orange"
    } else if max == r {
        "crimson red"
    } else if max == g && b > r {
        "teal green"
    } else if max == g {
        "organic green"
    } else if max == b && r > g {
        "violet blue"
    } else {
        "cool blue"
    }
}
