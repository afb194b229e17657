//! Role assignment for previewing a palette as a site theme.
//!
//! Roles are picked purely by brightness rank. Thresholds are fixed constants,
//! not a contrast-ratio computation.

use serde::Serialize;

use crate::color::{Color, Rgb};

pub const DARK_TEXT: &str = "#000000";
pub const LIGHT_TEXT: &str = "#FFFFFF";

/// Backgrounds brighter than this (x1000) take dark text.
const CONTRAST_THRESHOLD_MILLI: u32 = 160_000;

const DEFAULT_BACKGROUND: &str = "#FFFFFF";
const DEFAULT_TEXT: &str = "#000000";
const DEFAULT_PRIMARY: &str = "#3B82F6";
const DEFAULT_SECONDARY: &str = "#F0F9FF";
const DEFAULT_ACCENT: &str = "#EF4444";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorRole {
    Background,
    Text,
    Primary,
    Secondary,
    Accent,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ThemeRoles {
    pub background: String,
    pub text: String,
    pub primary: String,
    pub secondary: String,
    pub accent: String,
    pub primary_text: &'static str,
    pub secondary_text: &'static str,
    pub accent_text: &'static str,
}

impl ThemeRoles {
    pub fn from_colors(colors: &[Color]) -> Self {
        let primary = best_color_for(colors, ColorRole::Primary);
        let secondary = best_color_for(colors, ColorRole::Secondary);
        let accent = best_color_for(colors, ColorRole::Accent);
        Self {
            background: best_color_for(colors, ColorRole::Background),
            text: best_color_for(colors, ColorRole::Text),
            primary_text: contrast_color(&primary),
            secondary_text: contrast_color(&secondary),
            accent_text: contrast_color(&accent),
            primary,
            secondary,
            accent,
        }
    }
}

/// Brightness score of a hex code, or `None` when it does not parse.
pub fn luminance(hex: &str) -> Option<f64> {
    Rgb::parse_hex(hex).ok().map(Rgb::luminance)
}

/// Black text when `L > 160`, white otherwise (so exactly 160 is white).
/// Unparseable input is treated as dark.
pub fn contrast_color(hex: &str) -> &'static str {
    let milli = Rgb::parse_hex(hex)
        .map(Rgb::luminance_milli)
        .unwrap_or_default();
    if milli > CONTRAST_THRESHOLD_MILLI {
        DARK_TEXT
    } else {
        LIGHT_TEXT
    }
}

pub fn best_color_for(colors: &[Color], role: ColorRole) -> String {
    let mut ascending: Vec<&Color> = colors.iter().collect();
    ascending.sort_by_key(|color| color.channels().luminance_milli());
    let mut descending: Vec<&Color> = colors.iter().collect();
    descending.sort_by(|a, b| {
        b.channels()
            .luminance_milli()
            .cmp(&a.channels().luminance_milli())
    });

    let (picked, default) = match role {
        ColorRole::Background => (descending.first(), DEFAULT_BACKGROUND),
        ColorRole::Text => (ascending.first(), DEFAULT_TEXT),
        ColorRole::Primary => (ascending.get(ascending.len() / 2), DEFAULT_PRIMARY),
        ColorRole::Secondary => (descending.get(1), DEFAULT_SECONDARY),
        ColorRole::Accent => (ascending.get(ascending.len() / 3), DEFAULT_ACCENT),
    };
    picked
        .map(|color| color.hex().to_string())
        .unwrap_or_else(|| default.to_string())
}
