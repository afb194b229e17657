//! Offline substitutes used whenever the AI path is disabled or fails.

use std::io::Cursor;

use huecraft_contracts::color::{Color, Rgb};
use huecraft_contracts::palette::BrandingContent;
use huecraft_contracts::theme::ThemeRoles;
use image::{ImageFormat, Rgb as Pixel, RgbImage};
use sha2::{Digest, Sha256};

use crate::images::GeneratedImage;

pub const PLACEHOLDER_LOGO_SIZE: u32 = 512;

const FALLBACK_COLORS: [(Rgb, &str); 5] = [
    (Rgb::new(0xF8, 0xFA, 0xFC), "Background"),
    (Rgb::new(0x0F, 0x17, 0x2A), "Text"),
    (Rgb::new(0x3B, 0x82, 0xF6), "Primary"),
    (Rgb::new(0xF0, 0xF9, 0xFF), "Secondary"),
    (Rgb::new(0xEF, 0x44, 0x44), "Accent"),
];

pub fn fallback_colors() -> Vec<Color> {
    FALLBACK_COLORS
        .iter()
        .map(|(channels, name)| Color::from_rgb(*channels, *name))
        .collect()
}

pub fn fallback_branding() -> BrandingContent {
    BrandingContent {
        title: "My Brand".to_string(),
        slogan: "Creating innovative solutions".to_string(),
        tips: vec![
            "Focus on customer experience".to_string(),
            "Maintain consistent visual identity".to_string(),
            "Engage on social media regularly".to_string(),
        ],
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Disc,
    Tile,
    Diamond,
    Ring,
}

impl Mark {
    fn from_byte(byte: u8) -> Self {
        match byte % 4 {
            0 => Self::Disc,
            1 => Self::Tile,
            2 => Self::Diamond,
            _ => Self::Ring,
        }
    }

    /// Whether `(dx, dy)`, measured from the centre, falls inside a mark of
    /// half-width `radius`.
    fn contains(self, dx: i64, dy: i64, radius: i64) -> bool {
        match self {
            Self::Disc => dx * dx + dy * dy <= radius * radius,
            Self::Tile => dx.abs() <= radius && dy.abs() <= radius,
            Self::Diamond => dx.abs() + dy.abs() <= radius,
            Self::Ring => {
                let dist = dx * dx + dy * dy;
                let inner = radius * 3 / 5;
                dist <= radius * radius && dist >= inner * inner
            }
        }
    }
}

fn brand_digest(brand_name: &str) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(brand_name.trim().to_lowercase().as_bytes());
    let mut digest = [0u8; 32];
    digest.copy_from_slice(&hasher.finalize());
    digest
}

fn channels_or(hex: &str, default: Rgb) -> Pixel<u8> {
    let rgb = Rgb::parse_hex(hex).unwrap_or(default);
    Pixel([rgb.r, rgb.g, rgb.b])
}

/// Renders a deterministic PNG mark from the palette's theme roles. The same
/// brand name and colors always produce the same bytes.
pub fn placeholder_logo(
    brand_name: &str,
    colors: &[Color],
) -> Result<GeneratedImage, image::ImageError> {
    let roles = ThemeRoles::from_colors(colors);
    let digest = brand_digest(brand_name);
    let outer = Mark::from_byte(digest[0]);
    let inner = Mark::from_byte(digest[1]);
    tracing::debug!(
        variant = %hex::encode(&digest[..4]),
        ?outer,
        ?inner,
        "rendering placeholder logo"
    );

    let background = channels_or(&roles.background, Rgb::new(0xFF, 0xFF, 0xFF));
    let primary = channels_or(&roles.primary, Rgb::new(0x3B, 0x82, 0xF6));
    let accent = channels_or(&roles.accent, Rgb::new(0xEF, 0x44, 0x44));

    let size = PLACEHOLDER_LOGO_SIZE;
    let centre = i64::from(size / 2);
    let outer_radius = i64::from(size) * 3 / 8;
    let inner_radius = outer_radius * (35 + i64::from(digest[2] % 20)) / 100;

    let image = RgbImage::from_fn(size, size, |x, y| {
        let dx = i64::from(x) - centre;
        let dy = i64::from(y) - centre;
        if inner.contains(dx, dy, inner_radius) {
            accent
        } else if outer.contains(dx, dy, outer_radius) {
            primary
        } else {
            background
        }
    });

    let mut bytes = Vec::new();
    image.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
    Ok(GeneratedImage {
        bytes,
        mime_type: "image/png".to_string(),
    })
}
