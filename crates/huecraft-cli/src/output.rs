use std::fmt::Write as _;
use std::io::Write as _;

use huecraft_contracts::notices::{Notice, Notifier};
use huecraft_contracts::palette::ColorPalette;
use huecraft_contracts::theme::ThemeRoles;
use huecraft_engine::AppConfig;

/// Prints notices to stderr as `[level] message`.
#[derive(Debug, Default)]
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, notice: Notice) {
        let mut stderr = std::io::stderr().lock();
        let _ = writeln!(stderr, "[{}] {}", notice.level.as_str(), notice.message);
    }
}

pub fn render_palette(palette: &ColorPalette) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}  (id {})", palette.name, palette.id);
    let _ = writeln!(out, "  \"{}\"", palette.description);
    let name_width = palette
        .colors
        .iter()
        .map(|color| color.name().chars().count())
        .max()
        .unwrap_or(0);
    for color in &palette.colors {
        let _ = writeln!(
            out,
            "  {:<width$}  {}  {}",
            color.name(),
            color.hex(),
            color.rgb(),
            width = name_width
        );
    }
    if let Some(branding) = &palette.branding {
        let _ = writeln!(out, "Branding");
        let _ = writeln!(out, "  title:  {}", branding.title);
        let _ = writeln!(out, "  slogan: {}", branding.slogan);
        for tip in &branding.tips {
            let _ = writeln!(out, "  - {tip}");
        }
    }
    out
}

pub fn render_theme(palette: &ColorPalette) -> String {
    let roles = ThemeRoles::from_colors(&palette.colors);
    let mut out = String::new();
    let _ = writeln!(out, "Theme preview");
    let _ = writeln!(out, "  background {}", roles.background);
    let _ = writeln!(out, "  text       {}", roles.text);
    let _ = writeln!(out, "  primary    {} (text {})", roles.primary, roles.primary_text);
    let _ = writeln!(
        out,
        "  secondary  {} (text {})",
        roles.secondary, roles.secondary_text
    );
    let _ = writeln!(out, "  accent     {} (text {})", roles.accent, roles.accent_text);
    out
}

pub fn render_saved(saved: &[ColorPalette]) -> String {
    if saved.is_empty() {
        return "No saved palettes.\n".to_string();
    }
    let mut out = String::new();
    for palette in saved {
        let swatches = palette
            .colors
            .iter()
            .map(|color| color.hex())
            .collect::<Vec<&str>>()
            .join(" ");
        let _ = writeln!(out, "{}  {}  {}", palette.id, palette.name, swatches);
    }
    out
}

/// The token manager view: which credentials are set and which models run.
pub fn render_check(config: &AppConfig) -> String {
    let status = |present: bool| if present { "configured" } else { "missing" };
    let mut out = String::new();
    let _ = writeln!(
        out,
        "text model   {} ({}) token {}",
        config.text.model,
        config.text.api_base,
        status(config.has_text_token())
    );
    let _ = writeln!(
        out,
        "image model  {} ({}) key {}",
        config.image.model,
        config.image.api_base,
        status(config.has_image_key())
    );
    match &config.firestore {
        Some(firestore) => {
            let _ = writeln!(
                out,
                "user store   firestore project {} ({})",
                firestore.project, firestore.api_base
            );
        }
        None => {
            let _ = writeln!(out, "user store   not configured");
        }
    }
    let _ = writeln!(out, "timeout      {}s", config.request_timeout.as_secs());
    for warning in &config.warnings {
        let _ = writeln!(out, "warning: {warning}");
    }
    out
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use huecraft_contracts::color::Color;
    use huecraft_contracts::palette::{BrandingContent, ColorPalette};
    use huecraft_engine::AppConfig;

    use super::{render_check, render_palette, render_saved, render_theme};

    fn palette() -> ColorPalette {
        ColorPalette {
            id: "1700000000000-1".to_string(),
            name: "Tidewater".to_string(),
            description: "a seaside bakery".to_string(),
            colors: vec![
                Color::new("#FFFFFF", "Foam").unwrap(),
                Color::new("#000000", "Ink").unwrap(),
                Color::new("#808080", "Harbor").unwrap(),
            ],
            timestamp: 1_700_000_000_000,
            branding: Some(BrandingContent {
                title: "Tidewater".to_string(),
                slogan: "Fresh every tide".to_string(),
                tips: vec!["Bake in the window".to_string()],
            }),
        }
    }

    #[test]
    fn palette_lists_colors_and_branding() {
        let text = render_palette(&palette());
        assert!(text.starts_with("Tidewater  (id 1700000000000-1)\n"));
        assert!(text.contains("  Foam    #FFFFFF  rgb(255, 255, 255)\n"));
        assert!(text.contains("  slogan: Fresh every tide\n"));
        assert!(text.contains("  - Bake in the window\n"));
    }

    #[test]
    fn theme_uses_brightness_roles() {
        let text = render_theme(&palette());
        assert!(text.contains("  background #FFFFFF\n"));
        assert!(text.contains("  text       #000000\n"));
    }

    #[test]
    fn saved_list() {
        assert_eq!(render_saved(&[]), "No saved palettes.\n");
        assert_eq!(
            render_saved(&[palette()]),
            "1700000000000-1  Tidewater  #FFFFFF #000000 #808080\n"
        );
    }

    #[test]
    fn check_reports_missing_credentials() {
        let env: HashMap<&str, &str> = HashMap::from([("GITHUB_TOKEN", "ghp_x")]);
        let config = AppConfig::from_lookup(|key| env.get(key).map(|value| value.to_string()));
        let text = render_check(&config);
        assert!(text.contains("token configured"));
        assert!(text.contains("key missing"));
        assert!(text.contains("user store   not configured"));
    }
}
