//! Logo generation and image theming on top of the image client.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use huecraft_contracts::color::{Color, Rgb};
use huecraft_contracts::notices::{Notice, Notifier};
use huecraft_contracts::palette::{slug, ColorPalette};

use crate::error::{AiError, StudioError};
use crate::fallback::placeholder_logo;
use crate::images::{mime_for_bytes, GeneratedImage, ImageClient, IMAGE_SERVICE};

pub const THEMED_IMAGE_FILE_NAME: &str = "themed-image.png";
const MIN_CUSTOM_COLORS: usize = 2;
const NEW_CUSTOM_COLOR: Rgb = Rgb::new(0xCC, 0xCC, 0xCC);

/// File name offered when saving a logo: the brand slug plus `-logo.png`.
pub fn logo_file_name(brand_name: &str) -> String {
    format!("{}-logo.png", slug(brand_name))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogoOutcome {
    Generated(GeneratedImage),
    Placeholder(GeneratedImage),
}

impl LogoOutcome {
    pub fn image(&self) -> &GeneratedImage {
        match self {
            Self::Generated(image) | Self::Placeholder(image) => image,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self, Self::Placeholder(_))
    }
}

pub struct LogoStudio {
    images: Arc<dyn ImageClient>,
    notifier: Arc<dyn Notifier>,
    use_ai: AtomicBool,
}

impl LogoStudio {
    pub fn new(images: Arc<dyn ImageClient>, notifier: Arc<dyn Notifier>) -> Self {
        let use_ai = images.has_credential();
        Self {
            images,
            notifier,
            use_ai: AtomicBool::new(use_ai),
        }
    }

    pub fn use_ai(&self) -> bool {
        self.use_ai.load(Ordering::SeqCst)
    }

    /// Returns the effective setting; AI stays off without an image credential.
    pub fn set_use_ai(&self, enabled: bool) -> bool {
        let effective = enabled && self.images.has_credential();
        self.use_ai.store(effective, Ordering::SeqCst);
        effective
    }

    /// `description` falls back to the palette's prompt when blank.
    pub fn generate_logo(
        &self,
        palette: Option<&ColorPalette>,
        brand_name: &str,
        description: Option<&str>,
    ) -> Result<LogoOutcome, StudioError> {
        let Some(palette) = palette else {
            self.notifier
                .notify(Notice::error("Please generate a color palette first"));
            return Err(StudioError::NoPalette);
        };
        let brand_name = brand_name.trim();
        if brand_name.is_empty() {
            self.notifier.notify(Notice::error("Please enter a brand name"));
            return Err(StudioError::EmptyBrandName);
        }
        let description = description
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .unwrap_or(palette.description.as_str());

        if self.use_ai() && self.images.has_credential() {
            tracing::info!(brand = brand_name, palette = %palette.id, "requesting AI logo");
            return match self
                .images
                .generate_logo(brand_name, description, &palette.colors)
            {
                Ok(image) => {
                    self.notifier
                        .notify(Notice::success("Logo generated successfully with AI!"));
                    Ok(LogoOutcome::Generated(image))
                }
                Err(err) => {
                    tracing::warn!(error = %err, "logo generation failed");
                    self.notifier
                        .notify(Notice::error(format!("Logo generation error: {err}")));
                    Err(StudioError::Ai(err))
                }
            };
        }

        let image = placeholder_logo(brand_name, &palette.colors).map_err(StudioError::Render)?;
        self.notifier
            .notify(Notice::success("Logo generated with fallback method"));
        Ok(LogoOutcome::Placeholder(image))
    }
}

/// User-edited colors for theming an image without a generated palette.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomColors {
    colors: Vec<Color>,
}

impl Default for CustomColors {
    fn default() -> Self {
        Self {
            colors: vec![
                Color::from_rgb(Rgb::new(0xFF, 0xFF, 0xFF), "Background"),
                Color::from_rgb(Rgb::new(0x00, 0x00, 0x00), "Primary"),
            ],
        }
    }
}

impl CustomColors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a list from explicit colors; at least two are required.
    pub fn from_colors(colors: Vec<Color>) -> Result<Self, StudioError> {
        if colors.len() < MIN_CUSTOM_COLORS {
            return Err(StudioError::TooFewCustomColors);
        }
        Ok(Self { colors })
    }

    pub fn as_slice(&self) -> &[Color] {
        &self.colors
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    /// Appends a neutral grey named after its position.
    pub fn add(&mut self) -> &Color {
        let name = format!("Color {}", self.colors.len() + 1);
        self.colors.push(Color::from_rgb(NEW_CUSTOM_COLOR, name));
        &self.colors[self.colors.len() - 1]
    }

    /// Replaces the hex of entry `index`; the css rgb form follows it.
    pub fn set_hex(&mut self, index: usize, hex: &str) -> Result<(), StudioError> {
        let Some(color) = self.colors.get_mut(index) else {
            return Err(StudioError::NoColors);
        };
        *color = color.with_hex(hex)?;
        Ok(())
    }

    pub fn set_name(&mut self, index: usize, name: &str) -> Result<(), StudioError> {
        let Some(color) = self.colors.get_mut(index) else {
            return Err(StudioError::NoColors);
        };
        *color = color.with_name(name);
        Ok(())
    }

    pub fn remove(&mut self, index: usize) -> Result<Color, StudioError> {
        if self.colors.len() <= MIN_CUSTOM_COLORS {
            return Err(StudioError::TooFewCustomColors);
        }
        if index >= self.colors.len() {
            return Err(StudioError::NoColors);
        }
        Ok(self.colors.remove(index))
    }
}

#[derive(Debug, Clone, Copy)]
pub enum ThemeSource<'a> {
    Palette(Option<&'a ColorPalette>),
    Custom(&'a CustomColors),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThemedImage {
    pub image: GeneratedImage,
    /// Set when the edit failed and `image` is the untouched upload.
    pub degraded: bool,
    pub reason: Option<String>,
}

pub struct ImageThemer {
    images: Arc<dyn ImageClient>,
    notifier: Arc<dyn Notifier>,
}

impl ImageThemer {
    pub fn new(images: Arc<dyn ImageClient>, notifier: Arc<dyn Notifier>) -> Self {
        Self { images, notifier }
    }

    pub fn apply(&self, upload: &[u8], source: ThemeSource<'_>) -> Result<ThemedImage, StudioError> {
        let colors = match self.colors_for(source) {
            Ok(colors) => colors,
            Err(err) => {
                self.notifier.notify(Notice::error(
                    "Please ensure you have colors selected and an image uploaded",
                ));
                return Err(err);
            }
        };
        if upload.is_empty() {
            self.notifier.notify(Notice::error("Please upload an image file"));
            return Err(StudioError::EmptyImage);
        }
        if !self.images.has_credential() {
            self.notifier
                .notify(Notice::error("Gemini API key not configured"));
            return Err(StudioError::Ai(AiError::CredentialMissing {
                service: IMAGE_SERVICE,
            }));
        }

        tracing::info!(bytes = upload.len(), colors = colors.len(), "theming image");
        match self.images.edit_image(upload, colors) {
            Ok(image) => {
                self.notifier
                    .notify(Notice::success("Image themed successfully with Gemini!"));
                Ok(ThemedImage {
                    image,
                    degraded: false,
                    reason: None,
                })
            }
            Err(err) => {
                tracing::warn!(error = %err, "image edit failed; returning original");
                self.notifier.notify(Notice::error(format!("Error: {err}")));
                self.notifier
                    .notify(Notice::warning("Using the original image instead"));
                Ok(ThemedImage {
                    image: GeneratedImage {
                        bytes: upload.to_vec(),
                        mime_type: mime_for_bytes(upload).to_string(),
                    },
                    degraded: true,
                    reason: Some(err.to_string()),
                })
            }
        }
    }

    fn colors_for<'a>(&self, source: ThemeSource<'a>) -> Result<&'a [Color], StudioError> {
        match source {
            ThemeSource::Palette(None) => Err(StudioError::NoPalette),
            ThemeSource::Palette(Some(palette)) if palette.colors.is_empty() => {
                Err(StudioError::NoColors)
            }
            ThemeSource::Palette(Some(palette)) => Ok(palette.colors.as_slice()),
            ThemeSource::Custom(custom) if custom.len() < MIN_CUSTOM_COLORS => {
                Err(StudioError::TooFewCustomColors)
            }
            ThemeSource::Custom(custom) => Ok(custom.as_slice()),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use huecraft_contracts::color::Color;
    use huecraft_contracts::notices::{NoticeBuffer, NoticeLevel};
    use huecraft_contracts::palette::ColorPalette;

    use super::{
        logo_file_name, CustomColors, ImageThemer, LogoOutcome, LogoStudio, ThemeSource,
    };
    use crate::error::{AiError, StudioError};
    use crate::fallback::{fallback_colors, placeholder_logo};
    use crate::images::{GeneratedImage, ImageClient};

    #[derive(Default)]
    struct StubImages {
        credential: bool,
        fail: bool,
        seen: Mutex<Vec<(String, String)>>,
    }

    impl StubImages {
        fn failure() -> AiError {
            AiError::NoImageData {
                service: "Gemini",
                text: Some("I can only describe it".to_string()),
            }
        }
    }

    impl ImageClient for StubImages {
        fn has_credential(&self) -> bool {
            self.credential
        }

        fn edit_image(&self, image: &[u8], colors: &[Color]) -> Result<GeneratedImage, AiError> {
            self.seen
                .lock()
                .unwrap()
                .push(("edit".to_string(), format!("{}:{}", image.len(), colors.len())));
            if self.fail {
                return Err(Self::failure());
            }
            Ok(GeneratedImage {
                bytes: b"edited".to_vec(),
                mime_type: "image/png".to_string(),
            })
        }

        fn generate_logo(
            &self,
            brand_name: &str,
            description: &str,
            _colors: &[Color],
        ) -> Result<GeneratedImage, AiError> {
            self.seen
                .lock()
                .unwrap()
                .push((brand_name.to_string(), description.to_string()));
            if self.fail {
                return Err(Self::failure());
            }
            Ok(GeneratedImage {
                bytes: b"logo".to_vec(),
                mime_type: "image/png".to_string(),
            })
        }
    }

    fn palette() -> ColorPalette {
        ColorPalette {
            id: "1-1".to_string(),
            name: "Tidewater".to_string(),
            description: "a seaside bakery".to_string(),
            colors: fallback_colors(),
            timestamp: 1,
            branding: None,
        }
    }

    fn logo_studio(images: StubImages) -> (LogoStudio, Arc<StubImages>, NoticeBuffer) {
        let images = Arc::new(images);
        let notices = NoticeBuffer::new();
        (
            LogoStudio::new(images.clone(), Arc::new(notices.clone())),
            images,
            notices,
        )
    }

    #[test]
    fn logo_file_name_slugs_brand() {
        assert_eq!(logo_file_name("Blue  Fern Co"), "blue-fern-co-logo.png");
    }

    #[test]
    fn logo_requires_palette_and_brand() {
        let (studio, images, notices) = logo_studio(StubImages {
            credential: true,
            ..StubImages::default()
        });
        assert!(matches!(
            studio.generate_logo(None, "Brand", None),
            Err(StudioError::NoPalette)
        ));
        assert!(matches!(
            studio.generate_logo(Some(&palette()), "   ", None),
            Err(StudioError::EmptyBrandName)
        ));
        assert!(images.seen.lock().unwrap().is_empty());
        assert_eq!(
            notices.messages(),
            vec!["Please generate a color palette first", "Please enter a brand name"]
        );
    }

    #[test]
    fn ai_logo_uses_palette_description_by_default() {
        let (studio, images, _) = logo_studio(StubImages {
            credential: true,
            ..StubImages::default()
        });
        let outcome = studio
            .generate_logo(Some(&palette()), " Tidewater ", Some("  "))
            .unwrap();
        assert!(matches!(outcome, LogoOutcome::Generated(_)));
        assert_eq!(
            images.seen.lock().unwrap()[0],
            ("Tidewater".to_string(), "a seaside bakery".to_string())
        );
    }

    #[test]
    fn ai_logo_failure_has_no_substitute() {
        let (studio, _, notices) = logo_studio(StubImages {
            credential: true,
            fail: true,
            ..StubImages::default()
        });
        let err = studio
            .generate_logo(Some(&palette()), "Tidewater", None)
            .unwrap_err();
        assert!(matches!(err, StudioError::Ai(AiError::NoImageData { .. })));
        let notices = notices.snapshot();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].level, NoticeLevel::Error);
    }

    #[test]
    fn placeholder_without_credential_or_when_disabled() {
        let (studio, images, notices) = logo_studio(StubImages::default());
        assert!(!studio.use_ai());
        assert!(!studio.set_use_ai(true));
        let outcome = studio
            .generate_logo(Some(&palette()), "Tidewater", None)
            .unwrap();
        assert!(outcome.is_placeholder());
        assert_eq!(
            outcome.image(),
            &placeholder_logo("Tidewater", &fallback_colors()).unwrap()
        );
        assert!(images.seen.lock().unwrap().is_empty());
        assert_eq!(notices.messages(), vec!["Logo generated with fallback method"]);

        let (studio, images, _) = logo_studio(StubImages {
            credential: true,
            ..StubImages::default()
        });
        assert!(!studio.set_use_ai(false));
        assert!(studio
            .generate_logo(Some(&palette()), "Tidewater", None)
            .unwrap()
            .is_placeholder());
        assert!(images.seen.lock().unwrap().is_empty());
    }

    #[test]
    fn custom_colors_editing() {
        let mut custom = CustomColors::new();
        assert_eq!(custom.len(), 2);
        assert!(matches!(custom.remove(0), Err(StudioError::TooFewCustomColors)));

        let added = custom.add().clone();
        assert_eq!(added.hex(), "#CCCCCC");
        assert_eq!(added.name(), "Color 3");

        custom.set_hex(2, "#1a2b3c").unwrap();
        assert_eq!(custom.as_slice()[2].rgb(), "rgb(26, 43, 60)");
        assert!(matches!(
            custom.set_hex(2, "blue"),
            Err(StudioError::InvalidColor(_))
        ));
        custom.set_name(2, "Night").unwrap();
        assert_eq!(custom.as_slice()[2].name(), "Night");

        assert_eq!(custom.remove(0).unwrap().name(), "Background");
        assert_eq!(custom.len(), 2);
        assert!(matches!(
            CustomColors::from_colors(vec![Color::new("#FFFFFF", "Only").unwrap()]),
            Err(StudioError::TooFewCustomColors)
        ));
    }

    #[test]
    fn theme_with_palette_or_custom_colors() {
        let images = Arc::new(StubImages {
            credential: true,
            ..StubImages::default()
        });
        let themer = ImageThemer::new(images.clone(), Arc::new(NoticeBuffer::new()));

        let themed = themer
            .apply(b"upload", ThemeSource::Palette(Some(&palette())))
            .unwrap();
        assert!(!themed.degraded);
        assert_eq!(themed.image.bytes, b"edited");

        let custom = CustomColors::new();
        themer.apply(b"upload", ThemeSource::Custom(&custom)).unwrap();
        let seen = images.seen.lock().unwrap();
        assert_eq!(seen[0].1, "6:5");
        assert_eq!(seen[1].1, "6:2");
    }

    #[test]
    fn theme_rejects_missing_inputs() {
        let themer = ImageThemer::new(
            Arc::new(StubImages {
                credential: true,
                ..StubImages::default()
            }),
            Arc::new(NoticeBuffer::new()),
        );
        assert!(matches!(
            themer.apply(b"x", ThemeSource::Palette(None)),
            Err(StudioError::NoPalette)
        ));
        assert!(matches!(
            themer.apply(b"", ThemeSource::Palette(Some(&palette()))),
            Err(StudioError::EmptyImage)
        ));

        let themer = ImageThemer::new(Arc::new(StubImages::default()), Arc::new(NoticeBuffer::new()));
        let err = themer
            .apply(b"x", ThemeSource::Palette(Some(&palette())))
            .unwrap_err();
        assert!(matches!(err, StudioError::Ai(ref ai) if ai.is_credential_missing()));
    }

    #[test]
    fn theme_failure_returns_original_flagged_degraded() {
        let notices = NoticeBuffer::new();
        let themer = ImageThemer::new(
            Arc::new(StubImages {
                credential: true,
                fail: true,
                ..StubImages::default()
            }),
            Arc::new(notices.clone()),
        );
        let themed = themer
            .apply(b"original", ThemeSource::Palette(Some(&palette())))
            .unwrap();
        assert!(themed.degraded);
        assert_eq!(themed.image.bytes, b"original");
        assert!(themed.reason.unwrap().contains("no image data"));
        let levels: Vec<NoticeLevel> = notices.snapshot().iter().map(|n| n.level).collect();
        assert_eq!(levels, vec![NoticeLevel::Error, NoticeLevel::Warning]);
    }
}
