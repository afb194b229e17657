//! The palette workflow: AI-or-fallback generation, the current palette, the
//! saved collection and the AI-mode preference.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;

use huecraft_contracts::color::Color;
use huecraft_contracts::notices::{Notice, Notifier};
use huecraft_contracts::palette::{BrandingContent, ColorPalette, SavedPalettes};

use crate::error::{AiError, WorkflowError};
use crate::fallback::{fallback_branding, fallback_colors};
use crate::text::TextClient;

pub const MSG_EMPTY_PROMPT: &str = "Please enter a description for your brand";
pub const MSG_DEGRADED: &str = "AI generation failed, using fallback method";
pub const MSG_GENERATED: &str = "Brand content generated successfully!";
pub const MSG_SAVED: &str = "Palette saved to your collection!";
pub const MSG_REMOVED: &str = "Palette removed from your collection";
pub const MSG_NO_TOKEN: &str = "GitHub AI token not configured in environment variables";

/// Where the colors and branding of a generated palette came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaletteSource {
    Ai,
    /// One half from the model, the other from the fallback table.
    Composite,
    Fallback,
}

impl PaletteSource {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ai => "ai",
            Self::Composite => "composite",
            Self::Fallback => "fallback",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GenerationOutcome {
    pub palette: ColorPalette,
    pub source: PaletteSource,
    /// Reasons each substituted half was replaced.
    pub warnings: Vec<String>,
}

/// Shared view of whether a generation is running.
#[derive(Debug, Clone, Default)]
pub struct BusyFlag(Arc<AtomicUsize>);

impl BusyFlag {
    pub fn is_busy(&self) -> bool {
        self.0.load(Ordering::SeqCst) > 0
    }

    fn enter(&self) -> BusyGuard {
        self.0.fetch_add(1, Ordering::SeqCst);
        BusyGuard(Arc::clone(&self.0))
    }
}

struct BusyGuard(Arc<AtomicUsize>);

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[derive(Debug)]
struct WorkflowState {
    current: Option<ColorPalette>,
    saved: SavedPalettes,
    using_ai: bool,
}

pub struct PaletteWorkflow {
    text: Arc<dyn TextClient>,
    notifier: Arc<dyn Notifier>,
    state: Mutex<WorkflowState>,
    busy: BusyFlag,
    latest_ticket: AtomicU64,
}

impl PaletteWorkflow {
    /// AI mode starts enabled exactly when the text client has a credential.
    pub fn new(text: Arc<dyn TextClient>, notifier: Arc<dyn Notifier>) -> Self {
        let using_ai = text.has_credential();
        if using_ai {
            tracing::debug!("text model credential found");
        } else {
            tracing::debug!("no text model credential; starting in fallback mode");
        }
        Self {
            text,
            notifier,
            state: Mutex::new(WorkflowState {
                current: None,
                saved: SavedPalettes::new(),
                using_ai,
            }),
            busy: BusyFlag::default(),
            latest_ticket: AtomicU64::new(0),
        }
    }

    fn state(&self) -> MutexGuard<'_, WorkflowState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn is_busy(&self) -> bool {
        self.busy.is_busy()
    }

    pub fn busy_flag(&self) -> BusyFlag {
        self.busy.clone()
    }

    pub fn using_ai(&self) -> bool {
        self.state().using_ai
    }

    pub fn current(&self) -> Option<ColorPalette> {
        self.state().current.clone()
    }

    /// Saved palettes, newest first.
    pub fn saved(&self) -> Vec<ColorPalette> {
        self.state().saved.to_vec()
    }

    pub fn generate_palette(&self, prompt: &str) -> Result<GenerationOutcome, WorkflowError> {
        if prompt.trim().is_empty() {
            self.notifier.notify(Notice::error(MSG_EMPTY_PROMPT));
            return Err(WorkflowError::EmptyPrompt);
        }

        let ticket = self.latest_ticket.fetch_add(1, Ordering::SeqCst) + 1;
        let _busy = self.busy.enter();
        let use_ai = self.using_ai() && self.text.has_credential();
        tracing::info!(ticket, prompt_len = prompt.len(), ai = use_ai, "generating palette");

        let (colors, branding, source, warnings) = if use_ai {
            let (colors, branding) = self.request_both(prompt);
            resolve_halves(colors, branding)
        } else {
            (
                fallback_colors(),
                fallback_branding(),
                PaletteSource::Fallback,
                Vec::new(),
            )
        };

        if use_ai && source != PaletteSource::Ai {
            for warning in &warnings {
                tracing::warn!(ticket, reason = %warning, "AI generation degraded");
            }
            self.notifier.notify(Notice::error(MSG_DEGRADED));
        }

        let palette = {
            let mut state = self.state();
            let latest = self.latest_ticket.load(Ordering::SeqCst);
            if ticket != latest {
                tracing::debug!(ticket, latest, "discarding stale generation");
                return Err(WorkflowError::Superseded { ticket });
            }
            let name = if branding.title.trim().is_empty() {
                format!("Palette {}", state.saved.len() + 1)
            } else {
                branding.title.clone()
            };
            let timestamp = chrono::Utc::now().timestamp_millis();
            let palette = ColorPalette {
                id: format!("{timestamp}-{ticket}"),
                name,
                description: prompt.to_string(),
                colors,
                timestamp,
                branding: Some(branding),
            };
            state.current = Some(palette.clone());
            palette
        };

        tracing::info!(ticket, id = %palette.id, source = source.as_str(), "palette ready");
        self.notifier.notify(Notice::success(MSG_GENERATED));
        Ok(GenerationOutcome {
            palette,
            source,
            warnings,
        })
    }

    /// Issues the color and branding requests concurrently and waits for both.
    fn request_both(
        &self,
        prompt: &str,
    ) -> (
        Result<Vec<Color>, AiError>,
        Result<BrandingContent, AiError>,
    ) {
        thread::scope(|scope| {
            let colors = scope.spawn(|| self.text.request_color_palette(prompt));
            let branding = scope.spawn(|| self.text.request_branding(prompt));
            (
                colors
                    .join()
                    .unwrap_or(Err(AiError::WorkerPanicked("color palette"))),
                branding
                    .join()
                    .unwrap_or(Err(AiError::WorkerPanicked("branding"))),
            )
        })
    }

    /// Prepends the current palette to the saved collection.
    pub fn save_palette(&self) -> Result<ColorPalette, WorkflowError> {
        let (palette, inserted) = {
            let mut state = self.state();
            let Some(palette) = state.current.clone() else {
                drop(state);
                self.notifier
                    .notify(Notice::error("Please generate a palette before saving"));
                return Err(WorkflowError::NoCurrentPalette);
            };
            let inserted = state.saved.save(palette.clone());
            (palette, inserted)
        };
        if inserted {
            self.notifier.notify(Notice::success(MSG_SAVED));
        } else {
            self.notifier
                .notify(Notice::info("Palette is already in your collection"));
        }
        Ok(palette)
    }

    /// Removes the saved palette with `id`; absent ids are a silent no-op.
    pub fn delete_palette(&self, id: &str) -> Option<ColorPalette> {
        let removed = self.state().saved.delete(id);
        match &removed {
            Some(_) => self.notifier.notify(Notice::success(MSG_REMOVED)),
            None => tracing::debug!(id, "delete ignored; palette not saved"),
        }
        removed
    }

    /// Turns AI mode off without notifying, for callers that pick fallback
    /// mode before any interaction.
    pub fn disable_ai(&self) {
        self.state().using_ai = false;
    }

    /// Flips the AI preference. Enabling requires a configured credential;
    /// disabling is always allowed.
    pub fn toggle_ai_mode(&self) -> Result<bool, WorkflowError> {
        let enabled = {
            let mut state = self.state();
            if !state.using_ai && !self.text.has_credential() {
                drop(state);
                self.notifier.notify(Notice::error(MSG_NO_TOKEN));
                return Err(WorkflowError::CredentialMissing);
            }
            state.using_ai = !state.using_ai;
            state.using_ai
        };
        self.notifier.notify(Notice::info(if enabled {
            "Switched to AI mode"
        } else {
            "Switched to fallback mode"
        }));
        Ok(enabled)
    }
}

/// Combines the two request results. A missing credential on either side
/// degrades the whole generation; other failures replace only their half.
fn resolve_halves(
    colors: Result<Vec<Color>, AiError>,
    branding: Result<BrandingContent, AiError>,
) -> (Vec<Color>, BrandingContent, PaletteSource, Vec<String>) {
    let credential_missing = matches!(&colors, Err(err) if err.is_credential_missing())
        || matches!(&branding, Err(err) if err.is_credential_missing());
    let mut warnings = Vec::new();
    if credential_missing {
        for err in [colors.err(), branding.err()].into_iter().flatten() {
            warnings.push(err.to_string());
        }
        return (
            fallback_colors(),
            fallback_branding(),
            PaletteSource::Fallback,
            warnings,
        );
    }

    let mut substituted = 0;
    let colors = colors.unwrap_or_else(|err| {
        substituted += 1;
        warnings.push(format!("colors: {err}"));
        fallback_colors()
    });
    let branding = branding.unwrap_or_else(|err| {
        substituted += 1;
        warnings.push(format!("branding: {err}"));
        fallback_branding()
    });
    let source = match substituted {
        0 => PaletteSource::Ai,
        1 => PaletteSource::Composite,
        _ => PaletteSource::Fallback,
    };
    (colors, branding, source, warnings)
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{mpsc, Arc, Mutex};
    use std::thread;
    use std::time::Duration;

    use huecraft_contracts::color::Color;
    use huecraft_contracts::notices::{NoticeBuffer, NoticeLevel};
    use huecraft_contracts::palette::BrandingContent;

    use super::{PaletteSource, PaletteWorkflow, MSG_DEGRADED, MSG_EMPTY_PROMPT};
    use crate::error::{AiError, WorkflowError};
    use crate::fallback::{fallback_branding, fallback_colors};
    use crate::text::TextClient;

    type ColorsFn = Box<dyn Fn(&str) -> Result<Vec<Color>, AiError> + Send + Sync>;
    type BrandingFn = Box<dyn Fn(&str) -> Result<BrandingContent, AiError> + Send + Sync>;

    struct StubText {
        credential: bool,
        colors: ColorsFn,
        branding: BrandingFn,
        calls: AtomicUsize,
        gate: Mutex<Option<mpsc::Receiver<()>>>,
    }

    impl StubText {
        fn new(credential: bool, colors: ColorsFn, branding: BrandingFn) -> Self {
            Self {
                credential,
                colors,
                branding,
                calls: AtomicUsize::new(0),
                gate: Mutex::new(None),
            }
        }

        fn working() -> Self {
            Self::new(true, Box::new(|_| Ok(ai_colors())), Box::new(|_| Ok(ai_branding())))
        }
    }

    impl TextClient for StubText {
        fn has_credential(&self) -> bool {
            self.credential
        }

        fn request_color_palette(&self, prompt: &str) -> Result<Vec<Color>, AiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if prompt == "slow" {
                let gate = self.gate.lock().unwrap().take();
                if let Some(gate) = gate {
                    gate.recv().unwrap();
                }
            }
            (self.colors)(prompt)
        }

        fn request_branding(&self, prompt: &str) -> Result<BrandingContent, AiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            (self.branding)(prompt)
        }
    }

    fn ai_colors() -> Vec<Color> {
        vec![
            Color::new("#264653", "Deep Teal").unwrap(),
            Color::new("#E9C46A", "Saffron").unwrap(),
        ]
    }

    fn ai_branding() -> BrandingContent {
        BrandingContent {
            title: "Tidewater".to_string(),
            slogan: "Calm by design".to_string(),
            tips: vec!["Lead with photos".to_string()],
        }
    }

    fn http_error() -> AiError {
        AiError::Http {
            service: "GitHub Models",
            status: 500,
            message: "boom".to_string(),
        }
    }

    fn workflow(text: StubText) -> (PaletteWorkflow, Arc<StubText>, NoticeBuffer) {
        let text = Arc::new(text);
        let notices = NoticeBuffer::new();
        let workflow = PaletteWorkflow::new(text.clone(), Arc::new(notices.clone()));
        (workflow, text, notices)
    }

    #[test]
    fn blank_prompt_changes_nothing() {
        let (workflow, text, notices) = workflow(StubText::working());
        workflow.generate_palette("first").unwrap();
        workflow.save_palette().unwrap();
        let before_current = workflow.current();
        let before_saved = workflow.saved();
        let calls = text.calls.load(Ordering::SeqCst);
        notices.drain();

        assert!(matches!(
            workflow.generate_palette("   \n\t"),
            Err(WorkflowError::EmptyPrompt)
        ));
        assert_eq!(workflow.current(), before_current);
        assert_eq!(workflow.saved(), before_saved);
        assert_eq!(text.calls.load(Ordering::SeqCst), calls);
        assert_eq!(notices.messages(), vec![MSG_EMPTY_PROMPT]);
        assert!(!workflow.is_busy());
    }

    #[test]
    fn ai_success_uses_both_halves() {
        let (workflow, _, _) = workflow(StubText::working());
        let outcome = workflow.generate_palette("a seaside bakery").unwrap();
        assert_eq!(outcome.source, PaletteSource::Ai);
        assert_eq!(outcome.palette.colors, ai_colors());
        assert_eq!(outcome.palette.branding, Some(ai_branding()));
        assert_eq!(outcome.palette.name, "Tidewater");
        assert_eq!(outcome.palette.description, "a seaside bakery");
        assert_eq!(workflow.current(), Some(outcome.palette));
    }

    #[test]
    fn branding_failure_yields_composite_palette() {
        let (workflow, _, notices) = workflow(StubText::new(
            true,
            Box::new(|_| Ok(ai_colors())),
            Box::new(|_| Err(http_error())),
        ));
        let outcome = workflow.generate_palette("vintage bikes").unwrap();
        assert_eq!(outcome.source, PaletteSource::Composite);
        assert_eq!(outcome.palette.colors, ai_colors());
        assert_eq!(outcome.palette.branding, Some(fallback_branding()));
        assert_eq!(outcome.palette.name, "My Brand");
        assert_eq!(outcome.warnings.len(), 1);
        assert!(notices.messages().contains(&MSG_DEGRADED.to_string()));
    }

    #[test]
    fn credential_failure_degrades_everything() {
        let (workflow, _, notices) = workflow(StubText::new(
            true,
            Box::new(|_| Ok(ai_colors())),
            Box::new(|_| {
                Err(AiError::CredentialMissing {
                    service: "GitHub Models",
                })
            }),
        ));
        let outcome = workflow.generate_palette("x").unwrap();
        assert_eq!(outcome.source, PaletteSource::Fallback);
        assert_eq!(outcome.palette.colors, fallback_colors());
        assert_eq!(outcome.palette.branding, Some(fallback_branding()));
        let levels: Vec<NoticeLevel> = notices.snapshot().iter().map(|n| n.level).collect();
        assert_eq!(levels, vec![NoticeLevel::Error, NoticeLevel::Success]);
    }

    #[test]
    fn ai_disabled_is_deterministic_and_offline() {
        let (workflow, text, _) = workflow(StubText::new(
            false,
            Box::new(|_| Ok(ai_colors())),
            Box::new(|_| Ok(ai_branding())),
        ));
        assert!(!workflow.using_ai());
        for prompt in ["x", "a law firm", "☕ coffee"] {
            let outcome = workflow.generate_palette(prompt).unwrap();
            assert_eq!(outcome.source, PaletteSource::Fallback);
            assert_eq!(outcome.palette.colors, fallback_colors());
            assert_eq!(outcome.palette.branding, Some(fallback_branding()));
            assert!(outcome.warnings.is_empty());
        }
        assert_eq!(text.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn save_requires_current_palette() {
        let (workflow, _, notices) = workflow(StubText::working());
        assert!(matches!(
            workflow.save_palette(),
            Err(WorkflowError::NoCurrentPalette)
        ));
        assert!(workflow.saved().is_empty());
        assert_eq!(notices.drain().len(), 1);
    }

    #[test]
    fn save_prepends_and_ignores_duplicates() {
        let (workflow, _, _) = workflow(StubText::working());
        let first = workflow.generate_palette("one").unwrap().palette;
        workflow.save_palette().unwrap();
        workflow.save_palette().unwrap();
        let second = workflow.generate_palette("two").unwrap().palette;
        workflow.save_palette().unwrap();

        let ids: Vec<String> = workflow.saved().into_iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![second.id, first.id]);
    }

    #[test]
    fn delete_removes_one_and_keeps_order() {
        let (workflow, _, notices) = workflow(StubText::working());
        let mut ids = Vec::new();
        for prompt in ["a", "b", "c"] {
            ids.push(workflow.generate_palette(prompt).unwrap().palette.id);
            workflow.save_palette().unwrap();
        }
        notices.drain();

        let removed = workflow.delete_palette(&ids[1]).unwrap();
        assert_eq!(removed.description, "b");
        let remaining: Vec<String> = workflow.saved().into_iter().map(|p| p.id).collect();
        assert_eq!(remaining, vec![ids[2].clone(), ids[0].clone()]);
        assert_eq!(notices.drain().len(), 1);

        assert!(workflow.delete_palette(&ids[1]).is_none());
        assert!(workflow.delete_palette("missing").is_none());
        assert_eq!(workflow.saved().len(), 2);
        assert!(notices.drain().is_empty());
    }

    #[test]
    fn toggle_without_credential_refuses() {
        let (workflow, _, notices) = workflow(StubText::new(
            false,
            Box::new(|_| Ok(ai_colors())),
            Box::new(|_| Ok(ai_branding())),
        ));
        assert!(matches!(
            workflow.toggle_ai_mode(),
            Err(WorkflowError::CredentialMissing)
        ));
        assert!(!workflow.using_ai());
        assert_eq!(notices.drain()[0].level, NoticeLevel::Error);
    }

    #[test]
    fn toggle_with_credential_flips_both_ways() {
        let (workflow, text, _) = workflow(StubText::working());
        assert!(workflow.using_ai());
        assert!(!workflow.toggle_ai_mode().unwrap());

        let outcome = workflow.generate_palette("offline please").unwrap();
        assert_eq!(outcome.source, PaletteSource::Fallback);
        assert_eq!(text.calls.load(Ordering::SeqCst), 0);

        assert!(workflow.toggle_ai_mode().unwrap());
        assert_eq!(
            workflow.generate_palette("online").unwrap().source,
            PaletteSource::Ai
        );
    }

    #[test]
    fn disable_ai_is_silent_and_skips_the_model() {
        let (workflow, text, notices) = workflow(StubText::working());
        workflow.disable_ai();
        assert!(!workflow.using_ai());
        assert!(notices.snapshot().is_empty());

        let outcome = workflow.generate_palette("offline bakery").unwrap();
        assert_eq!(outcome.source, PaletteSource::Fallback);
        assert_eq!(text.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn stale_generation_is_discarded() {
        let (tx, rx) = mpsc::channel();
        let text = StubText::working();
        *text.gate.lock().unwrap() = Some(rx);
        let (workflow, _, _) = workflow(text);
        let workflow = Arc::new(workflow);
        let busy = workflow.busy_flag();

        let slow = {
            let workflow = Arc::clone(&workflow);
            thread::spawn(move || workflow.generate_palette("slow"))
        };
        while !busy.is_busy() {
            thread::sleep(Duration::from_millis(5));
        }

        let fast = workflow.generate_palette("fast").unwrap();
        tx.send(()).unwrap();
        let stale = slow.join().unwrap();

        assert!(matches!(stale, Err(WorkflowError::Superseded { ticket: 1 })));
        assert_eq!(workflow.current(), Some(fast.palette));
        assert!(!busy.is_busy());
    }

    #[test]
    fn palette_ids_are_unique() {
        let (workflow, _, _) = workflow(StubText::working());
        let a = workflow.generate_palette("same").unwrap().palette;
        let b = workflow.generate_palette("same").unwrap().palette;
        assert_ne!(a.id, b.id);
    }
}
