mod output;
mod telemetry;

use std::fs;
use std::io::{self, ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use huecraft_contracts::chat::{parse_intent, Intent, CHAT_HELP_COMMANDS};
use huecraft_contracts::color::Color;
use huecraft_contracts::documents::DocumentFile;
use huecraft_contracts::notices::{EventWriter, FanoutNotifier, Notifier};
use huecraft_contracts::palette::ColorPalette;
use huecraft_engine::identity::{
    FirestoreDirectory, IdentitySync, JsonFileDirectory, SyncOutcome, UserDirectory,
};
use huecraft_engine::studio::{
    logo_file_name, CustomColors, ImageThemer, LogoStudio, ThemeSource, THEMED_IMAGE_FILE_NAME,
};
use huecraft_engine::{
    AppConfig, ChatCompletionsClient, GeminiImageClient, GenerationOutcome, ImageClient,
    PaletteWorkflow, TextClient, WorkflowError,
};
use serde_json::{json, Value};

use crate::output::{render_check, render_palette, render_saved, render_theme, ConsoleNotifier};
use crate::telemetry::{init_logging, LogFormat, DEFAULT_LOG_LEVEL};

#[derive(Debug, Parser)]
#[command(
    name = "huecraft",
    version,
    about = "Generate brand palettes, copy, logos and themed images"
)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Args)]
struct GlobalArgs {
    /// Append notices and results to this JSONL file.
    #[arg(long, global = true)]
    events: Option<PathBuf>,
    /// Skip the AI models and use the built-in fallback palette.
    #[arg(long, global = true)]
    no_ai: bool,
    #[arg(long, global = true)]
    text_model: Option<String>,
    #[arg(long, global = true)]
    image_model: Option<String>,
    #[arg(long, global = true, default_value = DEFAULT_LOG_LEVEL)]
    log_level: String,
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Pretty)]
    log_format: LogFormat,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Generate a palette and branding copy from a description.
    Generate(GenerateArgs),
    /// Generate a palette, then a logo in its colors.
    Logo(LogoArgs),
    /// Recolor an image with a generated palette or explicit colors.
    ThemeImage(ThemeImageArgs),
    /// Show which credentials and models are configured.
    Check,
    /// Interactive session.
    Chat(ChatArgs),
}

#[derive(Debug, Args)]
struct GenerateArgs {
    #[arg(required = true, num_args = 1..)]
    prompt: Vec<String>,
    /// Write the palette JSON here (a directory gets `<name>.json`).
    #[arg(long)]
    export: Option<PathBuf>,
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Args)]
struct LogoArgs {
    #[arg(long)]
    brand: String,
    /// Brand description used for the palette and the logo.
    #[arg(long)]
    prompt: String,
    /// Logo-specific description; defaults to the prompt.
    #[arg(long)]
    description: Option<String>,
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(Debug, Args)]
struct ThemeImageArgs {
    image: PathBuf,
    /// Generate a palette from this description and apply it.
    #[arg(long, conflicts_with = "colors")]
    prompt: Option<String>,
    /// Custom color as HEX or HEX:NAME; repeat at least twice.
    #[arg(long = "color", value_parser = parse_color_arg)]
    colors: Vec<Color>,
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(Debug, Args)]
struct ChatArgs {
    /// Directory for exported palettes, logos and themed images.
    #[arg(long, default_value = ".")]
    out: PathBuf,
    /// Keep user records in this JSON file instead of Firestore.
    #[arg(long)]
    user_store: Option<PathBuf>,
    /// Sign in as this user id on start.
    #[arg(long, requires = "user_email")]
    user_id: Option<String>,
    #[arg(long)]
    user_email: Option<String>,
}

fn parse_color_arg(raw: &str) -> Result<Color, String> {
    let (hex, name) = raw.split_once(':').unwrap_or((raw, ""));
    Color::new(hex.trim(), name.trim()).map_err(|err| err.to_string())
}

fn main() {
    match run() {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("huecraft error: {err:#}");
            std::process::exit(1);
        }
    }
}

fn run() -> Result<i32> {
    let cli = Cli::parse();
    init_logging(&cli.global.log_level, cli.global.log_format)?;
    match cli.command {
        Command::Check => {
            print!("{}", render_check(&load_config(&cli.global)));
            Ok(0)
        }
        Command::Generate(args) => run_generate(&App::build(&cli.global)?, args),
        Command::Logo(args) => run_logo(&App::build(&cli.global)?, args),
        Command::ThemeImage(args) => run_theme_image(&App::build(&cli.global)?, args),
        Command::Chat(args) => run_chat(App::build(&cli.global)?, args),
    }
}

fn load_config(global: &GlobalArgs) -> AppConfig {
    AppConfig::from_env()
        .with_text_model(global.text_model.as_deref())
        .with_image_model(global.image_model.as_deref())
}

struct App {
    config: AppConfig,
    events: Option<EventWriter>,
    workflow: PaletteWorkflow,
    logos: LogoStudio,
    themer: ImageThemer,
}

impl App {
    fn build(global: &GlobalArgs) -> Result<Self> {
        let config = load_config(global);
        for warning in &config.warnings {
            tracing::warn!("{warning}");
        }

        let events = global.events.as_ref().map(|path| {
            EventWriter::new(path, format!("huecraft-{}", std::process::id()))
        });
        let mut fanout = FanoutNotifier::new().with(Arc::new(ConsoleNotifier));
        if let Some(events) = &events {
            fanout = fanout.with(Arc::new(events.clone()));
        }
        let notifier: Arc<dyn Notifier> = Arc::new(fanout);

        let text: Arc<dyn TextClient> = Arc::new(ChatCompletionsClient::from_config(&config));
        let images: Arc<dyn ImageClient> = Arc::new(GeminiImageClient::from_config(&config));
        let workflow = PaletteWorkflow::new(text, Arc::clone(&notifier));
        let logos = LogoStudio::new(Arc::clone(&images), Arc::clone(&notifier));
        let themer = ImageThemer::new(images, notifier);

        if global.no_ai {
            workflow.disable_ai();
            logos.set_use_ai(false);
        }

        Ok(Self {
            config,
            events,
            workflow,
            logos,
            themer,
        })
    }

    fn emit(&self, event_type: &str, payload: Value) {
        let Some(events) = &self.events else {
            return;
        };
        let payload = payload.as_object().cloned().unwrap_or_default();
        if let Err(err) = events.emit(event_type, payload) {
            tracing::warn!(error = %err, "failed to record {event_type} event");
        }
    }

    fn generate(&self, prompt: &str) -> Result<GenerationOutcome, WorkflowError> {
        let outcome = self.workflow.generate_palette(prompt)?;
        self.emit(
            "palette_generated",
            json!({
                "source": outcome.source.as_str(),
                "warnings": outcome.warnings,
                "palette": outcome.palette,
            }),
        );
        Ok(outcome)
    }

    fn save_logo(
        &self,
        palette: &ColorPalette,
        brand: &str,
        description: Option<&str>,
        out: &Path,
    ) -> Result<PathBuf> {
        let outcome = self.logos.generate_logo(Some(palette), brand, description)?;
        write_bytes(out, &outcome.image().bytes)?;
        self.emit(
            "logo_saved",
            json!({
                "brand": brand,
                "palette_id": palette.id,
                "placeholder": outcome.is_placeholder(),
                "path": out.display().to_string(),
            }),
        );
        Ok(out.to_path_buf())
    }

    fn theme_image(&self, input: &Path, source: ThemeSource<'_>, out: &Path) -> Result<bool> {
        let upload =
            fs::read(input).with_context(|| format!("failed reading {}", input.display()))?;
        let themed = self.themer.apply(&upload, source)?;
        write_bytes(out, &themed.image.bytes)?;
        self.emit(
            "image_themed",
            json!({
                "input": input.display().to_string(),
                "path": out.display().to_string(),
                "degraded": themed.degraded,
                "reason": themed.reason,
            }),
        );
        Ok(themed.degraded)
    }
}

fn write_bytes(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed creating {}", parent.display()))?;
        }
    }
    fs::write(path, bytes).with_context(|| format!("failed writing {}", path.display()))
}

/// Directories (existing, or spelled with a trailing separator) get the
/// palette's own export file name.
fn export_target(requested: &Path, palette: &ColorPalette) -> PathBuf {
    let looks_like_dir = requested.is_dir()
        || requested
            .to_str()
            .is_some_and(|raw| raw.ends_with('/') || raw.ends_with('\\'));
    if looks_like_dir {
        requested.join(palette.export_file_name())
    } else {
        requested.to_path_buf()
    }
}

fn run_generate(app: &App, args: GenerateArgs) -> Result<i32> {
    let prompt = args.prompt.join(" ");
    let outcome = app.generate(&prompt)?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&outcome.palette)?);
    } else {
        print!("{}", render_palette(&outcome.palette));
        print!("{}", render_theme(&outcome.palette));
    }
    if let Some(export) = args.export {
        let path = export_target(&export, &outcome.palette);
        outcome.palette.write_json(&path)?;
        eprintln!("Exported {}", path.display());
    }
    Ok(0)
}

fn run_logo(app: &App, args: LogoArgs) -> Result<i32> {
    let outcome = app.generate(&args.prompt)?;
    let out = args
        .out
        .unwrap_or_else(|| PathBuf::from(logo_file_name(&args.brand)));
    let path = app.save_logo(
        &outcome.palette,
        &args.brand,
        args.description.as_deref(),
        &out,
    )?;
    println!("{}", path.display());
    Ok(0)
}

fn run_theme_image(app: &App, args: ThemeImageArgs) -> Result<i32> {
    let out = args
        .out
        .unwrap_or_else(|| PathBuf::from(THEMED_IMAGE_FILE_NAME));
    let degraded = if args.colors.is_empty() {
        let Some(prompt) = args.prompt else {
            bail!("pass --prompt to generate a palette or at least two --color values");
        };
        let outcome = app.generate(&prompt)?;
        app.theme_image(&args.image, ThemeSource::Palette(Some(&outcome.palette)), &out)?
    } else {
        let custom = CustomColors::from_colors(args.colors)?;
        app.theme_image(&args.image, ThemeSource::Custom(&custom), &out)?
    };
    println!("{}", out.display());
    Ok(if degraded { 2 } else { 0 })
}

fn user_directory(config: &AppConfig, user_store: Option<&Path>) -> Option<Arc<dyn UserDirectory>> {
    if let Some(path) = user_store {
        return Some(Arc::new(JsonFileDirectory::new(DocumentFile::new(path))));
    }
    FirestoreDirectory::from_config(config)
        .map(|directory| Arc::new(directory) as Arc<dyn UserDirectory>)
}

fn sign_in(identity: Option<&IdentitySync>, id: &str, email: &str) {
    let Some(identity) = identity else {
        println!("No user store configured; set HUECRAFT_FIRESTORE_PROJECT or pass --user-store.");
        return;
    };
    match identity.sign_in(id, email) {
        Ok(SyncOutcome::Stored(record)) => println!("Signed in as {} <{}>", record.id, record.email),
        Ok(SyncOutcome::AlreadySynced) => println!("Already signed in as {id}"),
        Err(err) => println!("Signed in, but storing the user record failed: {err}"),
    }
}

fn run_chat(app: App, args: ChatArgs) -> Result<i32> {
    let identity = user_directory(&app.config, args.user_store.as_deref()).map(IdentitySync::new);
    if let (Some(id), Some(email)) = (args.user_id.as_deref(), args.user_email.as_deref()) {
        sign_in(identity.as_ref(), id, email);
    }

    let stdin = io::stdin();
    let mut line = String::new();
    println!(
        "Huecraft started ({} mode). Describe your brand, or type /help for commands.",
        if app.workflow.using_ai() { "AI" } else { "fallback" }
    );

    loop {
        print!("> ");
        io::stdout().flush()?;

        line.clear();
        let read = match stdin.read_line(&mut line) {
            Ok(read) => read,
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => return Err(err.into()),
        };
        if read == 0 {
            break;
        }

        let intent = parse_intent(line.trim_end_matches(['\n', '\r']));
        match intent.action.as_str() {
            "noop" => continue,
            "quit" => break,
            "help" => println!("Commands: {}", CHAT_HELP_COMMANDS.join(" ")),
            "generate" => {
                let prompt = intent.prompt.clone().unwrap_or_default();
                match app.generate(&prompt) {
                    Ok(outcome) => print!("{}", render_palette(&outcome.palette)),
                    Err(err) => tracing::debug!(error = %err, "generation did not complete"),
                }
            }
            "save_palette" => {
                if let Ok(palette) = app.workflow.save_palette() {
                    println!("Saved {} ({})", palette.name, palette.id);
                }
            }
            "delete_palette" => match intent.arg("id") {
                Some(id) => {
                    if app.workflow.delete_palette(&id).is_none() {
                        println!("No saved palette with id {id}");
                    }
                }
                None => println!("/delete requires a palette id (see /list)"),
            },
            "list_palettes" => print!("{}", render_saved(&app.workflow.saved())),
            "show_palette" => match app.workflow.current() {
                Some(palette) => {
                    print!("{}", render_palette(&palette));
                    print!("{}", render_theme(&palette));
                }
                None => println!("No palette yet. Describe your brand to generate one."),
            },
            "toggle_ai" => {
                if let Err(err) = app.workflow.toggle_ai_mode() {
                    tracing::debug!(error = %err, "AI mode unchanged");
                }
            }
            "check" => print!("{}", render_check(&app.config)),
            "logo" => chat_logo(&app, &intent, &args.out),
            "theme_image" => chat_theme(&app, &intent, &args.out),
            "export" => chat_export(&app, &intent, &args.out),
            "login" => match (intent.arg("id"), intent.arg("email")) {
                (Some(id), Some(email)) => sign_in(identity.as_ref(), &id, &email),
                _ => println!("/login requires a user id and an email"),
            },
            "logout" => {
                if let Some(identity) = &identity {
                    identity.sign_out();
                }
                println!("Signed out");
            }
            "unknown" => println!(
                "Unknown command /{}. Type /help for commands.",
                intent.arg("command").unwrap_or_default()
            ),
            other => tracing::debug!(action = other, "unhandled chat action"),
        }
    }

    Ok(0)
}

fn chat_logo(app: &App, intent: &Intent, out_dir: &Path) {
    let brand = intent.arg("brand").unwrap_or_default();
    let description = intent.arg("description");
    let Some(palette) = app.workflow.current() else {
        // The studio reports the missing palette as a notice.
        if let Err(err) = app.logos.generate_logo(None, &brand, description.as_deref()) {
            tracing::debug!(error = %err, "logo not generated");
        }
        return;
    };
    let out = out_dir.join(logo_file_name(&brand));
    match app.save_logo(&palette, &brand, description.as_deref(), &out) {
        Ok(path) => println!("Logo written to {}", path.display()),
        Err(err) => tracing::debug!(error = %format!("{err:#}"), "logo not written"),
    }
}

fn chat_theme(app: &App, intent: &Intent, out_dir: &Path) {
    let paths = intent.args("paths");
    let Some(input) = paths.first() else {
        println!("/theme requires an image path");
        return;
    };
    let out = paths
        .get(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| out_dir.join(THEMED_IMAGE_FILE_NAME));
    let current = app.workflow.current();
    match app.theme_image(Path::new(input), ThemeSource::Palette(current.as_ref()), &out) {
        Ok(false) => println!("Themed image written to {}", out.display()),
        Ok(true) => println!("Original image copied to {}", out.display()),
        Err(err) => println!("Theming failed: {err:#}"),
    }
}

fn chat_export(app: &App, intent: &Intent, out_dir: &Path) {
    let Some(palette) = app.workflow.current() else {
        println!("No palette to export yet");
        return;
    };
    let path = match intent.arg("path") {
        Some(path) => export_target(Path::new(&path), &palette),
        None => out_dir.join(palette.export_file_name()),
    };
    match palette.write_json(&path) {
        Ok(()) => {
            app.emit(
                "palette_exported",
                json!({"id": palette.id, "path": path.display().to_string()}),
            );
            println!("Exported {}", path.display());
        }
        Err(err) => println!("Export failed: {err:#}"),
    }
}
