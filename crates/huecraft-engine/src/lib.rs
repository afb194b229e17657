pub mod config;
pub mod error;
pub mod fallback;
mod http;
pub mod identity;
pub mod images;
pub mod studio;
pub mod text;
pub mod workflow;

pub use config::AppConfig;
pub use error::{AiError, IdentityError, StudioError, WorkflowError};
pub use images::{GeminiImageClient, GeneratedImage, ImageClient};
pub use studio::{ImageThemer, LogoStudio};
pub use text::{ChatCompletionsClient, TextClient};
pub use workflow::{GenerationOutcome, PaletteSource, PaletteWorkflow};
