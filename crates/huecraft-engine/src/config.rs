//! Credential and endpoint lookup.
//!
//! Everything is read through a lookup closure so callers (and tests) decide
//! where values come from; [`AppConfig::from_env`] reads the process env.

use std::env;
use std::time::Duration;

use huecraft_contracts::models::{ModelSelector, IMAGE, TEXT};

pub const DEFAULT_TEXT_API_BASE: &str = "https://models.inference.ai.azure.com";
pub const DEFAULT_TEXT_MODEL: &str = "Llama-3.3-70B-Instruct";
pub const DEFAULT_IMAGE_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_IMAGE_MODEL: &str = "gemini-2.0-flash-exp-image-generation";
pub const DEFAULT_FIRESTORE_API_BASE: &str = "https://firestore.googleapis.com/v1";

const TEXT_TOKEN_KEYS: &[&str] = &["GITHUB_TOKEN", "GITHUB_AI_TOKEN", "VITE_GITHUB_TOKEN"];
const IMAGE_KEY_KEYS: &[&str] = &["GEMINI_API_KEY", "GOOGLE_API_KEY", "VITE_GEMINI_API_KEY"];
const IMAGE_KEY_PLACEHOLDER: &str = "your_gemini_api_key_here";

const DEFAULT_TIMEOUT_S: f64 = 90.0;
const MIN_TIMEOUT_S: f64 = 5.0;
const MAX_TIMEOUT_S: f64 = 300.0;

#[derive(Debug, Clone, PartialEq)]
pub struct TextModelConfig {
    pub token: Option<String>,
    pub api_base: String,
    pub model: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImageModelConfig {
    pub api_key: Option<String>,
    pub api_base: String,
    pub model: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FirestoreConfig {
    pub project: String,
    pub api_base: String,
    pub bearer_token: Option<String>,
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub text: TextModelConfig,
    pub image: ImageModelConfig,
    pub firestore: Option<FirestoreConfig>,
    pub request_timeout: Duration,
    /// Non-fatal problems found while resolving configuration.
    pub warnings: Vec<String>,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let first_non_empty = |keys: &[&str]| keys.iter().find_map(|key| non_empty(key));
        let api_base = |key: &str, default: &str| {
            non_empty(key)
                .map(|value| value.trim_end_matches('/').to_string())
                .filter(|value| !value.is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        let mut warnings = Vec::new();

        let image_key = first_non_empty(IMAGE_KEY_KEYS).filter(|value| {
            if value == IMAGE_KEY_PLACEHOLDER {
                warnings.push("Gemini API key is still the placeholder value; ignoring it.".to_string());
                return false;
            }
            true
        });

        let text_model = resolve_model(non_empty("HUECRAFT_TEXT_MODEL"), TEXT, &mut warnings);
        let image_model = resolve_model(non_empty("HUECRAFT_IMAGE_MODEL"), IMAGE, &mut warnings);

        let request_timeout = non_empty("HUECRAFT_REQUEST_TIMEOUT_S")
            .map(|raw| match raw.parse::<f64>() {
                Ok(value) if value.is_finite() => value.clamp(MIN_TIMEOUT_S, MAX_TIMEOUT_S),
                _ => {
                    warnings.push(format!(
                        "HUECRAFT_REQUEST_TIMEOUT_S '{raw}' is not a number; using {DEFAULT_TIMEOUT_S}s."
                    ));
                    DEFAULT_TIMEOUT_S
                }
            })
            .unwrap_or(DEFAULT_TIMEOUT_S);

        let firestore = non_empty("HUECRAFT_FIRESTORE_PROJECT").map(|project| FirestoreConfig {
            project,
            api_base: api_base("HUECRAFT_FIRESTORE_API_BASE", DEFAULT_FIRESTORE_API_BASE),
            bearer_token: non_empty("HUECRAFT_FIRESTORE_TOKEN"),
            api_key: non_empty("HUECRAFT_FIRESTORE_API_KEY"),
        });

        Self {
            text: TextModelConfig {
                token: first_non_empty(TEXT_TOKEN_KEYS),
                api_base: api_base("HUECRAFT_TEXT_API_BASE", DEFAULT_TEXT_API_BASE),
                model: text_model,
            },
            image: ImageModelConfig {
                api_key: image_key,
                api_base: api_base("GEMINI_API_BASE", DEFAULT_IMAGE_API_BASE),
                model: image_model,
            },
            firestore,
            request_timeout: Duration::from_secs_f64(request_timeout),
            warnings,
        }
    }

    pub fn has_text_token(&self) -> bool {
        self.text.token.is_some()
    }

    pub fn has_image_key(&self) -> bool {
        self.image.api_key.is_some()
    }

    pub fn with_text_model(mut self, requested: Option<&str>) -> Self {
        if requested.is_some() {
            self.text.model = resolve_model(requested.map(str::to_string), TEXT, &mut self.warnings);
        }
        self
    }

    pub fn with_image_model(mut self, requested: Option<&str>) -> Self {
        if requested.is_some() {
            self.image.model =
                resolve_model(requested.map(str::to_string), IMAGE, &mut self.warnings);
        }
        self
    }
}

fn resolve_model(requested: Option<String>, capability: &str, warnings: &mut Vec<String>) -> String {
    let default = if capability == TEXT {
        DEFAULT_TEXT_MODEL
    } else {
        DEFAULT_IMAGE_MODEL
    };
    let Some(requested) = requested else {
        return default.to_string();
    };
    match ModelSelector::new(None).select(Some(&requested), capability) {
        Ok(selection) => {
            if let Some(reason) = selection.fallback_reason {
                warnings.push(reason);
            }
            selection.model.name
        }
        Err(reason) => {
            warnings.push(reason);
            default.to_string()
        }
    }
}
