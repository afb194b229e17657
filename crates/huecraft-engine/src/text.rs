//! Palette and branding requests against an OpenAI-compatible
//! chat-completions endpoint.

use std::time::Duration;

use huecraft_contracts::color::Color;
use huecraft_contracts::extract::extract_json_object;
use huecraft_contracts::palette::{colors_from_object, BrandingContent};
use reqwest::blocking::Client as HttpClient;
use reqwest::header::CONTENT_TYPE;
use serde_json::{json, Value};

use crate::config::{AppConfig, TextModelConfig};
use crate::error::AiError;
use crate::http::response_json_or_error;

pub const TEXT_SERVICE: &str = "GitHub Models";

const COLOR_SYSTEM_PROMPT: &str = "You are a color palette generator. Generate 5 harmonious colors for a website based on the user's description. Return ONLY a JSON object with the following structure: {\"colors\": [{\"hex\": \"#XXXXXX\", \"name\": \"Color Name\", \"rgb\": \"rgb(XXX, XXX, XXX)\"}]}. Do not include any explanation or additional text.";

const BRANDING_SYSTEM_PROMPT: &str = "You are a branding expert. Based on the user's description, generate a brand title, a catchy slogan, and 3-5 practical tips to improve the brand. Return ONLY a JSON object with the following structure: {\"title\": \"Brand Title\", \"slogan\": \"Catchy Slogan\", \"tips\": [\"Tip 1\", \"Tip 2\", \"Tip 3\"]}. The title should be short and memorable. The slogan should be catchy and reflect the brand's values. Tips should be actionable and specific. Do not include any explanation or additional text.";

const COLOR_ERROR: &str = "Failed to generate color palette";
const BRANDING_ERROR: &str = "Failed to generate branding content";

/// The text model seam used by the palette workflow.
pub trait TextClient: Send + Sync {
    fn has_credential(&self) -> bool;
    fn request_color_palette(&self, prompt: &str) -> Result<Vec<Color>, AiError>;
    fn request_branding(&self, prompt: &str) -> Result<BrandingContent, AiError>;
}

#[derive(Debug, Clone, Copy)]
struct Sampling {
    temperature: f64,
    top_p: f64,
    max_tokens: u32,
}

const COLOR_SAMPLING: Sampling = Sampling {
    temperature: 0.7,
    top_p: 1.0,
    max_tokens: 500,
};

const BRANDING_SAMPLING: Sampling = Sampling {
    temperature: 0.8,
    top_p: 1.0,
    max_tokens: 800,
};

pub struct ChatCompletionsClient {
    http: HttpClient,
    config: TextModelConfig,
    timeout: Duration,
}

impl ChatCompletionsClient {
    pub fn new(config: TextModelConfig, timeout: Duration) -> Self {
        Self {
            http: HttpClient::new(),
            config,
            timeout,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(config.text.clone(), config.request_timeout)
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.config.api_base)
    }

    fn payload(&self, system_prompt: &str, prompt: &str, sampling: Sampling) -> Value {
        json!({
            "messages": [
                {"role": "system", "content": system_prompt},
                {"role": "user", "content": prompt},
            ],
            "model": self.config.model,
            "temperature": sampling.temperature,
            "top_p": sampling.top_p,
            "max_tokens": sampling.max_tokens,
        })
    }

    /// Sends one completion and returns the first choice's message content.
    fn complete(
        &self,
        system_prompt: &str,
        prompt: &str,
        sampling: Sampling,
        default_error: &str,
    ) -> Result<String, AiError> {
        let Some(token) = self.config.token.as_deref() else {
            return Err(AiError::CredentialMissing {
                service: TEXT_SERVICE,
            });
        };
        let endpoint = self.endpoint();
        tracing::debug!(model = %self.config.model, %endpoint, "sending chat completion");
        let response = self
            .http
            .post(&endpoint)
            .bearer_auth(token)
            .header(CONTENT_TYPE, "application/json")
            .timeout(self.timeout)
            .json(&self.payload(system_prompt, prompt, sampling))
            .send()
            .map_err(|source| AiError::Transport {
                service: TEXT_SERVICE,
                source,
            })?;
        let parsed = response_json_or_error(TEXT_SERVICE, response, default_error)?;
        first_choice_content(&parsed)
            .map(str::to_string)
            .ok_or(AiError::EmptyResponse {
                service: TEXT_SERVICE,
            })
    }
}

impl TextClient for ChatCompletionsClient {
    fn has_credential(&self) -> bool {
        self.config.token.is_some()
    }

    fn request_color_palette(&self, prompt: &str) -> Result<Vec<Color>, AiError> {
        let content = self.complete(COLOR_SYSTEM_PROMPT, prompt, COLOR_SAMPLING, COLOR_ERROR)?;
        let object = extract_json_object(&content).map_err(|source| AiError::Parse {
            service: TEXT_SERVICE,
            source,
        })?;
        colors_from_object(&object).map_err(|source| AiError::InvalidShape {
            service: TEXT_SERVICE,
            source,
        })
    }

    fn request_branding(&self, prompt: &str) -> Result<BrandingContent, AiError> {
        let content = self.complete(
            BRANDING_SYSTEM_PROMPT,
            prompt,
            BRANDING_SAMPLING,
            BRANDING_ERROR,
        )?;
        let object = extract_json_object(&content).map_err(|source| AiError::Parse {
            service: TEXT_SERVICE,
            source,
        })?;
        BrandingContent::from_object(&object).map_err(|source| AiError::InvalidShape {
            service: TEXT_SERVICE,
            source,
        })
    }
}

fn first_choice_content(response: &Value) -> Option<&str> {
    response
        .get("choices")
        .and_then(Value::as_array)
        .and_then(|choices| choices.first())
        .and_then(|choice| choice.get("message"))
        .and_then(|message| message.get("content"))
        .and_then(Value::as_str)
        .filter(|content| !content.trim().is_empty())
}
