//! Image edits and logo generation through Gemini `generateContent`.

use std::time::Duration;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use huecraft_contracts::color::Color;
use reqwest::blocking::Client as HttpClient;
use serde_json::{json, Value};

use crate::config::{AppConfig, ImageModelConfig};
use crate::error::AiError;
use crate::http::response_json_or_error;

pub const IMAGE_SERVICE: &str = "Gemini";

const DEFAULT_ERROR: &str = "Gemini image request failed";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedImage {
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

impl GeneratedImage {
    /// File extension matching the mime type, `png` when unknown.
    pub fn extension(&self) -> &'static str {
        match self.mime_type.as_str() {
            "image/jpeg" | "image/jpg" => "jpg",
            "image/webp" => "webp",
            "image/gif" => "gif",
            _ => "png",
        }
    }
}

pub trait ImageClient: Send + Sync {
    fn has_credential(&self) -> bool;
    fn edit_image(&self, image: &[u8], colors: &[Color]) -> Result<GeneratedImage, AiError>;
    fn generate_logo(
        &self,
        brand_name: &str,
        description: &str,
        colors: &[Color],
    ) -> Result<GeneratedImage, AiError>;
}

pub fn edit_prompt(colors: &[Color]) -> String {
    let description = colors
        .iter()
        .map(Color::to_string)
        .collect::<Vec<String>>()
        .join(", ");
    format!(
        "Edit this image using the following color palette: {description}. Apply these colors in a natural and aesthetically pleasing way that respects the image content. Make sure the result looks professional and the colors blend well together."
    )
}

pub fn logo_prompt(brand_name: &str, description: &str, colors: &[Color]) -> String {
    let color_list = colors
        .iter()
        .map(Color::hex)
        .collect::<Vec<&str>>()
        .join(", ");
    format!(
        "Create a professional, minimalist logo for a brand named \"{brand_name}\". The brand is about: {description}. Use these colors: {color_list}. Make it clean, modern and memorable, suitable for a company website and marketing materials. Do not include any text in the logo."
    )
}

/// Sniffs the upload so the request declares the right mime type.
pub fn mime_for_bytes(bytes: &[u8]) -> &'static str {
    match image::guess_format(bytes) {
        Ok(format) => format.to_mime_type(),
        Err(_) => "image/png",
    }
}

pub struct GeminiImageClient {
    http: HttpClient,
    config: ImageModelConfig,
    timeout: Duration,
}

impl GeminiImageClient {
    pub fn new(config: ImageModelConfig, timeout: Duration) -> Self {
        Self {
            http: HttpClient::new(),
            config,
            timeout,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(config.image.clone(), config.request_timeout)
    }

    fn endpoint_for_model(&self, model: &str) -> String {
        let trimmed = model.trim();
        let model_path = if trimmed.starts_with("models/") {
            trimmed.to_string()
        } else {
            format!("models/{trimmed}")
        };
        format!("{}/{}:generateContent", self.config.api_base, model_path)
    }

    fn generate(&self, parts: Vec<Value>) -> Result<GeneratedImage, AiError> {
        let Some(api_key) = self.config.api_key.as_deref() else {
            return Err(AiError::CredentialMissing {
                service: IMAGE_SERVICE,
            });
        };
        let endpoint = self.endpoint_for_model(&self.config.model);
        let payload = json!({
            "contents": [{"role": "user", "parts": parts}],
            "generationConfig": {"responseModalities": ["Text", "Image"]},
        });
        tracing::debug!(model = %self.config.model, %endpoint, "sending image request");
        let response = self
            .http
            .post(&endpoint)
            .query(&[("key", api_key)])
            .timeout(self.timeout)
            .json(&payload)
            .send()
            .map_err(|source| AiError::Transport {
                service: IMAGE_SERVICE,
                source,
            })?;
        let parsed = response_json_or_error(IMAGE_SERVICE, response, DEFAULT_ERROR)?;
        extract_first_image(&parsed)
    }
}

impl ImageClient for GeminiImageClient {
    fn has_credential(&self) -> bool {
        self.config.api_key.is_some()
    }

    fn edit_image(&self, image: &[u8], colors: &[Color]) -> Result<GeneratedImage, AiError> {
        self.generate(vec![
            json!({"text": edit_prompt(colors)}),
            json!({
                "inlineData": {
                    "mimeType": mime_for_bytes(image),
                    "data": BASE64.encode(image),
                }
            }),
        ])
    }

    fn generate_logo(
        &self,
        brand_name: &str,
        description: &str,
        colors: &[Color],
    ) -> Result<GeneratedImage, AiError> {
        self.generate(vec![json!({
            "text": logo_prompt(brand_name, description, colors)
        })])
    }
}

/// Returns the first inline image of the first candidate. Text parts are kept
/// for the error when the model answered without an image.
fn extract_first_image(response_payload: &Value) -> Result<GeneratedImage, AiError> {
    let candidate = response_payload
        .get("candidates")
        .and_then(Value::as_array)
        .and_then(|candidates| candidates.first())
        .ok_or(AiError::EmptyResponse {
            service: IMAGE_SERVICE,
        })?;
    let parts = candidate
        .get("content")
        .and_then(|content| content.get("parts"))
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();

    let mut text_parts = Vec::new();
    for part in &parts {
        if let Some(text) = part.get("text").and_then(Value::as_str) {
            if !text.trim().is_empty() {
                text_parts.push(text.trim().to_string());
            }
        }
        let Some(inline) = part
            .get("inlineData")
            .or_else(|| part.get("inline_data"))
            .and_then(Value::as_object)
        else {
            continue;
        };
        let data = inline
            .get("data")
            .and_then(Value::as_str)
            .unwrap_or_default();
        if data.is_empty() {
            continue;
        }
        let bytes = BASE64
            .decode(data.as_bytes())
            .map_err(|source| AiError::ImageDecode {
                service: IMAGE_SERVICE,
                source,
            })?;
        let mime_type = inline
            .get("mimeType")
            .or_else(|| inline.get("mime_type"))
            .and_then(Value::as_str)
            .unwrap_or("image/png")
            .to_string();
        return Ok(GeneratedImage { bytes, mime_type });
    }

    Err(AiError::NoImageData {
        service: IMAGE_SERVICE,
        text: if text_parts.is_empty() {
            None
        } else {
            Some(text_parts.join("\n"))
        },
    })
}
