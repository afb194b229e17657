use huecraft_contracts::color::ColorError;
use huecraft_contracts::extract::ExtractError;
use huecraft_contracts::palette::ShapeError;
use thiserror::Error;

/// Failures talking to the remote text and image models.
#[derive(Debug, Error)]
pub enum AiError {
    #[error("{service} credential not configured")]
    CredentialMissing { service: &'static str },
    #[error("{service} request failed ({status}): {message}")]
    Http {
        service: &'static str,
        status: u16,
        message: String,
    },
    #[error("{service} request could not be sent")]
    Transport {
        service: &'static str,
        #[source]
        source: reqwest::Error,
    },
    #[error("invalid response format from {service}")]
    Parse {
        service: &'static str,
        #[source]
        source: ExtractError,
    },
    #[error("unexpected response shape from {service}")]
    InvalidShape {
        service: &'static str,
        #[source]
        source: ShapeError,
    },
    #[error("empty response from {service}")]
    EmptyResponse { service: &'static str },
    #[error("no image data in response from {service}")]
    NoImageData {
        service: &'static str,
        text: Option<String>,
    },
    #[error("{service} image payload is not valid base64")]
    ImageDecode {
        service: &'static str,
        #[source]
        source: base64::DecodeError,
    },
    #[error("{0} worker stopped before finishing")]
    WorkerPanicked(&'static str),
}

impl AiError {
    pub fn is_credential_missing(&self) -> bool {
        matches!(self, Self::CredentialMissing { .. })
    }
}

#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("please enter a description for your brand")]
    EmptyPrompt,
    #[error("no palette to save; generate one first")]
    NoCurrentPalette,
    #[error("text model credential not configured; AI mode unavailable")]
    CredentialMissing,
    #[error("generation {ticket} superseded by a newer request")]
    Superseded { ticket: u64 },
}

#[derive(Debug, Error)]
pub enum StudioError {
    #[error("please generate a color palette first")]
    NoPalette,
    #[error("please enter a brand name")]
    EmptyBrandName,
    #[error("no colors available to apply to the image")]
    NoColors,
    #[error("custom palettes need at least two colors")]
    TooFewCustomColors,
    #[error("uploaded image is empty")]
    EmptyImage,
    #[error(transparent)]
    InvalidColor(#[from] ColorError),
    #[error(transparent)]
    Ai(#[from] AiError),
    #[error("placeholder logo rendering failed")]
    Render(#[source] image::ImageError),
}

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("invalid user id '{0}'")]
    InvalidUserId(String),
    #[error("document store request could not be sent")]
    Transport(#[source] reqwest::Error),
    #[error("document store rejected the write ({status}): {message}")]
    Http { status: u16, message: String },
    #[error(transparent)]
    Store(#[from] anyhow::Error),
}
