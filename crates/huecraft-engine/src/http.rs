use huecraft_contracts::extract::ExtractError;
use reqwest::blocking::Response as HttpResponse;
use serde_json::Value;

use crate::error::AiError;

/// Reads a response body as JSON, turning non-2xx statuses into
/// [`AiError::Http`] with the provider's `error.message` when it sent one.
pub(crate) fn response_json_or_error(
    service: &'static str,
    response: HttpResponse,
    default_message: &str,
) -> Result<Value, AiError> {
    let status = response.status();
    let code = status.as_u16();
    let body = response
        .text()
        .map_err(|source| AiError::Transport { service, source })?;
    if !status.is_success() {
        tracing::debug!(service, status = code, body = %truncate_text(&body, 512), "request rejected");
        return Err(AiError::Http {
            service,
            status: code,
            message: provider_error_message(&body).unwrap_or_else(|| default_message.to_string()),
        });
    }
    serde_json::from_str(&body).map_err(|err| AiError::Parse {
        service,
        source: ExtractError::Malformed(err),
    })
}

fn provider_error_message(body: &str) -> Option<String> {
    let parsed: Value = serde_json::from_str(body).ok()?;
    let message = parsed
        .get("error")
        .and_then(|error| error.get("message").or(Some(error)))
        .and_then(Value::as_str)?
        .trim();
    if message.is_empty() {
        None
    } else {
        Some(truncate_text(message, 512))
    }
}

pub(crate) fn truncate_text(value: &str, max_chars: usize) -> String {
    if value.chars().count() <= max_chars {
        return value.to_string();
    }
    value.chars().take(max_chars).collect::<String>() + "…"
}

#[cfg(test)]
mod tests {
    use super::{provider_error_message, truncate_text};

    #[test]
    fn error_message_from_nested_object_or_string() {
        assert_eq!(
            provider_error_message(r#"{"error":{"message":"Bad credentials","code":"401"}}"#)
                .as_deref(),
            Some("Bad credentials")
        );
        assert_eq!(
            provider_error_message(r#"{"error":"quota exceeded"}"#).as_deref(),
            Some("quota exceeded")
        );
        assert_eq!(provider_error_message(r#"{"error":{"message":"  "}}"#), None);
        assert_eq!(provider_error_message("<html>502</html>"), None);
    }

    #[test]
    fn truncates_on_char_boundary() {
        assert_eq!(truncate_text("héllo", 10), "héllo");
        assert_eq!(truncate_text("héllo", 2), "hé…");
    }
}
