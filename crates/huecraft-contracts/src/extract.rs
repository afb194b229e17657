//! Best-effort recovery of a JSON object from free-form model output.
//!
//! Models are asked for bare JSON but routinely wrap it in prose or Markdown
//! fences. Candidates are tried in order: the whole (unfenced) text, the first
//! brace-balanced `{...}` span, then the widest `{ ... }` span.

use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("model output is empty")]
    Empty,
    #[error("model output contains no JSON object")]
    NoObject,
    #[error("model output JSON is not an object")]
    NotAnObject,
    #[error("model output JSON is malformed")]
    Malformed(#[source] serde_json::Error),
}

pub fn strip_code_fence(text: &str) -> String {
    let raw = text.trim();
    if !(raw.starts_with("```") && raw.ends_with("```")) {
        return raw.to_string();
    }
    let lines: Vec<&str> = raw.lines().collect();
    if lines.len() < 2 {
        return raw.to_string();
    }
    let mut body = lines[1..lines.len() - 1].join("\n").trim().to_string();
    if body.to_ascii_lowercase().starts_with("json") {
        body = body[4..].trim().to_string();
    }
    body
}

pub fn extract_json_object(text: &str) -> Result<Map<String, Value>, ExtractError> {
    let raw = strip_code_fence(text);
    if raw.is_empty() {
        return Err(ExtractError::Empty);
    }

    let mut candidates = vec![raw.as_str()];
    if let Some(span) = balanced_object_span(&raw) {
        candidates.push(span);
    }
    if let (Some(start), Some(end)) = (raw.find('{'), raw.rfind('}')) {
        if end > start {
            candidates.push(&raw[start..=end]);
        }
    }

    let mut last_err = None;
    let mut saw_non_object = false;
    for candidate in candidates {
        match serde_json::from_str::<Value>(candidate) {
            Ok(Value::Object(object)) => return Ok(object),
            Ok(_) => saw_non_object = true,
            Err(err) => last_err = Some(err),
        }
    }

    if !raw.contains('{') {
        if saw_non_object {
            return Err(ExtractError::NotAnObject);
        }
        return Err(ExtractError::NoObject);
    }
    match last_err {
        Some(err) => Err(ExtractError::Malformed(err)),
        None => Err(ExtractError::NotAnObject),
    }
}

/// The span from the first `{` to its matching `}`, skipping braces that sit
/// inside string literals.
fn balanced_object_span(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(&text[start..=start + offset]);
                }
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{extract_json_object, strip_code_fence, ExtractError};

    #[test]
    fn bare_object_parses() -> anyhow::Result<()> {
        let object = extract_json_object(r##"{"colors": [{"hex": "#FFFFFF"}]}"##)?;
        assert_eq!(object["colors"][0]["hex"], json!("#FFFFFF"));
        Ok(())
    }

    #[test]
    fn prose_wrapped_object_parses() -> anyhow::Result<()> {
        let text = "Sure! Here is your palette:\n{\"title\": \"Brewline\", \"slogan\": \"Sip {slow}\", \"tips\": []}\nLet me know if you want changes {or not}.";
        let object = extract_json_object(text)?;
        assert_eq!(object["title"], json!("Brewline"));
        assert_eq!(object["slogan"], json!("Sip {slow}"));
        Ok(())
    }

    #[test]
    fn fenced_object_parses() -> anyhow::Result<()> {
        let text = "```json\n{\"title\": \"A\", \"slogan\": \"B\", \"tips\": [\"c\"]}\n```";
        assert_eq!(
            strip_code_fence(text),
            "{\"title\": \"A\", \"slogan\": \"B\", \"tips\": [\"c\"]}"
        );
        let object = extract_json_object(text)?;
        assert_eq!(object["tips"], json!(["c"]));
        Ok(())
    }

    #[test]
    fn fence_inside_prose_parses() -> anyhow::Result<()> {
        let text = "Palette below.\n```json\n{\"colors\": []}\n```\nEnjoy!";
        let object = extract_json_object(text)?;
        assert_eq!(object["colors"], json!([]));
        Ok(())
    }

    #[test]
    fn malformed_object_is_reported() {
        let err = extract_json_object("{\"title\": \"A\", \"slogan\": }").err();
        assert!(matches!(err, Some(ExtractError::Malformed(_))), "{err:?}");
    }

    #[test]
    fn text_without_braces_is_no_object() {
        assert!(matches!(
            extract_json_object("I cannot help with that."),
            Err(ExtractError::NoObject)
        ));
        assert!(matches!(extract_json_object("   "), Err(ExtractError::Empty)));
        assert!(matches!(
            extract_json_object("[1, 2, 3]"),
            Err(ExtractError::NotAnObject)
        ));
    }
}
