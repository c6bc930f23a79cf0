//! JSON extraction from free-form model replies.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use thiserror::Error;

static CODE_FENCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)```(?:json|JSON)?\s*\n(.*?)```").expect("code fence pattern must compile")
});

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ExtractionError {
    #[error("No JSON object found in reply")]
    NotFound,

    #[error("JSON parse error: {0}")]
    Parse(String),
}

/// Finds and parses the JSON object in a model reply.
///
/// Looks inside a fenced code block first, then for the first balanced
/// `{...}` in the text. Surrounding prose is ignored.
pub fn extract_json_object(reply: &str) -> Result<Value, ExtractionError> {
    let trimmed = reply.trim();

    let candidate = CODE_FENCE
        .captures(trimmed)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim())
        .filter(|body| body.starts_with('{'))
        .or_else(|| balanced_object(trimmed))
        .ok_or(ExtractionError::NotFound)?;

    match serde_json::from_str::<Value>(candidate) {
        Ok(value @ Value::Object(_)) => Ok(value),
        Ok(_) => Err(ExtractionError::NotFound),
        Err(e) => Err(ExtractionError::Parse(e.to_string())),
    }
}

/// First balanced `{...}` span, honouring string literals and escapes.
fn balanced_object(s: &str) -> Option<&str> {
    let start = s.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, c) in s[start..].char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' if in_string => escaped = true,
            '"' => in_string = !in_string,
            _ if in_string => {}
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&s[start..start + offset + 1]);
                }
            }
            _ => {}
        }
    }
    None
}
