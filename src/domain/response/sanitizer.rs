//! Response sanitization.

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

/// Maximum accepted model reply (100KB).
pub const MAX_RESPONSE_LENGTH: usize = 100_000;

static INJECTION_MARKERS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)(```(system|assistant)|\[/?INST\]|<\|(system|assistant|user|im_start|im_end)\|>|<</?SYS>>)",
    )
    .expect("injection pattern must compile")
});

static EXCESS_BLANK_LINES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\n{3,}").expect("blank line pattern must compile"));

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SanitizationError {
    #[error("Response too long: {actual} bytes exceeds maximum of {max} bytes")]
    TooLong { max: usize, actual: usize },

    #[error("Response is empty after sanitization")]
    Empty,
}

/// Cleans model text before it is shown to the user.
#[derive(Debug, Clone, Default)]
pub struct ResponseSanitizer {
    additional_patterns: Vec<String>,
}

impl ResponseSanitizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Extra literal markers to strip.
    pub fn with_additional_patterns(mut self, patterns: Vec<String>) -> Self {
        self.additional_patterns = patterns;
        self
    }

    /// Rejects oversized input, drops control characters and role markers,
    /// and collapses runs of blank lines. Text that ends up empty is an error.
    pub fn sanitize(&self, response: &str) -> Result<String, SanitizationError> {
        if response.len() > MAX_RESPONSE_LENGTH {
            return Err(SanitizationError::TooLong {
                max: MAX_RESPONSE_LENGTH,
                actual: response.len(),
            });
        }

        let visible: String = response
            .chars()
            .filter(|c| !c.is_control() || matches!(c, '\n' | '\t'))
            .collect();

        let mut stripped = INJECTION_MARKERS.replace_all(&visible, "").into_owned();
        for pattern in &self.additional_patterns {
            stripped = stripped.replace(pattern.as_str(), "");
        }

        let collapsed = EXCESS_BLANK_LINES.replace_all(stripped.trim(), "\n\n");
        if collapsed.is_empty() {
            return Err(SanitizationError::Empty);
        }
        Ok(collapsed.into_owned())
    }
}
