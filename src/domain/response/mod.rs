//! Model output handling.
//!
//! Cleans model text before it reaches the user, pulls JSON payloads out of
//! free-form replies and defines the final turn result.

mod extractor;
mod result;
mod sanitizer;

pub use extractor::{extract_json_object, ExtractionError};
pub use result::{OrchestratorResult, FALLBACK_MESSAGE};
pub use sanitizer::{ResponseSanitizer, SanitizationError, MAX_RESPONSE_LENGTH};
