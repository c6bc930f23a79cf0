//! Field-edit feedback.
//!
//! Rapid field edits are buffered, deduplicated per field path and
//! released in small batches once input goes quiet.

mod queue;
mod trigger;

pub use queue::{FeedbackQueue, FeedbackQueueConfig, FlushCallback};
pub use trigger::{FieldTrigger, TriggerSource};
