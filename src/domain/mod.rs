//! Domain layer containing the dialogue logic and its value types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared primitives (chapters, IDs, timestamps)
//! - `wizard` - Wizard state and the patch model that mutates it
//! - `conversation` - Conversation turns
//! - `behavior` - Interaction-style signals from recent user turns
//! - `conflict` - Inconsistencies between wishes, budget and constraints
//! - `anticipation` - Declarative proactive-guidance rules
//! - `planning` - The turn planner and its priority matrix
//! - `context` - Token-budgeted context pruning
//! - `feedback` - Debounced field-edit triggers
//! - `response` - Model output sanitization and the turn result

pub mod anticipation;
pub mod behavior;
pub mod conflict;
pub mod context;
pub mod conversation;
pub mod feedback;
pub mod foundation;
pub mod planning;
pub mod response;
pub mod wizard;
