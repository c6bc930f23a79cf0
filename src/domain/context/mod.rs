//! Context pruning for model calls.
//!
//! Builds the token-budgeted slice of wizard state, history and knowledge
//! that the language model is allowed to see for one turn.

mod full_context;
mod pruned;
mod pruner;

pub use full_context::{CustomerExample, FullContext, KnowledgeNugget};
pub use pruned::PrunedContext;
pub use pruner::{estimate_tokens, ContextPruner, PrunerConfig};
