//! System conflicts.
//!
//! A conflict is an inconsistency between stated wishes, budget and physical
//! constraints. Conflicts are detected from wizard state and feed the turn
//! planner, which gives blocking conflicts precedence over everything else.

mod detector;
mod system_conflict;

pub use detector::{ConflictDetector, RuleBasedConflictDetector, AMBITION_BUDGET_FLOOR};
pub use system_conflict::{ConflictSeverity, ConflictType, SystemConflict};
