//! Turn planning.
//!
//! The planner is the central arbiter of a turn: it weighs conflicts,
//! proactive guidance and the user's own message and emits one [`TurnPlan`].

mod plan;
mod planner;

pub use plan::{Route, TurnGoal, TurnPlan, TurnPriority};
pub use planner::TurnPlanner;
