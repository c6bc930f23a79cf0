//! Wizard state boundary.
//!
//! The wizard keeps free-form answers per chapter. This module offers
//! lenient lookup over that data and the patch model used to mutate it.

mod patch;
mod state;

pub use patch::{Patch, PatchDelta, PatchError, PatchOperation, ProposedPatch};
pub use state::{ProjectType, WizardState};
