//! Application layer - Use cases composed from domain services and ports.
//!
//! - `chapter_start` - Opening message for a newly entered chapter
//! - `orchestrator` - One model call per turn, validated and scored
//! - `turn_pipeline` - Full per-message flow over an explicit session

pub mod chapter_start;
pub mod orchestrator;
pub mod templates;
pub mod turn_pipeline;

pub use chapter_start::{ChapterInitializer, ChapterOpeningResponse};
pub use orchestrator::{GenerateRequest, ResponseOrchestrator};
pub use turn_pipeline::{
    DialogueSession, RejectedPatch, TurnInput, TurnOutcome, TurnPipeline, TurnPipelineConfig,
};
