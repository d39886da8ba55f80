//! Date-data anchoring for OCR'd Korean medical documents.
//!
//! Finds every date-bearing mention in the text, normalizes it to a calendar
//! date or range, reconciles conflicting and duplicate mentions and ranks the
//! survivors by clinical significance. See [`pipeline::orchestrator`] for the
//! entry point.

pub mod config;
pub mod pipeline;
pub mod pipeline_config;

pub use pipeline::{
    process, process_async, AnchoringError, HybridOrchestrator, MergeStrategyKind, ProcessOptions,
    ProcessingMode, ProcessingResult,
};
pub use pipeline_config::EngineConfig;
