pub mod error;
pub mod extraction;
pub mod legacy;
pub mod orchestrator; // Entry point: mode dispatch, hybrid join, fallback
pub mod processor; // DatePath trait + core engine
pub mod resolution;
pub mod strategy; // Adaptive mode selection + hybrid merge strategies
pub mod types;

pub use error::AnchoringError;
pub use orchestrator::{process, process_async, HybridOrchestrator, ProcessOptions};
pub use strategy::{MergeStrategyKind, ProcessingMode};
pub use types::*;
