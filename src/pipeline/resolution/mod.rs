//! Post-extraction stages: conflict resolution, confidence scoring,
//! primary/secondary classification and near-duplicate merging.

pub mod confidence;
pub mod conflict;
pub mod hierarchy;
pub mod merge;

pub use confidence::{compute_confidence, confidence_band, ConfidenceFactors};
pub use conflict::{resolve_conflicts, ConflictOutcome};
pub use hierarchy::{classify, Classified};
pub use merge::{merge_anchors, MergeOutcome};
