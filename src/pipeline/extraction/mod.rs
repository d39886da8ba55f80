//! Text normalization and date extraction: the pattern catalogue, the
//! tiered extractor and the dual forward/backward sweep.

pub mod dates;
pub mod extractor;
pub mod keywords;
pub mod patterns;
pub mod sanitize;
pub mod sweep;

pub use dates::{normalize_match, PlausibilityWindow};
pub use extractor::{Extraction, PatternExtractor, TextIndex};
pub use patterns::{catalogue, PatternFamily};
pub use sanitize::normalize_text;
pub use sweep::{DualSweepAnalyzer, SweepOutcome};
