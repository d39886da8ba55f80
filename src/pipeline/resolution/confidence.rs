use serde::Serialize;

use crate::pipeline::types::{DateAnchor, HierarchyLevel};
use crate::pipeline_config::{ConfidenceConfig, ConfidenceWeights};

/// Confidence bands used in evidence text
pub mod thresholds {
    /// Below this: date likely misread or incidental.
    pub const LOW: f32 = 0.50;

    /// Below this: usable but worth a second look.
    pub const MODERATE: f32 = 0.70;

    /// Above this: reliable anchor.
    pub const HIGH: f32 = 0.85;
}

pub fn confidence_band(confidence: f32) -> &'static str {
    if confidence >= thresholds::HIGH {
        "high"
    } else if confidence >= thresholds::MODERATE {
        "moderate"
    } else if confidence >= thresholds::LOW {
        "low"
    } else {
        "very_low"
    }
}

/// The five `[0,1]` factors behind an anchor's confidence.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ConfidenceFactors {
    pub pattern: f32,
    pub context: f32,
    pub medical: f32,
    pub position: f32,
    pub validation: f32,
}

impl ConfidenceFactors {
    /// Score `anchor` found in a text of `text_len` characters.
    pub fn of(anchor: &DateAnchor, text_len: usize, context_window: usize, config: &ConfidenceConfig) -> Self {
        Self {
            pattern: anchor.pattern_confidence,
            context: context_factor(anchor, context_window),
            medical: anchor.medical_context.clinical_significance,
            position: 1.0 - config.position_penalty * position_ratio(anchor.position.start, text_len),
            validation: if anchor.corroborated {
                config.corroborated_factor
            } else {
                config.uncorroborated_factor
            },
        }
    }

    pub fn weighted(&self, weights: &ConfidenceWeights) -> f32 {
        let sum = self.pattern * weights.pattern
            + self.context * weights.context
            + self.medical * weights.medical
            + self.position * weights.position
            + self.validation * weights.validation;
        sum.clamp(0.0, 1.0)
    }
}

/// Offset of `start` relative to the text length, in `[0,1]`.
pub fn position_ratio(start: usize, text_len: usize) -> f32 {
    if text_len == 0 {
        return 0.0;
    }
    (start as f32 / text_len as f32).min(1.0)
}

/// Medical keywords in the context raise the factor, each worth 0.15 up to
/// three; a full-width context window adds up to another 0.15.
fn context_factor(anchor: &DateAnchor, context_window: usize) -> f32 {
    let keywords = (0.15 * anchor.medical_context.keywords.len() as f32).min(0.45);
    let full_width = (2 * context_window).max(1) as f32;
    let coverage = (anchor.context.chars().count() as f32 / full_width).min(1.0);
    (0.4 + keywords + 0.15 * coverage).min(1.0)
}

/// Weighted confidence of `anchor` for the given hierarchy level.
pub fn compute_confidence(
    anchor: &DateAnchor,
    text_len: usize,
    context_window: usize,
    level: HierarchyLevel,
    config: &ConfidenceConfig,
) -> f32 {
    let weights = match level {
        HierarchyLevel::Primary => &config.primary_weights,
        HierarchyLevel::Secondary => &config.secondary_weights,
    };
    ConfidenceFactors::of(anchor, text_len, context_window, config).weighted(weights)
}
