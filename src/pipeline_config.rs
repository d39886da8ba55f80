//! Engine configuration.
//!
//! Every empirical constant used by conflict resolution, confidence scoring,
//! hierarchy classification and adaptive mode selection lives here, so the
//! engine can be recalibrated from JSON without touching code. Defaults are
//! the values observed to reproduce the reference output distributions.

use serde::{Deserialize, Serialize};

use crate::pipeline::error::AnchoringError;

/// Upper bound on either side of the plausibility window.
pub const MAX_PLAUSIBILITY_YEARS: u32 = 200;

// ═══════════════════════════════════════════════════════════
// Types
// ═══════════════════════════════════════════════════════════

/// Five-factor weight set for the confidence calculator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceWeights {
    pub pattern: f32,
    pub context: f32,
    pub medical: f32,
    pub position: f32,
    pub validation: f32,
}

impl ConfidenceWeights {
    pub fn primary() -> Self {
        Self {
            pattern: 0.30,
            context: 0.25,
            medical: 0.25,
            position: 0.10,
            validation: 0.10,
        }
    }

    pub fn secondary() -> Self {
        Self {
            pattern: 0.25,
            context: 0.20,
            medical: 0.20,
            position: 0.15,
            validation: 0.20,
        }
    }

    pub fn total(&self) -> f32 {
        self.pattern + self.context + self.medical + self.position + self.validation
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConflictConfig {
    /// Confidence gap above which the more confident anchor wins.
    pub confidence_gap: f32,
    /// Medical-priority gap above which the higher priority wins.
    pub medical_priority_gap: u32,
    /// Character distance above which the earlier anchor wins.
    pub position_distance: usize,
    /// Same-role anchors further apart than this (days) contradict each other.
    pub logical_day_gap: i64,
}

impl Default for ConflictConfig {
    fn default() -> Self {
        Self {
            confidence_gap: 0.2,
            medical_priority_gap: 10,
            position_distance: 100,
            logical_day_gap: 365,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfidenceConfig {
    pub primary_weights: ConfidenceWeights,
    pub secondary_weights: ConfidenceWeights,
    /// Validation factor for anchors confirmed by the backward sweep.
    pub corroborated_factor: f32,
    pub uncorroborated_factor: f32,
    /// Position factor is `1 - position_penalty * positionRatio`.
    pub position_penalty: f32,
}

impl Default for ConfidenceConfig {
    fn default() -> Self {
        Self {
            primary_weights: ConfidenceWeights::primary(),
            secondary_weights: ConfidenceWeights::secondary(),
            corroborated_factor: 0.9,
            uncorroborated_factor: 0.7,
            position_penalty: 0.3,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HierarchyConfig {
    pub confidence_scale: f32,
    pub priority_scale: f32,
    pub position_scale: f32,
    pub max_score: f32,
    /// Anchors scoring at least this are primary.
    pub primary_threshold: f32,
}

impl Default for HierarchyConfig {
    fn default() -> Self {
        Self {
            confidence_scale: 50.0,
            priority_scale: 0.3,
            position_scale: 20.0,
            max_score: 100.0,
            primary_threshold: 80.0,
        }
    }
}

/// Thresholds for adaptive mode selection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AdaptiveConfig {
    /// At most this many dates and no relative expressions: legacy.
    pub sparse_max_dates: usize,
    /// Medical keywords per 100 characters at or above which text is dense.
    pub dense_keyword_density: f32,
    /// Dense text needs at least this many dates to go to the core engine.
    pub dense_min_dates: usize,
}

impl Default for AdaptiveConfig {
    fn default() -> Self {
        Self {
            sparse_max_dates: 2,
            dense_keyword_density: 2.0,
            dense_min_dates: 3,
        }
    }
}

/// Complete engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Characters taken on each side of a match as its context.
    pub context_window: usize,
    pub plausibility_years_back: u32,
    pub plausibility_years_forward: u32,
    pub conflict: ConflictConfig,
    pub confidence: ConfidenceConfig,
    pub hierarchy: HierarchyConfig,
    pub adaptive: AdaptiveConfig,
    /// Confidence added to legacy/core agreements in consensus merging.
    pub consensus_boost: f32,
    pub consensus_cap: f32,
    /// Longest accepted input, in characters.
    pub max_input_chars: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            context_window: 50,
            plausibility_years_back: 10,
            plausibility_years_forward: 1,
            conflict: ConflictConfig::default(),
            confidence: ConfidenceConfig::default(),
            hierarchy: HierarchyConfig::default(),
            adaptive: AdaptiveConfig::default(),
            consensus_boost: 0.2,
            consensus_cap: 0.95,
            max_input_chars: 2_000_000,
        }
    }
}

impl EngineConfig {
    /// Load an override from JSON. Missing fields keep their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, AnchoringError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), AnchoringError> {
        for (name, weights) in [
            ("primary_weights", &self.confidence.primary_weights),
            ("secondary_weights", &self.confidence.secondary_weights),
        ] {
            if (weights.total() - 1.0).abs() > 0.01 {
                return Err(AnchoringError::Config(format!(
                    "{name} must sum to 1.0, got {:.2}",
                    weights.total()
                )));
            }
        }
        if !(0.0..=1.0).contains(&self.consensus_cap) {
            return Err(AnchoringError::Config(
                "consensus_cap must lie in [0, 1]".into(),
            ));
        }
        if self.plausibility_years_back > MAX_PLAUSIBILITY_YEARS
            || self.plausibility_years_forward > MAX_PLAUSIBILITY_YEARS
        {
            return Err(AnchoringError::Config(format!(
                "plausibility window must not exceed {MAX_PLAUSIBILITY_YEARS} years"
            )));
        }
        if self.max_input_chars == 0 {
            return Err(AnchoringError::Config(
                "max_input_chars must be positive".into(),
            ));
        }
        Ok(())
    }
}

// ═══════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════
