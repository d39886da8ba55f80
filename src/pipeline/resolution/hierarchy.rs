//! Primary/secondary classification.
//!
//! Two passes: a provisional confidence (primary weights) feeds the
//! hierarchy score that picks the bucket, then confidence is recomputed with
//! the weight set of the bucket the anchor landed in.

use super::confidence::{compute_confidence, position_ratio};
use crate::pipeline::types::{DateAnchor, HierarchyLevel};
use crate::pipeline_config::{EngineConfig, HierarchyConfig};

/// `confidence×50 + medicalPriority×0.3 + (1 − start/len)×20`, capped at 100.
pub fn hierarchy_score(anchor: &DateAnchor, text_len: usize, config: &HierarchyConfig) -> f32 {
    let score = anchor.confidence * config.confidence_scale
        + anchor.medical_priority() as f32 * config.priority_scale
        + (1.0 - position_ratio(anchor.position.start, text_len)) * config.position_scale;
    score.min(config.max_score)
}

pub fn level_for(score: f32, config: &HierarchyConfig) -> HierarchyLevel {
    if score >= config.primary_threshold {
        HierarchyLevel::Primary
    } else {
        HierarchyLevel::Secondary
    }
}

/// Buckets produced by the classifier. Together they hold every input anchor
/// exactly once.
#[derive(Debug, Default)]
pub struct Classified {
    pub primary: Vec<DateAnchor>,
    pub secondary: Vec<DateAnchor>,
}

pub fn classify(anchors: Vec<DateAnchor>, text_len: usize, config: &EngineConfig) -> Classified {
    let mut classified = Classified::default();

    for mut anchor in anchors {
        anchor.confidence = compute_confidence(
            &anchor,
            text_len,
            config.context_window,
            HierarchyLevel::Primary,
            &config.confidence,
        );
        anchor.hierarchy_score = hierarchy_score(&anchor, text_len, &config.hierarchy);

        let level = level_for(anchor.hierarchy_score, &config.hierarchy);
        anchor.confidence = compute_confidence(
            &anchor,
            text_len,
            config.context_window,
            level,
            &config.confidence,
        );

        match level {
            HierarchyLevel::Primary => classified.primary.push(anchor),
            HierarchyLevel::Secondary => classified.secondary.push(anchor),
        }
    }

    classified
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::resolution::conflict::tests::anchor;
    use crate::pipeline::types::{MedicalContext, MedicalContextType};

    #[test]
    fn score_combines_three_terms() {
        let config = HierarchyConfig::default();
        let a = anchor("a", 0, 10, (2024, 1, 1), 0.8, MedicalContextType::CurrentVisit);
        // 0.8×50 + 100×0.3 + 1×20
        assert!((hierarchy_score(&a, 100, &config) - 90.0).abs() < 1e-4);
    }

    #[test]
    fn score_is_capped() {
        let config = HierarchyConfig::default();
        let a = anchor("a", 0, 10, (2024, 1, 1), 1.0, MedicalContextType::CurrentVisit);
        assert!((hierarchy_score(&a, 100, &config) - 100.0).abs() < f32::EPSILON);
    }

    #[test]
    fn threshold_is_inclusive() {
        let config = HierarchyConfig::default();
        assert_eq!(level_for(80.0, &config), HierarchyLevel::Primary);
        assert_eq!(level_for(79.9, &config), HierarchyLevel::Secondary);
    }

    #[test]
    fn classification_partitions_input() {
        let config = EngineConfig::default();
        let mut visit = anchor("visit", 0, 10, (2024, 1, 1), 0.85, MedicalContextType::CurrentVisit);
        visit.medical_context = MedicalContext::of(
            MedicalContextType::CurrentVisit,
            vec!["내원".into(), "검사".into()],
        );
        visit.context = "가".repeat(60);
        let general = anchor("general", 80, 90, (2023, 1, 1), 0.6, MedicalContextType::General);

        let classified = classify(vec![visit, general], 100, &config);
        assert_eq!(classified.primary.len(), 1);
        assert_eq!(classified.secondary.len(), 1);
        assert_eq!(classified.primary[0].id, "visit");
        assert_eq!(classified.secondary[0].id, "general");
    }

    #[test]
    fn final_confidence_uses_bucket_weights() {
        let config = EngineConfig::default();
        let general = anchor("general", 80, 90, (2023, 1, 1), 0.6, MedicalContextType::General);
        let expected = compute_confidence(
            &general,
            100,
            config.context_window,
            HierarchyLevel::Secondary,
            &config.confidence,
        );
        let classified = classify(vec![general], 100, &config);
        assert!((classified.secondary[0].confidence - expected).abs() < f32::EPSILON);
    }
}
