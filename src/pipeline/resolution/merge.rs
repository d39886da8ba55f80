//! Near-duplicate merging.
//!
//! Anchors are walked in normalized-date order; each one joins the current
//! group when it lies within the day threshold of the anchor added just
//! before it. A chain of close dates therefore merges even when its ends are
//! further apart than the threshold. The output is a fixed point: merging it
//! again with the same threshold changes nothing.

use crate::pipeline::types::{DateAnchor, Evidence, EvidenceKind};

#[derive(Debug, Default)]
pub struct MergeOutcome {
    pub anchors: Vec<DateAnchor>,
    pub evidence: Vec<Evidence>,
    /// Groups of two or more anchors collapsed into one.
    pub merged_groups: usize,
}

pub fn merge_anchors(mut anchors: Vec<DateAnchor>, day_threshold: i64) -> MergeOutcome {
    anchors.sort_by_key(|a| (a.anchor_date(), a.position.start));

    let mut groups: Vec<Vec<DateAnchor>> = Vec::new();
    for anchor in anchors {
        let joins_last = groups
            .last()
            .and_then(|g| g.last())
            .and_then(|prev| Some((prev.anchor_date()?, anchor.anchor_date()?)))
            .is_some_and(|(prev, next)| (next - prev).num_days().abs() <= day_threshold);
        match groups.last_mut() {
            Some(group) if joins_last => group.push(anchor),
            _ => groups.push(vec![anchor]),
        }
    }

    let mut outcome = MergeOutcome::default();
    for group in groups {
        if group.len() == 1 {
            outcome.anchors.extend(group);
            continue;
        }
        let merged = collapse(group);
        outcome.merged_groups += 1;
        outcome.evidence.push(Evidence {
            kind: EvidenceKind::Merge,
            anchor_id: merged.id.clone(),
            detail: format!(
                "{} anchors within {day_threshold} days merged into '{}'",
                merged.merged_count, merged.source_text
            ),
        });
        outcome.anchors.push(merged);
    }

    outcome
}

/// Keep the most confident member (earliest on ties) as representative.
fn collapse(mut group: Vec<DateAnchor>) -> DateAnchor {
    let mean = group.iter().map(|a| a.confidence).sum::<f32>() / group.len() as f32;
    let corroborated = group.iter().any(|a| a.corroborated);

    let best = group
        .iter()
        .enumerate()
        .fold(0, |best, (i, a)| if a.confidence > group[best].confidence { i } else { best });

    let mut merged = group.remove(best);
    for absorbed in group {
        merged.merged_from.push(absorbed.id);
        merged.merged_from.extend(absorbed.merged_from);
    }
    merged.merged_count = merged.merged_from.len() + 1;
    merged.confidence = mean.clamp(0.0, 1.0);
    merged.corroborated = corroborated;
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::resolution::conflict::tests::anchor;
    use crate::pipeline::types::MedicalContextType;

    fn at(id: &str, day: u32, confidence: f32) -> DateAnchor {
        anchor(id, day as usize * 20, day as usize * 20 + 10, (2024, 1, day), confidence, MedicalContextType::General)
    }

    #[test]
    fn same_date_in_two_formats_merges() {
        let outcome = merge_anchors(vec![at("a", 15, 0.6), at("b", 15, 0.8)], 7);
        assert_eq!(outcome.anchors.len(), 1);
        let merged = &outcome.anchors[0];
        assert_eq!(merged.id, "b");
        assert_eq!(merged.merged_from, vec!["a".to_string()]);
        assert_eq!(merged.merged_count, 2);
        assert!((merged.confidence - 0.7).abs() < 1e-6);
        assert_eq!(outcome.merged_groups, 1);
    }

    #[test]
    fn distant_dates_stay_apart() {
        let outcome = merge_anchors(vec![at("a", 1, 0.6), at("b", 20, 0.8)], 7);
        assert_eq!(outcome.anchors.len(), 2);
        assert!(outcome.anchors.iter().all(|a| a.merged_count == 1));
    }

    #[test]
    fn chained_dates_merge_into_one_group() {
        // Day 1 and day 11 are 10 days apart but each sits within 5 days of day 6.
        let outcome = merge_anchors(vec![at("a", 1, 0.7), at("b", 6, 0.7), at("c", 11, 0.7)], 5);
        assert_eq!(outcome.anchors.len(), 1);
        assert_eq!(outcome.anchors[0].merged_count, 3);
        assert_eq!(outcome.anchors[0].id, "a");
    }

    #[test]
    fn merging_is_a_fixed_point() {
        let first = merge_anchors(
            vec![at("a", 1, 0.7), at("b", 3, 0.9), at("c", 20, 0.5), at("d", 28, 0.6)],
            7,
        );
        let again = merge_anchors(first.anchors.clone(), 7);
        assert_eq!(again.merged_groups, 0);
        let ids = |v: &[DateAnchor]| v.iter().map(|a| (a.id.clone(), a.merged_count)).collect::<Vec<_>>();
        assert_eq!(ids(&first.anchors), ids(&again.anchors));
    }

    #[test]
    fn corroboration_survives_merge() {
        let mut a = at("a", 2, 0.6);
        a.corroborated = true;
        let outcome = merge_anchors(vec![a, at("b", 2, 0.9)], 7);
        assert!(outcome.anchors[0].corroborated);
    }

    #[test]
    fn nested_merges_flatten_provenance() {
        let mut a = at("a", 2, 0.9);
        a.merged_from = vec!["x".into()];
        a.merged_count = 2;
        let mut b = at("b", 3, 0.5);
        b.merged_from = vec!["y".into(), "z".into()];
        b.merged_count = 3;
        let outcome = merge_anchors(vec![a, b], 7);
        let merged = &outcome.anchors[0];
        assert_eq!(merged.merged_from, vec!["x", "b", "y", "z"]);
        assert_eq!(merged.merged_count, 5);
    }
}
