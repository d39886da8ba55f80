use chrono::NaiveDate;

use super::dates::{normalize_match, PlausibilityWindow};
use super::extractor::PatternExtractor;
use super::patterns::PatternFamily;
use crate::pipeline::types::{
    DateAnchor, DroppedAnchor, EnginePath, Evidence, EvidenceKind,
};

/// Normalized anchors of both sweeps plus the bookkeeping the caller reports.
#[derive(Debug, Default)]
pub struct SweepOutcome {
    /// Forward anchors followed by unmatched backward anchors, sorted by position.
    pub anchors: Vec<DateAnchor>,
    pub evidence: Vec<Evidence>,
    pub forward_count: usize,
    pub backward_count: usize,
    pub corroborated: usize,
    pub pattern_failures: usize,
    pub dropped: Vec<DroppedAnchor>,
}

/// Runs the forward (tiered) and backward (confirmation) sweeps and
/// cross-checks them.
pub struct DualSweepAnalyzer {
    extractor: PatternExtractor,
    window: PlausibilityWindow,
    reference: NaiveDate,
}

impl DualSweepAnalyzer {
    pub fn new(context_window: usize, reference: NaiveDate, window: PlausibilityWindow) -> Self {
        Self {
            extractor: PatternExtractor::new(context_window, EnginePath::Core),
            window,
            reference,
        }
    }

    pub fn analyze(&self, text: &str) -> SweepOutcome {
        let mut outcome = SweepOutcome::default();

        let forward = self.extractor.extract(text, PatternFamily::FORWARD);
        let backward = self.extractor.extract(text, PatternFamily::BACKWARD);
        outcome.pattern_failures = forward.pattern_failures + backward.pattern_failures;
        outcome.forward_count = forward.anchors.len();
        outcome.backward_count = backward.anchors.len();

        let mut forward = self.normalize_all(forward.anchors, &mut outcome.dropped);
        let backward = self.normalize_all(backward.anchors, &mut outcome.dropped);

        let mut standalone = Vec::new();
        for confirmation in backward {
            let mut confirmed_any = false;
            // The phrase's own date token is not a second sighting.
            for anchor in forward.iter_mut().filter(|a| {
                !a.position.overlaps(&confirmation.position)
                    && a.normalized_date == confirmation.normalized_date
            }) {
                if !anchor.corroborated {
                    anchor.corroborated = true;
                    outcome.corroborated += 1;
                }
                confirmed_any = true;
                outcome.evidence.push(Evidence {
                    kind: EvidenceKind::Corroboration,
                    anchor_id: anchor.id.clone(),
                    detail: format!(
                        "'{}' confirmed by '{}' at {}",
                        anchor.source_text, confirmation.source_text, confirmation.position.start
                    ),
                });
            }
            if !confirmed_any {
                standalone.push(confirmation);
            }
        }

        tracing::debug!(
            forward = outcome.forward_count,
            backward = outcome.backward_count,
            corroborated = outcome.corroborated,
            dropped = outcome.dropped.len(),
            "Dual sweep complete"
        );

        forward.extend(standalone);
        forward.sort_by_key(|a| (a.position.start, a.position.end));
        outcome.anchors = forward;
        outcome
    }

    /// Resolve every anchor to a calendar date; anchors that fail are left
    /// out. Each bad token is recorded once, however many patterns matched it.
    fn normalize_all(&self, anchors: Vec<DateAnchor>, dropped: &mut Vec<DroppedAnchor>) -> Vec<DateAnchor> {
        anchors
            .into_iter()
            .filter_map(|mut anchor| {
                match normalize_match(&anchor.raw_groups, self.reference, &self.window) {
                    Ok(date) => {
                        anchor.normalized_date = Some(date);
                        Some(anchor)
                    }
                    Err(reason) => {
                        tracing::debug!(text = %anchor.source_text, ?reason, "Dropping anchor");
                        if dropped.iter().any(|d| d.position.overlaps(&anchor.position)) {
                            return None;
                        }
                        dropped.push(DroppedAnchor {
                            source_text: anchor.source_text,
                            position: anchor.position,
                            reason,
                        });
                        None
                    }
                }
            })
            .collect()
    }
}
