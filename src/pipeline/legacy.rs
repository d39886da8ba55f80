//! Legacy block extractor.
//!
//! Cheap and deterministic: each line is a block, scanned with the section,
//! block and atomic patterns. No backward sweep, no conflict chain and no
//! weighted confidence. Inside a block the longest match at each position
//! wins and anything overlapping it is skipped; the survivors go through the
//! same near-duplicate merge as the core.

use crate::pipeline::error::AnchoringError;
use crate::pipeline::extraction::keywords::find_medical_keywords;
use crate::pipeline::extraction::{normalize_match, PatternExtractor, PatternFamily};
use crate::pipeline::processor::{DatePath, PathContext};
use crate::pipeline::resolution::hierarchy::hierarchy_score;
use crate::pipeline::resolution::merge_anchors;
use crate::pipeline::types::{
    DroppedAnchor, EnginePath, MedicalContextType, PathOutput, Span, Statistics,
};

/// Bonus for a block that mentions any medical keyword.
const KEYWORD_BONUS: f32 = 0.1;
const MAX_CONFIDENCE: f32 = 0.95;
/// Legacy anchors with a clinical role and at least this confidence are primary.
const PRIMARY_CONFIDENCE: f32 = 0.8;

#[derive(Debug, Default)]
pub struct LegacyExtractor;

impl DatePath for LegacyExtractor {
    fn path(&self) -> EnginePath {
        EnginePath::Legacy
    }

    fn run(&self, ctx: &PathContext<'_>) -> Result<PathOutput, AnchoringError> {
        let extractor = PatternExtractor::new(ctx.config.context_window, EnginePath::Legacy);
        let window = ctx.window();
        let mut statistics = Statistics::default();
        let mut primary = Vec::new();
        let mut secondary = Vec::new();

        let mut line_offset = 0;
        for line in ctx.text.split('\n') {
            let block_len = line.chars().count();
            let mut extraction = extractor.extract(line, PatternFamily::LEGACY);
            statistics.pattern_failures += extraction.pattern_failures;
            statistics.forward_anchors += extraction.anchors.len();
            extraction
                .anchors
                .sort_by_key(|a| (a.position.start, std::cmp::Reverse(a.position.end)));
            let bonus = if find_medical_keywords(line).is_empty() {
                0.0
            } else {
                KEYWORD_BONUS
            };

            let mut taken: Vec<Span> = Vec::new();
            for mut anchor in extraction.anchors {
                if taken.iter().any(|s| s.overlaps(&anchor.position)) {
                    continue;
                }
                taken.push(anchor.position);
                let position = Span::new(
                    anchor.position.start + line_offset,
                    anchor.position.end + line_offset,
                );
                match normalize_match(&anchor.raw_groups, ctx.reference, &window) {
                    Ok(date) => anchor.normalized_date = Some(date),
                    Err(reason) => {
                        statistics.dropped.push(DroppedAnchor {
                            source_text: anchor.source_text,
                            position,
                            reason,
                        });
                        continue;
                    }
                }

                anchor.position = position;
                anchor.confidence = (anchor.pattern_confidence + bonus).min(MAX_CONFIDENCE);
                anchor.hierarchy_score = hierarchy_score(&anchor, ctx.text_len(), &ctx.config.hierarchy);

                if anchor.medical_context.context_type != MedicalContextType::General
                    && anchor.confidence >= PRIMARY_CONFIDENCE
                {
                    primary.push(anchor);
                } else {
                    secondary.push(anchor);
                }
            }

            line_offset += block_len + 1;
        }

        let primary = merge_anchors(primary, ctx.day_threshold);
        let secondary = merge_anchors(secondary, ctx.day_threshold);
        statistics.merged_groups = primary.merged_groups + secondary.merged_groups;
        let mut evidence = primary.evidence;
        evidence.extend(secondary.evidence);

        tracing::debug!(
            primary = primary.anchors.len(),
            secondary = secondary.anchors.len(),
            dropped = statistics.dropped.len(),
            "Legacy path complete"
        );

        Ok(PathOutput {
            primary: primary.anchors,
            secondary: secondary.anchors,
            evidence,
            statistics,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::types::{NormalizedDate, PatternTier};
    use crate::pipeline_config::EngineConfig;
    use chrono::NaiveDate;

    fn reference() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    }

    fn run(text: &str) -> PathOutput {
        let config = EngineConfig::default();
        let ctx = PathContext::new(text, reference(), 7, &config);
        LegacyExtractor.run(&ctx).unwrap()
    }

    #[test]
    fn clinical_block_goes_primary() {
        let out = run("2024년 3월 2일 내원");
        assert_eq!(out.primary.len(), 1);
        assert_eq!(out.primary[0].pattern, "date_then_keyword");
        assert!((out.primary[0].confidence - 0.95).abs() < 1e-6);
        assert_eq!(out.primary[0].engine, EnginePath::Legacy);
    }

    #[test]
    fn plain_date_goes_secondary() {
        let out = run("참고 2024-03-02");
        assert!(out.primary.is_empty());
        assert_eq!(out.secondary.len(), 1);
    }

    #[test]
    fn positions_are_document_offsets() {
        let out = run("첫 줄\n둘째 2024-03-02");
        let anchor = out.all_anchors().next().unwrap();
        assert_eq!(anchor.position, Span::new(7, 17));
        assert_eq!(
            anchor.normalized_date,
            Some(NormalizedDate::Single(NaiveDate::from_ymd_opt(2024, 3, 2).unwrap()))
        );
    }

    #[test]
    fn range_outranks_its_endpoints() {
        let out = run("2024-01-10부터 2024-01-15까지 입원");
        let anchors: Vec<_> = out.all_anchors().collect();
        assert_eq!(anchors.len(), 1);
        assert_eq!(anchors[0].pattern, "date_range");
        assert_eq!(
            anchors[0].normalized_date,
            Some(NormalizedDate::Range {
                start: NaiveDate::from_ymd_opt(2024, 1, 10).unwrap(),
                end: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
            })
        );
    }

    #[test]
    fn keyword_block_is_extracted() {
        let out = run("입원기간: 2024-01-02");
        let anchor = out.all_anchors().next().unwrap();
        assert_eq!(anchor.tier, PatternTier::Block);
        assert_eq!(anchor.medical_context.context_type, MedicalContextType::Treatment);
        assert_eq!(out.primary.len(), 1);
    }

    #[test]
    fn invalid_dates_dropped() {
        let out = run("2024-13-01 진료");
        assert_eq!(out.primary.len() + out.secondary.len(), 0);
        assert_eq!(out.statistics.dropped.len(), 1);
    }
}
