//! Engine paths.
//!
//! A `DatePath` turns normalized text into primary/secondary anchors. The
//! orchestrator holds two of them (legacy and core) behind trait objects so
//! either can be substituted, e.g. with a failing path in tests.

use chrono::NaiveDate;

use crate::pipeline::error::AnchoringError;
use crate::pipeline::extraction::{catalogue, DualSweepAnalyzer, PlausibilityWindow};
use crate::pipeline::resolution::{classify, merge_anchors, resolve_conflicts};
use crate::pipeline::types::{EnginePath, PathOutput, Statistics};
use crate::pipeline_config::EngineConfig;

// ---------------------------------------------------------------------------
// Path interface
// ---------------------------------------------------------------------------

/// Read-only inputs shared by both paths of one `process` call.
pub struct PathContext<'a> {
    /// Normalized text.
    pub text: &'a str,
    pub reference: NaiveDate,
    /// Merge threshold in days.
    pub day_threshold: i64,
    pub config: &'a EngineConfig,
    text_len: usize,
}

impl<'a> PathContext<'a> {
    pub fn new(text: &'a str, reference: NaiveDate, day_threshold: i64, config: &'a EngineConfig) -> Self {
        Self {
            text,
            reference,
            day_threshold,
            config,
            text_len: text.chars().count(),
        }
    }

    /// Length of the text in characters.
    pub fn text_len(&self) -> usize {
        self.text_len
    }

    pub fn window(&self) -> PlausibilityWindow {
        PlausibilityWindow::around(
            self.reference,
            self.config.plausibility_years_back,
            self.config.plausibility_years_forward,
        )
    }
}

/// One way of producing anchors from text.
pub trait DatePath: Send + Sync {
    fn path(&self) -> EnginePath;

    fn run(&self, ctx: &PathContext<'_>) -> Result<PathOutput, AnchoringError>;
}

// ---------------------------------------------------------------------------
// Core engine
// ---------------------------------------------------------------------------

/// Full pipeline: dual sweep → conflicts → confidence/hierarchy → merge.
#[derive(Debug, Default)]
pub struct CoreEngine;

impl DatePath for CoreEngine {
    fn path(&self) -> EnginePath {
        EnginePath::Core
    }

    fn run(&self, ctx: &PathContext<'_>) -> Result<PathOutput, AnchoringError> {
        if catalogue().is_empty() {
            return Err(AnchoringError::path(EnginePath::Core, "no date patterns available"));
        }
        let config = ctx.config;

        // Stage 1: forward + backward sweeps, normalized and cross-checked
        let sweep = DualSweepAnalyzer::new(config.context_window, ctx.reference, ctx.window())
            .analyze(ctx.text);
        let mut statistics = Statistics {
            forward_anchors: sweep.forward_count,
            backward_anchors: sweep.backward_count,
            corroborated: sweep.corroborated,
            pattern_failures: sweep.pattern_failures,
            dropped: sweep.dropped,
            ..Statistics::default()
        };
        let mut evidence = sweep.evidence;

        // Stage 2: one winner per conflict
        let conflicts = resolve_conflicts(sweep.anchors, ctx.reference, &config.conflict);
        conflicts.report(&mut statistics, &mut evidence);

        // Stage 3: two-pass confidence + hierarchy
        let classified = classify(conflicts.survivors, ctx.text_len(), config);

        // Stage 4: near-duplicates, per bucket
        let primary = merge_anchors(classified.primary, ctx.day_threshold);
        let secondary = merge_anchors(classified.secondary, ctx.day_threshold);
        statistics.merged_groups = primary.merged_groups + secondary.merged_groups;
        evidence.extend(primary.evidence);
        evidence.extend(secondary.evidence);

        tracing::debug!(
            primary = primary.anchors.len(),
            secondary = secondary.anchors.len(),
            conflicts = statistics.conflicts_detected,
            "Core path complete"
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
    use crate::pipeline::types::{EvidenceKind, NormalizedDate};

    fn reference() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    }

    fn run(text: &str) -> PathOutput {
        let config = EngineConfig::default();
        let ctx = PathContext::new(text, reference(), 7, &config);
        CoreEngine.run(&ctx).unwrap()
    }

    #[test]
    fn context_counts_characters() {
        let config = EngineConfig::default();
        let ctx = PathContext::new("진단 2024", reference(), 7, &config);
        assert_eq!(ctx.text_len(), 7);
        assert_eq!(ctx.window().earliest, NaiveDate::from_ymd_opt(2014, 6, 1).unwrap());
    }

    #[test]
    fn overlapping_tiers_leave_one_anchor() {
        let out = run("2024년 3월 2일 진단");
        assert_eq!(out.primary.len() + out.secondary.len(), 1);
        let anchor = out.all_anchors().next().unwrap();
        assert_eq!(
            anchor.normalized_date,
            Some(NormalizedDate::Single(NaiveDate::from_ymd_opt(2024, 3, 2).unwrap()))
        );
        assert!(out.statistics.conflicts_detected >= 1);
        assert!(out.evidence.iter().any(|e| e.kind == EvidenceKind::Conflict));
    }

    #[test]
    fn statistics_track_both_sweeps() {
        let out = run("2024-01-15 외래 방문. 날짜 확인: 2024-01-15");
        assert_eq!(out.statistics.backward_anchors, 1);
        assert!(out.statistics.forward_anchors >= 2);
        assert!(out.all_anchors().any(|a| a.corroborated));
    }

    #[test]
    fn text_without_dates_is_empty_success() {
        let out = run("특이 소견 없음");
        assert!(out.primary.is_empty());
        assert!(out.secondary.is_empty());
    }
}
