//! Top-level entry point.
//!
//! Validates and normalizes the input, resolves the processing mode, runs
//! the selected engine path(s) and turns the surviving anchors into a
//! `ProcessingResult`. Hybrid mode runs both paths on scoped threads over the
//! same borrowed text; either may fail without failing the call.

use std::thread;
use std::time::Instant;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::pipeline::error::AnchoringError;
use crate::pipeline::extraction::normalize_text;
use crate::pipeline::legacy::LegacyExtractor;
use crate::pipeline::processor::{CoreEngine, DatePath, PathContext};
use crate::pipeline::resolution::{confidence_band, merge_anchors};
use crate::pipeline::strategy::{MergeStrategyKind, ProcessingMode};
use crate::pipeline::types::{
    EnginePath, Evidence, EvidenceKind, Hierarchy, HierarchyLevel, PathOutput, ProcessingResult,
    TimelineEntry,
};
use crate::pipeline_config::EngineConfig;

/// Per-call options.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessOptions {
    pub mode: ProcessingMode,
    pub merge_strategy: MergeStrategyKind,
    /// Resolves relative dates and anchors the plausibility window. Today when absent.
    pub reference_date: Option<NaiveDate>,
    /// Day window within which near-duplicate anchors merge.
    pub medium_day_threshold: i64,
    /// Retry with the legacy path alone when the selected mode fails.
    pub enable_fallback: bool,
}

impl Default for ProcessOptions {
    fn default() -> Self {
        Self {
            mode: ProcessingMode::Adaptive,
            merge_strategy: MergeStrategyKind::Confidence,
            reference_date: None,
            medium_day_threshold: 7,
            enable_fallback: true,
        }
    }
}

/// Dispatches between the legacy and core paths.
pub struct HybridOrchestrator {
    config: EngineConfig,
    legacy: Box<dyn DatePath>,
    core: Box<dyn DatePath>,
}

impl HybridOrchestrator {
    pub fn new(config: EngineConfig) -> Result<Self, AnchoringError> {
        Self::with_paths(config, Box::new(LegacyExtractor), Box::new(CoreEngine))
    }

    /// Use substitute engine paths.
    pub fn with_paths(
        config: EngineConfig,
        legacy: Box<dyn DatePath>,
        core: Box<dyn DatePath>,
    ) -> Result<Self, AnchoringError> {
        config.validate()?;
        Ok(Self {
            config,
            legacy,
            core,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn process(&self, text: &str, options: &ProcessOptions) -> Result<ProcessingResult, AnchoringError> {
        let started = Instant::now();
        self.validate(text, options)?;

        let normalized = normalize_text(text);
        let reference = options
            .reference_date
            .unwrap_or_else(|| chrono::Local::now().date_naive());
        let mode = options.mode.resolve(&normalized, &self.config.adaptive);

        tracing::info!(
            requested = %options.mode,
            mode = %mode,
            chars = normalized.chars().count(),
            reference = %reference,
            "Processing document text"
        );

        if normalized.is_empty() {
            let merge_strategy = (mode == ProcessingMode::Hybrid).then_some(options.merge_strategy);
            return Ok(self.finalize(PathOutput::default(), mode, merge_strategy, None, started));
        }

        let ctx = PathContext::new(&normalized, reference, options.medium_day_threshold, &self.config);
        let attempt = match mode {
            ProcessingMode::Legacy => self.legacy.run(&ctx).map(|output| (output, None)),
            ProcessingMode::Hybrid => self.run_hybrid(&ctx, options.merge_strategy),
            ProcessingMode::Core | ProcessingMode::Adaptive => self.core.run(&ctx).map(|output| (output, None)),
        };

        match attempt {
            Ok((output, merge_strategy)) => Ok(self.finalize(output, mode, merge_strategy, None, started)),
            Err(err) if options.enable_fallback && mode != ProcessingMode::Legacy => {
                tracing::warn!(mode = %mode, error = %err, "Falling back to legacy path");
                match self.legacy.run(&ctx) {
                    Ok(output) => Ok(self.finalize(
                        output,
                        ProcessingMode::Legacy,
                        None,
                        Some(err.to_string()),
                        started,
                    )),
                    Err(legacy_err) => {
                        let core = match err {
                            AnchoringError::Aggregate { core, .. } => core,
                            other => other.to_string(),
                        };
                        tracing::error!(legacy = %legacy_err, core = %core, "All engine paths failed");
                        Err(AnchoringError::Aggregate {
                            legacy: legacy_err.to_string(),
                            core,
                        })
                    }
                }
            }
            Err(err) => {
                tracing::error!(mode = %mode, error = %err, "Processing failed");
                Err(err)
            }
        }
    }

    fn validate(&self, text: &str, options: &ProcessOptions) -> Result<(), AnchoringError> {
        if options.medium_day_threshold < 0 {
            return Err(AnchoringError::InvalidInput(format!(
                "medium_day_threshold must not be negative, got {}",
                options.medium_day_threshold
            )));
        }
        let chars = text.chars().count();
        if chars > self.config.max_input_chars {
            return Err(AnchoringError::InvalidInput(format!(
                "text has {chars} characters, limit is {}",
                self.config.max_input_chars
            )));
        }
        Ok(())
    }

    /// Run both paths concurrently and merge whatever survives. The strategy
    /// comes back only when both paths produced output and were joined.
    fn run_hybrid(
        &self,
        ctx: &PathContext<'_>,
        strategy: MergeStrategyKind,
    ) -> Result<(PathOutput, Option<MergeStrategyKind>), AnchoringError> {
        let (legacy, core) = thread::scope(|s| {
            let legacy = s.spawn(|| self.legacy.run(ctx));
            let core = s.spawn(|| self.core.run(ctx));
            (
                legacy
                    .join()
                    .unwrap_or_else(|_| Err(AnchoringError::path(EnginePath::Legacy, "path panicked"))),
                core.join()
                    .unwrap_or_else(|_| Err(AnchoringError::path(EnginePath::Core, "path panicked"))),
            )
        });

        match (legacy, core) {
            (Ok(legacy), Ok(core)) => {
                let merger = strategy.merger();
                tracing::debug!(strategy = merger.kind().as_str(), "Merging legacy and core results");
                let joined = merger.merge(legacy, core, &self.config);
                Ok((merge_joined(joined, ctx.day_threshold), Some(strategy)))
            }
            (Ok(mut survivor), Err(failed)) | (Err(failed), Ok(mut survivor)) => {
                tracing::warn!(error = %failed, "Engine path failed, continuing with the other");
                survivor.statistics.path_errors.push(failed.to_string());
                Ok((survivor, None))
            }
            (Err(legacy), Err(core)) => Err(AnchoringError::Aggregate {
                legacy: legacy.to_string(),
                core: core.to_string(),
            }),
        }
    }

    fn finalize(
        &self,
        output: PathOutput,
        mode: ProcessingMode,
        merge_strategy: Option<MergeStrategyKind>,
        fallback_error: Option<String>,
        started: Instant,
    ) -> ProcessingResult {
        let PathOutput {
            primary,
            secondary,
            mut evidence,
            mut statistics,
        } = output;

        let mut timeline = Vec::with_capacity(primary.len() + secondary.len());
        for (level, anchors) in [
            (HierarchyLevel::Primary, &primary),
            (HierarchyLevel::Secondary, &secondary),
        ] {
            for anchor in anchors {
                let Some(date) = anchor.normalized_date else {
                    continue;
                };
                evidence.push(Evidence {
                    kind: EvidenceKind::Anchor,
                    anchor_id: anchor.id.clone(),
                    detail: format!(
                        "{} '{}' → {date} ({:?}, {} confidence)",
                        anchor.category,
                        anchor.source_text,
                        level,
                        confidence_band(anchor.confidence)
                    ),
                });
                timeline.push((
                    anchor.position.start,
                    TimelineEntry {
                        date,
                        anchor_id: anchor.id.clone(),
                        level,
                        context_type: anchor.medical_context.context_type,
                    },
                ));
            }
        }
        timeline.sort_by_key(|(start, entry)| (entry.date.start(), *start));

        let total = primary.len() + secondary.len();
        let overall_confidence = if total == 0 {
            0.0
        } else {
            primary
                .iter()
                .chain(secondary.iter())
                .map(|a| a.confidence)
                .sum::<f32>()
                / total as f32
        };

        statistics.total_dates = total;
        statistics.primary_count = primary.len();
        statistics.secondary_count = secondary.len();
        statistics.processing_ms = started.elapsed().as_millis() as u64;

        tracing::info!(
            mode = %mode,
            primary = statistics.primary_count,
            secondary = statistics.secondary_count,
            dropped = statistics.dropped.len(),
            conflicts = statistics.conflicts_detected,
            fallback = fallback_error.is_some(),
            elapsed_ms = statistics.processing_ms,
            "Date anchoring complete"
        );

        ProcessingResult {
            primary,
            secondary,
            hierarchy: Hierarchy {
                timeline: timeline.into_iter().map(|(_, entry)| entry).collect(),
            },
            overall_confidence,
            evidence,
            statistics,
            mode: mode.to_string(),
            merge_strategy: merge_strategy.map(|s| s.as_str().to_string()),
            fallback_error,
        }
    }
}

/// Both paths may report the same date; fold the joined buckets the way a
/// single path folds its own.
fn merge_joined(mut output: PathOutput, day_threshold: i64) -> PathOutput {
    let primary = merge_anchors(std::mem::take(&mut output.primary), day_threshold);
    let secondary = merge_anchors(std::mem::take(&mut output.secondary), day_threshold);
    output.statistics.merged_groups += primary.merged_groups + secondary.merged_groups;
    output.evidence.extend(primary.evidence);
    output.evidence.extend(secondary.evidence);
    output.primary = primary.anchors;
    output.secondary = secondary.anchors;
    output
}

/// Process `text` with the default engine configuration.
pub fn process(text: &str, options: &ProcessOptions) -> Result<ProcessingResult, AnchoringError> {
    HybridOrchestrator::new(EngineConfig::default())?.process(text, options)
}

/// `process` on Tokio's blocking pool, for async callers.
pub async fn process_async(text: String, options: ProcessOptions) -> Result<ProcessingResult, AnchoringError> {
    tokio::task::spawn_blocking(move || process(&text, &options))
        .await
        .map_err(|e| AnchoringError::Runtime(format!("processing task failed: {e}")))?
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::pipeline::types::{AnchorCategory, MedicalContextType, NormalizedDate};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn options(mode: ProcessingMode, reference: NaiveDate) -> ProcessOptions {
        ProcessOptions {
            mode,
            reference_date: Some(reference),
            ..ProcessOptions::default()
        }
    }

    struct FailingPath(EnginePath);

    impl DatePath for FailingPath {
        fn path(&self) -> EnginePath {
            self.0
        }

        fn run(&self, _ctx: &PathContext<'_>) -> Result<PathOutput, AnchoringError> {
            Err(AnchoringError::path(self.0, "simulated failure"))
        }
    }

    struct PanickingPath;

    impl DatePath for PanickingPath {
        fn path(&self) -> EnginePath {
            EnginePath::Core
        }

        fn run(&self, _ctx: &PathContext<'_>) -> Result<PathOutput, AnchoringError> {
            panic!("simulated panic")
        }
    }

    fn orchestrator(legacy: Box<dyn DatePath>, core: Box<dyn DatePath>) -> HybridOrchestrator {
        HybridOrchestrator::with_paths(EngineConfig::default(), legacy, core).unwrap()
    }

    const MIXED_TEXT: &str = "2024-01-10 외래 내원, 3일 전부터 두통 호소.\n2024-01-12 혈액검사 시행.\n2024-02-01 재진 예정";

    // ── Scenarios ────────────────────────────────────────────

    #[test]
    fn scenario_visit_date_with_examination() {
        let text = "환자는 2024년 12월 15일에 내원하여 검사를 받았습니다.";
        for mode in [ProcessingMode::Core, ProcessingMode::Adaptive, ProcessingMode::Legacy] {
            let result = process(text, &options(mode, date(2024, 12, 20))).unwrap();
            assert_eq!(result.total_dates(), 1, "mode {mode}");
            let anchor = result.all_anchors().next().unwrap();
            assert_eq!(anchor.normalized_date, Some(NormalizedDate::Single(date(2024, 12, 15))));
            assert!(matches!(anchor.category, AnchorCategory::Medical | AnchorCategory::Absolute));
            assert!(matches!(
                anchor.medical_context.context_type,
                MedicalContextType::CurrentVisit | MedicalContextType::Examination
            ));
            assert!(anchor.confidence >= 0.8, "mode {mode}: {}", anchor.confidence);
        }
    }

    #[test]
    fn scenario_visit_date_hybrid_reports_it_once() {
        let text = "환자는 2024년 12월 15일에 내원하여 검사를 받았습니다.";
        for strategy in [
            MergeStrategyKind::Confidence,
            MergeStrategyKind::Consensus,
            MergeStrategyKind::Priority,
        ] {
            let opts = ProcessOptions {
                merge_strategy: strategy,
                ..options(ProcessingMode::Hybrid, date(2024, 12, 20))
            };
            let result = process(text, &opts).unwrap();
            assert_eq!(result.total_dates(), 1, "strategy {}", strategy.as_str());
            let anchor = result.all_anchors().next().unwrap();
            assert_eq!(anchor.normalized_date, Some(NormalizedDate::Single(date(2024, 12, 15))));
            assert!(anchor.confidence >= 0.8);
        }
    }

    #[test]
    fn scenario_same_date_two_formats_merges() {
        let text = "기록 2024-01-15 (2024년 1월 15일) 참고";
        let result = process(text, &options(ProcessingMode::Core, date(2024, 6, 1))).unwrap();
        assert_eq!(result.total_dates(), 1);
        let anchor = result.all_anchors().next().unwrap();
        assert_eq!(anchor.merged_count, 2);
        assert_eq!(anchor.merged_from.len(), 1);
        assert_eq!(result.statistics.merged_groups, 1);
    }

    #[test]
    fn scenario_diagnosis_dates_years_apart_conflict() {
        let text = "2015년 3월 2일 진단 받음. 2024년 3월 5일 진단 유지.";
        let result = process(text, &options(ProcessingMode::Core, date(2024, 6, 1))).unwrap();
        assert!(result.statistics.conflicts_detected > 0);
        let diagnosis: Vec<_> = result
            .all_anchors()
            .filter(|a| a.medical_context.context_type == MedicalContextType::Diagnosis)
            .collect();
        assert_eq!(diagnosis.len(), 1);
        assert!(result.evidence.iter().any(|e| e.kind == EvidenceKind::Conflict));
    }

    #[test]
    fn scenario_empty_input_is_empty_success() {
        for text in ["", "   \n\t "] {
            let result = process(text, &ProcessOptions::default()).unwrap();
            assert_eq!(result.total_dates(), 0);
            assert_eq!(result.statistics.total_dates, 0);
            assert!(result.hierarchy.timeline.is_empty());
            assert_eq!(result.overall_confidence, 0.0);
        }
    }

    #[test]
    fn scenario_invalid_month_is_absent() {
        let text = "2024-13-01 진료 기록";
        for mode in [ProcessingMode::Core, ProcessingMode::Legacy, ProcessingMode::Hybrid] {
            let result = process(text, &options(mode, date(2024, 6, 1))).unwrap();
            assert_eq!(result.total_dates(), 0, "mode {mode}");
            assert!(result.statistics.dropped_anchors() > 0);
        }
    }

    // ── Properties ───────────────────────────────────────────

    #[test]
    fn result_dates_are_normalized_and_plausible() {
        let reference = date(2024, 6, 1);
        let text = "2010-01-01 과거력. 2024-01-10 외래 내원\n2030-05-05 예정\n어제 통증 발생";
        for mode in [ProcessingMode::Core, ProcessingMode::Legacy, ProcessingMode::Hybrid] {
            let result = process(text, &options(mode, reference)).unwrap();
            for anchor in result.all_anchors() {
                let normalized = anchor.normalized_date.expect("surviving anchors are normalized");
                for d in [normalized.start(), normalized.end()] {
                    assert!(d.format("%Y-%m-%d").to_string().len() == 10);
                    assert!((2014..=2025).contains(&chrono::Datelike::year(&d)), "{d}");
                }
            }
        }
    }

    #[test]
    fn confidence_is_bounded_everywhere() {
        for strategy in [
            MergeStrategyKind::Confidence,
            MergeStrategyKind::Consensus,
            MergeStrategyKind::Priority,
        ] {
            let opts = ProcessOptions {
                merge_strategy: strategy,
                ..options(ProcessingMode::Hybrid, date(2024, 6, 1))
            };
            let result = process(MIXED_TEXT, &opts).unwrap();
            assert!(result.total_dates() > 0);
            assert!(result.all_anchors().all(|a| (0.0..=1.0).contains(&a.confidence)));
            assert!((0.0..=1.0).contains(&result.overall_confidence));
            assert_eq!(result.merge_strategy.as_deref(), Some(strategy.as_str()));
        }
    }

    #[test]
    fn primary_and_secondary_are_disjoint() {
        let result = process(MIXED_TEXT, &options(ProcessingMode::Core, date(2024, 6, 1))).unwrap();
        let primary: HashSet<_> = result.primary.iter().map(|a| a.id.as_str()).collect();
        let secondary: HashSet<_> = result.secondary.iter().map(|a| a.id.as_str()).collect();
        assert!(primary.is_disjoint(&secondary));
        assert_eq!(result.statistics.total_dates, primary.len() + secondary.len());
    }

    #[test]
    fn merging_the_result_again_changes_nothing() {
        for mode in [ProcessingMode::Core, ProcessingMode::Legacy, ProcessingMode::Hybrid] {
            let opts = options(mode, date(2024, 6, 1));
            let result = process(MIXED_TEXT, &opts).unwrap();
            for bucket in [&result.primary, &result.secondary] {
                let again = merge_anchors(bucket.clone(), opts.medium_day_threshold);
                assert_eq!(again.merged_groups, 0, "mode {mode}");
                assert_eq!(again.anchors.len(), bucket.len(), "mode {mode}");
            }
        }
    }

    #[test]
    fn full_width_digits_are_read() {
        let text = "２０２４년 １월 １５일 내원";
        let result = process(text, &options(ProcessingMode::Core, date(2024, 6, 1))).unwrap();
        assert_eq!(result.total_dates(), 1);
        assert_eq!(result.statistics.pattern_failures, 0);
        let anchor = result.all_anchors().next().unwrap();
        assert_eq!(anchor.normalized_date, Some(NormalizedDate::Single(date(2024, 1, 15))));
    }

    #[test]
    fn processing_is_deterministic() {
        let opts = options(ProcessingMode::Core, date(2024, 6, 1));
        let summary = |r: &ProcessingResult| {
            r.all_anchors()
                .map(|a| (a.source_text.clone(), a.normalized_date, a.merged_count))
                .collect::<Vec<_>>()
        };
        let first = process(MIXED_TEXT, &opts).unwrap();
        let second = process(MIXED_TEXT, &opts).unwrap();
        assert_eq!(summary(&first), summary(&second));
    }

    #[test]
    fn timeline_is_chronological_and_complete() {
        let result = process(MIXED_TEXT, &options(ProcessingMode::Core, date(2024, 6, 1))).unwrap();
        let timeline = &result.hierarchy.timeline;
        assert_eq!(timeline.len(), result.total_dates());
        assert!(timeline.windows(2).all(|w| w[0].date.start() <= w[1].date.start()));
        assert_eq!(
            result.evidence.iter().filter(|e| e.kind == EvidenceKind::Anchor).count(),
            result.total_dates()
        );
    }

    // ── Modes and failures ───────────────────────────────────

    #[test]
    fn adaptive_mode_reports_the_mode_it_ran() {
        let result = process("2024-01-15 외래", &options(ProcessingMode::Adaptive, date(2024, 6, 1))).unwrap();
        assert_eq!(result.mode, "legacy");
        assert!(result.merge_strategy.is_none());
    }

    #[test]
    fn hybrid_survives_one_failing_path() {
        let orch = orchestrator(Box::new(LegacyExtractor), Box::new(FailingPath(EnginePath::Core)));
        let result = orch
            .process(MIXED_TEXT, &options(ProcessingMode::Hybrid, date(2024, 6, 1)))
            .unwrap();
        assert!(result.total_dates() > 0);
        assert!(!result.is_fallback());
        assert_eq!(result.mode, "hybrid");
        assert!(result.merge_strategy.is_none());
        assert_eq!(result.statistics.path_errors.len(), 1);
        assert!(result.statistics.path_errors[0].contains("simulated failure"));
    }

    #[test]
    fn hybrid_survives_a_panicking_path() {
        let orch = orchestrator(Box::new(LegacyExtractor), Box::new(PanickingPath));
        let result = orch
            .process(MIXED_TEXT, &options(ProcessingMode::Hybrid, date(2024, 6, 1)))
            .unwrap();
        assert!(result.statistics.path_errors[0].contains("panicked"));
    }

    #[test]
    fn core_failure_falls_back_to_legacy() {
        let orch = orchestrator(Box::new(LegacyExtractor), Box::new(FailingPath(EnginePath::Core)));
        let result = orch
            .process(MIXED_TEXT, &options(ProcessingMode::Core, date(2024, 6, 1)))
            .unwrap();
        assert!(result.is_fallback());
        assert_eq!(result.mode, "legacy");
        assert!(result.fallback_error.unwrap().contains("simulated failure"));
    }

    #[test]
    fn core_failure_without_fallback_is_an_error() {
        let orch = orchestrator(Box::new(LegacyExtractor), Box::new(FailingPath(EnginePath::Core)));
        let opts = ProcessOptions {
            enable_fallback: false,
            ..options(ProcessingMode::Core, date(2024, 6, 1))
        };
        let err = orch.process(MIXED_TEXT, &opts).unwrap_err();
        assert!(matches!(err, AnchoringError::EnginePath { path: EnginePath::Core, .. }));
    }

    #[test]
    fn both_paths_failing_is_aggregate() {
        let orch = orchestrator(
            Box::new(FailingPath(EnginePath::Legacy)),
            Box::new(FailingPath(EnginePath::Core)),
        );
        for enable_fallback in [true, false] {
            let opts = ProcessOptions {
                enable_fallback,
                ..options(ProcessingMode::Hybrid, date(2024, 6, 1))
            };
            match orch.process(MIXED_TEXT, &opts).unwrap_err() {
                AnchoringError::Aggregate { legacy, core } => {
                    assert!(legacy.contains("legacy path failed"));
                    assert!(core.contains("core path failed"));
                }
                other => panic!("unexpected error {other:?}"),
            }
        }
    }

    #[test]
    fn oversized_input_rejected() {
        let config = EngineConfig {
            max_input_chars: 5,
            ..EngineConfig::default()
        };
        let orch = HybridOrchestrator::new(config).unwrap();
        let err = orch.process("2024-01-15", &ProcessOptions::default()).unwrap_err();
        assert!(matches!(err, AnchoringError::InvalidInput(_)));
    }

    #[test]
    fn negative_threshold_rejected() {
        let opts = ProcessOptions {
            medium_day_threshold: -1,
            ..ProcessOptions::default()
        };
        assert!(matches!(process("2024-01-15", &opts), Err(AnchoringError::InvalidInput(_))));
    }

    #[test]
    fn options_deserialize_with_defaults() {
        let opts: ProcessOptions =
            serde_json::from_str(r#"{"mode": "hybrid", "merge_strategy": "consensus"}"#).unwrap();
        assert_eq!(opts.mode, ProcessingMode::Hybrid);
        assert_eq!(opts.merge_strategy, MergeStrategyKind::Consensus);
        assert_eq!(opts.medium_day_threshold, 7);
        assert!(opts.enable_fallback);
        assert!(opts.reference_date.is_none());
    }

    #[test]
    fn result_serializes_to_json() {
        let result = process(
            "2024-01-10부터 2024-01-15까지 입원",
            &options(ProcessingMode::Core, date(2024, 6, 1)),
        )
        .unwrap();
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["mode"], "core");
        let dates: Vec<_> = json["hierarchy"]["timeline"]
            .as_array()
            .unwrap()
            .iter()
            .map(|e| e["date"].clone())
            .collect();
        assert!(dates.contains(&serde_json::json!({"start": "2024-01-10", "end": "2024-01-15"})));
    }

    #[tokio::test]
    async fn async_entry_point_matches_sync() {
        let opts = options(ProcessingMode::Core, date(2024, 6, 1));
        let text = "2024-01-10 외래 내원".to_string();
        let sync = process(&text, &opts).unwrap();
        let result = process_async(text, opts).await.unwrap();
        assert_eq!(result.total_dates(), sync.total_dates());
        assert_eq!(result.mode, "core");
    }
}
