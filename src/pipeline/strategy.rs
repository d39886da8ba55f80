//! Mode selection and hybrid merge strategies.
//!
//! `ProcessingMode` picks which engine paths run; `adaptive` is resolved from
//! a text-complexity measure before anything runs. When both paths run, a
//! `ResultMerger` joins their outputs. The three mergers are interchangeable
//! behind the trait and chosen per call.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::pipeline::extraction::keywords::count_medical_keywords;
use crate::pipeline::resolution::confidence_band;
use crate::pipeline::types::{
    DateAnchor, Evidence, EvidenceKind, HierarchyLevel, MergeTag, PathOutput,
};
use crate::pipeline_config::{AdaptiveConfig, EngineConfig};

// ═══════════════════════════════════════════════════════════
// Modes
// ═══════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessingMode {
    /// Cheap block extractor only.
    Legacy,
    /// Full dual-sweep engine only.
    Core,
    /// Both paths concurrently, merged.
    Hybrid,
    /// Pick one of the above from text complexity.
    #[default]
    Adaptive,
}

impl fmt::Display for ProcessingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Legacy => write!(f, "legacy"),
            Self::Core => write!(f, "core"),
            Self::Hybrid => write!(f, "hybrid"),
            Self::Adaptive => write!(f, "adaptive"),
        }
    }
}

impl ProcessingMode {
    /// The concrete mode to run. Never returns `Adaptive`.
    pub fn resolve(self, text: &str, config: &AdaptiveConfig) -> ProcessingMode {
        match self {
            Self::Adaptive => select_mode(&measure_complexity(text), config),
            explicit => explicit,
        }
    }
}

// ═══════════════════════════════════════════════════════════
// Text complexity
// ═══════════════════════════════════════════════════════════

static DATE_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\d{2,4}\s*(?:[-./]|년)\s*\d{1,2}\s*(?:[-./]|월)\s*\d{1,2}")
        .expect("valid regex")
});

static RELATIVE_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"오늘|금일|당일|어제|작일|그저께|그제|내일|명일|모레|\d{1,3}\s*(?:일|주|개월|달|년)\s*(?:전|후|뒤)")
        .expect("valid regex")
});

/// Inputs of adaptive mode selection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TextComplexity {
    pub date_count: usize,
    pub relative_count: usize,
    /// Medical keywords per 100 characters.
    pub keyword_density: f32,
}

pub fn measure_complexity(text: &str) -> TextComplexity {
    let chars = text.chars().count();
    let keyword_density = if chars == 0 {
        0.0
    } else {
        count_medical_keywords(text) as f32 * 100.0 / chars as f32
    };
    TextComplexity {
        date_count: DATE_TOKEN.find_iter(text).count(),
        relative_count: RELATIVE_TOKEN.find_iter(text).count(),
        keyword_density,
    }
}

/// Sparse text → legacy, medically dense text → core, anything else → hybrid.
pub fn select_mode(complexity: &TextComplexity, config: &AdaptiveConfig) -> ProcessingMode {
    if complexity.date_count <= config.sparse_max_dates && complexity.relative_count == 0 {
        ProcessingMode::Legacy
    } else if complexity.keyword_density >= config.dense_keyword_density
        && complexity.date_count >= config.dense_min_dates
    {
        ProcessingMode::Core
    } else {
        ProcessingMode::Hybrid
    }
}

// ═══════════════════════════════════════════════════════════
// Hybrid merge strategies
// ═══════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergeStrategyKind {
    /// Union of both paths, most confident first.
    #[default]
    Confidence,
    /// Agreement between paths boosts confidence; the rest is tagged by origin.
    Consensus,
    /// Core anchors win; legacy fills dates the core missed.
    Priority,
}

impl MergeStrategyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Confidence => "confidence",
            Self::Consensus => "consensus",
            Self::Priority => "priority",
        }
    }

    pub fn merger(self) -> Box<dyn ResultMerger> {
        match self {
            Self::Confidence => Box::new(ConfidenceMerger),
            Self::Consensus => Box::new(ConsensusMerger),
            Self::Priority => Box::new(PriorityMerger),
        }
    }
}

/// Joins the outputs of the legacy and core paths.
pub trait ResultMerger: Send + Sync {
    fn kind(&self) -> MergeStrategyKind;

    fn merge(&self, legacy: PathOutput, core: PathOutput, config: &EngineConfig) -> PathOutput;
}

/// Evidence and statistics of both paths, with no anchors yet.
fn combined_bookkeeping(legacy: &mut PathOutput, core: &mut PathOutput) -> PathOutput {
    let mut statistics = std::mem::take(&mut core.statistics);
    statistics.absorb(std::mem::take(&mut legacy.statistics));
    let mut evidence = std::mem::take(&mut core.evidence);
    evidence.append(&mut legacy.evidence);
    PathOutput {
        primary: Vec::new(),
        secondary: Vec::new(),
        evidence,
        statistics,
    }
}

fn by_confidence_desc(anchors: &mut [DateAnchor]) {
    anchors.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
}

pub struct ConfidenceMerger;

impl ResultMerger for ConfidenceMerger {
    fn kind(&self) -> MergeStrategyKind {
        MergeStrategyKind::Confidence
    }

    fn merge(&self, mut legacy: PathOutput, mut core: PathOutput, _config: &EngineConfig) -> PathOutput {
        let mut merged = combined_bookkeeping(&mut legacy, &mut core);
        merged.primary = core.primary;
        merged.primary.append(&mut legacy.primary);
        merged.secondary = core.secondary;
        merged.secondary.append(&mut legacy.secondary);
        by_confidence_desc(&mut merged.primary);
        by_confidence_desc(&mut merged.secondary);
        merged
    }
}

pub struct ConsensusMerger;

impl ConsensusMerger {
    fn tag(anchor: &mut DateAnchor, tag: MergeTag, evidence: &mut Vec<Evidence>) {
        anchor.merge_tag = Some(tag);
        evidence.push(Evidence {
            kind: EvidenceKind::HybridMerge,
            anchor_id: anchor.id.clone(),
            detail: format!(
                "{tag:?} '{}' ({} confidence)",
                anchor.source_text,
                confidence_band(anchor.confidence)
            ),
        });
    }
}

impl ResultMerger for ConsensusMerger {
    fn kind(&self) -> MergeStrategyKind {
        MergeStrategyKind::Consensus
    }

    fn merge(&self, mut legacy: PathOutput, mut core: PathOutput, config: &EngineConfig) -> PathOutput {
        let mut merged = combined_bookkeeping(&mut legacy, &mut core);

        let mut core_slots: Vec<Option<(HierarchyLevel, DateAnchor)>> = core
            .primary
            .into_iter()
            .map(|a| Some((HierarchyLevel::Primary, a)))
            .chain(core.secondary.into_iter().map(|a| Some((HierarchyLevel::Secondary, a))))
            .collect();

        let legacy_anchors = legacy
            .primary
            .into_iter()
            .map(|a| (HierarchyLevel::Primary, a))
            .chain(legacy.secondary.into_iter().map(|a| (HierarchyLevel::Secondary, a)));

        let mut placed: Vec<(HierarchyLevel, DateAnchor)> = Vec::new();
        for (legacy_level, mut legacy_anchor) in legacy_anchors {
            let matching = core_slots.iter_mut().find(|slot| {
                slot.as_ref().is_some_and(|(_, c)| {
                    c.normalized_date.is_some() && c.normalized_date == legacy_anchor.normalized_date
                })
            });
            match matching.and_then(Option::take) {
                Some((level, mut agreed)) => {
                    let average = (agreed.confidence + legacy_anchor.confidence) / 2.0;
                    agreed.confidence = (average + config.consensus_boost).min(config.consensus_cap);
                    agreed.merged_from.push(legacy_anchor.id);
                    agreed.merged_from.extend(legacy_anchor.merged_from);
                    agreed.merged_count = agreed.merged_from.len() + 1;
                    agreed.corroborated |= legacy_anchor.corroborated;
                    Self::tag(&mut agreed, MergeTag::Consensus, &mut merged.evidence);
                    placed.push((level, agreed));
                }
                None => {
                    Self::tag(&mut legacy_anchor, MergeTag::LegacyOnly, &mut merged.evidence);
                    placed.push((legacy_level, legacy_anchor));
                }
            }
        }
        for (level, mut core_anchor) in core_slots.into_iter().flatten() {
            Self::tag(&mut core_anchor, MergeTag::CoreOnly, &mut merged.evidence);
            placed.push((level, core_anchor));
        }

        for (level, anchor) in placed {
            match level {
                HierarchyLevel::Primary => merged.primary.push(anchor),
                HierarchyLevel::Secondary => merged.secondary.push(anchor),
            }
        }
        merged
    }
}

pub struct PriorityMerger;

impl ResultMerger for PriorityMerger {
    fn kind(&self) -> MergeStrategyKind {
        MergeStrategyKind::Priority
    }

    fn merge(&self, mut legacy: PathOutput, mut core: PathOutput, _config: &EngineConfig) -> PathOutput {
        let mut merged = combined_bookkeeping(&mut legacy, &mut core);
        let covered: Vec<_> = core
            .all_anchors()
            .filter_map(|a| a.normalized_date)
            .collect();
        let missed = |a: &DateAnchor| a.normalized_date.is_some_and(|d| !covered.contains(&d));

        merged.primary = core.primary;
        merged
            .primary
            .extend(legacy.primary.into_iter().filter(|a| missed(a)));
        merged.secondary = core.secondary;
        merged
            .secondary
            .extend(legacy.secondary.into_iter().filter(|a| missed(a)));
        merged
    }
}
