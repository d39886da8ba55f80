use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ═══════════════════════════════════════════════════════════
// Anchor model
// ═══════════════════════════════════════════════════════════

/// One candidate date mention found in the normalized text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DateAnchor {
    pub id: String,
    /// Exact matched substring.
    pub source_text: String,
    pub category: AnchorCategory,
    /// Which pattern tier produced the anchor.
    pub tier: PatternTier,
    /// Name of the pattern inside its family (for evidence and debugging).
    pub pattern: String,
    /// Typed components parsed from the match.
    pub raw_groups: PatternMatch,
    /// Character offsets in the normalized text.
    pub position: Span,
    /// Surrounding text used for scoring.
    pub context: String,
    pub normalized_date: Option<NormalizedDate>,
    /// Base confidence of the producing pattern.
    pub pattern_confidence: f32,
    pub confidence: f32,
    pub priority: u32,
    pub medical_context: MedicalContext,
    pub hierarchy_score: f32,
    /// Set when a backward-sweep match confirmed the same date.
    pub corroborated: bool,
    pub engine: EnginePath,
    /// Hybrid merge tag, present only on results of a hybrid merge.
    pub merge_tag: Option<MergeTag>,
    pub merged_from: Vec<String>,
    pub merged_count: usize,
}

impl DateAnchor {
    /// The calendar date used for ordering and distance (range start for durations).
    pub fn anchor_date(&self) -> Option<NaiveDate> {
        self.normalized_date.as_ref().map(NormalizedDate::start)
    }

    pub fn medical_priority(&self) -> u32 {
        self.medical_context.context_type.medical_priority()
    }
}

/// Character span `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn overlaps(&self, other: &Span) -> bool {
        self.start < other.end && other.start < self.end
    }

    pub fn contains(&self, offset: usize) -> bool {
        offset >= self.start && offset < self.end
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Anchor category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnchorCategory {
    Absolute,
    Relative,
    Duration,
    Medical,
    BackwardValidation,
}

impl AnchorCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Absolute => "absolute",
            Self::Relative => "relative",
            Self::Duration => "duration",
            Self::Medical => "medical",
            Self::BackwardValidation => "backward_validation",
        }
    }
}

impl fmt::Display for AnchorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pattern tier, largest to smallest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternTier {
    /// Tier 1: date-anchored document sections.
    Structure,
    /// Tier 2: hospitalization / surgery / examination blocks.
    Block,
    /// Tier 3: single date tokens.
    Atomic,
    /// Backward-sweep confirmation phrases.
    Validation,
}

/// Which engine path produced an anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnginePath {
    Legacy,
    Core,
}

impl fmt::Display for EnginePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Legacy => write!(f, "legacy"),
            Self::Core => write!(f, "core"),
        }
    }
}

/// Tag attached by the consensus merge strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergeTag {
    Consensus,
    LegacyOnly,
    CoreOnly,
}

// ═══════════════════════════════════════════════════════════
// Typed pattern matches
// ═══════════════════════════════════════════════════════════

/// Components of a single calendar date as written in the text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbsoluteDateMatch {
    pub year: i32,
    pub month: u32,
    pub day: u32,
    /// Year was written with two digits and expanded during normalization.
    pub two_digit_year: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeUnit {
    Day,
    Week,
    Month,
    Year,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelativeDirection {
    Past,
    Future,
}

/// "오늘", "3일 전", "2주 후" and friends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelativeDateMatch {
    pub unit: TimeUnit,
    pub count: u32,
    pub direction: RelativeDirection,
}

/// End of a duration: an explicit date or a span counted from the start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum DurationEnd {
    Date(AbsoluteDateMatch),
    Span { count: u32, unit: TimeUnit },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DurationMatch {
    pub start: AbsoluteDateMatch,
    pub end: DurationEnd,
    pub keyword: Option<String>,
}

/// Clinical keyword adjacent to a date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MedicalContextMatch {
    pub keyword: String,
    pub date: AbsoluteDateMatch,
}

/// Strongly-typed parse of a pattern match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum PatternMatch {
    Absolute(AbsoluteDateMatch),
    Relative(RelativeDateMatch),
    Duration(DurationMatch),
    Medical(MedicalContextMatch),
    Validation(AbsoluteDateMatch),
}

// ═══════════════════════════════════════════════════════════
// Normalized dates
// ═══════════════════════════════════════════════════════════

/// Canonical date: `"YYYY-MM-DD"` or `{start, end}` for durations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NormalizedDate {
    Single(NaiveDate),
    Range { start: NaiveDate, end: NaiveDate },
}

impl NormalizedDate {
    pub fn start(&self) -> NaiveDate {
        match self {
            Self::Single(d) => *d,
            Self::Range { start, .. } => *start,
        }
    }

    pub fn end(&self) -> NaiveDate {
        match self {
            Self::Single(d) => *d,
            Self::Range { end, .. } => *end,
        }
    }
}

impl fmt::Display for NormalizedDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Single(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            Self::Range { start, end } => write!(
                f,
                "{}..{}",
                start.format("%Y-%m-%d"),
                end.format("%Y-%m-%d")
            ),
        }
    }
}

// ═══════════════════════════════════════════════════════════
// Medical context
// ═══════════════════════════════════════════════════════════

/// Clinical role a date plays in the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MedicalContextType {
    CurrentVisit,
    Diagnosis,
    Treatment,
    Examination,
    Surgery,
    Symptom,
    PastHistory,
    General,
}

impl MedicalContextType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CurrentVisit => "current_visit",
            Self::Diagnosis => "diagnosis",
            Self::Treatment => "treatment",
            Self::Examination => "examination",
            Self::Surgery => "surgery",
            Self::Symptom => "symptom",
            Self::PastHistory => "past_history",
            Self::General => "general",
        }
    }

    /// Priority used by conflict resolution and the hierarchy score.
    ///
    /// current_visit=100, recent_treatment=90, diagnosis_date=85,
    /// symptom_onset=80, past_history=60, mentioned_event=40.
    pub fn medical_priority(&self) -> u32 {
        match self {
            Self::CurrentVisit => 100,
            Self::Treatment | Self::Surgery => 90,
            Self::Diagnosis => 85,
            Self::Symptom => 80,
            Self::Examination => 75,
            Self::PastHistory => 60,
            Self::General => 40,
        }
    }

    pub fn clinical_significance(&self) -> f32 {
        match self {
            Self::CurrentVisit => 0.9,
            Self::Diagnosis => 0.85,
            Self::Treatment => 0.8,
            Self::Examination => 0.75,
            _ => 0.5,
        }
    }

    /// Roles whose dates legitimately spread over years never raise a
    /// date-gap conflict.
    pub fn allows_date_gap(&self) -> bool {
        matches!(self, Self::General | Self::PastHistory)
    }
}

impl fmt::Display for MedicalContextType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MedicalContext {
    #[serde(rename = "type")]
    pub context_type: MedicalContextType,
    pub keywords: Vec<String>,
    pub clinical_significance: f32,
}

impl MedicalContext {
    pub fn general() -> Self {
        Self::of(MedicalContextType::General, Vec::new())
    }

    pub fn of(context_type: MedicalContextType, keywords: Vec<String>) -> Self {
        Self {
            context_type,
            keywords,
            clinical_significance: context_type.clinical_significance(),
        }
    }
}

// ═══════════════════════════════════════════════════════════
// Conflicts
// ═══════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictType {
    /// Text spans overlap.
    Positional,
    /// Same clinical role, dates implausibly far apart.
    Logical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionStrategy {
    TemporalLogic,
    ConfidenceBased,
    MedicalPriority,
    PositionBased,
    Default,
}

impl ResolutionStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TemporalLogic => "temporal_logic",
            Self::ConfidenceBased => "confidence_based",
            Self::MedicalPriority => "medical_priority",
            Self::PositionBased => "position_based",
            Self::Default => "default",
        }
    }
}

/// One resolved conflict. Produced during resolution, surfaced only as evidence.
#[derive(Debug, Clone, Serialize)]
pub struct ConflictRecord {
    pub anchor_a: String,
    pub anchor_b: String,
    pub conflict_type: ConflictType,
    pub strategy_used: ResolutionStrategy,
    pub winner: String,
}

// ═══════════════════════════════════════════════════════════
// Results
// ═══════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HierarchyLevel {
    Primary,
    Secondary,
}

/// Chronological view of the final anchors.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Hierarchy {
    pub timeline: Vec<TimelineEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TimelineEntry {
    pub date: NormalizedDate,
    pub anchor_id: String,
    pub level: HierarchyLevel,
    pub context_type: MedicalContextType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvidenceKind {
    Anchor,
    Corroboration,
    Conflict,
    Merge,
    HybridMerge,
}

#[derive(Debug, Clone, Serialize)]
pub struct Evidence {
    pub kind: EvidenceKind,
    pub anchor_id: String,
    pub detail: String,
}

/// Why an anchor was discarded before conflict resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DropReason {
    InvalidMonth,
    InvalidDay,
    OutsideWindow,
    InvertedRange,
    Unresolvable,
}

#[derive(Debug, Clone, Serialize)]
pub struct DroppedAnchor {
    pub source_text: String,
    pub position: Span,
    pub reason: DropReason,
}

/// Processing metrics returned with every result.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Statistics {
    pub total_dates: usize,
    pub primary_count: usize,
    pub secondary_count: usize,
    pub forward_anchors: usize,
    pub backward_anchors: usize,
    pub corroborated: usize,
    pub pattern_failures: usize,
    pub dropped: Vec<DroppedAnchor>,
    pub conflicts_detected: usize,
    pub conflicts_by_strategy: Vec<(ResolutionStrategy, usize)>,
    pub merged_groups: usize,
    /// Errors of engine paths that failed without failing the call.
    pub path_errors: Vec<String>,
    pub processing_ms: u64,
}

impl Statistics {
    pub fn dropped_anchors(&self) -> usize {
        self.dropped.len()
    }

    pub(crate) fn count_strategy(&mut self, strategy: ResolutionStrategy) {
        match self
            .conflicts_by_strategy
            .iter_mut()
            .find(|(s, _)| *s == strategy)
        {
            Some((_, n)) => *n += 1,
            None => self.conflicts_by_strategy.push((strategy, 1)),
        }
    }

    /// Fold another path's statistics into this one.
    pub(crate) fn absorb(&mut self, other: Statistics) {
        self.forward_anchors += other.forward_anchors;
        self.backward_anchors += other.backward_anchors;
        self.corroborated += other.corroborated;
        self.pattern_failures += other.pattern_failures;
        self.dropped.extend(other.dropped);
        self.conflicts_detected += other.conflicts_detected;
        for (strategy, n) in other.conflicts_by_strategy {
            match self
                .conflicts_by_strategy
                .iter_mut()
                .find(|(s, _)| *s == strategy)
            {
                Some((_, total)) => *total += n,
                None => self.conflicts_by_strategy.push((strategy, n)),
            }
        }
        self.merged_groups += other.merged_groups;
        self.path_errors.extend(other.path_errors);
    }
}

/// Output of one engine path before any hybrid merge.
#[derive(Debug, Clone, Default)]
pub struct PathOutput {
    pub primary: Vec<DateAnchor>,
    pub secondary: Vec<DateAnchor>,
    pub evidence: Vec<Evidence>,
    pub statistics: Statistics,
}

impl PathOutput {
    pub fn all_anchors(&self) -> impl Iterator<Item = &DateAnchor> {
        self.primary.iter().chain(self.secondary.iter())
    }
}

/// Final result handed to collaborators.
#[derive(Debug, Clone, Serialize)]
pub struct ProcessingResult {
    pub primary: Vec<DateAnchor>,
    pub secondary: Vec<DateAnchor>,
    pub hierarchy: Hierarchy,
    pub overall_confidence: f32,
    pub evidence: Vec<Evidence>,
    pub statistics: Statistics,
    /// Mode that actually ran (never `adaptive`).
    pub mode: String,
    pub merge_strategy: Option<String>,
    /// Set when the result came from the legacy fallback; holds the original error.
    pub fallback_error: Option<String>,
}

impl ProcessingResult {
    pub fn is_fallback(&self) -> bool {
        self.fallback_error.is_some()
    }

    pub fn total_dates(&self) -> usize {
        self.primary.len() + self.secondary.len()
    }

    pub fn all_anchors(&self) -> impl Iterator<Item = &DateAnchor> {
        self.primary.iter().chain(self.secondary.iter())
    }
}
