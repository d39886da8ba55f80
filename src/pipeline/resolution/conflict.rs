//! Conflict detection and resolution.
//!
//! The resolution chain is an ordered table of pure resolver functions; the
//! first one that returns a winner decides the conflict. `Default` always
//! decides, so every conflict has exactly one winner.

use chrono::NaiveDate;

use crate::pipeline::types::{
    ConflictRecord, ConflictType, DateAnchor, Evidence, EvidenceKind, ResolutionStrategy,
    Statistics,
};
use crate::pipeline_config::ConflictConfig;

/// Side of a conflicting pair that survives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Winner {
    First,
    Second,
}

/// Inputs shared by every resolver.
pub struct ResolutionContext<'a> {
    pub reference: NaiveDate,
    pub config: &'a ConflictConfig,
}

type Resolver = fn(&DateAnchor, &DateAnchor, &ResolutionContext) -> Option<Winner>;

/// Resolution order. Earlier entries take precedence.
const RESOLVERS: &[(ResolutionStrategy, Resolver)] = &[
    (ResolutionStrategy::TemporalLogic, by_temporal_logic),
    (ResolutionStrategy::ConfidenceBased, by_confidence),
    (ResolutionStrategy::MedicalPriority, by_medical_priority),
    (ResolutionStrategy::PositionBased, by_position),
];

fn is_future(anchor: &DateAnchor, reference: NaiveDate) -> bool {
    anchor.anchor_date().is_some_and(|d| d > reference)
}

/// When exactly one date lies after the reference date, the other one wins.
fn by_temporal_logic(a: &DateAnchor, b: &DateAnchor, ctx: &ResolutionContext) -> Option<Winner> {
    match (is_future(a, ctx.reference), is_future(b, ctx.reference)) {
        (true, false) => Some(Winner::Second),
        (false, true) => Some(Winner::First),
        _ => None,
    }
}

fn by_confidence(a: &DateAnchor, b: &DateAnchor, ctx: &ResolutionContext) -> Option<Winner> {
    if (a.confidence - b.confidence).abs() <= ctx.config.confidence_gap {
        return None;
    }
    Some(if a.confidence > b.confidence {
        Winner::First
    } else {
        Winner::Second
    })
}

fn by_medical_priority(a: &DateAnchor, b: &DateAnchor, ctx: &ResolutionContext) -> Option<Winner> {
    let (pa, pb) = (a.medical_priority(), b.medical_priority());
    if pa.abs_diff(pb) <= ctx.config.medical_priority_gap {
        return None;
    }
    Some(if pa > pb { Winner::First } else { Winner::Second })
}

/// Far-apart anchors: the earlier one carries the authoritative date.
fn by_position(a: &DateAnchor, b: &DateAnchor, ctx: &ResolutionContext) -> Option<Winner> {
    if a.position.start.abs_diff(b.position.start) <= ctx.config.position_distance {
        return None;
    }
    Some(if a.position.start <= b.position.start {
        Winner::First
    } else {
        Winner::Second
    })
}

/// Strictly higher confidence wins; ties keep the first anchor.
fn by_default(a: &DateAnchor, b: &DateAnchor) -> Winner {
    if b.confidence > a.confidence {
        Winner::Second
    } else {
        Winner::First
    }
}

/// Whether two anchors conflict, and how.
pub fn detect_conflict(a: &DateAnchor, b: &DateAnchor, config: &ConflictConfig) -> Option<ConflictType> {
    if a.position.overlaps(&b.position) {
        return Some(ConflictType::Positional);
    }

    let role = a.medical_context.context_type;
    if role != b.medical_context.context_type || role.allows_date_gap() {
        return None;
    }
    let (da, db) = (a.anchor_date()?, b.anchor_date()?);
    if (da - db).num_days().abs() > config.logical_day_gap {
        Some(ConflictType::Logical)
    } else {
        None
    }
}

/// Run the resolver chain over one conflicting pair.
pub fn resolve_pair(a: &DateAnchor, b: &DateAnchor, ctx: &ResolutionContext) -> (ResolutionStrategy, Winner) {
    RESOLVERS
        .iter()
        .find_map(|(strategy, resolver)| resolver(a, b, ctx).map(|w| (*strategy, w)))
        .unwrap_or_else(|| (ResolutionStrategy::Default, by_default(a, b)))
}

/// Survivors of conflict resolution and the decisions taken.
#[derive(Debug, Default)]
pub struct ConflictOutcome {
    pub survivors: Vec<DateAnchor>,
    pub records: Vec<ConflictRecord>,
}

impl ConflictOutcome {
    /// Copy the decisions into statistics and evidence.
    pub fn report(&self, stats: &mut Statistics, evidence: &mut Vec<Evidence>) {
        stats.conflicts_detected += self.records.len();
        for record in &self.records {
            stats.count_strategy(record.strategy_used);
            let loser = if record.winner == record.anchor_a {
                &record.anchor_b
            } else {
                &record.anchor_a
            };
            evidence.push(Evidence {
                kind: EvidenceKind::Conflict,
                anchor_id: record.winner.clone(),
                detail: format!(
                    "{:?} conflict with {loser} resolved by {}",
                    record.conflict_type,
                    record.strategy_used.as_str()
                ),
            });
        }
    }
}

/// Resolve every conflicting pair, dropping each loser.
///
/// Anchors are ordered by position first (stable, so extraction order breaks
/// ties); a loser takes no further part in later comparisons.
pub fn resolve_conflicts(
    mut anchors: Vec<DateAnchor>,
    reference: NaiveDate,
    config: &ConflictConfig,
) -> ConflictOutcome {
    anchors.sort_by_key(|a| (a.position.start, a.position.end));
    let ctx = ResolutionContext { reference, config };
    let mut alive = vec![true; anchors.len()];
    let mut records = Vec::new();

    for i in 0..anchors.len() {
        for j in (i + 1)..anchors.len() {
            if !alive[i] {
                break;
            }
            if !alive[j] {
                continue;
            }
            let (a, b) = (&anchors[i], &anchors[j]);
            let Some(conflict_type) = detect_conflict(a, b, config) else {
                continue;
            };
            let (strategy, winner) = resolve_pair(a, b, &ctx);
            let winner_id = match winner {
                Winner::First => {
                    alive[j] = false;
                    a.id.clone()
                }
                Winner::Second => {
                    alive[i] = false;
                    b.id.clone()
                }
            };
            tracing::debug!(
                a = %a.source_text,
                b = %b.source_text,
                ?conflict_type,
                strategy = strategy.as_str(),
                "Conflict resolved"
            );
            records.push(ConflictRecord {
                anchor_a: a.id.clone(),
                anchor_b: b.id.clone(),
                conflict_type,
                strategy_used: strategy,
                winner: winner_id,
            });
        }
    }

    let survivors = anchors
        .into_iter()
        .zip(alive)
        .filter_map(|(anchor, keep)| keep.then_some(anchor))
        .collect();
    ConflictOutcome { survivors, records }
}
