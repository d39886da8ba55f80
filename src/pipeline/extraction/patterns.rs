//! Date pattern catalogue.
//!
//! Three tiers, largest to smallest: document sections (Tier 1), clinically
//! typed blocks (Tier 2) and single date tokens (Tier 3), plus the
//! confirmation phrases of the backward sweep. Every pattern parses its
//! captures into a typed `PatternMatch`.

use std::str::FromStr;
use std::sync::LazyLock;

use regex::{Captures, Regex};

use super::keywords::{
    alternation, ACTION_KEYWORDS, EXAMINATION_KEYWORDS, HOSPITALIZATION_KEYWORDS,
    SURGERY_KEYWORDS,
};
use crate::pipeline::error::AnchoringError;
use crate::pipeline::types::{
    AbsoluteDateMatch, AnchorCategory, DurationEnd, DurationMatch, MedicalContextMatch,
    MedicalContextType, PatternMatch, PatternTier, RelativeDateMatch, RelativeDirection, TimeUnit,
};

/// Pattern family, used to select which patterns a sweep runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternFamily {
    Structure,
    Block,
    Absolute,
    Relative,
    Duration,
    Medical,
    Validation,
}

impl PatternFamily {
    /// Families of the forward sweep, largest tier first.
    pub const FORWARD: &'static [PatternFamily] = &[
        Self::Structure,
        Self::Block,
        Self::Absolute,
        Self::Relative,
        Self::Duration,
        Self::Medical,
    ];

    pub const BACKWARD: &'static [PatternFamily] = &[Self::Validation];

    /// The block extractor runs every tier but skips the confirmation sweep.
    pub const LEGACY: &'static [PatternFamily] = &[
        Self::Structure,
        Self::Block,
        Self::Absolute,
        Self::Relative,
        Self::Duration,
        Self::Medical,
    ];
}

type Parser = fn(&Captures) -> Result<PatternMatch, AnchoringError>;

/// A compiled pattern with its scoring metadata.
pub struct DatePattern {
    pub name: &'static str,
    pub family: PatternFamily,
    pub tier: PatternTier,
    pub category: AnchorCategory,
    pub confidence: f32,
    pub priority: u32,
    /// Role imposed by the pattern itself (Tier-2 blocks).
    pub forced_context: Option<MedicalContextType>,
    /// Reject matches directly following a month marker ("1월 15일 전").
    pub month_guard: bool,
    pub regex: Regex,
    parser: Parser,
}

impl DatePattern {
    pub fn parse(&self, caps: &Captures) -> Result<PatternMatch, AnchoringError> {
        (self.parser)(caps)
    }
}

struct PatternSpec {
    name: &'static str,
    family: PatternFamily,
    tier: PatternTier,
    category: AnchorCategory,
    confidence: f32,
    priority: u32,
    forced_context: Option<MedicalContextType>,
    month_guard: bool,
    source: String,
    parser: Parser,
}

// ═══════════════════════════════════════════════════════════
// Regex fragments
// ═══════════════════════════════════════════════════════════

/// Four-digit-year date in any separator style; groups `{p}y`, `{p}m`, `{p}d`.
fn full_date(p: &str) -> String {
    format!(
        r"(?P<{p}y>\d{{4}})\s*(?:[-./]|년)\s*(?P<{p}m>\d{{1,2}})\s*(?:[-./]|월)\s*(?P<{p}d>\d{{1,2}})(?:\s*일)?"
    )
}

const DURATION_KEYWORDS: &[&str] = &["입원", "치료", "투약", "복용", "통원", "재원"];

// ═══════════════════════════════════════════════════════════
// Capture parsing
// ═══════════════════════════════════════════════════════════

fn group<'t>(caps: &Captures<'t>, name: &str) -> Result<&'t str, AnchoringError> {
    caps.name(name)
        .map(|m| m.as_str())
        .ok_or_else(|| AnchoringError::PatternFailure {
            pattern: name.to_string(),
            reason: "missing capture group".into(),
        })
}

fn number<T: FromStr>(caps: &Captures, name: &str) -> Result<T, AnchoringError> {
    let raw = group(caps, name)?;
    raw.parse().map_err(|_| AnchoringError::PatternFailure {
        pattern: name.to_string(),
        reason: format!("'{raw}' is not a number"),
    })
}

fn date_parts(caps: &Captures, prefix: &str, two_digit_year: bool) -> Result<AbsoluteDateMatch, AnchoringError> {
    Ok(AbsoluteDateMatch {
        year: number(caps, &format!("{prefix}y"))?,
        month: number(caps, &format!("{prefix}m"))?,
        day: number(caps, &format!("{prefix}d"))?,
        two_digit_year,
    })
}

fn time_unit(raw: &str) -> Result<TimeUnit, AnchoringError> {
    match raw {
        "일" => Ok(TimeUnit::Day),
        "주" => Ok(TimeUnit::Week),
        "개월" | "달" => Ok(TimeUnit::Month),
        "년" => Ok(TimeUnit::Year),
        other => Err(AnchoringError::PatternFailure {
            pattern: "unit".into(),
            reason: format!("unknown time unit '{other}'"),
        }),
    }
}

fn parse_absolute(caps: &Captures) -> Result<PatternMatch, AnchoringError> {
    Ok(PatternMatch::Absolute(date_parts(caps, "", false)?))
}

fn parse_absolute_short(caps: &Captures) -> Result<PatternMatch, AnchoringError> {
    Ok(PatternMatch::Absolute(date_parts(caps, "", true)?))
}

fn parse_relative_word(caps: &Captures) -> Result<PatternMatch, AnchoringError> {
    let (count, direction) = match group(caps, "word")? {
        "오늘" | "금일" | "당일" => (0, RelativeDirection::Past),
        "어제" | "작일" => (1, RelativeDirection::Past),
        "그저께" | "그제" => (2, RelativeDirection::Past),
        "내일" | "명일" => (1, RelativeDirection::Future),
        "모레" => (2, RelativeDirection::Future),
        other => {
            return Err(AnchoringError::PatternFailure {
                pattern: "relative_word".into(),
                reason: format!("unknown relative word '{other}'"),
            })
        }
    };
    Ok(PatternMatch::Relative(RelativeDateMatch {
        unit: TimeUnit::Day,
        count,
        direction,
    }))
}

fn parse_relative_offset(caps: &Captures) -> Result<PatternMatch, AnchoringError> {
    let direction = match group(caps, "dir")? {
        "전" => RelativeDirection::Past,
        _ => RelativeDirection::Future,
    };
    Ok(PatternMatch::Relative(RelativeDateMatch {
        unit: time_unit(group(caps, "unit")?)?,
        count: number(caps, "n")?,
        direction,
    }))
}

fn parse_duration_range(caps: &Captures) -> Result<PatternMatch, AnchoringError> {
    Ok(PatternMatch::Duration(DurationMatch {
        start: date_parts(caps, "s", false)?,
        end: DurationEnd::Date(date_parts(caps, "e", false)?),
        keyword: None,
    }))
}

fn parse_duration_span(caps: &Captures) -> Result<PatternMatch, AnchoringError> {
    Ok(PatternMatch::Duration(DurationMatch {
        start: date_parts(caps, "s", false)?,
        end: DurationEnd::Span {
            count: number(caps, "n")?,
            unit: time_unit(group(caps, "unit")?)?,
        },
        keyword: caps.name("kw").map(|m| m.as_str().to_string()),
    }))
}

fn parse_medical(caps: &Captures) -> Result<PatternMatch, AnchoringError> {
    Ok(PatternMatch::Medical(MedicalContextMatch {
        keyword: group(caps, "kw")?.to_string(),
        date: date_parts(caps, "", false)?,
    }))
}

fn parse_validation(caps: &Captures) -> Result<PatternMatch, AnchoringError> {
    Ok(PatternMatch::Validation(date_parts(caps, "", false)?))
}

// ═══════════════════════════════════════════════════════════
// Catalogue
// ═══════════════════════════════════════════════════════════

fn specs() -> Vec<PatternSpec> {
    let date = full_date("");
    let action = alternation(ACTION_KEYWORDS);
    let atomic = |name: &'static str,
                  family: PatternFamily,
                  category: AnchorCategory,
                  confidence: f32,
                  priority: u32,
                  source: String,
                  parser: Parser| PatternSpec {
        name,
        family,
        tier: PatternTier::Atomic,
        category,
        confidence,
        priority,
        forced_context: None,
        month_guard: false,
        source,
        parser,
    };
    let block = |name: &'static str, keywords: &[&str], context: MedicalContextType| PatternSpec {
        name,
        family: PatternFamily::Block,
        tier: PatternTier::Block,
        category: AnchorCategory::Medical,
        confidence: 0.8,
        priority: 80,
        forced_context: Some(context),
        month_guard: false,
        source: format!(r"(?P<kw>{})[^\n]{{0,20}}?{date}", alternation(keywords)),
        parser: parse_medical,
    };

    vec![
        // Tier 1: a date opening a line starts a section running to the next one.
        PatternSpec {
            name: "section_marker",
            family: PatternFamily::Structure,
            tier: PatternTier::Structure,
            category: AnchorCategory::Absolute,
            confidence: 0.6,
            priority: 70,
            forced_context: None,
            month_guard: false,
            source: format!(r"(?m)^[\s\-*#\[(•·]*{date}"),
            parser: parse_absolute,
        },
        // Tier 2: clinically typed blocks, keyword first.
        block("hospitalization_block", HOSPITALIZATION_KEYWORDS, MedicalContextType::Treatment),
        block("surgery_block", SURGERY_KEYWORDS, MedicalContextType::Surgery),
        block("examination_block", EXAMINATION_KEYWORDS, MedicalContextType::Examination),
        // Tier 3: absolute dates.
        atomic(
            "iso_date",
            PatternFamily::Absolute,
            AnchorCategory::Absolute,
            0.8,
            80,
            r"(?P<y>\d{4})\s*[-./]\s*(?P<m>\d{1,2})\s*[-./]\s*(?P<d>\d{1,2})".to_string(),
            parse_absolute,
        ),
        atomic(
            "korean_date",
            PatternFamily::Absolute,
            AnchorCategory::Absolute,
            0.8,
            80,
            r"(?P<y>\d{4})\s*년\s*(?P<m>\d{1,2})\s*월\s*(?P<d>\d{1,2})\s*일".to_string(),
            parse_absolute,
        ),
        atomic(
            "short_iso_date",
            PatternFamily::Absolute,
            AnchorCategory::Absolute,
            0.65,
            60,
            r"(?P<y>\d{2})\s*[-./]\s*(?P<m>\d{1,2})\s*[-./]\s*(?P<d>\d{1,2})".to_string(),
            parse_absolute_short,
        ),
        atomic(
            "short_korean_date",
            PatternFamily::Absolute,
            AnchorCategory::Absolute,
            0.65,
            60,
            r"(?P<y>\d{2})\s*년\s*(?P<m>\d{1,2})\s*월\s*(?P<d>\d{1,2})\s*일".to_string(),
            parse_absolute_short,
        ),
        atomic(
            "dated_record",
            PatternFamily::Absolute,
            AnchorCategory::Absolute,
            0.85,
            85,
            format!(r"{date}\s*자\s*(?P<kw>{action})"),
            parse_medical,
        ),
        // Tier 3: relative dates.
        atomic(
            "relative_word",
            PatternFamily::Relative,
            AnchorCategory::Relative,
            0.6,
            50,
            r"(?P<word>오늘|금일|당일|어제|작일|그저께|그제|내일|명일|모레)".to_string(),
            parse_relative_word,
        ),
        PatternSpec {
            month_guard: true,
            ..atomic(
                "relative_offset",
                PatternFamily::Relative,
                AnchorCategory::Relative,
                0.6,
                50,
                r"(?P<n>\d{1,3})\s*(?P<unit>일|주|개월|달|년)\s*(?P<dir>전|후|뒤)".to_string(),
                parse_relative_offset,
            )
        },
        // Tier 3: durations. Scored above a bare date so a span outlives its endpoints.
        atomic(
            "date_range",
            PatternFamily::Duration,
            AnchorCategory::Duration,
            0.82,
            75,
            format!(
                r"{}\s*(?:부터|에서|~|∼|–)\s*{}(?:\s*까지)?",
                full_date("s"),
                full_date("e")
            ),
            parse_duration_range,
        ),
        atomic(
            "date_span",
            PatternFamily::Duration,
            AnchorCategory::Duration,
            0.82,
            70,
            format!(
                r"{}\s*(?:부터\s*)?(?:(?P<kw>{})\s*)?(?P<n>\d{{1,3}})\s*(?P<unit>일|주|개월)\s*(?:간|동안)",
                full_date("s"),
                alternation(DURATION_KEYWORDS)
            ),
            parse_duration_span,
        ),
        // Tier 3: clinical action keyword adjacent to a date.
        atomic(
            "keyword_then_date",
            PatternFamily::Medical,
            AnchorCategory::Medical,
            0.85,
            90,
            format!(r"(?P<kw>{action})\s*(?:일자|일시|날짜|일)?\s*[:：]?\s*{date}"),
            parse_medical,
        ),
        atomic(
            "date_then_keyword",
            PatternFamily::Medical,
            AnchorCategory::Medical,
            0.85,
            90,
            format!(r"{date}\s*(?:에서|에|경|부터)?\s*(?P<kw>{action})"),
            parse_medical,
        ),
        // Backward sweep: explicit confirmation next to a date.
        PatternSpec {
            tier: PatternTier::Validation,
            ..atomic(
                "confirmed_date",
                PatternFamily::Validation,
                AnchorCategory::BackwardValidation,
                0.9,
                95,
                format!(
                    r"{date}\s*(?:[은는이가]\s*)?(?:날짜\s*)?(?:확인됨|확인|맞음|맞습니다|일치|확정)"
                ),
                parse_validation,
            )
        },
        PatternSpec {
            tier: PatternTier::Validation,
            ..atomic(
                "confirmation_label",
                PatternFamily::Validation,
                AnchorCategory::BackwardValidation,
                0.9,
                95,
                format!(r"(?:날짜|일자)\s*(?:확인|확정)\s*[:：]?\s*{date}"),
                parse_validation,
            )
        },
    ]
}

/// Compiles every pattern once. A pattern that fails to compile is logged
/// and left out; the others keep working.
static CATALOGUE: LazyLock<Vec<DatePattern>> = LazyLock::new(|| {
    specs()
        .into_iter()
        .filter_map(|spec| match Regex::new(&spec.source) {
            Ok(regex) => Some(DatePattern {
                name: spec.name,
                family: spec.family,
                tier: spec.tier,
                category: spec.category,
                confidence: spec.confidence,
                priority: spec.priority,
                forced_context: spec.forced_context,
                month_guard: spec.month_guard,
                regex,
                parser: spec.parser,
            }),
            Err(e) => {
                tracing::warn!(pattern = spec.name, error = %e, "Date pattern failed to compile, skipping");
                None
            }
        })
        .collect()
});

/// All compiled patterns, in catalogue order.
pub fn catalogue() -> &'static [DatePattern] {
    &CATALOGUE
}

/// Compiled patterns belonging to any of `families`, in catalogue order.
pub fn patterns_for(families: &[PatternFamily]) -> impl Iterator<Item = &'static DatePattern> + '_ {
    CATALOGUE.iter().filter(move |p| families.contains(&p.family))
}
