//! Date normalization and the plausibility window.
//!
//! Converts typed pattern matches into canonical calendar dates resolved
//! against the document's reference date. Failures are not errors: they come
//! back as a `DropReason` and the caller discards the anchor.

use chrono::{Datelike, Days, Months, NaiveDate};

use crate::pipeline::types::{
    AbsoluteDateMatch, DropReason, DurationEnd, NormalizedDate, PatternMatch, RelativeDateMatch,
    RelativeDirection, TimeUnit,
};

/// Inclusive window of dates a medical document can plausibly mention.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlausibilityWindow {
    pub earliest: NaiveDate,
    pub latest: NaiveDate,
}

impl PlausibilityWindow {
    /// `reference - years_back` ..= `reference + years_forward`, saturating at
    /// the calendar bounds.
    pub fn around(reference: NaiveDate, years_back: u32, years_forward: u32) -> Self {
        let earliest = years_back
            .checked_mul(12)
            .and_then(|months| reference.checked_sub_months(Months::new(months)))
            .unwrap_or(NaiveDate::MIN);
        let latest = years_forward
            .checked_mul(12)
            .and_then(|months| reference.checked_add_months(Months::new(months)))
            .unwrap_or(NaiveDate::MAX);
        Self { earliest, latest }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.earliest && date <= self.latest
    }
}

/// Expand a two-digit year: the latest century that keeps it at most one
/// year past the reference date.
pub fn expand_two_digit_year(yy: i32, reference: NaiveDate) -> i32 {
    let century = reference.year() / 100 * 100;
    let candidate = century + yy;
    if candidate > reference.year() + 1 {
        candidate - 100
    } else {
        candidate
    }
}

/// Build a calendar date, classifying why it failed when it does.
pub fn calendar_date(parts: &AbsoluteDateMatch, reference: NaiveDate) -> Result<NaiveDate, DropReason> {
    let year = if parts.two_digit_year {
        expand_two_digit_year(parts.year, reference)
    } else {
        parts.year
    };
    if !(1..=12).contains(&parts.month) {
        return Err(DropReason::InvalidMonth);
    }
    NaiveDate::from_ymd_opt(year, parts.month, parts.day).ok_or(DropReason::InvalidDay)
}

fn shift(date: NaiveDate, count: u32, unit: TimeUnit, direction: RelativeDirection) -> Option<NaiveDate> {
    match (unit, direction) {
        (TimeUnit::Day, RelativeDirection::Past) => date.checked_sub_days(Days::new(count.into())),
        (TimeUnit::Day, RelativeDirection::Future) => date.checked_add_days(Days::new(count.into())),
        (TimeUnit::Week, RelativeDirection::Past) => {
            date.checked_sub_days(Days::new(u64::from(count) * 7))
        }
        (TimeUnit::Week, RelativeDirection::Future) => {
            date.checked_add_days(Days::new(u64::from(count) * 7))
        }
        (TimeUnit::Month, RelativeDirection::Past) => date.checked_sub_months(Months::new(count)),
        (TimeUnit::Month, RelativeDirection::Future) => date.checked_add_months(Months::new(count)),
        (TimeUnit::Year, RelativeDirection::Past) => {
            date.checked_sub_months(Months::new(count.checked_mul(12)?))
        }
        (TimeUnit::Year, RelativeDirection::Future) => {
            date.checked_add_months(Months::new(count.checked_mul(12)?))
        }
    }
}

pub fn resolve_relative(rel: &RelativeDateMatch, reference: NaiveDate) -> Result<NaiveDate, DropReason> {
    shift(reference, rel.count, rel.unit, rel.direction).ok_or(DropReason::Unresolvable)
}

/// Normalize a typed match and check it against the plausibility window.
pub fn normalize_match(
    matched: &PatternMatch,
    reference: NaiveDate,
    window: &PlausibilityWindow,
) -> Result<NormalizedDate, DropReason> {
    let normalized = match matched {
        PatternMatch::Absolute(parts) | PatternMatch::Validation(parts) => {
            NormalizedDate::Single(calendar_date(parts, reference)?)
        }
        PatternMatch::Medical(m) => NormalizedDate::Single(calendar_date(&m.date, reference)?),
        PatternMatch::Relative(rel) => NormalizedDate::Single(resolve_relative(rel, reference)?),
        PatternMatch::Duration(duration) => {
            let start = calendar_date(&duration.start, reference)?;
            let end = match duration.end {
                DurationEnd::Date(parts) => calendar_date(&parts, reference)?,
                DurationEnd::Span { count, unit } => {
                    shift(start, count, unit, RelativeDirection::Future)
                        .ok_or(DropReason::Unresolvable)?
                }
            };
            if end < start {
                return Err(DropReason::InvertedRange);
            }
            NormalizedDate::Range { start, end }
        }
    };

    if window.contains(normalized.start()) && window.contains(normalized.end()) {
        Ok(normalized)
    } else {
        Err(DropReason::OutsideWindow)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::types::DurationMatch;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn abs(year: i32, month: u32, day: u32) -> AbsoluteDateMatch {
        AbsoluteDateMatch {
            year,
            month,
            day,
            two_digit_year: false,
        }
    }

    fn reference() -> NaiveDate {
        date(2024, 6, 1)
    }

    fn window() -> PlausibilityWindow {
        PlausibilityWindow::around(reference(), 10, 1)
    }

    #[test]
    fn huge_window_saturates_at_calendar_bounds() {
        let window = PlausibilityWindow::around(reference(), u32::MAX, u32::MAX);
        assert_eq!(window.earliest, NaiveDate::MIN);
        assert_eq!(window.latest, NaiveDate::MAX);
        assert!(window.contains(reference()));
    }

    #[test]
    fn window_spans_ten_years_back_one_forward() {
        let w = window();
        assert_eq!(w.earliest, date(2014, 6, 1));
        assert_eq!(w.latest, date(2025, 6, 1));
        assert!(w.contains(date(2014, 6, 1)));
        assert!(!w.contains(date(2014, 5, 31)));
        assert!(!w.contains(date(2025, 6, 2)));
    }

    #[test]
    fn two_digit_years_stay_behind_reference() {
        assert_eq!(expand_two_digit_year(24, reference()), 2024);
        assert_eq!(expand_two_digit_year(25, reference()), 2025);
        assert_eq!(expand_two_digit_year(26, reference()), 1926);
        assert_eq!(expand_two_digit_year(99, reference()), 1999);
    }

    #[test]
    fn invalid_month_classified() {
        let result = normalize_match(&PatternMatch::Absolute(abs(2024, 13, 1)), reference(), &window());
        assert_eq!(result, Err(DropReason::InvalidMonth));
    }

    #[test]
    fn invalid_day_classified() {
        let result = normalize_match(&PatternMatch::Absolute(abs(2023, 2, 29)), reference(), &window());
        assert_eq!(result, Err(DropReason::InvalidDay));
    }

    #[test]
    fn leap_day_accepted() {
        let result = normalize_match(&PatternMatch::Absolute(abs(2024, 2, 29)), reference(), &window());
        assert_eq!(result, Ok(NormalizedDate::Single(date(2024, 2, 29))));
    }

    #[test]
    fn old_dates_fall_outside_window() {
        let result = normalize_match(&PatternMatch::Absolute(abs(2010, 1, 1)), reference(), &window());
        assert_eq!(result, Err(DropReason::OutsideWindow));
    }

    #[test]
    fn relative_days_resolve_against_reference() {
        let rel = RelativeDateMatch {
            unit: TimeUnit::Day,
            count: 3,
            direction: RelativeDirection::Past,
        };
        assert_eq!(resolve_relative(&rel, reference()), Ok(date(2024, 5, 29)));
    }

    #[test]
    fn relative_months_clamp_to_month_end() {
        let rel = RelativeDateMatch {
            unit: TimeUnit::Month,
            count: 1,
            direction: RelativeDirection::Future,
        };
        assert_eq!(resolve_relative(&rel, date(2024, 1, 31)), Ok(date(2024, 2, 29)));
    }

    #[test]
    fn duration_span_counts_forward_from_start() {
        let duration = PatternMatch::Duration(DurationMatch {
            start: abs(2024, 1, 10),
            end: DurationEnd::Span {
                count: 5,
                unit: TimeUnit::Day,
            },
            keyword: Some("입원".into()),
        });
        assert_eq!(
            normalize_match(&duration, reference(), &window()),
            Ok(NormalizedDate::Range {
                start: date(2024, 1, 10),
                end: date(2024, 1, 15)
            })
        );
    }

    #[test]
    fn inverted_range_rejected() {
        let duration = PatternMatch::Duration(DurationMatch {
            start: abs(2024, 3, 10),
            end: DurationEnd::Date(abs(2024, 3, 1)),
            keyword: None,
        });
        assert_eq!(
            normalize_match(&duration, reference(), &window()),
            Err(DropReason::InvertedRange)
        );
    }
}
