use uuid::Uuid;

use super::keywords::{classify_medical_context, context_type_for_keyword, find_medical_keywords};
use super::patterns::{patterns_for, DatePattern, PatternFamily};
use crate::pipeline::types::{
    DateAnchor, EnginePath, MedicalContext, PatternMatch, PatternTier, Span,
};

/// Byte ↔ character offset mapping for one text.
pub struct TextIndex<'t> {
    text: &'t str,
    char_starts: Vec<usize>,
}

impl<'t> TextIndex<'t> {
    pub fn new(text: &'t str) -> Self {
        Self {
            text,
            char_starts: text.char_indices().map(|(i, _)| i).collect(),
        }
    }

    pub fn char_len(&self) -> usize {
        self.char_starts.len()
    }

    pub fn to_char(&self, byte: usize) -> usize {
        match self.char_starts.binary_search(&byte) {
            Ok(i) | Err(i) => i,
        }
    }

    pub fn to_byte(&self, char_offset: usize) -> usize {
        self.char_starts
            .get(char_offset)
            .copied()
            .unwrap_or(self.text.len())
    }

    pub fn slice(&self, span: Span) -> &'t str {
        &self.text[self.to_byte(span.start)..self.to_byte(span.end)]
    }

    /// Character preceding `char_offset`, if any.
    pub fn char_before(&self, char_offset: usize) -> Option<char> {
        char_offset
            .checked_sub(1)
            .and_then(|i| self.text[self.to_byte(i)..].chars().next())
    }

    pub fn char_at(&self, char_offset: usize) -> Option<char> {
        self.text.get(self.to_byte(char_offset)..)?.chars().next()
    }
}

/// Date-anchored section of the document: a marker date and the text up to the next marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Section {
    pub marker: Span,
    pub body: Span,
}

/// Anchors produced by one extraction pass.
#[derive(Debug, Default)]
pub struct Extraction {
    pub anchors: Vec<DateAnchor>,
    /// Matches whose captures could not be parsed.
    pub pattern_failures: usize,
}

/// Applies pattern families to a text and records exact offsets.
pub struct PatternExtractor {
    context_window: usize,
    engine: EnginePath,
}

impl PatternExtractor {
    pub fn new(context_window: usize, engine: EnginePath) -> Self {
        Self {
            context_window,
            engine,
        }
    }

    /// Run every pattern of `families` over `text`.
    ///
    /// A pattern whose captures fail to parse loses only that match; the
    /// remaining matches and patterns still run. Anchors come back sorted by
    /// position, not yet normalized.
    pub fn extract(&self, text: &str, families: &[PatternFamily]) -> Extraction {
        let index = TextIndex::new(text);
        let sections = find_sections(&index);
        let mut extraction = Extraction::default();

        for pattern in patterns_for(families) {
            for caps in pattern.regex.captures_iter(text) {
                let Some(whole) = caps.get(0) else { continue };
                let mut span = Span::new(index.to_char(whole.start()), index.to_char(whole.end()));

                // Section anchors sit on their date marker, not the leading bullet.
                if pattern.tier == PatternTier::Structure {
                    if let Some(year) = caps.name("y") {
                        span.start = index.to_char(year.start());
                    }
                }

                if !digit_bounded(&index, span) || (pattern.month_guard && follows_month(&index, span)) {
                    continue;
                }

                let parsed = match pattern.parse(&caps) {
                    Ok(parsed) => parsed,
                    Err(e) => {
                        tracing::warn!(pattern = pattern.name, error = %e, "Skipping unparseable date match");
                        extraction.pattern_failures += 1;
                        continue;
                    }
                };

                let keyword = caps.name("kw").map(|m| m.as_str());
                let anchor = self.build_anchor(&index, &sections, pattern, parsed, span, keyword);
                extraction.anchors.push(anchor);
            }
        }

        extraction
            .anchors
            .sort_by_key(|a| (a.position.start, a.position.end));
        extraction
    }

    fn build_anchor(
        &self,
        index: &TextIndex,
        sections: &[Section],
        pattern: &DatePattern,
        parsed: PatternMatch,
        span: Span,
        keyword: Option<&str>,
    ) -> DateAnchor {
        let context_span = self.context_span(index, sections, span);
        let context = index.slice(context_span).to_string();

        let mut medical_context = classify_medical_context(
            &context,
            span.start - context_span.start,
            span.end - context_span.start,
        );
        if let Some(forced) = pattern
            .forced_context
            .or_else(|| keyword.map(context_type_for_keyword))
        {
            medical_context = MedicalContext::of(forced, medical_context.keywords);
        }

        let confidence = match pattern.tier {
            PatternTier::Structure => section_confidence(index, sections, span, pattern.confidence),
            _ => pattern.confidence,
        };

        DateAnchor {
            id: Uuid::new_v4().to_string(),
            source_text: index.slice(span).to_string(),
            category: pattern.category,
            tier: pattern.tier,
            pattern: pattern.name.to_string(),
            raw_groups: parsed,
            position: span,
            context,
            normalized_date: None,
            pattern_confidence: confidence,
            confidence,
            priority: pattern.priority,
            medical_context,
            hierarchy_score: 0.0,
            corroborated: false,
            engine: self.engine,
            merge_tag: None,
            merged_from: Vec::new(),
            merged_count: 1,
        }
    }

    /// ± window characters around the match, clipped to the enclosing section.
    fn context_span(&self, index: &TextIndex, sections: &[Section], span: Span) -> Span {
        let (lower, upper) = match sections.iter().find(|s| s.body.contains(span.start)) {
            Some(section) => (section.body.start, section.body.end),
            None => {
                let first_marker = sections.first().map_or(index.char_len(), |s| s.body.start);
                if span.start < first_marker {
                    (0, first_marker)
                } else {
                    (0, index.char_len())
                }
            }
        };
        let start = span.start.saturating_sub(self.context_window).max(lower);
        let end = (span.end + self.context_window).min(upper).max(span.end);
        Span::new(start, end)
    }
}

/// Tier-1 sections: each marker date at the start of a line opens a section
/// that runs until the next marker.
pub fn find_sections(index: &TextIndex) -> Vec<Section> {
    let Some(marker) = patterns_for(&[PatternFamily::Structure]).next() else {
        return Vec::new();
    };

    // (line start, date span) per marker
    let markers: Vec<(usize, Span)> = marker
        .regex
        .captures_iter(index.text)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let line_start = index.to_char(whole.start());
            let date_start = caps.name("y").map_or(line_start, |y| index.to_char(y.start()));
            Some((line_start, Span::new(date_start, index.to_char(whole.end()))))
        })
        .collect();

    markers
        .iter()
        .enumerate()
        .map(|(i, (line_start, date))| {
            let end = markers
                .get(i + 1)
                .map_or(index.char_len(), |(next_start, _)| *next_start);
            Section {
                marker: *date,
                body: Span::new(*line_start, end),
            }
        })
        .collect()
}

/// Section heuristic: base confidence, +0.1 when the section carries medical
/// keywords, +0.1 when it has substantial text.
fn section_confidence(index: &TextIndex, sections: &[Section], span: Span, base: f32) -> f32 {
    let Some(section) = sections.iter().find(|s| s.body.contains(span.start)) else {
        return base;
    };
    let body = index.slice(section.body);
    let mut confidence = base;
    if !find_medical_keywords(body).is_empty() {
        confidence += 0.1;
    }
    if section.body.len() >= 40 {
        confidence += 0.1;
    }
    confidence.min(0.8)
}

/// A date token must not be glued to further digits ("2024-01-155", "…024-01-15").
fn digit_bounded(index: &TextIndex, span: Span) -> bool {
    let before = index.char_before(span.start);
    let after = index.char_at(span.end);
    !before.is_some_and(char::is_numeric) && !after.is_some_and(char::is_numeric)
}

/// True when the previous non-blank character is a month marker.
fn follows_month(index: &TextIndex, span: Span) -> bool {
    let mut offset = span.start;
    while let Some(c) = index.char_before(offset) {
        if c == ' ' {
            offset -= 1;
            continue;
        }
        return c == '월';
    }
    false
}
