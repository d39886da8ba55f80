use crate::pipeline::types::{MedicalContext, MedicalContextType};

/// A keyword table for one clinical role.
struct KeywordGroup {
    context_type: MedicalContextType,
    keywords: &'static [&'static str],
}

/// Clinical vocabulary of Korean medical records, grouped by role.
/// Order matters: on equal distance the earlier group wins.
const KEYWORD_GROUPS: &[KeywordGroup] = &[
    KeywordGroup {
        context_type: MedicalContextType::CurrentVisit,
        keywords: &["내원", "방문", "초진", "재진", "외래", "진료일", "진료", "응급실", "금일"],
    },
    KeywordGroup {
        context_type: MedicalContextType::Diagnosis,
        keywords: &["진단서", "진단", "확진", "소견서", "소견", "판정"],
    },
    KeywordGroup {
        context_type: MedicalContextType::Surgery,
        keywords: &["수술", "시술", "절제", "봉합", "마취"],
    },
    KeywordGroup {
        context_type: MedicalContextType::Treatment,
        keywords: &["입원", "퇴원", "치료", "처방", "투약", "복용", "주사", "수혈", "재활"],
    },
    KeywordGroup {
        context_type: MedicalContextType::Examination,
        keywords: &[
            "혈액검사", "소변검사", "조직검사", "검사", "촬영", "판독", "초음파", "내시경",
            "CT", "MRI", "X-ray",
        ],
    },
    KeywordGroup {
        context_type: MedicalContextType::Symptom,
        keywords: &["증상", "통증", "발병", "발생", "발현", "호소", "부상", "사고"],
    },
    KeywordGroup {
        context_type: MedicalContextType::PastHistory,
        keywords: &["과거력", "기왕력", "병력", "과거", "이전"],
    },
];

/// Keywords that, adjacent to a date, make it a clinical-action anchor.
/// Longer alternatives first so the regex prefers them.
pub const ACTION_KEYWORDS: &[&str] = &[
    "진료일", "내원", "방문", "초진", "재진", "외래", "진단", "확진", "수술", "시술", "입원",
    "퇴원", "치료", "처방", "투약", "검사", "촬영", "발병",
];

/// Keywords opening a Tier-2 hospitalization block.
pub const HOSPITALIZATION_KEYWORDS: &[&str] = &["입원기간", "입원", "퇴원", "재원"];
/// Keywords opening a Tier-2 surgery/procedure block.
pub const SURGERY_KEYWORDS: &[&str] = &["수술명", "수술", "시술", "처치"];
/// Keywords opening a Tier-2 test/examination block.
pub const EXAMINATION_KEYWORDS: &[&str] = &[
    "혈액검사", "조직검사", "검사", "촬영", "판독", "초음파", "내시경", "CT", "MRI",
];

/// Alternation fragment for a keyword list, e.g. `(?:입원|퇴원)`.
pub fn alternation(keywords: &[&str]) -> String {
    let escaped: Vec<String> = keywords.iter().map(|k| regex::escape(k)).collect();
    format!("(?:{})", escaped.join("|"))
}

/// Every medical keyword occurring in `text`, in table order, without duplicates.
pub fn find_medical_keywords(text: &str) -> Vec<String> {
    let mut found: Vec<String> = Vec::new();
    for group in KEYWORD_GROUPS {
        for keyword in group.keywords {
            if text.contains(keyword) && !found.iter().any(|f| f.contains(keyword)) {
                found.push((*keyword).to_string());
            }
        }
    }
    found
}

/// Number of keyword occurrences, used for density measures.
pub fn count_medical_keywords(text: &str) -> usize {
    KEYWORD_GROUPS
        .iter()
        .flat_map(|g| g.keywords.iter())
        .map(|k| text.matches(k).count())
        .sum()
}

/// Classify the clinical role of a date found at `focus` (char offsets
/// within `context`). The keyword closest to the date decides.
pub fn classify_medical_context(context: &str, focus_start: usize, focus_end: usize) -> MedicalContext {
    let keywords = find_medical_keywords(context);
    if keywords.is_empty() {
        return MedicalContext::general();
    }

    let mut best: Option<(usize, MedicalContextType)> = None;
    for group in KEYWORD_GROUPS {
        for keyword in group.keywords {
            for (byte_idx, _) in context.match_indices(keyword) {
                let start = context[..byte_idx].chars().count();
                let end = start + keyword.chars().count();
                let distance = if end <= focus_start {
                    focus_start - end
                } else if start >= focus_end {
                    start - focus_end
                } else {
                    0
                };
                if best.map_or(true, |(d, _)| distance < d) {
                    best = Some((distance, group.context_type));
                }
            }
        }
    }

    match best {
        Some((_, context_type)) => MedicalContext::of(context_type, keywords),
        None => MedicalContext::general(),
    }
}

/// Role implied by an explicit keyword (used by Tier-2 blocks and medical matches).
pub fn context_type_for_keyword(keyword: &str) -> MedicalContextType {
    KEYWORD_GROUPS
        .iter()
        .find(|g| g.keywords.iter().any(|k| keyword.contains(k)))
        .map(|g| g.context_type)
        .unwrap_or(MedicalContextType::General)
}
