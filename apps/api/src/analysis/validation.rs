use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::analysis::models::ValidationReport;

/// Word ceiling profile. `Lean` matches the short feedback-only format,
/// `Dual` the recruiter analysis + candidate email format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ValidationProfile {
    Lean,
    #[default]
    Dual,
}

impl ValidationProfile {
    pub fn max_words(self) -> usize {
        match self {
            ValidationProfile::Lean => 150,
            ValidationProfile::Dual => 500,
        }
    }
}

impl FromStr for ValidationProfile {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lean" => Ok(ValidationProfile::Lean),
            "dual" => Ok(ValidationProfile::Dual),
            other => Err(format!("unknown validation profile '{other}' (expected lean or dual)")),
        }
    }
}

/// (label reported when missing, header alternatives)
const REQUIRED_SECTIONS: &[(&str, &str)] = &[
    ("Match Score", r"match[ \t]+score"),
    ("Key Strengths", r"(?:key[ \t]+)?strengths"),
    (
        "Gaps",
        r"gaps(?:[ \t]*(?:&|and)[ \t]*concerns)?|concerns|areas[ \t]+for[ \t]+development",
    ),
    ("Recommendation", r"recommendation"),
    ("Candidate Email", r"candidate[ \t]+email(?:[ \t]+draft)?"),
];

/// Company-voice phrases that break the arm's-length reviewer stance.
const DISALLOWED_PHRASES: &[&str] = &[
    "our company",
    "our team",
    "our organization",
    "we are excited",
    "we are pleased",
    "we would love",
    "join us",
];

static SECTION_HEADERS: Lazy<Vec<(&'static str, Regex)>> = Lazy::new(|| {
    REQUIRED_SECTIONS
        .iter()
        .map(|(label, alternatives)| {
            let pattern = format!(
                r"(?im)^[ \t]*(?:#{{1,6}}[ \t]*)?(?:\*\*)?(?:\d+[.):][ \t]*)?(?:\*\*)?(?:{alternatives})[ \t]*(?:\*\*)?[ \t]*(?::|$)"
            );
            (*label, Regex::new(&pattern).expect("valid section regex"))
        })
        .collect()
});

static PHRASE_PATTERNS: Lazy<Vec<(&'static str, Regex)>> = Lazy::new(|| {
    DISALLOWED_PHRASES
        .iter()
        .map(|phrase| {
            let pattern = format!(r"(?i)\b{}\b", regex::escape(phrase).replace(' ', r"\s+"));
            (*phrase, Regex::new(&pattern).expect("valid phrase regex"))
        })
        .collect()
});

/// Checks raw assistant output against the feedback policy.
///
/// - each required section must have a header followed by non-empty content
///   (content runs until the next required header or end of text)
/// - total word count must not exceed the profile ceiling
/// - every occurrence of a disallowed phrase is an issue
///
/// Never fails; the report only lowers confidence in the result.
pub fn validate_output(text: &str, profile: ValidationProfile) -> ValidationReport {
    let headers: Vec<(&str, Option<(usize, usize)>)> = SECTION_HEADERS
        .iter()
        .map(|(label, re)| (*label, re.find(text).map(|m| (m.start(), m.end()))))
        .collect();

    let starts: Vec<usize> = headers
        .iter()
        .filter_map(|(_, span)| span.map(|(start, _)| start))
        .collect();

    let missing_sections: Vec<String> = headers
        .iter()
        .filter(|(_, span)| match span {
            Some((start, end)) => {
                let content_end = starts
                    .iter()
                    .copied()
                    .filter(|s| s > start)
                    .min()
                    .unwrap_or(text.len())
                    .max(*end);
                !has_content(&text[*end..content_end])
            }
            None => true,
        })
        .map(|(label, _)| label.to_string())
        .collect();

    let word_count = text.split_whitespace().count();
    let max_words = profile.max_words();

    let mut issues = Vec::new();
    if word_count > max_words {
        issues.push(format!(
            "Response is {word_count} words; the limit is {max_words}"
        ));
    }

    for (phrase, re) in PHRASE_PATTERNS.iter() {
        for _ in re.find_iter(text) {
            issues.push(format!(
                "Contains disallowed company-voice phrase '{phrase}'"
            ));
        }
    }

    ValidationReport {
        is_valid: missing_sections.is_empty() && issues.is_empty(),
        missing_sections,
        issues,
        word_count,
    }
}

/// True when the segment holds something besides whitespace and markdown
/// decoration.
fn has_content(segment: &str) -> bool {
    segment
        .chars()
        .any(|c| !c.is_whitespace() && !matches!(c, '*' | '#' | ':' | '-' | '_'))
}
