//! Response parsing. Splits one raw assistant reply into the recruiter-facing
//! analysis and the candidate-facing email, and extracts the match score.
//!
//! The reply format is not contractually guaranteed, so splitting uses an
//! ordered list of separator heuristics:
//! 1. an explicit "Candidate Email" section header (header line dropped)
//! 2. an email "Subject:" line (kept as the first line of the email)
//! 3. a horizontal rule (`---`, `***`, `___`; rule dropped)
//!
//! The highest-priority separator whose first occurrence yields two non-empty
//! segments wins. With no usable separator the whole reply becomes the
//! recruiter analysis and a placeholder email is substituted.

use once_cell::sync::Lazy;
use regex::{Match, Regex};

use crate::analysis::models::ParsedSections;

/// Substituted when the reply has no recognizable candidate email.
pub const PLACEHOLDER_EMAIL: &str = "Subject: Your application\n\n\
    Dear Candidate,\n\n\
    Thank you for your application. It has been received and is currently under review, \
    and you will be contacted once the review is complete.\n\n\
    Kind regards,\nThe Recruitment Team";

/// Substituted when the reply contained no usable text at all.
pub const EMPTY_ANALYSIS: &str =
    "The assistant returned no analysis text. Manual review of this application is required.";

static CANDIDATE_EMAIL_HEADER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?im)^[ \t]*(?:#{1,6}[ \t]*)?(?:\*\*)?(?:(?:part|section)[ \t]+)?(?:\d+[.):][ \t]*)?(?:\*\*)?candidate[ \t]+email(?:[ \t]+draft)?[ \t]*(?:\*\*)?[ \t]*:?[ \t]*(?:\*\*)?[ \t]*$",
    )
    .expect("valid regex")
});

static SUBJECT_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?im)^[ \t]*(?:\*\*)?subject[ \t]*(?:\*\*)?[ \t]*:").expect("valid regex")
});

static HORIZONTAL_RULE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^[ \t]*(?:-{3,}|\*{3,}|_{3,})[ \t]*$").expect("valid regex")
});

/// Top-level scaffold labels the prompt asks for, optionally numbered or
/// markdown-decorated. Stripped when they lead a segment.
static SCAFFOLD_HEADER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^[ \t]*(?:#{1,6}[ \t]*)?(?:\*\*)?(?:(?:part|section)[ \t]+)?(?:\d+[.):][ \t]*)?(?:\*\*)?(?:recruiter[ \t]+(?:analysis|feedback)|internal[ \t]+(?:analysis|feedback)|candidate[ \t]+email(?:[ \t]+draft)?|email[ \t]+draft)[ \t]*(?:\*\*)?[ \t]*:?[ \t]*(?:\*\*)?[ \t]*$",
    )
    .expect("valid regex")
});

static MATCH_SCORE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)match[ \t]*score[ \t]*(?:\*\*)?[ \t]*[:=\-][ \t]*(?:\*\*)?[ \t]*(-?\d+)")
        .expect("valid regex")
});

/// Splits raw assistant output into its two artifacts.
///
/// Implementations must never return an empty `candidate_email`.
pub trait ResponseParser: Send + Sync {
    fn parse(&self, raw: &str) -> ParsedSections;
}

/// Default parser using the ordered separator heuristics above.
#[derive(Debug, Default, Clone, Copy)]
pub struct SeparatorParser;

#[derive(Debug, Clone, Copy)]
enum Separator {
    CandidateEmailHeader,
    SubjectLine,
    HorizontalRule,
}

const SEPARATOR_PRIORITY: [Separator; 3] = [
    Separator::CandidateEmailHeader,
    Separator::SubjectLine,
    Separator::HorizontalRule,
];

impl Separator {
    fn find<'t>(&self, text: &'t str) -> Option<Match<'t>> {
        match self {
            Separator::CandidateEmailHeader => CANDIDATE_EMAIL_HEADER.find(text),
            Separator::SubjectLine => SUBJECT_LINE.find(text),
            Separator::HorizontalRule => HORIZONTAL_RULE.find(text),
        }
    }

    /// Returns (before, after). The Subject line belongs to the email.
    fn split<'t>(&self, text: &'t str, m: &Match<'t>) -> (&'t str, &'t str) {
        match self {
            Separator::SubjectLine => (&text[..m.start()], &text[m.start()..]),
            _ => (&text[..m.start()], &text[m.end()..]),
        }
    }
}

impl ResponseParser for SeparatorParser {
    fn parse(&self, raw: &str) -> ParsedSections {
        // A separator followed by nothing still marks where the analysis ends.
        let mut analysis_only: Option<String> = None;

        for separator in SEPARATOR_PRIORITY {
            let Some(m) = separator.find(raw) else {
                continue;
            };
            let (before, after) = separator.split(raw, &m);
            let recruiter_analysis = strip_scaffold(before);
            let candidate_email = strip_scaffold(after);

            match (recruiter_analysis.is_empty(), candidate_email.is_empty()) {
                (false, false) => {
                    return ParsedSections {
                        recruiter_analysis,
                        candidate_email,
                    }
                }
                (false, true) if analysis_only.is_none() => {
                    analysis_only = Some(recruiter_analysis);
                }
                _ => {}
            }
        }

        let recruiter_analysis = analysis_only.unwrap_or_else(|| strip_scaffold(raw));
        ParsedSections {
            recruiter_analysis: if recruiter_analysis.is_empty() {
                EMPTY_ANALYSIS.to_string()
            } else {
                recruiter_analysis
            },
            candidate_email: PLACEHOLDER_EMAIL.to_string(),
        }
    }
}

/// Removes leading scaffold header lines and surrounding whitespace.
fn strip_scaffold(segment: &str) -> String {
    let mut rest = segment.trim();
    loop {
        let (first_line, remainder) = rest.split_once('\n').unwrap_or((rest, ""));
        if !SCAFFOLD_HEADER.is_match(first_line.trim_end_matches('\r')) {
            break;
        }
        rest = remainder.trim_start();
    }
    rest.trim_end().to_string()
}

/// Extracts the first "Match Score: N" value, clamped to 0 – 100.
/// Returns 0 when no score is present.
pub fn parse_match_score(text: &str) -> u8 {
    let Some(caps) = MATCH_SCORE.captures(text) else {
        return 0;
    };
    let digits = &caps[1];

    match digits.parse::<i64>() {
        Ok(score) => score.clamp(0, 100) as u8,
        // Only overflow can fail here; the sign says which bound it is past.
        Err(_) if digits.starts_with('-') => 0,
        Err(_) => 100,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(raw: &str) -> ParsedSections {
        SeparatorParser.parse(raw)
    }

    const RECRUITER: &str = "Match Score: 72\n\
        Key Strengths:\n- Six years of Rust\n- Led a platform migration\n\
        Gaps:\n- No Kubernetes exposure\n\
        Recommendation: Advance to technical interview.";

    const EMAIL: &str = "Subject: Your application for Backend Engineer\n\n\
        Dear Alex,\n\nThank you for applying. The hiring team is reviewing your background \
        and will follow up shortly.\n\nBest regards,\nRecruitment";

    #[test]
    fn test_explicit_header_splits_and_strips_scaffold() {
        let raw = format!("1. RECRUITER ANALYSIS\n{RECRUITER}\n\n2. CANDIDATE EMAIL\n{EMAIL}");
        let parsed = parse(&raw);
        assert_eq!(parsed.recruiter_analysis, RECRUITER);
        assert_eq!(parsed.candidate_email, EMAIL);
    }

    #[test]
    fn test_round_trip_with_known_separator() {
        let raw = format!("{RECRUITER}\n\nCANDIDATE EMAIL:\n{EMAIL}");
        let parsed = parse(&raw);
        let rebuilt = format!(
            "{}\n\nCANDIDATE EMAIL:\n{}",
            parsed.recruiter_analysis, parsed.candidate_email
        );
        assert_eq!(rebuilt, raw);
    }

    #[test]
    fn test_markdown_decorated_header() {
        let raw = format!("## Recruiter Analysis\n{RECRUITER}\n\n## **Candidate Email Draft**\n{EMAIL}");
        let parsed = parse(&raw);
        assert_eq!(parsed.recruiter_analysis, RECRUITER);
        assert_eq!(parsed.candidate_email, EMAIL);
    }

    #[test]
    fn test_subject_marker_keeps_subject_line() {
        let raw = format!("{RECRUITER}\n\n{EMAIL}");
        let parsed = parse(&raw);
        assert_eq!(parsed.recruiter_analysis, RECRUITER);
        assert!(parsed.candidate_email.starts_with("Subject: Your application"));
        assert_eq!(parsed.candidate_email, EMAIL);
    }

    #[test]
    fn test_horizontal_rule_fallback() {
        let raw = "Match Score: 40\nWeak alignment.\n\n---\n\nDear Sam,\nThanks for applying.";
        let parsed = parse(raw);
        assert_eq!(parsed.recruiter_analysis, "Match Score: 40\nWeak alignment.");
        assert_eq!(parsed.candidate_email, "Dear Sam,\nThanks for applying.");
    }

    #[test]
    fn test_header_takes_priority_over_subject_and_rule() {
        let raw = format!("{RECRUITER}\n---\nCandidate Email\n{EMAIL}");
        let parsed = parse(&raw);
        assert_eq!(parsed.recruiter_analysis, format!("{RECRUITER}\n---"));
        assert_eq!(parsed.candidate_email, EMAIL);
    }

    #[test]
    fn test_no_separator_uses_placeholder_email() {
        let raw = "Match Score: 65\nSolid background in distributed systems.";
        let parsed = parse(raw);
        assert_eq!(parsed.recruiter_analysis, raw);
        assert_eq!(parsed.candidate_email, PLACEHOLDER_EMAIL);
        assert!(!parsed.candidate_email.is_empty());
    }

    #[test]
    fn test_separator_with_empty_email_falls_through() {
        let raw = format!("{RECRUITER}\n\nCANDIDATE EMAIL\n   \n");
        let parsed = parse(&raw);
        assert_eq!(parsed.recruiter_analysis, RECRUITER);
        assert_eq!(parsed.candidate_email, PLACEHOLDER_EMAIL);
    }

    #[test]
    fn test_leading_rule_does_not_produce_empty_analysis() {
        let raw = "---\nMatch Score: 10\nNot a fit.";
        let parsed = parse(raw);
        assert_eq!(parsed.recruiter_analysis, raw);
        assert_eq!(parsed.candidate_email, PLACEHOLDER_EMAIL);
    }

    #[test]
    fn test_empty_reply_never_yields_empty_artifacts() {
        let parsed = parse("   \n ");
        assert_eq!(parsed.recruiter_analysis, EMPTY_ANALYSIS);
        assert_eq!(parsed.candidate_email, PLACEHOLDER_EMAIL);
    }

    #[test]
    fn test_in_sentence_mention_is_not_a_header() {
        let raw = "Match Score: 55\nThe candidate email address is missing from the resume.";
        let parsed = parse(raw);
        assert_eq!(parsed.recruiter_analysis, raw);
        assert_eq!(parsed.candidate_email, PLACEHOLDER_EMAIL);
    }

    #[test]
    fn test_match_score_exact_in_range() {
        for n in [0u8, 1, 50, 72, 99, 100] {
            assert_eq!(parse_match_score(&format!("Match Score: {n}")), n);
        }
    }

    #[test]
    fn test_match_score_with_suffix_and_markdown() {
        assert_eq!(parse_match_score("**Match Score:** 81/100"), 81);
        assert_eq!(parse_match_score("match score - 64%"), 64);
    }

    #[test]
    fn test_match_score_clamps_out_of_range() {
        assert_eq!(parse_match_score("Match Score: 150"), 100);
        assert_eq!(parse_match_score("Match Score: -20"), 0);
        assert_eq!(parse_match_score("Match Score: 99999999999999999999999"), 100);
        assert_eq!(parse_match_score("Match Score: -99999999999999999999999"), 0);
    }

    #[test]
    fn test_match_score_missing_defaults_to_zero() {
        assert_eq!(parse_match_score("Strong candidate overall."), 0);
        assert_eq!(parse_match_score("Match Score: N/A"), 0);
    }

    #[test]
    fn test_match_score_uses_first_occurrence() {
        assert_eq!(parse_match_score("Match Score: 30\n...\nMatch Score: 90"), 30);
    }
}
