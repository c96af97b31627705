//! Deterministic, non-AI results.
//!
//! `generate_fallback` covers "assistant not configured". `manual_review_result`
//! covers "assistant failed during this call". Both always carry a non-empty
//! recruiter analysis and candidate email.

use crate::analysis::models::{AnalysisResult, ValidationReport};
use crate::analysis::validation::{validate_output, ValidationProfile};
use crate::analysis::AnalysisError;

pub const FALLBACK_SCORE: u8 = 50;

const FALLBACK_ANALYSIS: &str = "Match Score: 50\n\
    Key Strengths:\n- Not assessed: automated analysis is not configured.\n\
    Gaps:\n- Not assessed: automated analysis is not configured.\n\
    Recommendation: Route this application to a recruiter for manual review.";

const UNDER_REVIEW_EMAIL: &str = "Subject: Your application is under review\n\n\
    Dear Candidate,\n\n\
    Thank you for your application. It has been received and is now under review. \
    You will hear back once the review is complete.\n\n\
    Kind regards,\nThe Recruitment Team";

/// Neutral result used while the assistant integration is disabled.
pub fn generate_fallback(profile: ValidationProfile) -> AnalysisResult {
    let combined = format!("{FALLBACK_ANALYSIS}\n\nCandidate Email:\n{UNDER_REVIEW_EMAIL}");

    AnalysisResult {
        success: true,
        recruiter_analysis: FALLBACK_ANALYSIS.to_string(),
        candidate_email: UNDER_REVIEW_EMAIL.to_string(),
        match_score: FALLBACK_SCORE,
        validation: validate_output(&combined, profile),
        error_message: None,
    }
}

/// Degraded result for an analysis that was attempted and failed.
pub fn manual_review_result(error: &AnalysisError) -> AnalysisResult {
    let reason = error.to_string();

    AnalysisResult {
        success: false,
        recruiter_analysis: format!(
            "Automated analysis failed ({reason}). Manual review of this application is required."
        ),
        candidate_email: UNDER_REVIEW_EMAIL.to_string(),
        match_score: 0,
        validation: ValidationReport {
            is_valid: false,
            missing_sections: Vec::new(),
            issues: vec![format!("Analysis failed: {reason}")],
            word_count: 0,
        },
        error_message: Some(reason),
    }
}
