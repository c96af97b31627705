use serde::{Deserialize, Serialize};

/// Outcome of checking raw assistant output against the feedback policy.
/// Observational only: a failing report flags the result for human review,
/// it never blocks returning it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub is_valid: bool,
    pub missing_sections: Vec<String>,
    pub issues: Vec<String>,
    pub word_count: usize,
}

/// The only artifact that crosses the orchestrator's public boundary.
///
/// `recruiter_analysis` and `candidate_email` are never empty, including
/// when `success` is false.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub success: bool,
    pub recruiter_analysis: String,
    pub candidate_email: String,
    /// Always within 0 – 100.
    pub match_score: u8,
    pub validation: ValidationReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

/// The two artifacts split out of one raw assistant reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedSections {
    pub recruiter_analysis: String,
    pub candidate_email: String,
}
