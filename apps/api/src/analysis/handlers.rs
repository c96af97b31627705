//! Axum route handlers for the Analysis API.

use axum::{extract::State, Json};
use serde::Deserialize;

use crate::analysis::credentials::CredentialReport;
use crate::analysis::models::AnalysisResult;
use crate::errors::AppError;
use crate::state::AppState;

/// Upper bound on each submitted text field, in characters.
pub const MAX_INPUT_CHARS: usize = 20_000;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    pub applicant_text: String,
    pub job_description: String,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/analysis
///
/// Runs the full analysis for one application. Past input validation this
/// always answers 200: assistant failures come back as `success: false`.
pub async fn handle_analyze(
    State(state): State<AppState>,
    Json(request): Json<AnalyzeRequest>,
) -> Result<Json<AnalysisResult>, AppError> {
    check_text("applicant_text", &request.applicant_text)?;
    check_text("job_description", &request.job_description)?;

    let result = state
        .analysis
        .analyze_application(&request.applicant_text, &request.job_description)
        .await;

    Ok(Json(result))
}

/// GET /api/v1/analysis/config
///
/// Credential diagnostics with secrets masked.
pub async fn handle_config_report(State(state): State<AppState>) -> Json<CredentialReport> {
    Json(state.analysis.validate_config())
}

fn check_text(field: &str, value: &str) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{field} cannot be empty")));
    }
    if value.chars().count() > MAX_INPUT_CHARS {
        return Err(AppError::UnprocessableEntity(format!(
            "{field} exceeds {MAX_INPUT_CHARS} characters"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_text_rejects_blank() {
        assert!(matches!(
            check_text("applicant_text", "  \n "),
            Err(AppError::Validation(msg)) if msg == "applicant_text cannot be empty"
        ));
    }

    #[test]
    fn test_check_text_rejects_oversized() {
        let long = "a".repeat(MAX_INPUT_CHARS + 1);
        assert!(matches!(
            check_text("job_description", &long),
            Err(AppError::UnprocessableEntity(_))
        ));
    }

    #[test]
    fn test_check_text_accepts_limit() {
        let exact = "a".repeat(MAX_INPUT_CHARS);
        assert!(check_text("job_description", &exact).is_ok());
    }
}
