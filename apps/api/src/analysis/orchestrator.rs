//! Analysis Orchestrator: the single public entry point of the subsystem.
//!
//! Flow per call:
//!   open conversation → post prompt → create run → poll to completion →
//!   fetch reply → parse + validate → close conversation (always).
//!
//! `analyze_application` never returns an error. Unconfigured credentials
//! produce the neutral fallback result; failures during a call produce a
//! manual-review result with `success = false`.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::analysis::conversation::with_conversation;
use crate::analysis::credentials::{validate_credentials, AssistantConfig, CredentialReport};
use crate::analysis::fallback::{generate_fallback, manual_review_result};
use crate::analysis::models::AnalysisResult;
use crate::analysis::parser::{parse_match_score, ResponseParser, SeparatorParser};
use crate::analysis::poller::{wait_for_completion, PollSettings};
use crate::analysis::prompts::build_analysis_prompt;
use crate::analysis::retry::RetryPolicy;
use crate::analysis::validation::{validate_output, ValidationProfile};
use crate::analysis::AnalysisError;
use crate::assistant_client::{AssistantApi, ConversationHandle};

/// Tuning knobs for one service instance.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnalysisOptions {
    pub retry: RetryPolicy,
    pub poll: PollSettings,
    /// Hard ceiling on one analysis, enforced inside the conversation scope.
    pub deadline: Option<Duration>,
    pub profile: ValidationProfile,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceMode {
    Ready,
    Degraded,
}

/// Result of `initialize()`, logged at startup and reported by `/health`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceStatus {
    pub mode: ServiceMode,
    pub issues: Vec<String>,
    pub reachable: bool,
}

/// Drives the hosted assistant for application analysis.
///
/// Holds no per-request state; safe to share behind an `Arc` and call
/// concurrently.
pub struct AnalysisService {
    client: Arc<dyn AssistantApi>,
    config: AssistantConfig,
    report: CredentialReport,
    parser: Arc<dyn ResponseParser>,
    options: AnalysisOptions,
}

impl AnalysisService {
    /// Builds the service without any I/O. Credentials are validated once
    /// here and the outcome is fixed for the lifetime of the instance.
    pub fn new(
        config: AssistantConfig,
        client: Arc<dyn AssistantApi>,
        options: AnalysisOptions,
    ) -> Self {
        let report = validate_credentials(&config);
        Self {
            client,
            config,
            report,
            parser: Arc::new(SeparatorParser),
            options,
        }
    }

    #[cfg_attr(not(test), allow(dead_code))]
    pub fn with_parser(mut self, parser: Arc<dyn ResponseParser>) -> Self {
        self.parser = parser;
        self
    }

    pub fn is_enabled(&self) -> bool {
        self.report.is_valid
    }

    /// Startup diagnostics: credential report with masked values.
    pub fn validate_config(&self) -> CredentialReport {
        self.report.clone()
    }

    /// Second initialization phase: logs the credential state and probes the
    /// service. Never fatal.
    pub async fn initialize(&self) -> ServiceStatus {
        let masked = &self.report.masked;
        info!(
            api_key = masked.api_key.as_deref().unwrap_or("<unset>"),
            organization = masked.organization_id.as_deref().unwrap_or("<unset>"),
            assistant = masked.assistant_id.as_deref().unwrap_or("<unset>"),
            "Assistant configuration loaded"
        );

        let mode = if self.report.is_valid {
            ServiceMode::Ready
        } else {
            for issue in &self.report.issues {
                warn!("Assistant configuration issue: {issue}");
            }
            warn!("Assistant integration disabled; analyses will use the fallback result");
            ServiceMode::Degraded
        };

        let reachable = self.test_connection().await;
        if !reachable {
            warn!("Assistant service is unreachable; analyses will need manual review until it recovers");
        }

        ServiceStatus {
            mode,
            issues: self.report.issues.clone(),
            reachable,
        }
    }

    /// Opens and immediately deletes one conversation.
    ///
    /// Returns `true` without any call when the integration is disabled, so an
    /// unconfigured assistant never blocks startup or health checks.
    pub async fn test_connection(&self) -> bool {
        if !self.is_enabled() {
            return true;
        }

        let conversation = match self.client.create_conversation().await {
            Ok(c) => c,
            Err(e) => {
                warn!(error = %e, "Assistant connectivity probe failed");
                return false;
            }
        };

        match self.client.delete_conversation(&conversation).await {
            Ok(()) => {
                info!("Assistant connectivity probe succeeded");
                true
            }
            Err(e) => {
                warn!(conversation = %conversation, error = %e, "Assistant connectivity probe could not clean up");
                false
            }
        }
    }

    /// Analyzes one application. Never fails; see module docs.
    pub async fn analyze_application(
        &self,
        applicant_text: &str,
        job_description: &str,
    ) -> AnalysisResult {
        let analysis_id = Uuid::new_v4();

        let assistant_id = match self.config.assistant_id.as_deref() {
            Some(id) if self.is_enabled() => id,
            _ => {
                info!(%analysis_id, "Assistant not configured; returning fallback analysis");
                return generate_fallback(self.options.profile);
            }
        };

        let prompt =
            build_analysis_prompt(applicant_text, job_description, self.options.profile.max_words());

        info!(%analysis_id, "Starting application analysis");

        match self.run_analysis(analysis_id, assistant_id, &prompt).await {
            Ok(raw) => {
                let result = self.build_result(&raw);
                info!(
                    %analysis_id,
                    match_score = result.match_score,
                    valid = result.validation.is_valid,
                    "Application analysis complete"
                );
                result
            }
            Err(e) => {
                error!(%analysis_id, error = %e, "Application analysis failed; manual review required");
                manual_review_result(&e)
            }
        }
    }

    async fn run_analysis(
        &self,
        analysis_id: Uuid,
        assistant_id: &str,
        prompt: &str,
    ) -> Result<String, AnalysisError> {
        with_conversation(
            self.client.clone(),
            &self.options.retry,
            |conversation| async move {
                let exchange = self.exchange(analysis_id, &conversation, assistant_id, prompt);

                let outcome = match self.options.deadline {
                    Some(limit) => match tokio::time::timeout(limit, exchange).await {
                        Ok(outcome) => outcome,
                        Err(_) => Err(AnalysisError::DeadlineExceeded(limit)),
                    },
                    None => exchange.await,
                };

                if let Err(e) = &outcome {
                    warn!(%analysis_id, conversation = %conversation, error = %e, "Assistant exchange aborted");
                }
                outcome
            },
        )
        .await
    }

    /// Prompt → run → poll → fetch, strictly in order.
    async fn exchange(
        &self,
        analysis_id: Uuid,
        conversation: &ConversationHandle,
        assistant_id: &str,
        prompt: &str,
    ) -> Result<String, AnalysisError> {
        let client = self.client.as_ref();
        let retry = &self.options.retry;

        retry
            .run("post_message", || client.post_message(conversation, prompt))
            .await?;

        let run = retry
            .run("create_run", || client.create_run(conversation, assistant_id))
            .await?;
        info!(%analysis_id, conversation = %conversation, run = %run, "Run started; polling for completion");

        wait_for_completion(client, retry, conversation, &run, self.options.poll).await?;

        let messages = retry
            .run("list_messages", || client.list_messages(conversation))
            .await?;

        messages
            .into_iter()
            .find(|m| !m.trim().is_empty())
            .ok_or(AnalysisError::EmptyResponse)
    }

    fn build_result(&self, raw: &str) -> AnalysisResult {
        let sections = self.parser.parse(raw);

        AnalysisResult {
            success: true,
            match_score: parse_match_score(&sections.recruiter_analysis),
            validation: validate_output(raw, self.options.profile),
            recruiter_analysis: sections.recruiter_analysis,
            candidate_email: sections.candidate_email,
            error_message: None,
        }
    }
}
