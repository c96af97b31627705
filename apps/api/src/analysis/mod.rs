// Analysis Orchestrator: turns applicant text + job description into recruiter
// feedback and a candidate email by driving the hosted assistant.
// All network calls go through assistant_client, all of them through RetryPolicy.

pub mod conversation;
pub mod credentials;
pub mod fallback;
pub mod handlers;
pub mod models;
pub mod orchestrator;
pub mod parser;
pub mod poller;
pub mod prompts;
pub mod retry;
pub mod validation;

#[cfg(test)]
pub(crate) mod testing;

use std::time::Duration;

use thiserror::Error;

use crate::assistant_client::{AssistantError, RunStatus};

/// Failures that may escape the inner analysis operation. Caught at the top
/// of `analyze_application` and turned into a manual-review result.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("assistant call failed: {0}")]
    Transport(#[from] AssistantError),

    #[error("run ended with status '{status}': {reason}")]
    RunFailed { status: RunStatus, reason: String },

    #[error("run reported unrecognized status '{0}'")]
    UnknownRunStatus(String),

    #[error("run did not complete after {attempts} status checks")]
    RunTimeout { attempts: u32 },

    #[error("analysis exceeded its {0:?} deadline")]
    DeadlineExceeded(Duration),

    #[error("assistant produced no reply")]
    EmptyResponse,
}
