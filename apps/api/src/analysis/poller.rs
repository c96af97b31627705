//! Completion polling for remote runs.
//!
//! Worst-case latency of one wait is `max_attempts * interval` plus retry
//! overhead on each status check. Callers treat that as the hard ceiling.

use std::time::Duration;

use tracing::debug;

use crate::analysis::retry::RetryPolicy;
use crate::analysis::AnalysisError;
use crate::assistant_client::{AssistantApi, ConversationHandle, RunHandle, RunSnapshot, RunStatus};

pub const DEFAULT_MAX_POLL_ATTEMPTS: u32 = 60;
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(1000);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSettings {
    pub max_attempts: u32,
    pub interval: Duration,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_POLL_ATTEMPTS,
            interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

/// Polls `run` until it completes, fails, or `settings.max_attempts` status
/// checks have been made.
///
/// - `completed` → returns the snapshot
/// - `failed` / `cancelled` / `expired` → `RunFailed` with the remote reason
/// - `queued` / `in_progress` → sleep `interval`, check again
/// - anything else → `UnknownRunStatus` (never polled further)
pub async fn wait_for_completion(
    client: &dyn AssistantApi,
    retry: &RetryPolicy,
    conversation: &ConversationHandle,
    run: &RunHandle,
    settings: PollSettings,
) -> Result<RunSnapshot, AnalysisError> {
    for attempt in 1..=settings.max_attempts {
        let snapshot = retry
            .run("get_run", || client.get_run(conversation, run))
            .await?;

        let status = snapshot.status.clone();
        match status {
            RunStatus::Completed => {
                debug!(run = %snapshot.id, attempt, "Run completed");
                return Ok(snapshot);
            }
            RunStatus::Failed | RunStatus::Cancelled | RunStatus::Expired => {
                return Err(AnalysisError::RunFailed {
                    status: snapshot.status,
                    reason: snapshot
                        .failure_reason
                        .unwrap_or_else(|| "no reason reported".to_string()),
                });
            }
            RunStatus::Queued | RunStatus::InProgress => {
                debug!(run = %run, attempt, status = %snapshot.status, "Run not finished yet");
                if attempt < settings.max_attempts {
                    tokio::time::sleep(settings.interval).await;
                }
            }
            RunStatus::Unknown(raw) => {
                return Err(AnalysisError::UnknownRunStatus(raw));
            }
        }
    }

    Err(AnalysisError::RunTimeout {
        attempts: settings.max_attempts,
    })
}
