//! Scoped conversation lifecycle.
//!
//! A conversation is created, handed to the caller's work, and deleted
//! exactly once on every exit path. Deletion failures are logged and never
//! replace the work's own result or error. If the whole future is dropped
//! before the work finishes, deletion is handed to a background task.

use std::future::Future;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::analysis::retry::RetryPolicy;
use crate::analysis::AnalysisError;
use crate::assistant_client::{AssistantApi, ConversationHandle};

/// Opens a conversation (with retry), runs `work` in it, then deletes it.
///
/// If creation itself fails there is nothing to delete and the creation
/// error is returned. Deletion is a single best-effort attempt.
pub async fn with_conversation<T, F, Fut>(
    client: Arc<dyn AssistantApi>,
    retry: &RetryPolicy,
    work: F,
) -> Result<T, AnalysisError>
where
    F: FnOnce(ConversationHandle) -> Fut,
    Fut: Future<Output = Result<T, AnalysisError>>,
{
    let conversation = retry
        .run("create_conversation", || client.create_conversation())
        .await?;
    debug!(conversation = %conversation, "Conversation opened");

    let mut guard = ConversationGuard {
        client: client.clone(),
        conversation: Some(conversation.clone()),
    };

    let outcome = work(conversation.clone()).await;

    guard.disarm();
    close_conversation(client.as_ref(), &conversation).await;

    outcome
}

/// Deletes the conversation from a spawned task if dropped while armed.
struct ConversationGuard {
    client: Arc<dyn AssistantApi>,
    conversation: Option<ConversationHandle>,
}

impl ConversationGuard {
    fn disarm(&mut self) {
        self.conversation = None;
    }
}

impl Drop for ConversationGuard {
    fn drop(&mut self) {
        let Some(conversation) = self.conversation.take() else {
            return;
        };
        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                warn!(conversation = %conversation, "Analysis abandoned; deleting conversation in background");
                let client = self.client.clone();
                runtime.spawn(async move {
                    close_conversation(client.as_ref(), &conversation).await;
                });
            }
            Err(_) => warn!(
                conversation = %conversation,
                "Analysis abandoned outside a runtime; leaving conversation to expire remotely"
            ),
        }
    }
}

async fn close_conversation(client: &dyn AssistantApi, conversation: &ConversationHandle) {
    match client.delete_conversation(conversation).await {
        Ok(()) => debug!(conversation = %conversation, "Conversation closed"),
        Err(e) => warn!(
            conversation = %conversation,
            error = %e,
            "Failed to delete conversation; leaving it to expire remotely"
        ),
    }
}
