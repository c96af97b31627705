//! In-memory assistant used by the analysis tests. Counts every call.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::assistant_client::{
    AssistantApi, AssistantError, ConversationHandle, RunHandle, RunSnapshot, RunStatus,
};

#[derive(Debug, Default)]
pub(crate) struct CallCounts {
    pub create_conversation: AtomicUsize,
    pub delete_conversation: AtomicUsize,
    pub post_message: AtomicUsize,
    pub create_run: AtomicUsize,
    pub get_run: AtomicUsize,
    pub list_messages: AtomicUsize,
}

impl CallCounts {
    pub fn total(&self) -> usize {
        [
            &self.create_conversation,
            &self.delete_conversation,
            &self.post_message,
            &self.create_run,
            &self.get_run,
            &self.list_messages,
        ]
        .iter()
        .map(|c| c.load(Ordering::SeqCst))
        .sum()
    }
}

pub(crate) struct FakeAssistant {
    pub calls: CallCounts,
    pub posted: Mutex<Vec<String>>,
    reply: Option<String>,
    statuses: Mutex<VecDeque<RunStatus>>,
    final_status: RunStatus,
    failure_reason: Option<String>,
    fail_create: bool,
    fail_network: bool,
    fail_delete: bool,
}

fn transport_error() -> AssistantError {
    AssistantError::Api {
        status: 503,
        message: "service unavailable".to_string(),
    }
}

impl FakeAssistant {
    /// Completes every run immediately with `reply` as the assistant message.
    pub fn replying(reply: &str) -> Self {
        Self {
            calls: CallCounts::default(),
            posted: Mutex::new(Vec::new()),
            reply: Some(reply.to_string()),
            statuses: Mutex::new(VecDeque::new()),
            final_status: RunStatus::Completed,
            failure_reason: None,
            fail_create: false,
            fail_network: false,
            fail_delete: false,
        }
    }

    /// Completes runs but never writes an assistant message.
    pub fn silent() -> Self {
        Self {
            reply: None,
            ..Self::replying("")
        }
    }

    /// Reports `statuses` in order, then `Completed` for every later check.
    pub fn with_statuses(self, statuses: Vec<RunStatus>) -> Self {
        Self {
            statuses: Mutex::new(statuses.into()),
            ..self
        }
    }

    /// Reports `status` for every check.
    pub fn stuck_in(self, status: RunStatus) -> Self {
        Self {
            final_status: status,
            ..self
        }
    }

    pub fn with_failure_reason(self, reason: &str) -> Self {
        Self {
            failure_reason: Some(reason.to_string()),
            ..self
        }
    }

    /// Conversation creation works; every other call except delete fails.
    pub fn failing_network(self) -> Self {
        Self {
            fail_network: true,
            ..self
        }
    }

    pub fn failing_create(self) -> Self {
        Self {
            fail_create: true,
            ..self
        }
    }

    pub fn failing_delete(self) -> Self {
        Self {
            fail_delete: true,
            ..self
        }
    }

    fn network(&self) -> Result<(), AssistantError> {
        if self.fail_network {
            Err(transport_error())
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl AssistantApi for FakeAssistant {
    async fn create_conversation(&self) -> Result<ConversationHandle, AssistantError> {
        let n = self.calls.create_conversation.fetch_add(1, Ordering::SeqCst);
        if self.fail_create {
            return Err(transport_error());
        }
        Ok(ConversationHandle(format!("thread_{n}")))
    }

    async fn delete_conversation(
        &self,
        _conversation: &ConversationHandle,
    ) -> Result<(), AssistantError> {
        self.calls.delete_conversation.fetch_add(1, Ordering::SeqCst);
        if self.fail_delete {
            return Err(transport_error());
        }
        Ok(())
    }

    async fn post_message(
        &self,
        _conversation: &ConversationHandle,
        text: &str,
    ) -> Result<(), AssistantError> {
        self.calls.post_message.fetch_add(1, Ordering::SeqCst);
        self.network()?;
        self.posted.lock().unwrap().push(text.to_string());
        Ok(())
    }

    async fn create_run(
        &self,
        _conversation: &ConversationHandle,
        _assistant_id: &str,
    ) -> Result<RunHandle, AssistantError> {
        self.calls.create_run.fetch_add(1, Ordering::SeqCst);
        self.network()?;
        Ok(RunHandle("run_1".to_string()))
    }

    async fn get_run(
        &self,
        _conversation: &ConversationHandle,
        run: &RunHandle,
    ) -> Result<RunSnapshot, AssistantError> {
        self.calls.get_run.fetch_add(1, Ordering::SeqCst);
        self.network()?;
        let status = self
            .statuses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| self.final_status.clone());
        Ok(RunSnapshot {
            id: run.clone(),
            status,
            failure_reason: self.failure_reason.clone(),
        })
    }

    async fn list_messages(
        &self,
        _conversation: &ConversationHandle,
    ) -> Result<Vec<String>, AssistantError> {
        self.calls.list_messages.fetch_add(1, Ordering::SeqCst);
        self.network()?;
        Ok(self.reply.iter().cloned().collect())
    }
}
