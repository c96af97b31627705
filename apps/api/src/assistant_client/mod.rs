/// Assistant Client: the single point of entry for all calls to the hosted
/// conversational assistant (threads / messages / runs protocol).
///
/// ARCHITECTURAL RULE: No other module may call the assistant API directly.
/// The orchestrator only ever sees the `AssistantApi` trait, so tests inject
/// an in-memory fake and production injects `OpenAiAssistantClient`.
///
/// This layer performs exactly one HTTP request per method call. Retries,
/// backoff and polling live in `analysis`, not here.
use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

pub const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";
const ASSISTANTS_BETA: &str = "assistants=v2";
/// How many recent messages to scan when looking for the assistant's reply.
const MESSAGE_PAGE_LIMIT: u32 = 20;

#[derive(Debug, Error)]
pub enum AssistantError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Malformed response: {0}")]
    Malformed(String),
}

// ────────────────────────────────────────────────────────────────────────────
// Handles and run state
// ────────────────────────────────────────────────────────────────────────────

/// Opaque remote handle for one isolated exchange (a "thread").
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationHandle(pub String);

impl fmt::Display for ConversationHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Remote asynchronous job bound to one conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunHandle(pub String);

impl fmt::Display for RunHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lifecycle state of a run. Anything the protocol adds later lands in
/// `Unknown` with the raw string preserved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunStatus {
    Queued,
    InProgress,
    Completed,
    Failed,
    Cancelled,
    Expired,
    Unknown(String),
}

impl RunStatus {
    pub fn from_wire(raw: &str) -> Self {
        match raw {
            "queued" => RunStatus::Queued,
            "in_progress" => RunStatus::InProgress,
            "completed" => RunStatus::Completed,
            "failed" => RunStatus::Failed,
            "cancelled" => RunStatus::Cancelled,
            "expired" => RunStatus::Expired,
            other => RunStatus::Unknown(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            RunStatus::Queued => "queued",
            RunStatus::InProgress => "in_progress",
            RunStatus::Completed => "completed",
            RunStatus::Failed => "failed",
            RunStatus::Cancelled => "cancelled",
            RunStatus::Expired => "expired",
            RunStatus::Unknown(raw) => raw,
        }
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One observation of a run's state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSnapshot {
    pub id: RunHandle,
    pub status: RunStatus,
    /// Remote-reported failure reason, if the run failed.
    pub failure_reason: Option<String>,
}

// ────────────────────────────────────────────────────────────────────────────
// Trait definition
// ────────────────────────────────────────────────────────────────────────────

/// The assistant client trait. Every method may fail with a transport error.
///
/// Carried by the analysis service as `Arc<dyn AssistantApi>`.
#[async_trait]
pub trait AssistantApi: Send + Sync {
    async fn create_conversation(&self) -> Result<ConversationHandle, AssistantError>;

    async fn delete_conversation(&self, conversation: &ConversationHandle)
        -> Result<(), AssistantError>;

    async fn post_message(
        &self,
        conversation: &ConversationHandle,
        text: &str,
    ) -> Result<(), AssistantError>;

    async fn create_run(
        &self,
        conversation: &ConversationHandle,
        assistant_id: &str,
    ) -> Result<RunHandle, AssistantError>;

    async fn get_run(
        &self,
        conversation: &ConversationHandle,
        run: &RunHandle,
    ) -> Result<RunSnapshot, AssistantError>;

    /// Assistant-authored message texts, newest first.
    async fn list_messages(
        &self,
        conversation: &ConversationHandle,
    ) -> Result<Vec<String>, AssistantError>;
}

// ────────────────────────────────────────────────────────────────────────────
// Wire types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct CreateMessageRequest<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct CreateRunRequest<'a> {
    assistant_id: &'a str,
}

#[derive(Debug, Deserialize)]
struct ObjectId {
    id: String,
}

#[derive(Debug, Deserialize)]
struct RunObject {
    id: String,
    status: String,
    last_error: Option<RunError>,
}

#[derive(Debug, Deserialize)]
struct RunError {
    code: Option<String>,
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MessageList {
    data: Vec<MessageObject>,
}

#[derive(Debug, Deserialize)]
struct MessageObject {
    role: String,
    #[serde(default)]
    content: Vec<MessageContent>,
}

#[derive(Debug, Deserialize)]
struct MessageContent {
    #[serde(rename = "type")]
    content_type: String,
    text: Option<MessageText>,
}

#[derive(Debug, Deserialize)]
struct MessageText {
    value: String,
}

#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

impl MessageObject {
    /// Concatenates every text block of the message.
    fn text(&self) -> String {
        self.content
            .iter()
            .filter(|c| c.content_type == "text")
            .filter_map(|c| c.text.as_ref().map(|t| t.value.as_str()))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl RunError {
    fn reason(&self) -> String {
        match (&self.code, &self.message) {
            (Some(code), Some(message)) => format!("{code}: {message}"),
            (None, Some(message)) => message.clone(),
            (Some(code), None) => code.clone(),
            (None, None) => "no reason reported".to_string(),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Production client
// ────────────────────────────────────────────────────────────────────────────

/// HTTP client for the hosted assistants API.
#[derive(Clone)]
pub struct OpenAiAssistantClient {
    client: Client,
    api_base: String,
    api_key: String,
    organization_id: String,
}

impl OpenAiAssistantClient {
    pub fn new(
        api_base: &str,
        api_key: String,
        organization_id: String,
        request_timeout: Duration,
    ) -> Result<Self, AssistantError> {
        let client = Client::builder().timeout(request_timeout).build()?;

        Ok(Self {
            client,
            api_base: api_base.trim_end_matches('/').to_string(),
            api_key,
            organization_id,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_base, path)
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        let builder = builder
            .bearer_auth(&self.api_key)
            .header("OpenAI-Beta", ASSISTANTS_BETA);
        if self.organization_id.is_empty() {
            builder
        } else {
            builder.header("OpenAI-Organization", &self.organization_id)
        }
    }

    async fn send_json<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, AssistantError> {
        let response = check_status(self.authorized(builder).send().await?).await?;
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| AssistantError::Malformed(e.to_string()))
    }
}

/// Maps a non-success response to `AssistantError::Api`, preferring the
/// remote `error.message` over the raw body.
async fn check_status(response: Response) -> Result<Response, AssistantError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ApiErrorEnvelope>(&body)
        .map(|e| e.error.message)
        .unwrap_or(body);

    Err(AssistantError::Api {
        status: status.as_u16(),
        message,
    })
}

#[async_trait]
impl AssistantApi for OpenAiAssistantClient {
    async fn create_conversation(&self) -> Result<ConversationHandle, AssistantError> {
        let created: ObjectId = self
            .send_json(self.client.post(self.url("/threads")).json(&serde_json::json!({})))
            .await?;
        debug!(conversation = %created.id, "Conversation created");
        Ok(ConversationHandle(created.id))
    }

    async fn delete_conversation(
        &self,
        conversation: &ConversationHandle,
    ) -> Result<(), AssistantError> {
        let request = self
            .client
            .delete(self.url(&format!("/threads/{conversation}")));
        check_status(self.authorized(request).send().await?).await?;
        debug!(conversation = %conversation, "Conversation deleted");
        Ok(())
    }

    async fn post_message(
        &self,
        conversation: &ConversationHandle,
        text: &str,
    ) -> Result<(), AssistantError> {
        let request = self
            .client
            .post(self.url(&format!("/threads/{conversation}/messages")))
            .json(&CreateMessageRequest {
                role: "user",
                content: text,
            });
        let _: ObjectId = self.send_json(request).await?;
        Ok(())
    }

    async fn create_run(
        &self,
        conversation: &ConversationHandle,
        assistant_id: &str,
    ) -> Result<RunHandle, AssistantError> {
        let request = self
            .client
            .post(self.url(&format!("/threads/{conversation}/runs")))
            .json(&CreateRunRequest { assistant_id });
        let run: RunObject = self.send_json(request).await?;
        debug!(conversation = %conversation, run = %run.id, status = %run.status, "Run created");
        Ok(RunHandle(run.id))
    }

    async fn get_run(
        &self,
        conversation: &ConversationHandle,
        run: &RunHandle,
    ) -> Result<RunSnapshot, AssistantError> {
        let request = self
            .client
            .get(self.url(&format!("/threads/{conversation}/runs/{run}")));
        let run: RunObject = self.send_json(request).await?;

        Ok(RunSnapshot {
            id: RunHandle(run.id),
            status: RunStatus::from_wire(&run.status),
            failure_reason: run.last_error.as_ref().map(RunError::reason),
        })
    }

    async fn list_messages(
        &self,
        conversation: &ConversationHandle,
    ) -> Result<Vec<String>, AssistantError> {
        let request = self
            .client
            .get(self.url(&format!("/threads/{conversation}/messages")))
            .query(&[
                ("order", "desc".to_string()),
                ("limit", MESSAGE_PAGE_LIMIT.to_string()),
            ]);
        let list: MessageList = self.send_json(request).await?;

        Ok(list
            .data
            .iter()
            .filter(|m| m.role == "assistant")
            .map(MessageObject::text)
            .collect())
    }
}
