use std::str::FromStr;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};

use crate::analysis::credentials::AssistantConfig;
use crate::analysis::orchestrator::AnalysisOptions;
use crate::analysis::poller::{PollSettings, DEFAULT_MAX_POLL_ATTEMPTS};
use crate::analysis::retry::{RetryPolicy, DEFAULT_MAX_ATTEMPTS};
use crate::analysis::validation::ValidationProfile;
use crate::assistant_client::DEFAULT_API_BASE;

/// Application configuration loaded from environment variables.
///
/// Assistant credentials are optional: missing or malformed values put the
/// analysis service in fallback mode instead of failing startup. Malformed
/// tuning values are startup errors.
///
/// `ASSISTANT_MAX_ATTEMPTS` counts every attempt of a remote call, the first
/// one included, so `1` disables retries.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub rust_log: String,
    pub assistant: AssistantConfig,
    pub assistant_api_base: String,
    pub request_timeout: Duration,
    pub analysis: AnalysisOptions,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from any key-value source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let assistant = AssistantConfig {
            api_key: optional(&lookup, "OPENAI_API_KEY"),
            organization_id: optional(&lookup, "OPENAI_ORG_ID"),
            assistant_id: optional(&lookup, "OPENAI_ASSISTANT_ID"),
        };

        let retry = RetryPolicy::new(
            parse_or(&lookup, "ASSISTANT_MAX_ATTEMPTS", DEFAULT_MAX_ATTEMPTS)?,
            Duration::from_millis(parse_or(&lookup, "ASSISTANT_RETRY_BASE_MS", 1000)?),
        );

        let poll = PollSettings {
            max_attempts: parse_or(&lookup, "ASSISTANT_MAX_POLL_ATTEMPTS", DEFAULT_MAX_POLL_ATTEMPTS)?,
            interval: Duration::from_millis(parse_or(&lookup, "ASSISTANT_POLL_INTERVAL_MS", 1000)?),
        };

        let deadline = match optional(&lookup, "ANALYSIS_DEADLINE_SECS") {
            Some(raw) => Some(Duration::from_secs(
                raw.parse::<u64>()
                    .context("ANALYSIS_DEADLINE_SECS must be a whole number of seconds")?,
            )),
            None => None,
        };

        let profile = match optional(&lookup, "VALIDATION_PROFILE") {
            Some(raw) => raw
                .parse::<ValidationProfile>()
                .map_err(|e| anyhow!(e))
                .context("VALIDATION_PROFILE is invalid")?,
            None => ValidationProfile::default(),
        };

        Ok(Config {
            port: parse_or(&lookup, "PORT", 8080)?,
            rust_log: optional(&lookup, "RUST_LOG").unwrap_or_else(|| "info".to_string()),
            assistant,
            assistant_api_base: optional(&lookup, "ASSISTANT_API_BASE")
                .unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
            request_timeout: Duration::from_secs(parse_or(
                &lookup,
                "ASSISTANT_REQUEST_TIMEOUT_SECS",
                60,
            )?),
            analysis: AnalysisOptions {
                retry,
                poll,
                deadline,
                profile,
            },
        })
    }
}

/// Trimmed value, or `None` when unset or blank.
fn optional(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<String> {
    lookup(key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match optional(lookup, key) {
        Some(raw) => raw
            .parse::<T>()
            .with_context(|| format!("Environment variable '{key}' has invalid value '{raw}'")),
        None => Ok(default),
    }
}
