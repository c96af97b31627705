//! Credential validation for the assistant integration.
//!
//! Produces a report instead of failing fast: every field gets checked and
//! the first problem per field is recorded. An invalid report puts the
//! analysis service in fallback mode for the rest of the process lifetime.

use std::fmt;

use serde::Serialize;

/// Accepted API key prefixes (secret keys and session keys).
pub const API_KEY_PREFIXES: &[&str] = &["sk-", "sess-"];
pub const ORGANIZATION_PREFIX: &str = "org-";
pub const ASSISTANT_PREFIX: &str = "asst_";

const QUOTE_CHARS: &[char] = &['"', '\'', '`'];

/// Immutable snapshot of the three credential values, read once at startup.
#[derive(Clone, Default)]
pub struct AssistantConfig {
    pub api_key: Option<String>,
    pub organization_id: Option<String>,
    pub assistant_id: Option<String>,
}

impl fmt::Debug for AssistantConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AssistantConfig")
            .field("api_key", &self.api_key.as_deref().map(mask_api_key))
            .field(
                "organization_id",
                &self.organization_id.as_deref().map(mask_organization_id),
            )
            .field("assistant_id", &self.assistant_id)
            .finish()
    }
}

/// Log-safe view of the credentials.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MaskedConfig {
    pub api_key: Option<String>,
    pub organization_id: Option<String>,
    pub assistant_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CredentialReport {
    pub is_valid: bool,
    pub issues: Vec<String>,
    pub masked: MaskedConfig,
}

/// Checks all three credential fields. Never fails; always returns a report.
pub fn validate_credentials(config: &AssistantConfig) -> CredentialReport {
    let issues: Vec<String> = [
        check_api_key(config.api_key.as_deref()),
        check_organization_id(config.organization_id.as_deref()),
        check_assistant_id(config.assistant_id.as_deref()),
    ]
    .into_iter()
    .flatten()
    .collect();

    CredentialReport {
        is_valid: issues.is_empty(),
        issues,
        masked: MaskedConfig {
            api_key: config.api_key.as_deref().map(mask_api_key),
            organization_id: config.organization_id.as_deref().map(mask_organization_id),
            assistant_id: config.assistant_id.clone(),
        },
    }
}

fn check_api_key(value: Option<&str>) -> Option<String> {
    let key = match value {
        Some(v) if !v.is_empty() => v,
        _ => return Some("OPENAI_API_KEY is not set".to_string()),
    };

    if !API_KEY_PREFIXES.iter().any(|p| key.starts_with(p)) {
        return Some(format!(
            "OPENAI_API_KEY must start with one of: {}",
            API_KEY_PREFIXES.join(", ")
        ));
    }
    if key.chars().any(char::is_whitespace) {
        return Some("OPENAI_API_KEY contains whitespace".to_string());
    }
    None
}

fn check_organization_id(value: Option<&str>) -> Option<String> {
    let org = match value {
        Some(v) if !v.is_empty() => v,
        _ => return Some("OPENAI_ORG_ID is not set".to_string()),
    };

    if !org.starts_with(ORGANIZATION_PREFIX) {
        return Some(format!(
            "OPENAI_ORG_ID must start with '{ORGANIZATION_PREFIX}'"
        ));
    }
    if org.chars().any(char::is_whitespace) {
        return Some("OPENAI_ORG_ID contains whitespace".to_string());
    }
    if org.contains(QUOTE_CHARS) {
        return Some("OPENAI_ORG_ID contains quote characters".to_string());
    }
    None
}

fn check_assistant_id(value: Option<&str>) -> Option<String> {
    let id = match value {
        Some(v) if !v.is_empty() => v,
        _ => return Some("OPENAI_ASSISTANT_ID is not set".to_string()),
    };

    if !id.starts_with(ASSISTANT_PREFIX) {
        return Some(format!(
            "OPENAI_ASSISTANT_ID must start with '{ASSISTANT_PREFIX}'"
        ));
    }
    if id.chars().any(char::is_whitespace) {
        return Some("OPENAI_ASSISTANT_ID contains whitespace".to_string());
    }
    None
}

/// First 5 and last 4 characters of the key; short keys are fully hidden.
pub fn mask_api_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 9 {
        return "****".to_string();
    }
    let head: String = chars[..5].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}...{tail}")
}

/// Last 4 characters of the organization id only.
pub fn mask_organization_id(org: &str) -> String {
    let chars: Vec<char> = org.chars().collect();
    if chars.len() <= 4 {
        return "****".to_string();
    }
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("...{tail}")
}
