//! LLM completion clients.
//!
//! The composed prompt always goes out as the system instruction and the page
//! content as the user turn, so page text cannot override the extraction
//! instructions.

pub mod claude;
pub mod gemini;
pub mod retry;

use std::time::Duration;

use async_trait::async_trait;

use crate::error::{Result, ScrapeError};
use crate::provider::LlmProvider;

pub use claude::ClaudeClient;
pub use gemini::GeminiClient;
pub use retry::Retrying;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);
pub const DEFAULT_MAX_TOKENS: u32 = 4096;

/// Raw reply text plus the token counts the vendor reported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub text: String,
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
}

#[async_trait]
pub trait Extractor: Send + Sync {
    async fn extract(&self, prompt: &str, content: &str) -> Result<Completion>;
    /// Vendor name for diagnostics.
    fn provider(&self) -> &str;
    fn model(&self) -> &str;
}

/// An API key that never shows up in `Debug` output or logs.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(key: impl Into<String>) -> Result<Self> {
        let key = key.into();
        let trimmed = key.trim();
        if trimmed.is_empty() {
            return Err(ScrapeError::Auth("API key is empty".into()));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Key from an optional value (flag or env var), with a hint naming the variable.
    pub fn require(value: Option<String>, provider: LlmProvider) -> Result<Self> {
        match value {
            Some(v) => Self::new(v),
            None => Err(ScrapeError::Auth(format!(
                "no API key for {provider}, set ${}",
                provider.key_env()
            ))),
        }
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ApiKey(***)")
    }
}

#[derive(Debug, Clone)]
pub struct ClientSettings {
    /// Overrides the vendor endpoint, e.g. for a proxy or a test server.
    pub base_url: Option<String>,
    pub timeout: Duration,
    pub max_tokens: u32,
    pub max_retries: u32,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            base_url: None,
            timeout: DEFAULT_TIMEOUT,
            max_tokens: DEFAULT_MAX_TOKENS,
            max_retries: 0,
        }
    }
}

pub fn build_extractor(
    provider: LlmProvider,
    model: &str,
    key: ApiKey,
    settings: &ClientSettings,
) -> Box<dyn Extractor> {
    match provider {
        LlmProvider::Gemini => Box::new(Retrying::new(
            GeminiClient::new(key, model, settings),
            settings.max_retries,
        )),
        LlmProvider::Claude => Box::new(Retrying::new(
            ClaudeClient::new(key, model, settings),
            settings.max_retries,
        )),
    }
}

pub(crate) fn http_client(timeout: Duration) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .unwrap_or_default()
}

/// Map a non-success reply to Auth (401/403) or Transport.
pub(crate) async fn error_for_status(
    provider: &str,
    resp: reqwest::Response,
) -> Result<reqwest::Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let code = status.as_u16();
    let body = resp.text().await.unwrap_or_default();
    match code {
        401 | 403 => Err(ScrapeError::Auth(format!(
            "{provider} rejected the API key (HTTP {code}): {body}"
        ))),
        _ => Err(ScrapeError::Transport {
            status: Some(code),
            message: body,
        }),
    }
}

pub(crate) fn transport(provider: &str, e: reqwest::Error) -> ScrapeError {
    ScrapeError::Transport {
        status: e.status().map(|s| s.as_u16()),
        message: format!("{provider}: {e}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_key_debug_is_redacted() {
        let key = ApiKey::new("sk-secret").unwrap();
        assert_eq!(format!("{key:?}"), "ApiKey(***)");
        assert_eq!(key.expose(), "sk-secret");
    }

    #[test]
    fn missing_key_is_auth_error_naming_env_var() {
        let err = ApiKey::require(None, LlmProvider::Claude).unwrap_err();
        match err {
            ScrapeError::Auth(msg) => assert!(msg.contains("ANTHROPIC_API_KEY"), "{msg}"),
            other => panic!("expected Auth, got {other:?}"),
        }
    }

    #[test]
    fn blank_key_is_rejected() {
        assert!(matches!(ApiKey::new("   "), Err(ScrapeError::Auth(_))));
    }

    #[test]
    fn build_extractor_reports_provider_and_model() {
        let key = ApiKey::new("k").unwrap();
        let e = build_extractor(LlmProvider::Claude, "claude-x", key, &ClientSettings::default());
        assert_eq!(e.provider(), "Claude");
        assert_eq!(e.model(), "claude-x");
    }
}
