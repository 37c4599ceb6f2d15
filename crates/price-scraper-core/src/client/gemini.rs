use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{error_for_status, http_client, transport, ApiKey, ClientSettings, Completion, Extractor};
use crate::error::{Result, ScrapeError};
use crate::provider::LlmProvider;

const PROVIDER: &str = "Gemini";

/// Google Generative Language API, `generateContent`.
pub struct GeminiClient {
    http: Client,
    key: ApiKey,
    model: String,
    base_url: String,
}

impl GeminiClient {
    pub fn new(key: ApiKey, model: impl Into<String>, settings: &ClientSettings) -> Self {
        Self {
            http: http_client(settings.timeout),
            key,
            model: model.into(),
            base_url: settings
                .base_url
                .clone()
                .unwrap_or_else(|| LlmProvider::Gemini.spec().default_base_url.to_string()),
        }
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            urlencoding::encode(&self.model)
        )
    }
}

#[async_trait]
impl Extractor for GeminiClient {
    async fn extract(&self, prompt: &str, content: &str) -> Result<Completion> {
        let body = GenerateRequest {
            system_instruction: Content {
                role: None,
                parts: vec![Part::text(prompt)],
            },
            contents: vec![Content {
                role: Some("user"),
                parts: vec![Part::text(content)],
            }],
        };

        let resp = self
            .http
            .post(self.endpoint())
            .header("x-goog-api-key", self.key.expose())
            .json(&body)
            .send()
            .await
            .map_err(|e| transport(PROVIDER, e))?;

        // Gemini answers a bad key with 400 rather than 401.
        if resp.status().as_u16() == 400 {
            let text = resp.text().await.unwrap_or_default();
            if text.contains("API_KEY_INVALID") {
                return Err(ScrapeError::Auth(format!("{PROVIDER} rejected the API key: {text}")));
            }
            return Err(ScrapeError::Transport {
                status: Some(400),
                message: text,
            });
        }

        let reply: GenerateResponse = error_for_status(PROVIDER, resp)
            .await?
            .json()
            .await
            .map_err(|e| transport(PROVIDER, e))?;

        let text = reply
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .and_then(|c| c.parts.into_iter().next())
            .and_then(|p| p.text)
            .ok_or_else(|| ScrapeError::EmptyResponse {
                provider: PROVIDER.to_string(),
            })?;

        let usage = reply.usage_metadata.unwrap_or_default();
        Ok(Completion {
            text,
            prompt_tokens: usage.prompt_token_count,
            completion_tokens: usage.candidates_token_count,
        })
    }

    fn provider(&self) -> &str {
        PROVIDER
    }

    fn model(&self) -> &str {
        &self.model
    }
}

// Wire types

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    system_instruction: Content<'a>,
    contents: Vec<Content<'a>>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'a str>,
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

impl<'a> Part<'a> {
    fn text(text: &'a str) -> Self {
        Self { text }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<ReplyContent>,
}

#[derive(Debug, Deserialize)]
struct ReplyContent {
    #[serde(default)]
    parts: Vec<ReplyPart>,
}

#[derive(Debug, Deserialize)]
struct ReplyPart {
    text: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct UsageMetadata {
    prompt_token_count: u64,
    candidates_token_count: u64,
}
