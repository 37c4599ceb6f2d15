use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{error_for_status, http_client, transport, ApiKey, ClientSettings, Completion, Extractor};
use crate::error::{Result, ScrapeError};
use crate::provider::LlmProvider;

const PROVIDER: &str = "Claude";
const API_VERSION: &str = "2023-06-01";

/// Anthropic Messages API.
pub struct ClaudeClient {
    http: Client,
    key: ApiKey,
    model: String,
    base_url: String,
    max_tokens: u32,
}

impl ClaudeClient {
    pub fn new(key: ApiKey, model: impl Into<String>, settings: &ClientSettings) -> Self {
        Self {
            http: http_client(settings.timeout),
            key,
            model: model.into(),
            base_url: settings
                .base_url
                .clone()
                .unwrap_or_else(|| LlmProvider::Claude.spec().default_base_url.to_string()),
            max_tokens: settings.max_tokens,
        }
    }
}

#[async_trait]
impl Extractor for ClaudeClient {
    async fn extract(&self, prompt: &str, content: &str) -> Result<Completion> {
        let body = MessagesRequest {
            model: &self.model,
            max_tokens: self.max_tokens,
            system: prompt,
            messages: vec![Message {
                role: "user",
                content,
            }],
        };

        let resp = self
            .http
            .post(format!("{}/v1/messages", self.base_url.trim_end_matches('/')))
            .header("x-api-key", self.key.expose())
            .header("anthropic-version", API_VERSION)
            .json(&body)
            .send()
            .await
            .map_err(|e| transport(PROVIDER, e))?;

        let reply: MessagesResponse = error_for_status(PROVIDER, resp)
            .await?
            .json()
            .await
            .map_err(|e| transport(PROVIDER, e))?;

        let texts: Vec<String> = reply
            .content
            .into_iter()
            .filter(|b| b.kind == "text")
            .filter_map(|b| b.text)
            .collect();
        if texts.is_empty() {
            return Err(ScrapeError::EmptyResponse {
                provider: PROVIDER.to_string(),
            });
        }

        Ok(Completion {
            text: texts.concat(),
            prompt_tokens: reply.usage.input_tokens,
            completion_tokens: reply.usage.output_tokens,
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
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: Vec<Message<'a>>,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
    #[serde(default)]
    usage: Usage,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    text: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Usage {
    input_tokens: u64,
    output_tokens: u64,
}
