use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use super::ContentSource;
use crate::error::{Result, ScrapeError};

const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 \
                          (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

/// One plain GET, no JavaScript.
pub struct HttpSource {
    http: Client,
    url: String,
}

impl HttpSource {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            http: Client::builder()
                .timeout(timeout)
                .user_agent(USER_AGENT)
                .build()
                .unwrap_or_default(),
            url: url.into(),
        }
    }
}

#[async_trait]
impl ContentSource for HttpSource {
    async fn acquire(&self) -> Result<String> {
        let resp = self
            .http
            .get(&self.url)
            .send()
            .await
            .map_err(|e| ScrapeError::Network {
                url: self.url.clone(),
                status: None,
                message: e.to_string(),
            })?;

        let status = resp.status();
        if !status.is_success() {
            return Err(ScrapeError::Network {
                url: self.url.clone(),
                status: Some(status.as_u16()),
                message: status
                    .canonical_reason()
                    .unwrap_or("unexpected status")
                    .to_string(),
            });
        }

        resp.text().await.map_err(|e| ScrapeError::Network {
            url: self.url.clone(),
            status: Some(status.as_u16()),
            message: format!("failed to read body: {e}"),
        })
    }

    fn describe(&self) -> String {
        format!("GET {}", self.url)
    }
}
