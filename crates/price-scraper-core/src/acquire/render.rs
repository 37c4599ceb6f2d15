//! Headless Chromium source for pages that only show prices after JavaScript runs.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::page::Page;
use futures::StreamExt;
use tokio::time::Instant;

use super::{ContentSource, DEFAULT_RENDER_TIMEOUT};
use crate::error::{Result, ScrapeError};

const POLL_INTERVAL: Duration = Duration::from_millis(250);

pub struct RenderedSource {
    url: String,
    wait_for: String,
    timeout: Duration,
    chromium_path: Option<PathBuf>,
}

impl RenderedSource {
    pub fn new(url: impl Into<String>, wait_for: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            wait_for: wait_for.into(),
            timeout: DEFAULT_RENDER_TIMEOUT,
            chromium_path: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Without a path chromiumoxide looks for a system Chrome/Chromium.
    pub fn with_chromium_path(mut self, path: Option<PathBuf>) -> Self {
        self.chromium_path = path;
        self
    }

    async fn launch(&self) -> Result<(Browser, tokio::task::JoinHandle<()>)> {
        let mut builder = BrowserConfig::builder()
            .arg("--disable-gpu")
            .arg("--no-sandbox")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-extensions")
            .request_timeout(self.timeout);
        if let Some(path) = &self.chromium_path {
            builder = builder.chrome_executable(path);
        }
        let config = builder
            .build()
            .map_err(|e| ScrapeError::Render(format!("failed to build browser config: {e}")))?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| ScrapeError::Render(format!("failed to launch Chromium: {e}")))?;

        let events = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                let _ = event;
            }
        });

        Ok((browser, events))
    }

    async fn render(&self, browser: &Browser) -> Result<String> {
        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| ScrapeError::Render(format!("failed to open tab: {e}")))?;

        page.goto(self.url.as_str())
            .await
            .map_err(|e| ScrapeError::Render(format!("navigation to {} failed: {e}", self.url)))?;
        if let Err(e) = page.wait_for_navigation().await {
            tracing::debug!(url = %self.url, error = %e, "navigation did not settle, polling anyway");
        }

        self.wait_until_visible(&page).await?;

        page.content()
            .await
            .map_err(|e| ScrapeError::Render(format!("failed to serialize page: {e}")))
    }

    async fn wait_until_visible(&self, page: &Page) -> Result<()> {
        let script = visibility_script(&self.wait_for);
        let started = Instant::now();

        loop {
            let visible = page
                .evaluate(script.as_str())
                .await
                .ok()
                .and_then(|r| r.into_value::<bool>().ok())
                .unwrap_or(false);
            if visible {
                tracing::debug!(selector = %self.wait_for, waited_ms = started.elapsed().as_millis() as u64, "element visible");
                return Ok(());
            }
            if started.elapsed() >= self.timeout {
                return Err(ScrapeError::RenderTimeout {
                    url: self.url.clone(),
                    selector: self.wait_for.clone(),
                    waited: self.timeout,
                });
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }
}

#[async_trait]
impl ContentSource for RenderedSource {
    async fn acquire(&self) -> Result<String> {
        let (mut browser, events) = self.launch().await?;

        let result = self.render(&browser).await;

        // Shut the browser down whether or not rendering worked.
        if let Err(e) = browser.close().await {
            tracing::warn!("failed to close browser: {e}");
        }
        let _ = browser.wait().await;
        events.abort();

        result
    }

    fn describe(&self) -> String {
        format!("render {} (wait for '{}')", self.url, self.wait_for)
    }
}

/// JS expression: true once the first match has a non-empty box and is not hidden.
fn visibility_script(selector: &str) -> String {
    // A JSON string literal is a valid JS string literal.
    let sel = serde_json::to_string(selector).unwrap_or_else(|_| "\"\"".into());
    format!(
        "(() => {{ const el = document.querySelector({sel}); \
         if (!el) return false; \
         const r = el.getBoundingClientRect(); \
         const s = window.getComputedStyle(el); \
         return r.width > 0 && r.height > 0 && s.visibility !== 'hidden' && s.display !== 'none'; }})()"
    )
}
