//! One extraction run: acquire, narrow, compose, extract, decode.

use std::time::Duration;

use tokio::time::Instant;

use crate::acquire::ContentSource;
use crate::client::Extractor;
use crate::decode;
use crate::error::ScrapeError;
use crate::narrow::Narrowing;
use crate::pricing::PriceScraperResponse;
use crate::prompt;
use crate::usage::ExtractionUsage;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Acquire,
    Narrow,
    Extract,
    Decode,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Acquire => "acquire",
            Self::Narrow => "narrow",
            Self::Extract => "extract",
            Self::Decode => "decode",
        })
    }
}

/// The first failure of a run and the stage it happened in.
#[derive(Debug, thiserror::Error)]
#[error("{stage} failed: {source}")]
pub struct RunError {
    pub stage: Stage,
    #[source]
    pub source: ScrapeError,
}

impl RunError {
    fn at(stage: Stage) -> impl FnOnce(ScrapeError) -> Self {
        move |source| Self { stage, source }
    }
}

#[derive(Debug, Clone)]
pub struct RunReport {
    pub response: PriceScraperResponse,
    pub usage: ExtractionUsage,
    /// Acquire through decode.
    pub total_elapsed: Duration,
    pub provider: String,
    pub model: String,
    pub source: String,
}

pub async fn run(
    source: &dyn ContentSource,
    extractor: &dyn Extractor,
    narrowing: &Narrowing,
) -> Result<RunReport, RunError> {
    let run_start = Instant::now();

    tracing::info!(source = %source.describe(), "acquiring content");
    let html = source.acquire().await.map_err(RunError::at(Stage::Acquire))?;

    let content = narrowing.apply(&html).map_err(RunError::at(Stage::Narrow))?;
    tracing::info!(bytes = content.len(), "content ready");

    let system_prompt = prompt::system_prompt();
    tracing::debug!(prompt = %system_prompt, "system prompt");

    tracing::info!(provider = extractor.provider(), model = extractor.model(), "extracting prices");
    let extract_start = Instant::now();
    let completion = extractor
        .extract(&system_prompt, &content)
        .await
        .map_err(RunError::at(Stage::Extract))?;
    let elapsed = extract_start.elapsed();
    tracing::debug!(reply = %completion.text, "raw reply");

    let response = decode::decode(&completion.text)
        .map_err(|e| RunError::at(Stage::Decode)(ScrapeError::Decode(e)))?;
    tracing::info!(models = response.len(), "decoded reply");

    Ok(RunReport {
        response,
        usage: ExtractionUsage {
            prompt_tokens: completion.prompt_tokens,
            completion_tokens: completion.completion_tokens,
            elapsed,
        },
        total_elapsed: run_start.elapsed(),
        provider: extractor.provider().to_string(),
        model: extractor.model().to_string(),
        source: source.describe(),
    })
}
