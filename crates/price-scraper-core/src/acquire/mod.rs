//! Content sources: where the page HTML comes from.
//!
//! A run is parameterised by one [`ContentSource`]; the variants are
//! interchangeable and chosen from a [`SourceSpec`].

pub mod file;
pub mod http;
#[cfg(feature = "render")]
pub mod render;

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::Result;
#[cfg(not(feature = "render"))]
use crate::error::ScrapeError;

pub use file::FileSource;
pub use http::HttpSource;
#[cfg(feature = "render")]
pub use render::RenderedSource;

pub const DEFAULT_RENDER_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Something that can produce raw page content.
#[async_trait]
pub trait ContentSource: Send + Sync {
    async fn acquire(&self) -> Result<String>;
    /// Human-readable origin, used in logs and the report.
    fn describe(&self) -> String;
}

/// Configuration-level choice of content source.
#[derive(Debug, Clone, PartialEq)]
pub enum SourceSpec {
    File(PathBuf),
    Http {
        url: String,
    },
    Rendered {
        url: String,
        /// CSS selector that must become visible before the page is captured.
        wait_for: String,
        timeout: Duration,
        chromium_path: Option<PathBuf>,
    },
}

/// Build the source described by `spec`. `fetch_timeout` bounds plain HTTP fetches.
pub fn build_source(spec: SourceSpec, fetch_timeout: Duration) -> Result<Box<dyn ContentSource>> {
    match spec {
        SourceSpec::File(path) => Ok(Box::new(FileSource::new(path))),
        SourceSpec::Http { url } => Ok(Box::new(HttpSource::new(url, fetch_timeout))),
        #[cfg(feature = "render")]
        SourceSpec::Rendered {
            url,
            wait_for,
            timeout,
            chromium_path,
        } => Ok(Box::new(
            RenderedSource::new(url, wait_for)
                .with_timeout(timeout)
                .with_chromium_path(chromium_path),
        )),
        #[cfg(not(feature = "render"))]
        SourceSpec::Rendered { .. } => Err(ScrapeError::Config(
            "rendered sources need the `render` feature".into(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_file_and_http_sources() {
        let f = build_source(SourceSpec::File("data/claude.html".into()), DEFAULT_FETCH_TIMEOUT)
            .unwrap();
        assert_eq!(f.describe(), "file data/claude.html");

        let h = build_source(
            SourceSpec::Http {
                url: "https://example.com/pricing".into(),
            },
            DEFAULT_FETCH_TIMEOUT,
        )
        .unwrap();
        assert_eq!(h.describe(), "GET https://example.com/pricing");
    }
}
