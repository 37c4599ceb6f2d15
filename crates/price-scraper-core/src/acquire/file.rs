use std::path::PathBuf;

use async_trait::async_trait;

use super::ContentSource;
use crate::error::{Result, ScrapeError};

/// A page saved to disk.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl ContentSource for FileSource {
    async fn acquire(&self) -> Result<String> {
        let bytes = tokio::fs::read(&self.path).await.map_err(|e| ScrapeError::Io {
            path: self.path.display().to_string(),
            source: e,
        })?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    fn describe(&self) -> String {
        format!("file {}", self.path.display())
    }
}
