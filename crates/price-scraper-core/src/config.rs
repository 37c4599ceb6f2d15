use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, ScrapeError};
use crate::provider::LlmProvider;

/// Optional settings file. Every key may be omitted; command-line flags win
/// over anything set here.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScraperConfig {
    pub provider: Option<LlmProvider>,
    pub model: Option<String>,
    /// CSS selector of the container to keep, e.g. "main".
    pub container: Option<String>,
    pub fallback_full_page: Option<bool>,
    pub max_retries: Option<u32>,
    pub timeout_secs: Option<u64>,
    pub render_timeout_secs: Option<u64>,
    pub chromium_path: Option<String>,
    pub gemini_base_url: Option<String>,
    pub claude_base_url: Option<String>,
    pub max_tokens: Option<u32>,
}

/// Parse settings from a TOML string.
pub fn parse_config(toml_str: &str) -> Result<ScraperConfig> {
    toml::from_str(toml_str).map_err(|e| ScrapeError::Config(format!("bad config file: {e}")))
}

pub fn load_config(path: &Path) -> Result<ScraperConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| ScrapeError::Io {
        path: path.display().to_string(),
        source: e,
    })?;
    parse_config(&content)
}

/// `<config dir>/price-scraper/config.toml`, if the platform has a config dir.
#[cfg(feature = "network")]
pub fn default_config_path() -> Option<std::path::PathBuf> {
    Some(dirs::config_dir()?.join("price-scraper").join("config.toml"))
}

/// Explicit path must exist; the default location is optional.
#[cfg(feature = "network")]
pub fn load_config_or_default(explicit: Option<&Path>) -> Result<ScraperConfig> {
    if let Some(path) = explicit {
        return load_config(path);
    }
    match default_config_path() {
        Some(path) if path.exists() => {
            tracing::debug!(path = %path.display(), "loading config");
            load_config(&path)
        }
        _ => Ok(ScraperConfig::default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_is_all_defaults() {
        assert_eq!(parse_config("").unwrap(), ScraperConfig::default());
    }

    #[test]
    fn parse_full_config() {
        let toml = r##"
provider = "claude"
model = "claude-3-5-sonnet-latest"
container = "#pricing"
fallback_full_page = true
max_retries = 3
timeout_secs = 60
render_timeout_secs = 20
chromium_path = "/usr/bin/chromium"
claude_base_url = "http://localhost:9000"
max_tokens = 2048
"##;
        let cfg = parse_config(toml).unwrap();
        assert_eq!(cfg.provider, Some(LlmProvider::Claude));
        assert_eq!(cfg.container.as_deref(), Some("#pricing"));
        assert_eq!(cfg.fallback_full_page, Some(true));
        assert_eq!(cfg.max_retries, Some(3));
        assert_eq!(cfg.max_tokens, Some(2048));
        assert!(cfg.gemini_base_url.is_none());
    }

    #[test]
    fn unknown_key_is_rejected() {
        let err = parse_config("provder = \"claude\"").unwrap_err();
        assert!(matches!(err, ScrapeError::Config(_)));
    }

    #[test]
    fn malformed_toml_is_config_error() {
        let err = parse_config("max_retries = [").unwrap_err();
        assert!(matches!(err, ScrapeError::Config(ref m) if m.starts_with("bad config file")));
    }

    #[test]
    fn unknown_provider_is_rejected() {
        assert!(parse_config("provider = \"openai\"").is_err());
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let err = load_config(Path::new("/definitely/not/here.toml")).unwrap_err();
        assert!(matches!(err, ScrapeError::Io { .. }));
    }
}
