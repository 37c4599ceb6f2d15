use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// LLM vendor that performs the extraction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    #[default]
    Gemini,
    Claude,
}

/// Static registry entry.
#[derive(Debug, Clone)]
pub struct ProviderSpec {
    pub provider: LlmProvider,
    pub id: &'static str,
    pub display_name: &'static str,
    /// Environment variable the CLI reads the API key from.
    pub key_env: &'static str,
    pub default_model: &'static str,
    pub default_base_url: &'static str,
}

pub const PROVIDERS: &[ProviderSpec] = &[
    ProviderSpec {
        provider: LlmProvider::Gemini,
        id: "gemini",
        display_name: "Gemini",
        key_env: "GEMINI_API_KEY",
        default_model: "gemini-1.5-flash-latest",
        default_base_url: "https://generativelanguage.googleapis.com",
    },
    ProviderSpec {
        provider: LlmProvider::Claude,
        id: "claude",
        display_name: "Claude",
        key_env: "ANTHROPIC_API_KEY",
        default_model: "claude-3-5-haiku-latest",
        default_base_url: "https://api.anthropic.com",
    },
];

impl LlmProvider {
    pub fn spec(self) -> &'static ProviderSpec {
        // PROVIDERS has one entry per variant.
        PROVIDERS
            .iter()
            .find(|p| p.provider == self)
            .unwrap_or(&PROVIDERS[0])
    }

    pub fn display_name(self) -> &'static str {
        self.spec().display_name
    }

    pub fn key_env(self) -> &'static str {
        self.spec().key_env
    }

    pub fn default_model(self) -> &'static str {
        self.spec().default_model
    }
}

impl FromStr for LlmProvider {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "google" => Ok(Self::Gemini),
            "anthropic" => Ok(Self::Claude),
            id => PROVIDERS
                .iter()
                .find(|p| p.id == id)
                .map(|p| p.provider)
                .ok_or_else(|| format!("unknown provider: {id}")),
        }
    }
}

impl std::fmt::Display for LlmProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_variant_has_a_registry_entry() {
        for p in [LlmProvider::Gemini, LlmProvider::Claude] {
            assert_eq!(p.spec().provider, p);
            assert!(!p.default_model().is_empty());
            assert!(p.key_env().ends_with("_API_KEY"));
            assert_eq!(p.spec().id.parse::<LlmProvider>(), Ok(p));
        }
    }

    #[test]
    fn parses_aliases() {
        assert_eq!("Anthropic".parse::<LlmProvider>(), Ok(LlmProvider::Claude));
        assert_eq!("gemini".parse::<LlmProvider>(), Ok(LlmProvider::Gemini));
        assert!("openai".parse::<LlmProvider>().is_err());
    }
}
