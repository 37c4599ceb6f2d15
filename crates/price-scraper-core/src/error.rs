use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum ScrapeError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("fetching {url} failed{}: {message}", .status.map(|s| format!(" (HTTP {s})")).unwrap_or_default())]
    Network {
        url: String,
        status: Option<u16>,
        message: String,
    },

    #[error("element '{selector}' never became visible on {url} within {}s", .waited.as_secs())]
    RenderTimeout {
        url: String,
        selector: String,
        waited: Duration,
    },

    #[error("browser render failed: {0}")]
    Render(String),

    #[error("container '{selector}' not found in page")]
    ContainerNotFound { selector: String },

    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("LLM request failed{}: {message}", .status.map(|s| format!(" (HTTP {s})")).unwrap_or_default())]
    Transport { status: Option<u16>, message: String },

    #[error("{provider} returned no completion text")]
    EmptyResponse { provider: String },

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error("configuration error: {0}")]
    Config(String),
}

impl ScrapeError {
    /// Transport failures with no status, 429 or 5xx may succeed on another attempt.
    /// Any other status means the request itself was rejected.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport { status: None, .. } => true,
            Self::Transport { status: Some(code), .. } => *code == 429 || *code >= 500,
            _ => false,
        }
    }
}

/// The LLM reply could not be decoded. `raw` is the reply exactly as received.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("cannot decode LLM reply: {reason}")]
pub struct DecodeError {
    pub reason: DecodeReason,
    pub raw: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DecodeReason {
    /// Not JSON at all, or truncated.
    Syntax(String),
    /// Valid JSON in the wrong shape: missing field, wrong type.
    Shape(String),
    /// Well-shaped but a value is out of range.
    Invalid { path: String, problem: String },
}

impl std::fmt::Display for DecodeReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Syntax(msg) => write!(f, "malformed JSON: {msg}"),
            Self::Shape(msg) => write!(f, "schema mismatch: {msg}"),
            Self::Invalid { path, problem } => write!(f, "invalid value at {path}: {problem}"),
        }
    }
}

pub type Result<T> = std::result::Result<T, ScrapeError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn transport(status: Option<u16>) -> ScrapeError {
        ScrapeError::Transport {
            status,
            message: String::new(),
        }
    }

    #[test]
    fn only_transient_transport_failures_are_retryable() {
        assert!(transport(None).is_retryable());
        assert!(transport(Some(429)).is_retryable());
        assert!(transport(Some(500)).is_retryable());
        assert!(transport(Some(503)).is_retryable());

        for code in [400, 404, 413, 422] {
            assert!(!transport(Some(code)).is_retryable(), "HTTP {code}");
        }
        assert!(!ScrapeError::Auth("bad key".into()).is_retryable());
        assert!(!ScrapeError::EmptyResponse { provider: "x".into() }.is_retryable());
    }
}
