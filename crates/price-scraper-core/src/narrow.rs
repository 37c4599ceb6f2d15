//! Content narrowing: cut a page down to one container before prompting.

use scraper::{Html, Selector};

use crate::error::{Result, ScrapeError};

pub const DEFAULT_CONTAINER: &str = "main";

/// What to do when the container is missing from the page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum NarrowPolicy {
    /// Missing container aborts the run.
    #[default]
    Strict,
    /// Missing container sends the whole page instead.
    FallbackToFullPage,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Narrowing {
    /// `None` disables narrowing.
    pub selector: Option<String>,
    pub policy: NarrowPolicy,
}

impl Default for Narrowing {
    fn default() -> Self {
        Self {
            selector: Some(DEFAULT_CONTAINER.to_string()),
            policy: NarrowPolicy::Strict,
        }
    }
}

impl Narrowing {
    pub fn disabled() -> Self {
        Self {
            selector: None,
            policy: NarrowPolicy::Strict,
        }
    }

    pub fn apply(&self, html: &str) -> Result<String> {
        match &self.selector {
            Some(sel) => apply_narrowing(html, sel, self.policy),
            None => Ok(html.to_string()),
        }
    }
}

/// Inner HTML of the first element matching `selector`.
pub fn narrow(html: &str, selector: &str) -> Result<String> {
    let sel = Selector::parse(selector)
        .map_err(|e| ScrapeError::Config(format!("bad container selector '{selector}': {e:?}")))?;
    let document = Html::parse_document(html);
    document
        .select(&sel)
        .next()
        .map(|el| el.inner_html())
        .ok_or_else(|| ScrapeError::ContainerNotFound {
            selector: selector.to_string(),
        })
}

pub fn apply_narrowing(html: &str, selector: &str, policy: NarrowPolicy) -> Result<String> {
    match narrow(html, selector) {
        Ok(inner) => {
            tracing::debug!(selector, from = html.len(), to = inner.len(), "narrowed content");
            Ok(inner)
        }
        Err(ScrapeError::ContainerNotFound { .. }) if policy == NarrowPolicy::FallbackToFullPage => {
            tracing::warn!(selector, "container not found, sending the full page");
            Ok(html.to_string())
        }
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<html><head><title>Pricing</title></head>
<body><nav>menu</nav><main><h1>Prices</h1><table><tr><td>m1</td><td>$1.50</td></tr></table></main>
<footer>legal</footer></body></html>"#;

    #[test]
    fn narrow_returns_inner_html_of_main() {
        let inner = narrow(PAGE, "main").unwrap();
        assert!(inner.starts_with("<h1>Prices</h1>"));
        assert!(inner.contains("$1.50"));
        assert!(!inner.contains("menu"));
        assert!(!inner.contains("legal"));
        assert!(!inner.contains("<main>"));
    }

    #[test]
    fn first_match_wins() {
        let html = "<div class=p>one</div><div class=p>two</div>";
        assert_eq!(narrow(html, "div.p").unwrap(), "one");
    }

    #[test]
    fn missing_container_is_an_error_when_strict() {
        let err = apply_narrowing("<p>hi</p>", "main", NarrowPolicy::Strict).unwrap_err();
        assert!(matches!(err, ScrapeError::ContainerNotFound { ref selector } if selector == "main"));
    }

    #[test]
    fn missing_container_falls_back_when_allowed() {
        let out = apply_narrowing("<p>hi</p>", "main", NarrowPolicy::FallbackToFullPage).unwrap();
        assert_eq!(out, "<p>hi</p>");
    }

    #[test]
    fn bad_selector_is_config_error_even_with_fallback() {
        let err = apply_narrowing(PAGE, "main[", NarrowPolicy::FallbackToFullPage).unwrap_err();
        assert!(matches!(err, ScrapeError::Config(_)));
    }

    #[test]
    fn disabled_narrowing_passes_through() {
        assert_eq!(Narrowing::disabled().apply(PAGE).unwrap(), PAGE);
    }
}
