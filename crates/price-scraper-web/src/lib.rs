use serde::Serialize;
use wasm_bindgen::prelude::*;

use price_scraper_core::narrow::{self, NarrowPolicy};
use price_scraper_core::{decode, prompt, LlmProvider, PriceScraperResponse};

// ---------------------------------------------------------------------------
// Prompt
// ---------------------------------------------------------------------------

/// The system prompt sent with every extraction request.
#[wasm_bindgen]
pub fn system_prompt() -> String {
    prompt::system_prompt()
}

/// Compose a prompt from a custom instruction and an exemplar response object.
/// Returns null if the exemplar does not have the response shape.
#[wasm_bindgen]
pub fn compose_prompt(instruction: &str, example: JsValue) -> Option<String> {
    let example: PriceScraperResponse = serde_wasm_bindgen::from_value(example).ok()?;
    Some(prompt::compose(instruction, &example))
}

// ---------------------------------------------------------------------------
// Decode
// ---------------------------------------------------------------------------

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DecodeOutcome {
    ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    response: Option<PriceScraperResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    raw: Option<String>,
    duplicates: Vec<String>,
}

/// Decode raw LLM reply text.
/// Returns `{ok: true, response, duplicates}` or `{ok: false, error, raw}`.
#[wasm_bindgen]
pub fn decode_reply(raw: &str) -> JsValue {
    let outcome = match decode::decode(raw) {
        Ok(resp) => DecodeOutcome {
            ok: true,
            duplicates: resp.duplicate_names().into_iter().map(String::from).collect(),
            response: Some(resp),
            error: None,
            raw: None,
        },
        Err(e) => DecodeOutcome {
            ok: false,
            response: None,
            error: Some(e.to_string()),
            raw: Some(e.raw),
            duplicates: Vec::new(),
        },
    };
    serde_wasm_bindgen::to_value(&outcome).unwrap_or(JsValue::NULL)
}

// ---------------------------------------------------------------------------
// Narrowing
// ---------------------------------------------------------------------------

/// Inner HTML of the first element matching `selector`, or null if there is none.
/// With `fallback` set, a missing container yields the whole page.
#[wasm_bindgen]
pub fn narrow_html(html: &str, selector: &str, fallback: bool) -> Option<String> {
    let policy = if fallback {
        NarrowPolicy::FallbackToFullPage
    } else {
        NarrowPolicy::Strict
    };
    narrow::apply_narrowing(html, selector, policy).ok()
}

// ---------------------------------------------------------------------------
// Providers
// ---------------------------------------------------------------------------

/// Default scraper model for a provider id ("gemini" or "claude"), or null.
#[wasm_bindgen]
pub fn default_model(provider: &str) -> Option<String> {
    let p: LlmProvider = provider.parse().ok()?;
    Some(p.default_model().to_string())
}

/// Environment variable that holds the API key for a provider id, or null.
#[wasm_bindgen]
pub fn key_env(provider: &str) -> Option<String> {
    let p: LlmProvider = provider.parse().ok()?;
    Some(p.key_env().to_string())
}
