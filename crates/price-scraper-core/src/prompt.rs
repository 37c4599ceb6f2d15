//! Exemplar-driven system prompt.
//!
//! The LLM is shown a fully populated [`PriceScraperResponse`] serialized
//! exactly the way [`crate::decode::decode`] expects to read it back.

use crate::pricing::{ModelPrice, PriceScraperResponse, TokenPrice};

pub const INSTRUCTION: &str = "You are a price extraction API that takes public data from HTML \
and extracts per-model token prices. Return the data EXACTLY in the PriceScraperResponse \
JSON schema shown below so it can be read directly by a JSON parser. Reproduce every field \
name verbatim, keep the same nesting, and give costs as plain numbers per one million tokens. \
Do not add prose, markdown code fences, delimiters, or escape quotes before or after the JSON. \
If the page lists no prices, return an empty modelPrices array. Example:";

/// Two entries so the model sees that `modelPrices` is an array.
pub fn example_response() -> PriceScraperResponse {
    PriceScraperResponse {
        model_prices: vec![
            ModelPrice {
                model_name: "gpt-3.5-turbo".to_string(),
                input_token_price: TokenPrice::new(0.01, "USD"),
                output_token_price: TokenPrice::new(0.02, "USD"),
            },
            ModelPrice {
                model_name: "gpt-4-32k".to_string(),
                input_token_price: TokenPrice::new(0.03, "USD"),
                output_token_price: TokenPrice::new(0.04, "USD"),
            },
        ],
    }
}

/// Every key the decoder requires, listed in the prompt independently of the
/// exemplar so an empty exemplar still names them.
pub const FIELD_NAMES: &[&str] = &[
    "modelPrices",
    "modelName",
    "inputTokenPrice",
    "outputTokenPrice",
    "costPerMillion",
    "currency",
];

/// Instruction, the required field names, then the exemplar as indented JSON.
pub fn compose(instruction: &str, example: &PriceScraperResponse) -> String {
    // Plain data with string keys; serialization cannot fail.
    let json = serde_json::to_string_pretty(example).unwrap_or_default();
    format!(
        "{instruction}\nRequired field names: {}.\n{json}",
        FIELD_NAMES.join(", ")
    )
}

pub fn system_prompt() -> String {
    compose(INSTRUCTION, &example_response())
}
