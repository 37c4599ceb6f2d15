//! Strict decoding of the LLM reply.
//!
//! Two passes: a structural parse with serde, then range checks serde cannot
//! express. Either the whole reply decodes or nothing does.

use serde_json::error::Category;

use crate::error::{DecodeError, DecodeReason};
use crate::pricing::{PriceScraperResponse, TokenPrice};

pub fn decode(raw: &str) -> std::result::Result<PriceScraperResponse, DecodeError> {
    let parsed: PriceScraperResponse = serde_json::from_str(raw).map_err(|e| {
        let msg = e.to_string();
        let reason = match e.classify() {
            Category::Data => DecodeReason::Shape(msg),
            Category::Syntax | Category::Eof | Category::Io => DecodeReason::Syntax(msg),
        };
        DecodeError {
            reason,
            raw: raw.to_string(),
        }
    })?;

    if let Err((path, problem)) = validate(&parsed) {
        return Err(DecodeError {
            reason: DecodeReason::Invalid { path, problem },
            raw: raw.to_string(),
        });
    }

    let dupes = parsed.duplicate_names();
    if !dupes.is_empty() {
        tracing::warn!(?dupes, "reply lists the same model more than once");
    }

    Ok(parsed)
}

/// Compact JSON, the same shape [`decode`] reads.
pub fn encode(response: &PriceScraperResponse) -> String {
    serde_json::to_string(response).unwrap_or_default()
}

fn validate(resp: &PriceScraperResponse) -> std::result::Result<(), (String, String)> {
    for (i, mp) in resp.model_prices.iter().enumerate() {
        if mp.model_name.trim().is_empty() {
            return Err((format!("modelPrices[{i}].modelName"), "must not be empty".into()));
        }
        check_price(&mp.input_token_price, &format!("modelPrices[{i}].inputTokenPrice"))?;
        check_price(&mp.output_token_price, &format!("modelPrices[{i}].outputTokenPrice"))?;
    }
    Ok(())
}

fn check_price(price: &TokenPrice, at: &str) -> std::result::Result<(), (String, String)> {
    let cost = price.cost_per_million;
    if !cost.is_finite() || cost < 0.0 {
        return Err((
            format!("{at}.costPerMillion"),
            format!("must be a non-negative number, got {cost}"),
        ));
    }
    if price.currency.trim().is_empty() {
        return Err((format!("{at}.currency"), "must not be empty".into()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eof_is_syntax() {
        let err = decode(r#"{"modelPrices":["#).unwrap_err();
        assert!(matches!(err.reason, DecodeReason::Syntax(_)));
    }

    #[test]
    fn wrong_type_is_shape() {
        let err = decode(r#"{"modelPrices":{}}"#).unwrap_err();
        assert!(matches!(err.reason, DecodeReason::Shape(_)));
    }

    #[test]
    fn whitespace_around_payload_is_accepted() {
        let resp = decode("\n  {\"modelPrices\": []}\n").unwrap();
        assert!(resp.is_empty());
    }

    #[test]
    fn unknown_fields_are_ignored() {
        let resp = decode(r#"{"modelPrices":[],"notes":"none"}"#).unwrap();
        assert!(resp.is_empty());
    }

    #[test]
    fn encode_matches_decode_shape() {
        let resp = crate::prompt::example_response();
        assert_eq!(decode(&encode(&resp)).unwrap(), resp);
    }
}
