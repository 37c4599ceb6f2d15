use serde::{Deserialize, Serialize};

/// Cost of one million tokens in a given currency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPrice {
    pub cost_per_million: f64,
    pub currency: String,
}

impl TokenPrice {
    pub fn new(cost_per_million: f64, currency: impl Into<String>) -> Self {
        Self {
            cost_per_million,
            currency: currency.into(),
        }
    }
}

impl std::fmt::Display for TokenPrice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.cost_per_million, self.currency)
    }
}

/// Input and output pricing for a single model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelPrice {
    pub model_name: String,
    pub input_token_price: TokenPrice,
    pub output_token_price: TokenPrice,
}

/// Everything the LLM extracted from one page, in extraction order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceScraperResponse {
    pub model_prices: Vec<ModelPrice>,
}

impl PriceScraperResponse {
    pub fn is_empty(&self) -> bool {
        self.model_prices.is_empty()
    }

    pub fn len(&self) -> usize {
        self.model_prices.len()
    }

    /// Model names that appear more than once, in first-seen order.
    pub fn duplicate_names(&self) -> Vec<&str> {
        let mut seen = std::collections::HashSet::new();
        let mut dupes = Vec::new();
        for mp in &self.model_prices {
            if !seen.insert(mp.model_name.as_str()) && !dupes.contains(&mp.model_name.as_str()) {
                dupes.push(mp.model_name.as_str());
            }
        }
        dupes
    }

    pub fn cheapest_output(&self) -> Option<&ModelPrice> {
        self.model_prices.iter().min_by(|a, b| {
            a.output_token_price
                .cost_per_million
                .partial_cmp(&b.output_token_price.cost_per_million)
                .unwrap_or(std::cmp::Ordering::Equal)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(name: &str, input: f64, output: f64) -> ModelPrice {
        ModelPrice {
            model_name: name.to_string(),
            input_token_price: TokenPrice::new(input, "USD"),
            output_token_price: TokenPrice::new(output, "USD"),
        }
    }

    #[test]
    fn serializes_with_camel_case_names() {
        let resp = PriceScraperResponse {
            model_prices: vec![entry("m1", 1.5, 3.0)],
        };
        let json = serde_json::to_string(&resp).unwrap();
        assert_eq!(
            json,
            r#"{"modelPrices":[{"modelName":"m1","inputTokenPrice":{"costPerMillion":1.5,"currency":"USD"},"outputTokenPrice":{"costPerMillion":3.0,"currency":"USD"}}]}"#
        );
    }

    #[test]
    fn duplicate_names_reported_once() {
        let resp = PriceScraperResponse {
            model_prices: vec![
                entry("a", 1.0, 2.0),
                entry("b", 1.0, 2.0),
                entry("a", 3.0, 4.0),
                entry("a", 5.0, 6.0),
            ],
        };
        assert_eq!(resp.duplicate_names(), vec!["a"]);
    }

    #[test]
    fn cheapest_output_picks_lowest() {
        let resp = PriceScraperResponse {
            model_prices: vec![entry("big", 15.0, 75.0), entry("small", 0.25, 1.25)],
        };
        assert_eq!(resp.cheapest_output().unwrap().model_name, "small");
        assert!(PriceScraperResponse::default().cheapest_output().is_none());
    }
}
