pub mod config;
pub mod decode;
pub mod error;
pub mod narrow;
pub mod pricing;
pub mod prompt;
pub mod provider;
pub mod usage;

#[cfg(feature = "network")]
pub mod acquire;
#[cfg(feature = "network")]
pub mod client;
#[cfg(feature = "network")]
pub mod pipeline;

pub use decode::decode;
pub use error::{DecodeError, DecodeReason, ScrapeError};
pub use pricing::{ModelPrice, PriceScraperResponse, TokenPrice};
pub use provider::LlmProvider;
pub use usage::ExtractionUsage;
