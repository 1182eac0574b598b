use serde::{Deserialize, Serialize};

/// Endpoint and tuning settings for the rate providers and the service.
///
/// Constructed per service instance; there is no process-global
/// configuration state.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderSettings {
    /// Base URL the coin-market query URL is built from; the symbol and a
    /// `convert` parameter are appended.
    pub coin_market_url: String,
    /// Search endpoint of the stock exchange source; the symbol is appended.
    pub stock_exchange_search_url: String,
    /// End-to-end deadline for one rate resolution.
    pub request_timeout_secs: u64,
    /// Poll interval of the rate stream.
    pub poll_interval_secs: u64,
    /// Minimum fraction digits in formatted rates.
    pub fraction_digits: u32,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        ProviderSettings {
            coin_market_url: "https://api.coinmarketcap.com/v1/ticker/".to_string(),
            stock_exchange_search_url: "https://www.onvista.de/api/header/search?q=".to_string(),
            request_timeout_secs: 30,
            poll_interval_secs: 10,
            fraction_digits: 4,
        }
    }
}
