//! Coin-market rate provider.
//!
//! The value page is derivable from the symbol directly, so no locator
//! cache is involved: one fetch of a multi-currency payload, then a keyed
//! extraction of the price in the requested currency.

use async_trait::async_trait;
use lazy_static::lazy_static;
use log::debug;
use regex::Regex;
use rust_decimal::Decimal;
use std::sync::Arc;

use crate::errors::Result;
use crate::extract;
use crate::http::{PageFetcher, ACCEPT_JSON};
use crate::numfmt::LocaleNumberFormat;
use crate::providers::provider_settings::ProviderSettings;
use crate::providers::rate_provider::{ProviderId, RateProvider};

/// Currencies the source can convert into. Fixed upstream set.
const SUPPORTED_CURRENCIES: [&str; 32] = [
    "AUD", "BRL", "CAD", "CHF", "CLP", "CNY", "CZK", "DKK", "EUR", "GBP", "HKD", "HUF", "IDR",
    "ILS", "INR", "JPY", "KRW", "MXN", "MYR", "NOK", "NZD", "PHP", "PKR", "PLN", "RUB", "SEK",
    "SGD", "THB", "TRY", "TWD", "ZAR", "USD",
];

lazy_static! {
    // Payload embeds one price per currency, e.g. "price_eur": "11,230.7300".
    static ref PRICE_BY_CURRENCY: Regex =
        Regex::new(r#"(?i)"price_([a-z]+)"\s*:\s*"([0-9.,]+)""#).unwrap();
}

pub struct CoinMarketProvider {
    fetcher: Arc<dyn PageFetcher>,
    base_url: String,
    // The source always renders numbers in the root format.
    format: LocaleNumberFormat,
}

impl CoinMarketProvider {
    pub fn new(fetcher: Arc<dyn PageFetcher>, settings: &ProviderSettings) -> Self {
        CoinMarketProvider {
            fetcher,
            base_url: settings.coin_market_url.clone(),
            format: LocaleNumberFormat::for_tag("en-US"),
        }
    }

    fn query_url(&self, symbol: &str, currency: &str) -> String {
        format!(
            "{}{}/?convert={}",
            self.base_url,
            symbol,
            currency.to_uppercase()
        )
    }
}

#[async_trait]
impl RateProvider for CoinMarketProvider {
    fn provider_id(&self) -> ProviderId {
        ProviderId::CoinMarket
    }

    fn is_currency_supported(&self, currency: &str) -> bool {
        SUPPORTED_CURRENCIES
            .iter()
            .any(|supported| supported.eq_ignore_ascii_case(currency))
    }

    async fn current_rate(&self, symbol: &str, currency: &str) -> Result<Decimal> {
        let url = self.query_url(symbol, currency);
        debug!("Fetching coin market rate from '{}'", url);
        let payload = self.fetcher.fetch(&url, ACCEPT_JSON).await?;
        let amount = extract::keyed_capture(&PRICE_BY_CURRENCY, &payload, currency, "Amount")?;
        self.format.parse(&amount)
    }
}
