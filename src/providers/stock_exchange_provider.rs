//! Stock exchange rate provider.
//!
//! Two-step lookup: the instrument's page URL is discovered through the
//! locator cache, then the page is fetched and the price extracted via
//! ordered fallback patterns (markup differs across asset types). A failed
//! fetch of a cached URL invalidates the entry and re-resolves exactly
//! once; a second consecutive failure propagates.

use async_trait::async_trait;
use lazy_static::lazy_static;
use log::warn;
use regex::Regex;
use rust_decimal::Decimal;
use std::sync::Arc;

use crate::errors::Result;
use crate::extract;
use crate::http::{PageFetcher, ACCEPT_HTML};
use crate::numfmt::LocaleNumberFormat;
use crate::providers::locator_cache::LocatorCache;
use crate::providers::provider_settings::ProviderSettings;
use crate::providers::rate_provider::{ProviderId, RateProvider};

const SUPPORTED_CURRENCY: &str = "EUR";

lazy_static! {
    // Direct price, explicit conversion line, alternative markup - in that order.
    static ref PRICE_PATTERNS: Vec<Regex> = vec![
        Regex::new(r#"<span class="price">([0-9,.]+) EUR</span>"#).unwrap(),
        Regex::new(r"Umrechnung:</a>\s*([0-9,.]+) EUR").unwrap(),
        Regex::new(r#"<span data-push[^>]*>([0-9,.]+)</span>\s*<span[^>]+>EUR</span>"#).unwrap(),
    ];
}

pub struct StockExchangeProvider {
    fetcher: Arc<dyn PageFetcher>,
    locator_cache: LocatorCache,
    // Prices on the source are rendered in the German format.
    format: LocaleNumberFormat,
}

impl StockExchangeProvider {
    pub fn new(fetcher: Arc<dyn PageFetcher>, settings: &ProviderSettings) -> Self {
        let locator_cache = LocatorCache::new(
            fetcher.clone(),
            settings.stock_exchange_search_url.clone(),
        );
        StockExchangeProvider {
            fetcher,
            locator_cache,
            format: LocaleNumberFormat::for_tag("de-DE"),
        }
    }

    /// Resolve the instrument page and fetch it, self-healing a stale
    /// locator with a single re-resolution.
    async fn fetch_asset_page(&self, symbol: &str) -> Result<String> {
        let url = self.locator_cache.resolve(symbol).await?;
        match self.fetcher.fetch(&url, ACCEPT_HTML).await {
            Ok(page) => Ok(page),
            Err(e) => {
                warn!(
                    "Fetching '{}' for '{}' failed ({}), re-resolving once",
                    url, symbol, e
                );
                self.locator_cache.invalidate(symbol);
                let url = self.locator_cache.resolve(symbol).await?;
                match self.fetcher.fetch(&url, ACCEPT_HTML).await {
                    Ok(page) => Ok(page),
                    Err(e) => {
                        self.locator_cache.invalidate(symbol);
                        Err(e)
                    }
                }
            }
        }
    }
}

#[async_trait]
impl RateProvider for StockExchangeProvider {
    fn provider_id(&self) -> ProviderId {
        ProviderId::StockExchange
    }

    fn is_currency_supported(&self, currency: &str) -> bool {
        SUPPORTED_CURRENCY.eq_ignore_ascii_case(currency)
    }

    async fn current_rate(&self, symbol: &str, _currency: &str) -> Result<Decimal> {
        let page = self.fetch_asset_page(symbol).await?;
        let amount = extract::first_capture(&PRICE_PATTERNS, &page, "Amount")?;
        self.format.parse(&amount)
    }
}
