//! Rate resolution orchestration.
//!
//! Validates currency support, collapses concurrent identical requests
//! into one provider call and memoizes the formatted outcome per
//! (provider, symbol, currency, locale).

use dashmap::DashMap;
use futures::future::{BoxFuture, FutureExt, Shared};
use futures::stream::Stream;
use log::error;
use std::sync::Arc;
use std::time::Duration;

use crate::errors::{RateError, Result};
use crate::http::{HttpFetcher, PageFetcher};
use crate::numfmt::LocaleNumberFormat;
use crate::providers::{
    CoinMarketProvider, ProviderId, ProviderSettings, RateProvider, StockExchangeProvider,
};
use crate::rates::rate_stream::{rate_stream, RateSource};

/// Locale tag applied by boundary layers when a request carries none.
pub const DEFAULT_LOCALE: &str = "en-US";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct RateKey {
    provider_id: ProviderId,
    symbol: String,
    // Uppercased so currency codes share an entry regardless of case.
    currency: String,
    locale: String,
}

/// Handle every caller for a key awaits. The underlying work runs in a
/// spawned task, so it is not tied to any one caller's lifetime.
type SharedResolution = Shared<BoxFuture<'static, Result<String>>>;

/// Resolves and formats current rates.
///
/// Outcomes - failures included - are memoized indefinitely: there is no
/// TTL and no invalidation at this layer. That mirrors the observed
/// behavior of the system this replaces; staleness correction exists only
/// inside the stock exchange provider's locator cache. Create a fresh
/// instance to start with an empty table.
pub struct RateService {
    coin_market: Arc<dyn RateProvider>,
    stock_exchange: Arc<dyn RateProvider>,
    memo: DashMap<RateKey, SharedResolution>,
    timeout: Duration,
    poll_interval: Duration,
    fraction_digits: u32,
}

impl RateService {
    pub fn new(settings: ProviderSettings) -> Self {
        let fetcher: Arc<dyn PageFetcher> = Arc::new(HttpFetcher::new());
        let coin_market = Arc::new(CoinMarketProvider::new(fetcher.clone(), &settings));
        let stock_exchange = Arc::new(StockExchangeProvider::new(fetcher, &settings));
        Self::with_providers(coin_market, stock_exchange, &settings)
    }

    /// Build a service around externally constructed providers. Used by
    /// tests to substitute scripted providers.
    pub fn with_providers(
        coin_market: Arc<dyn RateProvider>,
        stock_exchange: Arc<dyn RateProvider>,
        settings: &ProviderSettings,
    ) -> Self {
        RateService {
            coin_market,
            stock_exchange,
            memo: DashMap::new(),
            timeout: Duration::from_secs(settings.request_timeout_secs),
            // tokio's interval panics on a zero period; a zero setting is
            // floored at one second.
            poll_interval: Duration::from_secs(settings.poll_interval_secs.max(1)),
            fraction_digits: settings.fraction_digits,
        }
    }

    /// Change-only stream of rates for one key, polled at the configured
    /// interval. See [`rate_stream`].
    pub fn stream_rate(
        self: &Arc<Self>,
        provider_id: ProviderId,
        symbol: impl Into<String>,
        currency: impl Into<String>,
        locale: impl Into<String>,
    ) -> impl Stream<Item = Result<String>> {
        let source: Arc<dyn RateSource> = self.clone();
        rate_stream(
            source,
            provider_id,
            symbol,
            currency,
            locale,
            self.poll_interval,
        )
    }

    fn provider(&self, provider_id: ProviderId) -> &Arc<dyn RateProvider> {
        match provider_id {
            ProviderId::CoinMarket => &self.coin_market,
            ProviderId::StockExchange => &self.stock_exchange,
        }
    }

    /// Resolve the current rate of `symbol` in `currency` and format it for
    /// `locale`.
    ///
    /// An unsupported currency fails with `RateError::Validation` before
    /// any network access. All concurrent and later callers with the same
    /// key observe the outcome of a single underlying resolution. The
    /// resolution runs in its own task, so dropping or aborting a caller
    /// (a stream subscriber going away, say) leaves it running for the
    /// others.
    pub async fn current_rate(
        &self,
        provider_id: ProviderId,
        symbol: &str,
        currency: &str,
        locale: &str,
    ) -> Result<String> {
        let provider = self.provider(provider_id).clone();
        if !provider.is_currency_supported(currency) {
            return Err(RateError::Validation(format!(
                "Currency code '{}' is not supported",
                currency
            )));
        }

        let currency = currency.to_uppercase();
        let key = RateKey {
            provider_id,
            symbol: symbol.to_string(),
            currency: currency.clone(),
            locale: locale.to_string(),
        };
        // The entry lock makes the spawn exclusive per key.
        let resolution = self
            .memo
            .entry(key)
            .or_insert_with(|| {
                self.spawn_resolution(
                    provider,
                    provider_id,
                    symbol.to_string(),
                    currency,
                    locale.to_string(),
                )
            })
            .clone();
        resolution.await
    }

    fn spawn_resolution(
        &self,
        provider: Arc<dyn RateProvider>,
        provider_id: ProviderId,
        symbol: String,
        currency: String,
        locale: String,
    ) -> SharedResolution {
        let timeout = self.timeout;
        let fraction_digits = self.fraction_digits;
        let task = tokio::spawn(async move {
            let result =
                resolve_and_format(provider, &symbol, &currency, &locale, timeout, fraction_digits)
                    .await;
            if let Err(e) = &result {
                error!(
                    "Error fetching '{}' ('{}') from '{}': {}",
                    symbol, currency, provider_id, e
                );
            }
            result
        });
        async move {
            match task.await {
                Ok(outcome) => outcome,
                // Only a panic in the resolution task or a runtime
                // shutdown lands here.
                Err(e) => Err(RateError::Internal(format!(
                    "Rate resolution task failed: {}",
                    e
                ))),
            }
        }
        .boxed()
        .shared()
    }
}

async fn resolve_and_format(
    provider: Arc<dyn RateProvider>,
    symbol: &str,
    currency: &str,
    locale: &str,
    timeout: Duration,
    fraction_digits: u32,
) -> Result<String> {
    let rate = tokio::time::timeout(timeout, provider.current_rate(symbol, currency))
        .await
        .map_err(|_| RateError::Timeout {
            seconds: timeout.as_secs(),
        })??;

    let format = LocaleNumberFormat::for_tag(locale).with_min_fraction_digits(fraction_digits);
    Ok(format.format(&rate))
}
