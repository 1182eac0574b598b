pub(crate) mod coin_market_provider;
pub(crate) mod locator_cache;
pub(crate) mod provider_settings;
pub(crate) mod rate_provider;
pub(crate) mod stock_exchange_provider;

// Re-export the public interface
pub use coin_market_provider::CoinMarketProvider;
pub use locator_cache::LocatorCache;
pub use provider_settings::ProviderSettings;
pub use rate_provider::{ProviderId, RateProvider};
pub use stock_exchange_provider::StockExchangeProvider;
