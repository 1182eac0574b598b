pub mod errors;
pub mod extract;
pub mod http;
pub mod numfmt;
pub mod providers;
pub mod rates;

#[cfg(test)]
pub(crate) mod test_support;

pub use errors::{RateError, Result};
pub use providers::{
    CoinMarketProvider, ProviderId, ProviderSettings, RateProvider, StockExchangeProvider,
};
pub use rates::{rate_stream, RateService, RateSource, DEFAULT_LOCALE};
