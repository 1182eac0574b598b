use async_trait::async_trait;
use rust_decimal::Decimal;
use std::fmt;
use std::str::FromStr;

use crate::errors::{RateError, Result};

/// The two rate sources the system knows about. Selection is static; there
/// is deliberately no open-ended provider discovery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderId {
    CoinMarket,
    StockExchange,
}

impl ProviderId {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderId::CoinMarket => "coinmarket",
            ProviderId::StockExchange => "stockexchange",
        }
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderId {
    type Err = RateError;

    fn from_str(s: &str) -> Result<Self> {
        if s.eq_ignore_ascii_case("coinmarket") {
            Ok(ProviderId::CoinMarket)
        } else if s.eq_ignore_ascii_case("stockexchange") {
            Ok(ProviderId::StockExchange)
        } else {
            Err(RateError::Validation(format!(
                "No rate provider found for id '{}'",
                s
            )))
        }
    }
}

/// A source of current rates for (symbol, currency) pairs.
#[async_trait]
pub trait RateProvider: Send + Sync {
    fn provider_id(&self) -> ProviderId;

    /// Whether `currency` (case-insensitive) can be requested from this
    /// provider. Must not perform any I/O.
    fn is_currency_supported(&self, currency: &str) -> bool;

    async fn current_rate(&self, symbol: &str, currency: &str) -> Result<Decimal>;
}
