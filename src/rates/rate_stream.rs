//! Change-only polling stream over the rate service.
//!
//! A plain timer loop rather than a reactive operator chain: the service
//! is polled at a fixed interval and a value is yielded only when it
//! differs from the previously emitted one. The first error ends the
//! stream after being surfaced once.

use async_trait::async_trait;
use futures::stream::{self, Stream};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{Interval, MissedTickBehavior};

use crate::errors::Result;
use crate::providers::ProviderId;
use crate::rates::rate_service::RateService;

/// The slice of the rate service the stream needs. Split out so the
/// polling contract can be tested against scripted sources.
#[async_trait]
pub trait RateSource: Send + Sync {
    async fn current_rate(
        &self,
        provider_id: ProviderId,
        symbol: &str,
        currency: &str,
        locale: &str,
    ) -> Result<String>;
}

#[async_trait]
impl RateSource for RateService {
    async fn current_rate(
        &self,
        provider_id: ProviderId,
        symbol: &str,
        currency: &str,
        locale: &str,
    ) -> Result<String> {
        RateService::current_rate(self, provider_id, symbol, currency, locale).await
    }
}

struct PollState {
    source: Arc<dyn RateSource>,
    provider_id: ProviderId,
    symbol: String,
    currency: String,
    locale: String,
    ticker: Interval,
    last_emitted: Option<String>,
    done: bool,
}

/// Poll `source` for the rate of `(provider_id, symbol, currency, locale)`
/// every `interval`, suppressing consecutive duplicate values.
///
/// The first tick fires immediately. An error is yielded as a single
/// terminal item. Dropping the stream stops this subscriber's polling
/// only; resolutions shared with other callers keep running.
pub fn rate_stream(
    source: Arc<dyn RateSource>,
    provider_id: ProviderId,
    symbol: impl Into<String>,
    currency: impl Into<String>,
    locale: impl Into<String>,
    interval: Duration,
) -> impl Stream<Item = Result<String>> {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let state = PollState {
        source,
        provider_id,
        symbol: symbol.into(),
        currency: currency.into(),
        locale: locale.into(),
        ticker,
        last_emitted: None,
        done: false,
    };

    stream::unfold(state, |mut state| async move {
        if state.done {
            return None;
        }
        loop {
            state.ticker.tick().await;
            let outcome = state
                .source
                .current_rate(
                    state.provider_id,
                    &state.symbol,
                    &state.currency,
                    &state.locale,
                )
                .await;
            match outcome {
                Ok(value) => {
                    if state.last_emitted.as_deref() != Some(value.as_str()) {
                        state.last_emitted = Some(value.clone());
                        return Some((Ok(value), state));
                    }
                }
                Err(e) => {
                    state.done = true;
                    return Some((Err(e), state));
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::RateError;
    use futures::StreamExt;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    struct ScriptedSource {
        responses: Mutex<VecDeque<Result<String>>>,
    }

    impl ScriptedSource {
        fn new(responses: Vec<Result<String>>) -> Arc<Self> {
            Arc::new(ScriptedSource {
                responses: Mutex::new(responses.into_iter().collect()),
            })
        }
    }

    #[async_trait]
    impl RateSource for ScriptedSource {
        async fn current_rate(
            &self,
            _provider_id: ProviderId,
            _symbol: &str,
            _currency: &str,
            _locale: &str,
        ) -> Result<String> {
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .expect("ScriptedSource: unexpected poll")
        }
    }

    fn stream_over(source: Arc<ScriptedSource>) -> impl Stream<Item = Result<String>> {
        rate_stream(
            source,
            ProviderId::CoinMarket,
            "bitcoin",
            "EUR",
            "en-US",
            Duration::from_millis(1),
        )
    }

    #[tokio::test]
    async fn suppresses_consecutive_duplicates() {
        let source = ScriptedSource::new(vec![
            Ok("10".to_string()),
            Ok("10".to_string()),
            Ok("11".to_string()),
            Ok("12".to_string()),
        ]);

        let values: Vec<String> = stream_over(source)
            .take(3)
            .map(|item| item.unwrap())
            .collect()
            .await;
        assert_eq!(values, vec!["10", "11", "12"]);
    }

    #[tokio::test]
    async fn re_emits_a_value_after_an_intervening_change() {
        // Suppression applies to consecutive values only.
        let source = ScriptedSource::new(vec![
            Ok("10".to_string()),
            Ok("11".to_string()),
            Ok("10".to_string()),
        ]);

        let values: Vec<String> = stream_over(source)
            .take(3)
            .map(|item| item.unwrap())
            .collect()
            .await;
        assert_eq!(values, vec!["10", "11", "10"]);
    }

    #[tokio::test]
    async fn an_error_is_terminal() {
        let source = ScriptedSource::new(vec![
            Ok("10".to_string()),
            Err(RateError::Extraction("Amount not found".to_string())),
        ]);

        let items: Vec<Result<String>> = stream_over(source).collect().await;
        assert_eq!(items.len(), 2);
        assert_eq!(items[0], Ok("10".to_string()));
        assert!(matches!(items[1], Err(RateError::Extraction(_))));
    }

    #[tokio::test]
    async fn first_value_is_emitted_without_waiting_a_full_interval() {
        let source = ScriptedSource::new(vec![Ok("10".to_string())]);
        let mut stream = Box::pin(rate_stream(
            source,
            ProviderId::CoinMarket,
            "bitcoin",
            "EUR",
            "en-US",
            Duration::from_secs(3600),
        ));

        let first = tokio::time::timeout(Duration::from_millis(100), stream.next())
            .await
            .expect("first value should arrive immediately");
        assert_eq!(first, Some(Ok("10".to_string())));
    }
}
