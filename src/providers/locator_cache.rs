//! Self-healing cache of discovered resource URLs.
//!
//! Some sources expose no stable URL scheme for an instrument's detail
//! page; it has to be discovered through a search call first. The cache
//! remembers the discovered URL per symbol so later lookups skip the
//! search. Cached URLs can go stale when content moves, so consumers
//! invalidate the entry on a failed target fetch and re-resolve exactly
//! once (see `StockExchangeProvider`).

use dashmap::DashMap;
use lazy_static::lazy_static;
use log::debug;
use regex::Regex;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::errors::Result;
use crate::extract;
use crate::http::{PageFetcher, ACCEPT_JSON};

lazy_static! {
    static ref ASSET_LINK: Regex = Regex::new(r#""snapshotlink":"([^"]+)""#).unwrap();
}

/// Symbol → resource URL cache with single-flight resolution.
pub struct LocatorCache {
    fetcher: Arc<dyn PageFetcher>,
    search_url: String,
    entries: DashMap<String, String>,
    resolution_locks: DashMap<String, Arc<Mutex<()>>>,
}

impl LocatorCache {
    pub fn new(fetcher: Arc<dyn PageFetcher>, search_url: String) -> Self {
        LocatorCache {
            fetcher,
            search_url,
            entries: DashMap::new(),
            resolution_locks: DashMap::new(),
        }
    }

    /// Return the resource URL for `symbol`, searching for it on a miss.
    ///
    /// Concurrent callers for the same unresolved symbol collapse into one
    /// search call; the rest wait and read the cached result.
    pub async fn resolve(&self, symbol: &str) -> Result<String> {
        if let Some(url) = self.entries.get(symbol) {
            return Ok(url.clone());
        }

        let lock = self
            .resolution_locks
            .entry(symbol.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let _guard = lock.lock().await;

        // Another caller may have resolved the symbol while we waited.
        if let Some(url) = self.entries.get(symbol) {
            return Ok(url.clone());
        }

        let search_url = format!("{}{}", self.search_url, symbol);
        let search_page = self.fetcher.fetch(&search_url, ACCEPT_JSON).await?;
        let url = extract::first_capture(
            std::slice::from_ref(&*ASSET_LINK),
            &search_page,
            "Asset link",
        )?;

        debug!("Resolved '{}' to '{}'", symbol, url);
        self.entries.insert(symbol.to_string(), url.clone());
        Ok(url)
    }

    /// Drop the cached URL for `symbol`; the next `resolve` searches again.
    pub fn invalidate(&self, symbol: &str) {
        if self.entries.remove(symbol).is_some() {
            debug!("Invalidated cached locator for '{}'", symbol);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{retrieval_error, MockFetcher};
    use std::time::Duration;

    const SEARCH_URL: &str = "http://search/?q=";

    fn cache_with(fetcher: Arc<MockFetcher>) -> LocatorCache {
        LocatorCache::new(fetcher, SEARCH_URL.to_string())
    }

    #[tokio::test]
    async fn resolves_and_caches_the_asset_link() {
        let fetcher = Arc::new(MockFetcher::new());
        fetcher.push_ok(r#"{"snapshotlink":"http://x/a"}"#);
        let cache = cache_with(fetcher.clone());

        assert_eq!(cache.resolve("SAP").await.unwrap(), "http://x/a");
        // Second resolve must not touch the network.
        assert_eq!(cache.resolve("SAP").await.unwrap(), "http://x/a");
        assert_eq!(fetcher.call_count(), 1);
        assert_eq!(fetcher.calls()[0].0, "http://search/?q=SAP");
        assert_eq!(fetcher.calls()[0].1, ACCEPT_JSON);
    }

    #[tokio::test]
    async fn invalidation_forces_a_new_search() {
        let fetcher = Arc::new(MockFetcher::new());
        fetcher.push_ok(r#"{"snapshotlink":"http://x/a"}"#);
        fetcher.push_ok(r#"{"snapshotlink":"http://x/b"}"#);
        let cache = cache_with(fetcher.clone());

        assert_eq!(cache.resolve("SAP").await.unwrap(), "http://x/a");
        cache.invalidate("SAP");
        assert_eq!(cache.resolve("SAP").await.unwrap(), "http://x/b");
        assert_eq!(fetcher.call_count(), 2);
    }

    #[tokio::test]
    async fn search_failures_propagate_and_cache_nothing() {
        let fetcher = Arc::new(MockFetcher::new());
        fetcher.push_err(retrieval_error("http://search/?q=SAP"));
        fetcher.push_ok(r#"{"snapshotlink":"http://x/a"}"#);
        let cache = cache_with(fetcher.clone());

        assert!(cache.resolve("SAP").await.is_err());
        // Nothing was cached, so the next resolve searches again.
        assert_eq!(cache.resolve("SAP").await.unwrap(), "http://x/a");
    }

    #[tokio::test]
    async fn missing_link_is_an_extraction_error() {
        let fetcher = Arc::new(MockFetcher::new());
        fetcher.push_ok(r#"{"results":[]}"#);
        let cache = cache_with(fetcher.clone());

        let err = cache.resolve("SAP").await.unwrap_err();
        assert_eq!(
            err,
            crate::errors::RateError::Extraction("Asset link not found".to_string())
        );
    }

    #[tokio::test]
    async fn concurrent_resolution_is_single_flight() {
        let fetcher = Arc::new(MockFetcher::with_delay(Duration::from_millis(20)));
        // One scripted response only: a duplicate search would panic.
        fetcher.push_ok(r#"{"snapshotlink":"http://x/a"}"#);
        let cache = Arc::new(cache_with(fetcher.clone()));

        let (a, b) = tokio::join!(cache.resolve("SAP"), cache.resolve("SAP"));
        assert_eq!(a.unwrap(), "http://x/a");
        assert_eq!(b.unwrap(), "http://x/a");
        assert_eq!(fetcher.call_count(), 1);
    }
}
