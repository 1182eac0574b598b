//! HTTP page retrieval with bounded redirect following.

use async_trait::async_trait;
use log::{debug, error};
use reqwest::header::{ACCEPT, LOCATION, USER_AGENT};
use reqwest::{redirect, Client, Response, Url};
use std::time::Duration;

use crate::errors::{RateError, Result};

pub const ACCEPT_JSON: &str = "application/json";
pub const ACCEPT_HTML: &str = "text/html";

const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 Chrome/120.0.0.0 Safari/537.36";
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Retrieves the textual body of a URL.
///
/// Providers and caches depend on this trait so tests can substitute
/// scripted fetchers without any network access.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str, accept: &str) -> Result<String>;
}

/// `reqwest`-backed fetcher.
///
/// Automatic redirect following is disabled on the client: some sources
/// answer with redirect chains that would loop or mask errors, so exactly
/// one redirect hop is followed here and a second redirect is treated as
/// the final response.
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new() -> Self {
        let client = Client::builder()
            .redirect(redirect::Policy::none())
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .expect("Failed to create HTTP client");

        Self { client }
    }

    async fn get(&self, url: &Url, accept: &str) -> Result<Response> {
        self.client
            .get(url.clone())
            .header(USER_AGENT, DEFAULT_USER_AGENT)
            .header(ACCEPT, accept)
            .send()
            .await
            .map_err(|e| RateError::Retrieval {
                url: url.to_string(),
                cause: e.to_string(),
            })
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str, accept: &str) -> Result<String> {
        let parsed = Url::parse(url).map_err(|e| RateError::Retrieval {
            url: url.to_string(),
            cause: e.to_string(),
        })?;

        debug!("Fetching '{}' as '{}'", parsed, accept);
        let mut response = self.get(&parsed, accept).await?;

        // At most one redirect hop is followed; see the type docs.
        if response.status().is_redirection() {
            if let Some(location) = response
                .headers()
                .get(LOCATION)
                .and_then(|value| value.to_str().ok())
            {
                let next = parsed.join(location).map_err(|e| RateError::Retrieval {
                    url: parsed.to_string(),
                    cause: format!("Invalid redirect location '{}': {}", location, e),
                })?;
                debug!("Following redirect to '{}'", next);
                response = self.get(&next, accept).await?;
            }
        }

        let status = response.status();
        let final_url = response.url().to_string();
        debug!("Response status code: {}", status);

        if status.as_u16() >= 400 {
            error!("Failed to fetch '{}', status code: {}", final_url, status);
            return Err(RateError::Retrieval {
                url: final_url,
                cause: status.to_string(),
            });
        }

        response.text().await.map_err(|e| RateError::Retrieval {
            url: final_url,
            cause: e.to_string(),
        })
    }
}
