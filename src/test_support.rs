//! Shared test doubles for unit tests.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use crate::errors::{RateError, Result};
use crate::http::PageFetcher;

/// Scripted `PageFetcher`: returns queued responses in order and records
/// every request. Panics when fetched more often than scripted, which
/// doubles as a duplicate-call assertion.
pub(crate) struct MockFetcher {
    responses: Mutex<VecDeque<Result<String>>>,
    calls: Mutex<Vec<(String, String)>>,
    delay: Option<Duration>,
}

impl MockFetcher {
    pub fn new() -> Self {
        MockFetcher {
            responses: Mutex::new(VecDeque::new()),
            calls: Mutex::new(Vec::new()),
            delay: None,
        }
    }

    pub fn with_delay(delay: Duration) -> Self {
        MockFetcher {
            delay: Some(delay),
            ..Self::new()
        }
    }

    pub fn push_ok(&self, body: &str) {
        self.responses
            .lock()
            .unwrap()
            .push_back(Ok(body.to_string()));
    }

    pub fn push_err(&self, err: RateError) {
        self.responses.lock().unwrap().push_back(Err(err));
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl PageFetcher for MockFetcher {
    async fn fetch(&self, url: &str, accept: &str) -> Result<String> {
        self.calls
            .lock()
            .unwrap()
            .push((url.to_string(), accept.to_string()));
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .expect("MockFetcher: unexpected fetch")
    }
}

pub(crate) fn retrieval_error(url: &str) -> RateError {
    RateError::Retrieval {
        url: url.to_string(),
        cause: "503 Service Unavailable".to_string(),
    }
}
