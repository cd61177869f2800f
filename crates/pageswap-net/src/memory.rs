//! In-memory Page Fetcher
//!
//! Serves pages from a table with optional per-path latency. Used for
//! offline sessions and for driving navigations deterministically.

use crate::{CancellationToken, FetchError, PageFetcher};
use smol::{future, Timer};
use std::cell::RefCell;
use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;

/// Table-backed fetcher that records every request it receives
#[derive(Debug, Default)]
pub struct MemoryFetcher {
    pages: RefCell<HashMap<String, Result<String, FetchError>>>,
    latency: RefCell<HashMap<String, Duration>>,
    default_latency: Duration,
    requests: RefCell<Vec<String>>,
}

impl MemoryFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay applied to paths without their own latency
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.default_latency = latency;
        self
    }

    /// Serve `html` for `path`
    pub fn page(self, path: &str, html: &str) -> Self {
        self.insert(path, Ok(html.to_string()));
        self
    }

    /// Fail requests for `path`
    pub fn failing(self, path: &str, error: FetchError) -> Self {
        self.insert(path, Err(error));
        self
    }

    /// Delay responses for `path`
    pub fn delayed(self, path: &str, latency: Duration) -> Self {
        self.latency.borrow_mut().insert(path.to_string(), latency);
        self
    }

    pub fn insert(&self, path: &str, response: Result<String, FetchError>) {
        self.pages.borrow_mut().insert(path.to_string(), response);
    }

    /// Paths requested so far, in order
    pub fn requests(&self) -> Vec<String> {
        self.requests.borrow().clone()
    }

    /// Number of requests made for `path`
    pub fn request_count(&self, path: &str) -> usize {
        self.requests.borrow().iter().filter(|p| *p == path).count()
    }
}

impl PageFetcher for MemoryFetcher {
    fn fetch(&self, path: &str, token: &CancellationToken) -> impl Future<Output = Result<String, FetchError>> {
        self.requests.borrow_mut().push(path.to_string());

        let response = self.pages
            .borrow()
            .get(path)
            .cloned()
            .unwrap_or(Err(FetchError::Status(404)));
        let latency = self.latency
            .borrow()
            .get(path)
            .copied()
            .unwrap_or(self.default_latency);
        let token = token.clone();

        async move {
            if token.is_cancelled() {
                return Err(FetchError::Aborted);
            }
            let respond = async {
                if !latency.is_zero() {
                    Timer::after(latency).await;
                }
                response
            };
            let aborted = async {
                token.cancelled().await;
                Err(FetchError::Aborted)
            };
            future::or(respond, aborted).await
        }
    }
}
