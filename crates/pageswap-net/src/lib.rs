//! pageswap Networking
//!
//! Page fetching behind the `PageFetcher` seam, with cooperative
//! cancellation of superseded requests.

mod cancel;
mod http;
mod memory;

use std::future::Future;

pub use cancel::CancellationToken;
pub use http::HttpFetcher;
pub use memory::MemoryFetcher;
pub use url::Url;

/// Fetches page HTML by request path
///
/// Implementations should give up early once `token` is cancelled; callers
/// race the returned future against the token regardless.
pub trait PageFetcher {
    fn fetch(&self, path: &str, token: &CancellationToken) -> impl Future<Output = Result<String, FetchError>>;
}

impl<F: PageFetcher> PageFetcher for &F {
    fn fetch(&self, path: &str, token: &CancellationToken) -> impl Future<Output = Result<String, FetchError>> {
        (**self).fetch(path, token)
    }
}

/// Fetch error
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    #[error("Request aborted")]
    Aborted,

    #[error("HTTP error: {0}")]
    Status(u16),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid path: {0}")]
    InvalidPath(String),
}

impl FetchError {
    /// Intentional aborts are not failures
    pub fn is_abort(&self) -> bool {
        matches!(self, FetchError::Aborted)
    }
}
