//! HTTP Page Fetcher
//!
//! GETs pages over HTTP(S) with reqwest's blocking client, run on smol's
//! blocking thread pool so the navigation thread never blocks. The worker
//! watches the cancellation token itself and drops the connection once it
//! fires, so a superseded request stops downloading.

use crate::{CancellationToken, FetchError, PageFetcher};
use reqwest::blocking::Client;
use reqwest::header::ACCEPT;
use smol::future;
use std::future::Future;
use std::io::{self, Read};
use std::time::Duration;
use url::Url;

const USER_AGENT: &str = concat!("pageswap/", env!("CARGO_PKG_VERSION"));
const READ_CHUNK: usize = 16 * 1024;

/// Fetches same-origin pages relative to a base URL
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    base: Url,
}

impl HttpFetcher {
    /// Create a fetcher for the site at `base`
    pub fn new(base: Url) -> Result<Self, FetchError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| FetchError::Network(e.to_string()))?;

        Ok(Self { client, base })
    }

    /// Site base URL
    pub fn base(&self) -> &Url {
        &self.base
    }

    /// Resolve a request path against the base, rejecting other origins
    pub fn resolve(&self, path: &str) -> Result<Url, FetchError> {
        let url = self.base
            .join(path)
            .map_err(|e| FetchError::InvalidPath(format!("{}: {}", path, e)))?;

        if url.origin() != self.base.origin() {
            return Err(FetchError::InvalidPath(format!("{}: cross-origin", path)));
        }
        Ok(url)
    }
}

impl PageFetcher for HttpFetcher {
    fn fetch(&self, path: &str, token: &CancellationToken) -> impl Future<Output = Result<String, FetchError>> {
        let url = self.resolve(path);
        let client = self.client.clone();
        let token = token.clone();

        async move {
            let url = url?;
            if token.is_cancelled() {
                return Err(FetchError::Aborted);
            }

            tracing::info!("HTTP GET {}", url);
            let worker_token = token.clone();
            let request = smol::unblock(move || get_text(&client, url, &worker_token));
            let aborted = async {
                token.cancelled().await;
                Err(FetchError::Aborted)
            };
            future::or(request, aborted).await
        }
    }
}

/// Blocking GET returning the body as UTF-8 text
fn get_text(client: &Client, url: Url, token: &CancellationToken) -> Result<String, FetchError> {
    // Superseded while queued on the blocking pool
    if token.is_cancelled() {
        return Err(FetchError::Aborted);
    }

    let response = client
        .get(url)
        .header(ACCEPT, "text/html")
        .send()
        .map_err(|e| FetchError::Network(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::Status(status.as_u16()));
    }

    let body = read_body(response, token)?;
    Ok(String::from_utf8_lossy(&body).into_owned())
}

/// Read a response body chunk by chunk, giving up as soon as `token` fires
///
/// Returning drops the reader, which closes the connection.
fn read_body(mut reader: impl Read, token: &CancellationToken) -> Result<Vec<u8>, FetchError> {
    let mut body = Vec::new();
    let mut chunk = vec![0; READ_CHUNK];
    loop {
        if token.is_cancelled() {
            tracing::debug!("Download aborted after {} bytes", body.len());
            return Err(FetchError::Aborted);
        }
        match reader.read(&mut chunk) {
            Ok(0) => return Ok(body),
            Ok(n) => body.extend_from_slice(&chunk[..n]),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(FetchError::Network(e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fetcher() -> HttpFetcher {
        HttpFetcher::new(Url::parse("https://example.com/blog/").unwrap()).unwrap()
    }

    #[test]
    fn test_resolve_absolute_path() {
        let url = fetcher().resolve("/about").unwrap();
        assert_eq!(url.as_str(), "https://example.com/about");
    }

    #[test]
    fn test_resolve_relative_path() {
        let url = fetcher().resolve("post?id=1").unwrap();
        assert_eq!(url.as_str(), "https://example.com/blog/post?id=1");
    }

    #[test]
    fn test_resolve_rejects_cross_origin() {
        let err = fetcher().resolve("https://other.example/").unwrap_err();
        assert!(matches!(err, FetchError::InvalidPath(_)));
    }

    #[test]
    fn test_fetch_with_cancelled_token() {
        let token = CancellationToken::new();
        token.cancel();

        let result = smol::block_on(fetcher().fetch("/about", &token));
        assert_eq!(result, Err(FetchError::Aborted));
    }

    /// Yields a few bytes per read and cancels the token on a given read
    struct Trickle {
        token: CancellationToken,
        cancel_on: usize,
        reads: usize,
    }

    impl Read for Trickle {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            self.reads += 1;
            if self.reads == self.cancel_on {
                self.token.cancel();
            }
            let n = buf.len().min(4);
            buf[..n].copy_from_slice(&b"html"[..n]);
            Ok(n)
        }
    }

    #[test]
    fn test_read_body_stops_on_cancel() {
        let token = CancellationToken::new();
        let mut reader = Trickle { token: token.clone(), cancel_on: 3, reads: 0 };

        let result = read_body(&mut reader, &token);

        assert_eq!(result, Err(FetchError::Aborted));
        assert_eq!(reader.reads, 3);
    }

    #[test]
    fn test_read_body_to_end() {
        let token = CancellationToken::new();
        let body = read_body(&b"<title>About</title>"[..], &token).unwrap();
        assert_eq!(body, b"<title>About</title>");
    }
}
