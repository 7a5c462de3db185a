use std::time::Duration;

use thiserror::Error;
use url::Url;

/// Default hard deadline for one proxied feed fetch.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(12_000);

/// Content types we ask the origin for, most specific first.
const ACCEPT_FEED: &str = "application/rss+xml, application/xml, text/xml, */*";

/// Errors that can end a single feed fetch.
///
/// These cover the transport lifecycle only; feed content that fails to
/// parse is not an error (the parser degrades to zero items instead).
#[derive(Debug, Error)]
pub enum FetchError {
    /// Network-level error (DNS, connection, TLS, body read)
    #[error("request failed: {0}")]
    Network(#[from] reqwest::Error),
    /// HTTP response with a non-2xx status code
    #[error("HTTP error: status {0}")]
    HttpStatus(u16),
    /// No complete response within the configured deadline
    #[error("request timed out")]
    Timeout,
}

/// HTTP client that reaches origin feeds through a CORS proxy.
///
/// The proxy takes the target feed URL as a percent-encoded `url` query
/// parameter and answers with the origin body verbatim, so the core only
/// depends on "feed URL in, feed text or non-2xx status out".
#[derive(Debug, Clone)]
pub struct ProxyClient {
    client: reqwest::Client,
    proxy_base: Url,
    timeout: Duration,
}

impl ProxyClient {
    /// Creates a client for the given proxy endpoint and per-fetch deadline.
    pub fn new(proxy_base: Url, timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::new(),
            proxy_base,
            timeout,
        }
    }

    /// The proxied request URL for a feed.
    fn proxied_url(&self, feed_url: &str) -> Url {
        let mut url = self.proxy_base.clone();
        url.query_pairs_mut().append_pair("url", feed_url);
        url
    }

    /// Fetches a feed body as text through the proxy.
    ///
    /// The deadline covers the whole exchange, response headers and body
    /// both. Hitting it drops the in-flight request future, which cancels
    /// the connection on every exit path — there is no timer to clean up.
    ///
    /// # Errors
    ///
    /// - [`FetchError::Timeout`] — no complete response within the deadline
    /// - [`FetchError::HttpStatus`] — proxy answered with a non-2xx status
    /// - [`FetchError::Network`] — transport failure at any stage
    pub async fn fetch(&self, feed_url: &str) -> Result<String, FetchError> {
        let url = self.proxied_url(feed_url);

        let exchange = async {
            let response = self
                .client
                .get(url)
                .header(reqwest::header::ACCEPT, ACCEPT_FEED)
                .header(reqwest::header::CACHE_CONTROL, "no-cache")
                .send()
                .await?;

            if !response.status().is_success() {
                return Err(FetchError::HttpStatus(response.status().as_u16()));
            }

            Ok(response.text().await?)
        };

        tokio::time::timeout(self.timeout, exchange)
            .await
            .map_err(|_| FetchError::Timeout)?
    }
}
