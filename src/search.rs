use axum::body::Bytes;
use reqwest::Client;
use serde::de::IgnoredAny;
use std::fmt;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

/// Results requested per search; the indexer's maximum page size.
pub const RESULT_LIMIT: u32 = 200;

/// Percent-encode `value` like a browser's `encodeURIComponent`, which keeps
/// `!'()*` literal.
pub fn encode_component(value: &str) -> String {
    urlencoding::encode(value)
        .replace("%21", "!")
        .replace("%27", "'")
        .replace("%28", "(")
        .replace("%29", ")")
        .replace("%2A", "*")
}

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("indexer request failed: {0}")]
    Request(#[source] reqwest::Error),

    #[error("indexer did not respond within {0:?}")]
    Timeout(Duration),

    #[error("indexer returned invalid JSON: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

/// Forwards search queries to a Newznab-style indexer (NZBGeek by default)
/// and hands back its JSON untouched.
#[derive(Clone)]
pub struct SearchClient {
    client: Client,
    api_url: String,
    api_key: String,
    timeout: Duration,
}

impl fmt::Debug for SearchClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SearchClient")
            .field("api_url", &self.api_url)
            .field("api_key", &"***")
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl SearchClient {
    pub fn new(api_url: &str, api_key: &str, timeout: Duration) -> Result<Self, SearchError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(SearchError::Client)?;

        Ok(Self {
            client,
            api_url: api_url.to_string(),
            api_key: api_key.to_string(),
            timeout,
        })
    }

    /// Full upstream URL for `query`. Only the query is percent-encoded; the
    /// key goes in verbatim.
    pub fn build_url(&self, query: &str) -> String {
        format!(
            "{}?t=search&q={}&limit={}&extended=1&o=json&apikey={}",
            self.api_url,
            encode_component(query),
            RESULT_LIMIT,
            self.api_key
        )
    }

    /// Same as `build_url` with the key masked, for log lines.
    fn redacted_url(&self, query: &str) -> String {
        let url = self.build_url(query);
        match url.rfind("&apikey=") {
            Some(idx) => format!("{}&apikey=***", &url[..idx]),
            None => url,
        }
    }

    /// Run one search and return the raw JSON body.
    ///
    /// The body is checked to be well-formed JSON but is otherwise passed
    /// through byte-for-byte.
    pub async fn search(&self, query: &str) -> Result<Bytes, SearchError> {
        debug!(url = %self.redacted_url(query), "querying indexer");

        let res = self
            .client
            .get(self.build_url(query))
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = res.status();
        if !status.is_success() {
            warn!(%status, "indexer returned non-success status");
        }

        let body = res.bytes().await.map_err(|e| self.classify(e))?;
        serde_json::from_slice::<IgnoredAny>(&body)?;
        Ok(body)
    }

    fn classify(&self, err: reqwest::Error) -> SearchError {
        // Strip the URL so the API key can never end up in a log line.
        let err = err.without_url();
        if err.is_timeout() {
            SearchError::Timeout(self.timeout)
        } else {
            SearchError::Request(err)
        }
    }
}
