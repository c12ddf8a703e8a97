use std::time::Duration;

use reqwest::{Client, header};
use serde_json::Value;
use tracing::debug;

use crate::error::Result;

/// Upstreams are scrapers that turn away default client user agents.
pub const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/122.0.0.0 Safari/537.36";

/// One GET, whole body buffered. No retries.
#[async_trait::async_trait]
pub trait Fetch: Send + Sync {
    async fn fetch(&self, url: &str, headers: &[(&str, &str)]) -> Result<Vec<u8>>;
}

pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    /// `timeout` of `None` waits as long as the upstream takes.
    pub fn new(timeout: Option<Duration>) -> Result<Self> {
        let mut builder = Client::builder().user_agent(USER_AGENT);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            client: builder.build()?,
        })
    }
}

#[async_trait::async_trait]
impl Fetch for HttpClient {
    async fn fetch(&self, url: &str, headers: &[(&str, &str)]) -> Result<Vec<u8>> {
        let mut request = self.client.get(url);
        for (name, value) in headers {
            request = request.header(*name, *value);
        }

        debug!(url = %url, "GET");
        let response = request.send().await?;

        // Error statuses still carry JSON envelopes worth decoding.
        let status = response.status();
        if !status.is_success() {
            debug!(url = %url, status = %status, "Non-success status from provider");
        }

        let bytes = response.bytes().await?;
        Ok(bytes.to_vec())
    }
}

/// Fetch and decode into a generic JSON value.
pub async fn get_json(fetcher: &dyn Fetch, url: &str) -> Result<Value> {
    let body = fetcher
        .fetch(url, &[(header::ACCEPT.as_str(), "application/json")])
        .await?;
    let value = serde_json::from_slice(&body)?;
    Ok(value)
}

/// Full percent-encoding, safe for query values and path segments.
pub fn encode_component(raw: &str) -> String {
    urlencoding::encode(raw).into_owned()
}

/// Slug used by upstreams that take the query as a path segment.
pub fn slugify(raw: &str) -> String {
    raw.trim().replace(' ', "-")
}
