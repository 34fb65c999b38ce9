//! SPARQL 1.1 protocol client

use super::{Transport, TransportError, TransportResult};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

/// HTTP client for one triplestore's query and update endpoints.
///
/// Updates go out as `application/x-www-form-urlencoded` POST bodies with
/// an `update` field; queries as GET requests with a `query` parameter.
pub struct HttpTransport {
    client: Client,
    query_url: String,
    update_url: String,
}

impl HttpTransport {
    /// Create a transport for the given endpoint pair.
    pub fn new(
        query_url: impl Into<String>,
        update_url: impl Into<String>,
    ) -> TransportResult<Self> {
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;
        Ok(Self {
            client,
            query_url: query_url.into(),
            update_url: update_url.into(),
        })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn update(&self, query: &str) -> TransportResult<()> {
        debug!(endpoint = %self.update_url, "sending SPARQL update");
        let resp = self
            .client
            .post(&self.update_url)
            .form(&[("update", query)])
            .send()
            .await?;
        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(TransportError::Status { status, body });
        }
        Ok(())
    }

    async fn query(&self, query: &str, accept: Option<&str>) -> TransportResult<String> {
        debug!(endpoint = %self.query_url, "sending SPARQL query");
        let mut request = self.client.get(&self.query_url).query(&[("query", query)]);
        if let Some(accept) = accept {
            request = request.header(reqwest::header::ACCEPT, accept);
        }
        let resp = request.send().await?;
        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(TransportError::Status { status, body });
        }
        Ok(resp.text().await?)
    }
}
