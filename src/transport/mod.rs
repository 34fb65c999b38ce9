//! SPARQL protocol transport
//!
//! The seam between the mapper and a concrete triplestore. Everything
//! above this module only knows the two-operation [`Transport`] trait;
//! [`HttpTransport`] implements it over the SPARQL 1.1 protocol. Errors
//! pass through to the caller untranslated, and nothing is retried here.

mod http;

pub use http::HttpTransport;

use async_trait::async_trait;
use thiserror::Error;

/// Transport errors
#[derive(Error, Debug)]
pub enum TransportError {
    /// Request-level failure (connection, timeout, invalid URL)
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The endpoint answered with a non-success status
    #[error("endpoint returned status {status}: {body}")]
    Status { status: u16, body: String },
}

pub type TransportResult<T> = Result<T, TransportError>;

/// Media type requested for CONSTRUCT results consumed by the codec.
pub const ACCEPT_NQUADS: &str = "application/n-quads";

/// A SPARQL endpoint pair, as seen by the mapper.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Execute a SPARQL Update; succeeds or fails as a whole.
    async fn update(&self, query: &str) -> TransportResult<()>;

    /// Execute a SPARQL Query and return the raw response body. `accept`
    /// selects the desired response shape.
    async fn query(&self, query: &str, accept: Option<&str>) -> TransportResult<String>;
}
