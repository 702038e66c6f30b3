//! Error types for the Snipcart API client.
//!
//! # Design
//! Only failures to produce or deliver a request are errors. A response with
//! a 4xx/5xx status is still a completed request and is reported through
//! `SnipcartClient::status_code` / `successful`, never through `ApiError`.

use thiserror::Error;

use crate::http::HttpMethod;

pub type Result<T, E = ApiError> = std::result::Result<T, E>;

/// Errors returned by `SnipcartClient` and its transports.
#[derive(Debug, Error)]
pub enum ApiError {
    /// No API key was passed and none was found in the environment.
    #[error("no api key configured; set {0} or pass one explicitly")]
    MissingApiKey(&'static str),

    #[error("unknown http method: {0}")]
    UnknownMethod(String),

    #[error("unknown post encoding: {0} (expected \"body\" or \"form\")")]
    UnknownEncoding(String),

    /// The payload could not be encoded as JSON.
    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The request could not be turned into a wire request (bad url, bad header).
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// DNS, connect, TLS, timeout or I/O failure. The underlying error is kept
    /// as the source untouched, whichever `Transport` produced it.
    #[error("{method} {url} failed")]
    Transport {
        method: HttpMethod,
        url: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}
