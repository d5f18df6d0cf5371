//! Error taxonomy for the API client.

use reqwest::StatusCode;
use thiserror::Error;

/// Errors produced by a single logical fetch or a paginated fetch.
///
/// `Network`, `Http` and `RateLimited` are retried inside the fetcher up to
/// the attempt budget and then escalate to `Exhausted`. `Decode` is never
/// retried: a malformed body will not improve on a second request.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Transport-level failure (connect, send, or body read)
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// HTTP 429 from the server
    #[error("rate limited by server")]
    RateLimited,

    /// Any other non-success HTTP status
    #[error("unexpected HTTP status {0}")]
    Http(StatusCode),

    /// Malformed JSON response body
    #[error("malformed response body: {0}")]
    Decode(#[from] serde_json::Error),

    /// Retry budget spent; wraps the last underlying cause
    #[error("request failed after {attempts} attempts")]
    Exhausted {
        attempts: u32,
        #[source]
        source: Box<ApiError>,
    },
}
