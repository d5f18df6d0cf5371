//! Jikan API v4 client.
//!
//! A serial, rate-limited client: one request at a time, fixed delays
//! between requests, bounded retries on transient failures.

pub mod client;
pub mod error;
pub mod types;

pub use client::JikanClient;
pub use error::ApiError;
pub use types::*;
