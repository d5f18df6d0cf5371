//! Jikan API client: retrying fetcher and paginator.
//!
//! The client is intentionally serial. Throttling is a fixed sleep after
//! every successful request, so callers never add inter-request spacing of
//! their own; retries use a fixed delay, with a doubled backoff on HTTP 429.

use super::error::ApiError;
use super::types::{Anime, PageEnvelope, Review, SingleEnvelope};
use anyhow::{Context, Result};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, warn};

/// Ranked list resource (query parameter `page`)
const TOP_ANIME_ENDPOINT: &str = "/top/anime";
/// Per-entry resource root (`/{id}/full`, `/{id}/reviews`)
const ANIME_ENDPOINT: &str = "/anime";

/// Jikan API v4 client
pub struct JikanClient {
    http: Client,
    base_url: String,
    max_retries: u32,
    retry_delay: Duration,
    rate_limit_delay: Duration,
}

impl JikanClient {
    /// Create a new Jikan client
    pub fn new(
        base_url: String,
        max_retries: u32,
        retry_delay: Duration,
        rate_limit_delay: Duration,
    ) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent("anime-collector/0.1.0")
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            http,
            base_url,
            // The retry loop must run at least once so Exhausted always
            // carries a cause.
            max_retries: max_retries.max(1),
            retry_delay,
            rate_limit_delay,
        })
    }

    /// Fetch one URL with bounded retries, returning the raw body.
    ///
    /// Every attempt after the first is preceded by the retry delay; a 429
    /// response additionally sleeps twice the rate-limit delay before the
    /// next attempt. On success the rate-limit delay is always slept before
    /// returning.
    pub async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>, ApiError> {
        let mut attempt = 0;
        let cause = loop {
            attempt += 1;
            if attempt > 1 {
                sleep(self.retry_delay).await;
            }

            debug!(url, attempt, "Fetching URL");

            let err = match self.attempt(url).await {
                Ok(body) => {
                    // Throttle the overall request rate regardless of how
                    // many attempts this fetch took.
                    sleep(self.rate_limit_delay).await;
                    return Ok(body);
                }
                Err(e) => e,
            };

            warn!(url, attempt, error = %err, "Request attempt failed");

            if matches!(err, ApiError::RateLimited) {
                sleep(self.rate_limit_delay * 2).await;
            }

            if attempt >= self.max_retries {
                break err;
            }
        };

        Err(ApiError::Exhausted {
            attempts: self.max_retries,
            source: Box::new(cause),
        })
    }

    /// A single request attempt with no delays of its own
    async fn attempt(&self, url: &str) -> Result<Vec<u8>, ApiError> {
        let response = self.http.get(url).send().await?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(ApiError::RateLimited);
        }
        if !status.is_success() {
            return Err(ApiError::Http(status));
        }

        let body = response.bytes().await?;
        Ok(body.to_vec())
    }

    /// Drive the fetcher across successive pages of a list resource.
    ///
    /// Pages are numbered from 1. The loop stops on the first of: an empty
    /// page, a page reporting no next page (neither contributes items), or
    /// the accumulated count reaching `limit` (truncated to exactly
    /// `limit`). A decode failure aborts the whole fetch.
    pub async fn fetch_paginated<T: DeserializeOwned>(
        &self,
        limit: usize,
        mut page_url: impl FnMut(u32) -> String,
    ) -> Result<Vec<T>, ApiError> {
        let mut items: Vec<T> = Vec::new();
        let mut page = 1;

        while items.len() < limit {
            let url = page_url(page);
            let body = self.fetch_bytes(&url).await?;

            let envelope: PageEnvelope<T> = serde_json::from_slice(&body)?;

            // No more data available
            if envelope.data.is_empty() || !envelope.pagination.has_next_page {
                break;
            }

            items.extend(envelope.data);

            if items.len() >= limit {
                items.truncate(limit);
                break;
            }

            page += 1;
        }

        Ok(items)
    }

    /// Fetch the top-ranked anime list
    pub async fn get_top_anime(&self, limit: usize) -> Result<Vec<Anime>, ApiError> {
        let anime = self
            .fetch_paginated(limit, |page| {
                format!("{}{}?page={}", self.base_url, TOP_ANIME_ENDPOINT, page)
            })
            .await?;

        info!(count = anime.len(), "Retrieved top anime");
        Ok(anime)
    }

    /// Fetch full details (including statistics) for one entry
    pub async fn get_anime_full(&self, mal_id: u32) -> Result<Anime, ApiError> {
        let url = format!("{}{}/{}/full", self.base_url, ANIME_ENDPOINT, mal_id);
        let body = self.fetch_bytes(&url).await?;

        let envelope: SingleEnvelope<Anime> = serde_json::from_slice(&body)?;
        Ok(envelope.data)
    }

    /// Fetch reviews for one entry
    pub async fn get_anime_reviews(
        &self,
        mal_id: u32,
        limit: usize,
    ) -> Result<Vec<Review>, ApiError> {
        let reviews = self
            .fetch_paginated(limit, |page| {
                format!(
                    "{}{}/{}/reviews?page={}",
                    self.base_url, ANIME_ENDPOINT, mal_id, page
                )
            })
            .await?;

        info!(mal_id, count = reviews.len(), "Retrieved reviews");
        Ok(reviews)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = JikanClient::new(
            "https://api.jikan.moe/v4".to_string(),
            3,
            Duration::from_millis(1000),
            Duration::from_millis(1000),
        );
        assert!(client.is_ok());
    }

    #[test]
    fn test_retry_budget_is_at_least_one() {
        let client = JikanClient::new(
            "https://api.jikan.moe/v4".to_string(),
            0,
            Duration::ZERO,
            Duration::ZERO,
        )
        .unwrap();
        assert_eq!(client.max_retries, 1);
    }
}
