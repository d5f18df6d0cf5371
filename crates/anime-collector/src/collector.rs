//! Collection run orchestrator.
//!
//! Drives the three fetch passes (ranked list, per-entry details, per-entry
//! reviews) and hands each collection to the exporter. The top-level list
//! fetch and every export step are fatal; per-entry enrichment failures are
//! logged and skipped.

use crate::api::types::{Anime, Review};
use crate::api::JikanClient;
use crate::export::CsvExporter;
use anyhow::{Context, Result};
use shared::config::CollectorConfig;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{info, warn};

/// Statistics for one collection run
#[derive(Debug, Clone, Default)]
pub struct CollectorStats {
    pub entries_fetched: usize,
    pub genre_rows: usize,
    pub studio_rows: usize,
    pub details_enriched: usize,
    pub detail_failures: usize,
    pub statistics_rows: usize,
    pub reviews_fetched: usize,
    pub review_failures: usize,
}

/// Main collection coordinator
pub struct Collector {
    client: JikanClient,
    exporter: CsvExporter,
    settings: CollectorConfig,
}

impl Collector {
    /// Create a new collector
    pub fn new(client: JikanClient, exporter: CsvExporter, settings: CollectorConfig) -> Self {
        Self {
            client,
            exporter,
            settings,
        }
    }

    /// Run the complete collection process
    ///
    /// 1. Fetch the ranked list (fatal on failure)
    /// 2. Export basic, genre and studio tables
    /// 3. Detail pass: statistics snapshots for a bounded subset
    /// 4. Review pass: reviews for a smaller subset
    pub async fn run(&self) -> Result<CollectorStats> {
        let mut stats = CollectorStats::default();

        self.exporter
            .initialize()
            .context("Failed to create output directory")?;

        info!(
            limit = self.settings.top_anime_limit,
            "Fetching top anime list"
        );
        let top_anime = self
            .client
            .get_top_anime(self.settings.top_anime_limit)
            .await
            .context("Failed to fetch top anime list")?;
        stats.entries_fetched = top_anime.len();

        self.exporter
            .export_basic(&top_anime)
            .context("Failed to export basic anime data")?;
        stats.genre_rows = self
            .exporter
            .export_genres(&top_anime)
            .context("Failed to export anime genres")?;
        stats.studio_rows = self
            .exporter
            .export_studios(&top_anime)
            .context("Failed to export anime studios")?;

        let enriched = self.detail_pass(&top_anime, &mut stats).await;
        stats.statistics_rows = self
            .exporter
            .export_statistics(&enriched)
            .context("Failed to export anime statistics")?;

        let reviews = self.review_pass(&top_anime, &mut stats).await;
        self.exporter
            .export_reviews(&reviews)
            .context("Failed to export anime reviews")?;

        info!(
            entries = stats.entries_fetched,
            enriched = stats.details_enriched,
            reviews = stats.reviews_fetched,
            "Collection run complete"
        );

        Ok(stats)
    }

    /// Fetch full details for a bounded subset of entries.
    ///
    /// A failing entry is skipped, not fatal. Each item is followed by the
    /// inter-item delay on top of the fetcher's own throttle.
    async fn detail_pass(&self, top_anime: &[Anime], stats: &mut CollectorStats) -> Vec<Anime> {
        let limit = self.settings.detail_limit.min(top_anime.len());
        info!(limit, "Fetching detailed statistics");

        let mut enriched = Vec::new();
        for (idx, anime) in top_anime.iter().take(limit).enumerate() {
            info!(
                progress = format!("{}/{}", idx + 1, limit),
                mal_id = anime.mal_id,
                title = %anime.title,
                "Fetching details"
            );

            match self.client.get_anime_full(anime.mal_id).await {
                Ok(full) => {
                    enriched.push(full);
                    stats.details_enriched += 1;
                }
                Err(e) => {
                    warn!(
                        mal_id = anime.mal_id,
                        error = %e,
                        "Failed to fetch details, skipping entry"
                    );
                    stats.detail_failures += 1;
                }
            }

            sleep(self.inter_item_delay()).await;
        }

        enriched
    }

    /// Fetch reviews for the first few entries into one flat collection.
    async fn review_pass(&self, top_anime: &[Anime], stats: &mut CollectorStats) -> Vec<Review> {
        let limit = self.settings.review_anime_limit.min(top_anime.len());
        info!(limit, per_entry = self.settings.reviews_per_anime, "Collecting reviews");

        let mut all_reviews = Vec::new();
        for (idx, anime) in top_anime.iter().take(limit).enumerate() {
            info!(
                progress = format!("{}/{}", idx + 1, limit),
                mal_id = anime.mal_id,
                title = %anime.title,
                "Fetching reviews"
            );

            match self
                .client
                .get_anime_reviews(anime.mal_id, self.settings.reviews_per_anime)
                .await
            {
                Ok(reviews) => {
                    stats.reviews_fetched += reviews.len();
                    all_reviews.extend(reviews);
                }
                Err(e) => {
                    warn!(
                        mal_id = anime.mal_id,
                        error = %e,
                        "Failed to fetch reviews, skipping entry"
                    );
                    stats.review_failures += 1;
                }
            }
        }

        all_reviews
    }

    fn inter_item_delay(&self) -> Duration {
        Duration::from_millis(self.settings.rate_limit_delay_ms)
    }
}
