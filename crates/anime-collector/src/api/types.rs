//! Jikan API v4 response types.
//!
//! These types mirror the JSON the API serves. Fields the API may return as
//! `null` are `Option`; the projector decides how absences render.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Paginated response envelope for list endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageEnvelope<T> {
    pub data: Vec<T>,
    pub pagination: Pagination,
}

/// Response envelope for single-entity endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SingleEnvelope<T> {
    pub data: T,
}

/// Pagination metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pagination {
    pub last_visible_page: u32,
    pub has_next_page: bool,
    pub current_page: u32,
    #[serde(default)]
    pub items: Option<PaginationItems>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginationItems {
    pub count: u32,
    pub total: u32,
    pub per_page: u32,
}

/// One catalog entry (anime title) with its metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Anime {
    pub mal_id: u32,
    #[serde(default)]
    pub url: Option<String>,

    // Titles
    pub title: String,
    pub title_english: Option<String>,
    pub title_japanese: Option<String>,

    // Classification
    #[serde(rename = "type")]
    pub anime_type: Option<String>,
    pub source: Option<String>,
    pub episodes: Option<u32>,
    pub status: Option<String>,
    #[serde(default)]
    pub airing: bool,

    // Airing window
    #[serde(default)]
    pub aired: Aired,
    pub duration: Option<String>,
    pub rating: Option<String>,

    // Scores and rankings
    pub score: Option<f64>,
    pub scored_by: Option<u64>,
    pub rank: Option<u32>,
    pub popularity: Option<u32>,
    pub members: Option<u64>,
    pub favorites: Option<u64>,

    // Free text
    pub synopsis: Option<String>,
    pub background: Option<String>,

    // Season
    pub season: Option<String>,
    pub year: Option<u32>,

    // Relationship collections
    #[serde(default)]
    pub genres: Vec<TagRef>,
    #[serde(default)]
    pub studios: Vec<TagRef>,

    // Present only on detail responses
    #[serde(default)]
    pub statistics: Option<Statistics>,
}

/// Airing window (start/end as upstream date strings)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Aired {
    pub from: Option<String>,
    pub to: Option<String>,
}

/// Genre or studio stub attached to an entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TagRef {
    pub mal_id: u32,
    #[serde(rename = "type", default)]
    pub tag_type: String,
    pub name: String,
}

/// Point-in-time viewer statistics for an entry
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Statistics {
    #[serde(default)]
    pub watching: u64,
    #[serde(default)]
    pub completed: u64,
    #[serde(default)]
    pub on_hold: u64,
    #[serde(default)]
    pub dropped: u64,
    #[serde(default)]
    pub plan_to_watch: u64,
    #[serde(default)]
    pub total: u64,
    /// Sparse map from score ("1".."10") to its vote bucket
    #[serde(default)]
    pub scores: HashMap<String, ScoreBucket>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreBucket {
    pub votes: u64,
    pub percentage: f64,
}

/// One review, linked to its entry by `anime.mal_id`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Review {
    pub mal_id: u32,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(rename = "type", default)]
    pub review_type: Option<String>,
    #[serde(rename = "date")]
    pub reviewed_at: Option<String>,
    #[serde(default)]
    pub review: String,
    #[serde(default)]
    pub score: i64,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub is_spoiler: bool,
    pub user: Reviewer,
    pub anime: AnimeRef,
}

/// Review author
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reviewer {
    pub username: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub images: Option<UserImages>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserImages {
    #[serde(default)]
    pub jpg: Option<ImageSet>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageSet {
    pub image_url: Option<String>,
}

/// Entry back-reference carried on each review
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnimeRef {
    pub mal_id: u32,
    #[serde(default)]
    pub url: Option<String>,
    pub title: String,
}
