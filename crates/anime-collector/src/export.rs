//! Tabular projection of fetched entities into CSV files.
//!
//! Row builders are pure: each takes an in-memory collection and produces
//! fixed-width rows in input order. `CsvExporter` pairs them with the output
//! files. Absent optional values render as zero values (`""` for text, `"0"`
//! for counts, `"0.00"` for the score) so every row has the full column set.

use crate::api::types::{Anime, Review, TagRef};
use shared::ExportPaths;
use std::path::Path;
use thiserror::Error;
use tracing::info;

/// Review bodies longer than this are cut and marked with `...`
pub const MAX_REVIEW_LEN: usize = 32_000;

/// Delimiter used to join review tags into one field
const TAG_DELIMITER: &str = "|";

/// Errors from the export step; any of these aborts the run
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to write output file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to emit CSV record: {0}")]
    Csv(#[from] csv::Error),
}

const BASIC_HEADER: [&str; 21] = [
    "mal_id",
    "title",
    "title_english",
    "title_japanese",
    "type",
    "source",
    "episodes",
    "status",
    "airing",
    "aired_from",
    "aired_to",
    "duration",
    "rating",
    "score",
    "scored_by",
    "rank",
    "popularity",
    "members",
    "favorites",
    "season",
    "year",
];

const GENRES_HEADER: [&str; 3] = ["anime_id", "genre_id", "genre_name"];

const STUDIOS_HEADER: [&str; 3] = ["anime_id", "studio_id", "studio_name"];

const STATISTICS_HEADER: [&str; 27] = [
    "anime_id",
    "watching",
    "completed",
    "on_hold",
    "dropped",
    "plan_to_watch",
    "total_stats",
    "score_1_votes",
    "score_1_percentage",
    "score_2_votes",
    "score_2_percentage",
    "score_3_votes",
    "score_3_percentage",
    "score_4_votes",
    "score_4_percentage",
    "score_5_votes",
    "score_5_percentage",
    "score_6_votes",
    "score_6_percentage",
    "score_7_votes",
    "score_7_percentage",
    "score_8_votes",
    "score_8_percentage",
    "score_9_votes",
    "score_9_percentage",
    "score_10_votes",
    "score_10_percentage",
];

const REVIEWS_HEADER: [&str; 9] = [
    "review_id",
    "anime_id",
    "anime_title",
    "reviewer_username",
    "score",
    "date",
    "is_spoiler",
    "tags",
    "review_text",
];

fn text(value: &Option<String>) -> String {
    value.clone().unwrap_or_default()
}

fn count<T: ToString>(value: Option<T>) -> String {
    value.map_or_else(|| "0".to_string(), |v| v.to_string())
}

/// Project one entry onto the basic table's 21 columns
pub fn basic_row(anime: &Anime) -> Vec<String> {
    vec![
        anime.mal_id.to_string(),
        anime.title.clone(),
        text(&anime.title_english),
        text(&anime.title_japanese),
        text(&anime.anime_type),
        text(&anime.source),
        count(anime.episodes),
        text(&anime.status),
        anime.airing.to_string(),
        text(&anime.aired.from),
        text(&anime.aired.to),
        text(&anime.duration),
        text(&anime.rating),
        format!("{:.2}", anime.score.unwrap_or(0.0)),
        count(anime.scored_by),
        count(anime.rank),
        count(anime.popularity),
        count(anime.members),
        count(anime.favorites),
        text(&anime.season),
        count(anime.year),
    ]
}

fn tag_rows<'a>(
    anime: &'a [Anime],
    tags: impl Fn(&'a Anime) -> &'a [TagRef] + 'a,
) -> Vec<Vec<String>> {
    anime
        .iter()
        .flat_map(|a| {
            tags(a).iter().map(move |tag| {
                vec![
                    a.mal_id.to_string(),
                    tag.mal_id.to_string(),
                    tag.name.clone(),
                ]
            })
        })
        .collect()
}

/// One row per (entry, genre) pair; entries without genres contribute none
pub fn genre_rows(anime: &[Anime]) -> Vec<Vec<String>> {
    tag_rows(anime, |a| a.genres.as_slice())
}

/// One row per (entry, studio) pair; entries without studios contribute none
pub fn studio_rows(anime: &[Anime]) -> Vec<Vec<String>> {
    tag_rows(anime, |a| a.studios.as_slice())
}

/// Project one entry onto the statistics table, or `None` if it carries no
/// snapshot. Score keys outside 1-10 or non-numeric are ignored.
pub fn statistics_row(anime: &Anime) -> Option<Vec<String>> {
    let stats = anime.statistics.as_ref()?;

    let mut votes = vec!["0".to_string(); 10];
    let mut percentages = vec!["0".to_string(); 10];

    for (key, bucket) in &stats.scores {
        let Ok(score) = key.parse::<usize>() else {
            continue;
        };
        if (1..=10).contains(&score) {
            votes[score - 1] = bucket.votes.to_string();
            percentages[score - 1] = format!("{:.2}", bucket.percentage);
        }
    }

    let mut row = vec![
        anime.mal_id.to_string(),
        stats.watching.to_string(),
        stats.completed.to_string(),
        stats.on_hold.to_string(),
        stats.dropped.to_string(),
        stats.plan_to_watch.to_string(),
        stats.total.to_string(),
    ];
    for i in 0..10 {
        row.push(votes[i].clone());
        row.push(percentages[i].clone());
    }

    Some(row)
}

/// Flatten embedded line breaks to spaces and bound the body length
pub fn sanitize_review_text(body: &str) -> String {
    let flat = body.replace('\n', " ").replace('\r', " ");

    match flat.char_indices().nth(MAX_REVIEW_LEN) {
        Some((cut, _)) => {
            let mut truncated = flat[..cut].to_string();
            truncated.push_str("...");
            truncated
        }
        None => flat,
    }
}

/// Project one review onto the reviews table
pub fn review_row(review: &Review) -> Vec<String> {
    vec![
        review.mal_id.to_string(),
        review.anime.mal_id.to_string(),
        review.anime.title.clone(),
        review.user.username.clone(),
        review.score.to_string(),
        text(&review.reviewed_at),
        review.is_spoiler.to_string(),
        review.tags.join(TAG_DELIMITER),
        sanitize_review_text(&review.review),
    ]
}

/// Writes the five tables into the output directory
pub struct CsvExporter {
    paths: ExportPaths,
}

impl CsvExporter {
    /// Create an exporter over the given output directory
    pub fn new(paths: ExportPaths) -> Self {
        Self { paths }
    }

    /// Create the output directory
    pub fn initialize(&self) -> Result<(), ExportError> {
        self.paths.create_dirs()?;
        Ok(())
    }

    fn write_table<I>(&self, path: &Path, header: &[&str], rows: I) -> Result<usize, ExportError>
    where
        I: IntoIterator<Item = Vec<String>>,
    {
        let mut writer = csv::Writer::from_path(path)?;
        writer.write_record(header)?;

        let mut written = 0;
        for row in rows {
            writer.write_record(&row)?;
            written += 1;
        }

        writer.flush()?;
        Ok(written)
    }

    /// Write the basic per-entry table
    pub fn export_basic(&self, anime: &[Anime]) -> Result<usize, ExportError> {
        let written = self.write_table(
            &self.paths.basic_csv(),
            &BASIC_HEADER,
            anime.iter().map(basic_row),
        )?;
        info!(rows = written, path = %self.paths.basic_csv().display(), "Exported basic table");
        Ok(written)
    }

    /// Write the entry-to-genre link table
    pub fn export_genres(&self, anime: &[Anime]) -> Result<usize, ExportError> {
        let written = self.write_table(&self.paths.genres_csv(), &GENRES_HEADER, genre_rows(anime))?;
        info!(rows = written, path = %self.paths.genres_csv().display(), "Exported genre links");
        Ok(written)
    }

    /// Write the entry-to-studio link table
    pub fn export_studios(&self, anime: &[Anime]) -> Result<usize, ExportError> {
        let written =
            self.write_table(&self.paths.studios_csv(), &STUDIOS_HEADER, studio_rows(anime))?;
        info!(rows = written, path = %self.paths.studios_csv().display(), "Exported studio links");
        Ok(written)
    }

    /// Write the statistics table; entries without a snapshot are skipped
    pub fn export_statistics(&self, anime: &[Anime]) -> Result<usize, ExportError> {
        let written = self.write_table(
            &self.paths.statistics_csv(),
            &STATISTICS_HEADER,
            anime.iter().filter_map(statistics_row),
        )?;
        info!(rows = written, path = %self.paths.statistics_csv().display(), "Exported statistics");
        Ok(written)
    }

    /// Write the flat reviews table
    pub fn export_reviews(&self, reviews: &[Review]) -> Result<usize, ExportError> {
        let written = self.write_table(
            &self.paths.reviews_csv(),
            &REVIEWS_HEADER,
            reviews.iter().map(review_row),
        )?;
        info!(rows = written, path = %self.paths.reviews_csv().display(), "Exported reviews");
        Ok(written)
    }
}
