//! Anime metadata collector.
//!
//! Fetches the top-ranked anime list, per-entry statistics, and reviews from
//! the Jikan API v4 and flattens them into relational CSV tables.

pub mod api;
pub mod collector;
pub mod export;

pub use api::{ApiError, JikanClient};
pub use collector::{Collector, CollectorStats};
pub use export::{CsvExporter, ExportError};
