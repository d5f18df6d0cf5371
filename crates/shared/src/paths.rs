//! File path utilities for the exported tables.
//!
//! All five CSV tables live in a single output directory; this module is the
//! one place their file names are defined.

use std::path::{Path, PathBuf};

/// File path manager for the CSV output directory
#[derive(Debug, Clone)]
pub struct ExportPaths {
    root: PathBuf,
}

impl ExportPaths {
    /// Create a new ExportPaths with the given output directory
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Get the output directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Basic per-entry table
    pub fn basic_csv(&self) -> PathBuf {
        self.root.join("anime_basic.csv")
    }

    /// Entry-to-genre link table
    pub fn genres_csv(&self) -> PathBuf {
        self.root.join("anime_genres.csv")
    }

    /// Entry-to-studio link table
    pub fn studios_csv(&self) -> PathBuf {
        self.root.join("anime_studios.csv")
    }

    /// Per-entry statistics table
    pub fn statistics_csv(&self) -> PathBuf {
        self.root.join("anime_statistics.csv")
    }

    /// Flat reviews table
    pub fn reviews_csv(&self) -> PathBuf {
        self.root.join("anime_reviews.csv")
    }

    /// Create the output directory
    pub fn create_dirs(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths() {
        let paths = ExportPaths::new("/data/anime_data");

        assert_eq!(
            paths.basic_csv(),
            PathBuf::from("/data/anime_data/anime_basic.csv")
        );
        assert_eq!(
            paths.statistics_csv(),
            PathBuf::from("/data/anime_data/anime_statistics.csv")
        );
        assert_eq!(
            paths.reviews_csv(),
            PathBuf::from("/data/anime_data/anime_reviews.csv")
        );
    }
}
