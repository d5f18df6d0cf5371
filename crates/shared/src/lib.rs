//! Shared library for the anime collector.
//!
//! This crate provides the pieces the binary crate depends on but that are
//! not collection logic themselves:
//! - Configuration management
//! - Logging infrastructure
//! - Output file path utilities

pub mod config;
pub mod logging;
pub mod paths;

// Re-export commonly used types
pub use config::Config;
pub use logging::LogConfig;
pub use paths::ExportPaths;
