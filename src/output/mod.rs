//! Output module for crawl reports
//!
//! This module handles:
//! - Generating markdown summaries of crawl results
//! - Exporting results as JSON
//! - Computing and printing crawl statistics

mod json;
mod markdown;
pub mod stats;

pub use json::{to_json_string, write_json_report, JsonReport};
pub use markdown::{format_markdown_summary, generate_markdown_summary};
pub use stats::{load_statistics, print_statistics, CrawlStatistics};

use crate::config::OutputConfig;
use crate::crawler::CrawlReport;
use std::path::Path;
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Writes every report file the output configuration asks for
///
/// # Returns
///
/// The paths that were written, in the order markdown, JSON.
pub fn write_reports(
    report: &CrawlReport,
    config: &OutputConfig,
    config_hash: Option<&str>,
) -> OutputResult<Vec<String>> {
    let mut written = Vec::new();

    if let Some(path) = &config.summary_path {
        generate_markdown_summary(report, config_hash, Path::new(path))?;
        tracing::info!("Markdown summary written to {}", path);
        written.push(path.clone());
    }

    if let Some(path) = &config.json_path {
        write_json_report(report, Path::new(path))?;
        tracing::info!("JSON results written to {}", path);
        written.push(path.clone());
    }

    Ok(written)
}
