//! Markdown summary generation
//!
//! This module generates human-readable markdown summaries of crawl results,
//! including statistics, per-keyword result tables and failure reports.

use crate::crawler::CrawlReport;
use crate::output::stats::load_statistics;
use crate::output::OutputResult;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Generates a markdown summary of a crawl report
///
/// # Arguments
///
/// * `report` - The finished crawl
/// * `config_hash` - Hash of the configuration the crawl ran with, if known
/// * `output_path` - Path where the markdown file should be written
pub fn generate_markdown_summary(
    report: &CrawlReport,
    config_hash: Option<&str>,
    output_path: &Path,
) -> OutputResult<()> {
    let markdown = format_markdown_summary(report, config_hash);

    let mut file = File::create(output_path)?;
    file.write_all(markdown.as_bytes())?;

    Ok(())
}

/// Formats a crawl report as markdown
pub fn format_markdown_summary(report: &CrawlReport, config_hash: Option<&str>) -> String {
    let stats = load_statistics(report);
    let mut md = String::new();

    md.push_str("# Sumi-Serp Crawl Summary\n\n");

    // Run metadata
    md.push_str("## Run Information\n\n");
    md.push_str(&format!("- **Started**: {}\n", report.started_at.to_rfc3339()));
    md.push_str(&format!("- **Finished**: {}\n", report.finished_at.to_rfc3339()));
    md.push_str(&format!("- **Duration**: {} ms\n", report.duration_millis()));
    if let Some(hash) = config_hash {
        md.push_str(&format!("- **Config Hash**: {}\n", hash));
    }
    md.push('\n');

    // Overall statistics
    md.push_str("## Overall Statistics\n\n");
    md.push_str(&format!("- **Pages Requested**: {}\n", stats.pages_requested));
    md.push_str(&format!("- **Pages Completed**: {}\n", stats.pages_completed));
    md.push_str(&format!("- **Pages Failed**: {}\n", stats.pages_failed));
    md.push_str(&format!("- **Results**: {}\n", stats.results));
    md.push_str(&format!("- **Placeholder Slots**: {}\n", stats.placeholders));
    md.push_str(&format!(
        "- **Success Rate**: {:.2}%\n\n",
        stats.success_rate()
    ));

    // Results per keyword
    for (keyword, pages) in report.nested() {
        md.push_str(&format!("## Results for \"{}\"\n\n", escape_cell(&keyword)));
        md.push_str("| Page | # | Title | URL |\n");
        md.push_str("|------|---|-------|-----|\n");

        for (page, results) in pages.iter().enumerate() {
            for (index, result) in results.iter().enumerate() {
                if result.is_placeholder() {
                    continue;
                }
                md.push_str(&format!(
                    "| {} | {} | {} | {} |\n",
                    page,
                    index,
                    escape_cell(&result.title),
                    escape_cell(&result.url)
                ));
            }
        }
        md.push('\n');
    }

    // Failure summary
    if !report.failures.is_empty() {
        md.push_str("## Failures\n\n");
        md.push_str("| Kind | Count |\n");
        md.push_str("|------|-------|\n");
        for (kind, count) in &stats.failures_by_kind {
            md.push_str(&format!("| {} | {} |\n", kind, count));
        }
        md.push('\n');

        md.push_str("| Keyword | Page | Kind | Message |\n");
        md.push_str("|---------|------|------|---------|\n");
        for failure in &report.failures {
            md.push_str(&format!(
                "| {} | {} | {} | {} |\n",
                escape_cell(&failure.keyword),
                failure.page,
                failure.kind,
                escape_cell(&failure.message)
            ));
        }
        md.push('\n');
    }

    md
}

/// Keeps table cells on one line and out of the column separators
fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|").replace(['\n', '\r'], " ")
}
