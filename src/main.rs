//! Sumi-Serp main entry point
//!
//! This is the command-line interface for the Sumi-Serp search result crawler.

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use sumi_serp::config::{load_config_with_hash, Config};
use sumi_serp::crawler::{crawl, SearchParser};
use sumi_serp::output::{load_statistics, print_statistics, to_json_string, write_reports};
use sumi_serp::SelectorParser;
use tracing_subscriber::EnvFilter;

/// Sumi-Serp: a concurrent search result page crawler
///
/// Sumi-Serp fetches the configured result pages for every keyword, parses
/// them concurrently and reports the results ordered by keyword, page and
/// position on the page.
#[derive(Parser, Debug)]
#[command(name = "sumi-serp")]
#[command(version = "1.0.0")]
#[command(about = "A concurrent search result page crawler", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long, conflicts_with = "json")]
    dry_run: bool,

    /// Print the results as JSON on stdout instead of statistics
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    if cli.dry_run {
        handle_dry_run(&config)
    } else {
        handle_crawl(&config, &config_hash, cli.json).await
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("sumi_serp=info,warn"),
            1 => EnvFilter::new("sumi_serp=debug,info"),
            2 => EnvFilter::new("sumi_serp=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    // Logs go to stderr so --json output stays parseable
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: validates config and lists the planned requests
fn handle_dry_run(config: &Config) -> anyhow::Result<()> {
    let parser = SelectorParser::from_config(&config.engine)
        .context("failed to build the engine parser")?;

    println!("=== Sumi-Serp Dry Run ===\n");

    println!("Crawler Configuration:");
    match config.crawler.max_concurrent_parses {
        Some(limit) => println!("  Max concurrent parses: {}", limit),
        None => println!("  Max concurrent parses: unlimited"),
    }
    println!("  Channel capacity: {}", config.crawler.channel_capacity);
    println!("  Max page number: {}", config.crawler.max_page_number);
    println!("  Max result index: {}", config.crawler.max_result_index);

    println!("\nUser Agent:");
    println!("  Header: {}", config.user_agent.header);
    match config.user_agent.request_timeout_secs {
        Some(secs) => println!("  Request timeout: {}s", secs),
        None => println!("  Request timeout: none"),
    }

    println!("\nEngine: {:?}", config.engine.preset);

    println!("\nOutput:");
    println!(
        "  Summary: {}",
        config.output.summary_path.as_deref().unwrap_or("(none)")
    );
    println!(
        "  JSON: {}",
        config.output.json_path.as_deref().unwrap_or("(none)")
    );

    println!("\nKeywords ({}):", config.keywords.len());
    for (keyword, pages) in &config.keywords {
        println!("  - {} ({} pages)", keyword, pages.len());
        for page in pages {
            println!("    * page {}: {}", page, parser.search_url(keyword, *page));
        }
    }

    println!("\n✓ Configuration is valid");
    println!("✓ Would fetch {} result pages", config.task_count());

    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(config: &Config, config_hash: &str, json: bool) -> anyhow::Result<()> {
    tracing::info!(
        "Crawling {} keywords, {} pages",
        config.keywords.len(),
        config.task_count()
    );

    let report = crawl(config).await.context("crawl could not start")?;

    if report.is_complete() {
        tracing::info!("Crawl completed in {} ms", report.duration_millis());
    } else {
        tracing::warn!(
            "Crawl finished with {} failed pages in {} ms",
            report.failures.len(),
            report.duration_millis()
        );
        for failure in &report.failures {
            tracing::warn!("{}", failure);
        }
    }

    write_reports(&report, &config.output, Some(config_hash))
        .context("failed to write crawl output")?;

    if json {
        println!("{}", to_json_string(&report)?);
    } else {
        print_statistics(&load_statistics(&report));
    }

    Ok(())
}
