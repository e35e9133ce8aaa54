//! Configuration module for Sumi-Serp
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use sumi_serp::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("serp.toml")).unwrap();
//! println!("Crawling {} keywords", config.keywords.len());
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, CrawlerConfig, EngineConfig, EnginePreset, OutputConfig, UserAgentConfig,
    DEFAULT_CHANNEL_CAPACITY, DEFAULT_MAX_PAGE_NUMBER, DEFAULT_MAX_RESULT_INDEX,
    DEFAULT_USER_AGENT,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
