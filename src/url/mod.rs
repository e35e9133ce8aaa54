//! URL handling module for Sumi-Serp
//!
//! This module builds search page URLs from templates and turns result
//! links scraped from a page into absolute target URLs.

mod resolve;
mod template;

// Re-export main functions
pub use resolve::resolve_result_link;
pub use template::{expand_search_url, SearchUrlParams};
