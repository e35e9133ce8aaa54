use crate::config::types::{
    Config, CrawlerConfig, EngineConfig, EnginePreset, UserAgentConfig,
};
use crate::url::{expand_search_url, SearchUrlParams};
use crate::ConfigError;
use scraper::Selector;
use std::collections::BTreeMap;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_engine_config(&config.engine)?;
    validate_keywords(&config.keywords, config.crawler.max_page_number)?;
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if let Some(limit) = config.max_concurrent_parses {
        if limit < 1 {
            return Err(ConfigError::Validation(format!(
                "max_concurrent_parses must be >= 1 when set, got {}",
                limit
            )));
        }
    }

    if config.channel_capacity < 1 {
        return Err(ConfigError::Validation(format!(
            "channel_capacity must be >= 1, got {}",
            config.channel_capacity
        )));
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    if config.header.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user-agent header cannot be empty".to_string(),
        ));
    }

    if config.request_timeout_secs == Some(0) {
        return Err(ConfigError::Validation(
            "request_timeout_secs must be >= 1 when set".to_string(),
        ));
    }

    Ok(())
}

/// Validates the engine section
///
/// A custom engine must describe the whole page layout; presets only need
/// their overrides to be well formed.
fn validate_engine_config(config: &EngineConfig) -> Result<(), ConfigError> {
    if config.preset == EnginePreset::Custom {
        let missing: Vec<&str> = [
            ("url-template", config.url_template.is_none()),
            ("result-selector", config.result_selector.is_none()),
            ("title-selector", config.title_selector.is_none()),
            ("link-selector", config.link_selector.is_none()),
        ]
        .into_iter()
        .filter_map(|(name, absent)| absent.then_some(name))
        .collect();

        if !missing.is_empty() {
            return Err(ConfigError::Validation(format!(
                "custom engine is missing: {}",
                missing.join(", ")
            )));
        }
    }

    if let Some(template) = &config.url_template {
        validate_url_template(template)?;
    }

    if config.results_per_page == Some(0) {
        return Err(ConfigError::Validation(
            "results_per_page must be >= 1".to_string(),
        ));
    }

    for selector in [
        &config.result_selector,
        &config.title_selector,
        &config.link_selector,
        &config.description_selector,
    ]
    .into_iter()
    .flatten()
    {
        validate_selector(selector)?;
    }

    Ok(())
}

/// Validates a search URL template
fn validate_url_template(template: &str) -> Result<(), ConfigError> {
    if !template.contains("{keyword}") {
        return Err(ConfigError::Validation(format!(
            "url_template must contain a {{keyword}} placeholder, got '{}'",
            template
        )));
    }

    let sample = expand_search_url(
        template,
        &SearchUrlParams {
            keyword: "sample",
            page: 0,
            results_per_page: 10,
        },
    );

    let url = Url::parse(&sample)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid url_template '{}': {}", template, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "url_template '{}' must use http or https",
            template
        )));
    }

    Ok(())
}

/// Validates that a CSS selector compiles
fn validate_selector(selector: &str) -> Result<(), ConfigError> {
    Selector::parse(selector)
        .map(|_| ())
        .map_err(|e| ConfigError::InvalidSelector(format!("'{}': {:?}", selector, e)))
}

/// Validates keywords and their page lists
///
/// Page numbers index the dense output directly, so a huge page number means
/// a huge run of placeholders. They are bounded here.
fn validate_keywords(
    keywords: &BTreeMap<String, Vec<u32>>,
    max_page_number: u32,
) -> Result<(), ConfigError> {
    for (keyword, pages) in keywords {
        if keyword.trim().is_empty() {
            return Err(ConfigError::Validation(
                "keywords cannot be empty strings".to_string(),
            ));
        }

        if let Some(page) = pages.iter().find(|page| **page > max_page_number) {
            return Err(ConfigError::Validation(format!(
                "page {} for keyword '{}' exceeds max_page_number {}",
                page, keyword, max_page_number
            )));
        }
    }

    Ok(())
}
