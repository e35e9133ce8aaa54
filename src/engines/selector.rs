//! CSS selector driven search page parser
//!
//! Most search engines lay their result pages out the same way: a repeated
//! result block holding a title, a link and a snippet. [`SelectorParser`]
//! captures that layout with four selectors and a URL template, so a new
//! engine is a configuration change rather than new code.

use crate::config::{EngineConfig, EnginePreset};
use crate::crawler::{Document, ParseError, ResultSink, SearchParser, SearchResult};
use crate::url::{expand_search_url, resolve_result_link, SearchUrlParams};
use crate::ConfigError;
use scraper::{ElementRef, Selector};
use url::Url;

/// Layout of a search result page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineLayout {
    pub url_template: String,
    pub results_per_page: u32,
    pub result_selector: String,
    pub title_selector: String,
    pub link_selector: String,
    pub description_selector: Option<String>,
}

impl EngineLayout {
    /// DuckDuckGo's JavaScript-free HTML endpoint
    pub fn duckduckgo() -> Self {
        Self {
            url_template: "https://html.duckduckgo.com/html/?q={keyword}&s={offset}".to_string(),
            results_per_page: 30,
            result_selector: ".result.results_links.results_links_deep:not(.result--ad), .web-result:not(.result--ad)".to_string(),
            title_selector: ".result__a".to_string(),
            link_selector: ".result__a".to_string(),
            description_selector: Some(".result__snippet".to_string()),
        }
    }

    /// Bing web search
    pub fn bing() -> Self {
        Self {
            url_template: "https://www.bing.com/search?q={keyword}&first={offset}".to_string(),
            results_per_page: 10,
            result_selector: "li.b_algo".to_string(),
            title_selector: "h2".to_string(),
            link_selector: "h2 a".to_string(),
            description_selector: Some(".b_caption p, .b_lineclamp2".to_string()),
        }
    }

    /// Resolves the layout an engine section describes
    ///
    /// Preset values are overridden field by field; a custom engine must set
    /// every required field.
    pub fn from_config(config: &EngineConfig) -> Result<Self, ConfigError> {
        let base = match config.preset {
            EnginePreset::DuckDuckGo => Some(Self::duckduckgo()),
            EnginePreset::Bing => Some(Self::bing()),
            EnginePreset::Custom => None,
        };

        Ok(Self {
            url_template: pick(
                &config.url_template,
                base.as_ref().map(|b| &b.url_template),
                "url-template",
            )?,
            results_per_page: config
                .results_per_page
                .or(base.as_ref().map(|b| b.results_per_page))
                .unwrap_or(10),
            result_selector: pick(
                &config.result_selector,
                base.as_ref().map(|b| &b.result_selector),
                "result-selector",
            )?,
            title_selector: pick(
                &config.title_selector,
                base.as_ref().map(|b| &b.title_selector),
                "title-selector",
            )?,
            link_selector: pick(
                &config.link_selector,
                base.as_ref().map(|b| &b.link_selector),
                "link-selector",
            )?,
            description_selector: config
                .description_selector
                .clone()
                .or_else(|| base.and_then(|b| b.description_selector)),
        })
    }
}

/// A [`SearchParser`] configured by CSS selectors
#[derive(Debug, Clone)]
pub struct SelectorParser {
    url_template: String,
    results_per_page: u32,
    result: Selector,
    title: Selector,
    link: Selector,
    description: Option<Selector>,
}

impl SelectorParser {
    /// Compiles a layout into a parser
    pub fn new(layout: &EngineLayout) -> Result<Self, ConfigError> {
        Ok(Self {
            url_template: layout.url_template.clone(),
            results_per_page: layout.results_per_page,
            result: compile(&layout.result_selector)?,
            title: compile(&layout.title_selector)?,
            link: compile(&layout.link_selector)?,
            description: layout
                .description_selector
                .as_deref()
                .map(compile)
                .transpose()?,
        })
    }

    /// Builds a parser from the `[engine]` configuration section
    pub fn from_config(config: &EngineConfig) -> Result<Self, ConfigError> {
        Self::new(&EngineLayout::from_config(config)?)
    }

    /// Extracts one result from a result block
    ///
    /// Returns None for blocks without a title or a usable link.
    fn extract(&self, block: ElementRef<'_>, base_url: Option<&Url>) -> Option<SearchResult> {
        let title = block.select(&self.title).next().map(element_text)?;
        if title.is_empty() {
            return None;
        }

        let href = block
            .select(&self.link)
            .find_map(|element| element.value().attr("href"))?;
        let url = match base_url {
            Some(base) => resolve_result_link(href, base)?,
            None => Url::parse(href).ok()?.to_string(),
        };

        let description = self
            .description
            .as_ref()
            .and_then(|selector| block.select(selector).next())
            .map(element_text)
            .unwrap_or_default();

        Some(SearchResult {
            title,
            url,
            description,
        })
    }
}

impl SearchParser for SelectorParser {
    fn search_url(&self, keyword: &str, page: u32) -> String {
        expand_search_url(
            &self.url_template,
            &SearchUrlParams {
                keyword,
                page,
                results_per_page: self.results_per_page,
            },
        )
    }

    fn parse(
        &self,
        document: &Document,
        keyword: &str,
        page: u32,
        sink: &ResultSink,
    ) -> Result<(), ParseError> {
        let html = document.html();
        let base_url = document.base_url();

        let mut index = 0;
        let mut skipped = 0;
        for block in html.select(&self.result) {
            match self.extract(block, base_url.as_ref()) {
                Some(result) => {
                    sink.emit(index, result)?;
                    index += 1;
                }
                None => skipped += 1,
            }
        }

        tracing::debug!(keyword, page, results = index, skipped, "page extracted");
        Ok(())
    }
}

/// Takes the configured value, falling back to the preset's
fn pick(
    value: &Option<String>,
    fallback: Option<&String>,
    name: &str,
) -> Result<String, ConfigError> {
    value
        .clone()
        .or_else(|| fallback.cloned())
        .ok_or_else(|| ConfigError::Validation(format!("custom engine is missing {}", name)))
}

fn compile(selector: &str) -> Result<Selector, ConfigError> {
    Selector::parse(selector)
        .map_err(|e| ConfigError::InvalidSelector(format!("'{}': {:?}", selector, e)))
}

/// Element text with runs of whitespace collapsed
fn element_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}
