use serde::Deserialize;
use std::collections::BTreeMap;

/// Desktop browser User-Agent sent with every search page request unless overridden
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_11_1) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/46.0.2490.86 Safari/537.36";

/// Default capacity of the channel between parse tasks and the reducer
pub const DEFAULT_CHANNEL_CAPACITY: usize = 64;

/// Default upper bound for configured page numbers
pub const DEFAULT_MAX_PAGE_NUMBER: u32 = 1000;

/// Default upper bound for the position of a result within one page
pub const DEFAULT_MAX_RESULT_INDEX: usize = 1000;

/// Main configuration structure for Sumi-Serp
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent", default)]
    pub user_agent: UserAgentConfig,
    pub engine: EngineConfig,
    #[serde(default)]
    pub output: OutputConfig,
    /// Keyword → ordered page numbers to crawl
    #[serde(default)]
    pub keywords: BTreeMap<String, Vec<u32>>,
}

impl Config {
    /// Total number of (keyword, page) tasks this configuration describes
    pub fn task_count(&self) -> usize {
        self.keywords.values().map(Vec::len).sum()
    }
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Maximum number of parse tasks running at once (unbounded when absent)
    #[serde(rename = "max-concurrent-parses", default)]
    pub max_concurrent_parses: Option<u32>,

    /// Capacity of the shared result channel
    #[serde(rename = "channel-capacity", default = "default_channel_capacity")]
    pub channel_capacity: usize,

    /// Largest page number accepted in `[keywords]`
    #[serde(rename = "max-page-number", default = "default_max_page_number")]
    pub max_page_number: u32,

    /// Largest result index the reducer will place
    #[serde(rename = "max-result-index", default = "default_max_result_index")]
    pub max_result_index: usize,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_concurrent_parses: None,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
            max_page_number: DEFAULT_MAX_PAGE_NUMBER,
            max_result_index: DEFAULT_MAX_RESULT_INDEX,
        }
    }
}

/// HTTP identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Value of the User-Agent header
    #[serde(default = "default_user_agent")]
    pub header: String,

    /// Whole-request timeout in seconds (no timeout when absent)
    #[serde(rename = "request-timeout-secs", default)]
    pub request_timeout_secs: Option<u64>,
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            header: default_user_agent(),
            request_timeout_secs: None,
        }
    }
}

/// Built-in search engine layouts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnginePreset {
    /// DuckDuckGo's JavaScript-free HTML endpoint
    DuckDuckGo,
    /// Bing web search
    Bing,
    /// Fully described by the `[engine]` section
    Custom,
}

/// Search engine page layout
///
/// Every field except `preset` overrides the preset's value when present.
#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    pub preset: EnginePreset,

    /// Search URL with `{keyword}`, `{page}` and `{offset}` placeholders
    #[serde(rename = "url-template", default)]
    pub url_template: Option<String>,

    /// Number of results a page holds, used to compute `{offset}`
    #[serde(rename = "results-per-page", default)]
    pub results_per_page: Option<u32>,

    /// Selector matching one result block
    #[serde(rename = "result-selector", default)]
    pub result_selector: Option<String>,

    /// Selector for the title, relative to the result block
    #[serde(rename = "title-selector", default)]
    pub title_selector: Option<String>,

    /// Selector for the element carrying the result `href`
    #[serde(rename = "link-selector", default)]
    pub link_selector: Option<String>,

    /// Selector for the description snippet
    #[serde(rename = "description-selector", default)]
    pub description_selector: Option<String>,
}

/// Output configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OutputConfig {
    /// Path to the markdown summary file
    #[serde(rename = "summary-path", default)]
    pub summary_path: Option<String>,

    /// Path to the JSON results file
    #[serde(rename = "json-path", default)]
    pub json_path: Option<String>,
}

fn default_channel_capacity() -> usize {
    DEFAULT_CHANNEL_CAPACITY
}

fn default_max_page_number() -> u32 {
    DEFAULT_MAX_PAGE_NUMBER
}

fn default_max_result_index() -> usize {
    DEFAULT_MAX_RESULT_INDEX
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}
