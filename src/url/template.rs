use url::form_urlencoded;

/// Values substituted into a search URL template
#[derive(Debug, Clone, Copy)]
pub struct SearchUrlParams<'a> {
    /// Raw keyword, encoded during expansion
    pub keyword: &'a str,
    /// Page number as configured
    pub page: u32,
    /// Results per page, used to derive `{offset}`
    pub results_per_page: u32,
}

/// Expands a search URL template
///
/// Supported placeholders:
///
/// | Placeholder | Value |
/// |-------------|-------|
/// | `{keyword}` | form-urlencoded keyword (`rust lang` → `rust+lang`) |
/// | `{page}` | the page number |
/// | `{offset}` | `page * results_per_page` |
///
/// Unknown placeholders are left untouched.
///
/// # Examples
///
/// ```
/// use sumi_serp::url::{expand_search_url, SearchUrlParams};
///
/// let url = expand_search_url(
///     "https://example.com/search?q={keyword}&first={offset}",
///     &SearchUrlParams { keyword: "rust lang", page: 2, results_per_page: 10 },
/// );
/// assert_eq!(url, "https://example.com/search?q=rust+lang&first=20");
/// ```
pub fn expand_search_url(template: &str, params: &SearchUrlParams<'_>) -> String {
    let keyword: String = form_urlencoded::byte_serialize(params.keyword.as_bytes()).collect();
    let offset = u64::from(params.page) * u64::from(params.results_per_page);

    template
        .replace("{keyword}", &keyword)
        .replace("{page}", &params.page.to_string())
        .replace("{offset}", &offset.to_string())
}
