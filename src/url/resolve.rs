use url::Url;

/// Query parameters that search engines use to wrap the real target of a result link
const REDIRECT_PARAMS: &[&str] = &["uddg", "url", "u"];

/// Resolves a result link href to an absolute URL
///
/// Returns None if the link should not be reported:
/// - empty or fragment-only hrefs
/// - javascript:, mailto:, tel:, data: schemes
/// - Invalid URLs
/// - Non-HTTP(S) URLs after resolution
///
/// Links pointing back to the search engine's own redirect endpoint
/// (e.g. `//duckduckgo.com/l/?uddg=...`) are unwrapped to their target.
///
/// # Examples
///
/// ```
/// use sumi_serp::url::resolve_result_link;
/// use url::Url;
///
/// let base = Url::parse("https://html.duckduckgo.com/html/?q=rust").unwrap();
/// let link = resolve_result_link(
///     "//duckduckgo.com/l/?uddg=https%3A%2F%2Fwww.rust-lang.org%2F&rut=abc",
///     &base,
/// );
/// assert_eq!(link, Some("https://www.rust-lang.org/".to_string()));
/// ```
pub fn resolve_result_link(href: &str, base_url: &Url) -> Option<String> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    if href.starts_with("javascript:")
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
        || href.starts_with("data:")
    {
        return None;
    }

    let absolute = base_url.join(href).ok()?;
    if absolute.scheme() != "http" && absolute.scheme() != "https" {
        return None;
    }

    match unwrap_redirect(&absolute, base_url) {
        Some(target) => Some(target),
        None => Some(absolute.to_string()),
    }
}

/// Extracts the wrapped target from a same-site redirect link
fn unwrap_redirect(link: &Url, base_url: &Url) -> Option<String> {
    if !same_site(link, base_url) {
        return None;
    }

    link.query_pairs()
        .find(|(key, _)| REDIRECT_PARAMS.contains(&key.as_ref()))
        .map(|(_, value)| value.into_owned())
        .and_then(|target| Url::parse(&target).ok())
        .filter(|target| target.scheme() == "http" || target.scheme() == "https")
        .map(|target| target.to_string())
}

/// True if both URLs share their registrable tail (`html.duckduckgo.com` ~ `duckduckgo.com`)
fn same_site(a: &Url, b: &Url) -> bool {
    match (a.host_str(), b.host_str()) {
        (Some(a), Some(b)) => {
            let a = a.to_lowercase();
            let b = b.to_lowercase();
            a == b || a.ends_with(&format!(".{}", b)) || b.ends_with(&format!(".{}", a))
        }
        _ => false,
    }
}
