//! Helpers for the URL-like locations the client understands: deep links,
//! OAuth callback URLs and password-reset links.

use reqwest::Url;

/// Parse anything from a full URL down to a bare `token=...` query.
fn parse_location(input: &str) -> Option<Url> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }
    if let Ok(url) = Url::parse(input) {
        if url.has_host() {
            return Some(url);
        }
    }
    let base = Url::parse("http://localhost/").ok()?;
    if !input.starts_with('/') && !input.starts_with('?') && input.contains('=') {
        return base.join(&format!("?{}", input)).ok();
    }
    base.join(input).ok()
}

/// Value of query parameter `key`, percent-decoded. Empty values count as absent.
pub fn query_param(input: &str, key: &str) -> Option<String> {
    let url = parse_location(input)?;
    let value = url
        .query_pairs()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.trim().to_string());
    value.filter(|v| !v.is_empty())
}

/// Path component without query or fragment, "/" when there is none.
pub fn path_of(input: &str) -> String {
    parse_location(input)
        .map(|url| url.path().to_string())
        .unwrap_or_else(|| "/".to_string())
}
