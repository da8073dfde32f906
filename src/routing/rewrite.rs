//! Path sanitization, upstream URL resolution and redirect templating.

use url::{form_urlencoded, Url};

/// Placeholder replaced by the sanitized path in redirect templates.
pub const PATH_PLACEHOLDER: &str = "{path}";

/// Clean the part of the path left after the rule prefix.
///
/// Leading slashes are stripped, every `|` is removed, then runs of `/`
/// collapse to one.
pub fn sanitize_path(remainder: &str) -> String {
    let trimmed = remainder.trim_start_matches('/');

    let mut out = String::with_capacity(trimmed.len());
    for c in trimmed.chars().filter(|&c| c != '|') {
        if c == '/' && out.ends_with('/') {
            continue;
        }
        out.push(c);
    }
    out
}

/// Resolve a sanitized path against a rule target.
///
/// The path is always joined as a relative reference, so a path that looks
/// like a scheme or host stays on the target's origin. Leading slashes are
/// dropped; an empty path yields the target itself.
pub fn resolve_upstream(target: &Url, sanitized: &str) -> Result<Url, url::ParseError> {
    let relative = sanitized.trim_start_matches('/');
    if relative.is_empty() {
        return Ok(target.clone());
    }
    target.join(&format!("./{}", relative))
}

/// Whether the query asks for redirect mode (`raw=true`).
///
/// Only the first `raw` parameter counts.
pub fn is_raw_request(query: &[(String, String)]) -> bool {
    query
        .iter()
        .find(|(key, _)| key == "raw")
        .is_some_and(|(_, value)| value == "true")
}

/// Build the `Location` for redirect mode.
///
/// With a template, `{path}` is replaced by the sanitized path; otherwise
/// the resolved upstream URL is used. Every `raw` parameter is dropped and
/// the rest are appended in their original order.
pub fn redirect_location(
    template: Option<&str>,
    upstream: &Url,
    sanitized: &str,
    query: &[(String, String)],
) -> String {
    let mut location = match template {
        Some(template) => template.replacen(PATH_PLACEHOLDER, sanitized, 1),
        None => upstream.to_string(),
    };

    let mut forwarded = query.iter().filter(|(key, _)| key != "raw").peekable();
    if forwarded.peek().is_some() {
        let encoded = form_urlencoded::Serializer::new(String::new())
            .extend_pairs(forwarded)
            .finish();
        location.push(if location.contains('?') { '&' } else { '?' });
        location.push_str(&encoded);
    }

    location
}

/// Parse a raw query string into ordered key/value pairs.
pub fn parse_query(raw: Option<&str>) -> Vec<(String, String)> {
    raw.map(|q| form_urlencoded::parse(q.as_bytes()).into_owned().collect())
        .unwrap_or_default()
}
