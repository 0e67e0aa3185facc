//! URL processing utilities.
//!
//! Provides consistent URL handling across the codebase:
//! - Link type detection (external vs local)
//! - Query string / fragment splitting
//! - Virtual root (`~/`) handling

/// Check if a link is external (has a URL scheme like http:, data:, etc.)
///
/// A valid scheme must:
/// - Have at least 2 characters before the colon (so `C:\` is not a scheme)
/// - Only contain ASCII alphanumeric or `+`, `-`, `.`
///
/// Protocol-relative URLs (`//cdn.example.com/x.css`) are external too.
///
/// # Examples
/// ```
/// use stitch::utils::path::is_external_link;
/// assert!(is_external_link("https://example.com"));
/// assert!(is_external_link("data:image/png;base64,AAAA"));
/// assert!(is_external_link("//cdn.example.com/a.css"));
/// assert!(!is_external_link("/about"));
/// assert!(!is_external_link("./file.txt"));
/// ```
#[inline]
pub fn is_external_link(link: &str) -> bool {
    if link.starts_with("//") {
        return true;
    }
    link.find(':').is_some_and(|pos| {
        pos > 1
            && link[..pos]
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
    })
}

/// Split a URL into its path and its `?query` / `#fragment` suffix.
///
/// The suffix keeps its leading delimiter and is returned untouched.
///
/// # Examples
/// ```
/// use stitch::utils::path::split_suffix;
/// assert_eq!(split_suffix("img/a.png?v=1#x"), ("img/a.png", "?v=1#x"));
/// assert_eq!(split_suffix("font.svg#icons"), ("font.svg", "#icons"));
/// assert_eq!(split_suffix("a.png"), ("a.png", ""));
/// ```
#[inline]
pub fn split_suffix(url: &str) -> (&str, &str) {
    match url.find(['?', '#']) {
        Some(pos) => url.split_at(pos),
        None => (url, ""),
    }
}

/// Strip the `~` application-root marker from a virtual path.
///
/// `~/css/a.css` and `/css/a.css` both become `/css/a.css`.
#[inline]
pub fn trim_virtual_root(path: &str) -> &str {
    path.strip_prefix('~').unwrap_or(path)
}

/// Append `key=value` to the query string of a URL, before any fragment.
///
/// Merges with an existing query (`&`) instead of replacing it.
pub fn append_query(url: &str, key: &str, value: &str) -> String {
    let (base, fragment) = match url.find('#') {
        Some(pos) => url.split_at(pos),
        None => (url, ""),
    };
    let separator = if base.contains('?') { '&' } else { '?' };
    format!("{base}{separator}{key}={value}{fragment}")
}
