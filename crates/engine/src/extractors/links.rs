// ABOUTME: Joins possibly-relative hrefs against a source base URL.
// ABOUTME: Absolute URLs pass through unchanged so resolution is idempotent.

use url::Url;

use crate::record::NOT_AVAILABLE;

/// Opaque schemes returned untouched; any `scheme://` URL is also absolute.
const OPAQUE_PREFIXES: &[&str] = &["data:", "mailto:", "tel:"];

/// Resolves `raw_href` against `base_url`.
///
/// - Absolute URLs are returned as-is.
/// - Protocol-relative URLs (`//host/path`) take the base URL's scheme.
/// - Otherwise base (trailing `/` stripped) and href (leading `/` stripped) are
///   joined with exactly one slash. An empty base leaves the href unchanged.
/// - A missing or blank href yields the `N/A` sentinel.
pub fn resolve(raw_href: Option<&str>, base_url: &str) -> String {
    let href = match raw_href.map(str::trim) {
        Some(h) if !h.is_empty() && h != NOT_AVAILABLE => h,
        _ => return NOT_AVAILABLE.to_string(),
    };

    if is_absolute(href) {
        return href.to_string();
    }

    if let Some(rest) = href.strip_prefix("//") {
        let scheme = Url::parse(base_url)
            .map(|u| u.scheme().to_string())
            .unwrap_or_else(|_| "https".to_string());
        return format!("{}://{}", scheme, rest);
    }

    let base = base_url.trim().trim_end_matches('/');
    if base.is_empty() {
        return href.to_string();
    }
    format!("{}/{}", base, href.trim_start_matches('/'))
}

/// Returns true if the href carries a scheme this resolver leaves alone.
pub fn is_absolute(href: &str) -> bool {
    let lower = href.to_ascii_lowercase();
    if OPAQUE_PREFIXES.iter().any(|p| lower.starts_with(p)) {
        return true;
    }
    match lower.split_once("://") {
        Some((scheme, _)) => is_scheme(scheme),
        None => false,
    }
}

/// RFC 3986 scheme: a letter followed by letters, digits, `+`, `-` or `.`.
fn is_scheme(s: &str) -> bool {
    let mut chars = s.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "https://www.visitchattanooga.com";

    #[test]
    fn absolute_urls_pass_through() {
        let url = "https://www.cha.guide/events/jazz-night";
        assert_eq!(resolve(Some(url), BASE), url);
        assert_eq!(resolve(Some("HTTP://example.com/x"), BASE), "HTTP://example.com/x");
    }

    #[test]
    fn resolution_is_idempotent() {
        for href in ["/event/fall-fest/123/", "event/x", "https://a.example/b"] {
            let once = resolve(Some(href), BASE);
            assert_eq!(resolve(Some(&once), BASE), once);
        }
    }

    #[test]
    fn joins_with_a_single_slash() {
        assert_eq!(
            resolve(Some("/event/fall-fest/123/"), "https://www.visitchattanooga.com/"),
            "https://www.visitchattanooga.com/event/fall-fest/123/"
        );
        assert_eq!(
            resolve(Some("event/x"), BASE),
            "https://www.visitchattanooga.com/event/x"
        );
    }

    #[test]
    fn empty_base_keeps_href() {
        assert_eq!(resolve(Some("/events/1"), ""), "/events/1");
    }

    #[test]
    fn protocol_relative_takes_base_scheme() {
        assert_eq!(
            resolve(Some("//cdn.example.com/a.jpg"), "http://site.example"),
            "http://cdn.example.com/a.jpg"
        );
        assert_eq!(
            resolve(Some("//cdn.example.com/a.jpg"), ""),
            "https://cdn.example.com/a.jpg"
        );
    }

    #[test]
    fn any_scheme_with_authority_is_absolute() {
        let once = resolve(Some("//cdn.example.com/a.jpg"), "ftp://site.example");
        assert_eq!(once, "ftp://cdn.example.com/a.jpg");
        assert_eq!(resolve(Some(&once), "ftp://site.example"), once);
        assert!(is_absolute("webcal://cal.example/feed.ics"));
        assert!(!is_absolute("/go?next=https://x.example"));
    }

    #[test]
    fn missing_href_is_sentinel() {
        assert_eq!(resolve(None, BASE), NOT_AVAILABLE);
        assert_eq!(resolve(Some("   "), BASE), NOT_AVAILABLE);
        assert_eq!(resolve(Some(NOT_AVAILABLE), BASE), NOT_AVAILABLE);
    }

    #[test]
    fn data_uri_is_absolute() {
        assert!(is_absolute("data:image/png;base64,AAAA"));
        assert!(!is_absolute("/relative"));
    }
}
