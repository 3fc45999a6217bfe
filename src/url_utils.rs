//! URL Utility Functions
//!
//! URL validation, resolution and cleanup for media links, cache keys and
//! platform detection.

use url::Url;

/// Query parameters that only track the visitor. Prefix `utm_` is matched
/// separately.
const TRACKING_PARAMS: &[&str] = &[
    "fbclid", "gclid", "dclid", "msclkid", "igshid", "igsh", "ref_src", "ref_url", "mc_cid", "mc_eid", "_ga",
    "si", "is_from_webapp", "sender_device",
];

/// Share-sheet parameters that do not change which page is shown.
const SHARE_PARAMS: &[&str] = &["s", "t", "_r", "_t", "lang", "img_index"];

/// Check if a string is a valid absolute http(s) URL.
///
/// # Returns
/// * `(is_absolute, parsed_url)` - Whether URL is absolute and the parsed URL if valid
#[must_use]
pub fn is_absolute_url(s: &str) -> (bool, Option<Url>) {
    let s = s.trim();

    if !s.starts_with("http://") && !s.starts_with("https://") {
        return (false, None);
    }

    match Url::parse(s) {
        Ok(url) if url.host().is_some() => (true, Some(url)),
        _ => (false, None),
    }
}

/// Convert a relative or absolute URL to absolute form.
///
/// Protocol-relative URLs (`//cdn.example/x.jpg`) take the base scheme.
///
/// # Returns
/// * The absolute URL string, or `None` when it cannot be resolved
#[must_use]
pub fn create_absolute_url(url_str: &str, base: &Url) -> Option<String> {
    let url_str = url_str.trim();

    if url_str.is_empty() {
        return None;
    }

    let (is_abs, parsed) = is_absolute_url(url_str);
    if is_abs {
        return parsed.map(String::from);
    }

    base.join(url_str)
        .ok()
        .filter(|u| matches!(u.scheme(), "http" | "https"))
        .map(String::from)
}

/// Extract the lowercase hostname from a URL, without a leading `www.` or `m.`.
///
/// # Returns
/// * The hostname, or empty string if invalid
#[must_use]
pub fn get_domain_url(url_str: &str) -> String {
    let (_, parsed) = is_absolute_url(url_str);

    parsed
        .and_then(|url| url.host_str().map(str::to_ascii_lowercase))
        .map(|host| {
            host.strip_prefix("www.")
                .or_else(|| host.strip_prefix("m."))
                .or_else(|| host.strip_prefix("mobile."))
                .map_or(host.clone(), str::to_string)
        })
        .unwrap_or_default()
}

/// Whether `url_str`'s host is one of `domains` or a subdomain of one.
///
/// # Example
///
/// ```rust
/// use rs_social_extract::url_utils::host_matches;
///
/// assert!(host_matches("https://mobile.x.com/jack", &["x.com", "twitter.com"]));
/// assert!(!host_matches("https://notx.com/jack", &["x.com"]));
/// ```
#[must_use]
pub fn host_matches(url_str: &str, domains: &[&str]) -> bool {
    let host = get_domain_url(url_str);
    if host.is_empty() {
        return false;
    }
    domains.iter().any(|domain| {
        host == *domain
            || host
                .strip_suffix(domain)
                .is_some_and(|prefix| prefix.ends_with('.'))
    })
}

/// Whether a query parameter is a known tracking parameter.
#[must_use]
pub fn is_tracking_param(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    lower.starts_with("utm_") || TRACKING_PARAMS.contains(&lower.as_str())
}

/// Remove tracking parameters from a parsed URL, dropping the query entirely
/// when nothing is left.
pub fn strip_tracking_params(url: &mut Url) {
    retain_query(url, |name| !is_tracking_param(name));
}

fn retain_query(url: &mut Url, keep: impl Fn(&str) -> bool) {
    if url.query().is_none() {
        return;
    }
    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(name, _)| keep(name))
        .map(|(name, value)| (name.into_owned(), value.into_owned()))
        .collect();

    if kept.is_empty() {
        url.set_query(None);
    } else {
        url.query_pairs_mut().clear().extend_pairs(kept);
    }
}

/// Absolutize a media URL and strip tracking parameters.
///
/// `data:` and `blob:` URLs are not addressable outside the page and yield
/// `None`, as does anything that is not http(s).
///
/// # Example
///
/// ```rust
/// use rs_social_extract::url_utils::clean_media_url;
/// use url::Url;
///
/// let base = Url::parse("https://x.com/jack/status/20").unwrap();
/// assert_eq!(
///     clean_media_url("/media/a.jpg?utm_source=x&name=large", &base).as_deref(),
///     Some("https://x.com/media/a.jpg?name=large"),
/// );
/// assert_eq!(clean_media_url("blob:https://x.com/1234", &base), None);
/// ```
#[must_use]
pub fn clean_media_url(raw: &str, base: &Url) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() || raw.starts_with("data:") || raw.starts_with("blob:") {
        return None;
    }
    let absolute = create_absolute_url(raw, base)?;
    let mut url = Url::parse(&absolute).ok()?;
    strip_tracking_params(&mut url);
    url.set_fragment(None);
    Some(url.to_string())
}

/// Stable key for a page: scheme, host and path, without tracking parameters
/// or fragment, and without a trailing slash.
///
/// Unparseable input is used verbatim.
#[must_use]
pub fn canonical_page_key(url_str: &str) -> String {
    let Ok(mut url) = Url::parse(url_str.trim()) else {
        return url_str.trim().to_string();
    };
    retain_query(&mut url, |name| !is_tracking_param(name) && !SHARE_PARAMS.contains(&name));
    url.set_fragment(None);
    let mut key = url.to_string();
    if key.ends_with('/') && url.path() != "/" {
        key.pop();
    }
    key
}

/// Path of an absolute URL, `/` when unparseable.
#[must_use]
pub fn url_path(url_str: &str) -> String {
    Url::parse(url_str).map_or_else(|_| "/".to_string(), |u| u.path().to_string())
}
