//! Author extraction: handle, display name, verified badge.

use dom_query::Selection;

use super::{normalize_text, FieldError, FieldResult, Found};
use crate::result::Author;
use crate::selector::SelectorGroup;

/// Path segments that look like handles but are site sections.
const RESERVED_PATHS: &[&str] = &[
    "home", "explore", "search", "notifications", "messages", "i", "settings", "hashtag", "tag", "music", "p",
    "reel", "reels", "tv", "stories", "accounts", "direct", "compose", "intent", "share", "login", "signup",
    "discover", "foryou", "following", "live", "about",
];

/// Selector groups for each author sub-field. Any may be absent.
#[derive(Debug, Clone, Copy, Default)]
pub struct AuthorSelectors {
    /// Element whose text is the handle ("@jack" or "jack").
    pub handle: Option<&'static SelectorGroup>,

    /// Element whose text is the display name.
    pub display_name: Option<&'static SelectorGroup>,

    /// Profile link whose href path is the handle.
    pub link: Option<&'static SelectorGroup>,

    /// Verified badge; presence means verified.
    pub verified: Option<&'static SelectorGroup>,
}

/// Extract author information under `root`.
///
/// The handle comes from the handle element, else from the profile link. An
/// author with neither handle nor display name is `NotFound`.
pub fn extract_author(root: &Selection, selectors: &AuthorSelectors) -> FieldResult<Author> {
    let mut author = Author::default();
    let mut used = None;

    if let Some((raw, selector)) = selectors.handle.and_then(|g| g.text(root)) {
        if let Some(handle) = clean_handle(&raw) {
            author.handle = Some(handle);
            used = Some(selector);
        }
    }

    if author.handle.is_none() {
        if let Some(group) = selectors.link {
            for link in group.all(root) {
                let Some(href) = link.attr("href") else {
                    continue;
                };
                if let Some(handle) = handle_from_href(&href) {
                    author.handle = Some(handle);
                    used = used.or_else(|| group.first(root).map(|r| r.selector));
                    break;
                }
            }
        }
    }

    if let Some((name, selector)) = selectors.display_name.and_then(|g| g.text(root)) {
        let name = clean_display_name(&name);
        if !name.is_empty() {
            author.display_name = Some(name);
            used = used.or(Some(selector));
        }
    }

    author.verified = selectors.verified.is_some_and(|g| g.matches(root));

    match used {
        Some(selector) if !author.is_empty() => Ok(Found::new(author, selector)),
        _ => Err(FieldError::NotFound("author")),
    }
}

/// Normalize a raw handle: strip `@`, reject characters handles cannot contain.
///
/// # Example
///
/// ```rust
/// use rs_social_extract::fields::clean_handle;
///
/// assert_eq!(clean_handle(" @jack "), Some("jack".to_string()));
/// assert_eq!(clean_handle("not a handle"), None);
/// ```
#[must_use]
pub fn clean_handle(raw: &str) -> Option<String> {
    let trimmed = normalize_text(raw);
    let handle = trimmed.trim_start_matches('@').trim_end_matches(['.', ',', ':', ')']);
    let valid = !handle.is_empty()
        && handle.chars().count() <= 30
        && handle.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.');
    valid.then(|| handle.to_string())
}

/// Extract a handle from a profile link (`/jack`, `/@jack`, `https://x.com/jack`).
///
/// Links into site sections (`/explore`, `/p/<code>`) and multi-segment paths
/// yield `None`.
#[must_use]
pub fn handle_from_href(href: &str) -> Option<String> {
    let path = match href.find("://") {
        Some(scheme_end) => {
            let rest = &href[scheme_end + 3..];
            &rest[rest.find('/')?..]
        }
        None => href,
    };
    let path = path.split(['?', '#']).next().unwrap_or_default();
    let mut segments = path.split('/').filter(|s| !s.is_empty());
    let first = segments.next()?;
    if segments.next().is_some() {
        return None;
    }
    let candidate = first.trim_start_matches('@');
    if RESERVED_PATHS.iter().any(|r| r.eq_ignore_ascii_case(candidate)) {
        return None;
    }
    clean_handle(candidate)
}

/// Display names come with badges and separators glued on.
fn clean_display_name(raw: &str) -> String {
    normalize_text(raw)
        .trim_end_matches(['·', '•'])
        .trim()
        .to_string()
}
