//! Hashtags and mentions.
//!
//! Links are authoritative when present; the text scan catches tags the
//! platform did not linkify (truncated captions, story stickers).

use dom_query::Selection;

use super::author::handle_from_href;
use super::clean_handle;
use crate::dom;
use crate::patterns::{HASHTAG, HASHTAG_HREF, MENTION};
use crate::selector::SelectorGroup;

/// Hashtags (without `#`) from hashtag links under `root` and from `text`.
///
/// De-duplicated case-insensitively, keeping the first spelling seen.
#[must_use]
pub fn extract_hashtags(root: &Selection, links: &SelectorGroup, text: &str) -> Vec<String> {
    let mut tags = Vec::new();

    for link in links.all(root) {
        let label = dom::text_content(&link);
        let label = label.trim();
        if let Some(tag) = label.strip_prefix('#').filter(|t| is_tag(t)) {
            push_unique(&mut tags, tag);
        } else if let Some(href) = dom::get_attribute(&link, "href") {
            if let Some(tag) = HASHTAG_HREF.captures(&href).and_then(|c| c.get(1)) {
                if is_tag(tag.as_str()) {
                    push_unique(&mut tags, tag.as_str());
                }
            }
        }
    }

    for tag in hashtags_in_text(text) {
        push_unique(&mut tags, &tag);
    }

    tags
}

/// Hashtags found by scanning plain text only.
#[must_use]
pub fn hashtags_in_text(text: &str) -> Vec<String> {
    let mut tags = Vec::new();
    for caps in HASHTAG.captures_iter(text) {
        if let Some(tag) = caps.get(1) {
            push_unique(&mut tags, tag.as_str());
        }
    }
    tags
}

/// Mentioned handles (without `@`) from profile links under `root` and from
/// `text`.
#[must_use]
pub fn extract_mentions(root: &Selection, links: &SelectorGroup, text: &str) -> Vec<String> {
    let mut mentions = Vec::new();

    for link in links.all(root) {
        let label = dom::text_content(&link);
        let label = label.trim();
        if !label.starts_with('@') {
            continue;
        }
        let handle = clean_handle(label).or_else(|| dom::get_attribute(&link, "href").and_then(|h| handle_from_href(&h)));
        if let Some(handle) = handle {
            push_unique(&mut mentions, &handle);
        }
    }

    for handle in mentions_in_text(text) {
        push_unique(&mut mentions, &handle);
    }

    mentions
}

/// Mentions found by scanning plain text only.
#[must_use]
pub fn mentions_in_text(text: &str) -> Vec<String> {
    let mut mentions = Vec::new();
    for caps in MENTION.captures_iter(text) {
        if let Some(handle) = caps.get(1).and_then(|m| clean_handle(m.as_str())) {
            push_unique(&mut mentions, &handle);
        }
    }
    mentions
}

fn is_tag(candidate: &str) -> bool {
    !candidate.is_empty() && candidate.chars().all(|c| c.is_alphanumeric() || c == '_')
}

fn push_unique(list: &mut Vec<String>, value: &str) {
    if !list.iter().any(|existing| existing.to_lowercase() == value.to_lowercase()) {
        list.push(value.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    static HASHTAG_LINKS: SelectorGroup = SelectorGroup::new("hashtags", &[r#"a[href*="/hashtag/"]"#]);
    static MENTION_LINKS: SelectorGroup = SelectorGroup::new("mentions", &[r#"a[href^="/"]"#]);

    #[test]
    fn test_hashtags_from_links_and_text() {
        let doc = dom::parse(
            r#"<div id="t">Loving <a href="/hashtag/RustLang?src=hashtag_click">#RustLang</a> and #rustlang and #WebAssembly</div>"#,
        );
        let root = doc.select("#t");
        let text = dom::text_content(&root);
        assert_eq!(extract_hashtags(&root, &HASHTAG_LINKS, &text), vec!["RustLang", "WebAssembly"]);
    }

    #[test]
    fn test_hashtag_from_href_when_label_is_not_a_tag() {
        let doc = dom::parse(r#"<div id="t"><a href="/hashtag/ocean">Ocean</a></div>"#);
        let root = doc.select("#t");
        assert_eq!(extract_hashtags(&root, &HASHTAG_LINKS, ""), vec!["ocean"]);
    }

    #[test]
    fn test_mentions_skip_non_handle_links() {
        let doc = dom::parse(
            r#"<div id="t">cc <a href="/alice">@alice</a> <a href="/explore">Explore</a> and @bob, mail x@y.com</div>"#,
        );
        let root = doc.select("#t");
        let text = dom::text_content(&root);
        assert_eq!(extract_mentions(&root, &MENTION_LINKS, &text), vec!["alice", "bob"]);
    }
}
