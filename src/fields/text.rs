//! Primary text extraction.
//!
//! Emoji on the short-post platform are rendered as `<img alt="😀">`, so the
//! text walk reads image alt text inline instead of relying on `.text()`.

use dom_query::{NodeRef, Selection};

use super::{normalize_text, FieldError, FieldResult, Found};
use crate::dom;
use crate::selector::SelectorGroup;

/// Validation rules for a primary text field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextRules {
    /// Texts shorter than this (in characters) are rejected.
    pub min_chars: usize,

    /// Texts longer than this are truncated and a note is recorded.
    pub max_chars: usize,
}

impl TextRules {
    /// Tweets: 280 characters, 4000 for long-form posts.
    pub const SHORT_POST: Self = Self { min_chars: 1, max_chars: 4000 };

    /// Video descriptions.
    pub const VIDEO_DESCRIPTION: Self = Self { min_chars: 1, max_chars: 4000 };

    /// Photo captions: 2200 characters.
    pub const CAPTION: Self = Self { min_chars: 1, max_chars: 2200 };

    /// Comments on any platform.
    pub const COMMENT: Self = Self { min_chars: 1, max_chars: 2200 };

    /// Readability article bodies.
    pub const ARTICLE: Self = Self { min_chars: 1, max_chars: 100_000 };
}

/// Extract the primary text of `root` via `group`.
///
/// Every candidate selector is tried in order; an element whose normalized
/// text is empty does not count as a match.
pub fn extract_text(root: &Selection, group: &SelectorGroup, rules: TextRules) -> FieldResult<String> {
    for selector in group.selectors {
        let Some(matched) = dom::try_query(root, selector) else {
            continue;
        };
        for node in dom::each(&matched) {
            let text = visible_text(&node);
            if !text.is_empty() {
                return validate_text(&text, group.field, rules).map(|found| Found {
                    selector: (*selector).to_string(),
                    ..found
                });
            }
        }
    }
    Err(FieldError::NotFound(group.field))
}

/// Validate already-normalized text against `rules`.
///
/// The returned [`Found`] carries an empty selector; callers fill it in.
pub fn validate_text(text: &str, field: &'static str, rules: TextRules) -> FieldResult<String> {
    let len = text.chars().count();
    if len < rules.min_chars {
        return Err(FieldError::invalid(field, format!("shorter than {} characters", rules.min_chars)));
    }
    if len > rules.max_chars {
        let truncated: String = text.chars().take(rules.max_chars).collect();
        return Ok(Found::new(truncated, String::new())
            .with_note(format!("{field}: truncated from {len} to {} characters", rules.max_chars)));
    }
    Ok(Found::new(text.to_string(), String::new()))
}

/// Normalized text of `sel`, with `<img alt>` emoji inlined and `<br>` read
/// as whitespace.
#[must_use]
pub fn visible_text(sel: &Selection) -> String {
    let mut out = String::new();
    for node in sel.nodes() {
        collect_text(node, &mut out);
    }
    normalize_text(&out)
}

fn collect_text(node: &NodeRef, out: &mut String) {
    if node.is_text() {
        out.push_str(&node.text());
        return;
    }
    if node.is_element() {
        match node.node_name().as_deref() {
            Some("img") => {
                if let Some(alt) = node.attr("alt") {
                    out.push_str(&alt);
                }
                return;
            }
            Some("br") => {
                out.push(' ');
                return;
            }
            Some("script" | "style" | "template") => return,
            _ => {}
        }
    }
    for child in node.children() {
        collect_text(&child, out);
    }
}
