//! Selector Resolution Engine
//!
//! Platforms rename their markup hooks without notice, so every logical field
//! is located through a [`SelectorGroup`]: an ordered list of alternative CSS
//! selectors running from the most specific and stable (data-attribute hooks)
//! to the most generic (semantic HTML, ARIA roles). Resolution tries the
//! candidates in order and silently skips any that fail to compile or match
//! nothing, which turns markup drift into graceful degradation instead of a
//! hard failure.
//!
//! Rule predicates (`Rule`) complement CSS for checks selectors cannot express,
//! such as "a span whose text starts with `@`".

use std::collections::HashSet;

use dom_query::Selection;
use tracing::trace;

use crate::dom;

pub mod instagram;
pub mod tiktok;
pub mod twitter;
pub mod utils;

/// An ordered list of alternative selectors for one logical field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectorGroup {
    /// Field name, used in metadata and non-fatal error messages.
    pub field: &'static str,

    /// Candidates, most specific first.
    pub selectors: &'static [&'static str],
}

/// A successful resolution.
#[derive(Debug, Clone)]
pub struct Resolved<'a> {
    /// The matched element (first in document order for the winning selector).
    pub selection: Selection<'a>,

    /// The selector that matched.
    pub selector: String,

    /// Position of the winning selector in its group.
    pub index: usize,
}

/// Return the first element matched by the first selector that matches.
///
/// Selectors are tried strictly in order: a later candidate is consulted only
/// when every earlier one is malformed or matches nothing under `scope`.
///
/// # Example
///
/// ```rust
/// use rs_social_extract::{dom, selector};
///
/// let doc = dom::parse(r#"<article><div role="heading">Generic</div><h1 data-testid="title">Hook</h1></article>"#);
/// let scope = dom::document_scope(&doc);
///
/// let resolved = selector::resolve_first(&scope, &[r#"[data-testid="title"]"#, "[role=heading]"]).unwrap();
/// assert_eq!(resolved.index, 0);
/// assert_eq!(dom::text_content(&resolved.selection), "Hook");
/// ```
#[must_use]
pub fn resolve_first<'a, S: AsRef<str>>(scope: &Selection<'a>, selectors: &[S]) -> Option<Resolved<'a>> {
    for (index, selector) in selectors.iter().enumerate() {
        let selector = selector.as_ref();
        let Some(matched) = dom::try_query(scope, selector) else {
            trace!(selector, "skipping malformed selector");
            continue;
        };
        if let Some(node) = matched.nodes().first() {
            return Some(Resolved {
                selection: Selection::from(*node),
                selector: selector.to_string(),
                index,
            });
        }
    }
    None
}

/// Return the de-duplicated union of every element matched by any selector.
///
/// Order is first-seen: all matches of the first selector in document order,
/// then new matches of the second, and so on.
#[must_use]
pub fn resolve_all<'a, S: AsRef<str>>(scope: &Selection<'a>, selectors: &[S]) -> Vec<Selection<'a>> {
    let mut seen = HashSet::new();
    let mut result = Vec::new();

    for selector in selectors {
        let Some(matched) = dom::try_query(scope, selector.as_ref()) else {
            continue;
        };
        for node in matched.nodes() {
            if seen.insert(node.id) {
                result.push(Selection::from(*node));
            }
        }
    }

    result
}

/// Return every element matched by the first selector that matches anything.
///
/// Container lookups use this so a broad late fallback (`main`) does not
/// swallow the specific matches of an earlier selector.
#[must_use]
pub fn resolve_tier<'a, S: AsRef<str>>(scope: &Selection<'a>, selectors: &[S]) -> Vec<Selection<'a>> {
    selectors
        .iter()
        .filter_map(|selector| dom::try_query(scope, selector.as_ref()))
        .find(|matched| !matched.nodes().is_empty())
        .map(|matched| matched.nodes().iter().map(|node| Selection::from(*node)).collect())
        .unwrap_or_default()
}

/// Resolve the first non-empty value of `attr`.
///
/// Unlike [`resolve_first`], an element that matches but lacks the attribute
/// does not stop the search.
#[must_use]
pub fn resolve_attr<S: AsRef<str>>(scope: &Selection, selectors: &[S], attr: &str) -> Option<(String, String)> {
    for selector in selectors {
        let selector = selector.as_ref();
        let Some(matched) = dom::try_query(scope, selector) else {
            continue;
        };
        for node in dom::each(&matched) {
            if let Some(value) = dom::non_empty_attribute(&node, attr) {
                return Some((value, selector.to_string()));
            }
        }
    }
    None
}

/// Resolve the first element whose normalized text is non-empty.
#[must_use]
pub fn resolve_text<S: AsRef<str>>(scope: &Selection, selectors: &[S]) -> Option<(String, String)> {
    for selector in selectors {
        let selector = selector.as_ref();
        let Some(matched) = dom::try_query(scope, selector) else {
            continue;
        };
        for node in dom::each(&matched) {
            let text = crate::fields::normalize_text(&dom::text_content(&node));
            if !text.is_empty() {
                return Some((text, selector.to_string()));
            }
        }
    }
    None
}

impl SelectorGroup {
    /// Create a group.
    #[must_use]
    pub const fn new(field: &'static str, selectors: &'static [&'static str]) -> Self {
        Self { field, selectors }
    }

    /// See [`resolve_first`].
    #[must_use]
    pub fn first<'a>(&self, scope: &Selection<'a>) -> Option<Resolved<'a>> {
        resolve_first(scope, self.selectors)
    }

    /// See [`resolve_all`].
    #[must_use]
    pub fn all<'a>(&self, scope: &Selection<'a>) -> Vec<Selection<'a>> {
        resolve_all(scope, self.selectors)
    }

    /// See [`resolve_tier`].
    #[must_use]
    pub fn tier<'a>(&self, scope: &Selection<'a>) -> Vec<Selection<'a>> {
        resolve_tier(scope, self.selectors)
    }

    /// See [`resolve_attr`].
    #[must_use]
    pub fn attr(&self, scope: &Selection, attr: &str) -> Option<(String, String)> {
        resolve_attr(scope, self.selectors, attr)
    }

    /// See [`resolve_text`].
    #[must_use]
    pub fn text(&self, scope: &Selection) -> Option<(String, String)> {
        resolve_text(scope, self.selectors)
    }

    /// Whether any candidate matches under `scope`.
    #[must_use]
    pub fn matches(&self, scope: &Selection) -> bool {
        self.first(scope).is_some()
    }
}

/// A selector rule that tests if a selection matches certain criteria.
pub type Rule = fn(&Selection) -> bool;

/// Query for first descendant matching the rule, in document order.
#[must_use]
pub fn query<'a>(root: &Selection<'a>, rule: Rule) -> Option<Selection<'a>> {
    for node in root.select("*").nodes() {
        let sel = Selection::from(*node);
        if rule(&sel) {
            return Some(sel);
        }
    }
    None
}
