//! DOM Operations Adapter
//!
//! Thin layer over the `dom_query` crate. Every page snapshot is parsed into a
//! `Document`; the helpers here give the rest of the crate one vocabulary for
//! attribute and text access, and compile CSS selectors without panicking on
//! malformed input.

pub use dom_query::{Document, Matcher, NodeId, Selection};

// === Parsing ===

/// Parse HTML string into document
#[inline]
#[must_use]
pub fn parse(html: &str) -> Document {
    Document::from(html)
}

/// Whole-document search scope.
///
/// html5ever always synthesizes an `<html>` element, so this is never empty
/// for a parsed document.
#[inline]
#[must_use]
pub fn document_scope(doc: &Document) -> Selection<'_> {
    doc.select("html")
}

// === Selector Compilation ===

/// Compile a CSS selector, returning `None` for malformed or unsupported syntax.
#[must_use]
pub fn compile(selector: &str) -> Option<Matcher> {
    Matcher::new(selector).ok()
}

/// Query all descendants of `scope` matching `selector`.
///
/// Returns `None` when the selector does not compile.
#[must_use]
pub fn try_query<'a>(scope: &Selection<'a>, selector: &str) -> Option<Selection<'a>> {
    let matcher = compile(selector)?;
    Some(scope.select_matcher(&matcher))
}

/// Whether `scope` has at least one descendant matching `selector`.
#[must_use]
pub fn has_match(scope: &Selection, selector: &str) -> bool {
    try_query(scope, selector).is_some_and(|s| s.exists())
}

// === Attribute Operations ===

/// Get any attribute value
#[inline]
#[must_use]
pub fn get_attribute(sel: &Selection, name: &str) -> Option<String> {
    sel.attr(name).map(|s| s.to_string())
}

/// Get a non-blank attribute value, trimmed.
#[must_use]
pub fn non_empty_attribute(sel: &Selection, name: &str) -> Option<String> {
    sel.attr(name)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

// === Tag/Node Information ===

/// Get tag name (lowercase)
#[must_use]
pub fn tag_name(sel: &Selection) -> Option<String> {
    sel.nodes()
        .first()
        .and_then(dom_query::NodeRef::node_name)
        .map(|t| t.to_ascii_lowercase())
}

/// Identity of the first node in the selection within its document.
#[must_use]
pub fn node_id(sel: &Selection) -> Option<NodeId> {
    sel.nodes().first().map(|n| n.id)
}

// === Text Content ===

/// Get all text content of node and descendants
#[inline]
#[must_use]
pub fn text_content(sel: &Selection) -> String {
    sel.text().to_string()
}

/// Get outer HTML content
#[inline]
#[must_use]
pub fn outer_html(sel: &Selection) -> String {
    sel.html().to_string()
}

/// Iterate the selection's nodes as single-node selections, in document order.
pub fn each<'a>(sel: &Selection<'a>) -> impl Iterator<Item = Selection<'a>> + 'a {
    sel.nodes().to_vec().into_iter().map(Selection::from)
}

/// Ancestors of the first node, nearest first.
#[must_use]
pub fn ancestors<'a>(sel: &Selection<'a>) -> Vec<Selection<'a>> {
    let mut result = Vec::new();
    let mut current = sel.parent();
    while current.exists() {
        result.push(current.clone());
        current = current.parent();
    }
    result
}
