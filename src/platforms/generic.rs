//! Any other page: one article per page, read with Readability.
//!
//! This is the catch-all behind the platform strategies. Without the
//! `readability` feature the main content container's visible text is used.

use dom_query::Selection;
use url::Url;

use super::{ExtractContext, ExtractionStrategy, PageType, StrategyExtractor};
use crate::dom::{self, Document};
use crate::embedded::{json_ld, EmbeddedItem};
use crate::error::Result;
use crate::fields::author::extract_author;
use crate::fields::text::{extract_text, validate_text};
use crate::fields::timestamp::extract_timestamp;
use crate::fields::{
    extract_hashtags, extract_media, normalize_text, record, record_optional, AuthorSelectors, Found, TextRules,
};
use crate::result::{ContentKind, ExtractedContent, KindDetails, Platform};
use crate::selector::SelectorGroup;
use crate::url_utils::{canonical_page_key, strip_tracking_params};

static DOCUMENT: SelectorGroup = SelectorGroup::new("document", &["html", "body"]);

static ARTICLE: SelectorGroup = SelectorGroup::new(
    "text",
    &["article", r#"[role="main"]"#, "main", r#"[itemprop="articleBody"]"#, "body"],
);

static TITLE: SelectorGroup = SelectorGroup::new("title", &["article h1", "h1", "title"]);

static BYLINE: SelectorGroup = SelectorGroup::new(
    "author",
    &[r#"[rel="author"]"#, r#"[itemprop="author"] [itemprop="name"]"#, r#"[itemprop="author"]"#, ".byline", ".author"],
);

static PUBLISHED: SelectorGroup = SelectorGroup::new(
    "timestamp",
    &[
        r#"meta[property="article:published_time"]"#,
        r#"meta[itemprop="datePublished"]"#,
        r#"time[itemprop="datePublished"]"#,
        "article time[datetime]",
        "time[datetime]",
    ],
);

static MEDIA: SelectorGroup = SelectorGroup::new("media", &["article img", "article video", "main img", "figure img"]);

static TAG_LINKS: SelectorGroup = SelectorGroup::new("hashtags", &[r#"a[rel="tag"]"#]);

const AUTHOR: AuthorSelectors = AuthorSelectors {
    handle: None,
    display_name: Some(&BYLINE),
    link: None,
    verified: None,
};

/// Extractor for arbitrary pages.
pub type GenericExtractor = StrategyExtractor<GenericStrategy>;

#[derive(Debug, Clone, Copy, Default)]
pub struct GenericStrategy;

/// Readable title and text of `root`, if Readability finds an article.
#[cfg(feature = "readability")]
fn readable(root: &Selection) -> Option<(Option<String>, String)> {
    use dom_smoothie::Readability;

    let doc = Document::from(dom::outer_html(root));
    let mut reader = Readability::with_document(doc, None, None).ok()?;
    let article = reader.parse().ok()?;
    let content_doc = Document::from(article.content.to_string());
    let text = crate::fields::text::visible_text(&content_doc.select("body"));
    let title = Some(normalize_text(&article.title.to_string())).filter(|t| !t.is_empty());
    (!text.is_empty()).then_some((title, text))
}

#[cfg(not(feature = "readability"))]
fn readable(_root: &Selection) -> Option<(Option<String>, String)> {
    None
}

impl ExtractionStrategy for GenericStrategy {
    fn platform(&self) -> Platform {
        Platform::Generic
    }

    fn matches_url(&self, url: &str) -> bool {
        Url::parse(url).is_ok_and(|u| matches!(u.scheme(), "http" | "https"))
    }

    fn indicators(&self) -> &'static SelectorGroup {
        &DOCUMENT
    }

    fn page_type(&self, url: &str) -> PageType {
        PageType::Item {
            kind: ContentKind::Article,
            id: Some(canonical_page_key(url)),
        }
    }

    fn content_roots<'a>(&self, doc: &'a Document, _page: &PageType) -> Vec<Selection<'a>> {
        DOCUMENT.tier(&dom::document_scope(doc))
    }

    fn extract_item(&self, root: &Selection, ctx: &ExtractContext) -> ExtractedContent {
        let id = ctx.page.id().unwrap_or_default().to_string();
        let mut content = ExtractedContent::new(Platform::Generic, ContentKind::Article, id);

        let (title, text) = match readable(root) {
            Some((title, text)) => {
                let outcome = validate_text(&text, "text", TextRules::ARTICLE).map(|found| Found {
                    selector: "readability".to_string(),
                    ..found
                });
                (title, record(&mut content, outcome).unwrap_or_default())
            }
            None => {
                let text = record(&mut content, extract_text(root, &ARTICLE, TextRules::ARTICLE)).unwrap_or_default();
                (None, text)
            }
        };
        content.text = text;

        let title = title.or_else(|| {
            TITLE.text(root).map(|(title, selector)| {
                content.note_selector(&selector);
                title
            })
        });

        if let Some(author) = record_optional(&mut content, extract_author(root, &AUTHOR)) {
            content.author = author;
        }
        if let Some((ts, source)) = record_optional(&mut content, extract_timestamp(root, &PUBLISHED, ctx.now)) {
            content.timestamp = Some(ts);
            content.metadata.timestamp_source = Some(source);
        }
        content.media = record_optional(&mut content, extract_media(root, &MEDIA, &ctx.base)).unwrap_or_default();
        content.hashtags = extract_hashtags(root, &TAG_LINKS, "");
        content.details = KindDetails::Article { title };
        let mut url = ctx.base.clone();
        strip_tracking_params(&mut url);
        url.set_fragment(None);
        content.url = Some(url.to_string());
        content
    }

    fn extract_embedded(&self, doc: &Document, ctx: &ExtractContext) -> Result<Option<EmbeddedItem>> {
        Ok(json_ld::decode(doc, &ctx.base)?.map(|mut item| {
            item.kind = ContentKind::Article;
            // Page identity, not the blob's identifier, keys generic pages.
            item.id = None;
            item
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::Options;
    use crate::platforms::extract_from_document;
    use chrono::{TimeZone, Utc};

    const PARAGRAPH: &str = "Harbour officials said the new breakwater, finished two months ahead of schedule, \
        has already reduced the swell inside the marina during the last three winter storms. Fishing crews that \
        used to wait out rough weather at the northern pier now stay moored in the inner basin, and the ferry \
        operator expects fewer cancelled crossings this season.";

    fn page() -> String {
        format!(
            r#"<html><head><title>Breakwater finished early | Coastal Times</title>
            <meta property="article:published_time" content="2024-03-05T14:30:00Z"></head>
            <body><nav><a href="/">Home</a> <a href="/news">News</a></nav>
            <article><h1>Breakwater finished early</h1>
              <p class="byline">By <a rel="author" href="/staff/dana">Dana Reyes</a></p>
              <p>{PARAGRAPH}</p><p>{PARAGRAPH}</p><p>{PARAGRAPH}</p>
              <a rel="tag" href="/tag/harbour">harbour</a>
            </article>
            <footer>Copyright Coastal Times</footer></body></html>"#
        )
    }

    fn ctx(url: &str) -> ExtractContext {
        ExtractContext::new(&GenericStrategy, url, Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()).unwrap()
    }

    #[test]
    fn test_matches_any_web_page() {
        assert!(GenericStrategy.matches_url("https://news.example.org/a/b"));
        assert!(GenericStrategy.matches_url("http://localhost:8080/"));
        assert!(!GenericStrategy.matches_url("file:///etc/hosts"));
        assert!(!GenericStrategy.matches_url("not a url"));
    }

    #[test]
    fn test_reads_article() {
        let html = page();
        let doc = dom::parse(&html);
        let ctx = ctx("https://news.example.org/2024/03/breakwater?utm_source=feed");
        let mut options = Options::default();
        options.features.use_embedded_data = false;
        let article = extract_from_document(&GenericStrategy, &doc, &ctx, &options).unwrap();

        assert_eq!(article.kind(), ContentKind::Article);
        assert_eq!(article.id, canonical_page_key("https://news.example.org/2024/03/breakwater"));
        assert!(article.text.contains("new breakwater"));
        assert!(!article.text.contains("Copyright"));
        assert_eq!(article.author.display_name.as_deref(), Some("Dana Reyes"));
        assert_eq!(article.timestamp.map(|t| t.timestamp()), Some(1_709_649_000));
        assert_eq!(article.hashtags, vec!["harbour"]);
        let KindDetails::Article { title: Some(title) } = &article.details else {
            panic!("expected a title");
        };
        assert!(title.contains("Breakwater finished early"));
    }

    #[test]
    fn test_json_ld_article_is_merged() {
        let html = page().replace(
            "</head>",
            r#"<script type="application/ld+json">{"@type": "NewsArticle", "identifier": "cms-991",
                "headline": "Breakwater finished early", "author": {"name": "Dana Reyes"}}</script></head>"#,
        );
        let doc = dom::parse(&html);
        let ctx = ctx("https://news.example.org/2024/03/breakwater");
        let article = extract_from_document(&GenericStrategy, &doc, &ctx, &Options::default()).unwrap();

        assert_eq!(article.id, canonical_page_key("https://news.example.org/2024/03/breakwater"));
        assert!(article.text.contains("new breakwater") || article.text.contains("Breakwater"));
        assert_eq!(article.author.display_name.as_deref(), Some("Dana Reyes"));
    }
}
