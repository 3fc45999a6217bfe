//! Short-post platform (twitter.com / x.com).
//!
//! Item pages are conversations: the tweet named by the URL is the main item
//! and every other tweet on the page becomes a thread entry. The tweet id is
//! read from the permalink wrapping the timestamp.

use dom_query::Selection;

use super::{outermost, ExtractContext, ExtractionStrategy, PageType, StrategyExtractor};
use crate::dom::{self, Document};
use crate::embedded::{json_ld, EmbeddedItem};
use crate::error::Result;
use crate::fields::author::extract_author;
use crate::fields::engagement::{extract_engagement, EngagementSelectors};
use crate::fields::text::extract_text;
use crate::fields::timestamp::extract_timestamp;
use crate::fields::{
    extract_hashtags, extract_media, extract_mentions, record, record_optional, synthetic_id, AuthorSelectors,
    TextRules,
};
use crate::pagination::PaginationControls;
use crate::patterns::TWEET_PATH;
use crate::result::{ContentKind, ExtractedContent, KindDetails, Platform};
use crate::selector::twitter::{
    AUTHOR_LINK, DISPLAY_NAME, HANDLE, HASHTAG_LINKS, INDICATORS, LIKES, LOADING, MEDIA, MENTION_LINKS, PERMALINK,
    QUOTED, REPLIES, REPLYING_TO, RETWEETS, SHOW_MORE, SOCIAL_CONTEXT, TEXT, TIME, TWEET, VERIFIED, VIEWS,
};
use crate::selector::{self, utils, SelectorGroup};
use crate::throttle::SessionLimits;
use crate::url_utils::{create_absolute_url, host_matches, url_path};

const DOMAINS: &[&str] = &["twitter.com", "x.com"];

const AUTHOR: AuthorSelectors = AuthorSelectors {
    handle: Some(&HANDLE),
    display_name: Some(&DISPLAY_NAME),
    link: Some(&AUTHOR_LINK),
    verified: Some(&VERIFIED),
};

const ENGAGEMENT: EngagementSelectors = EngagementSelectors {
    likes: Some(&LIKES),
    comments: Some(&REPLIES),
    shares: Some(&RETWEETS),
    views: Some(&VIEWS),
};

const LIMITS: SessionLimits = SessionLimits {
    default_cap: 300,
    per_kind: &[(ContentKind::Tweet, 200), (ContentKind::ThreadEntry, 500)],
};

/// Extractor for the short-post platform.
pub type TwitterExtractor = StrategyExtractor<TwitterStrategy>;

#[derive(Debug, Clone, Copy, Default)]
pub struct TwitterStrategy;

/// A permalink: author handle, tweet id, href.
struct Permalink {
    user: String,
    id: String,
    href: String,
}

/// `(user, id)` of a status link, relative or absolute.
fn status_of(href: &str) -> Option<(String, String)> {
    let path = if href.starts_with('/') {
        href.split(['?', '#']).next().unwrap_or_default().to_string()
    } else {
        url_path(href)
    };
    let caps = TWEET_PATH.captures(&path)?;
    Some((caps.get(1)?.as_str().to_string(), caps.get(2)?.as_str().to_string()))
}

fn permalink(root: &Selection) -> Option<Permalink> {
    PERMALINK.all(root).iter().find_map(|link| {
        let href = dom::get_attribute(link, "href")?;
        let (user, id) = status_of(&href)?;
        Some(Permalink { user, id, href })
    })
}

fn is_replying_to_line(sel: &Selection) -> bool {
    utils::tag(sel) == "div" && utils::trimmed_text(sel).starts_with("Replying to")
}

/// Id of a quoted tweet: the first status link under `root` that is not the
/// tweet itself.
fn quoted_id(root: &Selection, own_id: &str) -> Option<String> {
    if !QUOTED.matches(root) {
        return None;
    }
    dom::try_query(root, r#"a[href*="/status/"]"#)
        .into_iter()
        .flat_map(|links| dom::each(&links).collect::<Vec<_>>())
        .filter_map(|link| dom::get_attribute(&link, "href"))
        .filter_map(|href| status_of(&href))
        .map(|(_, id)| id)
        .find(|id| id != own_id)
}

impl TwitterStrategy {
    fn tweet_details(root: &Selection, id: &str) -> KindDetails {
        let is_retweet = SOCIAL_CONTEXT.text(root).is_some_and(|(text, _)| {
            let text = text.to_lowercase();
            text.contains("repost") || text.contains("retweet")
        });
        let is_reply = REPLYING_TO.matches(root) || selector::query(root, is_replying_to_line).is_some();
        KindDetails::Tweet {
            is_retweet,
            is_reply,
            quoted_id: quoted_id(root, id),
        }
    }
}

impl ExtractionStrategy for TwitterStrategy {
    fn platform(&self) -> Platform {
        Platform::Twitter
    }

    fn matches_url(&self, url: &str) -> bool {
        host_matches(url, DOMAINS)
    }

    fn indicators(&self) -> &'static SelectorGroup {
        &INDICATORS
    }

    fn page_type(&self, url: &str) -> PageType {
        match status_of(&url_path(url)) {
            Some((_, id)) => PageType::Item {
                kind: ContentKind::Tweet,
                id: Some(id),
            },
            None => PageType::Timeline {
                kind: ContentKind::Tweet,
            },
        }
    }

    fn content_roots<'a>(&self, doc: &'a Document, _page: &PageType) -> Vec<Selection<'a>> {
        TWEET.tier(&dom::document_scope(doc))
    }

    fn item_id(&self, root: &Selection, _ctx: &ExtractContext) -> Option<String> {
        permalink(root).map(|p| p.id)
    }

    fn extract_item(&self, root: &Selection, ctx: &ExtractContext) -> ExtractedContent {
        let link = permalink(root);
        let id = link.as_ref().map(|p| p.id.clone()).unwrap_or_default();
        let mut content = ExtractedContent::new(Platform::Twitter, ContentKind::Tweet, id.clone());

        if let Some(author) = record(&mut content, extract_author(root, &AUTHOR)) {
            content.author = author;
        }
        if content.author.handle.is_none() {
            content.author.handle = link.as_ref().map(|p| p.user.clone());
        }

        if let Some(text) = record(&mut content, extract_text(root, &TEXT, TextRules::SHORT_POST)) {
            content.text = text;
        }

        if let Some((ts, source)) = record(&mut content, extract_timestamp(root, &TIME, ctx.now)) {
            content.timestamp = Some(ts);
            content.metadata.timestamp_source = Some(source);
        }

        let (engagement, outcomes) = extract_engagement(root, &ENGAGEMENT);
        content.engagement = engagement;
        for outcome in outcomes {
            record_optional(&mut content, outcome);
        }

        content.media = record_optional(&mut content, extract_media(root, &MEDIA, &ctx.base)).unwrap_or_default();
        content.hashtags = extract_hashtags(root, &HASHTAG_LINKS, &content.text);
        content.mentions = extract_mentions(root, &MENTION_LINKS, &content.text);
        content.details = Self::tweet_details(root, &id);
        content.url = link.and_then(|p| create_absolute_url(&p.href, &ctx.base));
        content
    }

    fn extract_embedded(&self, doc: &Document, ctx: &ExtractContext) -> Result<Option<EmbeddedItem>> {
        Ok(json_ld::decode(doc, &ctx.base)?.map(|mut item| {
            item.kind = ContentKind::Tweet;
            item
        }))
    }

    fn session_limits(&self) -> SessionLimits {
        LIMITS
    }

    fn expansion(&self) -> Option<PaginationControls> {
        Some(PaginationControls {
            trigger: &SHOW_MORE,
            loading: &LOADING,
        })
    }

    fn extract_replies(&self, doc: &Document, ctx: &ExtractContext) -> Vec<ExtractedContent> {
        let Some(root_id) = ctx.page.id() else {
            return Vec::new();
        };
        outermost(TWEET.tier(&dom::document_scope(doc)))
            .iter()
            .filter_map(|root| {
                let mut entry = self.extract_item(root, ctx);
                if entry.id == root_id || !entry.is_usable() {
                    return None;
                }
                if entry.id.is_empty() {
                    entry.id = synthetic_id(&entry);
                }
                entry.details = KindDetails::ThreadEntry {
                    position: 0,
                    root_id: root_id.to_string(),
                };
                Some(entry)
            })
            .collect()
    }
}
