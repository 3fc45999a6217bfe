//! Photo and story platform (instagram.com).
//!
//! Posts and reels share one layout; stories are full-screen sections with
//! no caption requirement and a 24 hour lifetime. Embedded data comes from
//! the relay payload, else from the `og:description` summary.

use chrono::Duration;
use dom_query::Selection;

use super::{ExtractContext, ExtractionStrategy, PageType, StrategyExtractor};
use crate::dom::{self, Document};
use crate::embedded::{instagram, json_ld, EmbeddedItem};
use crate::error::Result;
use crate::fields::author::extract_author;
use crate::fields::engagement::{extract_engagement, EngagementSelectors};
use crate::fields::text::extract_text;
use crate::fields::timestamp::extract_timestamp;
use crate::fields::{
    extract_hashtags, extract_media, extract_mentions, normalize_text, record, record_optional, synthetic_id,
    AuthorSelectors, TextRules,
};
use crate::pagination::PaginationControls;
use crate::patterns::{INSTAGRAM_MEDIA_PATH, INSTAGRAM_STORY_PATH};
use crate::result::{ContentKind, ExtractedContent, KindDetails, MusicInfo, Platform};
use crate::selector::instagram::{
    AUTHOR_LINK, CAPTION, CAROUSEL_SLIDES, COMMENT, COMMENTS_COUNT, COMMENT_AUTHOR, COMMENT_TEXT, DISPLAY_NAME,
    HASHTAG_LINKS, INDICATORS, LIKES, LOADING, LOAD_MORE, LOCATION, MEDIA, MENTION_LINKS, MUSIC, POST, STORY, TIME,
    VERIFIED, VIEWS,
};
use crate::selector::SelectorGroup;
use crate::throttle::SessionLimits;
use crate::url_utils::{host_matches, url_path};

const DOMAINS: &[&str] = &["instagram.com"];

/// Stories disappear this long after posting.
const STORY_LIFETIME_HOURS: i64 = 24;

const AUTHOR: AuthorSelectors = AuthorSelectors {
    handle: None,
    display_name: Some(&DISPLAY_NAME),
    link: Some(&AUTHOR_LINK),
    verified: Some(&VERIFIED),
};

const COMMENT_AUTHOR_FIELDS: AuthorSelectors = AuthorSelectors {
    handle: None,
    display_name: None,
    link: Some(&COMMENT_AUTHOR),
    verified: Some(&VERIFIED),
};

const ENGAGEMENT: EngagementSelectors = EngagementSelectors {
    likes: Some(&LIKES),
    comments: Some(&COMMENTS_COUNT),
    shares: None,
    views: Some(&VIEWS),
};

const LIMITS: SessionLimits = SessionLimits {
    default_cap: 200,
    per_kind: &[
        (ContentKind::Post, 150),
        (ContentKind::Reel, 150),
        (ContentKind::Story, 50),
        (ContentKind::Comment, 500),
    ],
};

/// Extractor for the photo and story platform.
pub type InstagramExtractor = StrategyExtractor<InstagramStrategy>;

#[derive(Debug, Clone, Copy, Default)]
pub struct InstagramStrategy;

/// `(kind, shortcode)` of a post or reel path.
fn media_of(path: &str) -> Option<(ContentKind, String)> {
    let caps = INSTAGRAM_MEDIA_PATH.captures(path)?;
    let kind = match caps.get(1)?.as_str() {
        "p" => ContentKind::Post,
        _ => ContentKind::Reel,
    };
    Some((kind, caps.get(2)?.as_str().to_string()))
}

/// First permalink under `root`.
fn media_link(root: &Selection) -> Option<(ContentKind, String)> {
    let links = dom::try_query(root, r#"a[href*="/p/"], a[href*="/reel/"], a[href*="/reels/"]"#)?;
    dom::each(&links)
        .filter_map(|link| dom::get_attribute(&link, "href"))
        .find_map(|href| {
            let path = if href.starts_with('/') { href } else { url_path(&href) };
            media_of(&path)
        })
}

/// Audio links read "artist · title".
fn parse_audio(raw: &str) -> Option<MusicInfo> {
    let label = normalize_text(raw);
    if label.is_empty() {
        return None;
    }
    Some(match label.split_once('·') {
        Some((artist, title)) if !title.trim().is_empty() => MusicInfo {
            title: title.trim().to_string(),
            artist: Some(artist.trim().to_string()).filter(|a| !a.is_empty()),
        },
        _ => MusicInfo {
            title: label,
            artist: None,
        },
    })
}

impl InstagramStrategy {
    fn kind_details(kind: ContentKind, root: &Selection, content: &mut ExtractedContent) -> KindDetails {
        match kind {
            ContentKind::Reel => KindDetails::Reel {
                music: MUSIC.text(root).and_then(|(label, selector)| {
                    content.note_selector(&selector);
                    parse_audio(&label)
                }),
            },
            ContentKind::Story => KindDetails::Story {
                expires_at: content
                    .timestamp
                    .map(|ts| ts + Duration::hours(STORY_LIFETIME_HOURS)),
            },
            _ => {
                let slides = CAROUSEL_SLIDES.tier(root).len();
                KindDetails::Post {
                    location: LOCATION.text(root).map(|(name, selector)| {
                        content.note_selector(&selector);
                        name
                    }),
                    carousel_len: if slides > 1 { slides } else { 0 },
                }
            }
        }
    }

    fn comment(root: &Selection, post_id: &str, ctx: &ExtractContext) -> ExtractedContent {
        let mut comment = ExtractedContent::new(Platform::Instagram, ContentKind::Comment, String::new());

        if let Some(author) = record(&mut comment, extract_author(root, &COMMENT_AUTHOR_FIELDS)) {
            comment.author = author;
        }
        if let Some(text) = record(&mut comment, extract_text(root, &COMMENT_TEXT, TextRules::COMMENT)) {
            comment.text = text;
        }
        if let Ok(found) = extract_timestamp(root, &TIME, ctx.now) {
            comment.timestamp = Some(found.value.0);
            comment.metadata.timestamp_source = Some(found.value.1);
        }

        // Replies sit in a list nested inside the parent comment's list.
        let list_depth = dom::ancestors(root)
            .iter()
            .filter(|a| dom::tag_name(a).as_deref() == Some("ul"))
            .count();
        comment.details = KindDetails::Comment {
            parent_id: Some(post_id.to_string()),
            is_reply: list_depth >= 2,
        };
        comment.hashtags = extract_hashtags(root, &HASHTAG_LINKS, &comment.text);
        comment.mentions = extract_mentions(root, &MENTION_LINKS, &comment.text);
        comment.id = synthetic_id(&comment);
        comment
    }
}

impl ExtractionStrategy for InstagramStrategy {
    fn platform(&self) -> Platform {
        Platform::Instagram
    }

    fn matches_url(&self, url: &str) -> bool {
        host_matches(url, DOMAINS)
    }

    fn indicators(&self) -> &'static SelectorGroup {
        &INDICATORS
    }

    fn page_type(&self, url: &str) -> PageType {
        let path = url_path(url);
        if let Some(caps) = INSTAGRAM_STORY_PATH.captures(&path) {
            return PageType::Item {
                kind: ContentKind::Story,
                id: caps.get(2).map(|m| m.as_str().to_string()),
            };
        }
        match media_of(&path) {
            Some((kind, code)) => PageType::Item { kind, id: Some(code) },
            None => PageType::Timeline {
                kind: ContentKind::Post,
            },
        }
    }

    fn content_roots<'a>(&self, doc: &'a Document, page: &PageType) -> Vec<Selection<'a>> {
        let scope = dom::document_scope(doc);
        match page.kind() {
            ContentKind::Story => STORY.tier(&scope),
            _ => POST.tier(&scope),
        }
    }

    fn item_id(&self, root: &Selection, _ctx: &ExtractContext) -> Option<String> {
        media_link(root).map(|(_, code)| code)
    }

    fn extract_item(&self, root: &Selection, ctx: &ExtractContext) -> ExtractedContent {
        let link = media_link(root);
        let (kind, id) = match &ctx.page {
            PageType::Item { kind, id } => (*kind, id.clone().unwrap_or_default()),
            PageType::Timeline { kind } => link
                .clone()
                .unwrap_or((*kind, String::new())),
        };
        let mut content = ExtractedContent::new(Platform::Instagram, kind, id);

        if let Some(author) = record(&mut content, extract_author(root, &AUTHOR)) {
            content.author = author;
        }
        if content.author.handle.is_none() && kind == ContentKind::Story {
            content.author.handle = INSTAGRAM_STORY_PATH
                .captures(&url_path(&ctx.url))
                .and_then(|caps| caps.get(1))
                .map(|m| m.as_str().to_string());
        }

        let caption = extract_text(root, &CAPTION, TextRules::CAPTION);
        let caption = if kind == ContentKind::Story {
            record_optional(&mut content, caption)
        } else {
            record(&mut content, caption)
        };
        if let Some(text) = caption {
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
        content.details = Self::kind_details(kind, root, &mut content);

        content.url = match kind {
            _ if content.id.is_empty() => None,
            ContentKind::Reel => Some(format!("https://www.instagram.com/reel/{}/", content.id)),
            ContentKind::Story => Some(ctx.url.clone()),
            _ => Some(format!("https://www.instagram.com/p/{}/", content.id)),
        };
        content
    }

    fn extract_embedded(&self, doc: &Document, ctx: &ExtractContext) -> Result<Option<EmbeddedItem>> {
        let page_kind = ctx.page.kind();
        if page_kind == ContentKind::Story {
            return Ok(None);
        }
        if let Some(item) = instagram::decode(doc, &ctx.base)? {
            return Ok(Some(item));
        }
        let fallback = match instagram::decode_og_summary(doc, &ctx.base) {
            Some(item) => Some(item),
            None => json_ld::decode(doc, &ctx.base)?,
        };
        Ok(fallback.map(|mut item| {
            item.kind = page_kind;
            item
        }))
    }

    fn session_limits(&self) -> SessionLimits {
        LIMITS
    }

    fn expansion(&self) -> Option<PaginationControls> {
        Some(PaginationControls {
            trigger: &LOAD_MORE,
            loading: &LOADING,
        })
    }

    fn extract_replies(&self, doc: &Document, ctx: &ExtractContext) -> Vec<ExtractedContent> {
        let Some(post_id) = ctx.page.id() else {
            return Vec::new();
        };
        if ctx.page.kind() == ContentKind::Story {
            return Vec::new();
        }
        COMMENT
            .tier(&dom::document_scope(doc))
            .iter()
            .map(|root| Self::comment(root, post_id, ctx))
            .filter(ExtractedContent::is_usable)
            .collect()
    }
}
