//! Micro-video platform (tiktok.com).
//!
//! Video pages carry a rehydration payload that usually has everything; the
//! DOM pass fills what it lacks. Comments under the player become
//! [`ContentKind::Comment`] items pointing back at the video.

use dom_query::Selection;

use super::{outermost, ExtractContext, ExtractionStrategy, PageType, StrategyExtractor};
use crate::dom::{self, Document};
use crate::embedded::{json_ld, tiktok, EmbeddedItem};
use crate::error::Result;
use crate::fields::author::extract_author;
use crate::fields::engagement::{extract_count, extract_engagement, EngagementSelectors};
use crate::fields::text::extract_text;
use crate::fields::timestamp::extract_timestamp;
use crate::fields::{
    extract_hashtags, extract_media, extract_mentions, normalize_text, record, record_optional, synthetic_id,
    AuthorSelectors, TextRules,
};
use crate::pagination::PaginationControls;
use crate::patterns::TIKTOK_VIDEO_PATH;
use crate::result::{ContentKind, ExtractedContent, KindDetails, MusicInfo, Platform};
use crate::selector::tiktok::{
    AUTHOR_LINK, COMMENT, COMMENTS, COMMENT_AUTHOR, COMMENT_LIKES, COMMENT_TEXT, DATE, DESCRIPTION, HANDLE,
    HASHTAG_LINKS, INDICATORS, LIKES, LOADING, LOAD_MORE, MEDIA, MENTION_LINKS, MUSIC, NICKNAME, SHARES, VERIFIED,
    VIDEO, VIEWS,
};
use crate::selector::SelectorGroup;
use crate::throttle::SessionLimits;
use crate::url_utils::{host_matches, url_path};

const DOMAINS: &[&str] = &["tiktok.com"];

const AUTHOR: AuthorSelectors = AuthorSelectors {
    handle: Some(&HANDLE),
    display_name: Some(&NICKNAME),
    link: Some(&AUTHOR_LINK),
    verified: Some(&VERIFIED),
};

const COMMENT_AUTHOR_FIELDS: AuthorSelectors = AuthorSelectors {
    handle: None,
    display_name: Some(&COMMENT_AUTHOR),
    link: Some(&AUTHOR_LINK),
    verified: Some(&VERIFIED),
};

const ENGAGEMENT: EngagementSelectors = EngagementSelectors {
    likes: Some(&LIKES),
    comments: Some(&COMMENTS),
    shares: Some(&SHARES),
    views: Some(&VIEWS),
};

const LIMITS: SessionLimits = SessionLimits {
    default_cap: 300,
    per_kind: &[(ContentKind::Video, 150), (ContentKind::Comment, 500)],
};

/// Extractor for the micro-video platform.
pub type TikTokExtractor = StrategyExtractor<TikTokStrategy>;

#[derive(Debug, Clone, Copy, Default)]
pub struct TikTokStrategy;

/// `(user, id)` of the first video link under `root`.
fn video_link(root: &Selection) -> Option<(String, String)> {
    let links = dom::try_query(root, r#"a[href*="/video/"]"#)?;
    dom::each(&links)
        .filter_map(|link| dom::get_attribute(&link, "href"))
        .find_map(|href| {
            let path = if href.starts_with('/') { href } else { url_path(&href) };
            let caps = TIKTOK_VIDEO_PATH.captures(&path)?;
            Some((caps.get(1)?.as_str().to_string(), caps.get(2)?.as_str().to_string()))
        })
}

/// Split a sound label ("original sound - chef.mia") into title and artist.
fn parse_music(raw: &str) -> Option<MusicInfo> {
    let label = normalize_text(raw);
    let label = label.trim_start_matches('♬').trim();
    if label.is_empty() {
        return None;
    }
    Some(match label.rsplit_once(" - ") {
        Some((title, artist)) if !title.trim().is_empty() => MusicInfo {
            title: title.trim().to_string(),
            artist: Some(artist.trim().to_string()).filter(|a| !a.is_empty()),
        },
        _ => MusicInfo {
            title: label.to_string(),
            artist: None,
        },
    })
}

impl TikTokStrategy {
    fn comment(root: &Selection, video_id: &str, ctx: &ExtractContext) -> ExtractedContent {
        let mut comment = ExtractedContent::new(Platform::TikTok, ContentKind::Comment, String::new());

        if let Some(author) = record(&mut comment, extract_author(root, &COMMENT_AUTHOR_FIELDS)) {
            comment.author = author;
        }
        if let Some(text) = record(&mut comment, extract_text(root, &COMMENT_TEXT, TextRules::COMMENT)) {
            comment.text = text;
        }
        if let Some(likes) = record_optional(&mut comment, extract_count(root, &COMMENT_LIKES)) {
            comment.engagement.likes = Some(likes);
        }
        if let Ok(found) = extract_timestamp(root, &DATE, ctx.now) {
            comment.timestamp = Some(found.value.0);
            comment.metadata.timestamp_source = Some(found.value.1);
        }

        let is_reply = dom::has_match(root, r#"[data-e2e="comment-level-2"]"#)
            && !dom::has_match(root, r#"[data-e2e="comment-level-1"]"#);
        comment.details = KindDetails::Comment {
            parent_id: Some(video_id.to_string()),
            is_reply,
        };
        comment.hashtags = extract_hashtags(root, &HASHTAG_LINKS, &comment.text);
        comment.id = synthetic_id(&comment);
        comment
    }
}

impl ExtractionStrategy for TikTokStrategy {
    fn platform(&self) -> Platform {
        Platform::TikTok
    }

    fn matches_url(&self, url: &str) -> bool {
        host_matches(url, DOMAINS)
    }

    fn indicators(&self) -> &'static SelectorGroup {
        &INDICATORS
    }

    fn page_type(&self, url: &str) -> PageType {
        match TIKTOK_VIDEO_PATH.captures(&url_path(url)).and_then(|c| c.get(2)) {
            Some(id) => PageType::Item {
                kind: ContentKind::Video,
                id: Some(id.as_str().to_string()),
            },
            None => PageType::Timeline {
                kind: ContentKind::Video,
            },
        }
    }

    fn content_roots<'a>(&self, doc: &'a Document, _page: &PageType) -> Vec<Selection<'a>> {
        VIDEO.tier(&dom::document_scope(doc))
    }

    fn item_id(&self, root: &Selection, _ctx: &ExtractContext) -> Option<String> {
        video_link(root).map(|(_, id)| id)
    }

    fn extract_item(&self, root: &Selection, ctx: &ExtractContext) -> ExtractedContent {
        let link = video_link(root);
        let id = match &ctx.page {
            PageType::Item { id: Some(id), .. } => id.clone(),
            _ => link.as_ref().map(|(_, id)| id.clone()).unwrap_or_default(),
        };
        let mut content = ExtractedContent::new(Platform::TikTok, ContentKind::Video, id);

        if let Some(author) = record(&mut content, extract_author(root, &AUTHOR)) {
            content.author = author;
        }
        if content.author.handle.is_none() {
            content.author.handle = link.as_ref().map(|(user, _)| user.clone());
        }

        if let Some(text) = record(&mut content, extract_text(root, &DESCRIPTION, TextRules::VIDEO_DESCRIPTION)) {
            content.text = text;
        }

        if let Some((ts, source)) = record_optional(&mut content, extract_timestamp(root, &DATE, ctx.now)) {
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

        let music = MUSIC.text(root).and_then(|(label, selector)| {
            content.note_selector(&selector);
            parse_music(&label)
        });
        content.details = KindDetails::Video {
            music,
            duration_secs: None,
        };

        if let Some(handle) = &content.author.handle {
            if !content.id.is_empty() {
                content.url = Some(format!("https://www.tiktok.com/@{handle}/video/{}", content.id));
            }
        }
        content
    }

    fn extract_embedded(&self, doc: &Document, ctx: &ExtractContext) -> Result<Option<EmbeddedItem>> {
        match tiktok::decode(doc, &ctx.base, ctx.page.id())? {
            Some(item) => Ok(Some(item)),
            None => Ok(json_ld::decode(doc, &ctx.base)?.map(|mut item| {
                item.kind = ContentKind::Video;
                item
            })),
        }
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
        let Some(video_id) = ctx.page.id() else {
            return Vec::new();
        };
        outermost(COMMENT.tier(&dom::document_scope(doc)))
            .iter()
            .map(|root| Self::comment(root, video_id, ctx))
            .filter(ExtractedContent::is_usable)
            .collect()
    }
}
