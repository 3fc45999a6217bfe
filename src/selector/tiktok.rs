//! Micro-video Platform Selectors
//!
//! Selector groups for tiktok.com. `data-e2e` hooks come first; the
//! styled-component class fragments (`DivVideoInfoContainer` etc.) survive
//! most redesigns and serve as the second tier.

use super::SelectorGroup;

/// Elements that only exist in the real web app.
pub static INDICATORS: SelectorGroup = SelectorGroup::new(
    "indicator",
    &[
        "script#__UNIVERSAL_DATA_FOR_REHYDRATION__",
        "script#SIGI_STATE",
        r#"[data-e2e="browse-video-desc"]"#,
        r#"[data-e2e="video-desc"]"#,
        r#"[data-e2e="recommend-list-item-container"]"#,
        r#"[data-e2e="user-post-item"]"#,
    ],
);

/// Hydration payloads, newest format first.
pub static UNIVERSAL_DATA: &str = "script#__UNIVERSAL_DATA_FOR_REHYDRATION__";
pub static SIGI_STATE: &str = "script#SIGI_STATE";

/// One video (detail page or feed card).
pub static VIDEO: SelectorGroup = SelectorGroup::new(
    "video",
    &[
        r#"[data-e2e="video-detail"]"#,
        r#"div[class*="DivVideoDetailContainer"]"#,
        r#"div[class*="DivBrowserModeContainer"]"#,
        r#"[data-e2e="recommend-list-item-container"]"#,
        r#"div[class*="DivItemContainer"]"#,
        "main",
    ],
);

pub static DESCRIPTION: SelectorGroup = SelectorGroup::new(
    "text",
    &[
        r#"[data-e2e="browse-video-desc"]"#,
        r#"[data-e2e="video-desc"]"#,
        r#"h1[data-e2e="video-desc"]"#,
        r#"div[class*="DivDescriptionContentContainer"]"#,
        r#"span[class*="SpanText"]"#,
    ],
);

pub static HANDLE: SelectorGroup = SelectorGroup::new(
    "author",
    &[
        r#"[data-e2e="browse-username"]"#,
        r#"[data-e2e="video-author-uniqueid"]"#,
        r#"h3[data-e2e="video-author-uniqueid"]"#,
        r#"span[class*="SpanUniqueId"]"#,
    ],
);

pub static NICKNAME: SelectorGroup = SelectorGroup::new(
    "display_name",
    &[
        r#"[data-e2e="browser-nickname"] span:first-child"#,
        r#"[data-e2e="video-author-nickname"]"#,
        r#"span[class*="SpanNickName"]"#,
    ],
);

/// Profile link; the handle is the `/@user` path segment.
pub static AUTHOR_LINK: SelectorGroup = SelectorGroup::new(
    "author_link",
    &[r#"a[data-e2e="video-author-avatar"]"#, r#"a[href^="/@"]"#],
);

pub static VERIFIED: SelectorGroup = SelectorGroup::new(
    "verified",
    &[r#"[data-e2e="verify-badge"]"#, r#"svg[class*="StyledVerifyBadge"]"#, r#"[aria-label="Verified"]"#],
);

/// Upload date, shown as the last segment of the nickname line ("2d ago", "3-5").
pub static DATE: SelectorGroup = SelectorGroup::new(
    "timestamp",
    &[
        r#"[data-e2e="browser-nickname"] span:last-child"#,
        r#"span[data-e2e="video-publish-date"]"#,
        r#"span[class*="SpanOtherInfos"] span:last-child"#,
        "time[datetime]",
    ],
);

pub static LIKES: SelectorGroup = SelectorGroup::new(
    "likes",
    &[r#"[data-e2e="like-count"]"#, r#"[data-e2e="browse-like-count"]"#, r#"strong[data-e2e="like-count"]"#],
);

pub static COMMENTS: SelectorGroup = SelectorGroup::new(
    "comments",
    &[r#"[data-e2e="comment-count"]"#, r#"[data-e2e="browse-comment-count"]"#],
);

pub static SHARES: SelectorGroup =
    SelectorGroup::new("shares", &[r#"[data-e2e="share-count"]"#, r#"[data-e2e="undefined-count"]"#]);

pub static VIEWS: SelectorGroup =
    SelectorGroup::new("views", &[r#"[data-e2e="video-views"]"#, r#"strong[data-e2e="video-views"]"#]);

pub static MUSIC: SelectorGroup = SelectorGroup::new(
    "music",
    &[
        r#"[data-e2e="browse-music"] a"#,
        r#"h4[data-e2e="browse-music"]"#,
        r#"[data-e2e="video-music"]"#,
        r#"a[href*="/music/"]"#,
    ],
);

pub static MEDIA: SelectorGroup = SelectorGroup::new(
    "media",
    &["video", r#"[data-e2e="browse-video"] img"#, r#"img[class*="ImgPoster"]"#],
);

pub static HASHTAG_LINKS: SelectorGroup = SelectorGroup::new(
    "hashtags",
    &[r#"a[data-e2e="search-common-link"][href*="/tag/"]"#, r#"a[href*="/tag/"]"#],
);

pub static MENTION_LINKS: SelectorGroup = SelectorGroup::new(
    "mentions",
    &[r#"[data-e2e="browse-video-desc"] a[href^="/@"]"#, r#"[data-e2e="video-desc"] a[href^="/@"]"#],
);

// ============================================================
// COMMENTS
// ============================================================

pub static COMMENT: SelectorGroup = SelectorGroup::new(
    "comment",
    &[
        r#"div[class*="DivCommentItemContainer"]"#,
        r#"[data-e2e="comment-item"]"#,
        r#"div[class*="DivCommentObjectWrapper"]"#,
    ],
);

pub static COMMENT_TEXT: SelectorGroup = SelectorGroup::new(
    "comment_text",
    &[r#"[data-e2e="comment-level-1"]"#, r#"[data-e2e="comment-level-2"]"#, r#"p[class*="PCommentText"]"#],
);

pub static COMMENT_AUTHOR: SelectorGroup = SelectorGroup::new(
    "comment_author",
    &[r#"[data-e2e="comment-username-1"]"#, r#"a[href^="/@"]"#],
);

pub static COMMENT_LIKES: SelectorGroup = SelectorGroup::new(
    "comment_likes",
    &[r#"[data-e2e="comment-like-count"]"#, r#"span[class*="SpanCount"]"#],
);

pub static LOAD_MORE: SelectorGroup = SelectorGroup::new(
    "load_more",
    &[r#"[data-e2e="view-more-1"]"#, r#"[data-e2e="comment-load-more"]"#, r#"p[class*="PReplyActionText"]"#],
);

pub static LOADING: SelectorGroup = SelectorGroup::new(
    "loading",
    &[r#"[data-e2e="comment-loading"]"#, r#"div[class*="DivLoadingContainer"]"#, r#"[role="progressbar"]"#],
);
