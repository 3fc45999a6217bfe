//! Short-post Platform Selectors
//!
//! Selector groups for twitter.com / x.com. The `data-testid` hooks are the
//! most stable surface the web client exposes; ARIA roles and `lang`/`dir`
//! attributes are the generic fallbacks once a hook is renamed.

use super::SelectorGroup;

// ============================================================
// PAGE DETECTION
// ============================================================

/// Elements that only exist in the real client (not in embedded widgets).
pub static INDICATORS: SelectorGroup = SelectorGroup::new(
    "indicator",
    &[
        r#"[data-testid="primaryColumn"]"#,
        r#"article[data-testid="tweet"]"#,
        r#"[data-testid="cellInnerDiv"]"#,
        r#"main[role="main"] article[role="article"]"#,
    ],
);

// ============================================================
// CONTENT ROOT
// ============================================================

/// One tweet.
pub static TWEET: SelectorGroup = SelectorGroup::new(
    "tweet",
    &[
        r#"article[data-testid="tweet"]"#,
        r#"[data-testid="tweet"]"#,
        r#"[data-testid="cellInnerDiv"] article"#,
        r#"article[role="article"]"#,
    ],
);

// ============================================================
// FIELDS
// ============================================================

/// Display name: the first link of the name block.
pub static DISPLAY_NAME: SelectorGroup = SelectorGroup::new(
    "display_name",
    &[
        r#"[data-testid="User-Name"] a:not([tabindex="-1"]) span"#,
        r#"[data-testid="User-Name"] > div:first-child span"#,
        r#"[data-testid="User-Names"] span"#,
    ],
);

/// Handle text ("@jack"), the second link of the name block.
pub static HANDLE: SelectorGroup = SelectorGroup::new(
    "handle",
    &[
        r#"[data-testid="User-Name"] a[tabindex="-1"] span"#,
        r#"[data-testid="User-Name"] a[tabindex="-1"]"#,
    ],
);

/// Profile links: the handle is the href path.
pub static AUTHOR_LINK: SelectorGroup = SelectorGroup::new(
    "author_link",
    &[
        r#"[data-testid="User-Name"] a[href^="/"][tabindex="-1"]"#,
        r#"[data-testid="User-Name"] a[href^="/"]"#,
        r#"a[role="link"][href^="/"]:not([href*="/status/"])"#,
    ],
);

/// Verified badge.
pub static VERIFIED: SelectorGroup = SelectorGroup::new(
    "verified",
    &[
        r#"[data-testid="icon-verified"]"#,
        r#"svg[aria-label="Verified account"]"#,
        r#"[aria-label="Verified account"]"#,
    ],
);

/// Tweet body text.
pub static TEXT: SelectorGroup = SelectorGroup::new(
    "text",
    &[
        r#"[data-testid="tweetText"]"#,
        r#"div[lang][dir="auto"]"#,
        r#"div[lang]"#,
    ],
);

/// Timestamp element carrying a `datetime` attribute.
pub static TIME: SelectorGroup = SelectorGroup::new(
    "timestamp",
    &[
        r#"a[href*="/status/"] time[datetime]"#,
        r#"time[datetime]"#,
        "time",
    ],
);

/// Permalink to the tweet itself.
pub static PERMALINK: SelectorGroup = SelectorGroup::new(
    "permalink",
    &[
        r#"a[href*="/status/"]:has(time)"#,
        r#"a[href*="/status/"][role="link"]"#,
        r#"a[href*="/status/"]"#,
    ],
);

pub static LIKES: SelectorGroup = SelectorGroup::new(
    "likes",
    &[r#"[data-testid="like"]"#, r#"[data-testid="unlike"]"#, r#"[aria-label$="Likes. Like"]"#],
);

pub static REPLIES: SelectorGroup = SelectorGroup::new(
    "comments",
    &[r#"[data-testid="reply"]"#, r#"[aria-label$="Replies. Reply"]"#],
);

pub static RETWEETS: SelectorGroup = SelectorGroup::new(
    "shares",
    &[
        r#"[data-testid="retweet"]"#,
        r#"[data-testid="unretweet"]"#,
        r#"[aria-label$="reposts. Repost"]"#,
    ],
);

pub static VIEWS: SelectorGroup = SelectorGroup::new(
    "views",
    &[
        r#"a[href$="/analytics"]"#,
        r#"[data-testid="app-text-transition-container"]"#,
        r#"[aria-label$="views. View post analytics"]"#,
    ],
);

/// Photos and video players.
pub static MEDIA: SelectorGroup = SelectorGroup::new(
    "media",
    &[
        r#"[data-testid="tweetPhoto"] img"#,
        r#"[data-testid="videoPlayer"] video"#,
        r#"[data-testid="tweetPhoto"] video"#,
        r#"div[aria-label="Image"] img"#,
        "video",
    ],
);

pub static HASHTAG_LINKS: SelectorGroup =
    SelectorGroup::new("hashtags", &[r#"a[href*="/hashtag/"]"#, r#"a[href^="/search?q=%23"]"#]);

pub static MENTION_LINKS: SelectorGroup = SelectorGroup::new(
    "mentions",
    &[r#"[data-testid="tweetText"] a[href^="/"]"#, r#"div[lang] a[href^="/"]"#],
);

/// Retweet banner ("X reposted").
pub static SOCIAL_CONTEXT: SelectorGroup =
    SelectorGroup::new("social_context", &[r#"[data-testid="socialContext"]"#]);

/// Quoted tweet card.
pub static QUOTED: SelectorGroup = SelectorGroup::new(
    "quoted",
    &[r#"div[role="link"][tabindex="0"] [data-testid="User-Name"]"#, r#"[data-testid="quoteTweet"]"#],
);

/// "Replying to @x" line. The text rule in the extractor covers markup
/// without a hook.
pub static REPLYING_TO: SelectorGroup = SelectorGroup::new(
    "replying_to",
    &[r#"[data-testid="replyingTo"]"#, r#"[aria-label^="Replying to"]"#],
);

// ============================================================
// THREAD PAGINATION
// ============================================================

/// Buttons revealing more of a conversation.
pub static SHOW_MORE: SelectorGroup = SelectorGroup::new(
    "show_more",
    &[
        r#"[data-testid="showMoreReplies"]"#,
        r#"[data-testid="cellInnerDiv"] [role="button"][data-testid="tweet-show-more"]"#,
        r#"button[aria-label^="Show more replies"]"#,
        r#"div[role="button"][aria-label^="Show replies"]"#,
    ],
);

pub static LOADING: SelectorGroup = SelectorGroup::new(
    "loading",
    &[r#"[role="progressbar"]"#, r#"[data-testid="loading"]"#, r#"svg circle[style*="stroke"]"#],
);
