//! Photo and Story Platform Selectors
//!
//! Selector groups for instagram.com. The web client ships obfuscated class
//! names that rotate often, so structural selectors (`article header a`,
//! `time[datetime]`) come first and the known class fragments are kept only
//! as late fallbacks.

use super::SelectorGroup;

/// Elements that only exist in the real web app.
pub static INDICATORS: SelectorGroup = SelectorGroup::new(
    "indicator",
    &[
        r#"meta[property="al:ios:app_name"][content="Instagram"]"#,
        r#"main[role="main"] article"#,
        r#"div[role="dialog"] article"#,
        r#"section[role="presentation"]"#,
        r#"script[type="application/json"][data-sjs]"#,
        "article header",
    ],
);

/// Relay payloads carrying media JSON.
pub static RELAY_SCRIPTS: &str = r#"script[type="application/json"][data-sjs]"#;

/// Summary meta tag ("N likes, M comments - user on date: caption").
pub static OG_DESCRIPTION: &str = r#"meta[property="og:description"]"#;

/// A post or reel.
pub static POST: SelectorGroup = SelectorGroup::new(
    "post",
    &[
        r#"div[role="dialog"] article"#,
        r#"main[role="main"] article"#,
        "article",
        r#"main[role="main"]"#,
    ],
);

/// A story frame.
pub static STORY: SelectorGroup = SelectorGroup::new(
    "story",
    &[r#"section[role="presentation"]"#, r#"div[role="dialog"] section"#, "section"],
);

pub static AUTHOR_LINK: SelectorGroup = SelectorGroup::new(
    "author",
    &[
        r#"header a[role="link"][href^="/"]"#,
        r#"header a[href^="/"]"#,
        r#"a[class*="notranslate"][href^="/"]"#,
    ],
);

pub static DISPLAY_NAME: SelectorGroup = SelectorGroup::new(
    "display_name",
    &[r#"header span[dir="auto"]"#, r#"header h2"#, r#"header h1"#],
);

pub static VERIFIED: SelectorGroup = SelectorGroup::new(
    "verified",
    &[r#"svg[aria-label="Verified"]"#, r#"[title="Verified"]"#, r#"span[class*="coreSpriteVerifiedBadge"]"#],
);

/// Caption: the first comment-like entry written by the author.
pub static CAPTION: SelectorGroup = SelectorGroup::new(
    "text",
    &[
        r#"h1[dir="auto"]"#,
        r#"ul li:first-child h1"#,
        r#"div[class*="_a9zs"] span"#,
        r#"span[class*="_ap3a"]"#,
        r#"div[data-testid="post-comment-root"] span"#,
    ],
);

pub static TIME: SelectorGroup = SelectorGroup::new(
    "timestamp",
    &[
        r#"a[href*="/p/"] time[datetime]"#,
        r#"a[href*="/reel/"] time[datetime]"#,
        "time[datetime]",
        "time",
    ],
);

pub static LIKES: SelectorGroup = SelectorGroup::new(
    "likes",
    &[
        r#"section a[href$="/liked_by/"] span"#,
        r#"a[href$="/liked_by/"]"#,
        r#"section span[class*="html-span"]"#,
        r#"section button span"#,
    ],
);

pub static COMMENTS_COUNT: SelectorGroup = SelectorGroup::new(
    "comments",
    &[r#"a[href$="/comments/"] span"#, r#"a[href$="/comments/"]"#],
);

pub static VIEWS: SelectorGroup =
    SelectorGroup::new("views", &[r#"span[class*="videoViews"]"#, r#"section span:has(> span[aria-label*="views"])"#]);

pub static LOCATION: SelectorGroup =
    SelectorGroup::new("location", &[r#"header a[href*="/explore/locations/"]"#, r#"a[href*="/explore/locations/"]"#]);

pub static MEDIA: SelectorGroup = SelectorGroup::new(
    "media",
    &[
        r#"div[class*="_aagv"] img"#,
        "article img[srcset]",
        "article video",
        r#"section img[decoding]"#,
        "section video",
        "img[srcset]",
        "video",
    ],
);

/// Carousel slides.
pub static CAROUSEL_SLIDES: SelectorGroup =
    SelectorGroup::new("carousel", &[r#"ul li[class*="_acaz"]"#, r#"div[role="presentation"] ul > li"#]);

pub static MUSIC: SelectorGroup =
    SelectorGroup::new("music", &[r#"a[href*="/reels/audio/"]"#, r#"a[href*="/audio/"]"#]);

pub static HASHTAG_LINKS: SelectorGroup = SelectorGroup::new("hashtags", &[r#"a[href*="/explore/tags/"]"#]);

pub static MENTION_LINKS: SelectorGroup = SelectorGroup::new(
    "mentions",
    &[r#"h1[dir="auto"] a[href^="/"]"#, r#"span[class*="_ap3a"] a[href^="/"]"#],
);

// ============================================================
// COMMENTS
// ============================================================

pub static COMMENT: SelectorGroup = SelectorGroup::new(
    "comment",
    &[r#"ul ul[class*="_a9ym"]"#, r#"div[data-testid="comment"]"#, "ul > ul"],
);

pub static COMMENT_AUTHOR: SelectorGroup =
    SelectorGroup::new("comment_author", &[r#"h3 a[href^="/"]"#, r#"a[href^="/"]"#]);

pub static COMMENT_TEXT: SelectorGroup = SelectorGroup::new(
    "comment_text",
    &[r#"div[class*="_a9zs"] span"#, r#"span[dir="auto"]"#],
);

pub static LOAD_MORE: SelectorGroup = SelectorGroup::new(
    "load_more",
    &[
        r#"button[aria-label="Load more comments"]"#,
        r#"li button:has(svg[aria-label="Load more comments"])"#,
        r#"button:has(svg[aria-label="Load more comments"])"#,
    ],
);

pub static LOADING: SelectorGroup = SelectorGroup::new(
    "loading",
    &[r#"[role="progressbar"]"#, r#"svg[aria-label="Loading..."]"#, r#"[data-visualcompletion="loading-state"]"#],
);
