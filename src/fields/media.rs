//! Media attachment extraction.

use dom_query::Selection;
use url::Url;

use super::{FieldError, FieldResult, Found};
use crate::dom;
use crate::result::{MediaItem, MediaType};
use crate::selector::SelectorGroup;
use crate::url_utils::clean_media_url;

/// Image URLs that are chrome, not content (emoji sprites, avatars).
const DECORATIVE_MARKERS: &[&str] = &["/emoji/", "profile_images", "/hashflags/", "abs.twimg.com/sticky", "s150x150"];

/// Extract media items under `root`.
///
/// Every element matched by any selector in `group` is considered (union,
/// first-seen order). URLs are absolutized against `base`, stripped of
/// tracking parameters and de-duplicated. Decorative images and inline
/// `data:`/`blob:` sources are skipped; a video whose only source is a `blob:`
/// falls back to its poster frame.
pub fn extract_media(root: &Selection, group: &SelectorGroup, base: &Url) -> FieldResult<Vec<MediaItem>> {
    let elements = group.all(root);
    if elements.is_empty() {
        return Err(FieldError::NotFound(group.field));
    }

    let mut items: Vec<MediaItem> = Vec::new();
    for element in &elements {
        let item = match dom::tag_name(element).as_deref() {
            Some("video") => video_item(element, base),
            Some("img") => image_item(element, base),
            Some("source") => dom::non_empty_attribute(element, "src")
                .and_then(|src| clean_media_url(&src, base))
                .map(|url| media(MediaType::Video, url)),
            _ => None,
        };
        if let Some(item) = item {
            if !items.iter().any(|existing| existing.url == item.url) {
                items.push(item);
            }
        }
    }

    let selector = group
        .first(root)
        .map(|r| r.selector)
        .unwrap_or_default();
    Ok(Found::new(items, selector))
}

fn media(media_type: MediaType, url: String) -> MediaItem {
    MediaItem {
        media_type,
        url,
        width: None,
        height: None,
        poster: None,
        alt: None,
    }
}

fn image_item(img: &Selection, base: &Url) -> Option<MediaItem> {
    let raw = dom::non_empty_attribute(img, "src")
        .filter(|src| !src.starts_with("data:"))
        .or_else(|| dom::non_empty_attribute(img, "data-src"))
        .or_else(|| dom::non_empty_attribute(img, "srcset").and_then(|s| best_srcset_candidate(&s)))?;

    if DECORATIVE_MARKERS.iter().any(|marker| raw.contains(marker)) {
        return None;
    }

    let url = clean_media_url(&raw, base)?;
    let media_type = if is_gif(&url) { MediaType::Gif } else { MediaType::Image };
    let mut item = media(media_type, url);
    item.width = dimension(img, "width");
    item.height = dimension(img, "height");
    item.alt = dom::non_empty_attribute(img, "alt").filter(|alt| alt != "Image");
    Some(item)
}

fn video_item(video: &Selection, base: &Url) -> Option<MediaItem> {
    let poster = dom::non_empty_attribute(video, "poster").and_then(|p| clean_media_url(&p, base));

    let source = dom::non_empty_attribute(video, "src").or_else(|| {
        dom::try_query(video, "source[src]")
            .and_then(|s| dom::each(&s).find_map(|node| dom::non_empty_attribute(&node, "src")))
    });
    let url = source
        .and_then(|src| clean_media_url(&src, base))
        .or_else(|| poster.clone())?;

    let media_type = if url.contains("tweet_video") || is_gif(&url) {
        MediaType::Gif
    } else {
        MediaType::Video
    };
    let mut item = media(media_type, url);
    item.poster = poster;
    item.width = dimension(video, "width");
    item.height = dimension(video, "height");
    Some(item)
}

fn is_gif(url: &str) -> bool {
    let lower = url.to_ascii_lowercase();
    lower.split(['?', '#']).next().is_some_and(|path| path.ends_with(".gif")) || lower.contains("format=gif")
}

fn dimension(sel: &Selection, attr: &str) -> Option<u32> {
    dom::non_empty_attribute(sel, attr).and_then(|v| v.trim_end_matches("px").parse().ok())
}

/// Pick the widest candidate from a `srcset` attribute.
fn best_srcset_candidate(srcset: &str) -> Option<String> {
    srcset
        .split(',')
        .filter_map(|candidate| {
            let mut parts = candidate.split_whitespace();
            let url = parts.next()?;
            let width = parts
                .next()
                .and_then(|d| d.strip_suffix('w').or_else(|| d.strip_suffix('x')))
                .and_then(|n| n.parse::<f64>().ok())
                .unwrap_or(1.0);
            Some((url, width))
        })
        .max_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(url, _)| url.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    static MEDIA: SelectorGroup = SelectorGroup::new(
        "media",
        &[r#"[data-testid="tweetPhoto"] img"#, r#"[data-testid="videoPlayer"] video"#, "img"],
    );

    fn base() -> Url {
        Url::parse("https://x.com/jack/status/20").unwrap()
    }

    #[test]
    fn test_images_are_absolutized_and_deduplicated() {
        let doc = dom::parse(
            r#"<article>
                <div data-testid="tweetPhoto"><img src="/media/a.jpg?utm_source=x" alt="Sunset"></div>
                <img src="https://x.com/media/a.jpg">
                <img src="https://abs.twimg.com/emoji/v2/svg/1f680.svg" alt="🚀">
            </article>"#,
        );
        let found = extract_media(&doc.select("article"), &MEDIA, &base()).unwrap();
        assert_eq!(found.value.len(), 1);
        assert_eq!(found.value[0].url, "https://x.com/media/a.jpg");
        assert_eq!(found.value[0].alt.as_deref(), Some("Sunset"));
        assert_eq!(found.value[0].media_type, MediaType::Image);
    }

    #[test]
    fn test_blob_video_falls_back_to_poster() {
        let doc = dom::parse(
            r#"<article><div data-testid="videoPlayer"><video src="blob:https://x.com/abc" poster="https://pbs.twimg.com/thumb.jpg"></video></div></article>"#,
        );
        let found = extract_media(&doc.select("article"), &MEDIA, &base()).unwrap();
        assert_eq!(found.value.len(), 1);
        assert_eq!(found.value[0].media_type, MediaType::Video);
        assert_eq!(found.value[0].url, "https://pbs.twimg.com/thumb.jpg");
        assert_eq!(found.value[0].poster.as_deref(), Some("https://pbs.twimg.com/thumb.jpg"));
    }

    #[test]
    fn test_gif_detection() {
        let doc = dom::parse(
            r#"<article><div data-testid="videoPlayer"><video src="https://video.twimg.com/tweet_video/abc.mp4"></video></div></article>"#,
        );
        let found = extract_media(&doc.select("article"), &MEDIA, &base()).unwrap();
        assert_eq!(found.value[0].media_type, MediaType::Gif);
    }

    #[test]
    fn test_srcset_picks_widest() {
        assert_eq!(
            best_srcset_candidate("/s.jpg 320w, /l.jpg 1080w, /m.jpg 640w").as_deref(),
            Some("/l.jpg")
        );
        assert_eq!(best_srcset_candidate("").as_deref(), None);
    }

    #[test]
    fn test_no_media_elements() {
        let doc = dom::parse("<article><p>text only</p></article>");
        assert_eq!(
            extract_media(&doc.select("article"), &MEDIA, &base()),
            Err(FieldError::NotFound("media"))
        );
    }
}
