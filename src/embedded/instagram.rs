//! Instagram relay payloads and the `og:description` summary.
//!
//! Post pages embed the media record in one of many `data-sjs` relay scripts,
//! under `xdt_api__v1__media__shortcode__web_info.items[0]`. The record is
//! located by key anywhere in the payload and then decoded into [`IgMedia`].
//!
//! Logged-out and crawler renders often ship only the summary meta tag:
//! `"1,234 likes, 56 comments - natgeo on March 5, 2024: "caption""`.

use chrono::Utc;
use dom_query::{Document, Selection};
use serde::Deserialize;
use serde_json::Value;
use url::Url;

use super::{epoch_seconds, EmbeddedItem, FlexNumber};
use crate::dom;
use crate::error::{Error, Result};
use crate::fields::{clean_handle, parse_engagement, parse_relative_timestamp};
use crate::patterns::INSTAGRAM_OG_SUMMARY;
use crate::result::{ContentKind, KindDetails, MediaItem, MediaType, MusicInfo};
use crate::selector::instagram::{OG_DESCRIPTION, RELAY_SCRIPTS};
use crate::url_utils::clean_media_url;

const MEDIA_KEY: &str = "xdt_api__v1__media__shortcode__web_info";

/// Media record as found in relay payloads.
#[derive(Debug, Clone, Deserialize)]
pub struct IgMedia {
    pub pk: Option<FlexNumber>,
    pub code: Option<String>,
    pub taken_at: Option<i64>,
    /// 1 image, 2 video, 8 carousel.
    pub media_type: Option<u8>,
    /// `clips` for reels.
    pub product_type: Option<String>,
    pub caption: Option<IgCaption>,
    pub user: Option<IgUser>,
    pub like_count: Option<FlexNumber>,
    pub comment_count: Option<FlexNumber>,
    pub play_count: Option<FlexNumber>,
    pub view_count: Option<FlexNumber>,
    pub image_versions2: Option<IgCandidates>,
    pub video_versions: Option<Vec<IgVersion>>,
    pub carousel_media: Option<Vec<IgMedia>>,
    pub location: Option<IgLocation>,
    pub clips_metadata: Option<IgClipsMetadata>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IgCaption {
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IgUser {
    pub username: Option<String>,
    pub full_name: Option<String>,
    #[serde(default)]
    pub is_verified: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IgCandidates {
    #[serde(default)]
    pub candidates: Vec<IgVersion>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IgVersion {
    pub url: String,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IgLocation {
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IgClipsMetadata {
    pub music_info: Option<IgMusicInfo>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IgMusicInfo {
    pub music_asset_info: Option<IgMusicAsset>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IgMusicAsset {
    pub title: Option<String>,
    pub display_artist: Option<String>,
}

/// Decode the media record from relay payloads.
///
/// Scripts that are not JSON are skipped; if every relay script fails to parse,
/// or the record is found but does not decode, the result is
/// `MalformedEmbeddedData`.
pub fn decode(doc: &Document, base: &Url) -> Result<Option<EmbeddedItem>> {
    let mut scripts = 0;
    let mut failures = 0;

    for script in doc.select(RELAY_SCRIPTS).nodes() {
        let text = dom::text_content(&Selection::from(*script));
        if !text.contains(MEDIA_KEY) {
            if !text.trim().is_empty() {
                scripts += 1;
                if serde_json::from_str::<Value>(text.trim()).is_err() {
                    failures += 1;
                }
            }
            continue;
        }
        scripts += 1;

        let value: Value = match serde_json::from_str(text.trim()) {
            Ok(value) => value,
            Err(e) => return Err(Error::MalformedEmbeddedData(format!("{MEDIA_KEY}: {e}"))),
        };
        let Some(record) = find_key(&value, MEDIA_KEY)
            .and_then(|info| info.get("items"))
            .and_then(Value::as_array)
            .and_then(|items| items.first())
        else {
            continue;
        };
        let media: IgMedia = serde_json::from_value(record.clone())
            .map_err(|e| Error::MalformedEmbeddedData(format!("{MEDIA_KEY}.items[0]: {e}")))?;
        return Ok(Some(media_to_item(&media, base)));
    }

    if scripts > 0 && failures == scripts {
        return Err(Error::MalformedEmbeddedData("relay scripts are not JSON".to_string()));
    }
    Ok(None)
}

/// Depth-first search for `key` in a JSON tree.
fn find_key<'a>(value: &'a Value, key: &str) -> Option<&'a Value> {
    match value {
        Value::Object(map) => map
            .get(key)
            .or_else(|| map.values().find_map(|nested| find_key(nested, key))),
        Value::Array(items) => items.iter().find_map(|nested| find_key(nested, key)),
        _ => None,
    }
}

/// Convert a decoded media record.
#[must_use]
pub fn media_to_item(media: &IgMedia, base: &Url) -> EmbeddedItem {
    let is_reel = media.product_type.as_deref() == Some("clips");
    let kind = if is_reel { ContentKind::Reel } else { ContentKind::Post };
    let mut item = EmbeddedItem::new(kind, MEDIA_KEY);

    item.id = media
        .code
        .clone()
        .filter(|c| !c.is_empty())
        .or_else(|| media.pk.as_ref().and_then(FlexNumber::as_id));
    item.text = media
        .caption
        .as_ref()
        .map(|c| c.text.clone())
        .filter(|t| !t.trim().is_empty());
    item.timestamp = media.taken_at.and_then(epoch_seconds);

    if let Some(user) = &media.user {
        item.author.handle = user.username.as_deref().and_then(clean_handle);
        item.author.display_name = user.full_name.clone().filter(|n| !n.trim().is_empty());
        item.author.verified = user.is_verified;
    }

    item.engagement.likes = media.like_count.as_ref().and_then(FlexNumber::as_u64);
    item.engagement.comments = media.comment_count.as_ref().and_then(FlexNumber::as_u64);
    item.engagement.views = media
        .play_count
        .as_ref()
        .or(media.view_count.as_ref())
        .and_then(FlexNumber::as_u64);

    let slides: Vec<&IgMedia> = match &media.carousel_media {
        Some(children) if !children.is_empty() => children.iter().collect(),
        _ => vec![media],
    };
    for slide in &slides {
        if let Some(media_item) = slide_media(slide, base) {
            if !item.media.iter().any(|m| m.url == media_item.url) {
                item.media.push(media_item);
            }
        }
    }

    item.details = Some(if is_reel {
        KindDetails::Reel {
            music: music(media),
        }
    } else {
        KindDetails::Post {
            location: media
                .location
                .as_ref()
                .and_then(|l| l.name.clone())
                .filter(|n| !n.trim().is_empty()),
            carousel_len: media.carousel_media.as_ref().map_or(0, Vec::len),
        }
    });

    if let Some(code) = &media.code {
        let section = if is_reel { "reel" } else { "p" };
        item.url = Some(format!("https://www.instagram.com/{section}/{code}/"));
    }
    item
}

fn slide_media(slide: &IgMedia, base: &Url) -> Option<MediaItem> {
    let poster = slide
        .image_versions2
        .as_ref()
        .and_then(|c| widest(&c.candidates))
        .and_then(|v| clean_media_url(&v.url, base));

    if let Some(video) = slide.video_versions.as_deref().and_then(widest) {
        return Some(MediaItem {
            media_type: MediaType::Video,
            url: clean_media_url(&video.url, base)?,
            width: video.width,
            height: video.height,
            poster,
            alt: None,
        });
    }

    let image = slide.image_versions2.as_ref().and_then(|c| widest(&c.candidates))?;
    Some(MediaItem {
        media_type: MediaType::Image,
        url: poster?,
        width: image.width,
        height: image.height,
        poster: None,
        alt: None,
    })
}

fn widest(versions: &[IgVersion]) -> Option<&IgVersion> {
    versions.iter().max_by_key(|v| v.width.unwrap_or(0))
}

fn music(media: &IgMedia) -> Option<MusicInfo> {
    let asset = media.clips_metadata.as_ref()?.music_info.as_ref()?.music_asset_info.as_ref()?;
    let title = asset.title.clone().filter(|t| !t.trim().is_empty())?;
    Some(MusicInfo {
        title,
        artist: asset.display_artist.clone().filter(|a| !a.trim().is_empty()),
    })
}

/// Decode the `og:description` summary plus `og:image`.
#[must_use]
pub fn decode_og_summary(doc: &Document, base: &Url) -> Option<EmbeddedItem> {
    let content = dom::non_empty_attribute(&doc.select(OG_DESCRIPTION), "content")?;
    let caps = INSTAGRAM_OG_SUMMARY.captures(&content)?;

    let mut item = EmbeddedItem::new(ContentKind::Post, "og:description");
    item.engagement.likes = caps.get(1).map(|m| parse_engagement(m.as_str()));
    item.engagement.comments = caps.get(2).map(|m| parse_engagement(m.as_str()));
    item.author.handle = caps.get(3).and_then(|m| clean_handle(m.as_str()));
    item.timestamp = caps
        .get(4)
        .and_then(|m| parse_relative_timestamp(m.as_str().trim(), Utc::now()));
    item.text = caps
        .get(5)
        .map(|m| m.as_str().trim().to_string())
        .filter(|t| !t.is_empty());

    if let Some(url) = dom::non_empty_attribute(&doc.select(r#"meta[property="og:image"]"#), "content")
        .and_then(|u| clean_media_url(&u, base))
    {
        item.media.push(MediaItem {
            media_type: MediaType::Image,
            url,
            width: None,
            height: None,
            poster: None,
            alt: None,
        });
    }
    Some(item)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;

    fn base() -> Url {
        Url::parse("https://www.instagram.com/p/C4abc/").unwrap()
    }

    #[test]
    fn test_relay_payload_carousel() {
        let doc = dom::parse(
            r#"<script type="application/json" data-sjs>{"require": [["ScheduledServerJS", "handle", null, [{"__bbox": {"require": [["RelayPrefetchedStreamCache", "next", [], ["adp", {"__bbox": {"result": {"data": {
                "xdt_api__v1__media__shortcode__web_info": {"items": [{
                    "pk": "3301", "code": "C4abc", "taken_at": 1709649000, "media_type": 8,
                    "caption": {"text": "Lisbon light #travel"},
                    "user": {"username": "natgeo", "full_name": "National Geographic", "is_verified": true},
                    "like_count": 51234, "comment_count": 321,
                    "location": {"name": "Lisbon, Portugal"},
                    "carousel_media": [
                        {"image_versions2": {"candidates": [
                            {"url": "https://scontent.cdninstagram.com/a_640.jpg", "width": 640, "height": 800},
                            {"url": "https://scontent.cdninstagram.com/a_1080.jpg?igsh=1", "width": 1080, "height": 1350}
                        ]}},
                        {"video_versions": [{"url": "https://scontent.cdninstagram.com/b.mp4", "width": 720, "height": 1280}],
                         "image_versions2": {"candidates": [{"url": "https://scontent.cdninstagram.com/b.jpg", "width": 720}]}}
                    ]
                }]}
            }}}}]]]}}]]]}</script>"#,
        );
        let item = decode(&doc, &base()).unwrap().unwrap();
        assert_eq!(item.kind, ContentKind::Post);
        assert_eq!(item.id.as_deref(), Some("C4abc"));
        assert_eq!(item.author.handle.as_deref(), Some("natgeo"));
        assert!(item.author.verified);
        assert_eq!(item.engagement.likes, Some(51_234));
        assert_eq!(item.media.len(), 2);
        assert_eq!(item.media[0].url, "https://scontent.cdninstagram.com/a_1080.jpg");
        assert_eq!(item.media[1].media_type, MediaType::Video);
        assert_eq!(item.media[1].poster.as_deref(), Some("https://scontent.cdninstagram.com/b.jpg"));
        assert_eq!(
            item.details,
            Some(KindDetails::Post {
                location: Some("Lisbon, Portugal".into()),
                carousel_len: 2
            })
        );
        assert_eq!(item.url.as_deref(), Some("https://www.instagram.com/p/C4abc/"));
    }

    #[test]
    fn test_reel_with_music() {
        let doc = dom::parse(
            r#"<script type="application/json" data-sjs>{"data": {"xdt_api__v1__media__shortcode__web_info": {"items": [{
                "code": "R1", "product_type": "clips", "play_count": 9000,
                "clips_metadata": {"music_info": {"music_asset_info": {"title": "Song", "display_artist": "Band"}}}
            }]}}}</script>"#,
        );
        let item = decode(&doc, &base()).unwrap().unwrap();
        assert_eq!(item.kind, ContentKind::Reel);
        assert_eq!(item.engagement.views, Some(9_000));
        assert_eq!(
            item.details.as_ref().and_then(KindDetails::music).map(|m| m.title.as_str()),
            Some("Song")
        );
    }

    #[test]
    fn test_record_with_wrong_shape_is_malformed() {
        let doc = dom::parse(
            r#"<script type="application/json" data-sjs>{"xdt_api__v1__media__shortcode__web_info": {"items": [{"taken_at": "yesterday"}]}}</script>"#,
        );
        assert!(matches!(decode(&doc, &base()), Err(Error::MalformedEmbeddedData(_))));
    }

    #[test]
    fn test_unrelated_relay_scripts_are_none() {
        let doc = dom::parse(r#"<script type="application/json" data-sjs>{"require": []}</script>"#);
        assert!(decode(&doc, &base()).unwrap().is_none());
    }

    #[test]
    fn test_og_summary() {
        let doc = dom::parse(
            r#"<head>
            <meta property="og:description" content="1.2M likes, 3,456 comments - natgeo on March 5, 2024: &quot;A quiet morning in Lisbon.&quot;">
            <meta property="og:image" content="https://scontent.cdninstagram.com/og.jpg?utm_medium=share">
            </head>"#,
        );
        let item = decode_og_summary(&doc, &base()).unwrap();
        assert_eq!(item.engagement.likes, Some(1_200_000));
        assert_eq!(item.engagement.comments, Some(3_456));
        assert_eq!(item.author.handle.as_deref(), Some("natgeo"));
        assert_eq!(item.text.as_deref(), Some("A quiet morning in Lisbon."));
        let ts = item.timestamp.unwrap();
        assert_eq!((ts.year(), ts.month(), ts.day()), (2024, 3, 5));
        assert_eq!(item.media[0].url, "https://scontent.cdninstagram.com/og.jpg");
    }
}
