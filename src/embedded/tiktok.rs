//! TikTok rehydration state.
//!
//! Current web builds embed `__UNIVERSAL_DATA_FOR_REHYDRATION__`, where the
//! video lives at `__DEFAULT_SCOPE__["webapp.video-detail"].itemInfo.itemStruct`.
//! Older builds embed `SIGI_STATE` with an `ItemModule` map keyed by video id.
//! Both carry the same item shape.

use std::collections::BTreeMap;

use dom_query::Document;
use serde::Deserialize;
use url::Url;

use super::{epoch_seconds, EmbeddedItem, FlexNumber};
use crate::dom;
use crate::error::{Error, Result};
use crate::fields::clean_handle;
use crate::result::{ContentKind, KindDetails, MediaItem, MediaType, MusicInfo};
use crate::selector::tiktok::{SIGI_STATE, UNIVERSAL_DATA};
use crate::url_utils::clean_media_url;

#[derive(Debug, Deserialize)]
struct UniversalData {
    #[serde(rename = "__DEFAULT_SCOPE__", default)]
    scope: DefaultScope,
}

#[derive(Debug, Default, Deserialize)]
struct DefaultScope {
    #[serde(rename = "webapp.video-detail")]
    video_detail: Option<VideoDetail>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoDetail {
    item_info: Option<ItemInfo>,
    #[serde(default)]
    status_code: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ItemInfo {
    item_struct: ItemStruct,
}

#[derive(Debug, Deserialize)]
struct SigiState {
    #[serde(rename = "ItemModule", default)]
    item_module: BTreeMap<String, ItemStruct>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ItemStruct {
    id: Option<FlexNumber>,
    #[serde(default)]
    desc: String,
    create_time: Option<FlexNumber>,
    author: Option<ItemAuthor>,
    stats: Option<Stats>,
    stats_v2: Option<Stats>,
    video: Option<Video>,
    music: Option<Music>,
    #[serde(default)]
    challenges: Vec<Challenge>,
    #[serde(default)]
    text_extra: Vec<TextExtra>,
    image_post: Option<ImagePost>,
}

/// `author` is an object in current payloads and a bare handle in `SIGI_STATE`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ItemAuthor {
    Full(AuthorInfo),
    Handle(String),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AuthorInfo {
    unique_id: Option<String>,
    nickname: Option<String>,
    #[serde(default)]
    verified: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Stats {
    digg_count: Option<FlexNumber>,
    comment_count: Option<FlexNumber>,
    share_count: Option<FlexNumber>,
    play_count: Option<FlexNumber>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Video {
    play_addr: Option<String>,
    download_addr: Option<String>,
    cover: Option<String>,
    duration: Option<FlexNumber>,
    width: Option<FlexNumber>,
    height: Option<FlexNumber>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Music {
    title: Option<String>,
    author_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Challenge {
    title: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TextExtra {
    hashtag_name: Option<String>,
    user_unique_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ImagePost {
    #[serde(default)]
    images: Vec<PostImage>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PostImage {
    #[serde(rename = "imageURL")]
    image_url: Option<UrlList>,
    image_width: Option<FlexNumber>,
    image_height: Option<FlexNumber>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UrlList {
    #[serde(default)]
    url_list: Vec<String>,
}

/// Decode the video item from the rehydration state.
///
/// `wanted_id` selects the entry of a multi-item `SIGI_STATE`; without it, or
/// when it is absent, the first entry is used.
pub fn decode(doc: &Document, base: &Url, wanted_id: Option<&str>) -> Result<Option<EmbeddedItem>> {
    if let Some(raw) = script_text(doc, UNIVERSAL_DATA) {
        let data: UniversalData = serde_json::from_str(&raw)
            .map_err(|e| Error::MalformedEmbeddedData(format!("{UNIVERSAL_DATA}: {e}")))?;
        if let Some(detail) = data.scope.video_detail {
            if detail.status_code != 0 {
                return Err(Error::MalformedEmbeddedData(format!(
                    "webapp.video-detail status {}",
                    detail.status_code
                )));
            }
            if let Some(info) = detail.item_info {
                return Ok(Some(to_item(info.item_struct, base, "tiktok:webapp.video-detail")));
            }
        }
    }

    if let Some(raw) = script_text(doc, SIGI_STATE) {
        let mut state: SigiState =
            serde_json::from_str(&raw).map_err(|e| Error::MalformedEmbeddedData(format!("{SIGI_STATE}: {e}")))?;
        let key = wanted_id
            .filter(|id| state.item_module.contains_key(*id))
            .map(str::to_string)
            .or_else(|| state.item_module.keys().next().cloned());
        if let Some(item) = key.and_then(|k| state.item_module.remove(&k)) {
            return Ok(Some(to_item(item, base, "tiktok:SIGI_STATE.ItemModule")));
        }
    }

    Ok(None)
}

fn script_text(doc: &Document, selector: &str) -> Option<String> {
    let script = doc.select(selector);
    if !script.exists() {
        return None;
    }
    let text = dom::text_content(&script);
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

fn to_item(raw: ItemStruct, base: &Url, source: &str) -> EmbeddedItem {
    let mut item = EmbeddedItem::new(ContentKind::Video, source);
    item.id = raw.id.as_ref().and_then(FlexNumber::as_id);
    item.text = Some(raw.desc).filter(|d| !d.trim().is_empty());
    item.timestamp = raw
        .create_time
        .as_ref()
        .and_then(FlexNumber::as_u64)
        .and_then(|secs| i64::try_from(secs).ok())
        .and_then(epoch_seconds);

    match raw.author {
        Some(ItemAuthor::Full(info)) => {
            item.author.handle = info.unique_id.as_deref().and_then(clean_handle);
            item.author.display_name = info.nickname.filter(|n| !n.trim().is_empty());
            item.author.verified = info.verified;
        }
        Some(ItemAuthor::Handle(handle)) => item.author.handle = clean_handle(&handle),
        None => {}
    }

    for stats in [raw.stats.as_ref(), raw.stats_v2.as_ref()].into_iter().flatten() {
        let counters = [
            (&stats.digg_count, &mut item.engagement.likes),
            (&stats.comment_count, &mut item.engagement.comments),
            (&stats.share_count, &mut item.engagement.shares),
            (&stats.play_count, &mut item.engagement.views),
        ];
        for (value, slot) in counters {
            if slot.is_none() {
                *slot = value.as_ref().and_then(FlexNumber::as_u64);
            }
        }
    }

    let music = raw.music.and_then(|m| {
        let title = m.title.filter(|t| !t.trim().is_empty())?;
        Some(MusicInfo {
            title,
            artist: m.author_name.filter(|a| !a.trim().is_empty()),
        })
    });
    let duration_secs = raw
        .video
        .as_ref()
        .and_then(|v| v.duration.as_ref())
        .and_then(FlexNumber::as_u64)
        .and_then(|d| u32::try_from(d).ok())
        .filter(|d| *d > 0);
    item.details = Some(KindDetails::Video { music, duration_secs });

    if let Some(video) = &raw.video {
        let src = video.play_addr.as_deref().or(video.download_addr.as_deref());
        let poster = video.cover.as_deref().and_then(|c| clean_media_url(c, base));
        if let Some(url) = src.and_then(|s| clean_media_url(s, base)) {
            item.media.push(MediaItem {
                media_type: MediaType::Video,
                url,
                width: flex_dimension(video.width.as_ref()),
                height: flex_dimension(video.height.as_ref()),
                poster,
                alt: None,
            });
        }
    }
    if let Some(post) = &raw.image_post {
        for image in &post.images {
            let Some(url) = image
                .image_url
                .as_ref()
                .and_then(|u| u.url_list.first())
                .and_then(|u| clean_media_url(u, base))
            else {
                continue;
            };
            if !item.media.iter().any(|m| m.url == url) {
                item.media.push(MediaItem {
                    media_type: MediaType::Image,
                    url,
                    width: flex_dimension(image.image_width.as_ref()),
                    height: flex_dimension(image.image_height.as_ref()),
                    poster: None,
                    alt: None,
                });
            }
        }
    }

    let mut hashtags: Vec<String> = Vec::new();
    let tag_names = raw
        .challenges
        .iter()
        .filter_map(|c| c.title.clone())
        .chain(raw.text_extra.iter().filter_map(|t| t.hashtag_name.clone()));
    for tag in tag_names {
        if !tag.is_empty() && !hashtags.iter().any(|t| t.eq_ignore_ascii_case(&tag)) {
            hashtags.push(tag);
        }
    }
    item.hashtags = hashtags;
    item.mentions = raw
        .text_extra
        .iter()
        .filter_map(|t| t.user_unique_id.as_deref())
        .filter_map(clean_handle)
        .collect();

    if let (Some(handle), Some(id)) = (&item.author.handle, &item.id) {
        item.url = Some(format!("https://www.tiktok.com/@{handle}/video/{id}"));
    }
    item
}

fn flex_dimension(value: Option<&FlexNumber>) -> Option<u32> {
    value
        .and_then(FlexNumber::as_u64)
        .and_then(|v| u32::try_from(v).ok())
        .filter(|v| *v > 0)
}
