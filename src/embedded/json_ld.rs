//! JSON-LD Decoding
//!
//! Reads Schema.org `SocialMediaPosting`, `DiscussionForumPosting`,
//! `VideoObject`, `ImageObject` and article nodes from `application/ld+json`
//! scripts.
//! `@graph` arrays and nested objects are walked; the shallowest supported
//! node wins.

use dom_query::{Document, Selection};
use serde_json::{Map, Value};
use url::Url;

use super::EmbeddedItem;
use crate::dom;
use crate::error::{Error, Result};
use crate::fields::{clean_handle, parse_engagement, parse_machine_timestamp};
use crate::result::{ContentKind, KindDetails, MediaItem, MediaType};
use crate::url_utils::clean_media_url;

const SCRIPTS: &str = r#"script[type="application/ld+json"]"#;

/// A supported schema node and its nesting depth.
#[derive(Debug, Clone)]
struct SchemaNode {
    schema_type: String,
    data: Map<String, Value>,
    depth: usize,
}

/// Decode the first supported JSON-LD node of the page.
///
/// Fails with `MalformedEmbeddedData` only when JSON-LD scripts exist and none
/// of them parses.
pub fn decode(doc: &Document, base: &Url) -> Result<Option<EmbeddedItem>> {
    let mut scripts = 0;
    let mut failures = Vec::new();
    let mut nodes = Vec::new();

    for script in doc.select(SCRIPTS).nodes() {
        let text = dom::text_content(&Selection::from(*script));
        let text = text.trim();
        if text.is_empty() {
            continue;
        }
        scripts += 1;
        match serde_json::from_str::<Value>(text) {
            Ok(value) => collect_nodes(&value, 0, &mut nodes),
            Err(e) => failures.push(e.to_string()),
        }
    }

    if scripts > 0 && failures.len() == scripts {
        return Err(Error::MalformedEmbeddedData(format!("json-ld: {}", failures.join("; "))));
    }

    nodes.sort_by_key(|n| n.depth);
    Ok(nodes.first().map(|node| to_item(node, base)))
}

fn collect_nodes(value: &Value, depth: usize, out: &mut Vec<SchemaNode>) {
    match value {
        Value::Object(map) => {
            if let Some(schema_type) = schema_types(map).into_iter().find(|t| is_supported(t)) {
                out.push(SchemaNode {
                    schema_type,
                    data: map.clone(),
                    depth,
                });
            }
            for (key, nested) in map {
                if key == "@graph" {
                    collect_nodes(nested, depth, out);
                } else {
                    collect_nodes(nested, depth + 1, out);
                }
            }
        }
        Value::Array(items) => {
            for item in items {
                collect_nodes(item, depth, out);
            }
        }
        _ => {}
    }
}

fn schema_types(map: &Map<String, Value>) -> Vec<String> {
    match map.get("@type") {
        Some(Value::String(s)) => vec![s.clone()],
        Some(Value::Array(items)) => items.iter().filter_map(Value::as_str).map(str::to_string).collect(),
        _ => Vec::new(),
    }
}

fn is_supported(schema_type: &str) -> bool {
    matches!(
        schema_type.to_ascii_lowercase().as_str(),
        "socialmediaposting"
            | "discussionforumposting"
            | "videoobject"
            | "imageobject"
            | "article"
            | "newsarticle"
            | "blogposting"
    )
}

fn to_item(node: &SchemaNode, base: &Url) -> EmbeddedItem {
    let data = &node.data;
    let is_video = node.schema_type.eq_ignore_ascii_case("VideoObject");
    let is_article = matches!(
        node.schema_type.to_ascii_lowercase().as_str(),
        "article" | "newsarticle" | "blogposting"
    );
    let kind = if is_video {
        ContentKind::Video
    } else if is_article {
        ContentKind::Article
    } else {
        ContentKind::Post
    };
    let mut item = EmbeddedItem::new(kind, format!("json-ld:{}", node.schema_type));
    if is_article {
        item.details = Some(KindDetails::Article {
            title: single_string(data, "headline"),
        });
    }

    item.id = data.get("identifier").and_then(scalar_string);
    item.text = ["articleBody", "text", "caption", "description", "headline"]
        .iter()
        .find_map(|key| single_string(data, key));
    item.timestamp = ["datePublished", "uploadDate", "dateCreated"]
        .iter()
        .filter_map(|key| single_string(data, key))
        .find_map(|raw| parse_machine_timestamp(&raw));
    item.url = ["url", "@id"]
        .iter()
        .filter_map(|key| single_string(data, key))
        .find(|u| u.starts_with("http"));

    if let Some(author) = data.get("author").or_else(|| data.get("creator")) {
        read_author(author, &mut item);
    }

    read_interactions(data, &mut item);
    if item.engagement.comments.is_none() {
        item.engagement.comments = data.get("commentCount").and_then(count_value);
    }

    if is_video {
        if let Some(url) = single_string(data, "contentUrl").and_then(|u| clean_media_url(&u, base)) {
            let poster = thumbnail(data).and_then(|t| clean_media_url(&t, base));
            item.media.push(MediaItem {
                media_type: MediaType::Video,
                url,
                width: dimension(data, "width"),
                height: dimension(data, "height"),
                poster,
                alt: None,
            });
        }
        item.details = Some(KindDetails::Video {
            music: None,
            duration_secs: single_string(data, "duration").and_then(|d| parse_iso_duration(&d)),
        });
    }

    for url in images(data) {
        if let Some(url) = clean_media_url(&url, base) {
            if !item.media.iter().any(|m| m.url == url) {
                item.media.push(MediaItem {
                    media_type: MediaType::Image,
                    url,
                    width: None,
                    height: None,
                    poster: None,
                    alt: None,
                });
            }
        }
    }

    if let Some(Value::Array(keywords)) = data.get("keywords") {
        item.hashtags = keywords
            .iter()
            .filter_map(Value::as_str)
            .map(|k| k.trim_start_matches('#').to_string())
            .filter(|k| !k.is_empty())
            .collect();
    }

    item
}

fn read_author(value: &Value, item: &mut EmbeddedItem) {
    let author = match value {
        Value::Array(items) => items.first(),
        other => Some(other),
    };
    match author {
        Some(Value::String(name)) => {
            item.author.display_name = Some(name.trim().to_string()).filter(|n| !n.is_empty());
        }
        Some(Value::Object(map)) => {
            item.author.display_name = single_string(map, "name");
            item.author.handle = ["alternateName", "identifier"]
                .iter()
                .filter_map(|key| map.get(*key).and_then(scalar_string))
                .find_map(|raw| clean_handle(&raw));
            if item.author.handle.is_none() {
                item.author.handle = single_string(map, "url").and_then(|u| handle_from_profile_url(&u));
            }
        }
        _ => {}
    }
}

/// `interactionStatistic` entries: `{"interactionType": "https://schema.org/LikeAction",
/// "userInteractionCount": 12}`, the type possibly an object with `@type`.
fn read_interactions(data: &Map<String, Value>, item: &mut EmbeddedItem) {
    let stats: Vec<&Value> = match data.get("interactionStatistic") {
        Some(Value::Array(items)) => items.iter().collect(),
        Some(single @ Value::Object(_)) => vec![single],
        _ => return,
    };

    for stat in stats {
        let Some(map) = stat.as_object() else {
            continue;
        };
        let action = match map.get("interactionType") {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Object(t)) => single_string(t, "@type").unwrap_or_default(),
            _ => continue,
        };
        let Some(count) = map.get("userInteractionCount").and_then(count_value) else {
            continue;
        };
        let action = action.rsplit('/').next().unwrap_or_default().to_ascii_lowercase();
        let slot = match action.as_str() {
            "likeaction" => &mut item.engagement.likes,
            "commentaction" => &mut item.engagement.comments,
            "shareaction" => &mut item.engagement.shares,
            "watchaction" | "viewaction" => &mut item.engagement.views,
            _ => continue,
        };
        slot.get_or_insert(count);
    }
}

fn single_string(data: &Map<String, Value>, key: &str) -> Option<String> {
    match data.get(key)? {
        Value::String(s) => Some(s.trim().to_string()).filter(|s| !s.is_empty()),
        Value::Array(items) => items
            .first()
            .and_then(Value::as_str)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty()),
        _ => None,
    }
}

fn scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_string()).filter(|s| !s.is_empty()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn count_value(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64().or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f.round() as u64)),
        Value::String(s) if s.chars().any(|c| c.is_ascii_digit()) => Some(parse_engagement(s)),
        _ => None,
    }
}

fn dimension(data: &Map<String, Value>, key: &str) -> Option<u32> {
    count_value(data.get(key)?).and_then(|v| u32::try_from(v).ok())
}

fn thumbnail(data: &Map<String, Value>) -> Option<String> {
    match data.get("thumbnailUrl")? {
        Value::String(s) => Some(s.clone()),
        Value::Array(items) => items.first().and_then(Value::as_str).map(str::to_string),
        Value::Object(obj) => single_string(obj, "url"),
        _ => None,
    }
}

fn images(data: &Map<String, Value>) -> Vec<String> {
    let Some(image) = data.get("image") else {
        return Vec::new();
    };
    let entries: Vec<&Value> = match image {
        Value::Array(items) => items.iter().collect(),
        other => vec![other],
    };
    entries
        .into_iter()
        .filter_map(|entry| match entry {
            Value::String(s) => Some(s.clone()),
            Value::Object(obj) => single_string(obj, "url").or_else(|| single_string(obj, "contentUrl")),
            _ => None,
        })
        .collect()
}

fn handle_from_profile_url(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let segment = parsed.path_segments()?.find(|s| !s.is_empty())?;
    clean_handle(segment.trim_start_matches('@'))
}

/// ISO 8601 duration ("PT1M05S", "PT42S", "P0DT0H0M12S") to whole seconds.
fn parse_iso_duration(raw: &str) -> Option<u32> {
    let rest = raw.trim().strip_prefix('P')?;
    let mut seconds: f64 = 0.0;
    let mut number = String::new();
    let mut in_time = false;
    for c in rest.chars() {
        match c {
            'T' => in_time = true,
            '0'..='9' | '.' => number.push(c),
            unit => {
                let value: f64 = number.parse().ok()?;
                number.clear();
                seconds += value
                    * match (unit, in_time) {
                        ('D', false) => 86_400.0,
                        ('H', true) => 3_600.0,
                        ('M', true) => 60.0,
                        ('S', true) => 1.0,
                        _ => return None,
                    };
            }
        }
    }
    if !number.is_empty() {
        return None;
    }
    Some(seconds.round() as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://www.tiktok.com/@a/video/1").unwrap()
    }

    #[test]
    fn test_video_object() {
        let doc = dom::parse(
            r#"<script type="application/ld+json">
            {
                "@context": "https://schema.org",
                "@type": "VideoObject",
                "identifier": "7301234567890",
                "description": "Morning routine #coffee",
                "uploadDate": "2024-03-05T14:30:00Z",
                "duration": "PT1M05S",
                "contentUrl": "https://v16.tiktokcdn.com/video.mp4?utm_source=x&expire=1",
                "thumbnailUrl": ["https://p16.tiktokcdn.com/cover.jpg"],
                "creator": {"@type": "Person", "name": "Barista Bee", "alternateName": "@baristabee"},
                "interactionStatistic": [
                    {"interactionType": {"@type": "LikeAction"}, "userInteractionCount": 1200},
                    {"interactionType": "https://schema.org/WatchAction", "userInteractionCount": "45K"}
                ],
                "commentCount": 88
            }
            </script>"#,
        );
        let item = decode(&doc, &base()).unwrap().unwrap();
        assert_eq!(item.kind, ContentKind::Video);
        assert_eq!(item.id.as_deref(), Some("7301234567890"));
        assert_eq!(item.text.as_deref(), Some("Morning routine #coffee"));
        assert_eq!(item.author.handle.as_deref(), Some("baristabee"));
        assert_eq!(item.author.display_name.as_deref(), Some("Barista Bee"));
        assert_eq!(item.engagement.likes, Some(1_200));
        assert_eq!(item.engagement.views, Some(45_000));
        assert_eq!(item.engagement.comments, Some(88));
        assert_eq!(item.media.len(), 1);
        assert_eq!(item.media[0].url, "https://v16.tiktokcdn.com/video.mp4?expire=1");
        assert_eq!(item.media[0].poster.as_deref(), Some("https://p16.tiktokcdn.com/cover.jpg"));
        assert_eq!(
            item.details,
            Some(KindDetails::Video {
                music: None,
                duration_secs: Some(65)
            })
        );
        assert_eq!(item.timestamp.map(|t| t.timestamp()), Some(1_709_649_000));
    }

    #[test]
    fn test_graph_posting_wins_over_nested_nodes() {
        let doc = dom::parse(
            r#"<script type="application/ld+json">
            {"@graph": [
                {"@type": "WebSite", "name": "Example"},
                {"@type": "SocialMediaPosting", "articleBody": "hello world",
                 "author": {"name": "Ann", "url": "https://social.example/@ann"},
                 "image": {"@type": "ImageObject", "url": "https://img.example/1.jpg"}}
            ]}
            </script>"#,
        );
        let item = decode(&doc, &base()).unwrap().unwrap();
        assert_eq!(item.source, "json-ld:SocialMediaPosting");
        assert_eq!(item.text.as_deref(), Some("hello world"));
        assert_eq!(item.author.handle.as_deref(), Some("ann"));
        assert_eq!(item.media.len(), 1);
        assert_eq!(item.media[0].media_type, MediaType::Image);
    }

    #[test]
    fn test_unsupported_types_yield_none() {
        let doc = dom::parse(r#"<script type="application/ld+json">{"@type": "Organization", "name": "X"}</script>"#);
        assert!(decode(&doc, &base()).unwrap().is_none());
        assert!(decode(&dom::parse("<p>no scripts</p>"), &base()).unwrap().is_none());
    }

    #[test]
    fn test_news_article_carries_headline() {
        let doc = dom::parse(
            r#"<script type="application/ld+json">{"@type": "NewsArticle", "headline": "Storm nears coast",
                "articleBody": "The storm is expected to make landfall tonight.",
                "datePublished": "2024-03-05T14:30:00Z", "author": {"@type": "Person", "name": "Dana Reyes"}}</script>"#,
        );
        let item = decode(&doc, &base()).unwrap().unwrap();
        assert_eq!(item.kind, ContentKind::Article);
        assert_eq!(
            item.details,
            Some(KindDetails::Article {
                title: Some("Storm nears coast".into())
            })
        );
        assert_eq!(item.timestamp.map(|t| t.timestamp()), Some(1_709_649_000));
    }

    #[test]
    fn test_all_scripts_malformed_is_an_error() {
        let doc = dom::parse(r#"<script type="application/ld+json">{ not json </script>"#);
        let err = decode(&doc, &base()).unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::MalformedEmbeddedData);
    }

    #[test]
    fn test_one_valid_script_is_enough() {
        let doc = dom::parse(
            r#"<script type="application/ld+json">{ broken</script>
               <script type="application/ld+json">{"@type": "ImageObject", "caption": "sunset"}</script>"#,
        );
        let item = decode(&doc, &base()).unwrap().unwrap();
        assert_eq!(item.text.as_deref(), Some("sunset"));
    }

    #[test]
    fn test_iso_duration() {
        assert_eq!(parse_iso_duration("PT42S"), Some(42));
        assert_eq!(parse_iso_duration("PT1H2M3S"), Some(3_723));
        assert_eq!(parse_iso_duration("P0DT0H0M12.4S"), Some(12));
        assert_eq!(parse_iso_duration("42"), None);
        assert_eq!(parse_iso_duration("PT12"), None);
    }
}
