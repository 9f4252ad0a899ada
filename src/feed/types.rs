use serde::Deserialize;

/// One post as the feed API reports it in extended mode.
///
/// Both media collections are optional: older or text-only posts carry
/// neither, and `extended_entities` only appears when the feed has the full
/// variant lists to offer.
#[derive(Debug, Clone, Deserialize)]
pub struct Post {
    pub id: i64,
    #[serde(rename = "full_text", alias = "text")]
    pub text: String,
    pub user: Author,
    #[serde(default)]
    pub entities: Option<MediaEntities>,
    #[serde(default)]
    pub extended_entities: Option<MediaEntities>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Author {
    pub name: String,
}

/// A media collection attached to a post. The `entities` payload truncates
/// video variant lists; `extended_entities` carries the complete set.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MediaEntities {
    #[serde(default)]
    pub media: Vec<MediaItem>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MediaItem {
    #[serde(rename = "type")]
    pub kind: MediaKind,
    #[serde(default, rename = "media_url_https", alias = "media_url")]
    pub media_url: Option<String>,
    #[serde(default)]
    pub video_info: Option<VideoInfo>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct VideoInfo {
    #[serde(default)]
    pub variants: Vec<VideoVariant>,
}

/// One deliverable encoding of a video item. Bitrate is reported by the feed
/// but plays no part in selection.
#[derive(Debug, Clone, Deserialize)]
pub struct VideoVariant {
    pub content_type: String,
    pub url: String,
    #[serde(default)]
    pub bitrate: Option<u64>,
}

/// Media kinds the feed may report. Anything we cannot relay deserializes to
/// `Unknown` and is skipped instead of failing the command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Photo,
    Video,
    #[serde(other)]
    Unknown,
}

impl MediaKind {
    pub fn label(self) -> &'static str {
        match self {
            MediaKind::Photo => "photo",
            MediaKind::Video => "video",
            MediaKind::Unknown => "media",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_deserialize_post_with_photo_and_video() {
        let post: Post = serde_json::from_value(json!({
            "id": 42,
            "full_text": "look at this",
            "user": {"name": "Ann", "followers_count": 7},
            "extended_entities": {
                "media": [
                    {"type": "photo", "media_url_https": "https://img.example/a.jpg"},
                    {
                        "type": "video",
                        "media_url_https": "https://img.example/thumb.jpg",
                        "video_info": {"variants": [
                            {"content_type": "video/mp4", "url": "https://v.example/a.mp4", "bitrate": 832000}
                        ]}
                    }
                ]
            }
        }))
        .unwrap();

        assert_eq!(post.id, 42);
        assert_eq!(post.user.name, "Ann");
        assert!(post.entities.is_none());
        let media = &post.extended_entities.as_ref().unwrap().media;
        assert_eq!(media.len(), 2);
        assert_eq!(media[0].kind, MediaKind::Photo);
        assert_eq!(media[1].kind, MediaKind::Video);
        let variants = &media[1].video_info.as_ref().unwrap().variants;
        assert_eq!(variants[0].bitrate, Some(832_000));
    }

    #[test]
    fn test_deserialize_text_only_post() {
        let post: Post = serde_json::from_value(json!({
            "id": 7,
            "full_text": "just words",
            "user": {"name": "Bob"}
        }))
        .unwrap();

        assert!(post.entities.is_none());
        assert!(post.extended_entities.is_none());
    }

    #[test]
    fn test_unknown_media_kind_is_not_fatal() {
        let item: MediaItem = serde_json::from_value(json!({
            "type": "animated_gif",
            "media_url_https": "https://img.example/g.gif"
        }))
        .unwrap();

        assert_eq!(item.kind, MediaKind::Unknown);
    }

    #[test]
    fn test_plain_text_field_alias() {
        let post: Post = serde_json::from_value(json!({
            "id": 1,
            "text": "compat mode",
            "user": {"name": "Cal"}
        }))
        .unwrap();

        assert_eq!(post.text, "compat mode");
    }
}
