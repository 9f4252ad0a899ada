use crate::feed::types::{MediaItem, MediaKind};

/// The delivery format the chat surface can play natively.
pub const VIDEO_CONTENT_TYPE: &str = "video/mp4";

/// Picks the retrievable URL for a media item, if it has one.
///
/// Photos carry a single direct URL. Videos offer a list of encodings in
/// source order; the first variant matching [`VIDEO_CONTENT_TYPE`] wins.
/// Anything else yields `None`, which the pipeline reads as "skip this item".
pub fn select_url(item: &MediaItem) -> Option<&str> {
    match item.kind {
        MediaKind::Photo => item.media_url.as_deref(),
        MediaKind::Video => item
            .video_info
            .as_ref()?
            .variants
            .iter()
            .find(|variant| variant.content_type == VIDEO_CONTENT_TYPE)
            .map(|variant| variant.url.as_str()),
        MediaKind::Unknown => None,
    }
}
