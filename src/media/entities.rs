use crate::feed::types::{MediaEntities, MediaItem};

/// The media collection chosen for relay, and whether it came from the
/// extended set.
#[derive(Debug, Clone, Copy)]
pub struct ResolvedSet<'a> {
    pub items: &'a [MediaItem],
    pub extended: bool,
}

/// Picks the authoritative media collection for a post.
///
/// The extended set carries the full video variant lists, so it wins whenever
/// it is present and non-empty; the basic set is only a fallback. A post with
/// neither resolves to `None`.
pub fn resolve<'a>(
    basic: Option<&'a MediaEntities>,
    extended: Option<&'a MediaEntities>,
) -> Option<ResolvedSet<'a>> {
    if let Some(extended) = extended {
        if !extended.media.is_empty() {
            return Some(ResolvedSet {
                items: &extended.media,
                extended: true,
            });
        }
    }

    if let Some(basic) = basic {
        if !basic.media.is_empty() {
            return Some(ResolvedSet {
                items: &basic.media,
                extended: false,
            });
        }
    }

    None
}
