use crate::timeline::model::{Element, MediaItem, Track, TrackKind};

#[derive(Clone, Copy, Debug)]
/// An element live at the requested time, with its resolved media and owning track.
pub struct ActiveEntry<'a> {
    pub element: &'a Element,
    /// `None` for text elements and for dangling media references.
    pub media_item: Option<&'a MediaItem>,
    pub track: &'a Track,
}

/// Collect every element active at `time` across all tracks, in draw order.
///
/// Audio-track entries sort first and text-track entries last; everything
/// else keeps its track-then-element order, so visuals composite bottom to
/// top with text always on top.
pub fn resolve_active_elements<'a>(
    tracks: &'a [Track],
    media_items: &'a [MediaItem],
    time: f64,
) -> Vec<ActiveEntry<'a>> {
    let mut entries = Vec::new();
    for track in tracks {
        for element in &track.elements {
            if !element.is_active_at(time) {
                continue;
            }
            let media_item = element
                .media_id()
                .and_then(|id| media_items.iter().find(|m| m.id == id));
            entries.push(ActiveEntry {
                element,
                media_item,
                track,
            });
        }
    }

    // `sort_by_key` is stable.
    entries.sort_by_key(|e| draw_rank(e.track.kind));
    entries
}

fn draw_rank(kind: TrackKind) -> u8 {
    match kind {
        TrackKind::Audio => 0,
        TrackKind::Text => 2,
        TrackKind::Media | TrackKind::Sticker | TrackKind::Captions => 1,
    }
}

#[cfg(test)]
#[path = "../../tests/unit/timeline/resolve.rs"]
mod tests;
