use super::*;
use crate::timeline::model::{ElementBody, MediaElement, MediaKind, TextAlign, TextElement, Timing};

fn media_el(id: &str, media_id: &str, start: f64, duration: f64) -> Element {
    Element {
        id: id.to_string(),
        name: String::new(),
        timing: Timing {
            start_time: start,
            duration,
            trim_start: 0.0,
            trim_end: 0.0,
        },
        hidden: false,
        body: ElementBody::Media(MediaElement {
            media_id: media_id.to_string(),
            volume: 1.0,
            pan: 0.0,
            muted: false,
        }),
    }
}

fn text_el(id: &str, start: f64, duration: f64) -> Element {
    Element {
        id: id.to_string(),
        name: String::new(),
        timing: Timing {
            start_time: start,
            duration,
            trim_start: 0.0,
            trim_end: 0.0,
        },
        hidden: false,
        body: ElementBody::Text(TextElement {
            content: "hi".to_string(),
            font_family: None,
            font_size: None,
            color: [255, 255, 255, 255],
            x: None,
            y: None,
            text_align: TextAlign::Center,
            opacity: 1.0,
            background_color: None,
        }),
    }
}

fn track(id: &str, kind: TrackKind, elements: Vec<Element>) -> Track {
    Track {
        id: id.to_string(),
        name: id.to_string(),
        kind,
        elements,
        muted: false,
    }
}

fn item(id: &str, kind: MediaKind) -> MediaItem {
    MediaItem {
        id: id.to_string(),
        kind,
        url: format!("{id}.bin"),
        width: Some(100),
        height: Some(100),
        duration: Some(10.0),
    }
}

fn ids(entries: &[ActiveEntry<'_>]) -> Vec<String> {
    entries.iter().map(|e| e.element.id.clone()).collect()
}

#[test]
fn aggregates_across_tracks_and_skips_hidden() {
    let mut hidden = media_el("hidden", "m1", 0.0, 5.0);
    hidden.hidden = true;
    let tracks = vec![
        track("a", TrackKind::Media, vec![media_el("first", "m1", 0.0, 5.0)]),
        track(
            "b",
            TrackKind::Media,
            vec![media_el("second", "m2", 1.0, 3.0), hidden],
        ),
    ];
    let media = vec![item("m1", MediaKind::Video), item("m2", MediaKind::Image)];

    let active = resolve_active_elements(&tracks, &media, 2.0);
    assert_eq!(ids(&active), vec!["first", "second"]);
    assert_eq!(active[0].media_item.unwrap().id, "m1");
    assert_eq!(active[1].track.id, "b");
}

#[test]
fn never_returns_elements_outside_window() {
    let tracks = vec![track(
        "a",
        TrackKind::Media,
        vec![media_el("early", "m1", 0.0, 1.0), media_el("late", "m1", 3.0, 1.0)],
    )];
    let media = vec![item("m1", MediaKind::Video)];

    assert_eq!(ids(&resolve_active_elements(&tracks, &media, 0.0)), vec!["early"]);
    assert!(resolve_active_elements(&tracks, &media, 1.0).is_empty());
    assert!(resolve_active_elements(&tracks, &media, 2.5).is_empty());
    assert_eq!(ids(&resolve_active_elements(&tracks, &media, 3.5)), vec!["late"]);
    assert!(resolve_active_elements(&tracks, &media, 4.0).is_empty());
}

#[test]
fn audio_first_text_last_others_stable() {
    let tracks = vec![
        track("titles", TrackKind::Text, vec![text_el("title", 0.0, 5.0)]),
        track("v1", TrackKind::Media, vec![media_el("bg", "m1", 0.0, 5.0)]),
        track("music", TrackKind::Audio, vec![media_el("song", "a1", 0.0, 5.0)]),
        track("v2", TrackKind::Media, vec![media_el("fg", "m1", 0.0, 5.0)]),
        track("stickers", TrackKind::Sticker, vec![media_el("st", "m1", 0.0, 5.0)]),
    ];
    let media = vec![item("m1", MediaKind::Image), item("a1", MediaKind::Audio)];

    let active = resolve_active_elements(&tracks, &media, 1.0);
    assert_eq!(ids(&active), vec!["song", "bg", "fg", "st", "title"]);
}

#[test]
fn dangling_media_reference_resolves_to_none() {
    let tracks = vec![track(
        "a",
        TrackKind::Media,
        vec![media_el("orphan", "missing", 0.0, 1.0)],
    )];
    let active = resolve_active_elements(&tracks, &[], 0.5);
    assert_eq!(active.len(), 1);
    assert!(active[0].media_item.is_none());
}
