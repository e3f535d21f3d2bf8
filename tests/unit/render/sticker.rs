use super::*;
use crate::timeline::model::StickerTiming;

fn sticker(id: &str, z_index: i32, timing: Option<(f64, f64)>) -> StickerOverlay {
    StickerOverlay {
        id: id.to_string(),
        media_id: "img".to_string(),
        x_pct: 50.0,
        y_pct: 50.0,
        width_pct: 10.0,
        height_pct: 10.0,
        rotation_deg: 0.0,
        opacity: 1.0,
        z_index,
        timing: timing.map(|(start_time, end_time)| StickerTiming {
            start_time,
            end_time,
        }),
    }
}

#[test]
fn visibility_window_is_half_open_and_sorted_by_z() {
    let all = vec![
        sticker("top", 5, None),
        sticker("early", 1, Some((0.0, 1.0))),
        sticker("bottom", -1, Some((1.0, 2.0))),
    ];
    let ids = |t| {
        visible_stickers(&all, t)
            .iter()
            .map(|s| s.id.clone())
            .collect::<Vec<_>>()
    };
    assert_eq!(ids(0.5), vec!["early", "top"]);
    assert_eq!(ids(1.0), vec!["bottom", "top"]);
    assert_eq!(ids(2.0), vec!["top"]);
}

#[test]
fn noop_renderer_reports_every_sticker() {
    let s = sticker("a", 0, None);
    let mut surface = Surface::new(4, 4).unwrap();
    let frame = StickerFrame {
        width: 4,
        height: 4,
        time: 0.0,
    };
    let report = NoopStickerRenderer.render(&mut surface, &[&s], &HashMap::new(), frame);
    assert_eq!(report.attempted, 1);
    assert_eq!(report.successful, 1);
    assert!(report.failed.is_empty());
}
