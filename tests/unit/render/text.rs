use super::*;

const HD: Canvas = Canvas {
    width: 1920,
    height: 1080,
};

fn text(content: &str) -> TextElement {
    serde_json::from_value(serde_json::json!({ "content": content })).unwrap()
}

fn system_font() -> Option<std::path::PathBuf> {
    [
        "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
        "/usr/share/fonts/dejavu/DejaVuSans.ttf",
        "/usr/share/fonts/TTF/DejaVuSans.ttf",
        "/System/Library/Fonts/Supplemental/Arial.ttf",
        "C:\\Windows\\Fonts\\arial.ttf",
    ]
    .iter()
    .map(std::path::PathBuf::from)
    .find(|p| p.exists())
}

#[test]
fn centered_text_is_placed_around_frame_center() {
    let el = text("Hello");
    let at = text_placement(HD, &el, Size::new(200.0, 40.0));
    assert_eq!((at.x0, at.y0, at.x1, at.y1), (860.0, 520.0, 1060.0, 560.0));
}

#[test]
fn left_and_right_alignment_use_anchor_edges() {
    let mut el = text("Hello");
    el.x = Some(100.0);
    el.y = Some(50.0);
    el.text_align = TextAlign::Left;
    assert_eq!(text_placement(HD, &el, Size::new(80.0, 20.0)).x0, 100.0);
    el.text_align = TextAlign::Right;
    assert_eq!(text_placement(HD, &el, Size::new(80.0, 20.0)).x1, 100.0);
}

#[test]
fn without_fonts_text_is_skipped() {
    let renderer = TextRenderer::new(32.0);
    assert!(!renderer.has_fonts());
    let mut surface = Surface::new(16, 16).unwrap();
    assert!(!draw_text(&mut surface, Canvas { width: 16, height: 16 }, &text("Hi"), &renderer));
    assert!(surface.data().iter().all(|&b| b == 0));
}

#[test]
fn unparseable_font_is_rejected_and_missing_config_paths_are_skipped() {
    let mut renderer = TextRenderer::new(32.0);
    assert!(renderer.add_font("junk", vec![1, 2, 3]).is_err());

    let config = TextConfig {
        font_paths: vec!["/definitely/not/here.ttf".into()],
        default_font_size: 20.0,
    };
    assert!(!TextRenderer::from_config(&config).has_fonts());
}

#[test]
fn renders_visible_glyphs_with_system_font() {
    let Some(path) = system_font() else {
        eprintln!("skipping: no system font found");
        return;
    };
    let mut renderer = TextRenderer::new(24.0);
    renderer.load_font_file(&path).unwrap();

    let single = renderer.rasterize(&text("Hello")).unwrap();
    let multi = renderer.rasterize(&text("Hello\nWorld")).unwrap();
    assert!(multi.height() > single.height());
    assert!(single.data().chunks_exact(4).any(|px| px[3] > 0));

    let mut frame = Surface::new(200, 100).unwrap();
    let canvas = Canvas {
        width: 200,
        height: 100,
    };
    assert!(draw_text(&mut frame, canvas, &text("Hello"), &renderer));
    assert!(frame.data().chunks_exact(4).any(|px| px[3] > 0));
}
