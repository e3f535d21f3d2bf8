use super::*;

const HD: Canvas = Canvas {
    width: 1920,
    height: 1080,
};

#[test]
fn larger_media_is_downscaled_and_centered() {
    let r = media_bounds(HD, Size::new(3840.0, 1080.0));
    assert_eq!(r.width(), 1920.0);
    assert_eq!(r.height(), 540.0);
    assert_eq!((r.x0, r.y0), (0.0, 270.0));
}

#[test]
fn smaller_media_is_never_upscaled() {
    let r = media_bounds(HD, Size::new(640.0, 480.0));
    assert_eq!((r.width(), r.height()), (640.0, 480.0));
    assert_eq!((r.x0, r.y0), (640.0, 300.0));
}

#[test]
fn bounds_preserve_aspect_and_stay_inside_frame() {
    for (w, h) in [(1000.0, 3000.0), (4000.0, 100.0), (1920.0, 1080.0), (7.0, 5.0)] {
        let r = media_bounds(HD, Size::new(w, h));
        assert!(r.x0 >= 0.0 && r.y0 >= 0.0);
        assert!(r.x1 <= 1920.0 + 1e-9 && r.y1 <= 1080.0 + 1e-9);
        assert!((r.width() / r.height() - w / h).abs() < 1e-9);
    }
}

#[test]
fn degenerate_natural_size_is_empty_at_center() {
    for size in [Size::new(0.0, 100.0), Size::new(f64::NAN, 10.0)] {
        let r = media_bounds(HD, size);
        assert_eq!(r.area(), 0.0);
        assert_eq!((r.x0, r.y0), (960.0, 540.0));
    }
}

#[test]
fn text_uses_explicit_coordinates_without_scaling() {
    let r = text_bounds(HD, Some(10.0), Some(20.0), Size::new(300.0, 50.0));
    assert_eq!((r.x0, r.y0, r.width(), r.height()), (10.0, 20.0, 300.0, 50.0));
}

#[test]
fn text_defaults_to_frame_center() {
    let r = text_bounds(HD, None, Some(5.0), Size::new(10.0, 10.0));
    assert_eq!((r.x0, r.y0), (960.0, 5.0));
}
