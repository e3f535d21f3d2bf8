use super::*;

#[test]
fn new_surface_is_transparent() {
    let s = Surface::new(3, 2).unwrap();
    assert_eq!(s.data().len(), 24);
    assert!(s.data().iter().all(|&b| b == 0));
}

#[test]
fn from_premul_rejects_wrong_length() {
    assert!(Surface::from_premul(2, 2, vec![0; 15]).is_err());
    assert!(Surface::from_premul(2, 2, vec![0; 16]).is_ok());
}

#[test]
fn clear_premultiplies() {
    let mut s = Surface::new(1, 1).unwrap();
    s.clear([255, 0, 0, 128]);
    assert_eq!(s.pixel(0, 0), Some([128, 0, 0, 128]));
}

#[test]
fn image_round_trip_keeps_opaque_pixels() {
    let img = RgbaImage::from_raw(2, 1, vec![10, 20, 30, 255, 0, 0, 0, 0]).unwrap();
    let s = Surface::from_rgba_image(img.clone());
    assert_eq!(s.to_rgba_image().unwrap(), img);
}

#[test]
fn fill_rect_clips_to_bounds() {
    let mut s = Surface::new(4, 4).unwrap();
    s.fill_rect(-2, -2, 2, 1, [255, 255, 255, 255]);
    assert_eq!(s.pixel(0, 0), Some([255, 255, 255, 255]));
    assert_eq!(s.pixel(1, 0), Some([255, 255, 255, 255]));
    assert_eq!(s.pixel(2, 0), Some([0, 0, 0, 0]));
    assert_eq!(s.pixel(0, 1), Some([0, 0, 0, 0]));
    assert_eq!(s.pixel(9, 9), None);
}

#[test]
fn resize_of_constant_surface_stays_constant() {
    let mut s = Surface::new(8, 4).unwrap();
    s.clear([40, 80, 120, 255]);
    let r = s.resized(4, 2).unwrap();
    assert_eq!((r.width(), r.height()), (4, 2));
    assert!(r.data().chunks_exact(4).all(|px| px == [40, 80, 120, 255]));
}
