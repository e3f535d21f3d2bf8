use super::*;

#[test]
fn radius_0_is_identity() {
    let src = vec![1u8, 2, 3, 4, 5, 6, 7, 8];
    assert_eq!(blur_rgba8_premul(&src, 1, 2, 0, 1.0).unwrap(), src);
}

#[test]
fn constant_image_is_unchanged() {
    let (w, h) = (4u32, 3u32);
    let src = [10u8, 20, 30, 40].repeat((w * h) as usize);
    assert_eq!(blur_rgba8_premul(&src, w, h, 3, 2.0).unwrap(), src);
}

#[test]
fn single_pixel_spreads_and_conserves_alpha() {
    let (w, h) = (5u32, 5u32);
    let mut src = vec![0u8; (w * h * 4) as usize];
    let center = ((2 * w + 2) * 4) as usize;
    src[center..center + 4].copy_from_slice(&[255, 255, 255, 255]);

    let out = blur_rgba8_premul(&src, w, h, 2, 1.2).unwrap();
    assert!(out.chunks_exact(4).filter(|px| px[3] != 0).count() > 1);
    let sum_a: u32 = out.chunks_exact(4).map(|px| u32::from(px[3])).sum();
    assert!((sum_a as i32 - 255).abs() <= 4);
}

#[test]
fn mismatched_length_is_rejected() {
    assert!(blur_rgba8_premul(&[0; 7], 1, 2, 1, 1.0).is_err());
}

#[test]
fn blur_surface_ignores_non_positive_sigma() {
    let mut s = Surface::new(2, 2).unwrap();
    s.set_pixel(0, 0, [255, 255, 255, 255]);
    let before = s.clone();
    blur_surface(&mut s, 0.0).unwrap();
    blur_surface(&mut s, f64::NAN).unwrap();
    assert_eq!(s, before);
}
