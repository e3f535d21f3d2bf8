use super::*;

fn solid(rgba: [u8; 4]) -> Surface {
    let mut s = Surface::new(2, 2).unwrap();
    s.clear(rgba);
    s
}

fn apply(params: EffectParams, rgba: [u8; 4]) -> [u8; 4] {
    let mut s = solid(rgba);
    FilterSettings::from_params(&params).apply(&mut s).unwrap();
    s.pixel(0, 0).unwrap()
}

#[test]
fn identity_values_leave_pixels_alone() {
    let params = EffectParams::new()
        .with_number(keys::BRIGHTNESS, 100.0)
        .with_number(keys::CONTRAST, 100.0)
        .with_number(keys::SATURATION, 100.0)
        .with_number(keys::HUE_ROTATE, 360.0)
        .with_number(keys::GRAYSCALE, 0.0);
    assert_eq!(apply(params, [12, 34, 56, 255]), [12, 34, 56, 255]);
}

#[test]
fn brightness_scales_and_clamps() {
    let half = EffectParams::new().with_number(keys::BRIGHTNESS, 50.0);
    assert_eq!(apply(half, [200, 100, 50, 255]), [100, 50, 25, 255]);
    let double = EffectParams::new().with_number(keys::BRIGHTNESS, 200.0);
    assert_eq!(apply(double, [200, 100, 0, 255]), [255, 200, 0, 255]);
}

#[test]
fn zero_contrast_is_mid_gray() {
    let params = EffectParams::new().with_number(keys::CONTRAST, 0.0);
    assert_eq!(apply(params, [0, 255, 30, 255]), [128, 128, 128, 255]);
}

#[test]
fn full_grayscale_equalizes_channels() {
    let params = EffectParams::new().with_number(keys::GRAYSCALE, 100.0);
    let px = apply(params, [255, 0, 0, 255]);
    assert!(px[0].abs_diff(px[1]) <= 1 && px[1].abs_diff(px[2]) <= 1);
    assert!((52..=56).contains(&px[0]));
}

#[test]
fn full_invert_flips_channels() {
    let params = EffectParams::new().with_number(keys::INVERT, 100.0);
    assert_eq!(apply(params, [0, 255, 100, 255]), [255, 0, 155, 255]);
}

#[test]
fn transparent_pixels_are_skipped() {
    let params = EffectParams::new().with_number(keys::INVERT, 100.0);
    assert_eq!(apply(params, [0, 0, 0, 0]), [0, 0, 0, 0]);
}

#[test]
fn opacity_is_exposed_as_factor() {
    let f = FilterSettings::from_params(&EffectParams::new().with_number(keys::OPACITY, 40.0));
    assert!((f.opacity_factor() - 0.4).abs() < 1e-6);
    assert_eq!(FilterSettings::default().opacity_factor(), 1.0);
}
