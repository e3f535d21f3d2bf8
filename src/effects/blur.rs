use crate::{
    foundation::error::{ReelError, ReelResult},
    render::surface::Surface,
};

/// Gaussian blur for a CSS `blur(<px>)` length.
///
/// The CSS length is the standard deviation; the kernel reaches out to
/// `ceil(3 * sigma)` pixels.
pub fn blur_surface(layer: &mut Surface, sigma_px: f64) -> ReelResult<()> {
    if !sigma_px.is_finite() || sigma_px <= 0.0 || layer.is_empty() {
        return Ok(());
    }
    let radius = (sigma_px * 3.0).ceil().clamp(1.0, 256.0) as u32;
    let blurred = blur_rgba8_premul(
        layer.data(),
        layer.width(),
        layer.height(),
        radius,
        sigma_px as f32,
    )?;
    layer.data_mut().copy_from_slice(&blurred);
    Ok(())
}

/// Separable Q16 fixed-point gaussian over premultiplied RGBA8.
pub fn blur_rgba8_premul(
    src: &[u8],
    width: u32,
    height: u32,
    radius: u32,
    sigma: f32,
) -> ReelResult<Vec<u8>> {
    let expected_len = (width as usize)
        .checked_mul(height as usize)
        .and_then(|v| v.checked_mul(4))
        .ok_or_else(|| ReelError::evaluation("blur buffer size overflow"))?;
    if src.len() != expected_len {
        return Err(ReelError::evaluation(
            "blur expects src matching width*height*4",
        ));
    }
    if radius == 0 || expected_len == 0 {
        return Ok(src.to_vec());
    }

    let kernel = gaussian_kernel_q16(radius, sigma)?;
    let mut tmp = vec![0u8; expected_len];
    let mut out = vec![0u8; expected_len];

    let (w, h) = (width as usize, height as usize);
    pass(src, &mut tmp, w, h, &kernel, Axis::Horizontal);
    pass(&tmp, &mut out, w, h, &kernel, Axis::Vertical);
    Ok(out)
}

fn gaussian_kernel_q16(radius: u32, sigma: f32) -> ReelResult<Vec<u32>> {
    if !sigma.is_finite() || sigma <= 0.0 {
        return Err(ReelError::validation("blur sigma must be > 0"));
    }

    let r = radius as i32;
    let sigma = f64::from(sigma);
    let denom = 2.0 * sigma * sigma;
    let weights_f: Vec<f64> = (-r..=r)
        .map(|i| (-f64::from(i * i) / denom).exp())
        .collect();
    let sum: f64 = weights_f.iter().sum();
    if sum <= 0.0 {
        return Err(ReelError::evaluation("gaussian kernel sum is zero"));
    }

    let mut weights: Vec<u32> = weights_f
        .iter()
        .map(|wf| ((wf / sum) * 65536.0).round().clamp(0.0, 65536.0) as u32)
        .collect();
    // Rounding drift goes to the center tap so the kernel sums to exactly 1.0.
    let acc: i64 = weights.iter().map(|&w| i64::from(w)).sum();
    let delta = 65536 - acc;
    if delta != 0 {
        let mid = weights.len() / 2;
        weights[mid] = (i64::from(weights[mid]) + delta).clamp(0, 65536) as u32;
    }
    Ok(weights)
}

#[derive(Clone, Copy)]
enum Axis {
    Horizontal,
    Vertical,
}

fn pass(src: &[u8], dst: &mut [u8], w: usize, h: usize, k: &[u32], axis: Axis) {
    let radius = (k.len() / 2) as i64;
    for y in 0..h {
        for x in 0..w {
            let mut acc = [0u64; 4];
            for (ki, &kw) in k.iter().enumerate() {
                let d = ki as i64 - radius;
                let (sx, sy) = match axis {
                    Axis::Horizontal => ((x as i64 + d).clamp(0, w as i64 - 1) as usize, y),
                    Axis::Vertical => (x, (y as i64 + d).clamp(0, h as i64 - 1) as usize),
                };
                let idx = (sy * w + sx) * 4;
                for c in 0..4 {
                    acc[c] += u64::from(kw) * u64::from(src[idx + c]);
                }
            }
            let out_idx = (y * w + x) * 4;
            for c in 0..4 {
                dst[out_idx + c] = q16_to_u8(acc[c]);
            }
        }
    }
}

fn q16_to_u8(acc: u64) -> u8 {
    ((acc + 32768) >> 16).min(255) as u8
}

#[cfg(test)]
#[path = "../../tests/unit/effects/blur.rs"]
mod tests;
