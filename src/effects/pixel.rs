//! Per-pixel layer algorithms.
//!
//! Every function reads only the layer it is given and its own parameters.
//! Geometric remaps sample from a copy of the pre-effect layer.

use std::f64::consts::TAU;

use rayon::prelude::*;

use crate::{
    foundation::{
        core::Rgba8,
        math::{luma01, unpremultiply_rgba8_in_place},
    },
    render::surface::Surface,
};

/// Replace each `block x block` cell with the average RGBA of its pixels.
pub fn pixelate(layer: &mut Surface, block: u32) {
    if block <= 1 || layer.is_empty() {
        return;
    }
    let (w, h) = (layer.width(), layer.height());
    for cy in (0..h).step_by(block as usize) {
        for cx in (0..w).step_by(block as usize) {
            let x1 = (cx + block).min(w);
            let y1 = (cy + block).min(h);
            let mut sum = [0u64; 4];
            let mut n = 0u64;
            for y in cy..y1 {
                for x in cx..x1 {
                    if let Some(px) = layer.pixel(x, y) {
                        for c in 0..4 {
                            sum[c] += u64::from(px[c]);
                        }
                        n += 1;
                    }
                }
            }
            if n == 0 {
                continue;
            }
            let avg = sum.map(|s| ((s + n / 2) / n) as u8);
            for y in cy..y1 {
                for x in cx..x1 {
                    layer.set_pixel(x, y, avg);
                }
            }
        }
    }
}

/// Shift row `y` horizontally by `sin(y / height * frequency * 2π) * amplitude`.
///
/// Pixels uncovered by the shift become transparent.
pub fn wave(layer: &mut Surface, amplitude: f64, frequency: f64) {
    if layer.is_empty() || amplitude == 0.0 {
        return;
    }
    let src = layer.clone();
    let (w, h) = (layer.width(), layer.height());
    for y in 0..h {
        let phase = f64::from(y) / f64::from(h) * frequency * TAU;
        let shift = (phase.sin() * amplitude).round() as i64;
        for x in 0..w {
            let sx = i64::from(x) - shift;
            let px = if (0..i64::from(w)).contains(&sx) {
                src.pixel(sx as u32, y).unwrap_or([0; 4])
            } else {
                [0; 4]
            };
            layer.set_pixel(x, y, px);
        }
    }
}

/// Swirl around the layer center.
///
/// A pixel at distance `d < r_max` is sampled from the source rotated by
/// `((r_max - d) / r_max)^2 * angle`. `r_max` defaults to half the shorter
/// side; pixels outside it are unchanged.
pub fn twist(layer: &mut Surface, angle_deg: f64, radius: Option<f64>) {
    if layer.is_empty() || angle_deg == 0.0 {
        return;
    }
    let (w, h) = (layer.width(), layer.height());
    let r_max = radius
        .filter(|r| r.is_finite() && *r > 0.0)
        .unwrap_or_else(|| f64::from(w.min(h)) / 2.0);
    let angle = angle_deg.to_radians();
    let cx = f64::from(w) / 2.0;
    let cy = f64::from(h) / 2.0;
    let src = layer.clone();

    for y in 0..h {
        for x in 0..w {
            let dx = f64::from(x) + 0.5 - cx;
            let dy = f64::from(y) + 0.5 - cy;
            let d = dx.hypot(dy);
            if d >= r_max {
                continue;
            }
            let k = (r_max - d) / r_max;
            let theta = dy.atan2(dx) + k * k * angle;
            let sx = (cx + d * theta.cos() - 0.5).round();
            let sy = (cy + d * theta.sin() - 0.5).round();
            let sx = sx.clamp(0.0, f64::from(w - 1)) as u32;
            let sy = sy.clamp(0.0, f64::from(h - 1)) as u32;
            if let Some(px) = src.pixel(sx, sy) {
                layer.set_pixel(x, y, px);
            }
        }
    }
}

/// Black dots on white, one per `2 * dot_size` cell, sized by darkness.
pub fn halftone(layer: &mut Surface, dot_size: f64) {
    if layer.is_empty() || !(dot_size.is_finite() && dot_size > 0.0) {
        return;
    }
    let (w, h) = (layer.width(), layer.height());
    let cell = (dot_size * 2.0).round().max(1.0) as u32;

    let mut straight = layer.data().to_vec();
    unpremultiply_rgba8_in_place(&mut straight);
    let stride = w as usize * 4;

    let mut dots = Vec::new();
    for cy in (0..h).step_by(cell as usize) {
        for cx in (0..w).step_by(cell as usize) {
            let x1 = (cx + cell).min(w);
            let y1 = (cy + cell).min(h);
            let mut sum = 0.0f64;
            let mut n = 0u32;
            for y in cy..y1 {
                for x in cx..x1 {
                    let i = y as usize * stride + x as usize * 4;
                    sum += f64::from(luma01(straight[i], straight[i + 1], straight[i + 2]));
                    n += 1;
                }
            }
            let brightness = if n == 0 { 1.0 } else { sum / f64::from(n) };
            let radius = (1.0 - brightness) * dot_size;
            let center = (
                f64::from(cx) + f64::from(cell) / 2.0,
                f64::from(cy) + f64::from(cell) / 2.0,
            );
            dots.push((center, radius));
        }
    }

    layer.clear([255, 255, 255, 255]);
    for ((ox, oy), r) in dots {
        fill_circle(layer, ox, oy, r, [0, 0, 0, 255]);
    }
}

fn fill_circle(layer: &mut Surface, ox: f64, oy: f64, r: f64, px: Rgba8) {
    if r <= 0.0 {
        return;
    }
    let x0 = (ox - r).floor().max(0.0) as u32;
    let y0 = (oy - r).floor().max(0.0) as u32;
    let x1 = ((ox + r).ceil().max(0.0) as u32).min(layer.width());
    let y1 = ((oy + r).ceil().max(0.0) as u32).min(layer.height());
    let r2 = r * r;
    for y in y0..y1 {
        for x in x0..x1 {
            let dx = f64::from(x) + 0.5 - ox;
            let dy = f64::from(y) + 0.5 - oy;
            if dx * dx + dy * dy <= r2 {
                layer.set_pixel(x, y, px);
            }
        }
    }
}

/// Oil-paint filter: each pixel takes the mean color of the most common
/// intensity bucket in its `(2 * brush + 1)^2` neighborhood.
pub fn oil_painting(layer: &mut Surface, brush: u32, intensity: f64) {
    if layer.is_empty() || brush == 0 || !(intensity.is_finite() && intensity > 0.0) {
        return;
    }
    let (w, h) = (layer.width() as i64, layer.height() as i64);
    let stride = w as usize * 4;
    let r = i64::from(brush);
    let src = layer.data().to_vec();

    let level_of = |i: usize| -> usize {
        let avg = (f64::from(src[i]) + f64::from(src[i + 1]) + f64::from(src[i + 2])) / 3.0;
        ((avg * intensity / 255.0) as usize).min(255)
    };

    layer
        .data_mut()
        .par_chunks_mut(stride)
        .enumerate()
        .for_each(|(y, row)| {
            let y = y as i64;
            let mut counts = [0u32; 256];
            let mut sums = [[0u64; 4]; 256];
            for x in 0..w {
                counts.fill(0);
                for s in sums.iter_mut() {
                    *s = [0; 4];
                }
                for ny in (y - r).max(0)..=(y + r).min(h - 1) {
                    for nx in (x - r).max(0)..=(x + r).min(w - 1) {
                        let i = ny as usize * stride + nx as usize * 4;
                        let level = level_of(i);
                        counts[level] += 1;
                        for c in 0..4 {
                            sums[level][c] += u64::from(src[i + c]);
                        }
                    }
                }
                let mut best = 0usize;
                for level in 1..256 {
                    if counts[level] > counts[best] {
                        best = level;
                    }
                }
                let n = u64::from(counts[best].max(1));
                let out = &mut row[x as usize * 4..x as usize * 4 + 4];
                for c in 0..4 {
                    out[c] = ((sums[best][c] + n / 2) / n) as u8;
                }
            }
        });
}

#[cfg(test)]
#[path = "../../tests/unit/effects/pixel.rs"]
mod tests;
