use crate::{
    effects::blend::BlendMode,
    foundation::{
        core::Rgba8,
        math::{mul_div255_u8, to_u8},
    },
    render::surface::Surface,
};

/// Premultiplied source-over with an extra opacity factor.
pub fn over(dst: Rgba8, src: Rgba8, opacity: f32) -> Rgba8 {
    let opacity = opacity.clamp(0.0, 1.0);
    if opacity <= 0.0 || src[3] == 0 {
        return dst;
    }

    let op = ((opacity * 255.0).round() as i32).clamp(0, 255) as u16;
    let sa = mul_div255_u8(u16::from(src[3]), op);
    if sa == 0 {
        return dst;
    }

    let inv = 255u16 - u16::from(sa);

    let mut out = [0u8; 4];
    out[3] = sa.saturating_add(mul_div255_u8(u16::from(dst[3]), inv));
    for i in 0..3 {
        let sc = mul_div255_u8(u16::from(src[i]), op);
        let dc = mul_div255_u8(u16::from(dst[i]), inv);
        out[i] = sc.saturating_add(dc);
    }
    out
}

/// Separable blend of premultiplied pixels.
///
/// `co = cs*(1-ab) + cb*(1-as) + as*ab*B(Cb, Cs)`, `ao = as + ab*(1-as)`.
/// `Normal` takes the integer source-over path.
pub fn blend_pixel(dst: Rgba8, src: Rgba8, mode: BlendMode, opacity: f32) -> Rgba8 {
    if mode == BlendMode::Normal {
        return over(dst, src, opacity);
    }
    let opacity = opacity.clamp(0.0, 1.0);
    if opacity <= 0.0 || src[3] == 0 {
        return dst;
    }

    let sa = f32::from(src[3]) / 255.0 * opacity;
    let da = f32::from(dst[3]) / 255.0;
    let mut out = [0u8; 4];
    for i in 0..3 {
        let cs = f32::from(src[i]) / 255.0 * opacity;
        let cd = f32::from(dst[i]) / 255.0;
        let straight_s = if sa > 0.0 { (cs / sa).min(1.0) } else { 0.0 };
        let straight_d = if da > 0.0 { (cd / da).min(1.0) } else { 0.0 };
        let mixed = mode.blend_channel(straight_d, straight_s);
        let co = cs * (1.0 - da) + cd * (1.0 - sa) + sa * da * mixed;
        out[i] = to_u8(co * 255.0);
    }
    out[3] = to_u8((sa + da * (1.0 - sa)) * 255.0);
    out
}

/// Composite `layer` onto `dst` with its top-left corner at `(x, y)`.
///
/// Pixels falling outside `dst` are clipped.
pub fn draw_layer(
    dst: &mut Surface,
    layer: &Surface,
    x: i64,
    y: i64,
    opacity: f32,
    mode: BlendMode,
) {
    let dw = i64::from(dst.width());
    let dh = i64::from(dst.height());
    let lw = i64::from(layer.width());
    let lh = i64::from(layer.height());

    let x0 = x.max(0);
    let y0 = y.max(0);
    let x1 = (x + lw).min(dw);
    let y1 = (y + lh).min(dh);
    if x0 >= x1 || y0 >= y1 {
        return;
    }

    let dst_stride = dst.width() as usize * 4;
    let src_stride = layer.width() as usize * 4;
    let span = (x1 - x0) as usize * 4;
    let src_data = layer.data();
    let dst_data = dst.data_mut();
    for dy in y0..y1 {
        let sy = (dy - y) as usize;
        let d_off = dy as usize * dst_stride + x0 as usize * 4;
        let s_off = sy * src_stride + (x0 - x) as usize * 4;
        let d_row = &mut dst_data[d_off..d_off + span];
        let s_row = &src_data[s_off..s_off + span];
        for (d, s) in d_row.chunks_exact_mut(4).zip(s_row.chunks_exact(4)) {
            let out = blend_pixel(
                [d[0], d[1], d[2], d[3]],
                [s[0], s[1], s[2], s[3]],
                mode,
                opacity,
            );
            d.copy_from_slice(&out);
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/composite.rs"]
mod tests;
