use crate::foundation::core::{Canvas, Rect, Size};

/// Fit `natural` inside the frame without upscaling and center it.
///
/// `scale = min(out_w / nat_w, out_h / nat_h, 1)`. Zero or non-finite
/// natural dimensions give an empty rectangle at the frame center.
pub fn media_bounds(canvas: Canvas, natural: Size) -> Rect {
    let out = canvas.size();
    let center = Rect::from_center_size((out.width / 2.0, out.height / 2.0), Size::ZERO);
    if !(natural.width.is_finite() && natural.height.is_finite())
        || natural.width <= 0.0
        || natural.height <= 0.0
    {
        return center;
    }

    let scale = (out.width / natural.width)
        .min(out.height / natural.height)
        .min(1.0);
    let w = natural.width * scale;
    let h = natural.height * scale;
    let x = (out.width - w) / 2.0;
    let y = (out.height - h) / 2.0;
    Rect::new(x, y, x + w, y + h)
}

/// Text anchor rectangle: explicit coordinates or the frame center, natural size.
pub fn text_bounds(canvas: Canvas, x: Option<f64>, y: Option<f64>, natural: Size) -> Rect {
    let out = canvas.size();
    let x = x.filter(|v| v.is_finite()).unwrap_or(out.width / 2.0);
    let y = y.filter(|v| v.is_finite()).unwrap_or(out.height / 2.0);
    Rect::from_origin_size((x, y), natural)
}

#[cfg(test)]
#[path = "../../tests/unit/render/bounds.rs"]
mod tests;
