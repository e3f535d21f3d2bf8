use crate::{
    foundation::{
        core::Rgba8,
        error::{ReelError, ReelResult},
    },
    render::surface::Surface,
};

const MAX_GRID: u32 = 32;

/// Readable pixel storage the validator can sample from.
pub trait PixelSource {
    fn dimensions(&self) -> (u32, u32);

    /// Premultiplied pixel at `(x, y)`.
    fn read_pixel(&self, x: u32, y: u32) -> ReelResult<Rgba8>;
}

impl PixelSource for Surface {
    fn dimensions(&self) -> (u32, u32) {
        (self.width(), self.height())
    }

    fn read_pixel(&self, x: u32, y: u32) -> ReelResult<Rgba8> {
        self.pixel(x, y)
            .ok_or_else(|| ReelError::evaluation(format!("pixel ({x}, {y}) out of bounds")))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameRegion {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameValidation {
    pub is_valid: bool,
    pub reason: Option<String>,
}

impl FrameValidation {
    fn valid() -> Self {
        Self {
            is_valid: true,
            reason: None,
        }
    }

    fn invalid(reason: impl Into<String>) -> Self {
        Self {
            is_valid: false,
            reason: Some(reason.into()),
        }
    }
}

/// Reject regions that rendered as uniformly black or fully transparent.
///
/// Samples a grid of at most 32x32 points. A pixel is black when it is
/// opaque and every channel is `<= black_threshold`. Sampling errors are
/// reported as valid so a broken reader never blocks the export.
pub fn validate_rendered_frame(
    source: &dyn PixelSource,
    region: FrameRegion,
    attempt: u32,
    black_threshold: u8,
) -> FrameValidation {
    match scan(source, region, black_threshold) {
        Ok(verdict) => {
            if !verdict.is_valid {
                tracing::debug!(attempt, reason = ?verdict.reason, "rendered region rejected");
            }
            verdict
        }
        Err(e) => {
            tracing::warn!(attempt, error = %e, "frame validation failed, accepting frame");
            FrameValidation {
                is_valid: true,
                reason: Some(format!("Validation error: {e}")),
            }
        }
    }
}

fn scan(
    source: &dyn PixelSource,
    region: FrameRegion,
    black_threshold: u8,
) -> ReelResult<FrameValidation> {
    let (sw, sh) = source.dimensions();
    let x1 = region.x.saturating_add(region.width).min(sw);
    let y1 = region.y.saturating_add(region.height).min(sh);
    if region.x >= x1 || region.y >= y1 {
        return Ok(FrameValidation::invalid("empty region"));
    }
    let (w, h) = (x1 - region.x, y1 - region.y);
    let nx = w.min(MAX_GRID);
    let ny = h.min(MAX_GRID);

    let mut all_black = true;
    let mut all_transparent = true;
    for j in 0..ny {
        let y = region.y + (u64::from(j) * u64::from(h) / u64::from(ny)) as u32;
        for i in 0..nx {
            let x = region.x + (u64::from(i) * u64::from(w) / u64::from(nx)) as u32;
            let [r, g, b, a] = source.read_pixel(x, y)?;
            if a != 0 {
                all_transparent = false;
            }
            if a != 255 || r > black_threshold || g > black_threshold || b > black_threshold {
                all_black = false;
            }
            if !all_black && !all_transparent {
                return Ok(FrameValidation::valid());
            }
        }
    }

    if all_transparent {
        Ok(FrameValidation::invalid("region is fully transparent"))
    } else {
        Ok(FrameValidation::invalid("region is mostly black"))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/validate.rs"]
mod tests;
