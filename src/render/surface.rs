use image::RgbaImage;

use crate::foundation::{
    core::Rgba8,
    error::{ReelError, ReelResult},
    math::{premultiply_pixel, premultiply_rgba8_in_place, unpremultiply_rgba8_in_place},
};

/// Premultiplied RGBA8 pixel buffer.
///
/// Used both for the output frame and for per-element layers that effects
/// run on before being composited.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Surface {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

fn buffer_len(width: u32, height: u32) -> ReelResult<usize> {
    (width as usize)
        .checked_mul(height as usize)
        .and_then(|v| v.checked_mul(4))
        .ok_or_else(|| ReelError::evaluation("surface buffer size overflow"))
}

impl Surface {
    /// Transparent surface.
    pub fn new(width: u32, height: u32) -> ReelResult<Self> {
        let len = buffer_len(width, height)?;
        Ok(Self {
            width,
            height,
            data: vec![0; len],
        })
    }

    pub fn from_premul(width: u32, height: u32, data: Vec<u8>) -> ReelResult<Self> {
        if data.len() != buffer_len(width, height)? {
            return Err(ReelError::evaluation(
                "surface data must match width*height*4",
            ));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Take ownership of a straight-alpha image and premultiply it.
    pub fn from_rgba_image(image: RgbaImage) -> Self {
        let (width, height) = image.dimensions();
        let mut data = image.into_raw();
        premultiply_rgba8_in_place(&mut data);
        Self {
            width,
            height,
            data,
        }
    }

    /// Straight-alpha copy, suitable for PNG encoding.
    pub fn to_rgba_image(&self) -> ReelResult<RgbaImage> {
        let mut data = self.data.clone();
        unpremultiply_rgba8_in_place(&mut data);
        RgbaImage::from_raw(self.width, self.height, data)
            .ok_or_else(|| ReelError::evaluation("surface to image conversion failed"))
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    fn index(&self, x: u32, y: u32) -> Option<usize> {
        (x < self.width && y < self.height)
            .then(|| ((y as usize) * (self.width as usize) + (x as usize)) * 4)
    }

    /// Premultiplied pixel at `(x, y)`.
    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgba8> {
        let i = self.index(x, y)?;
        Some([
            self.data[i],
            self.data[i + 1],
            self.data[i + 2],
            self.data[i + 3],
        ])
    }

    pub fn set_pixel(&mut self, x: u32, y: u32, px: Rgba8) {
        if let Some(i) = self.index(x, y) {
            self.data[i..i + 4].copy_from_slice(&px);
        }
    }

    /// Fill with a straight-alpha color.
    pub fn clear(&mut self, rgba: Rgba8) {
        let premul = premultiply_pixel(rgba);
        for px in self.data.chunks_exact_mut(4) {
            px.copy_from_slice(&premul);
        }
    }

    /// Fill the clipped rectangle `[x0, x1) x [y0, y1)` with a straight-alpha color.
    pub fn fill_rect(&mut self, x0: i64, y0: i64, x1: i64, y1: i64, rgba: Rgba8) {
        let premul = premultiply_pixel(rgba);
        let x0 = x0.clamp(0, i64::from(self.width)) as u32;
        let x1 = x1.clamp(0, i64::from(self.width)) as u32;
        let y0 = y0.clamp(0, i64::from(self.height)) as u32;
        let y1 = y1.clamp(0, i64::from(self.height)) as u32;
        for y in y0..y1 {
            for x in x0..x1 {
                self.set_pixel(x, y, premul);
            }
        }
    }

    /// Bilinear resample to `width x height`.
    ///
    /// Filtering premultiplied data directly keeps transparent edges free of
    /// color fringes.
    pub fn resized(&self, width: u32, height: u32) -> ReelResult<Self> {
        if width == self.width && height == self.height {
            return Ok(self.clone());
        }
        if self.is_empty() {
            return Self::new(width, height);
        }
        let src = RgbaImage::from_raw(self.width, self.height, self.data.clone())
            .ok_or_else(|| ReelError::evaluation("surface resample source is malformed"))?;
        let out =
            image::imageops::resize(&src, width, height, image::imageops::FilterType::Triangle);
        Self::from_premul(width, height, out.into_raw())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/surface.rs"]
mod tests;
