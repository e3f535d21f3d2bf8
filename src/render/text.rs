use std::path::Path;

use anyhow::Context;
use fontdue::{Font, FontSettings};

use crate::{
    effects::blend::BlendMode,
    foundation::{
        config::TextConfig,
        core::{Canvas, Rect, Size, Vec2},
        error::{ReelError, ReelResult},
        math::{premultiply_pixel, to_u8},
    },
    render::{bounds::text_bounds, composite, surface::Surface},
    timeline::model::{TextAlign, TextElement},
};

const LINE_HEIGHT: f32 = 1.3;

/// CPU text rasterizer over a small set of loaded font families.
pub struct TextRenderer {
    fonts: Vec<(String, Font)>,
    default_size: f32,
}

impl std::fmt::Debug for TextRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextRenderer")
            .field("families", &self.families().collect::<Vec<_>>())
            .field("default_size", &self.default_size)
            .finish()
    }
}

struct LineMeasure {
    width: i32,
    ascent: i32,
    descent: i32,
}

impl TextRenderer {
    pub fn new(default_size: f32) -> Self {
        Self {
            fonts: Vec::new(),
            default_size,
        }
    }

    /// Load every configured font; unreadable files are logged and skipped.
    pub fn from_config(config: &TextConfig) -> Self {
        let mut renderer = Self::new(config.default_font_size);
        for path in &config.font_paths {
            if let Err(e) = renderer.load_font_file(path) {
                tracing::warn!(path = %path.display(), error = %e, "font not loaded");
            }
        }
        renderer
    }

    /// Register a font under its file stem.
    pub fn load_font_file(&mut self, path: &Path) -> ReelResult<()> {
        let data = std::fs::read(path).with_context(|| format!("read font '{}'", path.display()))?;
        let family = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.add_font(&family, data)
    }

    pub fn add_font(&mut self, family: &str, data: Vec<u8>) -> ReelResult<()> {
        let font = Font::from_bytes(data, FontSettings::default())
            .map_err(|e| ReelError::validation(format!("parse font '{family}': {e}")))?;
        self.fonts.push((family.to_string(), font));
        Ok(())
    }

    pub fn has_fonts(&self) -> bool {
        !self.fonts.is_empty()
    }

    pub fn families(&self) -> impl Iterator<Item = &str> {
        self.fonts.iter().map(|(name, _)| name.as_str())
    }

    /// Case-insensitive family match, falling back to the first font.
    fn font_for(&self, family: Option<&str>) -> Option<&Font> {
        family
            .and_then(|want| {
                self.fonts
                    .iter()
                    .find(|(name, _)| name.eq_ignore_ascii_case(want))
            })
            .or_else(|| self.fonts.first())
            .map(|(_, font)| font)
    }

    fn measure_line(font: &Font, text: &str, size: f32) -> LineMeasure {
        let mut width = 0.0f32;
        let mut ascent = 0;
        let mut descent = 0;
        let chars: Vec<char> = if text.is_empty() { vec![' '] } else { text.chars().collect() };
        for ch in chars {
            let m = font.metrics(ch, size);
            ascent = ascent.max(m.height as i32 + m.ymin);
            descent = descent.max(-m.ymin);
            if !text.is_empty() {
                width += m.advance_width;
            }
        }
        LineMeasure {
            width: width.ceil() as i32,
            ascent,
            descent,
        }
    }

    /// Rasterize `el` into a tightly sized layer. `None` when no font is loaded.
    pub fn rasterize(&self, el: &TextElement) -> Option<Surface> {
        let font = self.font_for(el.font_family.as_deref())?;
        let size = el
            .font_size
            .filter(|s| s.is_finite() && *s > 0.0)
            .unwrap_or(self.default_size);
        let lines: Vec<&str> = el.content.split('\n').collect();
        let measures: Vec<LineMeasure> = lines
            .iter()
            .map(|l| Self::measure_line(font, l, size))
            .collect();

        let spacing = (size * LINE_HEIGHT).round() as i32;
        let max_width = measures.iter().map(|m| m.width).max().unwrap_or(0).max(1);
        let last = measures.last().map_or(1, |m| m.ascent + m.descent);
        let height = (spacing * (lines.len() as i32 - 1) + last).max(1);

        let mut layer = Surface::new(max_width as u32, height as u32).ok()?;
        if let Some(bg) = el.background_color {
            layer.clear(bg);
        }

        let [r, g, b, a] = el.color;
        let mut y_offset = 0;
        for (line, m) in lines.iter().zip(&measures) {
            let x_offset = match el.text_align {
                TextAlign::Left => 0,
                TextAlign::Center => (max_width - m.width) / 2,
                TextAlign::Right => max_width - m.width,
            };
            let mut cursor = x_offset as f32;
            for ch in line.chars() {
                let (metrics, bitmap) = font.rasterize(ch, size);
                let gx0 = cursor.round() as i32 + metrics.xmin;
                let gy0 = y_offset + m.ascent - (metrics.height as i32 + metrics.ymin);
                for gy in 0..metrics.height {
                    for gx in 0..metrics.width {
                        let coverage = bitmap[gy * metrics.width + gx];
                        if coverage == 0 {
                            continue;
                        }
                        let (px, py) = (gx0 + gx as i32, gy0 + gy as i32);
                        if px < 0 || py < 0 {
                            continue;
                        }
                        let alpha = to_u8(f32::from(coverage) * f32::from(a) / 255.0);
                        let glyph = premultiply_pixel([r, g, b, alpha]);
                        if let Some(dst) = layer.pixel(px as u32, py as u32) {
                            layer.set_pixel(px as u32, py as u32, composite::over(dst, glyph, 1.0));
                        }
                    }
                }
                cursor += metrics.advance_width;
            }
            y_offset += spacing;
        }
        Some(layer)
    }
}

/// Where a rasterized text layer lands: the anchor from [`text_bounds`],
/// shifted by alignment horizontally and centered vertically.
pub fn text_placement(canvas: Canvas, el: &TextElement, layer_size: Size) -> Rect {
    let anchor = text_bounds(canvas, el.x, el.y, layer_size);
    let dx = match el.text_align {
        TextAlign::Left => 0.0,
        TextAlign::Center => -layer_size.width / 2.0,
        TextAlign::Right => -layer_size.width,
    };
    anchor + Vec2::new(dx, -layer_size.height / 2.0)
}

/// Draw a text element onto `surface`. Returns `false` when it was skipped.
pub fn draw_text(
    surface: &mut Surface,
    canvas: Canvas,
    el: &TextElement,
    renderer: &TextRenderer,
) -> bool {
    if el.content.trim().is_empty() || el.opacity <= 0.0 {
        return false;
    }
    let Some(layer) = renderer.rasterize(el) else {
        tracing::warn!("no font loaded, text element skipped");
        return false;
    };
    let size = Size::new(f64::from(layer.width()), f64::from(layer.height()));
    let at = text_placement(canvas, el, size);
    composite::draw_layer(
        surface,
        &layer,
        at.x0.round() as i64,
        at.y0.round() as i64,
        el.opacity.clamp(0.0, 1.0) as f32,
        BlendMode::Normal,
    );
    true
}

#[cfg(test)]
#[path = "../../tests/unit/render/text.rs"]
mod tests;
