use std::collections::HashMap;

use crate::{
    render::surface::Surface,
    timeline::model::{MediaItem, StickerOverlay},
};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StickerFrame {
    pub width: u32,
    pub height: u32,
    pub time: f64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StickerFailure {
    pub sticker_id: String,
    pub error: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StickerRenderReport {
    pub attempted: usize,
    pub successful: usize,
    pub failed: Vec<StickerFailure>,
}

/// Draws overlay stickers after all track elements.
///
/// Receives only the stickers visible at `frame.time`, sorted by
/// `z_index`. Failures are reported, never raised.
pub trait StickerRenderer {
    fn render(
        &self,
        surface: &mut Surface,
        stickers: &[&StickerOverlay],
        media_by_id: &HashMap<&str, &MediaItem>,
        frame: StickerFrame,
    ) -> StickerRenderReport;
}

/// Accepts every sticker and draws nothing.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopStickerRenderer;

impl StickerRenderer for NoopStickerRenderer {
    fn render(
        &self,
        _surface: &mut Surface,
        stickers: &[&StickerOverlay],
        _media_by_id: &HashMap<&str, &MediaItem>,
        _frame: StickerFrame,
    ) -> StickerRenderReport {
        StickerRenderReport {
            attempted: stickers.len(),
            successful: stickers.len(),
            failed: Vec::new(),
        }
    }
}

/// Stickers visible at `time`, in ascending `z_index` (stable for ties).
pub fn visible_stickers(stickers: &[StickerOverlay], time: f64) -> Vec<&StickerOverlay> {
    let mut out: Vec<&StickerOverlay> =
        stickers.iter().filter(|s| s.is_visible_at(time)).collect();
    out.sort_by_key(|s| s.z_index);
    out
}

#[cfg(test)]
#[path = "../../tests/unit/render/sticker.rs"]
mod tests;
