use std::{collections::HashMap, sync::Arc};

use crate::{
    effects::{
        chain::process_effect_chain,
        pipeline::{LayerStyle, apply_effects},
        store::EffectsStore,
    },
    foundation::{
        config::ExportConfig,
        core::{Canvas, Rect, Size},
        error::{ReelError, ReelResult},
    },
    media::source::MediaSource,
    render::{
        bounds::media_bounds,
        composite::draw_layer,
        context::RenderContext,
        retry::{RetryPolicy, invalid_frame_error},
        sticker::{StickerFrame, StickerRenderReport, StickerRenderer, visible_stickers},
        surface::Surface,
        text::{TextRenderer, draw_text},
        validate::{FrameRegion, validate_rendered_frame},
        video::{VideoCache, seek_and_sample},
    },
    timeline::{
        model::{Element, ElementBody, MediaItem, MediaKind, TrackKind},
        resolve::{ActiveEntry, resolve_active_elements},
    },
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SkippedElement {
    pub element_id: String,
    pub reason: String,
}

/// Outcome of compositing one output frame.
#[derive(Clone, Debug, PartialEq)]
pub struct FrameReport {
    pub time: f64,
    /// Elements drawn onto the surface.
    pub rendered: usize,
    /// Elements that were live but could not be drawn.
    pub skipped: Vec<SkippedElement>,
    pub stickers: StickerRenderReport,
}

enum Drawn {
    Yes,
    Skipped(String),
}

/// Composites timeline elements into a [`RenderContext`] surface, one
/// output time per call.
///
/// The compositor holds only shared collaborators; all per-job state lives
/// in the context it is handed.
pub struct FrameCompositor<'a> {
    media: &'a dyn MediaSource,
    effects: &'a dyn EffectsStore,
    stickers: &'a dyn StickerRenderer,
    text: &'a TextRenderer,
    config: &'a ExportConfig,
    retry: RetryPolicy,
}

impl<'a> FrameCompositor<'a> {
    pub fn new(
        media: &'a dyn MediaSource,
        effects: &'a dyn EffectsStore,
        stickers: &'a dyn StickerRenderer,
        text: &'a TextRenderer,
        config: &'a ExportConfig,
    ) -> Self {
        Self {
            media,
            effects,
            stickers,
            text,
            config,
            retry: RetryPolicy::from_config(&config.retry),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Render the frame at `time` seconds into `ctx`'s surface.
    ///
    /// Times must be non-decreasing across calls on one context. Element
    /// failures are reported in the returned [`FrameReport`]; only misuse of
    /// the context is an error.
    #[tracing::instrument(skip(self, ctx))]
    pub fn render_frame(&self, ctx: &mut RenderContext, time: f64) -> ReelResult<FrameReport> {
        ctx.ensure_live()?;
        if !time.is_finite() || time < 0.0 {
            return Err(ReelError::validation(format!("invalid frame time {time}")));
        }
        if let Some(last) = ctx.last_time
            && time < last
        {
            return Err(ReelError::validation(format!(
                "frame time {time} precedes previously rendered time {last}"
            )));
        }
        ctx.last_time = Some(time);

        let RenderContext {
            canvas,
            fps,
            surface,
            tracks,
            media_items,
            stickers,
            videos,
            images,
            used_media,
            ..
        } = ctx;
        surface.clear(self.config.background_rgba);

        let tolerance = fps.frame_duration_secs() / 2.0;
        let mut report = FrameReport {
            time,
            rendered: 0,
            skipped: Vec::new(),
            stickers: StickerRenderReport::default(),
        };

        for entry in resolve_active_elements(tracks.as_slice(), media_items.as_slice(), time) {
            let element = entry.element;
            let drawn = match &element.body {
                ElementBody::Text(text) => {
                    if draw_text(surface, *canvas, text, self.text) {
                        Drawn::Yes
                    } else {
                        Drawn::Skipped("text not drawn".to_string())
                    }
                }
                ElementBody::Media(_) => {
                    if is_audio(&entry) {
                        continue;
                    }
                    let Some(item) = entry.media_item else {
                        tracing::warn!(element = %element.id, "media item not found");
                        report.skipped.push(SkippedElement {
                            element_id: element.id.clone(),
                            reason: "media item not found".to_string(),
                        });
                        continue;
                    };
                    used_media.insert(item.id.clone());
                    let mut target = MediaTarget {
                        canvas: *canvas,
                        surface: &mut *surface,
                        videos: &mut *videos,
                        images: &mut *images,
                    };
                    match self.draw_media(&mut target, element, item, time, tolerance) {
                        Ok(drawn) => drawn,
                        Err(e) => {
                            tracing::warn!(
                                element = %element.id,
                                error = %e,
                                "media element skipped"
                            );
                            Drawn::Skipped(e.to_string())
                        }
                    }
                }
            };
            match drawn {
                Drawn::Yes => report.rendered += 1,
                Drawn::Skipped(reason) => report.skipped.push(SkippedElement {
                    element_id: element.id.clone(),
                    reason,
                }),
            }
        }

        let visible = visible_stickers(stickers.as_slice(), time);
        if !visible.is_empty() {
            let media_by_id: HashMap<&str, &MediaItem> =
                media_items.iter().map(|m| (m.id.as_str(), m)).collect();
            let frame = StickerFrame {
                width: canvas.width,
                height: canvas.height,
                time,
            };
            report.stickers = self.stickers.render(surface, &visible, &media_by_id, frame);
            for failure in &report.stickers.failed {
                tracing::warn!(
                    sticker = %failure.sticker_id,
                    error = %failure.error,
                    "sticker failed"
                );
            }
        }

        tracing::debug!(
            rendered = report.rendered,
            skipped = report.skipped.len(),
            "frame composited"
        );
        Ok(report)
    }

    fn draw_media(
        &self,
        target: &mut MediaTarget<'_>,
        element: &Element,
        item: &MediaItem,
        time: f64,
        tolerance: f64,
    ) -> ReelResult<Drawn> {
        if item.url.trim().is_empty() {
            return Ok(Drawn::Skipped("media item has no url".to_string()));
        }
        let placed = match item.kind {
            MediaKind::Image => self.image_layer(target, item)?,
            MediaKind::Video => {
                let source_time = time - element.timing.start_time + element.timing.trim_start;
                self.video_layer(target, item, source_time.max(0.0), tolerance)?
            }
            MediaKind::Audio => return Ok(Drawn::Skipped("audio media".to_string())),
        };
        let Some((mut layer, rect)) = placed else {
            return Ok(Drawn::Skipped("media has no visible area".to_string()));
        };

        let style = self.element_style(&mut layer, element, time)?;
        if style.opacity <= 0.0 {
            return Ok(Drawn::Skipped("fully transparent".to_string()));
        }
        draw_layer(
            target.surface,
            &layer,
            rect.x0.round() as i64,
            rect.y0.round() as i64,
            style.opacity,
            style.blend_mode,
        );
        Ok(Drawn::Yes)
    }

    fn element_style(
        &self,
        layer: &mut Surface,
        element: &Element,
        time: f64,
    ) -> ReelResult<LayerStyle> {
        let effects = self.effects.element_effects(&element.id);
        if !effects.iter().any(|e| e.enabled) {
            return Ok(LayerStyle::default());
        }
        let params = process_effect_chain(&effects, time - element.timing.start_time);
        if params.is_empty() {
            return Ok(LayerStyle::default());
        }
        apply_effects(layer, &params)
    }

    fn image_layer(
        &self,
        target: &mut MediaTarget<'_>,
        item: &MediaItem,
    ) -> ReelResult<Option<(Surface, Rect)>> {
        let image = match target.images.get(&item.url) {
            Some(cached) => Arc::clone(cached),
            None => {
                let decoded = Arc::new(Surface::from_rgba_image(self.media.load_image(&item.url)?));
                target.images.insert(item.url.clone(), Arc::clone(&decoded));
                decoded
            }
        };
        fit_to_frame(target.canvas, item, &image)
    }

    fn video_layer(
        &self,
        target: &mut MediaTarget<'_>,
        item: &MediaItem,
        source_time: f64,
        tolerance: f64,
    ) -> ReelResult<Option<(Surface, Rect)>> {
        let threshold = self.config.validation.black_threshold;
        let canvas = target.canvas;
        let videos = &mut *target.videos;
        self.retry.run(|attempt| {
            let handle = videos.get_or_open(&item.url, self.media)?;
            let frame = seek_and_sample(
                &mut **handle,
                source_time,
                tolerance,
                attempt > 1,
                &self.config.seek,
            )?;
            let Some((layer, rect)) = fit_to_frame(canvas, item, &Surface::from_rgba_image(frame))?
            else {
                return Ok(None);
            };
            let region = FrameRegion {
                x: 0,
                y: 0,
                width: layer.width(),
                height: layer.height(),
            };
            let verdict = validate_rendered_frame(&layer, region, attempt, threshold);
            if !verdict.is_valid {
                return Err(invalid_frame_error(verdict.reason.as_deref()));
            }
            Ok(Some((layer, rect)))
        })
    }
}

struct MediaTarget<'c> {
    canvas: Canvas,
    surface: &'c mut Surface,
    videos: &'c mut VideoCache,
    images: &'c mut HashMap<String, Arc<Surface>>,
}

fn is_audio(entry: &ActiveEntry<'_>) -> bool {
    entry.track.kind == TrackKind::Audio
        || entry.media_item.is_some_and(|m| m.kind == MediaKind::Audio)
}

/// Scale `source` to the media bounds. `None` when the bounds are empty.
fn fit_to_frame(
    canvas: Canvas,
    item: &MediaItem,
    source: &Surface,
) -> ReelResult<Option<(Surface, Rect)>> {
    let natural = match (item.width, item.height) {
        (Some(w), Some(h)) if w > 0 && h > 0 => Size::new(f64::from(w), f64::from(h)),
        _ => Size::new(f64::from(source.width()), f64::from(source.height())),
    };
    let rect = media_bounds(canvas, natural);
    let w = rect.width().round() as u32;
    let h = rect.height().round() as u32;
    if w == 0 || h == 0 {
        return Ok(None);
    }
    let layer = if (w, h) == (source.width(), source.height()) {
        source.clone()
    } else {
        source.resized(w, h)?
    };
    Ok(Some((layer, rect)))
}

#[cfg(test)]
#[path = "../../tests/unit/render/compositor.rs"]
mod tests;
