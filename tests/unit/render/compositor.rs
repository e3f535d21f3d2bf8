use std::{
    cell::{Cell, RefCell},
    collections::{BTreeMap, VecDeque},
    sync::{Arc, Mutex, mpsc},
};

use image::{Rgba, RgbaImage};

use super::*;
use crate::{
    effects::{
        params::{EffectInstance, EffectParams, keys},
        store::NoEffects,
    },
    media::source::DecodedVideo,
    render::sticker::NoopStickerRenderer,
    timeline::model::{StickerOverlay, Timeline},
};

const RED: [u8; 4] = [255, 0, 0, 255];
const BLUE: [u8; 4] = [0, 0, 255, 255];

type Script = Arc<Mutex<VecDeque<RgbaImage>>>;

struct ScriptedVideo {
    current: f64,
    frames: Script,
}

impl DecodedVideo for ScriptedVideo {
    fn url(&self) -> &str {
        "clip.mp4"
    }

    fn duration_secs(&self) -> f64 {
        10.0
    }

    fn current_time(&self) -> f64 {
        self.current
    }

    fn begin_seek(&mut self, target_secs: f64) -> mpsc::Receiver<ReelResult<()>> {
        let (tx, rx) = mpsc::channel();
        self.current = target_secs;
        tx.send(Ok(())).unwrap();
        rx
    }

    fn sample(&mut self) -> ReelResult<RgbaImage> {
        let next = self.frames.lock().unwrap().pop_front();
        Ok(next.unwrap_or_else(|| RgbaImage::from_pixel(4, 4, Rgba(RED))))
    }
}

#[derive(Default)]
struct FakeMedia {
    image_loads: Cell<u32>,
    video_opens: Cell<u32>,
    frames: Script,
}

impl MediaSource for FakeMedia {
    fn load_image(&self, url: &str) -> ReelResult<RgbaImage> {
        self.image_loads.set(self.image_loads.get() + 1);
        if url == "broken.png" {
            return Err(ReelError::decode("corrupt image"));
        }
        Ok(RgbaImage::from_pixel(4, 4, Rgba(RED)))
    }

    fn open_video(&self, _url: &str) -> ReelResult<Box<dyn DecodedVideo>> {
        self.video_opens.set(self.video_opens.get() + 1);
        Ok(Box::new(ScriptedVideo {
            current: 0.0,
            frames: Arc::clone(&self.frames),
        }))
    }
}

#[derive(Default)]
struct RecordingStickers {
    seen: RefCell<Vec<Vec<String>>>,
}

impl StickerRenderer for RecordingStickers {
    fn render(
        &self,
        _surface: &mut Surface,
        stickers: &[&StickerOverlay],
        media_by_id: &HashMap<&str, &MediaItem>,
        frame: StickerFrame,
    ) -> StickerRenderReport {
        assert_eq!((frame.width, frame.height), (8, 8));
        assert!(stickers.iter().all(|s| media_by_id.contains_key(s.media_id.as_str())));
        self.seen
            .borrow_mut()
            .push(stickers.iter().map(|s| s.id.clone()).collect());
        StickerRenderReport {
            attempted: stickers.len(),
            successful: stickers.len(),
            failed: Vec::new(),
        }
    }
}

fn config() -> ExportConfig {
    let mut config = ExportConfig {
        width: 8,
        height: 8,
        background_rgba: BLUE,
        ..ExportConfig::default()
    };
    config.seek.settle_ms = 0;
    config.retry.backoff_base_ms = 0;
    config
}

fn timeline(value: serde_json::Value) -> Timeline {
    serde_json::from_value(value).unwrap()
}

fn single(kind: &str, url: &str) -> Timeline {
    timeline(serde_json::json!({
        "tracks": [{
            "id": "t1", "name": "Main", "type": "media",
            "elements": [
                { "id": "e1", "type": "media", "media_id": "m1", "start_time": 0.0, "duration": 5.0 }
            ]
        }],
        "media_items": [{ "id": "m1", "type": kind, "url": url }]
    }))
}

#[test]
fn image_is_centered_at_natural_size_and_decoded_once() {
    let tl = single("image", "red.png");
    let cfg = config();
    let media = FakeMedia::default();
    let text = TextRenderer::new(16.0);
    let comp = FrameCompositor::new(&media, &NoEffects, &NoopStickerRenderer, &text, &cfg);
    let mut ctx = RenderContext::new(&tl, &cfg).unwrap();

    let report = comp.render_frame(&mut ctx, 0.0).unwrap();
    assert_eq!(report.rendered, 1);
    assert!(report.skipped.is_empty());
    assert_eq!(ctx.surface().pixel(4, 4), Some(RED));
    assert_eq!(ctx.surface().pixel(2, 2), Some(RED));
    assert_eq!(ctx.surface().pixel(1, 1), Some(BLUE));
    assert_eq!(ctx.surface().pixel(6, 6), Some(BLUE));

    comp.render_frame(&mut ctx, 0.1).unwrap();
    assert_eq!(media.image_loads.get(), 1);
    assert!(ctx.used_media().contains("m1"));
}

#[test]
fn earlier_time_after_later_one_is_rejected() {
    let tl = single("image", "red.png");
    let cfg = config();
    let media = FakeMedia::default();
    let text = TextRenderer::new(16.0);
    let comp = FrameCompositor::new(&media, &NoEffects, &NoopStickerRenderer, &text, &cfg);
    let mut ctx = RenderContext::new(&tl, &cfg).unwrap();

    comp.render_frame(&mut ctx, 1.0).unwrap();
    comp.render_frame(&mut ctx, 1.0).unwrap();
    let err = comp.render_frame(&mut ctx, 0.5).unwrap_err();
    assert!(matches!(err, ReelError::Validation(_)));
    assert_eq!(ctx.last_time(), Some(1.0));
}

#[test]
fn hidden_elements_are_ignored_and_missing_media_is_skipped() {
    let tl = timeline(serde_json::json!({
        "tracks": [{
            "id": "t1", "name": "Main", "type": "media",
            "elements": [
                { "id": "shown", "type": "media", "media_id": "m1", "start_time": 0.0, "duration": 5.0 },
                { "id": "hidden", "type": "media", "media_id": "m1", "start_time": 0.0, "duration": 5.0, "hidden": true },
                { "id": "dangling", "type": "media", "media_id": "gone", "start_time": 0.0, "duration": 5.0 }
            ]
        }],
        "media_items": [{ "id": "m1", "type": "image", "url": "red.png" }]
    }));
    let cfg = config();
    let media = FakeMedia::default();
    let text = TextRenderer::new(16.0);
    let comp = FrameCompositor::new(&media, &NoEffects, &NoopStickerRenderer, &text, &cfg);
    let mut ctx = RenderContext::new(&tl, &cfg).unwrap();

    let report = comp.render_frame(&mut ctx, 2.0).unwrap();
    assert_eq!(report.rendered, 1);
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].element_id, "dangling");
}

#[test]
fn image_decode_failure_skips_element_without_caching() {
    let tl = single("image", "broken.png");
    let cfg = config();
    let media = FakeMedia::default();
    let text = TextRenderer::new(16.0);
    let comp = FrameCompositor::new(&media, &NoEffects, &NoopStickerRenderer, &text, &cfg);
    let mut ctx = RenderContext::new(&tl, &cfg).unwrap();

    let report = comp.render_frame(&mut ctx, 0.0).unwrap();
    assert_eq!(report.rendered, 0);
    assert!(report.skipped[0].reason.contains("corrupt image"));
    assert_eq!(ctx.cached_images(), 0);
    assert_eq!(ctx.surface().pixel(4, 4), Some(BLUE));
}

#[test]
fn black_video_frames_are_retried_until_valid() {
    let tl = single("video", "clip.mp4");
    let cfg = config();
    let media = FakeMedia::default();
    {
        let mut frames = media.frames.lock().unwrap();
        frames.push_back(RgbaImage::from_pixel(4, 4, Rgba([0, 0, 0, 255])));
        frames.push_back(RgbaImage::from_pixel(4, 4, Rgba([0, 0, 0, 255])));
    }
    let text = TextRenderer::new(16.0);
    let comp = FrameCompositor::new(&media, &NoEffects, &NoopStickerRenderer, &text, &cfg);
    let mut ctx = RenderContext::new(&tl, &cfg).unwrap();

    let report = comp.render_frame(&mut ctx, 0.0).unwrap();
    assert_eq!(report.rendered, 1);
    assert_eq!(ctx.surface().pixel(4, 4), Some(RED));
    assert_eq!(media.video_opens.get(), 1);
    assert_eq!(ctx.open_video_handles(), 1);
}

#[test]
fn exhausted_video_retries_skip_the_element() {
    let tl = single("video", "clip.mp4");
    let cfg = config();
    let media = FakeMedia::default();
    {
        let mut frames = media.frames.lock().unwrap();
        for _ in 0..3 {
            frames.push_back(RgbaImage::from_pixel(4, 4, Rgba([0, 0, 0, 0])));
        }
    }
    let text = TextRenderer::new(16.0);
    let comp = FrameCompositor::new(&media, &NoEffects, &NoopStickerRenderer, &text, &cfg)
        .with_retry(RetryPolicy::immediate(3));
    let mut ctx = RenderContext::new(&tl, &cfg).unwrap();

    let report = comp.render_frame(&mut ctx, 0.0).unwrap();
    assert_eq!(report.rendered, 0);
    assert_eq!(report.skipped.len(), 1);
    assert!(report.skipped[0].reason.contains("transparent"));
    assert!(media.frames.lock().unwrap().is_empty());
}

#[test]
fn enabled_effects_are_applied_to_the_layer() {
    let tl = single("image", "red.png");
    let cfg = config();
    let media = FakeMedia::default();
    let text = TextRenderer::new(16.0);
    let mut store = BTreeMap::new();
    store.insert(
        "e1".to_string(),
        vec![EffectInstance::new(
            "fx1",
            EffectParams::new().with_number(keys::INVERT, 100.0),
        )],
    );
    let comp = FrameCompositor::new(&media, &store, &NoopStickerRenderer, &text, &cfg);
    let mut ctx = RenderContext::new(&tl, &cfg).unwrap();

    comp.render_frame(&mut ctx, 0.0).unwrap();
    assert_eq!(ctx.surface().pixel(4, 4), Some([0, 255, 255, 255]));

    store.get_mut("e1").unwrap()[0].enabled = false;
    let comp = FrameCompositor::new(&media, &store, &NoopStickerRenderer, &text, &cfg);
    comp.render_frame(&mut ctx, 0.5).unwrap();
    assert_eq!(ctx.surface().pixel(4, 4), Some(RED));
}

#[test]
fn audio_entries_are_neither_drawn_nor_skipped() {
    let tl = timeline(serde_json::json!({
        "tracks": [{
            "id": "a1", "name": "Music", "type": "audio",
            "elements": [
                { "id": "song", "type": "media", "media_id": "m1", "start_time": 0.0, "duration": 5.0 }
            ]
        }],
        "media_items": [{ "id": "m1", "type": "audio", "url": "song.wav" }]
    }));
    let cfg = config();
    let media = FakeMedia::default();
    let text = TextRenderer::new(16.0);
    let comp = FrameCompositor::new(&media, &NoEffects, &NoopStickerRenderer, &text, &cfg);
    let mut ctx = RenderContext::new(&tl, &cfg).unwrap();

    let report = comp.render_frame(&mut ctx, 1.0).unwrap();
    assert_eq!(report.rendered, 0);
    assert!(report.skipped.is_empty());
    assert!(ctx.used_media().is_empty());
}

#[test]
fn visible_stickers_go_to_the_sticker_renderer_in_z_order() {
    let tl = timeline(serde_json::json!({
        "tracks": [],
        "media_items": [{ "id": "s", "type": "image", "url": "sticker.png" }],
        "stickers": [
            { "id": "top", "media_id": "s", "x_pct": 50.0, "y_pct": 50.0, "width_pct": 10.0, "height_pct": 10.0, "z_index": 5 },
            { "id": "late", "media_id": "s", "x_pct": 50.0, "y_pct": 50.0, "width_pct": 10.0, "height_pct": 10.0,
              "timing": { "start_time": 3.0, "end_time": 4.0 } },
            { "id": "bottom", "media_id": "s", "x_pct": 50.0, "y_pct": 50.0, "width_pct": 10.0, "height_pct": 10.0, "z_index": 1 }
        ]
    }));
    let cfg = config();
    let media = FakeMedia::default();
    let text = TextRenderer::new(16.0);
    let stickers = RecordingStickers::default();
    let comp = FrameCompositor::new(&media, &NoEffects, &stickers, &text, &cfg);
    let mut ctx = RenderContext::new(&tl, &cfg).unwrap();

    let report = comp.render_frame(&mut ctx, 1.0).unwrap();
    assert_eq!(report.stickers.attempted, 2);
    assert_eq!(stickers.seen.borrow()[0], vec!["bottom", "top"]);
}

#[test]
fn disposed_context_refuses_frames() {
    let tl = single("video", "clip.mp4");
    let cfg = config();
    let media = FakeMedia::default();
    let text = TextRenderer::new(16.0);
    let comp = FrameCompositor::new(&media, &NoEffects, &NoopStickerRenderer, &text, &cfg);
    let mut ctx = RenderContext::new(&tl, &cfg).unwrap();

    comp.render_frame(&mut ctx, 0.0).unwrap();
    assert_eq!(ctx.open_video_handles(), 1);
    ctx.dispose();
    assert_eq!(ctx.open_video_handles(), 0);
    assert!(comp.render_frame(&mut ctx, 1.0).is_err());
}

/// Decodes a new frame only when seeking and keeps returning it until the
/// next seek completes.
struct SeekDecodedVideo {
    current: f64,
    frame: RgbaImage,
    on_seek: Script,
    seeks: Arc<Mutex<Vec<f64>>>,
}

impl DecodedVideo for SeekDecodedVideo {
    fn url(&self) -> &str {
        "held.mp4"
    }

    fn duration_secs(&self) -> f64 {
        10.0
    }

    fn current_time(&self) -> f64 {
        self.current
    }

    fn begin_seek(&mut self, target_secs: f64) -> mpsc::Receiver<ReelResult<()>> {
        let (tx, rx) = mpsc::channel();
        self.seeks.lock().unwrap().push(target_secs);
        self.current = target_secs;
        if let Some(next) = self.on_seek.lock().unwrap().pop_front() {
            self.frame = next;
        }
        tx.send(Ok(())).unwrap();
        rx
    }

    fn sample(&mut self) -> ReelResult<RgbaImage> {
        Ok(self.frame.clone())
    }
}

#[derive(Default)]
struct HeldFrameMedia {
    on_seek: Script,
    seeks: Arc<Mutex<Vec<f64>>>,
}

impl MediaSource for HeldFrameMedia {
    fn load_image(&self, _url: &str) -> ReelResult<RgbaImage> {
        Err(ReelError::decode("no images"))
    }

    fn open_video(&self, _url: &str) -> ReelResult<Box<dyn DecodedVideo>> {
        Ok(Box::new(SeekDecodedVideo {
            current: f64::NEG_INFINITY,
            frame: RgbaImage::new(4, 4),
            on_seek: Arc::clone(&self.on_seek),
            seeks: Arc::clone(&self.seeks),
        }))
    }
}

#[test]
fn rejected_video_frame_forces_a_fresh_seek() {
    let tl = single("video", "held.mp4");
    let cfg = config();
    let media = HeldFrameMedia::default();
    {
        let mut frames = media.on_seek.lock().unwrap();
        frames.push_back(RgbaImage::from_pixel(4, 4, Rgba([0, 0, 0, 255])));
        frames.push_back(RgbaImage::from_pixel(4, 4, Rgba(RED)));
    }
    let text = TextRenderer::new(16.0);
    let comp = FrameCompositor::new(&media, &NoEffects, &NoopStickerRenderer, &text, &cfg)
        .with_retry(RetryPolicy::immediate(3));
    let mut ctx = RenderContext::new(&tl, &cfg).unwrap();

    let report = comp.render_frame(&mut ctx, 1.0).unwrap();
    assert_eq!(report.rendered, 1);
    assert_eq!(ctx.surface().pixel(4, 4), Some(RED));
    assert_eq!(*media.seeks.lock().unwrap(), vec![1.0, 1.0]);
}

#[test]
fn every_retry_of_a_black_frame_seeks_again() {
    let tl = single("video", "held.mp4");
    let cfg = config();
    let media = HeldFrameMedia::default();
    {
        let mut frames = media.on_seek.lock().unwrap();
        frames.push_back(RgbaImage::from_pixel(4, 4, Rgba([0, 0, 0, 255])));
    }
    let text = TextRenderer::new(16.0);
    let comp = FrameCompositor::new(&media, &NoEffects, &NoopStickerRenderer, &text, &cfg)
        .with_retry(RetryPolicy::immediate(3));
    let mut ctx = RenderContext::new(&tl, &cfg).unwrap();

    let report = comp.render_frame(&mut ctx, 1.0).unwrap();
    assert_eq!(report.rendered, 0);
    assert_eq!(report.skipped.len(), 1);
    assert!(report.skipped[0].reason.contains("black"));
    assert_eq!(media.seeks.lock().unwrap().len(), 3);
}
