use std::{
    collections::{BTreeSet, HashMap},
    sync::Arc,
};

use crate::{
    foundation::{
        config::ExportConfig,
        core::{Canvas, Fps},
        error::{ReelError, ReelResult},
    },
    render::{surface::Surface, video::VideoCache},
    timeline::model::{MediaItem, StickerOverlay, Timeline, Track},
};

/// Mutable state of one export job.
///
/// Owns the output surface, a snapshot of the timeline data and every
/// decode handle opened while rendering. Each compositor call borrows it
/// mutably, so one context can never be rendered from two places at once.
/// `dispose` (or dropping the context) releases the handles.
#[derive(Debug)]
pub struct RenderContext {
    pub(crate) canvas: Canvas,
    pub(crate) fps: Fps,
    pub(crate) surface: Surface,
    pub(crate) tracks: Vec<Track>,
    pub(crate) media_items: Vec<MediaItem>,
    pub(crate) stickers: Vec<StickerOverlay>,
    pub(crate) videos: VideoCache,
    pub(crate) images: HashMap<String, Arc<Surface>>,
    pub(crate) used_media: BTreeSet<String>,
    pub(crate) last_time: Option<f64>,
    disposed: bool,
}

impl RenderContext {
    pub fn new(timeline: &Timeline, config: &ExportConfig) -> ReelResult<Self> {
        config.validate()?;
        timeline.validate()?;
        let canvas = config.canvas();
        Ok(Self {
            canvas,
            fps: config.fps,
            surface: Surface::new(canvas.width, canvas.height)?,
            tracks: timeline.tracks.clone(),
            media_items: timeline.media_items.clone(),
            stickers: timeline.stickers.clone(),
            videos: VideoCache::new(),
            images: HashMap::new(),
            used_media: BTreeSet::new(),
            last_time: None,
            disposed: false,
        })
    }

    pub fn canvas(&self) -> Canvas {
        self.canvas
    }

    pub fn fps(&self) -> Fps {
        self.fps
    }

    /// The most recently composited frame.
    pub fn surface(&self) -> &Surface {
        &self.surface
    }

    /// Media ids drawn at least once by this job.
    pub fn used_media(&self) -> &BTreeSet<String> {
        &self.used_media
    }

    pub fn last_time(&self) -> Option<f64> {
        self.last_time
    }

    pub fn open_video_handles(&self) -> usize {
        self.videos.len()
    }

    pub fn cached_images(&self) -> usize {
        self.images.len()
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    pub(crate) fn ensure_live(&self) -> ReelResult<()> {
        if self.disposed {
            return Err(ReelError::validation("render context was disposed"));
        }
        Ok(())
    }

    /// Release decode handles and cached images. Idempotent.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.videos.clear();
        self.images.clear();
        self.disposed = true;
        tracing::debug!(used_media = self.used_media.len(), "render context disposed");
    }
}

impl Drop for RenderContext {
    fn drop(&mut self) {
        self.dispose();
    }
}
