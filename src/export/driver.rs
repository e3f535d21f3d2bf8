use std::sync::mpsc;

use crate::{
    export::sink::{FrameSink, SinkConfig},
    foundation::{
        core::{FrameIndex, FrameRange},
        error::ReelResult,
    },
    render::{compositor::FrameCompositor, context::RenderContext},
};

/// Progress notifications emitted while a range renders.
#[derive(Clone, Debug, PartialEq)]
pub enum ExportEvent {
    Started {
        total_frames: u64,
    },
    FrameRendered {
        index: FrameIndex,
        time: f64,
        rendered: usize,
        skipped: usize,
    },
    Finished {
        frames: u64,
        skipped_elements: usize,
    },
}

pub trait ProgressObserver {
    fn on_event(&self, event: &ExportEvent);
}

/// Ignores every event.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopObserver;

impl ProgressObserver for NoopObserver {
    fn on_event(&self, _event: &ExportEvent) {}
}

impl ProgressObserver for mpsc::Sender<ExportEvent> {
    fn on_event(&self, event: &ExportEvent) {
        // Receiver may already be gone.
        let _ = self.send(event.clone());
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ExportStats {
    pub frames: u64,
    pub skipped_elements: usize,
}

/// Composite every frame in `range` at `t = index / fps` and stream it to `sink`.
///
/// Frames are requested in increasing order on one context. The first
/// compositor or sink error aborts the range.
#[tracing::instrument(skip_all, fields(start = range.start.0, end = range.end.0))]
pub fn render_frames(
    compositor: &FrameCompositor<'_>,
    ctx: &mut RenderContext,
    range: FrameRange,
    sink: &mut dyn FrameSink,
    observer: &dyn ProgressObserver,
) -> ReelResult<ExportStats> {
    let canvas = ctx.canvas();
    let fps = ctx.fps();
    let total_frames = range.len_frames();
    sink.begin(SinkConfig {
        width: canvas.width,
        height: canvas.height,
        fps,
        total_frames,
    })?;
    observer.on_event(&ExportEvent::Started { total_frames });

    let mut stats = ExportStats::default();
    for index in range.iter() {
        let time = fps.frame_time_secs(index);
        let report = compositor.render_frame(ctx, time)?;
        sink.push_frame(index, ctx.surface())?;
        stats.frames += 1;
        stats.skipped_elements += report.skipped.len();
        observer.on_event(&ExportEvent::FrameRendered {
            index,
            time,
            rendered: report.rendered,
            skipped: report.skipped.len(),
        });
    }

    sink.end()?;
    observer.on_event(&ExportEvent::Finished {
        frames: stats.frames,
        skipped_elements: stats.skipped_elements,
    });
    tracing::info!(frames = stats.frames, skipped = stats.skipped_elements, "range rendered");
    Ok(stats)
}

#[cfg(test)]
#[path = "../../tests/unit/export/driver.rs"]
mod tests;
