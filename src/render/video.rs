use std::{collections::HashMap, sync::mpsc::RecvTimeoutError, time::Duration};

use image::RgbaImage;

use crate::{
    foundation::{
        config::SeekConfig,
        error::{ReelError, ReelResult},
    },
    media::source::{DecodedVideo, MediaSource},
};

/// Decode handles keyed by URL, owned by one export job.
#[derive(Default)]
pub struct VideoCache {
    handles: HashMap<String, Box<dyn DecodedVideo>>,
}

impl std::fmt::Debug for VideoCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VideoCache")
            .field("urls", &self.handles.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl VideoCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Existing handle for `url`, or a freshly opened one.
    pub fn get_or_open(
        &mut self,
        url: &str,
        media: &dyn MediaSource,
    ) -> ReelResult<&mut Box<dyn DecodedVideo>> {
        if !self.handles.contains_key(url) {
            let handle = media.open_video(url)?;
            tracing::debug!(url, duration = handle.duration_secs(), "video handle opened");
            self.handles.insert(url.to_string(), handle);
        }
        self.handles
            .get_mut(url)
            .ok_or_else(|| ReelError::evaluation(format!("video handle for '{url}' vanished")))
    }

    pub fn contains(&self, url: &str) -> bool {
        self.handles.contains_key(url)
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Drop every handle.
    pub fn clear(&mut self) {
        if !self.handles.is_empty() {
            tracing::debug!(count = self.handles.len(), "releasing video handles");
        }
        self.handles.clear();
    }
}

/// Seek wait budget.
///
/// `adaptive = clamp(duration * 30ms, base, cap)`, then scaled by
/// `1 + 2 * |current - target| / duration`.
pub fn seek_timeout(
    config: &SeekConfig,
    duration_secs: f64,
    current: f64,
    target: f64,
) -> Duration {
    let base = config.base_timeout_ms as f64;
    let cap = (config.max_timeout_ms as f64).max(base);
    if !(duration_secs.is_finite() && duration_secs > 0.0) {
        return Duration::from_millis(config.base_timeout_ms);
    }
    let adaptive = (duration_secs * 30.0).clamp(base, cap);
    let distance = if current.is_finite() && target.is_finite() {
        (current - target).abs() / duration_secs
    } else {
        0.0
    };
    Duration::from_millis((adaptive * (1.0 + distance * 2.0)).round() as u64)
}

/// Move `handle` to `target` and return the frame there.
///
/// Skips the seek when the handle is already within `tolerance_secs` of the
/// target, unless `force` is set. Retries of a rejected frame force the seek
/// so the decoder produces a fresh frame instead of the cached one. After a
/// completed seek the settle delay elapses before sampling.
pub fn seek_and_sample(
    handle: &mut dyn DecodedVideo,
    target: f64,
    tolerance_secs: f64,
    force: bool,
    config: &SeekConfig,
) -> ReelResult<RgbaImage> {
    let current = handle.current_time();
    if force || (current - target).abs() > tolerance_secs {
        let timeout = seek_timeout(config, handle.duration_secs(), current, target);
        let rx = handle.begin_seek(target);
        match rx.recv_timeout(timeout) {
            Ok(res) => res?,
            Err(RecvTimeoutError::Timeout) => {
                return Err(ReelError::SeekTimeout {
                    url: handle.url().to_string(),
                    target_secs: target,
                    timeout_ms: timeout.as_millis() as u64,
                });
            }
            Err(RecvTimeoutError::Disconnected) => {
                return Err(ReelError::decode(format!(
                    "seek on '{}' ended without a result",
                    handle.url()
                )));
            }
        }
        let settle = config.settle_delay();
        if !settle.is_zero() {
            std::thread::sleep(settle);
        }
    }
    handle.sample()
}

#[cfg(test)]
#[path = "../../tests/unit/render/video.rs"]
mod tests;
