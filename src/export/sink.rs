use std::path::{Path, PathBuf};

use anyhow::Context as _;
use sha2::{Digest, Sha256};

use crate::{
    foundation::{
        core::{Fps, FrameIndex},
        error::ReelResult,
    },
    render::surface::Surface,
};

/// Handed to a [`FrameSink`] before the first frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SinkConfig {
    pub width: u32,
    pub height: u32,
    pub fps: Fps,
    pub total_frames: u64,
}

/// Consumer of composited frames.
///
/// `push_frame` is called in strictly increasing `FrameIndex` order.
pub trait FrameSink {
    fn begin(&mut self, config: SinkConfig) -> ReelResult<()>;
    fn push_frame(&mut self, index: FrameIndex, frame: &Surface) -> ReelResult<()>;
    fn end(&mut self) -> ReelResult<()>;
}

/// Keeps every frame in memory. For tests and small previews.
#[derive(Debug, Default)]
pub struct InMemorySink {
    config: Option<SinkConfig>,
    frames: Vec<(FrameIndex, Surface)>,
    finished: bool,
}

impl InMemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn config(&self) -> Option<SinkConfig> {
        self.config
    }

    pub fn frames(&self) -> &[(FrameIndex, Surface)] {
        &self.frames
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }
}

impl FrameSink for InMemorySink {
    fn begin(&mut self, config: SinkConfig) -> ReelResult<()> {
        self.config = Some(config);
        self.frames.clear();
        self.finished = false;
        Ok(())
    }

    fn push_frame(&mut self, index: FrameIndex, frame: &Surface) -> ReelResult<()> {
        self.frames.push((index, frame.clone()));
        Ok(())
    }

    fn end(&mut self) -> ReelResult<()> {
        self.finished = true;
        Ok(())
    }
}

/// Writes `frame_000000.png`, `frame_000001.png`, ... into a directory,
/// optionally hashing every frame's straight RGBA bytes.
#[derive(Debug)]
pub struct PngSequenceSink {
    dir: PathBuf,
    digest: Option<Sha256>,
    written: u64,
}

impl PngSequenceSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            digest: None,
            written: 0,
        }
    }

    pub fn with_digest(mut self) -> Self {
        self.digest = Some(Sha256::new());
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn frames_written(&self) -> u64 {
        self.written
    }

    pub fn frame_path(&self, index: FrameIndex) -> PathBuf {
        self.dir.join(format!("frame_{:06}.png", index.0))
    }

    /// Hex digest over every frame pushed so far; `None` unless enabled.
    pub fn digest_hex(&self) -> Option<String> {
        self.digest.as_ref().map(|d| {
            d.clone()
                .finalize()
                .iter()
                .map(|b| format!("{b:02x}"))
                .collect()
        })
    }
}

impl FrameSink for PngSequenceSink {
    fn begin(&mut self, _config: SinkConfig) -> ReelResult<()> {
        std::fs::create_dir_all(&self.dir)
            .with_context(|| format!("create output dir '{}'", self.dir.display()))?;
        self.written = 0;
        Ok(())
    }

    fn push_frame(&mut self, index: FrameIndex, frame: &Surface) -> ReelResult<()> {
        let image = frame.to_rgba_image()?;
        if let Some(digest) = self.digest.as_mut() {
            digest.update(image.as_raw());
        }
        let path = self.frame_path(index);
        image
            .save(&path)
            .with_context(|| format!("write frame '{}'", path.display()))?;
        self.written += 1;
        Ok(())
    }

    fn end(&mut self) -> ReelResult<()> {
        tracing::info!(frames = self.written, dir = %self.dir.display(), "png sequence written");
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/export/sink.rs"]
mod tests;
