use std::sync::mpsc;

use image::RgbaImage;

use crate::{
    audio::buffer::AudioBuffer,
    foundation::error::{ReelError, ReelResult},
    media::decode,
};

/// An open, seekable video decode handle.
///
/// `begin_seek` starts moving the handle and returns a channel that yields
/// exactly one value once the seek has completed (or failed). Callers decide
/// how long to wait.
pub trait DecodedVideo: Send {
    fn url(&self) -> &str;

    fn duration_secs(&self) -> f64;

    /// Source time of the frame `sample` would return; `-inf` before the
    /// first decoded frame.
    fn current_time(&self) -> f64;

    fn begin_seek(&mut self, target_secs: f64) -> mpsc::Receiver<ReelResult<()>>;

    /// Straight RGBA8 copy of the current frame.
    fn sample(&mut self) -> ReelResult<RgbaImage>;
}

/// Media backend the compositor pulls pixels from.
pub trait MediaSource {
    fn load_image(&self, url: &str) -> ReelResult<RgbaImage>;

    /// Open a handle; returns once the handle is ready to seek.
    fn open_video(&self, url: &str) -> ReelResult<Box<dyn DecodedVideo>>;
}

/// Loads PCM for the offline mixer, resampled to `sample_rate` when the
/// backend can.
pub trait AudioLoader: Sync {
    fn load(&self, path: &str, sample_rate: u32) -> ReelResult<AudioBuffer>;
}

/// Local-filesystem backend: images via `image`, video and audio via ffmpeg.
#[derive(Clone, Copy, Debug, Default)]
pub struct FsMediaSource;

impl MediaSource for FsMediaSource {
    fn load_image(&self, url: &str) -> ReelResult<RgbaImage> {
        decode::load_image_file(&decode::local_path(url)?)
    }

    #[cfg(feature = "media-ffmpeg")]
    fn open_video(&self, url: &str) -> ReelResult<Box<dyn DecodedVideo>> {
        let video = crate::media::ffmpeg::FfmpegVideo::open(url)?;
        Ok(Box::new(video))
    }

    #[cfg(not(feature = "media-ffmpeg"))]
    fn open_video(&self, url: &str) -> ReelResult<Box<dyn DecodedVideo>> {
        Err(ReelError::validation(format!(
            "video '{url}' requires the 'media-ffmpeg' feature"
        )))
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct FfmpegAudioLoader;

impl AudioLoader for FfmpegAudioLoader {
    fn load(&self, path: &str, sample_rate: u32) -> ReelResult<AudioBuffer> {
        let path = decode::local_path(path)?;
        crate::media::ffmpeg::decode_audio_f32_stereo(&path, sample_rate)
            .map_err(|e| match e {
                ReelError::Other(_) => ReelError::audio(e.to_string()),
                other => other,
            })
    }
}
