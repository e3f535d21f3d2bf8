use std::sync::Arc;

use rayon::prelude::*;

use crate::{
    audio::{
        buffer::AudioBuffer,
        pass::{OfflinePass, ScheduledSource, SourceChain},
    },
    foundation::{
        config::AudioConfig,
        core::Fps,
        error::{ReelError, ReelResult},
    },
    media::source::AudioLoader,
};

/// One timed audio contribution to the export mix.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct AudioSource {
    pub element_id: String,
    pub path: String,
    pub start_frame: u64,
    pub duration_frames: u64,
    /// Linear gain, `0..=1`.
    pub volume: f32,
    /// `-1` (left) to `1` (right).
    #[serde(default)]
    pub pan: Option<f32>,
    /// Seconds skipped at the head of the source.
    #[serde(default)]
    pub offset_seconds: f64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AudioSourceError {
    pub element_id: String,
    pub error: String,
}

#[derive(Clone, Debug)]
pub struct AudioMixResult {
    pub buffer: AudioBuffer,
    pub duration: f64,
    /// Sources that were loaded and scheduled.
    pub source_count: usize,
    pub errors: Vec<AudioSourceError>,
}

/// Render every source into one buffer of `total_duration` seconds.
///
/// A source that fails to load is recorded in `errors` and left out; only
/// pass-level failures (bad sample rate or duration) fail the whole mix.
#[tracing::instrument(skip(sources, loader, config), fields(sources = sources.len()))]
pub fn mix_audio(
    sources: &[AudioSource],
    fps: Fps,
    total_duration: f64,
    loader: &dyn AudioLoader,
    config: &AudioConfig,
) -> ReelResult<AudioMixResult> {
    let mut pass = OfflinePass::for_duration(config.channels, total_duration, config.sample_rate)?;
    let fps = fps.as_f64();
    if !(fps.is_finite() && fps > 0.0) {
        return Err(ReelError::audio("mix fps must be > 0"));
    }

    let loaded: Vec<ReelResult<AudioBuffer>> = sources
        .par_iter()
        .map(|s| loader.load(&s.path, config.sample_rate))
        .collect();

    let mut errors = Vec::new();
    let mut source_count = 0;
    for (source, result) in sources.iter().zip(loaded) {
        match result {
            Ok(buffer) => {
                pass.schedule(ScheduledSource {
                    buffer: Arc::new(buffer),
                    start_secs: source.start_frame as f64 / fps,
                    offset_secs: source.offset_seconds,
                    duration_secs: Some(source.duration_frames as f64 / fps),
                    chain: SourceChain::new(source.volume, source.pan),
                });
                source_count += 1;
            }
            Err(e) => {
                tracing::warn!(
                    element_id = %source.element_id,
                    path = %source.path,
                    error = %e,
                    "audio source skipped"
                );
                errors.push(AudioSourceError {
                    element_id: source.element_id.clone(),
                    error: e.to_string(),
                });
            }
        }
    }

    let buffer = pass.render()?;
    tracing::info!(
        source_count,
        failed = errors.len(),
        frames = buffer.len_frames(),
        "audio mixed"
    );
    Ok(AudioMixResult {
        buffer,
        duration: total_duration,
        source_count,
        errors,
    })
}

/// Overlay two optional buffers.
///
/// With both present the result is `max(len)` frames and `max(channels)`
/// channels at `a`'s sample rate, both starting at zero.
pub fn combine_audio_buffers(
    a: Option<AudioBuffer>,
    b: Option<AudioBuffer>,
) -> ReelResult<Option<AudioBuffer>> {
    let (a, b) = match (a, b) {
        (None, None) => return Ok(None),
        (None, Some(b)) => return Ok(Some(b)),
        (Some(a), None) => return Ok(Some(a)),
        (Some(a), Some(b)) => (a, b),
    };

    let rate = a.sample_rate;
    let b_frames_at_rate =
        (b.len_frames() as f64 * f64::from(rate) / f64::from(b.sample_rate)).ceil();
    let frames = a.len_frames().max(b_frames_at_rate as usize);
    let channels = a.channels.max(b.channels);

    let mut pass = OfflinePass::new(channels, frames, rate)?;
    for buffer in [a, b] {
        pass.schedule(ScheduledSource {
            buffer: Arc::new(buffer),
            start_secs: 0.0,
            offset_secs: 0.0,
            duration_secs: None,
            chain: SourceChain::default(),
        });
    }
    pass.render().map(Some)
}

#[cfg(test)]
#[path = "../../tests/unit/audio/mix.rs"]
mod tests;
