use crate::foundation::error::{ReelError, ReelResult};

/// Interleaved `f32` PCM.
#[derive(Clone, Debug, PartialEq)]
pub struct AudioBuffer {
    pub sample_rate: u32,
    pub channels: u16,
    pub samples: Vec<f32>,
}

impl AudioBuffer {
    pub fn new(sample_rate: u32, channels: u16, samples: Vec<f32>) -> ReelResult<Self> {
        if sample_rate == 0 {
            return Err(ReelError::audio("sample rate must be > 0"));
        }
        if channels == 0 {
            return Err(ReelError::audio("channel count must be > 0"));
        }
        if !samples.len().is_multiple_of(usize::from(channels)) {
            return Err(ReelError::audio(format!(
                "{} samples do not divide into {channels} channels",
                samples.len()
            )));
        }
        Ok(Self {
            sample_rate,
            channels,
            samples,
        })
    }

    pub fn silent(sample_rate: u32, channels: u16, frames: usize) -> ReelResult<Self> {
        let len = frames
            .checked_mul(usize::from(channels))
            .ok_or_else(|| ReelError::audio("audio buffer size overflow"))?;
        Self::new(sample_rate, channels, vec![0.0; len])
    }

    /// Number of sample frames (one sample per channel).
    pub fn len_frames(&self) -> usize {
        self.samples.len() / usize::from(self.channels.max(1))
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn duration_secs(&self) -> f64 {
        self.len_frames() as f64 / f64::from(self.sample_rate.max(1))
    }

    /// Sample of `channel` at `frame`. Channels past the last one reuse it,
    /// so mono sources feed both sides of a stereo mix.
    pub fn sample(&self, frame: usize, channel: u16) -> f32 {
        let ch = usize::from(channel.min(self.channels.saturating_sub(1)));
        self.samples
            .get(frame * usize::from(self.channels) + ch)
            .copied()
            .unwrap_or(0.0)
    }

    pub fn peak(&self) -> f32 {
        self.samples.iter().fold(0.0f32, |m, s| m.max(s.abs()))
    }

    pub fn to_f32le_bytes(&self) -> Vec<u8> {
        self.samples.iter().flat_map(|s| s.to_le_bytes()).collect()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/audio/buffer.rs"]
mod tests;
