use std::{f32::consts::FRAC_PI_2, sync::Arc};

use crate::{
    audio::buffer::AudioBuffer,
    foundation::error::{ReelError, ReelResult},
};

/// Per-source processing: optional stereo pan, then gain.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SourceChain {
    pub pan: Option<f32>,
    pub gain: f32,
}

impl Default for SourceChain {
    fn default() -> Self {
        Self {
            pan: None,
            gain: 1.0,
        }
    }
}

impl SourceChain {
    /// Pan stage only exists for non-zero pan, so centered sources keep
    /// their plain up-mix.
    pub fn new(volume: f32, pan: Option<f32>) -> Self {
        Self {
            pan: pan.filter(|p| *p != 0.0 && p.is_finite()).map(|p| p.clamp(-1.0, 1.0)),
            gain: volume,
        }
    }
}

/// A buffer placed on the pass timeline.
#[derive(Clone, Debug)]
pub struct ScheduledSource {
    pub buffer: Arc<AudioBuffer>,
    /// Pass time at which playback starts.
    pub start_secs: f64,
    /// Position inside `buffer` where playback starts.
    pub offset_secs: f64,
    /// Playback length; `None` plays to the end of the buffer.
    pub duration_secs: Option<f64>,
    pub chain: SourceChain,
}

/// Offline render graph: a fixed-length destination and scheduled sources
/// summed into it.
#[derive(Debug)]
pub struct OfflinePass {
    sample_rate: u32,
    channels: u16,
    frames: usize,
    sources: Vec<ScheduledSource>,
}

impl OfflinePass {
    pub fn new(channels: u16, frames: usize, sample_rate: u32) -> ReelResult<Self> {
        if sample_rate == 0 {
            return Err(ReelError::audio("offline pass sample rate must be > 0"));
        }
        if channels == 0 {
            return Err(ReelError::audio("offline pass needs at least one channel"));
        }
        frames
            .checked_mul(usize::from(channels))
            .ok_or_else(|| ReelError::audio("offline pass length overflow"))?;
        Ok(Self {
            sample_rate,
            channels,
            frames,
            sources: Vec::new(),
        })
    }

    /// Pass of `ceil(duration_secs * sample_rate)` frames.
    pub fn for_duration(channels: u16, duration_secs: f64, sample_rate: u32) -> ReelResult<Self> {
        if !duration_secs.is_finite() || duration_secs < 0.0 {
            return Err(ReelError::audio(format!(
                "offline pass duration must be finite and >= 0, got {duration_secs}"
            )));
        }
        let frames = (duration_secs * f64::from(sample_rate)).ceil();
        if frames > usize::MAX as f64 {
            return Err(ReelError::audio("offline pass length overflow"));
        }
        Self::new(channels, frames as usize, sample_rate)
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    pub fn len_frames(&self) -> usize {
        self.frames
    }

    pub fn schedule(&mut self, source: ScheduledSource) {
        self.sources.push(source);
    }

    /// Sum every scheduled source into a fresh buffer, clamped to `[-1, 1]`.
    #[tracing::instrument(skip(self), fields(frames = self.frames, sources = self.sources.len()))]
    pub fn render(self) -> ReelResult<AudioBuffer> {
        let mut out = AudioBuffer::silent(self.sample_rate, self.channels, self.frames)?;
        for src in &self.sources {
            mix_source(&mut out, src);
        }
        for s in &mut out.samples {
            *s = s.clamp(-1.0, 1.0);
        }
        Ok(out)
    }
}

fn mix_source(out: &mut AudioBuffer, src: &ScheduledSource) {
    let buf = src.buffer.as_ref();
    let src_frames = buf.len_frames();
    if src_frames == 0 || !src.start_secs.is_finite() {
        return;
    }
    let rate = f64::from(out.sample_rate);
    let out_frames = out.len_frames();
    let out_ch = usize::from(out.channels);

    let start = (src.start_secs.max(0.0) * rate).round() as usize;
    // A negative start skips into the source instead of shifting it.
    let lead_in = (-src.start_secs).max(0.0);
    let offset = src.offset_secs.max(0.0) + lead_in;
    let available = (src_frames as f64 / f64::from(buf.sample_rate) - offset).max(0.0);
    let play_secs = match src.duration_secs {
        Some(d) => (d - lead_in).max(0.0).min(available),
        None => available,
    };
    let end = start
        .saturating_add((play_secs * rate).round() as usize)
        .min(out_frames);

    let step = f64::from(buf.sample_rate) / rate;
    let base = offset * f64::from(buf.sample_rate);
    let mut frame = vec![0.0f32; out_ch];
    for dst in start..end {
        let pos = base + (dst - start) as f64 * step;
        let i0 = pos.floor() as usize;
        if i0 >= src_frames {
            break;
        }
        let i1 = (i0 + 1).min(src_frames - 1);
        let frac = (pos - i0 as f64) as f32;
        let read = |c: u16| {
            let a = buf.sample(i0, c);
            a + (buf.sample(i1, c) - a) * frac
        };

        if out_ch == 1 && buf.channels >= 2 {
            frame[0] = 0.5 * (read(0) + read(1));
        } else {
            for (c, v) in frame.iter_mut().enumerate() {
                *v = read(c as u16);
            }
        }
        if out_ch >= 2
            && let Some(pan) = src.chain.pan
        {
            let (l, r) = stereo_pan(frame[0], frame[1], pan, buf.channels == 1);
            frame[0] = l;
            frame[1] = r;
        }

        let o = dst * out_ch;
        for (c, v) in frame.iter().enumerate() {
            out.samples[o + c] += v * src.chain.gain;
        }
    }
}

/// Equal-power stereo panning as done by a Web Audio `StereoPannerNode`.
pub fn stereo_pan(l: f32, r: f32, pan: f32, mono_input: bool) -> (f32, f32) {
    let pan = pan.clamp(-1.0, 1.0);
    if mono_input {
        let x = (pan + 1.0) / 2.0;
        let (gl, gr) = ((x * FRAC_PI_2).cos(), (x * FRAC_PI_2).sin());
        return (l * gl, l * gr);
    }
    if pan <= 0.0 {
        let x = pan + 1.0;
        let (gl, gr) = ((x * FRAC_PI_2).cos(), (x * FRAC_PI_2).sin());
        (l + r * gl, r * gr)
    } else {
        let x = pan;
        let (gl, gr) = ((x * FRAC_PI_2).cos(), (x * FRAC_PI_2).sin());
        (l * gl, r + l * gr)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/audio/pass.rs"]
mod tests;
