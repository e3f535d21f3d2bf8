use std::{path::Path, path::PathBuf, time::Duration};

use anyhow::Context as _;

use crate::foundation::{
    core::{Canvas, Fps, Rgba8},
    error::{ReelError, ReelResult},
};

/// Settings for one export job.
///
/// Every field has a default, so a config file only needs to name what it
/// overrides:
///
/// ```json
/// { "width": 1280, "height": 720, "retry": { "max_attempts": 5 } }
/// ```
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Output frame width in pixels.
    pub width: u32,
    /// Output frame height in pixels.
    pub height: u32,
    /// Output frame rate.
    pub fps: Fps,
    /// Straight RGBA fill applied before each frame is composited.
    pub background_rgba: Rgba8,
    /// Offline audio pass settings.
    pub audio: AudioConfig,
    /// Video seek timeouts.
    pub seek: SeekConfig,
    /// Retry policy for render-one-video-frame.
    pub retry: RetryConfig,
    /// Frame validator settings.
    pub validation: ValidationConfig,
    /// Text rasterization settings.
    pub text: TextConfig,
}

#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    /// Sample rate of the offline pass in Hz.
    pub sample_rate: u32,
    /// Channel count of the offline pass.
    pub channels: u16,
}

#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct SeekConfig {
    /// Lower bound of the adaptive timeout.
    pub base_timeout_ms: u64,
    /// Upper bound of the adaptive timeout (before distance scaling).
    pub max_timeout_ms: u64,
    /// Delay after the seek-completed signal before the frame is sampled.
    pub settle_ms: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Total attempts, including the first.
    pub max_attempts: u32,
    /// Backoff before attempt `n + 1` is `backoff_base_ms * n`.
    pub backoff_base_ms: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Largest channel value still counted as black. `0` only rejects exact black.
    pub black_threshold: u8,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct TextConfig {
    /// Font files loaded at startup; the first one is the fallback family.
    pub font_paths: Vec<PathBuf>,
    /// Font size used when a text element does not specify one.
    pub default_font_size: f32,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            width: 1920,
            height: 1080,
            fps: Fps::default(),
            background_rgba: [0, 0, 0, 255],
            audio: AudioConfig::default(),
            seek: SeekConfig::default(),
            retry: RetryConfig::default(),
            validation: ValidationConfig::default(),
            text: TextConfig::default(),
        }
    }
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rate: 48_000,
            channels: 2,
        }
    }
}

impl Default for SeekConfig {
    fn default() -> Self {
        Self {
            base_timeout_ms: 500,
            max_timeout_ms: 2000,
            settle_ms: 150,
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff_base_ms: 100,
        }
    }
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self { black_threshold: 0 }
    }
}

impl Default for TextConfig {
    fn default() -> Self {
        Self {
            font_paths: Vec::new(),
            default_font_size: 48.0,
        }
    }
}

impl SeekConfig {
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }
}

impl ExportConfig {
    /// Load a JSON config; missing fields fall back to defaults.
    pub fn load_json(path: &Path) -> ReelResult<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("read export config '{}'", path.display()))?;
        let config: Self = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn canvas(&self) -> Canvas {
        Canvas {
            width: self.width,
            height: self.height,
        }
    }

    pub fn validate(&self) -> ReelResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(ReelError::validation("output width/height must be > 0"));
        }
        Fps::new(self.fps.num, self.fps.den)?;
        if self.audio.sample_rate == 0 || self.audio.channels == 0 {
            return Err(ReelError::validation(
                "audio sample_rate and channels must be > 0",
            ));
        }
        if self.retry.max_attempts == 0 {
            return Err(ReelError::validation("retry.max_attempts must be >= 1"));
        }
        if self.seek.base_timeout_ms > self.seek.max_timeout_ms {
            return Err(ReelError::validation(
                "seek.base_timeout_ms must be <= seek.max_timeout_ms",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/config.rs"]
mod tests;
