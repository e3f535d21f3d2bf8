//! reelforge turns an editing timeline into export-ready frames and sound.
//!
//! The crate has two independent halves that an export job drives side by side:
//!
//! 1. **Frames**: [`FrameCompositor::render_frame`] composites every element
//!    live at an output time into a [`RenderContext`] surface. Media is fitted
//!    to the frame, effect stacks are evaluated and applied per element, video
//!    samples are validated and retried, and overlay stickers are handed to a
//!    [`StickerRenderer`]. [`render_frames`] loops a [`FrameRange`] at
//!    `t = index / fps` into a [`FrameSink`].
//! 2. **Audio**: [`mix_audio`] schedules every timed [`AudioSource`] into one
//!    offline pass and isolates per-source failures;
//!    [`combine_audio_buffers`] merges two mixes.
//!
//! Pixels are premultiplied RGBA8 throughout. Media IO sits behind the
//! [`MediaSource`] and [`AudioLoader`] traits; the filesystem backends decode
//! images with `image` and delegate video/audio to the system `ffmpeg` binary
//! when the `media-ffmpeg` feature is enabled.
#![forbid(unsafe_code)]

pub mod audio;
pub mod effects;
pub mod export;
pub mod foundation;
pub mod media;
pub mod render;
pub mod timeline;

pub use audio::buffer::AudioBuffer;
pub use audio::mix::{
    AudioMixResult, AudioSource, AudioSourceError, combine_audio_buffers, mix_audio,
};
pub use audio::sources::collect_audio_sources;
pub use effects::blend::BlendMode;
pub use effects::chain::{EffectChain, LayeredParams, layer_effect_chains, process_effect_chain};
pub use effects::params::{
    EffectInstance, EffectParams, ParamAnimation, ParamKeyframe, ParamValue, merge_effect_params,
};
pub use effects::pipeline::{LayerStyle, apply_effects};
pub use effects::store::{EffectsStore, NoEffects};
pub use export::driver::{ExportEvent, ExportStats, NoopObserver, ProgressObserver, render_frames};
pub use export::sink::{FrameSink, InMemorySink, PngSequenceSink, SinkConfig};
pub use foundation::config::ExportConfig;
pub use foundation::core::{Canvas, Fps, FrameIndex, FrameRange, Rect, Rgba8, Size, total_frames};
pub use foundation::error::{ReelError, ReelResult};
pub use media::seek::AsyncSeeker;
pub use media::source::{AudioLoader, DecodedVideo, FfmpegAudioLoader, FsMediaSource, MediaSource};
pub use render::bounds::media_bounds;
pub use render::compositor::{FrameCompositor, FrameReport, SkippedElement};
pub use render::context::RenderContext;
pub use render::retry::RetryPolicy;
pub use render::sticker::{
    NoopStickerRenderer, StickerFailure, StickerFrame, StickerRenderReport, StickerRenderer,
};
pub use render::surface::Surface;
pub use render::text::TextRenderer;
pub use render::validate::{FrameRegion, FrameValidation, PixelSource, validate_rendered_frame};
pub use timeline::model::{
    Element, ElementBody, MediaElement, MediaItem, MediaKind, StickerOverlay, StickerTiming,
    TextAlign, TextElement, Timeline, Timing, Track, TrackKind,
};
pub use timeline::resolve::{ActiveEntry, resolve_active_elements};
