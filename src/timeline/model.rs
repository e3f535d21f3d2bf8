use std::{
    collections::{BTreeMap, HashSet},
    path::Path,
};

use anyhow::Context as _;

use crate::{
    effects::params::EffectInstance,
    foundation::core::Rgba8,
    foundation::error::{ReelError, ReelResult},
};

#[derive(Clone, Debug, Default, serde::Serialize, serde::Deserialize)]
/// Read-only snapshot of everything an export job renders.
///
/// A timeline is a pure data model that can be built in code or read from
/// JSON. Rendering it is driven by [`crate::FrameCompositor`] for pictures
/// and [`crate::mix_audio`] for sound.
pub struct Timeline {
    /// Ordered tracks; later visual tracks composite on top of earlier ones.
    pub tracks: Vec<Track>,
    /// Media library referenced by media elements and stickers.
    #[serde(default)]
    pub media_items: Vec<MediaItem>,
    /// Overlay stickers drawn after all track elements.
    #[serde(default)]
    pub stickers: Vec<StickerOverlay>,
    /// Per-element effect stacks keyed by element id.
    #[serde(default)]
    pub effects: BTreeMap<String, Vec<EffectInstance>>,
    /// Export duration in seconds. Defaults to the end of the last element.
    #[serde(default)]
    pub duration: Option<f64>,
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
/// A lane of elements sharing a kind.
pub struct Track {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: TrackKind,
    pub elements: Vec<Element>,
    #[serde(default)]
    pub muted: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackKind {
    Media,
    Text,
    Audio,
    Sticker,
    Captions,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
/// Placement shared by every element kind, in seconds.
pub struct Timing {
    pub start_time: f64,
    pub duration: f64,
    #[serde(default)]
    pub trim_start: f64,
    #[serde(default)]
    pub trim_end: f64,
}

impl Timing {
    /// `start_time <= t < start_time + duration`.
    pub fn contains(&self, t: f64) -> bool {
        self.start_time <= t && t < self.start_time + self.duration
    }

    pub fn end_time(&self) -> f64 {
        self.start_time + self.duration
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Element {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(flatten)]
    pub timing: Timing,
    #[serde(default)]
    pub hidden: bool,
    #[serde(flatten)]
    pub body: ElementBody,
}

impl Element {
    /// Whether the element participates in rendering at `t`.
    pub fn is_active_at(&self, t: f64) -> bool {
        !self.hidden && self.timing.contains(t)
    }

    pub fn media_id(&self) -> Option<&str> {
        match &self.body {
            ElementBody::Media(m) => Some(m.media_id.as_str()),
            ElementBody::Text(_) => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ElementBody {
    Media(MediaElement),
    Text(TextElement),
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct MediaElement {
    pub media_id: String,
    #[serde(default = "default_volume")]
    pub volume: f64,
    #[serde(default)]
    pub pan: f64,
    #[serde(default)]
    pub muted: bool,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TextElement {
    pub content: String,
    #[serde(default)]
    pub font_family: Option<String>,
    #[serde(default)]
    pub font_size: Option<f32>,
    #[serde(default = "default_text_color")]
    pub color: Rgba8,
    /// Anchor x in output pixels; frame center when absent.
    #[serde(default)]
    pub x: Option<f64>,
    /// Anchor y in output pixels; frame center when absent.
    #[serde(default)]
    pub y: Option<f64>,
    #[serde(default)]
    pub text_align: TextAlign,
    #[serde(default = "default_opacity")]
    pub opacity: f64,
    #[serde(default)]
    pub background_color: Option<Rgba8>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextAlign {
    Left,
    #[default]
    Center,
    Right,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct MediaItem {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: MediaKind,
    /// Source location handed to the media backend; may be empty for
    /// items whose upload never finished.
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
    #[serde(default)]
    pub duration: Option<f64>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Image,
    Video,
    Audio,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
/// Overlay image placed in percent-of-frame coordinates.
pub struct StickerOverlay {
    pub id: String,
    pub media_id: String,
    /// Center x in percent of the frame width.
    pub x_pct: f64,
    /// Center y in percent of the frame height.
    pub y_pct: f64,
    pub width_pct: f64,
    pub height_pct: f64,
    #[serde(default)]
    pub rotation_deg: f64,
    #[serde(default = "default_opacity")]
    pub opacity: f64,
    #[serde(default)]
    pub z_index: i32,
    #[serde(default)]
    pub timing: Option<StickerTiming>,
}

#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct StickerTiming {
    pub start_time: f64,
    pub end_time: f64,
}

impl StickerOverlay {
    pub fn is_visible_at(&self, t: f64) -> bool {
        match self.timing {
            None => true,
            Some(timing) => timing.start_time <= t && t < timing.end_time,
        }
    }
}

fn default_volume() -> f64 {
    1.0
}

fn default_opacity() -> f64 {
    1.0
}

fn default_text_color() -> Rgba8 {
    [255, 255, 255, 255]
}

impl Timeline {
    /// Read and validate a timeline JSON file.
    pub fn load_json(path: &Path) -> ReelResult<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("read timeline '{}'", path.display()))?;
        let timeline: Self = serde_json::from_str(&raw)?;
        timeline.validate()?;
        Ok(timeline)
    }

    pub fn media_item(&self, id: &str) -> Option<&MediaItem> {
        self.media_items.iter().find(|m| m.id == id)
    }

    /// Explicit duration, or the end of the last element when unset.
    pub fn duration_secs(&self) -> f64 {
        if let Some(d) = self.duration {
            return d;
        }
        self.tracks
            .iter()
            .flat_map(|t| t.elements.iter())
            .map(|e| e.timing.end_time())
            .fold(0.0, f64::max)
    }

    pub fn validate(&self) -> ReelResult<()> {
        let mut seen = HashSet::new();
        for track in &self.tracks {
            for el in &track.elements {
                if el.id.trim().is_empty() {
                    return Err(ReelError::validation(format!(
                        "track '{}' has an element with an empty id",
                        track.id
                    )));
                }
                if !seen.insert(el.id.as_str()) {
                    return Err(ReelError::validation(format!(
                        "duplicate element id '{}'",
                        el.id
                    )));
                }
                let t = &el.timing;
                let finite = [t.start_time, t.duration, t.trim_start, t.trim_end]
                    .iter()
                    .all(|v| v.is_finite());
                if !finite || t.start_time < 0.0 || t.trim_start < 0.0 || t.trim_end < 0.0 {
                    return Err(ReelError::validation(format!(
                        "element '{}' has invalid timing",
                        el.id
                    )));
                }
                if t.duration <= 0.0 {
                    return Err(ReelError::validation(format!(
                        "element '{}' must have a positive duration",
                        el.id
                    )));
                }
            }
        }
        for (element_id, stack) in &self.effects {
            let keyframes = stack
                .iter()
                .flat_map(|e| e.animations.iter())
                .flat_map(|a| a.keyframes.iter());
            for key in keyframes {
                if !(key.time.is_finite() && key.value.is_finite()) {
                    return Err(ReelError::validation(format!(
                        "effects for '{element_id}' have a non-finite keyframe"
                    )));
                }
            }
        }
        if let Some(d) = self.duration
            && (!d.is_finite() || d < 0.0)
        {
            return Err(ReelError::validation(
                "timeline duration must be finite and >= 0",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/timeline/model.rs"]
mod tests;
