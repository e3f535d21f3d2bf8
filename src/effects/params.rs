use std::collections::BTreeMap;

/// Parameter names understood by the effects pipeline.
pub mod keys {
    pub const BRIGHTNESS: &str = "brightness";
    pub const CONTRAST: &str = "contrast";
    pub const SATURATION: &str = "saturation";
    pub const HUE_ROTATE: &str = "hue_rotate";
    pub const GRAYSCALE: &str = "grayscale";
    pub const SEPIA: &str = "sepia";
    pub const INVERT: &str = "invert";
    pub const BLUR: &str = "blur";
    pub const OPACITY: &str = "opacity";
    pub const PIXELATE: &str = "pixelate";
    pub const WAVE: &str = "wave";
    pub const WAVE_AMPLITUDE: &str = "wave_amplitude";
    pub const WAVE_FREQUENCY: &str = "wave_frequency";
    pub const TWIST: &str = "twist";
    pub const TWIST_ANGLE: &str = "twist_angle";
    pub const TWIST_RADIUS: &str = "twist_radius";
    pub const HALFTONE: &str = "halftone";
    pub const HALFTONE_DOT_SIZE: &str = "halftone_dot_size";
    pub const OIL_PAINTING: &str = "oil_painting";
    pub const OIL_BRUSH_SIZE: &str = "oil_brush_size";
    pub const OIL_INTENSITY: &str = "oil_intensity";
    pub const BLEND_MODE: &str = "blend_mode";
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Number(f64),
    Flag(bool),
    Choice(String),
}

impl ParamValue {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }
}

/// Typed `name -> value` parameter map.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct EffectParams(pub BTreeMap<String, ParamValue>);

impl EffectParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: &str, value: ParamValue) -> Self {
        self.set(key, value);
        self
    }

    pub fn with_number(self, key: &str, value: f64) -> Self {
        self.with(key, ParamValue::Number(value))
    }

    pub fn set(&mut self, key: &str, value: ParamValue) {
        self.0.insert(key.to_string(), value);
    }

    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.0.get(key)
    }

    /// Finite numeric value for `key`.
    pub fn number(&self, key: &str) -> Option<f64> {
        self.get(key)
            .and_then(ParamValue::as_number)
            .filter(|v| v.is_finite())
    }

    /// Flags accept booleans and non-zero numbers.
    pub fn flag(&self, key: &str) -> bool {
        match self.get(key) {
            Some(ParamValue::Flag(b)) => *b,
            Some(ParamValue::Number(n)) => *n != 0.0,
            _ => false,
        }
    }

    pub fn choice(&self, key: &str) -> Option<&str> {
        match self.get(key) {
            Some(ParamValue::Choice(s)) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ParamValue)> {
        self.0.iter()
    }

    /// Per-key override: every key of `other` replaces the one in `self`.
    pub fn merge_from(&mut self, other: &EffectParams) {
        for (k, v) in other.iter() {
            self.0.insert(k.clone(), v.clone());
        }
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
/// One effect applied to an element.
pub struct EffectInstance {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub params: EffectParams,
    #[serde(default)]
    pub animations: Vec<ParamAnimation>,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
/// Keyframes driving one numeric parameter over element-local time.
pub struct ParamAnimation {
    pub parameter: String,
    /// Sampled in time order whatever order they are stored in.
    pub keyframes: Vec<ParamKeyframe>,
}

#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ParamKeyframe {
    pub time: f64,
    pub value: f64,
}

fn default_enabled() -> bool {
    true
}

impl EffectInstance {
    pub fn new(id: impl Into<String>, params: EffectParams) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            enabled: true,
            params,
            animations: Vec::new(),
        }
    }
}

/// Combine the parameter maps of enabled instances; later instances win per key.
pub fn merge_effect_params(effects: &[EffectInstance]) -> EffectParams {
    let mut merged = EffectParams::new();
    for effect in effects.iter().filter(|e| e.enabled) {
        merged.merge_from(&effect.params);
    }
    merged
}

#[cfg(test)]
#[path = "../../tests/unit/effects/params.rs"]
mod tests;
