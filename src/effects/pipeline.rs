use crate::{
    effects::{
        blend::BlendMode,
        filter::FilterSettings,
        params::{EffectParams, keys},
        pixel,
    },
    foundation::error::ReelResult,
    render::surface::Surface,
};

const DEFAULT_WAVE_AMPLITUDE: f64 = 10.0;
const DEFAULT_WAVE_FREQUENCY: f64 = 2.0;
const DEFAULT_TWIST_ANGLE: f64 = 90.0;
const DEFAULT_HALFTONE_DOT: f64 = 4.0;
const DEFAULT_OIL_BRUSH: f64 = 3.0;
const DEFAULT_OIL_INTENSITY: f64 = 20.0;

/// How an effected layer is composited back onto the frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LayerStyle {
    pub opacity: f32,
    pub blend_mode: BlendMode,
}

impl Default for LayerStyle {
    fn default() -> Self {
        Self {
            opacity: 1.0,
            blend_mode: BlendMode::Normal,
        }
    }
}

/// Run every effect named in `params` over `layer` in the fixed order
/// filters, pixelate, wave, twist, halftone, oil painting.
///
/// Each stage runs only when its parameter (or its enabling flag) is present.
#[tracing::instrument(
    skip_all,
    fields(w = layer.width(), h = layer.height(), params = params.len())
)]
pub fn apply_effects(layer: &mut Surface, params: &EffectParams) -> ReelResult<LayerStyle> {
    let filters = FilterSettings::from_params(params);
    filters.apply(layer)?;

    if let Some(block) = params.number(keys::PIXELATE).filter(|b| *b >= 1.0) {
        pixel::pixelate(layer, block.round() as u32);
    }

    if let Some((amplitude, frequency)) = gated(
        params,
        keys::WAVE,
        &[
            (keys::WAVE_AMPLITUDE, DEFAULT_WAVE_AMPLITUDE),
            (keys::WAVE_FREQUENCY, DEFAULT_WAVE_FREQUENCY),
        ],
    )
    .map(|v| (v[0], v[1]))
    {
        pixel::wave(layer, amplitude, frequency);
    }

    if let Some(v) = gated(
        params,
        keys::TWIST,
        &[(keys::TWIST_ANGLE, DEFAULT_TWIST_ANGLE)],
    ) {
        pixel::twist(layer, v[0], params.number(keys::TWIST_RADIUS));
    }

    if let Some(v) = gated(
        params,
        keys::HALFTONE,
        &[(keys::HALFTONE_DOT_SIZE, DEFAULT_HALFTONE_DOT)],
    ) {
        pixel::halftone(layer, v[0]);
    }

    if let Some(v) = gated(
        params,
        keys::OIL_PAINTING,
        &[
            (keys::OIL_BRUSH_SIZE, DEFAULT_OIL_BRUSH),
            (keys::OIL_INTENSITY, DEFAULT_OIL_INTENSITY),
        ],
    ) {
        pixel::oil_painting(layer, v[0].round().max(0.0) as u32, v[1]);
    }

    let blend_mode = match params.choice(keys::BLEND_MODE) {
        Some(name) => BlendMode::parse(name).unwrap_or_else(|| {
            tracing::warn!(blend_mode = name, "unknown blend mode, using normal");
            BlendMode::Normal
        }),
        None => BlendMode::Normal,
    };

    Ok(LayerStyle {
        opacity: filters.opacity_factor(),
        blend_mode,
    })
}

/// Stage values when the stage is switched on by its flag or any of its
/// numeric parameters; missing values take their defaults.
fn gated(params: &EffectParams, flag: &str, values: &[(&str, f64)]) -> Option<Vec<f64>> {
    let any_value = values.iter().any(|(k, _)| params.number(k).is_some());
    let flag_set = params.get(flag).is_some();
    if flag_set && !params.flag(flag) {
        return None;
    }
    if !(flag_set || any_value) {
        return None;
    }
    Some(
        values
            .iter()
            .map(|(k, d)| params.number(k).unwrap_or(*d))
            .collect(),
    )
}

#[cfg(test)]
#[path = "../../tests/unit/effects/pipeline.rs"]
mod tests;
