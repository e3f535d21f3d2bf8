use std::borrow::Cow;

use crate::{
    effects::blend::BlendMode,
    effects::params::{EffectInstance, EffectParams, ParamAnimation, ParamKeyframe, ParamValue},
    foundation::math::lerp,
};

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
/// An ordered effect stack that layers onto other chains with a blend mode.
pub struct EffectChain {
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub effects: Vec<EffectInstance>,
    #[serde(default)]
    pub blend_mode: BlendMode,
}

#[derive(Clone, Debug, Default, PartialEq)]
/// Parameters produced by folding one or more chains.
pub struct LayeredParams {
    pub params: EffectParams,
    /// Last non-`normal` blend mode folded in, for downstream consumers.
    pub blend_mode: Option<BlendMode>,
}

/// Sample a keyframed parameter at element-local `time`.
///
/// Piecewise-linear between the bracketing keys, clamped to the first and
/// last values outside the keyed range. `None` when there are no keys.
/// Keys may arrive in any order; an out-of-order list is sorted by time
/// (stably) before sampling.
pub fn sample_animation(anim: &ParamAnimation, time: f64) -> Option<f64> {
    let keys = sorted_keyframes(&anim.keyframes);
    let first = keys.first()?;
    let idx = keys.partition_point(|k| k.time <= time);
    if idx == 0 {
        return Some(first.value);
    }
    if idx >= keys.len() {
        return keys.last().map(|k| k.value);
    }

    let a = &keys[idx - 1];
    let b = &keys[idx];
    let span = b.time - a.time;
    if span <= 0.0 {
        return Some(a.value);
    }
    Some(lerp(a.value, b.value, (time - a.time) / span))
}

fn sorted_keyframes(keys: &[ParamKeyframe]) -> Cow<'_, [ParamKeyframe]> {
    if keys.is_sorted_by(|a, b| a.time <= b.time) {
        return Cow::Borrowed(keys);
    }
    let mut owned = keys.to_vec();
    owned.sort_by(|a, b| a.time.total_cmp(&b.time));
    Cow::Owned(owned)
}

/// Parameters of one instance with its animations applied at `time`.
pub fn animated_params(effect: &EffectInstance, time: f64) -> EffectParams {
    let mut params = effect.params.clone();
    for anim in &effect.animations {
        if let Some(v) = sample_animation(anim, time) {
            params.set(&anim.parameter, ParamValue::Number(v));
        }
    }
    params
}

/// Animate then merge the enabled instances of one chain in order.
pub fn process_effect_chain(effects: &[EffectInstance], time: f64) -> EffectParams {
    let mut merged = EffectParams::new();
    for effect in effects.iter().filter(|e| e.enabled) {
        merged.merge_from(&animated_params(effect, time));
    }
    merged
}

/// Fold `overlay` into `base` key by key using `mode` for numeric pairs.
pub fn blend_params(base: &EffectParams, overlay: &EffectParams, mode: BlendMode) -> EffectParams {
    let mut out = base.clone();
    for (key, value) in overlay.iter() {
        let blended = match (base.get(key), value) {
            (Some(ParamValue::Number(b)), ParamValue::Number(o)) => {
                ParamValue::Number(mode.blend_param(*b, *o))
            }
            _ => value.clone(),
        };
        out.set(key, blended);
    }
    out
}

/// Process every chain at `time` and fold them in order.
#[tracing::instrument(skip(chains), fields(chains = chains.len()))]
pub fn layer_effect_chains(chains: &[EffectChain], time: f64) -> LayeredParams {
    let mut acc = LayeredParams::default();
    for (i, chain) in chains.iter().enumerate() {
        let processed = process_effect_chain(&chain.effects, time);
        if i == 0 {
            acc.params = processed;
        } else {
            acc.params = blend_params(&acc.params, &processed, chain.blend_mode);
        }
        if chain.blend_mode != BlendMode::Normal {
            acc.blend_mode = Some(chain.blend_mode);
        }
    }
    acc
}

#[cfg(test)]
#[path = "../../tests/unit/effects/chain.rs"]
mod tests;
