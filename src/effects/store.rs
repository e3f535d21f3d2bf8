use std::collections::BTreeMap;

use crate::{effects::params::EffectInstance, timeline::model::Timeline};

/// Lookup of the effect stack attached to an element.
pub trait EffectsStore {
    fn element_effects(&self, element_id: &str) -> Vec<EffectInstance>;
}

impl EffectsStore for BTreeMap<String, Vec<EffectInstance>> {
    fn element_effects(&self, element_id: &str) -> Vec<EffectInstance> {
        self.get(element_id).cloned().unwrap_or_default()
    }
}

impl EffectsStore for Timeline {
    fn element_effects(&self, element_id: &str) -> Vec<EffectInstance> {
        self.effects.element_effects(element_id)
    }
}

/// Store with no effects for any element.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoEffects;

impl EffectsStore for NoEffects {
    fn element_effects(&self, _element_id: &str) -> Vec<EffectInstance> {
        Vec::new()
    }
}
