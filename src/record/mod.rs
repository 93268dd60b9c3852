//! Implant record synthesis. The record layout (slot counts, field order) is
//! the host's contract, not ours: out-of-range input is clamped or truncated
//! silently because the host's own acceptance logic expects bounded values,
//! never rejected with a validation error.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::host::HostRuntime;

/// Magnitude bounds the host enforces on effect values.
pub const MAGNITUDE_MIN: f32 = 0.0;
pub const MAGNITUDE_MAX: f32 = 5.0;

/// Use-count bounds the host enforces.
pub const USES_MIN: i64 = 1;
pub const USES_MAX: i64 = 3;

/// Slot capacities dictated by the host's record layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotLayout {
    pub effect_slots: usize,
    pub condition_slots: usize,
}

/// One (effect, magnitude) pair picked by the user. Insertion order matters
/// only for slot assignment and display.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EffectSelection {
    pub effect_id: u32,
    pub magnitude: f32,
}

/// One effect slot of the record. The all-zero slot is the host's explicit
/// "empty" sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EffectSlot {
    pub effect_id: u32,
    pub magnitude: f32,
}

impl EffectSlot {
    pub const EMPTY: EffectSlot = EffectSlot {
        effect_id: 0,
        magnitude: 0.0,
    };
}

/// The synthesized record handed to the host's replication primitive.
/// Slot vectors are always sized exactly to the host's [SlotLayout]; a pure
/// value with no reference back to discovery state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImplantRecord {
    pub template_id: u32,
    pub effects: Vec<EffectSlot>,
    pub effect_count: u32,
    pub conditions: Vec<u32>,
    pub condition_count: u32,
    pub uses: u32,
}

impl ImplantRecord {
    /// An all-empty record sized to the given layout. Fixture hosts build
    /// template bases from this.
    pub fn empty(template_id: u32, layout: SlotLayout) -> ImplantRecord {
        ImplantRecord {
            template_id,
            effects: vec![EffectSlot::EMPTY; layout.effect_slots],
            effect_count: 0,
            conditions: vec![0; layout.condition_slots],
            condition_count: 0,
            uses: USES_MIN as u32,
        }
    }
}

#[derive(Debug, Error)]
pub enum SynthesisError {
    #[error("host returned no base record for template {template_id}")]
    NoBaseRecord { template_id: u32 },
}

pub fn clamp_magnitude(magnitude: f32) -> f32 {
    magnitude.clamp(MAGNITUDE_MIN, MAGNITUDE_MAX)
}

pub fn clamp_uses(uses: i64) -> u32 {
    uses.clamp(USES_MIN, USES_MAX) as u32
}

/// Build a complete record from a template plus overrides.
///
/// The base comes from the host's template seed so host-side defaults we do
/// not define are preserved. Effects and conditions are truncated to the
/// host's slot capacities front-to-back, magnitudes clamped to [0.0, 5.0],
/// slots past the retained count zeroed, and the use-count clamped to [1, 3].
/// No input is ever rejected for being out of range.
pub fn synthesize(
    host: &dyn HostRuntime,
    template_id: u32,
    effects: &[EffectSelection],
    conditions: &[u32],
    uses: i64,
) -> Result<ImplantRecord, SynthesisError> {
    let layout = host.slot_layout();
    let mut record = host
        .base_record(template_id)
        .ok_or(SynthesisError::NoBaseRecord { template_id })?;

    record.template_id = template_id;

    // The base may arrive with under- or over-sized slot arrays; normalize to
    // the host capacity before writing.
    record.effects.resize(layout.effect_slots, EffectSlot::EMPTY);
    record.conditions.resize(layout.condition_slots, 0);

    let effect_count = effects.len().min(layout.effect_slots);
    for (slot, selection) in record.effects.iter_mut().zip(effects.iter().take(effect_count)) {
        *slot = EffectSlot {
            effect_id: selection.effect_id,
            magnitude: clamp_magnitude(selection.magnitude),
        };
    }
    for slot in record.effects.iter_mut().skip(effect_count) {
        *slot = EffectSlot::EMPTY;
    }
    record.effect_count = effect_count as u32;

    let condition_count = conditions.len().min(layout.condition_slots);
    for (slot, id) in record.conditions.iter_mut().zip(conditions.iter().take(condition_count)) {
        *slot = *id;
    }
    for slot in record.conditions.iter_mut().skip(condition_count) {
        *slot = 0;
    }
    record.condition_count = condition_count as u32;

    record.uses = clamp_uses(uses);

    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn magnitude_clamp_law() {
        assert_eq!(clamp_magnitude(-1.0), 0.0);
        assert_eq!(clamp_magnitude(99.0), 5.0);
        assert_eq!(clamp_magnitude(2.5), 2.5);
    }

    #[test]
    fn uses_clamp_law() {
        assert_eq!(clamp_uses(0), 1);
        assert_eq!(clamp_uses(5), 3);
        assert_eq!(clamp_uses(2), 2);
        assert_eq!(clamp_uses(-100), 1);
    }

    #[test]
    fn empty_record_is_sized_to_layout() {
        let layout = SlotLayout {
            effect_slots: 4,
            condition_slots: 2,
        };
        let record = ImplantRecord::empty(7, layout);
        assert_eq!(record.template_id, 7);
        assert_eq!(record.effects.len(), 4);
        assert_eq!(record.conditions.len(), 2);
        assert!(record.effects.iter().all(|slot| *slot == EffectSlot::EMPTY));
    }
}
