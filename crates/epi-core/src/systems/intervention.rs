//! Intervention Systems
//!
//! Symptomatic self-quarantine: entry after the transmission pass, release
//! at the start of the next day's progression pass.

use bevy_ecs::prelude::*;
use rand::Rng;
use tracing::debug;

use crate::components::{
    Demographics, DiseaseState, Health, ModelParams, PersonRegistry, Quarantine, SimClock, SimRng,
};
use crate::sampling::clamp_unit;

/// System: end quarantines that ran their course or were abandoned
pub fn release_quarantine(
    clock: Res<SimClock>,
    params: Res<ModelParams>,
    registry: Res<PersonRegistry>,
    mut rng: ResMut<SimRng>,
    mut people: Query<&mut Quarantine>,
) {
    let day = clock.day;
    let intervention = &params.intervention;
    let dropout = clamp_unit(intervention.quarantine_dropout_rate);

    for &entity in registry.entities() {
        let Ok(mut quarantine) = people.get_mut(entity) else {
            continue;
        };
        if !quarantine.active {
            continue;
        }
        let served = quarantine
            .start_day
            .map_or(true, |start| day.saturating_sub(start) >= intervention.self_quarantine_days);
        if served || (dropout > 0.0 && rng.0.gen::<f64>() < dropout) {
            quarantine.release();
        }
    }
}

/// System: newly symptomatic agents self-quarantine
///
/// Each mild or severe agent not already isolating enters quarantine with
/// probability `self_quarantine_fraction * quarantine_compliance`, taking
/// the living members of its household along when configured.
pub fn apply_self_quarantine(
    clock: Res<SimClock>,
    params: Res<ModelParams>,
    registry: Res<PersonRegistry>,
    mut rng: ResMut<SimRng>,
    mut people: Query<(&Demographics, &Health, &mut Quarantine)>,
) {
    let intervention = &params.intervention;
    let p = clamp_unit(intervention.self_quarantine_fraction * intervention.quarantine_compliance);
    if p <= 0.0 {
        return;
    }
    let day = clock.day;

    let mut entering = Vec::new();
    for &entity in registry.entities() {
        let Ok((demographics, health, quarantine)) = people.get(entity) else {
            continue;
        };
        let symptomatic = matches!(
            health.state,
            DiseaseState::SymptomaticMild | DiseaseState::SymptomaticSevere
        );
        if symptomatic && !quarantine.active && rng.0.gen::<f64>() < p {
            entering.push((entity, demographics.household_id));
        }
    }

    let mut quarantined = 0usize;
    for &(entity, household_id) in &entering {
        if let Ok((_, _, mut quarantine)) = people.get_mut(entity) {
            if !quarantine.active {
                quarantine.begin(day);
                quarantined += 1;
            }
        }
        if !intervention.quarantine_household_on_symptoms {
            continue;
        }
        for &member in registry.household(household_id) {
            let Some(member_entity) = registry.entity(member) else {
                continue;
            };
            if let Ok((_, health, mut quarantine)) = people.get_mut(member_entity) {
                if health.state.is_alive() && !quarantine.active {
                    quarantine.begin(day);
                    quarantined += 1;
                }
            }
        }
    }

    if quarantined > 0 {
        debug!(day, cases = entering.len(), quarantined, "self-quarantine");
    }
}
