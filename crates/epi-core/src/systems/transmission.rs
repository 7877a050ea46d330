//! Transmission System
//!
//! Once a day every infectious agent meets its contacts and may infect them.
//! The pass reads a frozen copy of all agents taken before any source is
//! processed; new infections are applied after the last source, and a target
//! is infected at most once per day.

use bevy_ecs::prelude::*;
use epi_events::{ContactLayer, TransmissionEvent};
use rand::Rng;
use tracing::debug;

use crate::components::{
    Demographics, DiseaseState, Health, Immunity, Infectiousness, ModelParams, PersonId, PersonRegistry, Quarantine,
    SimClock, SimRng, Vaccination,
};
use crate::config::DiseaseParams;
use crate::sampling::{clamp_unit, combine_protection};

use super::contacts::daily_contacts;
use super::progression::infect_person;

/// Resource: Every transmission so far, in the order they were applied
#[derive(Resource, Debug, Default)]
pub struct TransmissionLog {
    events: Vec<TransmissionEvent>,
    written: usize,
}

impl TransmissionLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: TransmissionEvent) {
        self.events.push(event);
    }

    pub fn events(&self) -> &[TransmissionEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Number of transmissions recorded on `day`
    pub fn count_on(&self, day: u32) -> usize {
        self.events.iter().filter(|event| event.day == day).count()
    }

    /// Events not yet handed to an external writer
    pub fn unwritten(&self) -> &[TransmissionEvent] {
        &self.events[self.written..]
    }

    pub fn mark_written(&mut self) {
        self.written = self.events.len();
    }
}

/// One agent as seen by the transmission pass
#[derive(Debug, Clone, Default)]
pub struct FrozenAgent {
    pub state: DiseaseState,
    pub age_group: usize,
    pub household_id: usize,
    pub occupation_id: Option<usize>,
    pub quarantined: bool,
    /// In an infectious stage when the pass began
    pub transmits: bool,
    /// Per-contact probability before layer and target factors
    pub base_probability: f64,
    pub susceptibility: f64,
    pub daily_interactions_target: f64,
}

impl FrozenAgent {
    /// Placeholder for an id whose entity is gone; never a contact.
    fn absent() -> Self {
        Self {
            state: DiseaseState::Dead,
            ..Self::default()
        }
    }
}

/// Severity multiplier; presymptomatic agents transmit like severe cases.
pub fn severity_factor(state: DiseaseState, params: &DiseaseParams) -> f64 {
    match state {
        DiseaseState::Asymptomatic => params.asymptomatic_infectious_factor,
        DiseaseState::SymptomaticMild => params.mild_infectious_factor,
        _ => params.severe_infectious_factor,
    }
}

/// `relative_susceptibility[age] * (1 - combined protection)`, in [0, 1].
pub fn susceptibility(age_group: usize, immunity: &Immunity, vaccination: &Vaccination, params: &DiseaseParams) -> f64 {
    let base = params.relative_susceptibility.get(age_group).copied().unwrap_or(1.0);
    let combined = combine_protection(immunity.infection_protection_level, vaccination.protection_infection);
    clamp_unit(base * (1.0 - combined))
}

/// Layer multiplier: relative transmission times the lockdown factor.
pub fn layer_multiplier(layer: ContactLayer, config: &ModelParams) -> f64 {
    let network = &config.network;
    let intervention = &config.intervention;
    match layer {
        ContactLayer::Household => {
            network.relative_transmission_household * intervention.lockdown_household_multiplier
        }
        ContactLayer::Occupation => {
            network.relative_transmission_occupation * intervention.lockdown_occupation_multiplier
        }
        ContactLayer::Random => network.relative_transmission_random * intervention.lockdown_random_multiplier,
    }
}

type AgentRef<'a> = (
    &'a Demographics,
    &'a Health,
    &'a Immunity,
    &'a Vaccination,
    &'a Infectiousness,
    &'a Quarantine,
);

/// Per-contact probability of `source` infecting `target` through `layer`.
pub fn contact_probability(source: &FrozenAgent, target: &FrozenAgent, layer: ContactLayer, params: &ModelParams) -> f64 {
    clamp_unit(source.base_probability * layer_multiplier(layer, params) * target.susceptibility)
}

fn freeze(agent: AgentRef<'_>, params: &DiseaseParams) -> FrozenAgent {
    let (demographics, health, immunity, vaccination, infectiousness, quarantine) = agent;
    let transmits = health.state.is_infectious();
    let base_probability = if transmits {
        params.infectious_rate / 1000.0
            * infectiousness.curve_at(health.days_infected)
            * infectiousness.individual_factor
            * severity_factor(health.state, params)
    } else {
        0.0
    };

    FrozenAgent {
        state: health.state,
        age_group: demographics.age_group,
        household_id: demographics.household_id,
        occupation_id: demographics.occupation_id,
        quarantined: quarantine.active,
        transmits,
        base_probability,
        susceptibility: susceptibility(demographics.age_group, immunity, vaccination, params),
        daily_interactions_target: infectiousness.daily_interactions_target,
    }
}

/// System: daily transmission pass
#[allow(clippy::type_complexity)]
pub fn transmit_infections(
    clock: Res<SimClock>,
    params: Res<ModelParams>,
    registry: Res<PersonRegistry>,
    mut rng: ResMut<SimRng>,
    mut log: ResMut<TransmissionLog>,
    mut people: Query<(
        &Demographics,
        &mut Health,
        &mut Immunity,
        &Vaccination,
        &Infectiousness,
        &Quarantine,
    )>,
) {
    let day = clock.day;
    let rng = &mut rng.0;

    let agents: Vec<FrozenAgent> = registry
        .entities()
        .iter()
        .map(|&entity| match people.get(entity) {
            Ok(agent) => freeze(agent, &params.disease),
            Err(_) => FrozenAgent::absent(),
        })
        .collect();
    let living: Vec<usize> = (0..agents.len()).filter(|&id| agents[id].state.is_alive()).collect();

    let mut infected_today = vec![false; agents.len()];
    let mut pending = Vec::new();
    let mut sources = 0usize;

    for source in 0..agents.len() {
        if !agents[source].transmits {
            continue;
        }
        sources += 1;
        let contacts = daily_contacts(
            rng,
            source,
            &agents,
            &living,
            &registry,
            &params.network,
            &params.intervention,
        );

        for &layer in ContactLayer::all() {
            for &target in contacts.layer(layer) {
                let contact = &agents[target];
                if infected_today[target] || !contact.state.is_infectable() || contact.susceptibility <= 0.0 {
                    continue;
                }
                let p = contact_probability(&agents[source], contact, layer, &params);
                if rng.gen::<f64>() < p {
                    infected_today[target] = true;
                    pending.push(TransmissionEvent::new(day, source, target, layer));
                }
            }
        }
    }

    for event in &pending {
        let Some(entity) = registry.entity(PersonId(event.target)) else {
            continue;
        };
        if let Ok((demographics, mut health, mut immunity, vaccination, _, _)) = people.get_mut(entity) {
            infect_person(
                rng,
                &mut health,
                &mut immunity,
                vaccination,
                demographics.age_group,
                day,
                &params.disease,
            );
        }
        log.push(*event);
    }

    debug!(day, sources, new_infections = pending.len(), "transmission pass");
}
