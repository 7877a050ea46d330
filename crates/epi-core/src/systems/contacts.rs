//! Daily Contacts
//!
//! Realized contacts of one agent for one day, split by network layer.
//! Household contacts are every living co-member; occupation and random
//! contacts are drawn only for agents who are out and about.

use epi_events::ContactLayer;
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::HashSet;

use crate::components::{LifeStage, PersonId, PersonRegistry};
use crate::config::{InterventionParams, NetworkParams};
use crate::sampling::{negative_binomial, rounded_normal};

use super::transmission::FrozenAgent;

/// Contacts of one agent, by layer, as person indices
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DailyContacts {
    pub household: Vec<usize>,
    pub occupation: Vec<usize>,
    pub random: Vec<usize>,
}

impl DailyContacts {
    pub fn layer(&self, layer: ContactLayer) -> &[usize] {
        match layer {
            ContactLayer::Household => &self.household,
            ContactLayer::Occupation => &self.occupation,
            ContactLayer::Random => &self.random,
        }
    }

    pub fn len(&self) -> usize {
        self.household.len() + self.occupation.len() + self.random.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Mean daily occupation contacts for a life stage
pub fn occupation_contact_mean(stage: LifeStage, network: &NetworkParams) -> f64 {
    match stage {
        LifeStage::Child => network.mean_work_interactions_child,
        LifeStage::Teen => network.mean_work_interactions_teen,
        LifeStage::Adult => network.mean_work_interactions_adult,
        LifeStage::Elderly => network.mean_work_interactions_elderly,
    }
}

/// Rounded normal around `mean` with sd `max(1, 0.3 mean)`, clamped to
/// `[0, available]`.
pub fn occupation_contact_count<R: Rng + ?Sized>(rng: &mut R, mean: f64, available: usize) -> usize {
    if available == 0 {
        return 0;
    }
    let sd = (mean * 0.3).max(1.0);
    rounded_normal(rng, mean, sd).clamp(0, available as i64) as usize
}

/// Negative-binomial random contact count, reduced for shielded elderly
/// agents and capped by the agent's remaining daily capacity.
pub fn random_contact_count<R: Rng + ?Sized>(
    rng: &mut R,
    agent: &FrozenAgent,
    network: &NetworkParams,
    intervention: &InterventionParams,
    contacts_so_far: usize,
) -> usize {
    let mean = network
        .mean_random_interactions
        .get(agent.age_group)
        .copied()
        .unwrap_or(0.0);
    let mut count = if mean > 0.0 {
        negative_binomial(rng, mean, network.overdispersion_random) as usize
    } else {
        0
    };

    if intervention.shielding_elderly && LifeStage::from_age_group(agent.age_group) == LifeStage::Elderly {
        let keep = 1.0 - intervention.shielding_contact_reduction.clamp(0.0, 1.0);
        count = (count as f64 * keep).round() as usize;
    }

    if agent.daily_interactions_target > 0.0 {
        let capacity = (agent.daily_interactions_target - contacts_so_far as f64).round().max(0.0) as usize;
        count = count.min(capacity);
    }
    count
}

/// Draws the day's contacts for `source`.
///
/// `living` lists every living agent in ascending id order.
pub fn daily_contacts<R: Rng + ?Sized>(
    rng: &mut R,
    source: usize,
    agents: &[FrozenAgent],
    living: &[usize],
    registry: &PersonRegistry,
    network: &NetworkParams,
    intervention: &InterventionParams,
) -> DailyContacts {
    let agent = &agents[source];
    let is_living_other = |id: PersonId| id.0 != source && agents[id.0].state.is_alive();

    let mut contacts = DailyContacts {
        household: registry
            .household(agent.household_id)
            .iter()
            .filter(|id| is_living_other(**id))
            .map(|id| id.0)
            .collect(),
        ..DailyContacts::default()
    };

    let mobile = !agent.quarantined && !agent.state.is_symptomatic();
    if !mobile {
        return contacts;
    }

    if let Some(occupation_id) = agent.occupation_id {
        if rng.gen::<f64>() < network.daily_fraction_work {
            let mates: Vec<usize> = registry
                .occupation(occupation_id)
                .iter()
                .filter(|id| is_living_other(**id))
                .map(|id| id.0)
                .collect();
            let mean = occupation_contact_mean(LifeStage::from_age_group(agent.age_group), network);
            let count = occupation_contact_count(rng, mean, mates.len());
            contacts.occupation = if count >= mates.len() {
                mates
            } else {
                mates.choose_multiple(rng, count).copied().collect()
            };
        }
    }

    let count = random_contact_count(
        rng,
        agent,
        network,
        intervention,
        contacts.household.len() + contacts.occupation.len(),
    );
    if count > 0 {
        let excluded: HashSet<usize> = std::iter::once(source)
            .chain(contacts.household.iter().copied())
            .chain(contacts.occupation.iter().copied())
            .collect();
        contacts.random = sample_excluding(rng, count, living, &excluded);
    }

    contacts
}

/// Up to `count` distinct entries of `pool` not in `excluded`.
///
/// Every excluded id must itself be in `pool`.
fn sample_excluding<R: Rng + ?Sized>(
    rng: &mut R,
    count: usize,
    pool: &[usize],
    excluded: &HashSet<usize>,
) -> Vec<usize> {
    let available = pool.len().saturating_sub(excluded.len());
    let count = count.min(available);
    if count == 0 {
        return Vec::new();
    }

    if count * 2 >= available {
        let candidates: Vec<usize> = pool.iter().copied().filter(|id| !excluded.contains(id)).collect();
        return candidates.choose_multiple(rng, count).copied().collect();
    }

    let mut chosen = HashSet::with_capacity(count);
    let mut picks = Vec::with_capacity(count);
    while picks.len() < count {
        let candidate = pool[rng.gen_range(0..pool.len())];
        if !excluded.contains(&candidate) && chosen.insert(candidate) {
            picks.push(candidate);
        }
    }
    picks
}
