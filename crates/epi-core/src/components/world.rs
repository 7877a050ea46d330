//! World Resources
//!
//! Resources shared by every system: the day clock, parameter bundles, the
//! seeded RNG and the registry of agents and their network memberships.

use bevy_ecs::prelude::*;
use rand::rngs::SmallRng;
use rand::SeedableRng;

use crate::config::{DiseaseParams, InterventionParams, ModelConfig, NetworkParams, VaccineParams};

use super::person::PersonId;

/// Resource: Current simulated day
#[derive(Resource, Debug, Default, Clone, Copy)]
pub struct SimClock {
    pub day: u32,
}

/// Resource: Parameter bundles, read-only for the lifetime of a run
#[derive(Resource, Debug, Clone)]
pub struct ModelParams {
    pub disease: DiseaseParams,
    pub network: NetworkParams,
    pub intervention: InterventionParams,
    pub vaccine: VaccineParams,
}

impl ModelParams {
    pub fn from_config(config: &ModelConfig) -> Self {
        Self {
            disease: config.disease.clone(),
            network: config.network.clone(),
            intervention: config.intervention.clone(),
            vaccine: config.vaccine.clone(),
        }
    }
}

impl Default for ModelParams {
    fn default() -> Self {
        Self::from_config(&ModelConfig::default())
    }
}

/// Seeded random number generator resource
#[derive(Resource)]
pub struct SimRng(pub SmallRng);

impl SimRng {
    pub fn from_seed(seed: u64) -> Self {
        Self(SmallRng::seed_from_u64(seed))
    }
}

/// Resource: Registry of all agents and network memberships
///
/// Index `i` of `entities` is the entity for `PersonId(i)`. Households and
/// occupation groups store member ids, in ascending order.
#[derive(Resource, Debug, Default)]
pub struct PersonRegistry {
    entities: Vec<Entity>,
    households: Vec<Vec<PersonId>>,
    occupations: Vec<Vec<PersonId>>,
}

impl PersonRegistry {
    pub fn new(
        entities: Vec<Entity>,
        households: Vec<Vec<PersonId>>,
        occupations: Vec<Vec<PersonId>>,
    ) -> Self {
        Self {
            entities,
            households,
            occupations,
        }
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn entity(&self, id: PersonId) -> Option<Entity> {
        self.entities.get(id.0).copied()
    }

    /// Entities in ascending id order
    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn household(&self, household_id: usize) -> &[PersonId] {
        self.households
            .get(household_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn occupation(&self, occupation_id: usize) -> &[PersonId] {
        self.occupations
            .get(occupation_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn households(&self) -> &[Vec<PersonId>] {
        &self.households
    }

    pub fn occupations(&self) -> &[Vec<PersonId>] {
        &self.occupations
    }
}
