//! Agent Spawning
//!
//! Turns a generated population into entities and builds the registry.

use bevy_ecs::prelude::*;
use rand::Rng;
use std::sync::Arc;

use crate::components::{
    Demographics, Health, Immunity, Infectiousness, PersonId, PersonRegistry, Quarantine, Vaccination,
};
use crate::config::ModelConfig;
use crate::error::ConfigError;
use crate::sampling::{infectiousness_curve, lognormal_factor};

use super::households::generate_population;
use super::occupations::form_occupation_groups;

/// Fallback daily contact cap for bands without a configured mean
const DEFAULT_DAILY_INTERACTIONS: f64 = 10.0;

/// Spawns `size` agents into `world` and returns their registry.
pub fn spawn_population<R: Rng + ?Sized>(
    world: &mut World,
    size: usize,
    config: &ModelConfig,
    rng: &mut R,
) -> Result<PersonRegistry, ConfigError> {
    let population = generate_population(
        size,
        &config.age_distribution,
        &config.network.household_size_dist,
        rng,
    )?;
    let groups = form_occupation_groups(&population.age_groups, &config.network, rng);

    let mut occupation_of = vec![None; population.len()];
    for (occupation_id, group) in groups.iter().enumerate() {
        for &person in group {
            occupation_of[person] = Some(occupation_id);
        }
    }
    let mut household_of = vec![0usize; population.len()];
    for (household_id, members) in population.households.iter().enumerate() {
        for &person in members {
            household_of[person] = household_id;
        }
    }

    let curve: Arc<[f64]> = Arc::from(infectiousness_curve(&config.disease));
    let sigma = config.disease.individual_infectiousness_sd;

    let mut entities = Vec::with_capacity(population.len());
    for (person, &age_group) in population.age_groups.iter().enumerate() {
        let target = config
            .network
            .mean_daily_interactions
            .get(age_group)
            .copied()
            .unwrap_or(DEFAULT_DAILY_INTERACTIONS);

        let entity = world
            .spawn((
                PersonId(person),
                Demographics {
                    age_group,
                    household_id: household_of[person],
                    occupation_id: occupation_of[person],
                },
                Health::default(),
                Immunity::default(),
                Vaccination::default(),
                Infectiousness {
                    individual_factor: lognormal_factor(rng, sigma),
                    curve: Arc::clone(&curve),
                    daily_interactions_target: target,
                },
                Quarantine::default(),
            ))
            .id();
        entities.push(entity);
    }

    let to_ids = |lists: Vec<Vec<usize>>| -> Vec<Vec<PersonId>> {
        lists
            .into_iter()
            .map(|mut members| {
                members.sort_unstable();
                members.into_iter().map(PersonId).collect()
            })
            .collect()
    };

    Ok(PersonRegistry::new(
        entities,
        to_ids(population.households),
        to_ids(groups),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    #[test]
    fn test_spawned_components_match_registry() {
        let mut world = World::new();
        let mut rng = SmallRng::seed_from_u64(9);
        let config = ModelConfig::default();
        let registry = spawn_population(&mut world, 500, &config, &mut rng).unwrap();

        assert_eq!(registry.len(), 500);
        for (index, &entity) in registry.entities().iter().enumerate() {
            let id = world.get::<PersonId>(entity).unwrap();
            assert_eq!(id.0, index);

            let demographics = world.get::<Demographics>(entity).unwrap();
            assert!(registry.household(demographics.household_id).contains(id));
            if let Some(occupation_id) = demographics.occupation_id {
                assert!(registry.occupation(occupation_id).contains(id));
            }

            let infectiousness = world.get::<Infectiousness>(entity).unwrap();
            assert!(infectiousness.individual_factor > 0.0);
            assert_eq!(
                infectiousness.daily_interactions_target,
                config.network.mean_daily_interactions[demographics.age_group]
            );
        }
    }

    #[test]
    fn test_curve_is_shared() {
        let mut world = World::new();
        let mut rng = SmallRng::seed_from_u64(10);
        let registry = spawn_population(&mut world, 20, &ModelConfig::default(), &mut rng).unwrap();
        let first = world.get::<Infectiousness>(registry.entities()[0]).unwrap().curve.clone();
        let last = world.get::<Infectiousness>(registry.entities()[19]).unwrap().curve.clone();
        assert!(Arc::ptr_eq(&first, &last));
    }
}
