//! Population and contact-network generation tests

use epi_core::config::NetworkParams;
use epi_core::setup::generate_population;
use epi_core::{Model, ModelConfig};
use rand::rngs::SmallRng;
use rand::SeedableRng;

#[test]
fn test_population_size_and_membership() {
    for size in [1, 17, 250, 2000] {
        let model = Model::new(size, ModelConfig::default().with_seed(size as u64)).unwrap();
        assert_eq!(model.population_size(), size);

        let mut household_count = vec![0usize; size];
        for (household_id, members) in model.households().iter().enumerate() {
            assert!(!members.is_empty());
            for id in members {
                household_count[id.index()] += 1;
                let person = model.person(*id).unwrap();
                assert_eq!(person.demographics.household_id, household_id);
            }
        }
        assert!(household_count.iter().all(|&count| count == 1), "size {}", size);

        let mut occupation_count = vec![0usize; size];
        for (occupation_id, members) in model.occupations().iter().enumerate() {
            for id in members {
                occupation_count[id.index()] += 1;
                let person = model.person(*id).unwrap();
                assert_eq!(person.demographics.occupation_id, Some(occupation_id));
            }
        }
        assert!(occupation_count.iter().all(|&count| count <= 1));

        let bands = model.config().num_age_groups();
        assert!(model.people().all(|p| p.demographics.age_group < bands));
    }
}

#[test]
fn test_household_sizes_follow_distribution() {
    let network = NetworkParams::default();
    let age_distribution = ModelConfig::default().age_distribution;
    let mut rng = SmallRng::seed_from_u64(4242);
    let population = generate_population(60_000, &age_distribution, &network.household_size_dist, &mut rng).unwrap();

    assert_eq!(population.len(), 60_000);
    let households = population.households.len() as f64;
    for (index, &expected) in network.household_size_dist.iter().enumerate() {
        let observed = population
            .households
            .iter()
            .filter(|members| members.len() == index + 1)
            .count() as f64
            / households;
        assert!(
            (observed - expected).abs() < 0.02,
            "size {}: observed {:.3}, expected {:.3}",
            index + 1,
            observed,
            expected
        );
    }
}

#[test]
fn test_everyone_starts_susceptible() {
    let model = Model::new(500, ModelConfig::default()).unwrap();
    assert!(model
        .people()
        .all(|p| p.health.state == epi_core::DiseaseState::Susceptible && p.health.course.is_none()));
    assert!(model.transmission_events().is_empty());
    assert!(model.stats().is_empty());
}
