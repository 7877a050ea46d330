//! Household Generation
//!
//! Draws exact age-band counts for the population and packs them into
//! households shaped after a pool of reference household templates.

use rand::seq::SliceRandom;
use rand::Rng;
use tracing::warn;

use crate::error::ConfigError;
use crate::sampling::{multinomial, normalize, uniform, weighted_choice};

/// Agents and households before any entity is spawned.
///
/// Person `i` has age band `age_groups[i]`; households list person indices.
#[derive(Debug, Clone, Default)]
pub struct Population {
    pub age_groups: Vec<usize>,
    pub households: Vec<Vec<usize>>,
}

impl Population {
    pub fn len(&self) -> usize {
        self.age_groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.age_groups.is_empty()
    }
}

/// Builds `size` agents partitioned into households.
pub fn generate_population<R: Rng + ?Sized>(
    size: usize,
    age_distribution: &[f64],
    household_size_dist: &[f64],
    rng: &mut R,
) -> Result<Population, ConfigError> {
    if size == 0 {
        return Err(ConfigError::EmptyPopulation);
    }
    if age_distribution.is_empty() {
        return Err(ConfigError::EmptyDistribution {
            field: "age_distribution",
        });
    }
    if household_size_dist.is_empty() {
        return Err(ConfigError::EmptyDistribution {
            field: "household_size_dist",
        });
    }

    let age_probs = normalize(age_distribution).unwrap_or_else(|| {
        warn!("age_distribution sums to zero, using a uniform distribution");
        uniform(age_distribution.len())
    });
    let size_weights = normalize(household_size_dist).unwrap_or_else(|| {
        warn!("household_size_dist sums to zero, using a uniform distribution");
        uniform(household_size_dist.len())
    });

    let templates = reference_households(rng);
    let mut remaining = multinomial(rng, size, &age_probs);
    let num_bands = remaining.len();

    let mut population = Population {
        age_groups: Vec::with_capacity(size),
        households: Vec::new(),
    };

    while population.len() < size {
        let quota_left: usize = remaining.iter().sum();
        if quota_left == 0 {
            break;
        }
        let people_left = size - population.len();
        let household_size = sample_household_size(rng, &size_weights, people_left).min(quota_left);
        let template = sample_template(rng, &templates, household_size, &age_probs);

        let mut members = Vec::with_capacity(household_size);
        for &desired in &template {
            if members.len() >= household_size {
                break;
            }
            match select_age_group(desired, &mut remaining) {
                Some(band) => members.push(band),
                None => break,
            }
        }
        while members.len() < household_size {
            let preferred = rng.gen_range(0..num_bands);
            match select_age_group(preferred, &mut remaining) {
                Some(band) => members.push(band),
                None => break,
            }
        }

        if members.is_empty() {
            break;
        }

        let first = population.len();
        population.households.push((first..first + members.len()).collect());
        population.age_groups.extend(members);
    }

    Ok(population)
}

/// Reference household pool: singles, couples, families and
/// multi-generational households, as lists of age bands.
pub fn reference_households<R: Rng + ?Sized>(rng: &mut R) -> Vec<Vec<usize>> {
    let mut pool = Vec::with_capacity(500);

    for _ in 0..100 {
        pool.push(vec![rng.gen_range(6..=8)]);
    }
    for _ in 0..150 {
        pool.push(vec![rng.gen_range(3..=7), rng.gen_range(3..=7)]);
    }
    for _ in 0..200 {
        let children = rng.gen_range(1..=3);
        let mut household: Vec<usize> = (0..children).map(|_| rng.gen_range(0..=1)).collect();
        household.push(rng.gen_range(3..=5));
        household.push(rng.gen_range(3..=5));
        pool.push(household);
    }
    for _ in 0..50 {
        pool.push(vec![
            rng.gen_range(0..=1),
            rng.gen_range(3..=5),
            rng.gen_range(3..=5),
            rng.gen_range(6..=7),
        ]);
    }

    pool
}

/// Household size in `1..=weights.len()`, restricted to sizes that still fit.
fn sample_household_size<R: Rng + ?Sized>(rng: &mut R, weights: &[f64], people_left: usize) -> usize {
    let max_size = people_left.max(1).min(weights.len());
    let valid = &weights[..max_size];
    let index = weighted_choice(rng, valid).unwrap_or_else(|| rng.gen_range(0..max_size));
    index + 1
}

/// A template of exactly `size` slots: a matching reference household if one
/// exists, else bands drawn from the age distribution.
fn sample_template<R: Rng + ?Sized>(
    rng: &mut R,
    templates: &[Vec<usize>],
    size: usize,
    age_probs: &[f64],
) -> Vec<usize> {
    let candidates: Vec<&Vec<usize>> = templates.iter().filter(|t| t.len() == size).collect();
    if let Some(template) = candidates.choose(rng) {
        return (*template).clone();
    }
    (0..size)
        .map(|_| weighted_choice(rng, age_probs).unwrap_or_else(|| rng.gen_range(0..age_probs.len())))
        .collect()
}

/// Takes one unit of quota from the band closest to `preferred`.
///
/// Exact band first, then by increasing distance with the lower band winning
/// ties. Returns `None` once every quota is used up.
pub fn select_age_group(preferred: usize, remaining: &mut [usize]) -> Option<usize> {
    let bands = remaining.len();
    if preferred < bands && remaining[preferred] > 0 {
        remaining[preferred] -= 1;
        return Some(preferred);
    }

    let max_offset = preferred.max(bands);
    for offset in 1..=max_offset {
        if let Some(lower) = preferred.checked_sub(offset) {
            if lower < bands && remaining[lower] > 0 {
                remaining[lower] -= 1;
                return Some(lower);
            }
        }
        let upper = preferred + offset;
        if upper < bands && remaining[upper] > 0 {
            remaining[upper] -= 1;
            return Some(upper);
        }
    }

    let band = remaining.iter().position(|&count| count > 0)?;
    remaining[band] -= 1;
    Some(band)
}
