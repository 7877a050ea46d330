//! Occupation Groups
//!
//! Partitions agents into schools, workplaces and elderly social groups by
//! life stage. Child, teen and elderly groups recruit adult staff from the
//! adult pool; every adult ends up as staff or worker, never both.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::components::LifeStage;
use crate::config::NetworkParams;
use crate::sampling::rounded_normal;

const MIN_CHILD_GROUP: usize = 5;
const MIN_TEEN_GROUP: usize = 5;
const MIN_ADULT_GROUP: usize = 3;
const MIN_ELDERLY_GROUP: usize = 2;

/// Groups of person indices; group `g` has occupation id `g`.
///
/// Ids are allocated to child groups first, then teens, workplaces and
/// elderly groups.
pub fn form_occupation_groups<R: Rng + ?Sized>(
    age_groups: &[usize],
    network: &NetworkParams,
    rng: &mut R,
) -> Vec<Vec<usize>> {
    let mut children = Vec::new();
    let mut teens = Vec::new();
    let mut adults = Vec::new();
    let mut elderly = Vec::new();
    for (person, &band) in age_groups.iter().enumerate() {
        match LifeStage::from_age_group(band) {
            LifeStage::Child => children.push(person),
            LifeStage::Teen => teens.push(person),
            LifeStage::Adult => adults.push(person),
            LifeStage::Elderly => elderly.push(person),
        }
    }
    children.shuffle(rng);
    teens.shuffle(rng);
    adults.shuffle(rng);
    elderly.shuffle(rng);

    let child_groups = split_into_groups(&children, network.mean_work_interactions_child, MIN_CHILD_GROUP, rng);
    let teen_groups = split_into_groups(&teens, network.mean_work_interactions_teen, MIN_TEEN_GROUP, rng);
    let elderly_groups = split_into_groups(&elderly, network.mean_work_interactions_elderly, MIN_ELDERLY_GROUP, rng);

    // Staff leave the adult pool before any workplace forms.
    let mut adult_pool = adults;
    let child_groups = add_staff(child_groups, network.child_network_adults_ratio, &mut adult_pool);
    let teen_groups = add_staff(teen_groups, network.child_network_adults_ratio / 2.0, &mut adult_pool);
    let elderly_groups = add_staff(elderly_groups, network.elderly_network_adults_ratio, &mut adult_pool);

    let workplaces = split_into_groups(&adult_pool, network.mean_work_interactions_adult, MIN_ADULT_GROUP, rng);

    let mut groups = Vec::with_capacity(
        child_groups.len() + teen_groups.len() + workplaces.len() + elderly_groups.len(),
    );
    groups.extend(child_groups);
    groups.extend(teen_groups);
    groups.extend(workplaces);
    groups.extend(elderly_groups);
    groups
}

/// Consecutive chunks of `members` with sizes drawn by [`draw_group_size`].
fn split_into_groups<R: Rng + ?Sized>(
    members: &[usize],
    mean_contacts: f64,
    minimum: usize,
    rng: &mut R,
) -> Vec<Vec<usize>> {
    let mut groups = Vec::new();
    let mut start = 0;
    while start < members.len() {
        let left = members.len() - start;
        let size = draw_group_size(rng, mean_contacts, left, minimum);
        let end = (start + size).min(members.len());
        groups.push(members[start..end].to_vec());
        start = end;
    }
    groups
}

/// Appends `round(len * ratio)` adults from the back of the pool to each group.
fn add_staff(mut groups: Vec<Vec<usize>>, ratio: f64, pool: &mut Vec<usize>) -> Vec<Vec<usize>> {
    if ratio <= 0.0 {
        return groups;
    }
    for group in &mut groups {
        let needed = ((group.len() as f64 * ratio).round() as usize).min(pool.len());
        let split = pool.len() - needed;
        group.extend(pool.drain(split..).rev());
    }
    groups
}

/// Group size around `max(minimum, round(mean) + 1)` with sd
/// `max(1, base / 4)`, never below `minimum` and never above what is left
/// unless `minimum` forces it.
pub fn draw_group_size<R: Rng + ?Sized>(rng: &mut R, mean_contacts: f64, left: usize, minimum: usize) -> usize {
    let base = minimum.max(mean_contacts.max(0.0).round() as usize + 1);
    let sd = (base as f64 * 0.25).max(1.0);
    let sampled = rounded_normal(rng, base as f64, sd).max(minimum as i64) as usize;
    sampled.min(left).max(minimum)
}
