//! Vaccination System
//!
//! Administers first and second doses and keeps vaccine-derived protection
//! current. Protection starts after a per-dose delay and then decays
//! exponentially from the reference dose.

use bevy_ecs::prelude::*;
use rand::Rng;
use tracing::debug;

use crate::components::{Demographics, Health, ModelParams, PersonRegistry, SimClock, SimRng, Vaccination};
use crate::config::{VaccineParams, VaccineType};
use crate::sampling::{clamp_unit, combine_protection};

/// Multiplicative waning `t` days after the reference dose.
pub fn vaccine_decay(days_since: f64, protection_days: f64, decay_rate: f64) -> f64 {
    if days_since <= 0.0 {
        return 1.0;
    }
    let exponent = if protection_days > 0.0 {
        -decay_rate * days_since / protection_days
    } else {
        -decay_rate * days_since
    };
    clamp_unit(exponent.exp())
}

/// Day the dose starts protecting, if it was given and its delay has passed.
fn active_since(dose_day: Option<u32>, delay: u32, day: u32) -> Option<u32> {
    dose_day.filter(|&given| day >= given.saturating_add(delay))
}

/// `(infection, severe)` protection conferred on `day`.
pub fn vaccine_protection(vaccination: &Vaccination, params: &VaccineParams, day: u32) -> (f64, f64) {
    if vaccination.doses == 0 {
        return (0.0, 0.0);
    }
    let dose1 = active_since(vaccination.dose1_day, params.time_to_protection_dose1, day);
    let dose2 = active_since(vaccination.dose2_day, params.time_to_protection_dose2, day);

    match params.vaccine_type {
        VaccineType::None => (0.0, 0.0),
        VaccineType::Sterilizing => {
            let Some(reference) = dose2.or(dose1) else {
                return (0.0, 0.0);
            };
            let decay = vaccine_decay(
                (day - reference) as f64,
                params.sterilizing_protection_days,
                params.sterilizing_decay_rate,
            );
            let level = clamp_unit(params.sterilizing_efficacy_infection * decay);
            (level, level)
        }
        VaccineType::NonSterilizing => {
            let (infection, severe, reference) = match (dose1, dose2) {
                (_, Some(reference)) => (
                    combine_protection(
                        params.non_sterilizing_efficacy_infection_dose1,
                        params.non_sterilizing_efficacy_infection_dose2,
                    ),
                    combine_protection(
                        params.non_sterilizing_efficacy_severe_dose1,
                        params.non_sterilizing_efficacy_severe_dose2,
                    ),
                    reference,
                ),
                (Some(reference), None) => (
                    params.non_sterilizing_efficacy_infection_dose1,
                    params.non_sterilizing_efficacy_severe_dose1,
                    reference,
                ),
                (None, None) => return (0.0, 0.0),
            };
            let decay = vaccine_decay(
                (day - reference) as f64,
                params.non_sterilizing_protection_days,
                params.non_sterilizing_decay_rate,
            );
            (clamp_unit(infection * decay), clamp_unit(severe * decay))
        }
    }
}

/// Recomputes the stored protection levels for `day`.
pub fn refresh_protection(vaccination: &mut Vaccination, params: &VaccineParams, day: u32) {
    let (infection, severe) = vaccine_protection(vaccination, params, day);
    vaccination.protection_infection = infection;
    vaccination.protection_severe = severe;
}

/// Gives the next due dose on `day`. Returns whether a dose was given.
pub fn administer_dose(vaccination: &mut Vaccination, params: &VaccineParams, day: u32) -> bool {
    match (vaccination.doses, vaccination.dose1_day, vaccination.dose2_day) {
        (0, _, _) => {
            vaccination.doses = 1;
            vaccination.dose1_day = Some(day);
        }
        (1, _, None) => {
            vaccination.doses = 2;
            vaccination.dose2_day = Some(day);
        }
        _ => return false,
    }
    refresh_protection(vaccination, params, day);
    true
}

/// System: refresh vaccine protection before disease progression
pub fn update_vaccine_protection(
    clock: Res<SimClock>,
    params: Res<ModelParams>,
    mut people: Query<&mut Vaccination>,
) {
    for mut vaccination in people.iter_mut() {
        refresh_protection(&mut vaccination, &params.vaccine, clock.day);
    }
}

/// System: daily dosing
///
/// Susceptible and recovered agents take a first dose with their age band's
/// daily rate; the second dose follows once the dose interval has passed.
pub fn administer_vaccines(
    clock: Res<SimClock>,
    params: Res<ModelParams>,
    registry: Res<PersonRegistry>,
    mut rng: ResMut<SimRng>,
    mut people: Query<(&Demographics, &Health, &mut Vaccination)>,
) {
    let vaccine = &params.vaccine;
    if vaccine.vaccine_type == VaccineType::None {
        return;
    }
    let day = clock.day;
    let mut first_doses = 0usize;
    let mut second_doses = 0usize;

    for &entity in registry.entities() {
        let Ok((demographics, health, mut vaccination)) = people.get_mut(entity) else {
            continue;
        };
        if !health.state.is_infectable() {
            continue;
        }

        match (vaccination.doses, vaccination.dose1_day, vaccination.dose2_day) {
            (0, _, _) => {
                let rate = vaccine
                    .vaccination_rate_by_age
                    .get(demographics.age_group)
                    .copied()
                    .unwrap_or(0.0);
                let p = clamp_unit(rate);
                if p > 0.0 && rng.0.gen::<f64>() < p && administer_dose(&mut vaccination, vaccine, day) {
                    first_doses += 1;
                }
            }
            (1, Some(dose1), None) if day.saturating_sub(dose1) >= vaccine.dose_interval_days => {
                if administer_dose(&mut vaccination, vaccine, day) {
                    second_doses += 1;
                }
            }
            _ => {}
        }
    }

    if first_doses + second_doses > 0 {
        debug!(day, first_doses, second_doses, "vaccination pass");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{DiseaseState, PersonId};

    fn sterilizing() -> VaccineParams {
        VaccineParams {
            vaccine_type: VaccineType::Sterilizing,
            ..VaccineParams::default()
        }
    }

    #[test]
    fn test_decay_shapes() {
        assert_eq!(vaccine_decay(0.0, 1095.0, 0.3), 1.0);
        assert!((vaccine_decay(1095.0, 1095.0, 0.3) - (-0.3f64).exp()).abs() < 1e-12);
        assert!((vaccine_decay(2.0, 0.0, 0.5) - (-1.0f64).exp()).abs() < 1e-12);
        assert_eq!(vaccine_decay(400.0, 1095.0, 0.0), 1.0);
    }

    #[test]
    fn test_sterilizing_protection_waits_for_delay() {
        let params = sterilizing();
        let mut vaccination = Vaccination::default();
        administer_dose(&mut vaccination, &params, 10);
        assert_eq!(vaccination.protection_infection, 0.0);

        refresh_protection(&mut vaccination, &params, 24);
        let expected = 0.95 * vaccine_decay(14.0, 1095.0, 0.3);
        assert!((vaccination.protection_infection - expected).abs() < 1e-12);
        assert_eq!(vaccination.protection_infection, vaccination.protection_severe);
    }

    #[test]
    fn test_second_dose_becomes_reference_after_its_delay() {
        let params = sterilizing();
        let vaccination = Vaccination {
            doses: 2,
            dose1_day: Some(0),
            dose2_day: Some(100),
            ..Vaccination::default()
        };
        // dose 2 not active yet, dose 1 still protects
        let (before, _) = vaccine_protection(&vaccination, &params, 103);
        let expected = 0.95 * vaccine_decay(103.0, 1095.0, 0.3);
        assert!((before - expected).abs() < 1e-12);

        let (after, _) = vaccine_protection(&vaccination, &params, 107);
        let expected = 0.95 * vaccine_decay(7.0, 1095.0, 0.3);
        assert!((after - expected).abs() < 1e-12);
        assert!(after > before);
    }

    #[test]
    fn test_non_sterilizing_combines_doses() {
        let params = VaccineParams {
            vaccine_type: VaccineType::NonSterilizing,
            non_sterilizing_decay_rate: 0.0,
            ..VaccineParams::default()
        };
        let one_dose = Vaccination {
            doses: 1,
            dose1_day: Some(0),
            ..Vaccination::default()
        };
        let (infection, severe) = vaccine_protection(&one_dose, &params, 20);
        assert!((infection - 0.2).abs() < 1e-12);
        assert!((severe - 0.8).abs() < 1e-12);

        let two_doses = Vaccination {
            doses: 2,
            dose1_day: Some(0),
            dose2_day: Some(28),
            ..Vaccination::default()
        };
        let (infection, severe) = vaccine_protection(&two_doses, &params, 40);
        assert!((infection - 0.36).abs() < 1e-12);
        assert!((severe - 0.99).abs() < 1e-12);
    }

    #[test]
    fn test_none_type_never_protects() {
        let vaccination = Vaccination {
            doses: 2,
            dose1_day: Some(0),
            dose2_day: Some(28),
            ..Vaccination::default()
        };
        assert_eq!(vaccine_protection(&vaccination, &VaccineParams::default(), 300), (0.0, 0.0));
    }

    #[test]
    fn test_dosing_system_gives_both_doses() {
        let mut world = World::new();
        let mut params = ModelParams::default();
        params.vaccine = VaccineParams {
            vaccination_rate_by_age: vec![1.0; 9],
            dose_interval_days: 3,
            ..sterilizing()
        };
        world.insert_resource(params);
        world.insert_resource(SimClock { day: 0 });
        world.insert_resource(SimRng::from_seed(4));

        let demographics = Demographics {
            age_group: 4,
            household_id: 0,
            occupation_id: None,
        };
        let eligible = world
            .spawn((PersonId(0), demographics, Health::default(), Vaccination::default()))
            .id();
        let infected = world
            .spawn((
                PersonId(1),
                demographics,
                Health {
                    state: DiseaseState::Presymptomatic,
                    ..Health::default()
                },
                Vaccination::default(),
            ))
            .id();
        world.insert_resource(PersonRegistry::new(vec![eligible, infected], vec![], vec![]));

        let mut schedule = Schedule::default();
        schedule.add_systems(administer_vaccines);
        schedule.run(&mut world);

        let vaccination = world.get::<Vaccination>(eligible).unwrap();
        assert_eq!(vaccination.doses, 1);
        assert_eq!(vaccination.dose1_day, Some(0));
        assert_eq!(world.get::<Vaccination>(infected).unwrap().doses, 0);

        world.resource_mut::<SimClock>().day = 2;
        schedule.run(&mut world);
        assert_eq!(world.get::<Vaccination>(eligible).unwrap().doses, 1);

        world.resource_mut::<SimClock>().day = 3;
        schedule.run(&mut world);
        let vaccination = world.get::<Vaccination>(eligible).unwrap();
        assert_eq!(vaccination.doses, 2);
        assert_eq!(vaccination.dose2_day, Some(3));
    }
}
