//! Disease Progression System
//!
//! Draws the severity branch and stage timings when an agent is infected,
//! and moves infected agents through the state machine once per day.

use bevy_ecs::prelude::*;
use rand::Rng;
use tracing::trace;

use crate::components::{
    DiseaseCourse, DiseaseState, Health, Immunity, ModelParams, SeverityOutcome, SimClock, StageTimings, Vaccination,
};
use crate::config::DiseaseParams;
use crate::sampling::{clamp_unit, combine_protection, sample_duration, weighted_choice};

use super::immunity::{transition_to_recovered, update_post_recovery_immunity};

/// Smallest critical fraction used when converting fatality to P(death | critical)
const MIN_CRITICAL_FRACTION: f64 = 1e-6;

/// Combined reduction in severe outcomes from vaccination and prior infection.
pub fn severe_reduction(immunity: &Immunity, vaccination: &Vaccination) -> f64 {
    combine_protection(vaccination.protection_severe, immunity.severe_protection_level)
}

/// Draws the branch and cumulative stage timings for one infection episode.
pub fn draw_disease_course<R: Rng + ?Sized>(
    rng: &mut R,
    age_group: usize,
    reduction: f64,
    params: &DiseaseParams,
) -> DiseaseCourse {
    let at = |values: &[f64]| values.get(age_group).copied().unwrap_or(0.0);
    let keep = 1.0 - clamp_unit(reduction);

    let weights = [
        at(&params.fraction_asymptomatic),
        at(&params.fraction_mild),
        at(&params.fraction_hospitalised) * keep,
        at(&params.fraction_critical) * keep,
    ];
    let outcome = match weighted_choice(rng, &weights) {
        Some(1) => SeverityOutcome::Mild,
        Some(2) => SeverityOutcome::Hospitalised,
        Some(3) => SeverityOutcome::Critical,
        _ => SeverityOutcome::Asymptomatic,
    };

    let symptoms = sample_duration(rng, params.mean_time_to_symptoms, params.sd_time_to_symptoms);
    let mut timings = StageTimings {
        time_to_symptoms: symptoms,
        ..StageTimings::default()
    };
    let mut will_die = false;

    match outcome {
        SeverityOutcome::Asymptomatic => {
            timings.time_to_recover = sample_duration(
                rng,
                params.mean_asymptomatic_to_recover,
                params.sd_asymptomatic_to_recover,
            );
        }
        SeverityOutcome::Mild => {
            timings.time_to_recover = symptoms
                + sample_duration(
                    rng,
                    params.mean_symptom_to_recover_mild,
                    params.sd_symptom_to_recover_mild,
                );
        }
        SeverityOutcome::Hospitalised => {
            let hospital = symptoms
                + sample_duration(rng, params.mean_symptom_to_hospital, params.sd_symptom_to_hospital);
            timings.time_to_hospital = Some(hospital);
            timings.time_to_recover = hospital
                + sample_duration(rng, params.mean_hospital_to_recover, params.sd_hospital_to_recover);
        }
        SeverityOutcome::Critical => {
            let hospital = symptoms
                + sample_duration(rng, params.mean_symptom_to_hospital, params.sd_symptom_to_hospital);
            let critical = hospital
                + sample_duration(rng, params.mean_hospital_to_critical, params.sd_hospital_to_critical);
            timings.time_to_hospital = Some(hospital);
            timings.time_to_critical = Some(critical);
            timings.time_to_recover = critical
                + sample_duration(rng, params.mean_critical_to_recover, params.sd_critical_to_recover);

            let fatality = at(&params.fraction_fatality) * keep;
            let baseline = at(&params.fraction_critical).max(MIN_CRITICAL_FRACTION);
            let p_death = clamp_unit(fatality / baseline);
            if p_death > 0.0 {
                will_die = rng.gen::<f64>() < p_death;
                if will_die {
                    timings.time_to_death = Some(
                        critical
                            + sample_duration(rng, params.mean_critical_to_death, params.sd_critical_to_death),
                    );
                }
            }
        }
    }

    if timings.time_to_recover <= symptoms {
        let fallback = (params.mean_symptom_to_recover_mild.floor() as u32).max(1);
        timings.time_to_recover = symptoms + fallback;
    }

    DiseaseCourse {
        outcome,
        will_die,
        timings,
    }
}

/// Infects an agent on `day`, starting a fresh episode.
///
/// Natural infection protection is lost and residual severe protection
/// halved before the new branch is drawn.
pub fn infect_person<R: Rng + ?Sized>(
    rng: &mut R,
    health: &mut Health,
    immunity: &mut Immunity,
    vaccination: &Vaccination,
    age_group: usize,
    day: u32,
    params: &DiseaseParams,
) {
    immunity.recovery_day = None;
    immunity.infection_protection_level = 0.0;
    immunity.severe_protection_level = clamp_unit(immunity.severe_protection_level * 0.5);

    health.state = DiseaseState::Presymptomatic;
    health.infection_day = Some(day);
    health.days_infected = 0;
    health.symptom_onset_day = None;
    health.num_infections += 1;

    let reduction = severe_reduction(immunity, vaccination);
    health.course = Some(draw_disease_course(rng, age_group, reduction, params));
}

/// Transition table: the state an infected agent moves to after
/// `days_infected` days, if any.
pub fn next_state(state: DiseaseState, course: &DiseaseCourse, days_infected: u32) -> Option<DiseaseState> {
    let timings = &course.timings;
    let reached = |threshold: Option<u32>| threshold.map_or(false, |t| days_infected >= t);
    let recovered = days_infected >= timings.time_to_recover;

    match state {
        DiseaseState::Presymptomatic if days_infected >= timings.time_to_symptoms => Some(match course.outcome {
            SeverityOutcome::Asymptomatic => DiseaseState::Asymptomatic,
            SeverityOutcome::Hospitalised | SeverityOutcome::Critical => DiseaseState::SymptomaticSevere,
            SeverityOutcome::Mild => DiseaseState::SymptomaticMild,
        }),
        DiseaseState::Asymptomatic | DiseaseState::SymptomaticMild if recovered => {
            Some(DiseaseState::RecoveredProtected)
        }
        DiseaseState::SymptomaticSevere => {
            if course.outcome.needs_hospital() {
                reached(timings.time_to_hospital).then_some(DiseaseState::Hospitalized)
            } else {
                recovered.then_some(DiseaseState::RecoveredProtected)
            }
        }
        DiseaseState::Hospitalized => {
            if course.outcome == SeverityOutcome::Critical && reached(timings.time_to_critical) {
                Some(DiseaseState::Critical)
            } else {
                recovered.then_some(DiseaseState::RecoveredProtected)
            }
        }
        DiseaseState::Critical => {
            if course.will_die && reached(timings.time_to_death) {
                Some(DiseaseState::Dead)
            } else {
                recovered.then_some(DiseaseState::RecoveredProtected)
            }
        }
        _ => None,
    }
}

/// System: daily disease advance
///
/// Recovered agents get their immunity update; infected agents count one
/// more day and take at most one transition.
pub fn advance_disease(
    clock: Res<SimClock>,
    params: Res<ModelParams>,
    mut people: Query<(&mut Health, &mut Immunity)>,
) {
    let day = clock.day;
    for (mut health, mut immunity) in people.iter_mut() {
        let state = health.state;
        if state.is_recovered() {
            update_post_recovery_immunity(&mut health, &mut immunity, day, &params.disease);
            continue;
        }
        if !state.is_infected() {
            continue;
        }

        health.days_infected += 1;
        let Some(course) = health.course else {
            continue;
        };
        let Some(next) = next_state(state, &course, health.days_infected) else {
            continue;
        };

        trace!(from = %state, to = %next, day, "disease transition");
        match next {
            DiseaseState::RecoveredProtected => {
                transition_to_recovered(&mut health, &mut immunity, day, &params.disease);
            }
            DiseaseState::Dead => {
                health.state = DiseaseState::Dead;
                health.course = None;
            }
            _ => {
                if state == DiseaseState::Presymptomatic {
                    health.symptom_onset_day = Some(day);
                }
                health.state = next;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    fn course(outcome: SeverityOutcome, will_die: bool) -> DiseaseCourse {
        DiseaseCourse {
            outcome,
            will_die,
            timings: StageTimings {
                time_to_symptoms: 3,
                time_to_hospital: Some(6),
                time_to_critical: Some(8),
                time_to_death: Some(12),
                time_to_recover: 15,
            },
        }
    }

    fn assert_ordered(course: &DiseaseCourse) {
        let t = &course.timings;
        assert!(t.time_to_symptoms >= 1);
        assert!(t.time_to_recover > t.time_to_symptoms);
        if let Some(hospital) = t.time_to_hospital {
            assert!(hospital > t.time_to_symptoms);
            assert!(t.time_to_recover > hospital);
        }
        if let Some(critical) = t.time_to_critical {
            assert!(critical > t.time_to_hospital.unwrap());
            assert!(t.time_to_recover > critical);
        }
        if let Some(death) = t.time_to_death {
            assert!(course.will_die);
            assert!(death > t.time_to_critical.unwrap());
        }
    }

    #[test]
    fn test_course_timings_are_causally_ordered() {
        let mut rng = SmallRng::seed_from_u64(21);
        let params = DiseaseParams::default();
        for age_group in 0..9 {
            for _ in 0..300 {
                let course = draw_disease_course(&mut rng, age_group, 0.0, &params);
                assert_ordered(&course);
                if course.will_die {
                    assert_eq!(course.outcome, SeverityOutcome::Critical);
                }
            }
        }
    }

    #[test]
    fn test_full_reduction_removes_severe_branches() {
        let mut rng = SmallRng::seed_from_u64(22);
        let params = DiseaseParams::default();
        for _ in 0..500 {
            let course = draw_disease_course(&mut rng, 8, 1.0, &params);
            assert!(!course.outcome.needs_hospital());
            assert!(!course.will_die);
        }
    }

    #[test]
    fn test_zero_fractions_fall_back_to_asymptomatic() {
        let mut rng = SmallRng::seed_from_u64(23);
        let params = DiseaseParams {
            fraction_asymptomatic: vec![0.0; 9],
            fraction_mild: vec![0.0; 9],
            fraction_hospitalised: vec![0.0; 9],
            fraction_critical: vec![0.0; 9],
            ..DiseaseParams::default()
        };
        let course = draw_disease_course(&mut rng, 4, 0.0, &params);
        assert_eq!(course.outcome, SeverityOutcome::Asymptomatic);
    }

    #[test]
    fn test_transition_table() {
        let mild = course(SeverityOutcome::Mild, false);
        assert_eq!(next_state(DiseaseState::Presymptomatic, &mild, 2), None);
        assert_eq!(
            next_state(DiseaseState::Presymptomatic, &mild, 3),
            Some(DiseaseState::SymptomaticMild)
        );
        assert_eq!(
            next_state(DiseaseState::SymptomaticMild, &mild, 15),
            Some(DiseaseState::RecoveredProtected)
        );

        let critical = course(SeverityOutcome::Critical, true);
        assert_eq!(
            next_state(DiseaseState::Presymptomatic, &critical, 3),
            Some(DiseaseState::SymptomaticSevere)
        );
        assert_eq!(
            next_state(DiseaseState::SymptomaticSevere, &critical, 6),
            Some(DiseaseState::Hospitalized)
        );
        assert_eq!(
            next_state(DiseaseState::Hospitalized, &critical, 8),
            Some(DiseaseState::Critical)
        );
        assert_eq!(next_state(DiseaseState::Critical, &critical, 11), None);
        assert_eq!(next_state(DiseaseState::Critical, &critical, 12), Some(DiseaseState::Dead));

        let survivor = course(SeverityOutcome::Critical, false);
        assert_eq!(
            next_state(DiseaseState::Critical, &survivor, 15),
            Some(DiseaseState::RecoveredProtected)
        );

        let hospitalised = course(SeverityOutcome::Hospitalised, false);
        assert_eq!(next_state(DiseaseState::Hospitalized, &hospitalised, 9), None);
        assert_eq!(
            next_state(DiseaseState::Hospitalized, &hospitalised, 15),
            Some(DiseaseState::RecoveredProtected)
        );
    }

    #[test]
    fn test_reinfection_resets_episode() {
        let mut rng = SmallRng::seed_from_u64(24);
        let mut health = Health {
            state: DiseaseState::RecoveredPartial,
            days_infected: 0,
            num_infections: 1,
            infection_day: Some(3),
            symptom_onset_day: Some(7),
            course: None,
        };
        let mut immunity = Immunity {
            infection_protection_level: 0.5,
            severe_protection_level: 0.8,
            recovery_day: Some(20),
        };
        infect_person(
            &mut rng,
            &mut health,
            &mut immunity,
            &Vaccination::default(),
            4,
            200,
            &DiseaseParams::default(),
        );

        assert_eq!(health.state, DiseaseState::Presymptomatic);
        assert_eq!(health.infection_day, Some(200));
        assert_eq!(health.symptom_onset_day, None);
        assert_eq!(health.num_infections, 2);
        assert!(health.course.is_some());
        assert_eq!(immunity.infection_protection_level, 0.0);
        assert!((immunity.severe_protection_level - 0.4).abs() < 1e-12);
        assert_eq!(immunity.recovery_day, None);
    }

    #[test]
    fn test_advance_disease_system() {
        let mut world = World::new();
        world.insert_resource(SimClock { day: 5 });
        world.insert_resource(ModelParams::default());

        let infected = world
            .spawn((
                Health {
                    state: DiseaseState::Presymptomatic,
                    days_infected: 2,
                    infection_day: Some(2),
                    num_infections: 1,
                    course: Some(course(SeverityOutcome::Mild, false)),
                    ..Health::default()
                },
                Immunity::default(),
            ))
            .id();
        let susceptible = world.spawn((Health::default(), Immunity::default())).id();

        let mut schedule = Schedule::default();
        schedule.add_systems(advance_disease);
        schedule.run(&mut world);

        let health = world.get::<Health>(infected).unwrap();
        assert_eq!(health.days_infected, 3);
        assert_eq!(health.state, DiseaseState::SymptomaticMild);
        assert_eq!(health.symptom_onset_day, Some(5));

        let untouched = world.get::<Health>(susceptible).unwrap();
        assert_eq!(untouched.state, DiseaseState::Susceptible);
        assert_eq!(untouched.days_infected, 0);
    }

    #[test]
    fn test_death_is_terminal() {
        let mut world = World::new();
        world.insert_resource(SimClock { day: 30 });
        world.insert_resource(ModelParams::default());

        let dying = world
            .spawn((
                Health {
                    state: DiseaseState::Critical,
                    days_infected: 11,
                    course: Some(course(SeverityOutcome::Critical, true)),
                    ..Health::default()
                },
                Immunity::default(),
            ))
            .id();

        let mut schedule = Schedule::default();
        schedule.add_systems(advance_disease);
        schedule.run(&mut world);
        assert_eq!(world.get::<Health>(dying).unwrap().state, DiseaseState::Dead);

        world.resource_mut::<SimClock>().day = 31;
        schedule.run(&mut world);
        let health = world.get::<Health>(dying).unwrap();
        assert_eq!(health.state, DiseaseState::Dead);
        assert!(health.course.is_none());
    }
}
