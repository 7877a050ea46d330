//! Whole-model scenario tests

use epi_core::{
    ContactLayer, DiseaseState, InterventionParams, Model, ModelConfig, PersonId, VaccineParams, VaccineType,
};

const POPULATION: usize = 1000;

#[test]
fn test_default_scenario_conserves_population() {
    let mut model = Model::new(POPULATION, ModelConfig::default().with_seed(2024)).unwrap();
    let rows = model.run_simulation(30, 5, false).unwrap();

    assert_eq!(rows.len(), 30);
    assert!(rows[0].infected <= 5 + rows[0].transmissions);
    assert_eq!(rows[0].new_infections, rows[0].infected);
    assert_eq!(rows[0].new_deaths, 0);
    for (day, row) in rows.iter().enumerate() {
        assert_eq!(row.day, day as u32);
        assert_eq!(row.total(), POPULATION, "conservation broken on day {}", day);
        assert!(row.hospitalized + row.critical <= row.infected);
        assert_eq!(row.transmissions, model.transmission_events().iter().filter(|e| e.day == row.day).count());
    }
}

#[test]
fn test_transmission_events_are_consistent() {
    let mut model = Model::new(POPULATION, ModelConfig::default().with_seed(5)).unwrap();
    model.run_simulation(30, 10, false).unwrap();

    let events = model.transmission_events();
    assert!(events.windows(2).all(|pair| pair[0].day <= pair[1].day));
    for event in events {
        assert_ne!(event.source, event.target);
        assert!(event.target < POPULATION);
        assert!(event.day < 30);

        let target = model.person(PersonId(event.target)).unwrap();
        assert!(target.health.num_infections >= 1);
    }
}

#[test]
fn test_no_vaccine_keeps_protection_at_zero() {
    let mut model = Model::new(POPULATION, ModelConfig::default().with_seed(8)).unwrap();
    model.run_simulation(30, 5, false).unwrap();

    for person in model.people() {
        assert_eq!(person.vaccination.doses, 0);
        assert_eq!(person.vaccination.protection_infection, 0.0);
        assert_eq!(person.vaccination.protection_severe, 0.0);
    }
}

#[test]
fn test_perfect_sterilizing_vaccine_stops_transmission() {
    let vaccine = VaccineParams {
        vaccine_type: VaccineType::Sterilizing,
        sterilizing_efficacy_infection: 1.0,
        sterilizing_decay_rate: 0.0,
        time_to_protection_dose1: 0,
        time_to_protection_dose2: 0,
        vaccination_rate_by_age: vec![1.0; 9],
        ..VaccineParams::default()
    };
    let config = ModelConfig::default().with_seed(17).with_vaccine(vaccine);
    let mut model = Model::new(POPULATION, config).unwrap();
    let rows = model.run_simulation(30, 5, false).unwrap();

    for row in &rows[1..] {
        assert_eq!(row.new_infections, 0, "new infection on day {}", row.day);
        assert_eq!(row.transmissions, 0);
    }
    assert!(model.transmission_events().iter().all(|event| event.day == 0));
}

#[test]
fn test_full_compliance_quarantines_every_symptomatic_agent() {
    let intervention = InterventionParams {
        self_quarantine_fraction: 1.0,
        quarantine_household_on_symptoms: true,
        ..InterventionParams::default()
    };
    let config = ModelConfig::default().with_seed(31).with_intervention(intervention);
    let mut model = Model::new(POPULATION, config).unwrap();
    model.run_simulation(25, 20, false).unwrap();

    let last_day = model.next_day() - 1;
    for person in model.people() {
        if matches!(
            person.health.state,
            DiseaseState::SymptomaticMild | DiseaseState::SymptomaticSevere
        ) {
            assert!(person.quarantine.active, "{} is symptomatic but not isolating", person.id);
        }
        if person.quarantine.active {
            assert!(person.quarantine.start_day.is_some_and(|d| d <= last_day));
        }
    }
}

#[test]
fn test_closed_occupations_and_community_leave_household_spread() {
    let intervention = InterventionParams {
        lockdown_occupation_multiplier: 0.0,
        lockdown_random_multiplier: 0.0,
        ..InterventionParams::default()
    };
    let config = ModelConfig::default().with_seed(12).with_intervention(intervention);
    let mut model = Model::new(POPULATION, config).unwrap();
    model.run_simulation(30, 10, false).unwrap();

    assert!(model
        .transmission_events()
        .iter()
        .all(|event| event.layer == ContactLayer::Household));
}
