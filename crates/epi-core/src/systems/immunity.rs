//! Natural Immunity
//!
//! Recovery bookkeeping and the post-recovery waning of infection and
//! severe protection.

use crate::components::{DiseaseState, Health, Immunity};
use crate::config::DiseaseParams;
use crate::sampling::clamp_unit;

/// Ends the episode: recovered-protected with full severe protection.
pub fn transition_to_recovered(health: &mut Health, immunity: &mut Immunity, day: u32, params: &DiseaseParams) {
    health.state = DiseaseState::RecoveredProtected;
    health.days_infected = 0;
    health.course = None;

    immunity.recovery_day = Some(day);
    immunity.infection_protection_level = clamp_unit(params.reinfection_protection_level);
    immunity.severe_protection_level = 1.0;
}

/// Recovered sub-state and protection levels `t` days after recovery.
pub fn protection_after_recovery(t: f64, params: &DiseaseParams) -> (DiseaseState, f64, f64) {
    let t = t.max(0.0);
    let protected_days = params.reinfection_protection_days;
    let severe_days = params.severe_protection_days;
    let level = params.reinfection_protection_level;
    let floor = params.partial_immunity_floor;

    let (state, infection) = if t <= protected_days {
        (DiseaseState::RecoveredProtected, level)
    } else if t <= severe_days {
        let span = (severe_days - protected_days).max(1.0);
        let waned = clamp_unit((t - protected_days) / span);
        (DiseaseState::RecoveredPartial, floor.max(level * (1.0 - waned)))
    } else {
        (DiseaseState::RecoveredWaned, floor / 2.0)
    };

    let decay = (-params.severe_protection_decay_rate * t / severe_days.max(1.0)).exp();
    let severe = if state == DiseaseState::RecoveredWaned {
        floor * decay
    } else {
        floor.max(decay.min(1.0))
    };

    (state, clamp_unit(infection), clamp_unit(severe))
}

/// Moves a recovered agent between sub-states and refreshes its protection.
pub fn update_post_recovery_immunity(health: &mut Health, immunity: &mut Immunity, day: u32, params: &DiseaseParams) {
    let Some(recovery_day) = immunity.recovery_day else {
        return;
    };
    let t = day.saturating_sub(recovery_day) as f64;
    let (state, infection, severe) = protection_after_recovery(t, params);
    health.state = state;
    immunity.infection_protection_level = infection;
    immunity.severe_protection_level = severe;
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_recovery_sets_full_protection() {
        let params = DiseaseParams::default();
        let mut health = Health {
            state: DiseaseState::SymptomaticMild,
            days_infected: 9,
            ..Health::default()
        };
        let mut immunity = Immunity::default();
        transition_to_recovered(&mut health, &mut immunity, 40, &params);

        assert_eq!(health.state, DiseaseState::RecoveredProtected);
        assert_eq!(health.days_infected, 0);
        assert_eq!(immunity.recovery_day, Some(40));
        assert_eq!(immunity.infection_protection_level, 0.75);
        assert_eq!(immunity.severe_protection_level, 1.0);
    }

    #[test]
    fn test_waning_regimes() {
        let params = DiseaseParams::default();

        let (state, infection, severe) = protection_after_recovery(100.0, &params);
        assert_eq!(state, DiseaseState::RecoveredProtected);
        assert_eq!(infection, 0.75);
        assert!(severe > 0.9);

        // halfway through the partial window: 0.75 * 0.5
        let (state, infection, _) = protection_after_recovery(360.0, &params);
        assert_eq!(state, DiseaseState::RecoveredPartial);
        assert!((infection - 0.375).abs() < 1e-9);

        let (state, infection, _) = protection_after_recovery(530.0, &params);
        assert_eq!(state, DiseaseState::RecoveredPartial);
        assert!((infection - 0.15).abs() < 1e-9);

        let (state, infection, severe) = protection_after_recovery(600.0, &params);
        assert_eq!(state, DiseaseState::RecoveredWaned);
        assert!((infection - 0.075).abs() < 1e-12);
        assert!(severe < 0.15);
    }

    #[test]
    fn test_update_without_recovery_day_is_noop() {
        let params = DiseaseParams::default();
        let mut health = Health {
            state: DiseaseState::RecoveredWaned,
            ..Health::default()
        };
        let mut immunity = Immunity {
            infection_protection_level: 0.3,
            ..Immunity::default()
        };
        update_post_recovery_immunity(&mut health, &mut immunity, 50, &params);
        assert_eq!(health.state, DiseaseState::RecoveredWaned);
        assert_eq!(immunity.infection_protection_level, 0.3);
    }

    proptest! {
        #[test]
        fn prop_protection_levels_in_unit_range(
            t in 0.0f64..5000.0,
            level in 0.0f64..=1.0,
            floor in 0.0f64..=1.0,
            decay in 0.0f64..5.0,
        ) {
            let params = DiseaseParams {
                reinfection_protection_level: level,
                partial_immunity_floor: floor,
                severe_protection_decay_rate: decay,
                ..DiseaseParams::default()
            };
            let (state, infection, severe) = protection_after_recovery(t, &params);
            prop_assert!(state.is_recovered());
            prop_assert!((0.0..=1.0).contains(&infection));
            prop_assert!((0.0..=1.0).contains(&severe));
        }
    }
}
