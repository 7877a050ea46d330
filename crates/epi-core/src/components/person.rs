//! Person Components
//!
//! Components carried by every agent: identity, demographics, disease
//! episode, immunity, vaccination, infectiousness and quarantine status.

use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Dense integer id; also the agent's index in [`PersonRegistry`](super::PersonRegistry)
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PersonId(pub usize);

impl PersonId {
    pub fn index(&self) -> usize {
        self.0
    }
}

impl fmt::Display for PersonId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "person_{:06}", self.0)
    }
}

/// Coarse life stage used for occupation groups and work contact means
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifeStage {
    Child,
    Teen,
    Adult,
    Elderly,
}

impl LifeStage {
    /// Band 0 is children, band 1 teens, bands 2-5 adults, 6 and up elderly.
    pub fn from_age_group(age_group: usize) -> Self {
        match age_group {
            0 => LifeStage::Child,
            1 => LifeStage::Teen,
            2..=5 => LifeStage::Adult,
            _ => LifeStage::Elderly,
        }
    }
}

/// Fixed demographic attributes assigned at population construction
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Demographics {
    pub age_group: usize,
    pub household_id: usize,
    pub occupation_id: Option<usize>,
}

impl Demographics {
    pub fn life_stage(&self) -> LifeStage {
        LifeStage::from_age_group(self.age_group)
    }
}

/// Disease state of an agent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiseaseState {
    #[default]
    Susceptible,
    Presymptomatic,
    Asymptomatic,
    SymptomaticMild,
    SymptomaticSevere,
    Hospitalized,
    Critical,
    RecoveredProtected,
    RecoveredPartial,
    RecoveredWaned,
    Dead,
}

impl DiseaseState {
    pub fn all() -> &'static [DiseaseState] {
        &[
            DiseaseState::Susceptible,
            DiseaseState::Presymptomatic,
            DiseaseState::Asymptomatic,
            DiseaseState::SymptomaticMild,
            DiseaseState::SymptomaticSevere,
            DiseaseState::Hospitalized,
            DiseaseState::Critical,
            DiseaseState::RecoveredProtected,
            DiseaseState::RecoveredPartial,
            DiseaseState::RecoveredWaned,
            DiseaseState::Dead,
        ]
    }

    /// Any stage of an active infection
    pub fn is_infected(&self) -> bool {
        matches!(
            self,
            DiseaseState::Presymptomatic
                | DiseaseState::Asymptomatic
                | DiseaseState::SymptomaticMild
                | DiseaseState::SymptomaticSevere
                | DiseaseState::Hospitalized
                | DiseaseState::Critical
        )
    }

    /// States that can pass the infection on to contacts
    pub fn is_infectious(&self) -> bool {
        matches!(
            self,
            DiseaseState::Presymptomatic
                | DiseaseState::Asymptomatic
                | DiseaseState::SymptomaticMild
                | DiseaseState::SymptomaticSevere
        )
    }

    /// Symptomatic agents stay away from occupation and random contacts
    pub fn is_symptomatic(&self) -> bool {
        matches!(
            self,
            DiseaseState::SymptomaticMild
                | DiseaseState::SymptomaticSevere
                | DiseaseState::Hospitalized
                | DiseaseState::Critical
        )
    }

    pub fn is_recovered(&self) -> bool {
        matches!(
            self,
            DiseaseState::RecoveredProtected
                | DiseaseState::RecoveredPartial
                | DiseaseState::RecoveredWaned
        )
    }

    /// Can be (re)infected: susceptible or any recovered sub-state
    pub fn is_infectable(&self) -> bool {
        matches!(self, DiseaseState::Susceptible) || self.is_recovered()
    }

    pub fn is_alive(&self) -> bool {
        !matches!(self, DiseaseState::Dead)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DiseaseState::Susceptible => "susceptible",
            DiseaseState::Presymptomatic => "presymptomatic",
            DiseaseState::Asymptomatic => "asymptomatic",
            DiseaseState::SymptomaticMild => "symptomatic_mild",
            DiseaseState::SymptomaticSevere => "symptomatic_severe",
            DiseaseState::Hospitalized => "hospitalized",
            DiseaseState::Critical => "critical",
            DiseaseState::RecoveredProtected => "recovered_protected",
            DiseaseState::RecoveredPartial => "recovered_partial",
            DiseaseState::RecoveredWaned => "recovered_waned",
            DiseaseState::Dead => "dead",
        }
    }
}

impl fmt::Display for DiseaseState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of the severity branch drawn at infection time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeverityOutcome {
    Asymptomatic,
    Mild,
    Hospitalised,
    Critical,
}

impl SeverityOutcome {
    /// Hospitalised and critical branches both pass through hospital
    pub fn needs_hospital(&self) -> bool {
        matches!(self, SeverityOutcome::Hospitalised | SeverityOutcome::Critical)
    }
}

/// Stage thresholds in days since infection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StageTimings {
    pub time_to_symptoms: u32,
    pub time_to_hospital: Option<u32>,
    pub time_to_critical: Option<u32>,
    pub time_to_death: Option<u32>,
    pub time_to_recover: u32,
}

/// Branch and timings of one infection episode, fixed at infection time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiseaseCourse {
    pub outcome: SeverityOutcome,
    /// Only ever set on the critical branch
    pub will_die: bool,
    pub timings: StageTimings,
}

/// Disease state plus the current episode
#[derive(Component, Debug, Clone, Default, Serialize, Deserialize)]
pub struct Health {
    pub state: DiseaseState,
    /// Present exactly while infected
    pub course: Option<DiseaseCourse>,
    pub infection_day: Option<u32>,
    pub days_infected: u32,
    pub symptom_onset_day: Option<u32>,
    pub num_infections: u32,
}

/// Natural immunity from a previous infection
#[derive(Component, Debug, Clone, Default, Serialize, Deserialize)]
pub struct Immunity {
    pub infection_protection_level: f64,
    pub severe_protection_level: f64,
    pub recovery_day: Option<u32>,
}

/// Doses received and the protection they currently confer
#[derive(Component, Debug, Clone, Default, Serialize, Deserialize)]
pub struct Vaccination {
    pub doses: u8,
    pub dose1_day: Option<u32>,
    pub dose2_day: Option<u32>,
    pub protection_infection: f64,
    pub protection_severe: f64,
}

/// Per-agent transmissibility
#[derive(Component, Debug, Clone)]
pub struct Infectiousness {
    /// Lognormal multiplier, fixed for life
    pub individual_factor: f64,
    /// Infectiousness by day since infection, shared across the population
    pub curve: Arc<[f64]>,
    /// Upper bound on total daily contacts
    pub daily_interactions_target: f64,
}

impl Infectiousness {
    /// Curve value for a day count, holding the last value past the end.
    pub fn curve_at(&self, days_infected: u32) -> f64 {
        if self.curve.is_empty() {
            return 1.0;
        }
        let index = (days_infected as usize).min(self.curve.len() - 1);
        self.curve[index]
    }
}

/// Self-quarantine status
#[derive(Component, Debug, Clone, Default, Serialize, Deserialize)]
pub struct Quarantine {
    pub active: bool,
    pub start_day: Option<u32>,
}

impl Quarantine {
    pub fn begin(&mut self, day: u32) {
        self.active = true;
        self.start_day = Some(day);
    }

    pub fn release(&mut self) {
        self.active = false;
        self.start_day = None;
    }
}
