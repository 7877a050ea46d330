//! Configuration System
//!
//! Parameter bundles for the disease, contact networks, interventions and
//! vaccination. Every bundle deserializes from TOML with per-field defaults,
//! so a config file only needs the values it overrides.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::ConfigError;

/// Number of age bands used by the default parameter tables
pub const NUM_AGE_GROUPS: usize = 9;

/// Default population share per age band (0-9, 10-19, ..., 80+)
pub const DEFAULT_AGE_DISTRIBUTION: [f64; NUM_AGE_GROUPS] =
    [0.12, 0.11, 0.13, 0.13, 0.13, 0.13, 0.11, 0.08, 0.05];

/// Top-level configuration: RNG seed, age structure and the four bundles
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Seed for the run's random number generator
    pub seed: u64,
    /// Population share per age band; its length defines the number of bands
    pub age_distribution: Vec<f64>,
    pub disease: DiseaseParams,
    pub network: NetworkParams,
    pub intervention: InterventionParams,
    pub vaccine: VaccineParams,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            age_distribution: DEFAULT_AGE_DISTRIBUTION.to_vec(),
            disease: DiseaseParams::default(),
            network: NetworkParams::default(),
            intervention: InterventionParams::default(),
            vaccine: VaccineParams::default(),
        }
    }
}

impl ModelConfig {
    /// Loads configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Parses configuration from a TOML string.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Renders the configuration as a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_age_distribution(mut self, age_distribution: Vec<f64>) -> Self {
        self.age_distribution = age_distribution;
        self
    }

    pub fn with_disease(mut self, disease: DiseaseParams) -> Self {
        self.disease = disease;
        self
    }

    pub fn with_network(mut self, network: NetworkParams) -> Self {
        self.network = network;
        self
    }

    pub fn with_intervention(mut self, intervention: InterventionParams) -> Self {
        self.intervention = intervention;
        self
    }

    pub fn with_vaccine(mut self, vaccine: VaccineParams) -> Self {
        self.vaccine = vaccine;
        self
    }

    /// Number of age bands (K)
    pub fn num_age_groups(&self) -> usize {
        self.age_distribution.len()
    }

    /// Checks every bundle against the age structure.
    ///
    /// Distributions that sum to zero are not rejected here; they fall back to
    /// uniform when normalized.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.age_distribution.is_empty() {
            return Err(ConfigError::EmptyDistribution {
                field: "age_distribution",
            });
        }
        for &share in &self.age_distribution {
            non_negative("age_distribution", share)?;
        }

        let k = self.num_age_groups();
        self.disease.validate(k)?;
        self.network.validate(k)?;
        self.intervention.validate()?;
        self.vaccine.validate(k)?;
        Ok(())
    }
}

/// Disease transmissibility, severity and immunity parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiseaseParams {
    /// Per-contact transmission scale, in infections per thousand contacts
    pub infectious_rate: f64,
    pub mean_infectious_period: f64,
    pub sd_infectious_period: f64,

    /// Gamma-density shape of the infectiousness curve
    pub infectiousness_shape: f64,
    pub infectiousness_scale: f64,

    pub asymptomatic_infectious_factor: f64,
    pub mild_infectious_factor: f64,
    pub severe_infectious_factor: f64,

    /// Sigma of the lognormal individual infectiousness multiplier
    pub individual_infectiousness_sd: f64,

    pub fraction_asymptomatic: Vec<f64>,
    pub fraction_mild: Vec<f64>,
    pub fraction_hospitalised: Vec<f64>,
    pub fraction_critical: Vec<f64>,
    /// Unconditional fatality fraction per band
    pub fraction_fatality: Vec<f64>,

    pub relative_susceptibility: Vec<f64>,

    pub mean_time_to_symptoms: f64,
    pub sd_time_to_symptoms: f64,
    pub mean_symptom_to_recover_mild: f64,
    pub sd_symptom_to_recover_mild: f64,
    pub mean_symptom_to_hospital: f64,
    pub sd_symptom_to_hospital: f64,
    pub mean_hospital_to_recover: f64,
    pub sd_hospital_to_recover: f64,
    pub mean_hospital_to_critical: f64,
    pub sd_hospital_to_critical: f64,
    pub mean_critical_to_death: f64,
    pub sd_critical_to_death: f64,
    pub mean_critical_to_recover: f64,
    pub sd_critical_to_recover: f64,
    pub mean_asymptomatic_to_recover: f64,
    pub sd_asymptomatic_to_recover: f64,

    /// Days after recovery with full infection protection
    pub reinfection_protection_days: f64,
    /// Days after recovery until infection protection has fully waned
    pub severe_protection_days: f64,
    pub severe_protection_decay_rate: f64,
    pub reinfection_protection_level: f64,
    pub partial_immunity_floor: f64,
}

impl Default for DiseaseParams {
    fn default() -> Self {
        Self {
            infectious_rate: 35.0,
            mean_infectious_period: 7.0,
            sd_infectious_period: 2.5,
            infectiousness_shape: 2.0,
            infectiousness_scale: 2.0,
            asymptomatic_infectious_factor: 0.33,
            mild_infectious_factor: 0.72,
            severe_infectious_factor: 1.0,
            individual_infectiousness_sd: 0.4,
            fraction_asymptomatic: vec![0.50, 0.45, 0.40, 0.35, 0.30, 0.25, 0.20, 0.15, 0.10],
            fraction_mild: vec![0.48, 0.50, 0.53, 0.55, 0.56, 0.54, 0.50, 0.45, 0.40],
            fraction_hospitalised: vec![0.015, 0.020, 0.035, 0.050, 0.080, 0.120, 0.180, 0.250, 0.300],
            fraction_critical: vec![0.004, 0.005, 0.010, 0.020, 0.040, 0.070, 0.100, 0.150, 0.200],
            fraction_fatality: vec![0.0002, 0.0005, 0.0010, 0.0020, 0.0050, 0.0100, 0.0300, 0.0800, 0.1500],
            relative_susceptibility: vec![0.4, 0.4, 0.8, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0],
            mean_time_to_symptoms: 5.0,
            sd_time_to_symptoms: 2.0,
            mean_symptom_to_recover_mild: 8.0,
            sd_symptom_to_recover_mild: 3.0,
            mean_symptom_to_hospital: 6.5,
            sd_symptom_to_hospital: 2.5,
            mean_hospital_to_recover: 10.0,
            sd_hospital_to_recover: 4.0,
            mean_hospital_to_critical: 3.0,
            sd_hospital_to_critical: 1.5,
            mean_critical_to_death: 9.0,
            sd_critical_to_death: 3.0,
            mean_critical_to_recover: 14.0,
            sd_critical_to_recover: 5.0,
            mean_asymptomatic_to_recover: 12.0,
            sd_asymptomatic_to_recover: 4.0,
            reinfection_protection_days: 180.0,
            severe_protection_days: 540.0,
            severe_protection_decay_rate: 0.25,
            reinfection_protection_level: 0.75,
            partial_immunity_floor: 0.15,
        }
    }
}

impl DiseaseParams {
    fn validate(&self, k: usize) -> Result<(), ConfigError> {
        let scalars = [
            ("infectious_rate", self.infectious_rate),
            ("mean_infectious_period", self.mean_infectious_period),
            ("sd_infectious_period", self.sd_infectious_period),
            ("infectiousness_shape", self.infectiousness_shape),
            ("infectiousness_scale", self.infectiousness_scale),
            ("asymptomatic_infectious_factor", self.asymptomatic_infectious_factor),
            ("mild_infectious_factor", self.mild_infectious_factor),
            ("severe_infectious_factor", self.severe_infectious_factor),
            ("individual_infectiousness_sd", self.individual_infectiousness_sd),
            ("mean_time_to_symptoms", self.mean_time_to_symptoms),
            ("sd_time_to_symptoms", self.sd_time_to_symptoms),
            ("mean_symptom_to_recover_mild", self.mean_symptom_to_recover_mild),
            ("sd_symptom_to_recover_mild", self.sd_symptom_to_recover_mild),
            ("mean_symptom_to_hospital", self.mean_symptom_to_hospital),
            ("sd_symptom_to_hospital", self.sd_symptom_to_hospital),
            ("mean_hospital_to_recover", self.mean_hospital_to_recover),
            ("sd_hospital_to_recover", self.sd_hospital_to_recover),
            ("mean_hospital_to_critical", self.mean_hospital_to_critical),
            ("sd_hospital_to_critical", self.sd_hospital_to_critical),
            ("mean_critical_to_death", self.mean_critical_to_death),
            ("sd_critical_to_death", self.sd_critical_to_death),
            ("mean_critical_to_recover", self.mean_critical_to_recover),
            ("sd_critical_to_recover", self.sd_critical_to_recover),
            ("mean_asymptomatic_to_recover", self.mean_asymptomatic_to_recover),
            ("sd_asymptomatic_to_recover", self.sd_asymptomatic_to_recover),
            ("reinfection_protection_days", self.reinfection_protection_days),
            ("severe_protection_days", self.severe_protection_days),
            ("severe_protection_decay_rate", self.severe_protection_decay_rate),
        ];
        for (field, value) in scalars {
            non_negative(field, value)?;
        }
        probability("reinfection_protection_level", self.reinfection_protection_level)?;
        probability("partial_immunity_floor", self.partial_immunity_floor)?;

        let fractions = [
            ("fraction_asymptomatic", &self.fraction_asymptomatic),
            ("fraction_mild", &self.fraction_mild),
            ("fraction_hospitalised", &self.fraction_hospitalised),
            ("fraction_critical", &self.fraction_critical),
            ("fraction_fatality", &self.fraction_fatality),
        ];
        for (field, values) in fractions {
            age_array(field, values, k)?;
            for &value in values {
                probability(field, value)?;
            }
        }

        age_array("relative_susceptibility", &self.relative_susceptibility, k)?;
        for &value in &self.relative_susceptibility {
            non_negative("relative_susceptibility", value)?;
        }
        Ok(())
    }
}

/// Contact network structure and mixing parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkParams {
    /// Share of households of size 1, 2, ...
    pub household_size_dist: Vec<f64>,
    /// Mean total daily contacts per age band; caps random contacts
    pub mean_daily_interactions: Vec<f64>,

    pub mean_work_interactions_child: f64,
    pub mean_work_interactions_teen: f64,
    pub mean_work_interactions_adult: f64,
    pub mean_work_interactions_elderly: f64,

    pub mean_random_interactions: Vec<f64>,
    /// Negative-binomial dispersion `k` of random contact counts
    pub overdispersion_random: f64,

    /// Daily probability of attending the occupation group
    pub daily_fraction_work: f64,

    /// Staff adults per member in child groups (teen groups use half)
    pub child_network_adults_ratio: f64,
    pub elderly_network_adults_ratio: f64,

    pub relative_transmission_household: f64,
    pub relative_transmission_occupation: f64,
    pub relative_transmission_random: f64,
}

impl Default for NetworkParams {
    fn default() -> Self {
        Self {
            household_size_dist: vec![0.28, 0.34, 0.16, 0.13, 0.06, 0.03],
            mean_daily_interactions: vec![11.8, 15.6, 14.6, 13.6, 14.7, 13.8, 10.2, 7.6, 4.0],
            mean_work_interactions_child: 8.0,
            mean_work_interactions_teen: 16.0,
            mean_work_interactions_adult: 7.0,
            mean_work_interactions_elderly: 2.0,
            mean_random_interactions: vec![2.0, 3.0, 4.0, 4.0, 4.0, 4.0, 3.0, 2.0, 1.0],
            overdispersion_random: 0.62,
            daily_fraction_work: 0.5,
            child_network_adults_ratio: 0.2,
            elderly_network_adults_ratio: 0.2,
            relative_transmission_household: 2.0,
            relative_transmission_occupation: 1.0,
            relative_transmission_random: 1.0,
        }
    }
}

impl NetworkParams {
    fn validate(&self, k: usize) -> Result<(), ConfigError> {
        if self.household_size_dist.is_empty() {
            return Err(ConfigError::EmptyDistribution {
                field: "household_size_dist",
            });
        }
        for &share in &self.household_size_dist {
            non_negative("household_size_dist", share)?;
        }

        for (field, values) in [
            ("mean_daily_interactions", &self.mean_daily_interactions),
            ("mean_random_interactions", &self.mean_random_interactions),
        ] {
            age_array(field, values, k)?;
            for &value in values {
                non_negative(field, value)?;
            }
        }

        let scalars = [
            ("mean_work_interactions_child", self.mean_work_interactions_child),
            ("mean_work_interactions_teen", self.mean_work_interactions_teen),
            ("mean_work_interactions_adult", self.mean_work_interactions_adult),
            ("mean_work_interactions_elderly", self.mean_work_interactions_elderly),
            ("overdispersion_random", self.overdispersion_random),
            ("child_network_adults_ratio", self.child_network_adults_ratio),
            ("elderly_network_adults_ratio", self.elderly_network_adults_ratio),
            ("relative_transmission_household", self.relative_transmission_household),
            ("relative_transmission_occupation", self.relative_transmission_occupation),
            ("relative_transmission_random", self.relative_transmission_random),
        ];
        for (field, value) in scalars {
            non_negative(field, value)?;
        }
        probability("daily_fraction_work", self.daily_fraction_work)
    }
}

/// Non-pharmaceutical interventions: symptomatic self-quarantine, lockdown
/// layer multipliers and elderly shielding
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InterventionParams {
    /// Probability that a newly symptomatic agent self-quarantines
    pub self_quarantine_fraction: f64,
    pub self_quarantine_days: u32,
    pub quarantine_household_on_symptoms: bool,
    pub quarantine_compliance: f64,
    /// Daily probability of leaving quarantine early
    pub quarantine_dropout_rate: f64,

    pub lockdown_household_multiplier: f64,
    pub lockdown_occupation_multiplier: f64,
    pub lockdown_random_multiplier: f64,

    pub shielding_elderly: bool,
    /// Fractional cut in random contacts for shielded elderly agents
    pub shielding_contact_reduction: f64,
}

impl Default for InterventionParams {
    fn default() -> Self {
        Self {
            self_quarantine_fraction: 0.0,
            self_quarantine_days: 7,
            quarantine_household_on_symptoms: false,
            quarantine_compliance: 1.0,
            quarantine_dropout_rate: 0.0,
            lockdown_household_multiplier: 1.0,
            lockdown_occupation_multiplier: 1.0,
            lockdown_random_multiplier: 1.0,
            shielding_elderly: false,
            shielding_contact_reduction: 0.5,
        }
    }
}

impl InterventionParams {
    fn validate(&self) -> Result<(), ConfigError> {
        probability("self_quarantine_fraction", self.self_quarantine_fraction)?;
        probability("quarantine_compliance", self.quarantine_compliance)?;
        probability("quarantine_dropout_rate", self.quarantine_dropout_rate)?;
        probability("shielding_contact_reduction", self.shielding_contact_reduction)?;
        non_negative("lockdown_household_multiplier", self.lockdown_household_multiplier)?;
        non_negative("lockdown_occupation_multiplier", self.lockdown_occupation_multiplier)?;
        non_negative("lockdown_random_multiplier", self.lockdown_random_multiplier)
    }
}

/// Vaccine archetype
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VaccineType {
    #[default]
    None,
    /// One efficacy for both infection and severe protection
    Sterilizing,
    /// Separate, dose-dependent infection and severe efficacies
    NonSterilizing,
}

/// Vaccine efficacy, waning and dosing schedule
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VaccineParams {
    pub vaccine_type: VaccineType,

    pub sterilizing_efficacy_infection: f64,
    pub sterilizing_protection_days: f64,
    pub sterilizing_decay_rate: f64,

    pub non_sterilizing_efficacy_infection_dose1: f64,
    pub non_sterilizing_efficacy_infection_dose2: f64,
    pub non_sterilizing_efficacy_severe_dose1: f64,
    pub non_sterilizing_efficacy_severe_dose2: f64,
    pub non_sterilizing_protection_days: f64,
    pub non_sterilizing_decay_rate: f64,

    pub dose_interval_days: u32,
    pub time_to_protection_dose1: u32,
    pub time_to_protection_dose2: u32,

    /// Daily first-dose probability per age band
    pub vaccination_rate_by_age: Vec<f64>,
}

impl Default for VaccineParams {
    fn default() -> Self {
        Self {
            vaccine_type: VaccineType::None,
            sterilizing_efficacy_infection: 0.95,
            sterilizing_protection_days: 1095.0,
            sterilizing_decay_rate: 0.3,
            non_sterilizing_efficacy_infection_dose1: 0.20,
            non_sterilizing_efficacy_infection_dose2: 0.20,
            non_sterilizing_efficacy_severe_dose1: 0.80,
            non_sterilizing_efficacy_severe_dose2: 0.95,
            non_sterilizing_protection_days: 1095.0,
            non_sterilizing_decay_rate: 0.3,
            dose_interval_days: 28,
            time_to_protection_dose1: 14,
            time_to_protection_dose2: 7,
            vaccination_rate_by_age: vec![0.0; NUM_AGE_GROUPS],
        }
    }
}

impl VaccineParams {
    fn validate(&self, k: usize) -> Result<(), ConfigError> {
        let efficacies = [
            ("sterilizing_efficacy_infection", self.sterilizing_efficacy_infection),
            ("non_sterilizing_efficacy_infection_dose1", self.non_sterilizing_efficacy_infection_dose1),
            ("non_sterilizing_efficacy_infection_dose2", self.non_sterilizing_efficacy_infection_dose2),
            ("non_sterilizing_efficacy_severe_dose1", self.non_sterilizing_efficacy_severe_dose1),
            ("non_sterilizing_efficacy_severe_dose2", self.non_sterilizing_efficacy_severe_dose2),
        ];
        for (field, value) in efficacies {
            probability(field, value)?;
        }

        let scalars = [
            ("sterilizing_protection_days", self.sterilizing_protection_days),
            ("sterilizing_decay_rate", self.sterilizing_decay_rate),
            ("non_sterilizing_protection_days", self.non_sterilizing_protection_days),
            ("non_sterilizing_decay_rate", self.non_sterilizing_decay_rate),
        ];
        for (field, value) in scalars {
            non_negative(field, value)?;
        }

        age_array("vaccination_rate_by_age", &self.vaccination_rate_by_age, k)?;
        for &rate in &self.vaccination_rate_by_age {
            non_negative("vaccination_rate_by_age", rate)?;
        }
        Ok(())
    }
}

fn non_negative(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Negative { field, value })
    }
}

fn probability(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::NotAProbability { field, value })
    }
}

fn age_array(field: &'static str, values: &[f64], expected: usize) -> Result<(), ConfigError> {
    if values.len() == expected {
        Ok(())
    } else {
        Err(ConfigError::AgeArrayLength {
            field,
            expected,
            actual: values.len(),
        })
    }
}
