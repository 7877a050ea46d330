//! Agent-Based Epidemic Simulation Engine
//!
//! Simulates a respiratory pathogen spreading through a synthetic population
//! over household, occupation and random contact layers, with per-agent
//! disease progression, waning natural and vaccine immunity, and a
//! symptomatic self-quarantine hook.
//!
//! ```no_run
//! use epi_core::{Model, ModelConfig};
//!
//! let mut model = Model::new(1000, ModelConfig::default().with_seed(7))?;
//! let rows = model.run_simulation(60, 5, false)?;
//! println!("peak infected: {:?}", rows.iter().map(|r| r.infected).max());
//! # Ok::<(), epi_core::ModelError>(())
//! ```

pub mod components;
pub mod config;
pub mod error;
pub mod model;
pub mod output;
pub mod sampling;
pub mod setup;
pub mod systems;

pub use components::*;
pub use config::{DiseaseParams, InterventionParams, ModelConfig, NetworkParams, VaccineParams, VaccineType};
pub use error::{ConfigError, ModelError};
pub use model::Model;
pub use output::PersonView;

pub use epi_events::{AgentSnapshot, ContactLayer, DailyStats, PopulationSnapshot, TransmissionEvent};
