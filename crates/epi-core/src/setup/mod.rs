//! Population Setup
//!
//! Household and occupation network generation plus entity spawning.

pub mod households;
pub mod occupations;
pub mod spawn;

pub use households::{generate_population, reference_households, select_age_group, Population};
pub use occupations::{draw_group_size, form_occupation_groups};
pub use spawn::spawn_population;
