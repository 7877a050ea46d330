//! Snapshot Generation
//!
//! Borrowed per-agent views and full-population snapshots read straight
//! from the world.

use bevy_ecs::prelude::*;
use epi_events::{AgentSnapshot, PopulationSnapshot};
use std::fs;
use std::path::Path;

use crate::components::{
    Demographics, Health, Immunity, Infectiousness, PersonId, PersonRegistry, Quarantine, Vaccination,
};
use crate::error::Result;

/// Read-only view of one agent's components
#[derive(Debug, Clone, Copy)]
pub struct PersonView<'w> {
    pub id: PersonId,
    pub demographics: &'w Demographics,
    pub health: &'w Health,
    pub immunity: &'w Immunity,
    pub vaccination: &'w Vaccination,
    pub infectiousness: &'w Infectiousness,
    pub quarantine: &'w Quarantine,
}

impl<'w> PersonView<'w> {
    /// Borrows the components of `id`, if it names a spawned agent.
    pub fn get(world: &'w World, registry: &PersonRegistry, id: PersonId) -> Option<Self> {
        let entity = registry.entity(id)?;
        Some(Self {
            id,
            demographics: world.get::<Demographics>(entity)?,
            health: world.get::<Health>(entity)?,
            immunity: world.get::<Immunity>(entity)?,
            vaccination: world.get::<Vaccination>(entity)?,
            infectiousness: world.get::<Infectiousness>(entity)?,
            quarantine: world.get::<Quarantine>(entity)?,
        })
    }

    pub fn to_snapshot(&self) -> AgentSnapshot {
        AgentSnapshot {
            id: self.id.index(),
            age_group: self.demographics.age_group,
            household_id: self.demographics.household_id,
            occupation_id: self.demographics.occupation_id,
            state: self.health.state.as_str().to_string(),
            days_infected: self.health.days_infected,
            num_infections: self.health.num_infections,
            infection_protection: self.immunity.infection_protection_level,
            severe_protection: self.immunity.severe_protection_level,
            doses: self.vaccination.doses,
            vaccine_protection_infection: self.vaccination.protection_infection,
            vaccine_protection_severe: self.vaccination.protection_severe,
            quarantined: self.quarantine.active,
        }
    }
}

/// Snapshot of every agent at the end of `day`, in id order
pub fn build_snapshot(world: &World, registry: &PersonRegistry, day: u32) -> PopulationSnapshot {
    let mut snapshot = PopulationSnapshot::new(day, registry.households().len(), registry.occupations().len());
    for index in 0..registry.len() {
        if let Some(view) = PersonView::get(world, registry, PersonId(index)) {
            snapshot.push(view.to_snapshot());
        }
    }
    snapshot
}

/// Write a snapshot as pretty JSON
pub fn write_snapshot(snapshot: &PopulationSnapshot, path: impl AsRef<Path>) -> Result<()> {
    fs::write(path, snapshot.to_json()?)?;
    Ok(())
}
