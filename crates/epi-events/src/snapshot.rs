//! Snapshot Types
//!
//! Serialization structs for per-agent population snapshots.
//!
//! Snapshots capture the state of every agent at a point in time and are the
//! hook for custom reporting that the daily statistics table does not cover.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Generates a snapshot ID for the given day.
pub fn generate_snapshot_id(day: u32) -> String {
    format!("snap_day_{:05}", day)
}

/// Agent count per disease state label
pub type StateCounts = BTreeMap<String, usize>;

/// State of a single agent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentSnapshot {
    pub id: usize,
    pub age_group: usize,
    pub household_id: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub occupation_id: Option<usize>,
    /// Disease state label, e.g. `symptomatic_mild`
    pub state: String,
    pub days_infected: u32,
    pub num_infections: u32,
    pub infection_protection: f64,
    pub severe_protection: f64,
    pub doses: u8,
    pub vaccine_protection_infection: f64,
    pub vaccine_protection_severe: f64,
    #[serde(default)]
    pub quarantined: bool,
}

/// Full population at the end of a given day
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PopulationSnapshot {
    pub snapshot_id: String,
    pub day: u32,
    pub population: usize,
    pub households: usize,
    pub occupation_groups: usize,
    pub state_counts: StateCounts,
    pub agents: Vec<AgentSnapshot>,
}

impl PopulationSnapshot {
    pub fn new(day: u32, households: usize, occupation_groups: usize) -> Self {
        Self {
            snapshot_id: generate_snapshot_id(day),
            day,
            population: 0,
            households,
            occupation_groups,
            state_counts: StateCounts::new(),
            agents: Vec::new(),
        }
    }

    /// Adds an agent and keeps the population and state counts in sync.
    pub fn push(&mut self, agent: AgentSnapshot) {
        *self.state_counts.entry(agent.state.clone()).or_insert(0) += 1;
        self.population += 1;
        self.agents.push(agent);
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
