//! Statistics Output
//!
//! Collects one `DailyStats` row per simulated day.

use bevy_ecs::prelude::*;
use epi_events::DailyStats;
use std::fs;
use std::path::Path;

use crate::components::{DiseaseState, Health, SimClock};
use crate::error::Result;
use crate::systems::TransmissionLog;

/// Counts of agents per top-level compartment and hospital sub-state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StateTally {
    pub susceptible: usize,
    pub infected: usize,
    pub recovered: usize,
    pub dead: usize,
    pub hospitalized: usize,
    pub critical: usize,
}

impl StateTally {
    pub fn add(&mut self, state: DiseaseState) {
        match state {
            DiseaseState::Susceptible => self.susceptible += 1,
            DiseaseState::Dead => self.dead += 1,
            s if s.is_recovered() => self.recovered += 1,
            s => {
                self.infected += 1;
                match s {
                    DiseaseState::Hospitalized => self.hospitalized += 1,
                    DiseaseState::Critical => self.critical += 1,
                    _ => {}
                }
            }
        }
    }
}

/// Tallies a set of disease states.
pub fn tally_states(states: impl IntoIterator<Item = DiseaseState>) -> StateTally {
    let mut tally = StateTally::default();
    for state in states {
        tally.add(state);
    }
    tally
}

/// Resource holding the append-only daily statistics table
#[derive(Resource, Debug, Default)]
pub struct StatsCollector {
    rows: Vec<DailyStats>,
}

impl StatsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rows(&self) -> &[DailyStats] {
        &self.rows
    }

    pub fn last(&self) -> Option<&DailyStats> {
        self.rows.last()
    }

    /// Appends the row for `day`, deriving the deltas from the previous row.
    pub fn record(&mut self, day: u32, tally: StateTally, transmissions: usize) -> DailyStats {
        let (new_infections, new_deaths) = match self.rows.last() {
            Some(prev) => (
                tally.infected.saturating_sub(prev.infected),
                tally.dead.saturating_sub(prev.dead),
            ),
            None => (tally.infected, 0),
        };
        let row = DailyStats {
            day,
            susceptible: tally.susceptible,
            infected: tally.infected,
            recovered: tally.recovered,
            dead: tally.dead,
            hospitalized: tally.hospitalized,
            critical: tally.critical,
            new_infections,
            new_deaths,
            transmissions,
        };
        self.rows.push(row);
        row
    }
}

/// System: append today's statistics row
pub fn record_daily_stats(
    clock: Res<SimClock>,
    log: Res<TransmissionLog>,
    people: Query<&Health>,
    mut stats: ResMut<StatsCollector>,
) {
    let tally = tally_states(people.iter().map(|health| health.state));
    stats.record(clock.day, tally, log.count_on(clock.day));
}

/// Write the statistics table as pretty JSON
pub fn write_stats(rows: &[DailyStats], path: impl AsRef<Path>) -> Result<()> {
    let json = serde_json::to_string_pretty(rows)?;
    fs::write(path, json)?;
    Ok(())
}
