//! Daily Statistics Rows
//!
//! One row per simulated day, appended in day order.

use serde::{Deserialize, Serialize};

/// Epidemic counts for a single day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DailyStats {
    pub day: u32,
    pub susceptible: usize,
    /// Every infected stage, including hospitalized and critical
    pub infected: usize,
    /// All recovered sub-states
    pub recovered: usize,
    pub dead: usize,
    pub hospitalized: usize,
    pub critical: usize,
    /// Increase in `infected` since the previous row, floored at 0
    pub new_infections: usize,
    /// Increase in `dead` since the previous row
    pub new_deaths: usize,
    /// Transmission events logged on this day
    pub transmissions: usize,
}

impl DailyStats {
    /// Number of agents accounted for by the four top-level compartments.
    pub fn total(&self) -> usize {
        self.susceptible + self.infected + self.recovered + self.dead
    }
}
