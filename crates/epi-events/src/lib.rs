//! Shared output types and serialization for the epidemic simulation.
//!
//! This crate contains pure data structures with no simulation logic.
//! Consumers (reporting, plotting, ensemble wrappers) depend on it without
//! pulling in the engine.

pub mod event;
pub mod snapshot;
pub mod stats;

pub use event::{ContactLayer, TransmissionEvent};
pub use snapshot::{AgentSnapshot, PopulationSnapshot, StateCounts};
pub use stats::DailyStats;
