//! Output Generation
//!
//! Daily statistics, population snapshots, and the JSONL transmission log.

pub mod logger;
pub mod snapshot;
pub mod stats;

pub use logger::EventLogger;
pub use snapshot::{build_snapshot, write_snapshot, PersonView};
pub use stats::{record_daily_stats, tally_states, write_stats, StateTally, StatsCollector};
