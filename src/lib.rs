//! Monte-Carlo occupancy model of a shared workspace: hourly arrivals are
//! seated into capacity-bounded zones, stay for a sampled number of hours,
//! and leave. Many independent days are averaged into served/unserved counts.

pub mod analysis;
pub mod config;
pub mod error;
pub mod events;
pub mod ledger;
pub mod placement;
pub mod runner;
pub mod scenario;
pub mod simulation;
pub mod types;
pub mod zones;
