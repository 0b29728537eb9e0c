//! # ringsight-alerts
//!
//! Stateful alert differ between successive detection runs.
//!
//! The engine keeps the previous run's ring-id set, risk-score map, and
//! velocity map as its only persistent state. Each [`AlertEngine::analyze`]
//! call diffs the current run against that state, emits typed alerts with
//! severities, stores them most-recent-first in a bounded history, and then
//! replaces the stored state. Running the same state twice produces no
//! alerts.

mod alert;
mod engine;

pub use alert::{Alert, AlertSeverity, AlertType};
pub use engine::{AlertEngine, AlertStatistics};
