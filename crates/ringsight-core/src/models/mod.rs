//! Core data model shared by every pipeline stage.

mod patterns;
mod risk;
mod transaction;

pub use patterns::{AccountScore, FraudRing, PatternDetection, PatternKind, TimeWindow};
pub use risk::RiskLevel;
pub use transaction::{AccountId, Transaction, EXPECTED_COLUMNS, TIMESTAMP_FORMAT};
