//! # ringsight-core
//!
//! Shared data model, configuration, and batch validation for the ringsight
//! money-muling detection engine.
//!
//! This crate owns everything the downstream stages agree on:
//!
//! - **Models**: validated transactions, tagged pattern detections, fraud
//!   rings, suspicion scores, and risk-level buckets
//! - **Configuration**: explicit records for every detector and the risk
//!   weight table, replacing ad-hoc keyword arguments
//! - **Validation**: strict batch validation (column set, id uniqueness,
//!   amount and timestamp parsing) with an upload summary
//! - **Ingestion seam**: a `RawBatch` shape plus a CSV reader for the
//!   canonical wire format
//!
//! Amounts are `rust_decimal::Decimal`; timestamps are zone-free
//! `chrono::NaiveDateTime` parsed strictly as `YYYY-MM-DD HH:MM:SS`.

pub mod batch;
pub mod config;
pub mod error;
pub mod models;
pub mod validate;

pub use batch::RawBatch;
pub use config::{
    AlertThresholds, ChainConfig, CycleConfig, DetectionConfig, DetectionStrategy, RiskWeights,
    SmurfingConfig,
};
pub use error::{DetectError, DetectResult};
pub use models::{
    AccountId, AccountScore, FraudRing, PatternDetection, PatternKind, RiskLevel, TimeWindow,
    Transaction, EXPECTED_COLUMNS, TIMESTAMP_FORMAT,
};
pub use validate::{validate_batch, DateRange, UploadSummary};
