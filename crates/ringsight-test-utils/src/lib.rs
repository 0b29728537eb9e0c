//! Deterministic transaction fixtures for detection tests.
//!
//! [`BatchBuilder`] assembles the laundering typologies the detectors must
//! find — cycles, fan-in/fan-out bursts, shell chains — plus seeded
//! background noise, with sequential transaction ids so identical builds
//! are byte-identical.

mod fixtures;

pub use fixtures::{base_time, raw_batch_from, BatchBuilder};
