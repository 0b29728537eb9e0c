//! # ringsight-detect
//!
//! Money-muling pattern detection over an aggregated transaction graph.
//!
//! The pipeline runs three detector families — circular routing, smurfing
//! (fan-in / fan-out), and layered shell chains — then scores each account
//! with a base suspicion model and a five-factor risk model, groups pattern
//! participants into fraud rings, and assembles a canonical, byte-stable
//! response.
//!
//! Entry point: [`run_detection`] (a pure function over a validated batch)
//! or [`PipelineState`] for callers that ingest incrementally.

pub mod chains;
pub mod cycles;
pub mod pipeline;
pub mod response;
pub mod rings;
pub mod risk;
pub mod scoring;
pub mod smurfing;
pub mod whitelist;

pub use chains::detect_chains;
pub use cycles::{detect_cycles, CycleSearch};
pub use pipeline::{run_detection, DetectionRun, PipelineState};
pub use response::{CanonicalResponse, ResponseAccount, ResponseRing, ResponseSummary};
pub use rings::{construct_rings, rank_by_risk};
pub use risk::{RiskAssessment, RiskEngine, RiskFactors};
pub use scoring::score_accounts;
pub use smurfing::detect_smurfing;
pub use whitelist::identify_legitimate;
