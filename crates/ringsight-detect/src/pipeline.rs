//! Pipeline orchestration: validated batch in, canonical response out.
//!
//! [`run_detection`] is a pure function over its inputs; repeated calls on
//! the same batch produce identical results apart from wall-clock timing.
//! [`PipelineState`] wraps it for callers that ingest incrementally and owns
//! the transactions, graph, and last run; there is no global state.

use std::collections::{BTreeMap, BTreeSet};
use std::time::Instant;

use tracing::info;

use ringsight_core::{
    validate_batch, AccountId, AccountScore, DetectError, DetectResult, DetectionConfig,
    DetectionStrategy, FraudRing, PatternDetection, RawBatch, Transaction, UploadSummary,
};
use ringsight_graph::{AppendStats, GraphExport, TransactionGraph};

use crate::chains::detect_chains;
use crate::cycles::detect_cycles;
use crate::response::CanonicalResponse;
use crate::rings::construct_rings;
use crate::risk::{RiskAssessment, RiskEngine};
use crate::scoring::score_accounts;
use crate::smurfing::detect_smurfing;
use crate::whitelist::identify_legitimate;

/// Everything one detection run produced.
#[derive(Debug, Clone)]
pub struct DetectionRun {
    /// Snapshot graph the run analyzed.
    pub graph: TransactionGraph,
    /// All detections in input order: cycles, fan-in, fan-out, chains.
    pub patterns: Vec<PatternDetection>,
    /// Raw cycle paths (cached for the risk engine).
    pub cycles: Vec<Vec<AccountId>>,
    /// Whether cycle enumeration hit its time or count cap.
    pub cycles_truncated: bool,
    pub whitelist: BTreeSet<AccountId>,
    /// Base suspicion scores.
    pub scores: BTreeMap<AccountId, AccountScore>,
    pub rings: Vec<FraudRing>,
    /// Comprehensive risk assessments.
    pub risk: BTreeMap<AccountId, RiskAssessment>,
    /// Transactions-per-hour per account (alert differ input).
    pub velocities: BTreeMap<AccountId, f64>,
    pub response: CanonicalResponse,
    pub processing_seconds: f64,
}

/// Run the full detection pipeline over a validated batch.
pub fn run_detection(
    transactions: &[Transaction],
    config: &DetectionConfig,
    strategy: DetectionStrategy,
) -> DetectResult<DetectionRun> {
    if transactions.is_empty() {
        return Err(DetectError::NoTransactions);
    }

    let started = Instant::now();
    info!(
        transactions = transactions.len(),
        strategy = strategy.as_str(),
        "detection pipeline started"
    );

    let graph = TransactionGraph::build(transactions);

    let (cycles, cycles_truncated) = if strategy.runs_cycles() {
        let search = detect_cycles(&graph, &config.cycles);
        (search.cycles, search.truncated)
    } else {
        (Vec::new(), false)
    };

    let (fan_in, fan_out) = if strategy.runs_fan_patterns() {
        detect_smurfing(transactions, &config.smurfing, graph.node_count())
    } else {
        (Vec::new(), Vec::new())
    };

    let chains = if strategy.runs_chains() {
        // A path whose accounts all sit inside one detected cycle is that
        // cycle seen again, not a layering chain.
        drop_cycle_fragments(detect_chains(&graph, &config.chains), &cycles)
    } else {
        Vec::new()
    };

    // Detection input order drives ring ids and response assembly.
    let mut patterns: Vec<PatternDetection> = cycles
        .iter()
        .cloned()
        .map(|path| PatternDetection::Cycle { path })
        .collect();
    patterns.extend(fan_in);
    patterns.extend(fan_out);
    patterns.extend(chains);

    let whitelist = identify_legitimate(&graph, transactions);
    let scores = score_accounts(&patterns, transactions, &graph, &whitelist);
    let rings = construct_rings(&patterns, &scores);

    let engine = RiskEngine::new(
        &graph,
        transactions,
        &rings,
        &scores,
        &cycles,
        &whitelist,
        config.weights.clone(),
    );
    let risk = engine.comprehensive_scores();
    let velocities = engine.transactions_per_hour();

    let processing_seconds = started.elapsed().as_secs_f64();
    let response =
        CanonicalResponse::build(&scores, &rings, graph.node_count(), processing_seconds);

    info!(
        rings = rings.len(),
        flagged = response.summary.suspicious_accounts_flagged,
        elapsed_secs = processing_seconds,
        "detection pipeline complete"
    );

    Ok(DetectionRun {
        graph,
        patterns,
        cycles,
        cycles_truncated,
        whitelist,
        scores,
        rings,
        risk,
        velocities,
        response,
        processing_seconds,
    })
}

fn drop_cycle_fragments(
    chains: Vec<PatternDetection>,
    cycles: &[Vec<AccountId>],
) -> Vec<PatternDetection> {
    if cycles.is_empty() {
        return chains;
    }
    let cycle_sets: Vec<BTreeSet<&AccountId>> =
        cycles.iter().map(|c| c.iter().collect()).collect();

    chains
        .into_iter()
        .filter(|chain| match chain {
            PatternDetection::Chain { path } => {
                let members: BTreeSet<&AccountId> = path.iter().collect();
                !cycle_sets.iter().any(|cycle| members.is_subset(cycle))
            }
            _ => true,
        })
        .collect()
}

/// Caller-owned pipeline state: validated transactions, the running graph,
/// and the last detection run.
#[derive(Debug, Default)]
pub struct PipelineState {
    config: DetectionConfig,
    strategy: DetectionStrategy,
    transactions: Vec<Transaction>,
    graph: TransactionGraph,
    last_run: Option<DetectionRun>,
}

impl PipelineState {
    pub fn new(config: DetectionConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    /// Validate a batch and replace any previously ingested data.
    pub fn ingest(&mut self, batch: &RawBatch) -> DetectResult<UploadSummary> {
        let (transactions, summary) = validate_batch(batch)?;
        self.graph = TransactionGraph::build(&transactions);
        self.transactions = transactions;
        self.last_run = None;
        Ok(summary)
    }

    /// Validate a batch and append it to the existing data.
    pub fn append(&mut self, batch: &RawBatch) -> DetectResult<AppendStats> {
        let (transactions, _) = validate_batch(batch)?;
        let stats = self.graph.append(&transactions);
        self.transactions.extend(transactions);
        self.last_run = None;
        Ok(stats)
    }

    /// Select which detectors run; unknown names fail with a client error.
    pub fn set_strategy(&mut self, strategy: &str) -> DetectResult<DetectionStrategy> {
        self.strategy = strategy.parse()?;
        Ok(self.strategy)
    }

    pub fn strategy(&self) -> DetectionStrategy {
        self.strategy
    }

    pub fn transaction_count(&self) -> usize {
        self.transactions.len()
    }

    /// Run detection over everything ingested so far.
    pub fn detect(&mut self) -> DetectResult<&DetectionRun> {
        let run = run_detection(&self.transactions, &self.config, self.strategy)?;
        Ok(self.last_run.insert(run))
    }

    /// The most recent run, if any.
    pub fn last_run(&self) -> Option<&DetectionRun> {
        self.last_run.as_ref()
    }

    /// Graph visualization payload for the current data.
    pub fn graph_export(&self) -> GraphExport {
        GraphExport::from_graph(&self.graph)
    }
}
