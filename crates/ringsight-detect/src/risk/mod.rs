//! Comprehensive risk scoring.
//!
//! Five factor scores in [0, 100] — centrality, velocity, cycle
//! involvement, ring density, volume anomaly — blend into a weighted
//! 0-100 score with a natural-language explanation per account.
//! Factor failures (degenerate betweenness, PageRank non-convergence)
//! degrade to zero contributions; the engine never aborts.

mod explain;
mod factors;

use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use tracing::info;

use ringsight_core::{
    AccountId, AccountScore, FraudRing, PatternKind, RiskLevel, RiskWeights, Transaction,
};
use ringsight_graph::TransactionGraph;

/// The five factor scores for one account, each in [0, 100].
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RiskFactors {
    pub centrality: f64,
    pub velocity: f64,
    pub cycle_involvement: f64,
    pub ring_density: f64,
    pub volume_anomaly: f64,
}

impl RiskFactors {
    fn weighted(&self, weights: &RiskWeights) -> f64 {
        self.centrality * weights.centrality
            + self.velocity * weights.velocity
            + self.cycle_involvement * weights.cycle_involvement
            + self.ring_density * weights.ring_density
            + self.volume_anomaly * weights.volume_anomaly
    }

    fn rounded(self) -> Self {
        Self {
            centrality: round2(self.centrality),
            velocity: round2(self.velocity),
            cycle_involvement: round2(self.cycle_involvement),
            ring_density: round2(self.ring_density),
            volume_anomaly: round2(self.volume_anomaly),
        }
    }
}

/// Comprehensive risk result for one account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub account_id: AccountId,
    /// Weighted score in [0, 100], rounded to 2 decimals.
    pub risk_score: f64,
    pub risk_level: RiskLevel,
    pub risk_factors: RiskFactors,
    pub explanation: String,
    /// Pattern families from the base detection pass.
    pub patterns: Vec<PatternKind>,
}

/// Per-account transaction view shared by the factor computations.
pub(crate) struct AccountActivity {
    /// Sorted timestamps, self-transfers counted once.
    pub timestamps: Vec<NaiveDateTime>,
    /// Amounts of sent then received transactions (self-transfers appear on
    /// both sides, matching the per-side aggregation).
    pub amounts: Vec<f64>,
}

impl AccountActivity {
    pub fn span_hours(&self) -> f64 {
        match (self.timestamps.first(), self.timestamps.last()) {
            (Some(first), Some(last)) => {
                ((*last - *first).num_seconds().max(1)) as f64 / 3600.0
            }
            _ => 0.0,
        }
    }

    /// Transactions per hour over the observed span (floor of one hour).
    pub fn per_hour(&self) -> f64 {
        if self.timestamps.is_empty() {
            return 0.0;
        }
        self.timestamps.len() as f64 / self.span_hours().max(1.0)
    }

    pub fn gaps_seconds(&self) -> Vec<i64> {
        self.timestamps
            .windows(2)
            .map(|pair| (pair[1] - pair[0]).num_seconds())
            .collect()
    }
}

/// Risk intelligence engine over one detection run's outputs.
pub struct RiskEngine<'a> {
    graph: &'a TransactionGraph,
    transactions: &'a [Transaction],
    rings: &'a [FraudRing],
    base_scores: &'a BTreeMap<AccountId, AccountScore>,
    cycles: &'a [Vec<AccountId>],
    whitelist: &'a BTreeSet<AccountId>,
    weights: RiskWeights,
    activity: HashMap<AccountId, AccountActivity>,
}

impl<'a> RiskEngine<'a> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        graph: &'a TransactionGraph,
        transactions: &'a [Transaction],
        rings: &'a [FraudRing],
        base_scores: &'a BTreeMap<AccountId, AccountScore>,
        cycles: &'a [Vec<AccountId>],
        whitelist: &'a BTreeSet<AccountId>,
        weights: RiskWeights,
    ) -> Self {
        let activity = collect_activity(transactions);
        Self {
            graph,
            transactions,
            rings,
            base_scores,
            cycles,
            whitelist,
            weights,
            activity,
        }
    }

    pub(crate) fn activity(&self, account: &str) -> Option<&AccountActivity> {
        self.activity.get(account)
    }

    pub(crate) fn graph(&self) -> &TransactionGraph {
        self.graph
    }

    pub(crate) fn transactions(&self) -> &[Transaction] {
        self.transactions
    }

    pub(crate) fn rings(&self) -> &[FraudRing] {
        self.rings
    }

    pub(crate) fn cycles(&self) -> &[Vec<AccountId>] {
        self.cycles
    }

    /// Transactions-per-hour per account; feeds the alert differ.
    pub fn transactions_per_hour(&self) -> BTreeMap<AccountId, f64> {
        self.graph
            .node_ids()
            .map(|id| {
                let rate = self.activity(id).map_or(0.0, AccountActivity::per_hour);
                (id.clone(), rate)
            })
            .collect()
    }

    /// Compute comprehensive scores for every account in the graph.
    pub fn comprehensive_scores(&self) -> BTreeMap<AccountId, RiskAssessment> {
        let centrality = factors::centrality_scores(self);
        let velocity = factors::velocity_scores(self);
        let cycle_involvement = factors::cycle_involvement_scores(self);
        let ring_density = factors::ring_density_scores(self);
        let volume_anomaly = factors::volume_anomaly_scores(self);

        let mut results = BTreeMap::new();
        for account in self.graph.node_ids() {
            let factors = RiskFactors {
                centrality: copied(&centrality, account),
                velocity: copied(&velocity, account),
                cycle_involvement: copied(&cycle_involvement, account),
                ring_density: copied(&ring_density, account),
                volume_anomaly: copied(&volume_anomaly, account),
            };

            let patterns: Vec<PatternKind> = self
                .base_scores
                .get(account)
                .map(|s| s.patterns.clone())
                .unwrap_or_default();

            let (score, level, explanation) = if self.whitelist.contains(account) {
                (
                    0.0,
                    RiskLevel::Low,
                    format!(
                        "Account {account} has been identified as a legitimate \
                         high-volume account (e.g. merchant or payroll). No fraud risk."
                    ),
                )
            } else {
                let score = factors.weighted(&self.weights);
                let level = RiskLevel::from_comprehensive(score);
                let explanation = explain::compose(self, account, &factors, score, &patterns);
                (score, level, explanation)
            };

            results.insert(
                account.clone(),
                RiskAssessment {
                    account_id: account.clone(),
                    risk_score: round2(score),
                    risk_level: level,
                    risk_factors: factors.rounded(),
                    explanation,
                    patterns,
                },
            );
        }

        let critical = count_level(&results, RiskLevel::Critical);
        let high = count_level(&results, RiskLevel::High);
        info!(critical, high, accounts = results.len(), "risk scoring complete");
        results
    }

    /// Top accounts by comprehensive score, descending (id ascending on ties).
    pub fn top_accounts(
        &self,
        assessments: &BTreeMap<AccountId, RiskAssessment>,
        limit: usize,
    ) -> Vec<RiskAssessment> {
        let mut ranked: Vec<RiskAssessment> = assessments.values().cloned().collect();
        ranked.sort_by(|a, b| {
            b.risk_score
                .partial_cmp(&a.risk_score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.account_id.cmp(&b.account_id))
        });
        ranked.truncate(limit);
        ranked
    }

    /// Top rings by average member comprehensive score, with intra-ring
    /// transaction volume.
    pub fn top_rings(
        &self,
        assessments: &BTreeMap<AccountId, RiskAssessment>,
        limit: usize,
    ) -> Vec<RankedRing> {
        let mut ranked: Vec<RankedRing> = self
            .rings
            .iter()
            .map(|ring| {
                let member_scores: Vec<f64> = ring
                    .member_accounts
                    .iter()
                    .map(|m| assessments.get(m).map_or(0.0, |a| a.risk_score))
                    .collect();
                let avg = if member_scores.is_empty() {
                    0.0
                } else {
                    member_scores.iter().sum::<f64>() / member_scores.len() as f64
                };
                let max = member_scores.iter().cloned().fold(0.0, f64::max);

                let members: BTreeSet<&AccountId> = ring.member_accounts.iter().collect();
                let intra: Vec<&Transaction> = self
                    .transactions
                    .iter()
                    .filter(|t| members.contains(&t.sender) && members.contains(&t.receiver))
                    .collect();
                let total_volume: f64 = intra
                    .iter()
                    .filter_map(|t| rust_decimal::prelude::ToPrimitive::to_f64(&t.amount))
                    .sum();

                RankedRing {
                    ring: ring.clone(),
                    avg_risk_score: round2(avg),
                    max_risk_score: round2(max),
                    total_volume: round2(total_volume),
                    transaction_count: intra.len(),
                }
            })
            .collect();

        ranked.sort_by(|a, b| {
            b.avg_risk_score
                .partial_cmp(&a.avg_risk_score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.ring.ring_id.cmp(&b.ring.ring_id))
        });
        ranked.truncate(limit);
        ranked
    }
}

/// A ring with aggregate member risk metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedRing {
    #[serde(flatten)]
    pub ring: FraudRing,
    pub avg_risk_score: f64,
    pub max_risk_score: f64,
    pub total_volume: f64,
    pub transaction_count: usize,
}

fn collect_activity(transactions: &[Transaction]) -> HashMap<AccountId, AccountActivity> {
    use rust_decimal::prelude::ToPrimitive;

    let mut timestamps: HashMap<AccountId, Vec<NaiveDateTime>> = HashMap::new();
    let mut sent: HashMap<AccountId, Vec<f64>> = HashMap::new();
    let mut received: HashMap<AccountId, Vec<f64>> = HashMap::new();

    for txn in transactions {
        let amount = txn.amount.to_f64().unwrap_or(0.0);
        timestamps.entry(txn.sender.clone()).or_default().push(txn.timestamp);
        if txn.receiver != txn.sender {
            timestamps.entry(txn.receiver.clone()).or_default().push(txn.timestamp);
        }
        sent.entry(txn.sender.clone()).or_default().push(amount);
        received.entry(txn.receiver.clone()).or_default().push(amount);
    }

    let accounts: BTreeSet<AccountId> = timestamps.keys().cloned().collect();
    accounts
        .into_iter()
        .map(|account| {
            let mut ts = timestamps.remove(&account).unwrap_or_default();
            ts.sort_unstable();
            let mut amounts = sent.remove(&account).unwrap_or_default();
            amounts.extend(received.remove(&account).unwrap_or_default());
            (account, AccountActivity { timestamps: ts, amounts })
        })
        .collect()
}

fn copied(map: &BTreeMap<AccountId, f64>, account: &str) -> f64 {
    map.get(account).copied().unwrap_or(0.0)
}

fn count_level(results: &BTreeMap<AccountId, RiskAssessment>, level: RiskLevel) -> usize {
    results.values().filter(|r| r.risk_level == level).count()
}

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use ringsight_core::Transaction;
    use rust_decimal_macros::dec;

    fn at(hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(hour, minute, 0)
            .unwrap()
    }

    fn engine_fixture() -> (TransactionGraph, Vec<Transaction>) {
        let transactions = vec![
            Transaction::new("T1", "A", "B", dec!(1000), at(10, 0)),
            Transaction::new("T2", "B", "C", dec!(1000), at(11, 0)),
            Transaction::new("T3", "C", "A", dec!(1000), at(12, 0)),
        ];
        let graph = TransactionGraph::build(&transactions);
        (graph, transactions)
    }

    #[test]
    fn test_scores_within_bounds() {
        let (graph, transactions) = engine_fixture();
        let cycles = vec![vec!["A".to_string(), "B".to_string(), "C".to_string()]];
        let base = BTreeMap::new();
        let whitelist = BTreeSet::new();
        let engine = RiskEngine::new(
            &graph,
            &transactions,
            &[],
            &base,
            &cycles,
            &whitelist,
            RiskWeights::default(),
        );

        let scores = engine.comprehensive_scores();
        assert_eq!(scores.len(), 3);
        for assessment in scores.values() {
            assert!(assessment.risk_score >= 0.0 && assessment.risk_score <= 100.0);
            assert!(assessment.risk_factors.cycle_involvement >= 50.0);
            assert!(!assessment.explanation.is_empty());
        }
    }

    #[test]
    fn test_whitelisted_account_reset() {
        let (graph, transactions) = engine_fixture();
        let cycles = vec![vec!["A".to_string(), "B".to_string(), "C".to_string()]];
        let base = BTreeMap::new();
        let whitelist: BTreeSet<AccountId> = ["A".to_string()].into();
        let engine = RiskEngine::new(
            &graph,
            &transactions,
            &[],
            &base,
            &cycles,
            &whitelist,
            RiskWeights::default(),
        );

        let scores = engine.comprehensive_scores();
        let a = &scores["A"];
        assert_eq!(a.risk_score, 0.0);
        assert_eq!(a.risk_level, RiskLevel::Low);
        assert!(a.explanation.contains("legitimate"));
        assert!(scores["B"].risk_score > 0.0);
    }

    #[test]
    fn test_transactions_per_hour() {
        let (graph, transactions) = engine_fixture();
        let base = BTreeMap::new();
        let whitelist = BTreeSet::new();
        let engine = RiskEngine::new(
            &graph,
            &transactions,
            &[],
            &base,
            &[],
            &whitelist,
            RiskWeights::default(),
        );

        let rates = engine.transactions_per_hour();
        // A participates in two transactions two hours apart.
        assert!((rates["A"] - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_top_accounts_ranked() {
        let (graph, transactions) = engine_fixture();
        let cycles = vec![vec!["A".to_string(), "B".to_string(), "C".to_string()]];
        let base = BTreeMap::new();
        let whitelist: BTreeSet<AccountId> = ["B".to_string()].into();
        let engine = RiskEngine::new(
            &graph,
            &transactions,
            &[],
            &base,
            &cycles,
            &whitelist,
            RiskWeights::default(),
        );

        let scores = engine.comprehensive_scores();
        let top = engine.top_accounts(&scores, 2);

        assert_eq!(top.len(), 2);
        assert!(top[0].risk_score >= top[1].risk_score);
        // Whitelisted B is reset to zero and cannot outrank the others.
        assert_ne!(top[0].account_id, "B");
    }

    #[test]
    fn test_deterministic_output() {
        let (graph, transactions) = engine_fixture();
        let cycles = vec![vec!["A".to_string(), "B".to_string(), "C".to_string()]];
        let base = BTreeMap::new();
        let whitelist = BTreeSet::new();
        let engine = RiskEngine::new(
            &graph,
            &transactions,
            &[],
            &base,
            &cycles,
            &whitelist,
            RiskWeights::default(),
        );

        assert_eq!(engine.comprehensive_scores(), engine.comprehensive_scores());
    }
}
