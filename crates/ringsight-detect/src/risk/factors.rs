//! The five risk factor computations. Each returns a per-account score in
//! [0, 100]; missing data always means zero, never an error.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use statrs::statistics::Statistics;

use ringsight_core::AccountId;
use ringsight_graph::{betweenness_centrality, degree_centrality, pagerank};

use super::RiskEngine;

/// Centrality: `40 * degree + 30 * betweenness + 30 * (1000 * pagerank)`,
/// clamped to 100. PageRank non-convergence degrades that term to zero.
pub(super) fn centrality_scores(engine: &RiskEngine<'_>) -> BTreeMap<AccountId, f64> {
    let graph = engine.graph();
    let degree = degree_centrality(graph);
    let betweenness = betweenness_centrality(graph);
    let ranks = pagerank(graph).unwrap_or_default();

    graph
        .node_ids()
        .map(|id| {
            let degree_score = degree.get(id).copied().unwrap_or(0.0) * 40.0;
            let betweenness_score = betweenness.get(id).copied().unwrap_or(0.0) * 30.0;
            let pagerank_score = ranks.get(id).copied().unwrap_or(0.0) * 1000.0 * 30.0;
            (id.clone(), (degree_score + betweenness_score + pagerank_score).min(100.0))
        })
        .collect()
}

/// Velocity: banded contributions from transactions-per-hour, the ratio of
/// sub-hour gaps, and the minimum gap.
pub(super) fn velocity_scores(engine: &RiskEngine<'_>) -> BTreeMap<AccountId, f64> {
    engine
        .graph()
        .node_ids()
        .map(|id| {
            let Some(activity) = engine.activity(id) else {
                return (id.clone(), 0.0);
            };
            if activity.timestamps.len() < 2 {
                return (id.clone(), 0.0);
            }

            let per_hour = activity.per_hour();
            let gaps = activity.gaps_seconds();
            let rapid_ratio = if gaps.is_empty() {
                0.0
            } else {
                gaps.iter().filter(|g| **g < 3600).count() as f64 / gaps.len() as f64
            };
            let min_gap_hours = gaps
                .iter()
                .min()
                .map(|g| *g as f64 / 3600.0)
                .unwrap_or(999.0);

            let mut score: f64 = 0.0;

            if per_hour > 1.0 {
                score += 40.0;
            } else if per_hour > 0.5 {
                score += 30.0;
            } else if per_hour > 0.2 {
                score += 20.0;
            }

            if rapid_ratio > 0.5 {
                score += 35.0;
            } else if rapid_ratio > 0.3 {
                score += 25.0;
            } else if rapid_ratio > 0.1 {
                score += 15.0;
            }

            if min_gap_hours < 0.5 {
                score += 25.0;
            } else if min_gap_hours < 2.0 {
                score += 15.0;
            } else if min_gap_hours < 6.0 {
                score += 10.0;
            }

            (id.clone(), score.min(100.0))
        })
        .collect()
}

/// Cycle involvement: 50 for any membership, escalating with cycle count
/// and mean cycle length.
pub(super) fn cycle_involvement_scores(engine: &RiskEngine<'_>) -> BTreeMap<AccountId, f64> {
    let mut counts: HashMap<&AccountId, usize> = HashMap::new();
    let mut lengths: HashMap<&AccountId, Vec<usize>> = HashMap::new();

    for cycle in engine.cycles() {
        for account in cycle {
            *counts.entry(account).or_insert(0) += 1;
            lengths.entry(account).or_default().push(cycle.len());
        }
    }

    engine
        .graph()
        .node_ids()
        .map(|id| {
            let count = counts.get(id).copied().unwrap_or(0);
            if count == 0 {
                return (id.clone(), 0.0);
            }

            let multi_cycle: f64 = if count > 2 {
                30.0
            } else if count > 1 {
                20.0
            } else {
                0.0
            };

            let cycle_lengths = &lengths[id];
            let mean_length =
                cycle_lengths.iter().sum::<usize>() as f64 / cycle_lengths.len() as f64;
            let complexity = if mean_length > 4.0 {
                20.0
            } else if mean_length > 3.0 {
                15.0
            } else {
                0.0
            };

            (id.clone(), (50.0 + multi_cycle + complexity).min(100.0))
        })
        .collect()
}

/// Ring density: per containing ring,
/// `50 * density + 30 * in-ring degree ratio + 20 * ring risk / 100`;
/// an account's score is the maximum over its rings.
pub(super) fn ring_density_scores(engine: &RiskEngine<'_>) -> BTreeMap<AccountId, f64> {
    let graph = engine.graph();
    let mut scores: BTreeMap<AccountId, f64> =
        graph.node_ids().map(|id| (id.clone(), 0.0)).collect();

    for ring in engine.rings() {
        let members: BTreeSet<&AccountId> = ring.member_accounts.iter().collect();
        let member_count = members.len();
        if member_count < 2 {
            continue;
        }

        // Induced subgraph edge count and per-member degree.
        let mut edge_count = 0usize;
        let mut in_ring_degree: HashMap<&AccountId, usize> = HashMap::new();
        for member in &members {
            for next in graph.successors(member) {
                if members.contains(next) {
                    edge_count += 1;
                    *in_ring_degree.entry(*member).or_insert(0) += 1;
                    *in_ring_degree.entry(next).or_insert(0) += 1;
                }
            }
        }

        let possible_edges = (member_count * (member_count - 1)).max(1);
        let density = edge_count as f64 / possible_edges as f64;
        let ring_risk = ring.risk_score / 100.0;

        for member in &members {
            let degree_ratio = in_ring_degree.get(*member).copied().unwrap_or(0) as f64
                / (member_count - 1).max(1) as f64;
            let total =
                density * 50.0 + degree_ratio * 30.0 + ring_risk * 20.0;

            if let Some(entry) = scores.get_mut(*member) {
                *entry = entry.max(total.min(100.0));
            }
        }
    }

    scores
}

/// Volume anomaly: z-score deviation from the global mean, small-amount
/// structuring ratio, high intra-account variance, and amounts sitting just
/// below round reporting thresholds.
pub(super) fn volume_anomaly_scores(engine: &RiskEngine<'_>) -> BTreeMap<AccountId, f64> {
    use rust_decimal::prelude::ToPrimitive;

    let all_amounts: Vec<f64> = engine
        .transactions()
        .iter()
        .filter_map(|t| t.amount.to_f64())
        .collect();

    if all_amounts.is_empty() {
        return engine.graph().node_ids().map(|id| (id.clone(), 0.0)).collect();
    }

    let global_mean = all_amounts.as_slice().mean();
    let global_std = all_amounts.as_slice().population_std_dev();
    let global_median = median(&all_amounts);
    let small_threshold = global_median * 0.3;

    engine
        .graph()
        .node_ids()
        .map(|id| {
            let Some(activity) = engine.activity(id) else {
                return (id.clone(), 0.0);
            };
            let amounts = &activity.amounts;
            if amounts.is_empty() {
                return (id.clone(), 0.0);
            }

            let n = amounts.len();
            let account_mean = amounts.as_slice().mean();
            // Sample standard deviation; undefined below two samples.
            let account_std = if n >= 2 {
                Some(amounts.as_slice().std_dev())
            } else {
                None
            };

            let mut score: f64 = 0.0;

            let z = (account_mean - global_mean).abs() / global_std.max(1.0);
            if z > 3.0 {
                score += 35.0;
            } else if z > 2.0 {
                score += 25.0;
            } else if z > 1.0 {
                score += 15.0;
            }

            let small_ratio =
                amounts.iter().filter(|a| **a < small_threshold).count() as f64 / n as f64;
            if small_ratio > 0.7 && n > 10 {
                score += 30.0;
            } else if small_ratio > 0.5 && n > 5 {
                score += 20.0;
            }

            if let Some(std_dev) = account_std {
                if std_dev > account_mean * 0.8 && n > 3 {
                    score += 20.0;
                } else if std_dev > account_mean * 0.5 {
                    score += 10.0;
                }
            }

            let just_below = amounts
                .iter()
                .filter(|a| (9500.0..10000.0).contains(*a) || (4500.0..5000.0).contains(*a))
                .count() as f64;
            if just_below > n as f64 * 0.3 {
                score += 15.0;
            } else if just_below > n as f64 * 0.1 {
                score += 10.0;
            }

            (id.clone(), score.min(100.0))
        })
        .collect()
}

fn median(values: &[f64]) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let n = sorted.len();
    if n == 0 {
        0.0
    } else if n % 2 == 1 {
        sorted[n / 2]
    } else {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveDateTime};
    use ringsight_core::{RiskWeights, Transaction};
    use ringsight_graph::TransactionGraph;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use std::collections::BTreeSet;

    fn at(day: u32, hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, day)
            .unwrap()
            .and_hms_opt(hour, minute, 0)
            .unwrap()
    }

    fn engine<'a>(
        graph: &'a TransactionGraph,
        transactions: &'a [Transaction],
        cycles: &'a [Vec<AccountId>],
        base: &'a std::collections::BTreeMap<AccountId, ringsight_core::AccountScore>,
        whitelist: &'a BTreeSet<AccountId>,
    ) -> RiskEngine<'a> {
        RiskEngine::new(graph, transactions, &[], base, cycles, whitelist, RiskWeights::default())
    }

    #[test]
    fn test_velocity_bands_rapid_burst() {
        // Ten transactions ten minutes apart: every gap under an hour.
        let transactions: Vec<Transaction> = (0..10)
            .map(|i| {
                Transaction::new(
                    format!("T{i}"),
                    "FAST",
                    format!("R{i}"),
                    dec!(100),
                    at(1, 10, i * 6),
                )
            })
            .collect();
        let graph = TransactionGraph::build(&transactions);
        let base = Default::default();
        let whitelist = BTreeSet::new();
        let engine = engine(&graph, &transactions, &[], &base, &whitelist);

        let scores = velocity_scores(&engine);
        // tph > 1 (+40), rapid ratio 1.0 (+35), min gap < 0.5h (+25).
        assert_eq!(scores["FAST"], 100.0);
        // Counterparties have a single transaction.
        assert_eq!(scores["R0"], 0.0);
    }

    #[test]
    fn test_cycle_involvement_bands() {
        let transactions = vec![
            Transaction::new("T1", "A", "B", dec!(1), at(1, 1, 0)),
            Transaction::new("T2", "B", "A", dec!(1), at(1, 2, 0)),
        ];
        let graph = TransactionGraph::build(&transactions);
        let cycles = vec![
            vec!["A".to_string(), "B".to_string(), "C".to_string()],
            vec!["A".to_string(), "D".to_string(), "E".to_string(), "F".to_string(), "G".to_string()],
        ];
        let base = Default::default();
        let whitelist = BTreeSet::new();
        let engine = engine(&graph, &transactions, &cycles, &base, &whitelist);

        let scores = cycle_involvement_scores(&engine);
        // A: two cycles (+20), mean length 4 (> 3 -> +15), base 50 = 85.
        assert_eq!(scores["A"], 85.0);
        // B: one cycle of length 3: base only.
        assert_eq!(scores["B"], 50.0);
    }

    #[test]
    fn test_volume_anomaly_structuring_amounts() {
        // One account trading just below the 10k reporting threshold while
        // the rest of the network moves small round sums.
        let mut transactions: Vec<Transaction> = (0..20)
            .map(|i| {
                Transaction::new(
                    format!("N{i}"),
                    format!("A{i}"),
                    format!("B{i}"),
                    dec!(100),
                    at(1, (i % 24) as u32, 0),
                )
            })
            .collect();
        for i in 0..4 {
            transactions.push(Transaction::new(
                format!("S{i}"),
                "STRUCT",
                format!("C{i}"),
                Decimal::from(9600 + i as i64 * 50),
                at(2, i as u32, 0),
            ));
        }
        let graph = TransactionGraph::build(&transactions);
        let base = Default::default();
        let whitelist = BTreeSet::new();
        let engine = engine(&graph, &transactions, &[], &base, &whitelist);

        let scores = volume_anomaly_scores(&engine);
        // STRUCT: z-score above 2 (+25) and every amount just below 10k (+15).
        assert!(scores["STRUCT"] >= 40.0);
        assert!(scores["A0"] < scores["STRUCT"]);
    }

    #[test]
    fn test_ring_density_full_triangle() {
        let transactions = vec![
            Transaction::new("T1", "A", "B", dec!(1), at(1, 1, 0)),
            Transaction::new("T2", "B", "C", dec!(1), at(1, 2, 0)),
            Transaction::new("T3", "C", "A", dec!(1), at(1, 3, 0)),
        ];
        let graph = TransactionGraph::build(&transactions);
        let rings = vec![ringsight_core::FraudRing {
            ring_id: "RING_001".to_string(),
            pattern_type: ringsight_core::PatternKind::Cycle,
            member_accounts: vec!["A".to_string(), "B".to_string(), "C".to_string()],
            member_count: 3,
            risk_score: 40.0,
            description: String::new(),
        }];
        let base = Default::default();
        let whitelist = BTreeSet::new();
        let engine = RiskEngine::new(
            &graph,
            &transactions,
            &rings,
            &base,
            &[],
            &whitelist,
            RiskWeights::default(),
        );

        let scores = ring_density_scores(&engine);
        // Triangle: 3 edges of 6 possible -> density 0.5 (+25); each member
        // has in-ring degree 2 of max 2 (+30); ring risk 0.4 (+8).
        for account in ["A", "B", "C"] {
            assert!((scores[account] - 63.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_median_even_and_odd() {
        assert_eq!(median(&[1.0, 3.0, 2.0]), 2.0);
        assert_eq!(median(&[1.0, 2.0, 3.0, 4.0]), 2.5);
    }
}
