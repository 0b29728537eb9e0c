//! Legitimate-account heuristics: merchants and payroll processors.
//!
//! High-volume accounts whose structure matches ordinary commerce must not
//! be flagged. A merchant collects from many distinct payers with almost no
//! outgoing edges; a payroll account disperses consistent amounts to many
//! distinct payees with almost no incoming edges.

use std::collections::{BTreeSet, HashMap};

use rust_decimal::prelude::ToPrimitive;
use statrs::statistics::Statistics;
use tracing::{debug, info};

use ringsight_core::{AccountId, Transaction};
use ringsight_graph::TransactionGraph;

/// Maximum coefficient of variation for payroll-like outgoing amounts.
const PAYROLL_CV_LIMIT: f64 = 0.5;

/// Identify merchant/payroll accounts to whitelist.
pub fn identify_legitimate(
    graph: &TransactionGraph,
    transactions: &[Transaction],
) -> BTreeSet<AccountId> {
    let volume_threshold = (graph.node_count() / 10).clamp(5, 8);

    let mut incoming: HashMap<&AccountId, Vec<&Transaction>> = HashMap::new();
    let mut outgoing: HashMap<&AccountId, Vec<&Transaction>> = HashMap::new();
    for txn in transactions {
        incoming.entry(&txn.receiver).or_default().push(txn);
        outgoing.entry(&txn.sender).or_default().push(txn);
    }

    let mut whitelisted = BTreeSet::new();

    for (account, metrics) in graph.nodes() {
        // Merchant: many payers, almost no outgoing edges.
        if metrics.in_degree >= volume_threshold && metrics.out_degree <= 2 {
            if let Some(received) = incoming.get(account) {
                if received.len() >= volume_threshold {
                    let distinct_senders: BTreeSet<&AccountId> =
                        received.iter().map(|t| &t.sender).collect();
                    if distinct_senders.len() >= volume_threshold {
                        debug!(
                            account = account.as_str(),
                            in_degree = metrics.in_degree,
                            senders = distinct_senders.len(),
                            "whitelisted merchant"
                        );
                        whitelisted.insert(account.clone());
                        continue;
                    }
                }
            }
        }

        // Payroll: many payees, almost no incoming edges, consistent amounts.
        if metrics.out_degree >= volume_threshold && metrics.in_degree <= 2 {
            if let Some(sent) = outgoing.get(account) {
                if sent.len() >= volume_threshold {
                    let distinct_receivers: BTreeSet<&AccountId> =
                        sent.iter().map(|t| &t.receiver).collect();
                    if distinct_receivers.len() >= volume_threshold {
                        let amounts: Vec<f64> = sent
                            .iter()
                            .filter_map(|t| t.amount.to_f64())
                            .collect();
                        let mean = amounts.as_slice().mean();
                        let std_dev = amounts.as_slice().population_std_dev();
                        let cv = std_dev / mean.max(1.0);
                        if cv < PAYROLL_CV_LIMIT {
                            debug!(
                                account = account.as_str(),
                                out_degree = metrics.out_degree,
                                receivers = distinct_receivers.len(),
                                cv,
                                "whitelisted payroll"
                            );
                            whitelisted.insert(account.clone());
                        }
                    }
                }
            }
        }
    }

    info!(count = whitelisted.len(), "legitimate accounts identified");
    whitelisted
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveDateTime};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn at(day: u32, hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, day)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    fn merchant_batch(payers: usize) -> Vec<Transaction> {
        (0..payers)
            .map(|i| {
                Transaction::new(
                    format!("T{i:03}"),
                    format!("CUST_{i:02}"),
                    "SHOP",
                    Decimal::from(20 + i as i64),
                    at(1 + (i / 12) as u32, (i % 12) as u32 + 8),
                )
            })
            .collect()
    }

    #[test]
    fn test_merchant_whitelisted() {
        let transactions = merchant_batch(15);
        let graph = TransactionGraph::build(&transactions);

        let whitelist = identify_legitimate(&graph, &transactions);
        assert!(whitelist.contains("SHOP"));
    }

    #[test]
    fn test_payroll_whitelisted_with_consistent_amounts() {
        let transactions: Vec<Transaction> = (0..15)
            .map(|i| {
                Transaction::new(
                    format!("T{i:03}"),
                    "EMPLOYER",
                    format!("EMP_{i:02}"),
                    dec!(3000) + Decimal::from(i as i64 * 10),
                    at(1, (i % 12) as u32 + 8),
                )
            })
            .collect();
        let graph = TransactionGraph::build(&transactions);

        let whitelist = identify_legitimate(&graph, &transactions);
        assert!(whitelist.contains("EMPLOYER"));
    }

    #[test]
    fn test_erratic_amounts_not_payroll() {
        // Same shape, wildly varying amounts: CV above the limit.
        let amounts = [
            10, 5000, 90, 12000, 40, 7000, 150, 9000, 25, 11000, 60, 8000, 30, 6000, 100,
        ];
        let transactions: Vec<Transaction> = amounts
            .iter()
            .enumerate()
            .map(|(i, amount)| {
                Transaction::new(
                    format!("T{i:03}"),
                    "SPRAYER",
                    format!("DEST_{i:02}"),
                    Decimal::from(*amount),
                    at(1, (i % 12) as u32 + 8),
                )
            })
            .collect();
        let graph = TransactionGraph::build(&transactions);

        let whitelist = identify_legitimate(&graph, &transactions);
        assert!(!whitelist.contains("SPRAYER"));
    }

    #[test]
    fn test_two_sided_account_not_whitelisted() {
        // Receives from many AND sends to many: neither heuristic fits.
        let mut transactions = merchant_batch(10);
        for i in 0..10 {
            transactions.push(Transaction::new(
                format!("OUT{i:02}"),
                "SHOP",
                format!("DEST_{i:02}"),
                dec!(500),
                at(3, (i % 12) as u32 + 8),
            ));
        }
        let graph = TransactionGraph::build(&transactions);

        let whitelist = identify_legitimate(&graph, &transactions);
        assert!(!whitelist.contains("SHOP"));
    }
}
