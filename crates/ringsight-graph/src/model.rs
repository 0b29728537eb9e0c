//! Graph storage and incremental node metrics.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;

use ringsight_core::{AccountId, Transaction};

/// Aggregated attributes of one directed edge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeData {
    /// Sum of all transaction amounts over this edge.
    pub amount: Decimal,
    /// Timestamps in insertion order.
    pub timestamps: Vec<NaiveDateTime>,
    /// Number of aggregated transactions.
    pub transaction_count: usize,
}

impl EdgeData {
    fn new(amount: Decimal, timestamp: NaiveDateTime) -> Self {
        Self {
            amount,
            timestamps: vec![timestamp],
            transaction_count: 1,
        }
    }

    /// Earliest timestamp on this edge.
    pub fn min_timestamp(&self) -> Option<NaiveDateTime> {
        self.timestamps.iter().min().copied()
    }
}

/// Per-account metrics derived from the aggregated graph.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeMetrics {
    /// Number of distinct incoming counterparties.
    pub in_degree: usize,
    /// Number of distinct outgoing counterparties.
    pub out_degree: usize,
    /// Total transactions the account participates in (sent + received).
    pub total_transactions: usize,
    pub total_amount_sent: Decimal,
    pub total_amount_received: Decimal,
    /// `received - sent`.
    pub net_flow: Decimal,
}

impl NodeMetrics {
    /// Combined in- and out-degree.
    pub fn total_degree(&self) -> usize {
        self.in_degree + self.out_degree
    }
}

/// Counts returned by an incremental append.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppendStats {
    pub new_nodes: usize,
    pub new_edges: usize,
    pub total_nodes: usize,
    pub total_edges: usize,
}

/// Directed multigraph with edge aggregation keyed by `(sender, receiver)`.
#[derive(Debug, Clone, Default)]
pub struct TransactionGraph {
    nodes: BTreeMap<AccountId, NodeMetrics>,
    edges: BTreeMap<(AccountId, AccountId), EdgeData>,
    successors: BTreeMap<AccountId, BTreeSet<AccountId>>,
    predecessors: BTreeMap<AccountId, BTreeSet<AccountId>>,
}

impl TransactionGraph {
    /// Create an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a graph from a validated batch.
    pub fn build(transactions: &[Transaction]) -> Self {
        let mut graph = Self::new();
        graph.append(transactions);
        info!(
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            "transaction graph built"
        );
        graph
    }

    /// Incrementally add transactions, creating nodes and edges as needed.
    /// Metrics are updated only for the endpoints of the new records.
    pub fn append(&mut self, transactions: &[Transaction]) -> AppendStats {
        let initial_nodes = self.nodes.len();
        let initial_edges = self.edges.len();

        for txn in transactions {
            self.nodes.entry(txn.sender.clone()).or_default();
            self.nodes.entry(txn.receiver.clone()).or_default();

            let key = (txn.sender.clone(), txn.receiver.clone());
            match self.edges.get_mut(&key) {
                Some(edge) => {
                    edge.amount += txn.amount;
                    edge.timestamps.push(txn.timestamp);
                    edge.transaction_count += 1;
                }
                None => {
                    self.edges.insert(key, EdgeData::new(txn.amount, txn.timestamp));
                    self.successors
                        .entry(txn.sender.clone())
                        .or_default()
                        .insert(txn.receiver.clone());
                    self.predecessors
                        .entry(txn.receiver.clone())
                        .or_default()
                        .insert(txn.sender.clone());

                    // Degrees count distinct counterparties, so they move
                    // only when a new edge appears.
                    self.nodes.get_mut(&txn.sender).unwrap().out_degree += 1;
                    self.nodes.get_mut(&txn.receiver).unwrap().in_degree += 1;
                }
            }

            {
                let sender = self.nodes.get_mut(&txn.sender).unwrap();
                sender.total_amount_sent += txn.amount;
                sender.total_transactions += 1;
                sender.net_flow = sender.total_amount_received - sender.total_amount_sent;
            }
            {
                let receiver = self.nodes.get_mut(&txn.receiver).unwrap();
                receiver.total_amount_received += txn.amount;
                receiver.total_transactions += 1;
                receiver.net_flow = receiver.total_amount_received - receiver.total_amount_sent;
            }
        }

        AppendStats {
            new_nodes: self.nodes.len() - initial_nodes,
            new_edges: self.edges.len() - initial_edges,
            total_nodes: self.nodes.len(),
            total_edges: self.edges.len(),
        }
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Node ids in sorted order.
    pub fn node_ids(&self) -> impl Iterator<Item = &AccountId> {
        self.nodes.keys()
    }

    /// All nodes with metrics, in sorted id order.
    pub fn nodes(&self) -> impl Iterator<Item = (&AccountId, &NodeMetrics)> {
        self.nodes.iter()
    }

    /// All edges with attributes, in sorted key order.
    pub fn edges(&self) -> impl Iterator<Item = (&(AccountId, AccountId), &EdgeData)> {
        self.edges.iter()
    }

    pub fn contains_node(&self, account: &str) -> bool {
        self.nodes.contains_key(account)
    }

    pub fn metrics(&self, account: &str) -> Option<&NodeMetrics> {
        self.nodes.get(account)
    }

    pub fn edge(&self, sender: &str, receiver: &str) -> Option<&EdgeData> {
        self.edges
            .get(&(sender.to_string(), receiver.to_string()))
    }

    pub fn has_edge(&self, sender: &str, receiver: &str) -> bool {
        self.edge(sender, receiver).is_some()
    }

    /// Earliest timestamp on the `sender -> receiver` edge.
    pub fn min_edge_timestamp(&self, sender: &str, receiver: &str) -> Option<NaiveDateTime> {
        self.edge(sender, receiver).and_then(EdgeData::min_timestamp)
    }

    /// Direct successors of an account, in sorted order.
    pub fn successors(&self, account: &str) -> impl Iterator<Item = &AccountId> {
        self.successors.get(account).into_iter().flatten()
    }

    /// Direct predecessors of an account, in sorted order.
    pub fn predecessors(&self, account: &str) -> impl Iterator<Item = &AccountId> {
        self.predecessors.get(account).into_iter().flatten()
    }

    pub fn in_degree(&self, account: &str) -> usize {
        self.nodes.get(account).map_or(0, |m| m.in_degree)
    }

    pub fn out_degree(&self, account: &str) -> usize {
        self.nodes.get(account).map_or(0, |m| m.out_degree)
    }

    pub fn total_degree(&self, account: &str) -> usize {
        self.nodes.get(account).map_or(0, NodeMetrics::total_degree)
    }

    /// Edge density: `E / (N * (N - 1))`.
    pub fn density(&self) -> f64 {
        let n = self.nodes.len();
        if n < 2 {
            return 0.0;
        }
        self.edges.len() as f64 / (n * (n - 1)) as f64
    }

    /// Weak connectivity: every node reachable from any other when edge
    /// direction is ignored.
    pub fn is_weakly_connected(&self) -> bool {
        let Some(start) = self.nodes.keys().next() else {
            return false;
        };

        let mut visited: BTreeSet<&AccountId> = BTreeSet::new();
        let mut queue: VecDeque<&AccountId> = VecDeque::new();
        visited.insert(start);
        queue.push_back(start);

        while let Some(current) = queue.pop_front() {
            let neighbors = self
                .successors
                .get(current)
                .into_iter()
                .flatten()
                .chain(self.predecessors.get(current).into_iter().flatten());
            for neighbor in neighbors {
                if visited.insert(neighbor) {
                    queue.push_back(neighbor);
                }
            }
        }

        visited.len() == self.nodes.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn ts(hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    fn txn(id: &str, from: &str, to: &str, amount: Decimal, hour: u32) -> Transaction {
        Transaction::new(id, from, to, amount, ts(hour))
    }

    #[test]
    fn test_edge_aggregation() {
        let graph = TransactionGraph::build(&[
            txn("T1", "A", "B", dec!(100), 10),
            txn("T2", "A", "B", dec!(50), 12),
            txn("T3", "B", "C", dec!(75), 14),
        ]);

        assert_eq!(graph.node_count(), 3);
        assert_eq!(graph.edge_count(), 2);

        let edge = graph.edge("A", "B").unwrap();
        assert_eq!(edge.amount, dec!(150));
        assert_eq!(edge.transaction_count, 2);
        assert_eq!(edge.timestamps, vec![ts(10), ts(12)]);
        assert_eq!(edge.min_timestamp(), Some(ts(10)));
    }

    #[test]
    fn test_node_metrics() {
        let graph = TransactionGraph::build(&[
            txn("T1", "A", "B", dec!(100), 10),
            txn("T2", "A", "B", dec!(50), 12),
            txn("T3", "B", "C", dec!(75), 14),
        ]);

        let b = graph.metrics("B").unwrap();
        assert_eq!(b.in_degree, 1);
        assert_eq!(b.out_degree, 1);
        assert_eq!(b.total_transactions, 3);
        assert_eq!(b.total_amount_received, dec!(150));
        assert_eq!(b.total_amount_sent, dec!(75));
        assert_eq!(b.net_flow, dec!(75));
    }

    #[test]
    fn test_sent_count_matches_edge_counts() {
        let transactions = vec![
            txn("T1", "A", "B", dec!(10), 1),
            txn("T2", "A", "B", dec!(10), 2),
            txn("T3", "A", "C", dec!(10), 3),
        ];
        let graph = TransactionGraph::build(&transactions);

        let edge_total: usize = graph
            .edges()
            .filter(|((from, _), _)| from == "A")
            .map(|(_, data)| data.transaction_count)
            .sum();
        let sent = transactions.iter().filter(|t| t.sender == "A").count();
        assert_eq!(edge_total, sent);
    }

    #[test]
    fn test_incremental_append() {
        let mut graph = TransactionGraph::build(&[txn("T1", "A", "B", dec!(100), 10)]);

        let stats = graph.append(&[
            txn("T2", "A", "B", dec!(25), 11),
            txn("T3", "C", "D", dec!(40), 12),
        ]);

        assert_eq!(stats.new_nodes, 2);
        assert_eq!(stats.new_edges, 1);
        assert_eq!(stats.total_nodes, 4);
        assert_eq!(stats.total_edges, 2);
        assert_eq!(graph.edge("A", "B").unwrap().transaction_count, 2);
    }

    #[test]
    fn test_weak_connectivity_and_density() {
        let connected = TransactionGraph::build(&[
            txn("T1", "A", "B", dec!(1), 1),
            txn("T2", "C", "B", dec!(1), 2),
        ]);
        assert!(connected.is_weakly_connected());

        let disconnected = TransactionGraph::build(&[
            txn("T1", "A", "B", dec!(1), 1),
            txn("T2", "C", "D", dec!(1), 2),
        ]);
        assert!(!disconnected.is_weakly_connected());
        assert!((disconnected.density() - 2.0 / 12.0).abs() < 1e-12);
    }

    #[test]
    fn test_self_loop_counts_both_sides() {
        let graph = TransactionGraph::build(&[txn("T1", "A", "A", dec!(10), 1)]);

        let a = graph.metrics("A").unwrap();
        assert_eq!(a.total_transactions, 2);
        assert_eq!(a.total_amount_sent, dec!(10));
        assert_eq!(a.total_amount_received, dec!(10));
        assert_eq!(a.net_flow, dec!(0));
    }
}
