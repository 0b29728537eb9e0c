//! Circular fund routing: bounded enumeration of elementary cycles.
//!
//! A depth-first search runs from every candidate node (both in- and
//! out-degree at least one), visiting candidates in sorted id order.
//! Rotations are suppressed at the source by only expanding into nodes
//! ordered after the start node, and a sorted-member canonical form
//! deduplicates anything that slips through. Enumeration stops as soon as
//! the wall-clock budget elapses or the cycle cap is reached; partial
//! results are returned with `truncated` set.

use std::collections::HashSet;
use std::time::Instant;

use tracing::{debug, info, warn};

use ringsight_core::{AccountId, CycleConfig};
use ringsight_graph::TransactionGraph;

/// Result of a bounded cycle enumeration.
#[derive(Debug, Clone, Default)]
pub struct CycleSearch {
    /// Cycles as distinct-account paths; the last account links back to the
    /// first. Length is within the configured bounds.
    pub cycles: Vec<Vec<AccountId>>,
    /// Whether the time budget or cycle cap cut enumeration short.
    pub truncated: bool,
}

/// Enumerate elementary cycles with length in
/// `[config.min_len, config.max_len]`, honoring the time and count caps.
pub fn detect_cycles(graph: &TransactionGraph, config: &CycleConfig) -> CycleSearch {
    let started = Instant::now();
    let mut search = CycleSearch::default();
    let mut seen: HashSet<Vec<AccountId>> = HashSet::new();

    let candidates: Vec<&AccountId> = graph
        .node_ids()
        .filter(|id| graph.in_degree(id) >= 1 && graph.out_degree(id) >= 1)
        .collect();

    let mut path: Vec<AccountId> = Vec::with_capacity(config.max_len);

    'outer: for start in candidates {
        path.clear();
        let mut dfs = DfsFrame {
            graph,
            config,
            started,
            start,
            seen: &mut seen,
            out: &mut search,
        };
        dfs.explore(start, &mut path);
        if search.truncated {
            break 'outer;
        }
    }

    if search.truncated {
        warn!(
            collected = search.cycles.len(),
            budget_secs = config.time_budget.as_secs_f64(),
            "cycle enumeration truncated"
        );
    }
    info!(cycles = search.cycles.len(), "cycle detection complete");
    search
}

struct DfsFrame<'a> {
    graph: &'a TransactionGraph,
    config: &'a CycleConfig,
    started: Instant,
    start: &'a AccountId,
    seen: &'a mut HashSet<Vec<AccountId>>,
    out: &'a mut CycleSearch,
}

impl DfsFrame<'_> {
    fn explore(&mut self, current: &AccountId, path: &mut Vec<AccountId>) {
        if self.out.truncated {
            return;
        }
        if self.started.elapsed() > self.config.time_budget
            || self.out.cycles.len() >= self.config.max_cycles
        {
            self.out.truncated = true;
            return;
        }

        path.push(current.clone());

        if path.len() <= self.config.max_len {
            for next in self.graph.successors(current) {
                if next == self.start {
                    if path.len() >= self.config.min_len {
                        self.record(path);
                    }
                } else if next > self.start && !path.iter().any(|p| p == next) {
                    // Expanding only into ids after the start keeps each
                    // cycle rooted at its minimum member.
                    if path.len() < self.config.max_len {
                        self.explore(next, path);
                        if self.out.truncated {
                            break;
                        }
                    }
                }
            }
        }

        path.pop();
    }

    fn record(&mut self, path: &[AccountId]) {
        if self.out.cycles.len() >= self.config.max_cycles {
            self.out.truncated = true;
            return;
        }

        let mut canonical: Vec<AccountId> = path.to_vec();
        canonical.sort_unstable();

        if self.seen.insert(canonical) {
            debug!(cycle = ?path, "cycle detected");
            self.out.cycles.push(path.to_vec());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use ringsight_core::Transaction;
    use rust_decimal_macros::dec;
    use std::time::Duration;

    fn ts(hour: u32) -> chrono::NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    fn graph_of(edges: &[(&str, &str)]) -> TransactionGraph {
        let transactions: Vec<Transaction> = edges
            .iter()
            .enumerate()
            .map(|(i, (from, to))| {
                Transaction::new(format!("T{i:03}"), *from, *to, dec!(100), ts(i as u32 % 24))
            })
            .collect();
        TransactionGraph::build(&transactions)
    }

    #[test]
    fn test_triangle_found_once() {
        let graph = graph_of(&[("A", "B"), ("B", "C"), ("C", "A")]);
        let search = detect_cycles(&graph, &CycleConfig::default());

        assert_eq!(search.cycles.len(), 1);
        assert!(!search.truncated);
        let mut members = search.cycles[0].clone();
        members.sort();
        assert_eq!(members, vec!["A", "B", "C"]);
    }

    #[test]
    fn test_two_cycle_below_min_length_ignored() {
        let graph = graph_of(&[("A", "B"), ("B", "A")]);
        let search = detect_cycles(&graph, &CycleConfig::default());
        assert!(search.cycles.is_empty());
    }

    #[test]
    fn test_self_loop_ignored() {
        let graph = graph_of(&[("A", "A"), ("A", "B"), ("B", "C"), ("C", "A")]);
        let search = detect_cycles(&graph, &CycleConfig::default());
        assert_eq!(search.cycles.len(), 1);
        assert_eq!(search.cycles[0].len(), 3);
    }

    #[test]
    fn test_length_bounds_respected() {
        // Hexagon: single 6-cycle, above max_len = 5.
        let graph = graph_of(&[
            ("A", "B"),
            ("B", "C"),
            ("C", "D"),
            ("D", "E"),
            ("E", "F"),
            ("F", "A"),
        ]);
        let search = detect_cycles(&graph, &CycleConfig::default());
        assert!(search.cycles.is_empty());

        let relaxed = CycleConfig {
            max_len: 6,
            ..Default::default()
        };
        let search = detect_cycles(&graph, &relaxed);
        assert_eq!(search.cycles.len(), 1);
        assert_eq!(search.cycles[0].len(), 6);
    }

    #[test]
    fn test_overlapping_cycles_all_found() {
        // Two triangles sharing the edge A->B.
        let graph = graph_of(&[("A", "B"), ("B", "C"), ("C", "A"), ("B", "D"), ("D", "A")]);
        let search = detect_cycles(&graph, &CycleConfig::default());
        assert_eq!(search.cycles.len(), 2);
    }

    #[test]
    fn test_cycle_cap_returns_partial() {
        // Dense complete-ish graph with many triangles.
        let nodes = ["A", "B", "C", "D", "E", "F", "G", "H"];
        let mut edges = Vec::new();
        for from in &nodes {
            for to in &nodes {
                if from != to {
                    edges.push((*from, *to));
                }
            }
        }
        let graph = graph_of(&edges);

        let capped = CycleConfig {
            max_cycles: 3,
            ..Default::default()
        };
        let search = detect_cycles(&graph, &capped);
        assert_eq!(search.cycles.len(), 3);
        assert!(search.truncated);
    }

    #[test]
    fn test_zero_time_budget_truncates() {
        let graph = graph_of(&[("A", "B"), ("B", "C"), ("C", "A")]);
        let config = CycleConfig {
            time_budget: Duration::ZERO,
            ..Default::default()
        };
        let search = detect_cycles(&graph, &config);
        assert!(search.truncated);
    }
}
