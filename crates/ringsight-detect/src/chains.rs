//! Layered shell chains: paths through low-degree intermediaries with
//! forward-moving timestamps.
//!
//! A BFS grows cycle-free paths from every account with outgoing edges.
//! A path may only be extended while its current tail would remain a valid
//! intermediary (total degree at most `max_degree`); endpoints are
//! unconstrained. Consecutive edges must have non-decreasing earliest
//! timestamps. Every path reaching `min_len` accounts is recorded, growth
//! stops at `min_len + 2` accounts, and a final pass drops any path that is
//! a contiguous subsequence of a longer one, leaving maximal chains.

use std::collections::{HashSet, VecDeque};

use chrono::NaiveDateTime;
use tracing::{debug, info};

use ringsight_core::{AccountId, ChainConfig, PatternDetection};
use ringsight_graph::TransactionGraph;

/// Detect shell chains. Returns maximal paths in deterministic order.
pub fn detect_chains(graph: &TransactionGraph, config: &ChainConfig) -> Vec<PatternDetection> {
    let max_nodes = config.min_len + 2;
    let mut recorded: Vec<Vec<AccountId>> = Vec::new();
    let mut seen: HashSet<Vec<AccountId>> = HashSet::new();

    for start in graph.node_ids() {
        if graph.out_degree(start) == 0 {
            continue;
        }

        let mut queue: VecDeque<(Vec<AccountId>, Option<NaiveDateTime>)> = VecDeque::new();
        queue.push_back((vec![start.clone()], None));

        while let Some((path, last_ts)) = queue.pop_front() {
            if path.len() >= max_nodes {
                continue;
            }

            let tail = path.last().expect("path is never empty");

            // Extending makes the current tail an intermediary, so it must
            // satisfy the degree bound (the start node is exempt: it stays
            // an endpoint of every extension).
            if path.len() > 1 && graph.total_degree(tail) > config.max_degree {
                continue;
            }

            for next in graph.successors(tail) {
                if path.iter().any(|p| p == next) {
                    continue;
                }

                let Some(edge_ts) = graph.min_edge_timestamp(tail, next) else {
                    continue;
                };
                if let Some(previous) = last_ts {
                    if edge_ts < previous {
                        continue;
                    }
                }

                let mut extended = path.clone();
                extended.push(next.clone());

                if extended.len() >= config.min_len && seen.insert(extended.clone()) {
                    debug!(chain = ?extended, "shell chain candidate");
                    recorded.push(extended.clone());
                }

                queue.push_back((extended, Some(edge_ts)));
            }
        }
    }

    let chains = drop_subchains(recorded);
    info!(chains = chains.len(), "shell chain detection complete");

    chains
        .into_iter()
        .map(|path| PatternDetection::Chain { path })
        .collect()
}

/// Remove every path that occurs as a contiguous subsequence of a strictly
/// longer recorded path.
fn drop_subchains(chains: Vec<Vec<AccountId>>) -> Vec<Vec<AccountId>> {
    let survivors: Vec<Vec<AccountId>> = chains
        .iter()
        .filter(|chain| {
            !chains
                .iter()
                .any(|other| other.len() > chain.len() && is_contiguous_subsequence(chain, other))
        })
        .cloned()
        .collect();
    survivors
}

fn is_contiguous_subsequence(needle: &[AccountId], haystack: &[AccountId]) -> bool {
    haystack.windows(needle.len()).any(|w| w == needle)
}
