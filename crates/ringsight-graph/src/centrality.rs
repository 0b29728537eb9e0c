//! Centrality measures over the transaction graph.
//!
//! Degree centrality, Brandes betweenness, and PageRank power iteration.
//! Betweenness fans out per-source shortest-path passes with rayon and folds
//! the partial sums in fixed source order, so results are identical across
//! runs regardless of thread scheduling.

use std::collections::{BTreeMap, VecDeque};

use rayon::prelude::*;

use ringsight_core::AccountId;

use crate::model::TransactionGraph;

/// Degree centrality: `total_degree / (n - 1)` per node. Empty for graphs
/// with fewer than two nodes.
pub fn degree_centrality(graph: &TransactionGraph) -> BTreeMap<AccountId, f64> {
    let n = graph.node_count();
    if n < 2 {
        return graph.node_ids().map(|id| (id.clone(), 0.0)).collect();
    }

    let denom = (n - 1) as f64;
    graph
        .nodes()
        .map(|(id, metrics)| (id.clone(), metrics.total_degree() as f64 / denom))
        .collect()
}

/// Betweenness centrality via Brandes' algorithm on unweighted directed
/// edges, normalized by `1 / ((n - 1) * (n - 2))`. Degenerate graphs
/// (fewer than three nodes) yield all-zero scores.
pub fn betweenness_centrality(graph: &TransactionGraph) -> BTreeMap<AccountId, f64> {
    let ids: Vec<&AccountId> = graph.node_ids().collect();
    let n = ids.len();

    let mut scores: BTreeMap<AccountId, f64> =
        ids.iter().map(|id| ((*id).clone(), 0.0)).collect();
    if n < 3 {
        return scores;
    }

    let index: BTreeMap<&AccountId, usize> =
        ids.iter().enumerate().map(|(i, id)| (*id, i)).collect();
    let adjacency: Vec<Vec<usize>> = ids
        .iter()
        .map(|id| graph.successors(id).map(|next| index[next]).collect())
        .collect();

    // Per-source dependency accumulation; partials are collected in source
    // order and folded sequentially to keep float summation deterministic.
    let partials: Vec<Vec<f64>> = (0..n)
        .into_par_iter()
        .map(|source| brandes_single_source(source, &adjacency))
        .collect();

    let mut totals = vec![0.0f64; n];
    for partial in partials {
        for (i, value) in partial.into_iter().enumerate() {
            totals[i] += value;
        }
    }

    let scale = 1.0 / ((n - 1) as f64 * (n - 2) as f64);
    for (i, id) in ids.iter().enumerate() {
        scores.insert((*id).clone(), totals[i] * scale);
    }
    scores
}

fn brandes_single_source(source: usize, adjacency: &[Vec<usize>]) -> Vec<f64> {
    let n = adjacency.len();
    let mut stack: Vec<usize> = Vec::with_capacity(n);
    let mut preds: Vec<Vec<usize>> = vec![Vec::new(); n];
    let mut sigma = vec![0.0f64; n];
    let mut dist = vec![-1i64; n];
    let mut delta = vec![0.0f64; n];

    sigma[source] = 1.0;
    dist[source] = 0;

    let mut queue = VecDeque::new();
    queue.push_back(source);
    while let Some(v) = queue.pop_front() {
        stack.push(v);
        for &w in &adjacency[v] {
            if dist[w] < 0 {
                dist[w] = dist[v] + 1;
                queue.push_back(w);
            }
            if dist[w] == dist[v] + 1 {
                sigma[w] += sigma[v];
                preds[w].push(v);
            }
        }
    }

    while let Some(w) = stack.pop() {
        for &v in &preds[w] {
            delta[v] += (sigma[v] / sigma[w]) * (1.0 + delta[w]);
        }
    }

    delta[source] = 0.0;
    delta
}

/// PageRank by power iteration (damping 0.85). Returns `None` when the
/// iteration fails to converge within `max_iter`; callers degrade the
/// contribution to zero.
pub fn pagerank(graph: &TransactionGraph) -> Option<BTreeMap<AccountId, f64>> {
    pagerank_with(graph, 0.85, 100, 1.0e-6)
}

/// PageRank with explicit damping, iteration cap, and per-node tolerance.
pub fn pagerank_with(
    graph: &TransactionGraph,
    damping: f64,
    max_iter: usize,
    tol: f64,
) -> Option<BTreeMap<AccountId, f64>> {
    let ids: Vec<&AccountId> = graph.node_ids().collect();
    let n = ids.len();
    if n == 0 {
        return Some(BTreeMap::new());
    }

    let index: BTreeMap<&AccountId, usize> =
        ids.iter().enumerate().map(|(i, id)| (*id, i)).collect();
    let out_links: Vec<Vec<usize>> = ids
        .iter()
        .map(|id| graph.successors(id).map(|next| index[next]).collect())
        .collect();

    let uniform = 1.0 / n as f64;
    let mut rank = vec![uniform; n];

    for _ in 0..max_iter {
        let mut next = vec![(1.0 - damping) * uniform; n];

        let dangling_mass: f64 = (0..n)
            .filter(|&i| out_links[i].is_empty())
            .map(|i| rank[i])
            .sum();
        let dangling_share = damping * dangling_mass * uniform;

        for value in next.iter_mut() {
            *value += dangling_share;
        }
        for (i, links) in out_links.iter().enumerate() {
            if links.is_empty() {
                continue;
            }
            let share = damping * rank[i] / links.len() as f64;
            for &j in links {
                next[j] += share;
            }
        }

        let diff: f64 = rank
            .iter()
            .zip(next.iter())
            .map(|(a, b)| (a - b).abs())
            .sum();
        rank = next;
        if diff < n as f64 * tol {
            return Some(
                ids.iter()
                    .enumerate()
                    .map(|(i, id)| ((*id).clone(), rank[i]))
                    .collect(),
            );
        }
    }

    None
}
