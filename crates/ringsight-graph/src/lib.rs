//! # ringsight-graph
//!
//! Directed, edge-aggregated transaction graph.
//!
//! Nodes are account ids; an edge `(u, v)` aggregates every `u -> v`
//! transaction into a summed amount, a transaction count, and an
//! insertion-ordered timestamp list. Node metrics (degrees, sent/received
//! totals, net flow) are maintained incrementally so batch appends only
//! touch the endpoints of new records.
//!
//! Storage uses ordered maps throughout, so node and edge iteration order is
//! stable across runs without explicit sorting passes.

mod centrality;
mod export;
mod model;

pub use centrality::{betweenness_centrality, degree_centrality, pagerank};
pub use export::{EdgeExport, GraphExport, GraphSummary, NodeExport};
pub use model::{AppendStats, EdgeData, NodeMetrics, TransactionGraph};
