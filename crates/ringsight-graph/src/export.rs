//! Visualization export of the transaction graph.

use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

use crate::model::TransactionGraph;

/// One node with its metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeExport {
    pub id: String,
    pub in_degree: usize,
    pub out_degree: usize,
    pub total_transactions: usize,
    pub total_amount_sent: f64,
    pub total_amount_received: f64,
    pub net_flow: f64,
}

/// One aggregated edge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeExport {
    pub source: String,
    pub target: String,
    pub amount: f64,
    pub transaction_count: usize,
}

/// High-level graph statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphSummary {
    pub total_nodes: usize,
    pub total_edges: usize,
    pub is_connected: bool,
    pub density: f64,
}

/// Complete export payload: nodes, edges, and summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphExport {
    pub nodes: Vec<NodeExport>,
    pub edges: Vec<EdgeExport>,
    pub summary: GraphSummary,
}

impl GraphExport {
    /// Export a graph. Nodes and edges are emitted in sorted id order.
    pub fn from_graph(graph: &TransactionGraph) -> Self {
        let nodes = graph
            .nodes()
            .map(|(id, m)| NodeExport {
                id: id.clone(),
                in_degree: m.in_degree,
                out_degree: m.out_degree,
                total_transactions: m.total_transactions,
                total_amount_sent: m.total_amount_sent.to_f64().unwrap_or(0.0),
                total_amount_received: m.total_amount_received.to_f64().unwrap_or(0.0),
                net_flow: m.net_flow.to_f64().unwrap_or(0.0),
            })
            .collect();

        let edges = graph
            .edges()
            .map(|((source, target), data)| EdgeExport {
                source: source.clone(),
                target: target.clone(),
                amount: data.amount.to_f64().unwrap_or(0.0),
                transaction_count: data.transaction_count,
            })
            .collect();

        Self {
            nodes,
            edges,
            summary: GraphSummary {
                total_nodes: graph.node_count(),
                total_edges: graph.edge_count(),
                is_connected: graph.is_weakly_connected(),
                density: graph.density(),
            },
        }
    }
}
