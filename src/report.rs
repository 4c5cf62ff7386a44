//! Graph view export
//!
//! Nodes and aggregated edges derived from the transactions and an analysis
//! result, for visualization front-ends. Layout and styling are left to them.

use crate::network_analysis::TransactionGraph;
use crate::{AccountId, AnalysisResult, Transaction};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
    pub id: AccountId,
    pub suspicious: bool,
    pub suspicion_score: f64,
    pub ring_id: Option<String>,
    pub transaction_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphEdge {
    pub source: AccountId,
    pub target: AccountId,
    pub total_amount: f64,
    pub transaction_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphView {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
}

impl GraphView {
    /// Build the view; nodes and edges follow first-appearance order
    pub fn build(transactions: &[Transaction], result: &AnalysisResult) -> Self {
        let graph = TransactionGraph::build(transactions);
        let flagged: HashMap<&str, (f64, &str)> = result
            .suspicious_accounts
            .iter()
            .map(|a| (a.account_id.as_str(), (a.suspicion_score, a.ring_id.as_str())))
            .collect();

        let nodes = graph
            .accounts()
            .iter()
            .map(|account| {
                let entry = flagged.get(account.as_str());
                GraphNode {
                    id: account.clone(),
                    suspicious: entry.is_some(),
                    suspicion_score: entry.map_or(0.0, |(score, _)| *score),
                    ring_id: entry
                        .map(|(_, ring)| ring.to_string())
                        .filter(|ring| ring != crate::STANDALONE),
                    transaction_count: graph.transaction_count(account),
                }
            })
            .collect();

        let edges = graph
            .edges()
            .map(|edge| GraphEdge {
                source: edge.source,
                target: edge.target,
                total_amount: edge.total_amount,
                transaction_count: edge.transaction_count,
            })
            .collect();

        Self { nodes, edges }
    }

    pub fn node(&self, id: &str) -> Option<&GraphNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Export as JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sample_data::sample_transactions;
    use crate::TransactionAnalyzer;

    #[test]
    fn test_graph_view_from_sample() {
        let transactions = sample_transactions();
        let result = TransactionAnalyzer::new().analyze(&transactions);
        let view = GraphView::build(&transactions, &result);

        assert_eq!(view.nodes.len(), result.summary.total_accounts_analyzed);
        assert_eq!(view.edges.len(), 14);

        let hub = view.node("MULE_HUB").unwrap();
        assert!(hub.suspicious);
        assert_eq!(hub.transaction_count, 8);
        assert!(hub.ring_id.is_some());

        let destination = view.node("DEST_01").unwrap();
        assert!(!destination.suspicious);
        assert_eq!(destination.suspicion_score, 0.0);
        assert_eq!(destination.ring_id, None);
    }

    #[test]
    fn test_graph_view_json() {
        let transactions = sample_transactions();
        let result = TransactionAnalyzer::new().analyze(&transactions);
        let json = GraphView::build(&transactions, &result).to_json().unwrap();

        assert!(json.contains("\"nodes\""));
        assert!(json.contains("\"edges\""));
        assert!(json.contains("SHELL_A"));
    }
}
