//! Transaction network analysis module
//!
//! Builds the directed transaction graph and runs the path-exploration detectors
//! over it: circular fund routing (cycles) and layered shell chains.

use crate::{AccountId, Transaction};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Account node in the graph
#[derive(Debug, Clone)]
struct AccountNode {
    total_received: f64,
    total_sent: f64,
    transaction_count: usize,
    first_seen: DateTime<Utc>,
    last_seen: DateTime<Utc>,
    /// Distinct receivers, in first-seen order
    outgoing_accounts: Vec<AccountId>,
    incoming_count: usize,
}

impl AccountNode {
    fn new(timestamp: DateTime<Utc>) -> Self {
        Self {
            total_received: 0.0,
            total_sent: 0.0,
            transaction_count: 0,
            first_seen: timestamp,
            last_seen: timestamp,
            outgoing_accounts: Vec::new(),
            incoming_count: 0,
        }
    }

    fn touch(&mut self, timestamp: DateTime<Utc>) {
        self.transaction_count += 1;
        self.first_seen = self.first_seen.min(timestamp);
        self.last_seen = self.last_seen.max(timestamp);
    }
}

/// Edge in the transaction graph
#[derive(Debug, Clone)]
struct TransactionEdge {
    total_amount: f64,
    transaction_count: usize,
}

/// Directed transaction graph: adjacency plus per-account aggregates
#[derive(Debug, Clone, Default)]
pub struct TransactionGraph {
    /// Accounts in first-appearance order
    accounts: Vec<AccountId>,
    nodes: HashMap<AccountId, AccountNode>,
    edges: HashMap<(AccountId, AccountId), TransactionEdge>,
    /// Edge keys in first-seen order
    edge_order: Vec<(AccountId, AccountId)>,
}

impl TransactionGraph {
    /// Create an empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the graph from a full transaction set
    pub fn build(transactions: &[Transaction]) -> Self {
        let mut graph = Self::new();
        for transaction in transactions {
            graph.add_transaction(transaction);
        }
        graph
    }

    /// Add a transaction to the graph
    pub fn add_transaction(&mut self, transaction: &Transaction) {
        let sender = &transaction.sender_id;
        let receiver = &transaction.receiver_id;
        let timestamp = transaction.timestamp;

        let sender_node = self.node_entry(sender, timestamp);
        sender_node.total_sent += transaction.amount;
        sender_node.touch(timestamp);
        if !sender_node.outgoing_accounts.contains(receiver) {
            sender_node.outgoing_accounts.push(receiver.clone());
        }

        let receiver_node = self.node_entry(receiver, timestamp);
        receiver_node.total_received += transaction.amount;
        receiver_node.touch(timestamp);
        receiver_node.incoming_count += 1;

        let edge_key = (sender.clone(), receiver.clone());
        if !self.edges.contains_key(&edge_key) {
            self.edge_order.push(edge_key.clone());
        }
        let edge = self.edges.entry(edge_key).or_insert(TransactionEdge {
            total_amount: 0.0,
            transaction_count: 0,
        });
        edge.total_amount += transaction.amount;
        edge.transaction_count += 1;
    }

    fn node_entry(&mut self, account_id: &str, timestamp: DateTime<Utc>) -> &mut AccountNode {
        if !self.nodes.contains_key(account_id) {
            self.accounts.push(account_id.to_string());
        }
        self.nodes
            .entry(account_id.to_string())
            .or_insert_with(|| AccountNode::new(timestamp))
    }

    /// All accounts, in first-appearance order
    pub fn accounts(&self) -> &[AccountId] {
        &self.accounts
    }

    /// Distinct accounts this account has sent money to
    pub fn successors(&self, account_id: &str) -> &[AccountId] {
        self.nodes
            .get(account_id)
            .map_or(&[][..], |node| node.outgoing_accounts.as_slice())
    }

    pub fn has_edge(&self, from: &str, to: &str) -> bool {
        self.edges.contains_key(&(from.to_string(), to.to_string()))
    }

    /// Transactions sent plus received by the account
    pub fn transaction_count(&self, account_id: &str) -> usize {
        self.nodes.get(account_id).map_or(0, |n| n.transaction_count)
    }

    /// Aggregated edges in first-seen order
    pub fn edges(&self) -> impl Iterator<Item = EdgeSummary> + '_ {
        self.edge_order.iter().filter_map(move |key| {
            self.edges.get(key).map(|edge| EdgeSummary {
                source: key.0.clone(),
                target: key.1.clone(),
                total_amount: edge.total_amount,
                transaction_count: edge.transaction_count,
            })
        })
    }

    /// Get account statistics
    pub fn account_stats(&self, account_id: &str) -> Option<AccountStats> {
        self.nodes.get(account_id).map(|node| AccountStats {
            account_id: account_id.to_string(),
            total_received: node.total_received,
            total_sent: node.total_sent,
            net_flow: node.total_received - node.total_sent,
            transaction_count: node.transaction_count,
            incoming_transactions: node.incoming_count,
            outgoing_connections: node.outgoing_accounts.len(),
            first_seen: node.first_seen,
            last_seen: node.last_seen,
        })
    }

    /// Get graph statistics
    pub fn stats(&self) -> GraphStats {
        let total_transactions: usize = self.edges.values().map(|e| e.transaction_count).sum();
        let total_amount: f64 = self.edges.values().map(|e| e.total_amount).sum();

        GraphStats {
            node_count: self.nodes.len(),
            edge_count: self.edges.len(),
            total_transactions,
            total_amount,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Find simple directed cycles whose length lies in `min_length..=max_length`.
///
/// Every account is tried as a start node. Cycles over the same set of accounts
/// are reported once, whatever their traversal order; the first traversal found
/// is kept.
pub fn detect_cycles(
    graph: &TransactionGraph,
    min_length: usize,
    max_length: usize,
) -> Vec<Vec<AccountId>> {
    let mut cycles = Vec::new();
    let mut seen_keys = HashSet::new();

    for start in graph.accounts() {
        let mut stack: Vec<Vec<&str>> = vec![vec![start.as_str()]];

        while let Some(path) = stack.pop() {
            let Some(&current) = path.last() else {
                continue;
            };

            for next in graph.successors(current) {
                if next == start {
                    if path.len() >= min_length && path.len() <= max_length {
                        let key = cycle_key(&path);
                        if seen_keys.insert(key) {
                            cycles.push(path.iter().map(|a| a.to_string()).collect());
                        }
                    }
                } else if path.len() < max_length && !path.contains(&next.as_str()) {
                    let mut extended = path.clone();
                    extended.push(next.as_str());
                    stack.push(extended);
                }
            }
        }
    }

    cycles
}

/// Identity of a cycle: its member set, sorted and joined
fn cycle_key(path: &[&str]) -> String {
    let mut members = path.to_vec();
    members.sort_unstable();
    members.join(",")
}

/// A chain of pass-through accounts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShellChain {
    /// Accounts in transfer order
    pub accounts: Vec<AccountId>,
    /// Interior accounts under the low-activity limit
    pub intermediaries: Vec<AccountId>,
}

/// Find chains of at least `min_length` accounts whose interior accounts each have
/// at most `max_intermediary_transactions` transactions.
///
/// Chains are identified by their exact ordered path, so the same accounts in a
/// different order form a different chain. Qualifying chains keep being extended
/// up to `max_length`.
pub fn detect_shell_chains(
    graph: &TransactionGraph,
    min_length: usize,
    max_length: usize,
    max_intermediary_transactions: usize,
) -> Vec<ShellChain> {
    let is_low_activity =
        |account: &str| graph.transaction_count(account) <= max_intermediary_transactions;

    let mut chains = Vec::new();
    let mut seen_paths = HashSet::new();

    for start in graph.accounts() {
        let mut stack: Vec<Vec<&str>> = vec![vec![start.as_str()]];

        while let Some(path) = stack.pop() {
            let inner = interior(&path);
            if path.len() >= min_length
                && inner.iter().all(|a| is_low_activity(*a))
                && seen_paths.insert(path.join("->"))
            {
                chains.push(ShellChain {
                    accounts: path.iter().map(|a| a.to_string()).collect(),
                    intermediaries: inner.iter().map(|a| a.to_string()).collect(),
                });
            }

            if path.len() >= max_length {
                continue;
            }

            let Some(&current) = path.last() else {
                continue;
            };

            // The current tail becomes interior once extended
            if path.len() > 1 && !is_low_activity(current) {
                continue;
            }

            for next in graph.successors(current) {
                if !path.contains(&next.as_str()) {
                    let mut extended = path.clone();
                    extended.push(next.as_str());
                    stack.push(extended);
                }
            }
        }
    }

    chains
}

/// Accounts strictly between the first and last of a path
fn interior<'a, 'p>(path: &'p [&'a str]) -> &'p [&'a str] {
    if path.len() > 2 {
        &path[1..path.len() - 1]
    } else {
        &[]
    }
}

// Result types

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EdgeSummary {
    pub source: AccountId,
    pub target: AccountId,
    pub total_amount: f64,
    pub transaction_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountStats {
    pub account_id: AccountId,
    pub total_received: f64,
    pub total_sent: f64,
    pub net_flow: f64,
    pub transaction_count: usize,
    pub incoming_transactions: usize,
    pub outgoing_connections: usize,
    pub first_seen: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphStats {
    pub node_count: usize,
    pub edge_count: usize,
    pub total_transactions: usize,
    pub total_amount: f64,
}
