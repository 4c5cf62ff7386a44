//! Behavioural fraud patterns over the raw transaction set
//!
//! Smurfing (fan-in / fan-out), high velocity, threshold structuring, round-trip
//! flows and dormant-account reactivation. Each detector is a pure function of the
//! transactions and the configured thresholds.

use crate::config::DetectionConfig;
use crate::{AccountId, PatternLabel, Transaction};
use chrono::{DateTime, Duration, Utc};
use std::collections::{HashMap, HashSet};

/// Labels raised by the smurfing detector, each pair once, in the order first raised
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SmurfingFindings {
    hits: Vec<(AccountId, PatternLabel)>,
    seen: HashSet<(AccountId, PatternLabel)>,
}

impl SmurfingFindings {
    pub(crate) fn push(&mut self, account: &str, label: PatternLabel) {
        let hit = (account.to_string(), label);
        if self.seen.insert(hit.clone()) {
            self.hits.push(hit);
        }
    }

    pub fn hits(&self) -> &[(AccountId, PatternLabel)] {
        &self.hits
    }

    /// Distinct flagged accounts, in first-flagged order
    pub fn flagged_accounts(&self) -> Vec<AccountId> {
        let mut seen = HashSet::new();
        self.hits
            .iter()
            .filter(|(account, _)| seen.insert(account.as_str()))
            .map(|(account, _)| account.clone())
            .collect()
    }

    pub fn accounts_with(&self, label: PatternLabel) -> Vec<AccountId> {
        let mut seen = HashSet::new();
        self.hits
            .iter()
            .filter(|(account, l)| *l == label && seen.insert(account.as_str()))
            .map(|(account, _)| account.clone())
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }
}

/// Group transactions by an account key, keeping first-seen account order
fn group_by_account<'a, F>(transactions: &'a [Transaction], key: F) -> Vec<(&'a str, Vec<&'a Transaction>)>
where
    F: Fn(&'a Transaction) -> &'a str,
{
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut groups: Vec<(&str, Vec<&Transaction>)> = Vec::new();

    for transaction in transactions {
        let account = key(transaction);
        let slot = *index.entry(account).or_insert_with(|| {
            groups.push((account, Vec::new()));
            groups.len() - 1
        });
        groups[slot].1.push(transaction);
    }

    groups
}

/// Transactions whose timestamp lies in `[anchor, anchor + window]`
fn in_window<'a>(
    transactions: &'a [&'a Transaction],
    anchor: DateTime<Utc>,
    window: Duration,
) -> impl Iterator<Item = &'a Transaction> + 'a {
    let end = anchor + window;
    transactions
        .iter()
        .copied()
        .filter(move |t| t.timestamp >= anchor && t.timestamp <= end)
}

/// Distinct values in first-seen order
fn distinct<'a>(values: impl Iterator<Item = &'a str>) -> Vec<&'a str> {
    let mut seen = HashSet::new();
    values.filter(|v| seen.insert(*v)).collect()
}

/// Detect fan-in and fan-out smurfing.
///
/// Every transaction of an account serves as a window anchor. A receiver with
/// enough distinct senders inside one window is `fan_in` and each of those
/// senders is a `smurfing_source`; a sender with enough distinct receivers
/// inside one window is `fan_out`.
pub fn detect_smurfing(transactions: &[Transaction], config: &DetectionConfig) -> SmurfingFindings {
    let window = config.smurfing_window();
    let min_counterparties = config.smurfing_min_counterparties;
    let mut findings = SmurfingFindings::default();

    for (receiver, received) in group_by_account(transactions, |t| t.receiver_id.as_str()) {
        for anchor in &received {
            let senders = distinct(
                in_window(&received, anchor.timestamp, window).map(|t| t.sender_id.as_str()),
            );
            if senders.len() >= min_counterparties {
                findings.push(receiver, PatternLabel::FanIn);
                for sender in senders {
                    findings.push(sender, PatternLabel::SmurfingSource);
                }
            }
        }
    }

    for (sender, sent) in group_by_account(transactions, |t| t.sender_id.as_str()) {
        let qualifies = sent.iter().any(|anchor| {
            let receivers = distinct(
                in_window(&sent, anchor.timestamp, window).map(|t| t.receiver_id.as_str()),
            );
            receivers.len() >= min_counterparties
        });
        if qualifies {
            findings.push(sender, PatternLabel::FanOut);
        }
    }

    findings
}

/// Detect senders with a burst of outgoing transactions inside the velocity window
pub fn detect_high_velocity(transactions: &[Transaction], config: &DetectionConfig) -> Vec<AccountId> {
    let window = config.velocity_window();
    let mut flagged = Vec::new();

    for (sender, sent) in group_by_account(transactions, |t| t.sender_id.as_str()) {
        if sent.len() < config.velocity_min_transactions {
            continue;
        }

        let mut timestamps: Vec<DateTime<Utc>> = sent.iter().map(|t| t.timestamp).collect();
        timestamps.sort();

        // First qualifying window suffices
        let burst = timestamps.iter().enumerate().any(|(i, anchor)| {
            let end = *anchor + window;
            timestamps[i..].iter().take_while(|t| **t <= end).count()
                >= config.velocity_min_transactions
        });

        if burst {
            flagged.push(sender.to_string());
        }
    }

    flagged
}

/// Count how many reporting-threshold margin bands an amount falls into
fn structuring_bands(amount: f64, config: &DetectionConfig) -> usize {
    config
        .structuring_thresholds
        .iter()
        .filter(|&&threshold| amount >= threshold - config.structuring_margin && amount < threshold)
        .count()
}

/// Detect senders repeatedly transferring amounts just under a reporting threshold.
///
/// A transaction inside several margin bands counts once per band.
pub fn detect_structuring(transactions: &[Transaction], config: &DetectionConfig) -> Vec<AccountId> {
    group_by_account(transactions, |t| t.sender_id.as_str())
        .into_iter()
        .filter(|(_, sent)| {
            let hits: usize = sent.iter().map(|t| structuring_bands(t.amount, config)).sum();
            hits >= config.structuring_min_hits
        })
        .map(|(sender, _)| sender.to_string())
        .collect()
}

/// Detect pairs of accounts sending similar amounts back and forth within the window.
///
/// Every forward transfer is compared against every reverse transfer of the pair.
pub fn detect_round_trips(transactions: &[Transaction], config: &DetectionConfig) -> Vec<AccountId> {
    let window = config.round_trip_window();
    let min_ratio = 1.0 - config.round_trip_tolerance;

    let mut pair_order: Vec<(&str, &str)> = Vec::new();
    let mut pairs: HashMap<(&str, &str), Vec<&Transaction>> = HashMap::new();
    for transaction in transactions {
        let key = (transaction.sender_id.as_str(), transaction.receiver_id.as_str());
        pairs
            .entry(key)
            .or_insert_with(|| {
                pair_order.push(key);
                Vec::new()
            })
            .push(transaction);
    }

    let mut flagged = Vec::new();
    let mut seen = HashSet::new();

    for (from, to) in pair_order {
        // A self-transfer is its own reverse leg
        if from == to {
            continue;
        }
        let (Some(forward), Some(reverse)) = (pairs.get(&(from, to)), pairs.get(&(to, from))) else {
            continue;
        };

        let matched = forward.iter().any(|out| {
            reverse.iter().any(|back| {
                let gap = if out.timestamp >= back.timestamp {
                    out.timestamp - back.timestamp
                } else {
                    back.timestamp - out.timestamp
                };
                let larger = out.amount.max(back.amount);
                let smaller = out.amount.min(back.amount);
                gap <= window && smaller >= larger * min_ratio
            })
        });

        if matched {
            for account in [from, to] {
                if seen.insert(account) {
                    flagged.push(account.to_string());
                }
            }
        }
    }

    flagged
}

/// Detect long-quiet accounts whose activity concentrates in one short burst.
///
/// Skipped entirely when the dataset covers less than the configured minimum span.
pub fn detect_dormant_activation(
    transactions: &[Transaction],
    config: &DetectionConfig,
) -> Vec<AccountId> {
    let (Some(first), Some(last)) = (
        transactions.iter().map(|t| t.timestamp).min(),
        transactions.iter().map(|t| t.timestamp).max(),
    ) else {
        return Vec::new();
    };
    if last - first < config.dormant_min_dataset_span() {
        return Vec::new();
    }

    let window = config.dormant_burst_window();
    let quiet_span = window * config.dormant_quiet_multiplier;

    // Account timelines over sent and received transactions, first-seen order
    let mut order: Vec<&str> = Vec::new();
    let mut timelines: HashMap<&str, Vec<DateTime<Utc>>> = HashMap::new();
    for transaction in transactions {
        for account in [transaction.sender_id.as_str(), transaction.receiver_id.as_str()] {
            timelines
                .entry(account)
                .or_insert_with(|| {
                    order.push(account);
                    Vec::new()
                })
                .push(transaction.timestamp);
        }
    }

    let mut flagged = Vec::new();
    for account in order {
        let Some(timeline) = timelines.get_mut(account) else {
            continue;
        };
        let total = timeline.len();
        if total < config.dormant_min_transactions {
            continue;
        }

        timeline.sort();
        let span = timeline[total - 1] - timeline[0];
        if span <= quiet_span {
            continue;
        }

        let required = total as f64 * config.dormant_burst_ratio;
        let burst = timeline.iter().enumerate().any(|(i, anchor)| {
            let end = *anchor + window;
            let in_burst = timeline[i..].iter().take_while(|t| **t <= end).count();
            in_burst as f64 >= required
        });

        if burst {
            flagged.push(account.to_string());
        }
    }

    flagged
}
