//! Fraud ring aggregation
//!
//! Turns raw detector output into numbered [`FraudRing`] records and accumulates,
//! per account, its pattern labels and the rings it belongs to. One aggregator
//! lives for exactly one analysis run.

use crate::fraud_patterns::SmurfingFindings;
use crate::network_analysis::ShellChain;
use crate::{AccountId, FraudRing, PatternLabel, RingPatternType};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// Risk of a cycle ring
pub fn cycle_ring_risk(length: usize) -> f64 {
    (70.0 + 5.0 * length as f64).min(100.0)
}

/// Risk of a layered shell ring
pub fn shell_ring_risk(length: usize) -> f64 {
    (75.0 + 3.0 * length as f64).min(100.0)
}

/// Everything known about one flagged account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlaggedAccount {
    pub account_id: AccountId,
    pub patterns: BTreeSet<PatternLabel>,
    /// Ring ids in the order the account joined them
    pub ring_ids: Vec<String>,
}

impl FlaggedAccount {
    fn new(account_id: &str) -> Self {
        Self {
            account_id: account_id.to_string(),
            patterns: BTreeSet::new(),
            ring_ids: Vec::new(),
        }
    }

    /// The first ring the account joined
    pub fn primary_ring(&self) -> Option<&str> {
        self.ring_ids.first().map(String::as_str)
    }
}

/// Final rings plus flagged accounts in encounter order
#[derive(Debug, Clone, PartialEq)]
pub struct RingAssessment {
    pub rings: Vec<FraudRing>,
    pub accounts: Vec<FlaggedAccount>,
}

/// Allocates ring ids and tracks per-account membership for one run
#[derive(Debug, Default)]
pub struct RingAggregator {
    ring_counter: usize,
    rings: Vec<FraudRing>,
    accounts: Vec<FlaggedAccount>,
    index: HashMap<AccountId, usize>,
}

impl RingAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    fn entry(&mut self, account_id: &str) -> &mut FlaggedAccount {
        let slot = match self.index.get(account_id) {
            Some(&slot) => slot,
            None => {
                self.accounts.push(FlaggedAccount::new(account_id));
                self.index
                    .insert(account_id.to_string(), self.accounts.len() - 1);
                self.accounts.len() - 1
            }
        };
        &mut self.accounts[slot]
    }

    /// Attach a pattern label to an account
    pub fn label(&mut self, account_id: &str, label: PatternLabel) {
        self.entry(account_id).patterns.insert(label);
    }

    pub fn label_all(&mut self, accounts: &[AccountId], label: PatternLabel) {
        for account_id in accounts {
            self.label(account_id, label);
        }
    }

    fn next_ring_id(&mut self) -> String {
        self.ring_counter += 1;
        format!("RING_{:03}", self.ring_counter)
    }

    /// Create a ring and record every member's membership, returning the ring id
    pub fn create_ring(
        &mut self,
        pattern_type: RingPatternType,
        member_accounts: Vec<AccountId>,
        risk_score: f64,
    ) -> String {
        let ring_id = self.next_ring_id();

        for account_id in &member_accounts {
            let ring_ids = &mut self.entry(account_id).ring_ids;
            if !ring_ids.contains(&ring_id) {
                ring_ids.push(ring_id.clone());
            }
        }

        self.rings.push(FraudRing {
            ring_id: ring_id.clone(),
            member_accounts,
            pattern_type,
            risk_score,
        });
        ring_id
    }

    /// One ring per cycle; members get `cycle_length_<N>`
    pub fn record_cycles(&mut self, cycles: &[Vec<AccountId>]) {
        for cycle in cycles {
            let length = cycle.len();
            self.create_ring(RingPatternType::Cycle, cycle.clone(), cycle_ring_risk(length));
            self.label_all(cycle, PatternLabel::CycleLength(length));
        }
    }

    /// Apply smurfing labels, then group every flagged account into one ring
    /// once at least `min_members` accounts are flagged
    pub fn record_smurfing(&mut self, findings: &SmurfingFindings, min_members: usize, risk_score: f64) {
        for (account_id, label) in findings.hits() {
            self.label(account_id, *label);
        }

        let flagged = findings.flagged_accounts();
        if flagged.len() >= min_members && !flagged.is_empty() {
            self.create_ring(RingPatternType::Smurfing, flagged, risk_score);
        }
    }

    /// One ring per chain; members get `layered_shell`, intermediaries also
    /// `low_activity_intermediary`
    pub fn record_shell_chains(&mut self, chains: &[ShellChain]) {
        for chain in chains {
            self.create_ring(
                RingPatternType::LayeredShell,
                chain.accounts.clone(),
                shell_ring_risk(chain.accounts.len()),
            );
            self.label_all(&chain.accounts, PatternLabel::LayeredShell);
            self.label_all(&chain.intermediaries, PatternLabel::LowActivityIntermediary);
        }
    }

    pub fn ring_count(&self) -> usize {
        self.rings.len()
    }

    pub fn finish(self) -> RingAssessment {
        RingAssessment {
            rings: self.rings,
            accounts: self.accounts,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(accounts: &[&str]) -> Vec<AccountId> {
        accounts.iter().map(|a| a.to_string()).collect()
    }

    #[test]
    fn test_ring_risk_formulas() {
        assert_eq!(cycle_ring_risk(3), 85.0);
        assert_eq!(cycle_ring_risk(5), 95.0);
        assert_eq!(cycle_ring_risk(7), 100.0);
        assert_eq!(shell_ring_risk(4), 87.0);
        assert_eq!(shell_ring_risk(6), 93.0);
        assert_eq!(shell_ring_risk(9), 100.0);
    }

    #[test]
    fn test_ring_ids_shared_across_detectors() {
        let mut aggregator = RingAggregator::new();

        aggregator.record_cycles(&[ids(&["A", "B", "C"])]);
        let mut findings = SmurfingFindings::default();
        findings.push("HUB", PatternLabel::FanIn);
        findings.push("S1", PatternLabel::SmurfingSource);
        aggregator.record_smurfing(&findings, 2, 80.0);
        aggregator.record_shell_chains(&[ShellChain {
            accounts: ids(&["P", "Q", "R", "S"]),
            intermediaries: ids(&["Q", "R"]),
        }]);

        let assessment = aggregator.finish();
        let ring_ids: Vec<&str> = assessment.rings.iter().map(|r| r.ring_id.as_str()).collect();
        assert_eq!(ring_ids, vec!["RING_001", "RING_002", "RING_003"]);
        assert_eq!(assessment.rings[1].pattern_type, RingPatternType::Smurfing);
        assert_eq!(assessment.rings[1].risk_score, 80.0);
        assert_eq!(assessment.rings[2].risk_score, 87.0);
    }

    #[test]
    fn test_first_ring_wins() {
        let mut aggregator = RingAggregator::new();

        aggregator.record_cycles(&[ids(&["A", "B", "C"]), ids(&["C", "D", "E", "F"])]);

        let assessment = aggregator.finish();
        let c = assessment
            .accounts
            .iter()
            .find(|a| a.account_id == "C")
            .unwrap();
        assert_eq!(c.primary_ring(), Some("RING_001"));
        assert_eq!(c.ring_ids.len(), 2);
        assert!(c.patterns.contains(&PatternLabel::CycleLength(3)));
        assert!(c.patterns.contains(&PatternLabel::CycleLength(4)));
    }

    #[test]
    fn test_single_smurf_account_forms_no_ring() {
        let mut aggregator = RingAggregator::new();

        let mut findings = SmurfingFindings::default();
        findings.push("HUB", PatternLabel::FanOut);
        aggregator.record_smurfing(&findings, 2, 80.0);

        assert_eq!(aggregator.ring_count(), 0);
        let assessment = aggregator.finish();
        assert_eq!(assessment.accounts.len(), 1);
        assert_eq!(assessment.accounts[0].primary_ring(), None);
    }

    #[test]
    fn test_shell_labels() {
        let mut aggregator = RingAggregator::new();

        aggregator.record_shell_chains(&[ShellChain {
            accounts: ids(&["P", "Q", "R", "S"]),
            intermediaries: ids(&["Q", "R"]),
        }]);

        let assessment = aggregator.finish();
        let p = &assessment.accounts[0];
        let q = &assessment.accounts[1];
        assert_eq!(p.account_id, "P");
        assert!(p.patterns.contains(&PatternLabel::LayeredShell));
        assert!(!p.patterns.contains(&PatternLabel::LowActivityIntermediary));
        assert!(q.patterns.contains(&PatternLabel::LowActivityIntermediary));
    }

    #[test]
    fn test_labels_deduplicated() {
        let mut aggregator = RingAggregator::new();

        aggregator.label("X", PatternLabel::HighVelocity);
        aggregator.label("X", PatternLabel::HighVelocity);
        aggregator.label_all(&ids(&["X", "Y"]), PatternLabel::Structuring);

        let assessment = aggregator.finish();
        assert_eq!(assessment.accounts.len(), 2);
        assert_eq!(assessment.accounts[0].patterns.len(), 2);
        assert!(assessment.rings.is_empty());
    }
}
