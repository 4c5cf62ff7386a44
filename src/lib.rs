//! # Rust AML Network Analyzer
//!
//! A memory-safe transaction-graph analyzer that flags accounts and account
//! groups exhibiting money-laundering behaviour.
//!
//! ## Features
//!
//! - **Graph Construction**: Directed sender → receiver adjacency with per-account aggregates
//! - **Circular Routing**: Simple cycles of 3-5 accounts
//! - **Smurfing**: Fan-in / fan-out bursts inside a 72 hour window
//! - **Layered Shells**: Chains routed through low-activity pass-through accounts
//! - **Behavioural Checks**: Velocity bursts, threshold structuring, round trips, dormant reactivation
//! - **Suspicion Scoring**: Composite 0-100 score with merchant and payroll suppression
//! - **Fraud Rings**: Named ring records with a per-account membership index
//!
//! The analysis core is batch-only and pure: [`TransactionAnalyzer::analyze`] takes a
//! validated transaction set and always returns an [`AnalysisResult`].

pub mod config;
pub mod fraud_patterns;
#[cfg(feature = "ingest")]
pub mod ingest;
pub mod network_analysis;
pub mod report;
pub mod rings;
pub mod sample_data;
pub mod suspicion_scoring;

pub use config::{ConfigError, DetectionConfig};
#[cfg(feature = "ingest")]
pub use ingest::{IngestError, IngestReport, RejectedRow, RowError};
pub use network_analysis::{AccountStats, GraphStats, ShellChain, TransactionGraph};
pub use report::GraphView;
pub use rings::{FlaggedAccount, RingAggregator, RingAssessment};
pub use suspicion_scoring::{AccountProfile, ScoreBreakdown, ScoringWeights, SuspicionScorer};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, info};

/// Opaque account identifier
pub type AccountId = String;

/// Ring id given to flagged accounts that belong to no ring
pub const STANDALONE: &str = "STANDALONE";

/// Transaction structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub transaction_id: String,
    pub sender_id: AccountId,
    pub receiver_id: AccountId,
    pub amount: f64,
    pub timestamp: DateTime<Utc>,
}

impl Transaction {
    pub fn new(
        transaction_id: &str,
        sender_id: &str,
        receiver_id: &str,
        amount: f64,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            transaction_id: transaction_id.to_string(),
            sender_id: sender_id.to_string(),
            receiver_id: receiver_id.to_string(),
            amount,
            timestamp,
        }
    }
}

/// Behavioural pattern attached to an account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PatternLabel {
    /// Member of a cycle with this many accounts
    CycleLength(usize),
    FanIn,
    FanOut,
    SmurfingSource,
    LayeredShell,
    LowActivityIntermediary,
    HighVelocity,
    Structuring,
    RoundTrip,
    DormantActivation,
}

impl fmt::Display for PatternLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PatternLabel::CycleLength(n) => write!(f, "cycle_length_{}", n),
            PatternLabel::FanIn => write!(f, "fan_in"),
            PatternLabel::FanOut => write!(f, "fan_out"),
            PatternLabel::SmurfingSource => write!(f, "smurfing_source"),
            PatternLabel::LayeredShell => write!(f, "layered_shell"),
            PatternLabel::LowActivityIntermediary => write!(f, "low_activity_intermediary"),
            PatternLabel::HighVelocity => write!(f, "high_velocity"),
            PatternLabel::Structuring => write!(f, "structuring"),
            PatternLabel::RoundTrip => write!(f, "round_trip"),
            PatternLabel::DormantActivation => write!(f, "dormant_activation"),
        }
    }
}

/// Unrecognised pattern label
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown pattern label: {0}")]
pub struct UnknownPattern(pub String);

impl FromStr for PatternLabel {
    type Err = UnknownPattern;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(length) = s.strip_prefix("cycle_length_") {
            return length
                .parse()
                .map(PatternLabel::CycleLength)
                .map_err(|_| UnknownPattern(s.to_string()));
        }

        match s {
            "fan_in" => Ok(PatternLabel::FanIn),
            "fan_out" => Ok(PatternLabel::FanOut),
            "smurfing_source" => Ok(PatternLabel::SmurfingSource),
            "layered_shell" => Ok(PatternLabel::LayeredShell),
            "low_activity_intermediary" => Ok(PatternLabel::LowActivityIntermediary),
            "high_velocity" => Ok(PatternLabel::HighVelocity),
            "structuring" => Ok(PatternLabel::Structuring),
            "round_trip" => Ok(PatternLabel::RoundTrip),
            "dormant_activation" => Ok(PatternLabel::DormantActivation),
            _ => Err(UnknownPattern(s.to_string())),
        }
    }
}

impl Serialize for PatternLabel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for PatternLabel {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Detector that produced a fraud ring
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum RingPatternType {
    Cycle,
    Smurfing,
    LayeredShell,
}

impl fmt::Display for RingPatternType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RingPatternType::Cycle => write!(f, "cycle"),
            RingPatternType::Smurfing => write!(f, "smurfing"),
            RingPatternType::LayeredShell => write!(f, "layered_shell"),
        }
    }
}

/// Group of accounts acting together
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FraudRing {
    pub ring_id: String,
    /// Order is detector-significant (cycle or chain order)
    pub member_accounts: Vec<AccountId>,
    pub pattern_type: RingPatternType,
    pub risk_score: f64,
}

/// Account retained in the analysis output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuspiciousAccount {
    pub account_id: AccountId,
    pub suspicion_score: f64,
    pub detected_patterns: Vec<PatternLabel>,
    /// First ring the account joined, or [`STANDALONE`]
    pub ring_id: String,
}

impl SuspiciousAccount {
    pub fn has_pattern(&self, label: PatternLabel) -> bool {
        self.detected_patterns.contains(&label)
    }

    pub fn is_standalone(&self) -> bool {
        self.ring_id == STANDALONE
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisSummary {
    pub total_accounts_analyzed: usize,
    pub suspicious_accounts_flagged: usize,
    pub fraud_rings_detected: usize,
    pub total_transactions: usize,
    pub processing_time_seconds: f64,
}

/// Output of one analysis run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Sorted by suspicion score, highest first
    pub suspicious_accounts: Vec<SuspiciousAccount>,
    pub fraud_rings: Vec<FraudRing>,
    pub summary: AnalysisSummary,
}

impl AnalysisResult {
    /// Check if any suspicious patterns were found
    pub fn has_suspicious_activity(&self) -> bool {
        !self.suspicious_accounts.is_empty() || !self.fraud_rings.is_empty()
    }

    pub fn account(&self, account_id: &str) -> Option<&SuspiciousAccount> {
        self.suspicious_accounts
            .iter()
            .find(|a| a.account_id == account_id)
    }

    pub fn ring(&self, ring_id: &str) -> Option<&FraudRing> {
        self.fraud_rings.iter().find(|r| r.ring_id == ring_id)
    }

    pub fn rings_of_type(&self, pattern_type: RingPatternType) -> impl Iterator<Item = &FraudRing> {
        self.fraud_rings
            .iter()
            .filter(move |r| r.pattern_type == pattern_type)
    }

    /// Export as JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Round to a fixed number of decimal places
pub(crate) fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Transaction-graph analyzer running every detector over a batch
#[derive(Debug, Clone, Default)]
pub struct TransactionAnalyzer {
    config: DetectionConfig,
    scorer: SuspicionScorer,
}

impl TransactionAnalyzer {
    /// Create an analyzer with default thresholds and weights
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an analyzer with custom thresholds
    pub fn with_config(config: DetectionConfig) -> Self {
        Self {
            config,
            scorer: SuspicionScorer::default(),
        }
    }

    /// Replace the scoring weights
    pub fn with_weights(mut self, weights: ScoringWeights) -> Self {
        self.scorer = SuspicionScorer::with_weights(weights);
        self
    }

    pub fn config(&self) -> &DetectionConfig {
        &self.config
    }

    /// Run the full analysis over a transaction set
    pub fn analyze(&self, transactions: &[Transaction]) -> AnalysisResult {
        let started = Instant::now();
        let config = &self.config;

        let graph = TransactionGraph::build(transactions);
        let mut aggregator = RingAggregator::new();

        // Ring-producing detectors run in a fixed order: ring ids depend on it
        let cycles = network_analysis::detect_cycles(
            &graph,
            config.cycle_min_length,
            config.cycle_max_length,
        );
        debug!(cycles = cycles.len(), "cycle detection complete");
        aggregator.record_cycles(&cycles);

        let smurfing = fraud_patterns::detect_smurfing(transactions, config);
        debug!(hits = smurfing.hits().len(), "smurfing detection complete");
        aggregator.record_smurfing(
            &smurfing,
            config.smurfing_min_ring_members,
            config.smurfing_ring_risk,
        );

        let shells = network_analysis::detect_shell_chains(
            &graph,
            config.shell_min_length,
            config.shell_max_length,
            config.shell_max_intermediary_transactions,
        );
        debug!(chains = shells.len(), "layered shell detection complete");
        aggregator.record_shell_chains(&shells);

        let standalone = [
            (
                PatternLabel::HighVelocity,
                fraud_patterns::detect_high_velocity(transactions, config),
            ),
            (
                PatternLabel::Structuring,
                fraud_patterns::detect_structuring(transactions, config),
            ),
            (
                PatternLabel::RoundTrip,
                fraud_patterns::detect_round_trips(transactions, config),
            ),
            (
                PatternLabel::DormantActivation,
                fraud_patterns::detect_dormant_activation(transactions, config),
            ),
        ];
        for (label, accounts) in &standalone {
            debug!(pattern = %label, accounts = accounts.len(), "behavioural detection complete");
            aggregator.label_all(accounts, *label);
        }

        let assessment = aggregator.finish();
        let mut suspicious_accounts: Vec<SuspiciousAccount> = assessment
            .accounts
            .iter()
            .filter_map(|flagged| self.assess_account(&graph, flagged))
            .collect();

        // Stable: ties keep encounter order
        suspicious_accounts.sort_by(|a, b| b.suspicion_score.total_cmp(&a.suspicion_score));

        let summary = AnalysisSummary {
            total_accounts_analyzed: graph.accounts().len(),
            suspicious_accounts_flagged: suspicious_accounts.len(),
            fraud_rings_detected: assessment.rings.len(),
            total_transactions: transactions.len(),
            processing_time_seconds: round_to(started.elapsed().as_secs_f64(), 3),
        };

        info!(
            accounts = summary.total_accounts_analyzed,
            flagged = summary.suspicious_accounts_flagged,
            rings = summary.fraud_rings_detected,
            seconds = summary.processing_time_seconds,
            "transaction analysis complete"
        );

        AnalysisResult {
            suspicious_accounts,
            fraud_rings: assessment.rings,
            summary,
        }
    }

    /// Score one flagged account, dropping it below the retention threshold
    fn assess_account(
        &self,
        graph: &TransactionGraph,
        flagged: &FlaggedAccount,
    ) -> Option<SuspiciousAccount> {
        let stats = graph.account_stats(&flagged.account_id)?;
        let profile = AccountProfile {
            patterns: &flagged.patterns,
            ring_count: flagged.ring_ids.len(),
            transaction_count: stats.transaction_count,
            total_sent: stats.total_sent,
            total_received: stats.total_received,
        };
        let suspicion_score = self.scorer.score(&profile);

        if suspicion_score < self.config.min_suspicion_score {
            debug!(account = %flagged.account_id, score = suspicion_score, "below retention threshold");
            return None;
        }

        Some(SuspiciousAccount {
            account_id: flagged.account_id.clone(),
            suspicion_score,
            detected_patterns: flagged.patterns.iter().copied().collect(),
            ring_id: flagged
                .primary_ring()
                .unwrap_or(STANDALONE)
                .to_string(),
        })
    }
}
