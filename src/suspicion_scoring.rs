//! Composite suspicion scoring
//!
//! Combines an account's pattern labels, ring memberships and money flow into a
//! 0-100 score. Pass-through flow raises the score; merchant-like and payroll-like
//! accounts are suppressed.

use crate::{round_to, PatternLabel};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Scoring weights and suppression rules
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringWeights {
    pub cycle_length_3: f64,
    pub cycle_length_4: f64,
    /// Applies to cycles of five or more accounts
    pub cycle_length_5: f64,
    pub fan_in: f64,
    pub fan_out: f64,
    pub smurfing_source: f64,
    pub layered_shell: f64,
    pub low_activity_intermediary: f64,
    pub high_velocity: f64,
    pub structuring: f64,
    pub round_trip: f64,
    pub dormant_activation: f64,

    /// Added at each tier of distinct-label count
    pub multi_pattern_bonus: f64,
    pub multi_pattern_tiers: Vec<usize>,

    pub ring_bonus_per_ring: f64,
    pub ring_bonus_cap: f64,

    pub pass_through_bonus: f64,
    /// Exclusive bounds on min(sent, received) / max(sent, received)
    pub pass_through_ratio: (f64, f64),
    pub pass_through_min_transactions: usize,

    pub merchant_penalty: f64,
    /// Strictly more transactions than this
    pub merchant_min_transactions: usize,
    pub merchant_min_flow_ratio: f64,

    pub payroll_penalty: f64,
    pub payroll_min_transactions: usize,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            cycle_length_3: 30.0,
            cycle_length_4: 25.0,
            cycle_length_5: 20.0,
            fan_in: 20.0,
            fan_out: 20.0,
            smurfing_source: 10.0,
            layered_shell: 25.0,
            low_activity_intermediary: 15.0,
            high_velocity: 18.0,
            structuring: 22.0,
            round_trip: 20.0,
            dormant_activation: 15.0,
            multi_pattern_bonus: 10.0,
            multi_pattern_tiers: vec![3, 5],
            ring_bonus_per_ring: 5.0,
            ring_bonus_cap: 15.0,
            pass_through_bonus: 8.0,
            pass_through_ratio: (0.6, 0.95),
            pass_through_min_transactions: 3,
            merchant_penalty: 15.0,
            merchant_min_transactions: 20,
            merchant_min_flow_ratio: 0.3,
            payroll_penalty: 20.0,
            payroll_min_transactions: 10,
        }
    }
}

impl ScoringWeights {
    /// Base weight of a single label
    pub fn label_weight(&self, label: PatternLabel) -> f64 {
        match label {
            PatternLabel::CycleLength(n) if n <= 3 => self.cycle_length_3,
            PatternLabel::CycleLength(4) => self.cycle_length_4,
            PatternLabel::CycleLength(_) => self.cycle_length_5,
            PatternLabel::FanIn => self.fan_in,
            PatternLabel::FanOut => self.fan_out,
            PatternLabel::SmurfingSource => self.smurfing_source,
            PatternLabel::LayeredShell => self.layered_shell,
            PatternLabel::LowActivityIntermediary => self.low_activity_intermediary,
            PatternLabel::HighVelocity => self.high_velocity,
            PatternLabel::Structuring => self.structuring,
            PatternLabel::RoundTrip => self.round_trip,
            PatternLabel::DormantActivation => self.dormant_activation,
        }
    }
}

/// Facts about one account that feed its score
#[derive(Debug, Clone, Copy)]
pub struct AccountProfile<'a> {
    pub patterns: &'a BTreeSet<PatternLabel>,
    pub ring_count: usize,
    pub transaction_count: usize,
    pub total_sent: f64,
    pub total_received: f64,
}

impl AccountProfile<'_> {
    fn flow_extremes(&self) -> (f64, f64) {
        (
            self.total_sent.min(self.total_received),
            self.total_sent.max(self.total_received),
        )
    }
}

/// Score components for detailed analysis
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub pattern_score: f64,
    pub multi_pattern_bonus: f64,
    pub ring_bonus: f64,
    pub pass_through_bonus: f64,
    /// Amount actually subtracted after flooring at zero
    pub merchant_suppression: f64,
    pub payroll_suppression: f64,
    pub total_score: f64,
}

/// Suspicion scorer
#[derive(Debug, Clone, Default)]
pub struct SuspicionScorer {
    weights: ScoringWeights,
}

impl SuspicionScorer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_weights(weights: ScoringWeights) -> Self {
        Self { weights }
    }

    pub fn weights(&self) -> &ScoringWeights {
        &self.weights
    }

    /// Final score, clamped to 100 and rounded to one decimal place
    pub fn score(&self, profile: &AccountProfile<'_>) -> f64 {
        self.breakdown(profile).total_score
    }

    /// Calculate every score component
    pub fn breakdown(&self, profile: &AccountProfile<'_>) -> ScoreBreakdown {
        let w = &self.weights;
        let mut breakdown = ScoreBreakdown {
            pattern_score: profile.patterns.iter().map(|l| w.label_weight(*l)).sum(),
            ..Default::default()
        };

        let distinct = profile.patterns.len();
        breakdown.multi_pattern_bonus = w
            .multi_pattern_tiers
            .iter()
            .filter(|tier| distinct >= **tier)
            .count() as f64
            * w.multi_pattern_bonus;

        breakdown.ring_bonus =
            (profile.ring_count as f64 * w.ring_bonus_per_ring).min(w.ring_bonus_cap);

        let (smaller, larger) = profile.flow_extremes();
        if smaller > 0.0 && profile.transaction_count >= w.pass_through_min_transactions {
            let ratio = smaller / larger;
            let (low, high) = w.pass_through_ratio;
            if ratio > low && ratio < high {
                breakdown.pass_through_bonus = w.pass_through_bonus;
            }
        }

        let mut running = breakdown.pattern_score
            + breakdown.multi_pattern_bonus
            + breakdown.ring_bonus
            + breakdown.pass_through_bonus;

        // Two-way flow at volume looks like a merchant
        if profile.transaction_count > w.merchant_min_transactions
            && smaller / larger.max(1.0) > w.merchant_min_flow_ratio
        {
            let reduced = (running - w.merchant_penalty).max(0.0);
            breakdown.merchant_suppression = running - reduced;
            running = reduced;
        }

        // Outgoing-only volume looks like payroll
        if profile.total_received == 0.0 && profile.transaction_count > w.payroll_min_transactions {
            let reduced = (running - w.payroll_penalty).max(0.0);
            breakdown.payroll_suppression = running - reduced;
            running = reduced;
        }

        breakdown.total_score = round_to(running.min(100.0), 1);
        breakdown
    }
}
