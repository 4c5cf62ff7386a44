use chrono::{DateTime, Duration, TimeZone, Utc};
use rust_aml_network_analyzer::sample_data::sample_transactions;
use rust_aml_network_analyzer::{
    AccountProfile, DetectionConfig, PatternLabel, RingPatternType, SuspicionScorer, Transaction,
    TransactionAnalyzer, STANDALONE,
};
use std::collections::BTreeSet;

fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 3, 8, 0, 0).unwrap()
}

fn tx(id: &str, from: &str, to: &str, amount: f64, minutes: i64) -> Transaction {
    Transaction::new(id, from, to, amount, base_time() + Duration::minutes(minutes))
}

#[test]
fn test_sample_dataset_end_to_end() {
    let result = TransactionAnalyzer::new().analyze(&sample_transactions());

    assert_eq!(result.rings_of_type(RingPatternType::Cycle).count(), 1);
    assert_eq!(result.rings_of_type(RingPatternType::Smurfing).count(), 1);
    assert_eq!(result.rings_of_type(RingPatternType::LayeredShell).count(), 1);
    assert_eq!(result.summary.fraud_rings_detected, 3);
    assert_eq!(result.summary.total_accounts_analyzed, 16);
    assert_eq!(result.summary.total_transactions, 14);

    assert!(!result.suspicious_accounts.is_empty());
    assert_eq!(
        result.summary.suspicious_accounts_flagged,
        result.suspicious_accounts.len()
    );
    for pair in result.suspicious_accounts.windows(2) {
        assert!(pair[0].suspicion_score >= pair[1].suspicion_score);
    }

    let top = &result.suspicious_accounts[0];
    assert_eq!(top.account_id, "MULE_HUB");
    assert_eq!(top.suspicion_score, 53.0);
    assert_eq!(top.detected_patterns, vec![PatternLabel::FanIn, PatternLabel::FanOut]);
    assert_eq!(top.ring_id, "RING_002");

    // Destinations of the fan-out carry no pattern of their own
    assert!(result.account("DEST_01").is_none());
}

#[test]
fn test_sample_ring_numbering_follows_detector_order() {
    let result = TransactionAnalyzer::new().analyze(&sample_transactions());

    let summary: Vec<(&str, RingPatternType)> = result
        .fraud_rings
        .iter()
        .map(|r| (r.ring_id.as_str(), r.pattern_type))
        .collect();
    assert_eq!(
        summary,
        vec![
            ("RING_001", RingPatternType::Cycle),
            ("RING_002", RingPatternType::Smurfing),
            ("RING_003", RingPatternType::LayeredShell),
        ]
    );

    let smurfing = result.ring("RING_002").unwrap();
    assert_eq!(smurfing.member_accounts.len(), 6);
    assert_eq!(smurfing.risk_score, 80.0);
}

#[test]
fn test_fan_in_from_five_senders() {
    let senders = ["S1", "S2", "S3", "S4", "S5"];
    let transactions: Vec<Transaction> = senders
        .iter()
        .enumerate()
        .map(|(i, sender)| tx(&format!("T{}", i), sender, "HUB", 700.0, 600 * i as i64))
        .collect();

    let result = TransactionAnalyzer::new().analyze(&transactions);

    let hub = result.account("HUB").unwrap();
    assert!(hub.has_pattern(PatternLabel::FanIn));
    for sender in senders {
        let account = result.account(sender).unwrap();
        assert!(account.has_pattern(PatternLabel::SmurfingSource));
        assert_eq!(account.ring_id, "RING_001");
    }
}

#[test]
fn test_layered_shell_ring() {
    let transactions = vec![
        tx("T1", "A", "B", 15_000.0, 0),
        tx("T2", "B", "C", 14_700.0, 90),
        tx("T3", "C", "D", 14_400.0, 180),
    ];

    let result = TransactionAnalyzer::new().analyze(&transactions);

    let ring = result.rings_of_type(RingPatternType::LayeredShell).next().unwrap();
    assert_eq!(ring.member_accounts, vec!["A", "B", "C", "D"]);
    assert_eq!(ring.risk_score, 87.0);

    let b = result.account("B").unwrap();
    assert!(b.has_pattern(PatternLabel::LowActivityIntermediary));
    assert!(!result
        .account("A")
        .unwrap()
        .has_pattern(PatternLabel::LowActivityIntermediary));
}

#[test]
fn test_velocity_window_boundary() {
    let burst: Vec<Transaction> = (0..4)
        .map(|i| tx(&format!("T{}", i), "X", &format!("R{}", i), 250.0, [0, 8, 17, 25][i]))
        .collect();
    let spread: Vec<Transaction> = (0..4)
        .map(|i| tx(&format!("T{}", i), "X", &format!("R{}", i), 250.0, [0, 13, 27, 40][i]))
        .collect();

    let analyzer = TransactionAnalyzer::new();

    let flagged = analyzer.analyze(&burst);
    assert!(flagged.account("X").unwrap().has_pattern(PatternLabel::HighVelocity));

    let quiet = analyzer.analyze(&spread);
    assert!(!quiet
        .account("X")
        .map_or(false, |a| a.has_pattern(PatternLabel::HighVelocity)));
}

#[test]
fn test_analysis_is_idempotent() {
    let transactions = sample_transactions();
    let analyzer = TransactionAnalyzer::new();

    let first = analyzer.analyze(&transactions);
    let second = analyzer.analyze(&transactions);

    assert_eq!(first.suspicious_accounts, second.suspicious_accounts);
    assert_eq!(first.fraud_rings, second.fraud_rings);
}

#[test]
fn test_payroll_like_sender_is_suppressed() {
    let transactions: Vec<Transaction> = (0..15)
        .map(|i| tx(&format!("P{}", i), "EMPLOYER", &format!("EMP_{:02}", i), 3_200.0, i))
        .collect();

    let result = TransactionAnalyzer::new().analyze(&transactions);

    // fan_out 20 + high_velocity 18, less the payroll penalty
    let employer = result.account("EMPLOYER").unwrap();
    assert_eq!(employer.suspicion_score, 18.0);
    assert_eq!(employer.ring_id, STANDALONE);
}

#[test]
fn test_merchant_like_account_is_suppressed() {
    let scorer = SuspicionScorer::new();
    let patterns: BTreeSet<PatternLabel> = [PatternLabel::FanIn, PatternLabel::HighVelocity]
        .into_iter()
        .collect();

    let merchant = AccountProfile {
        patterns: &patterns,
        ring_count: 0,
        transaction_count: 25,
        total_sent: 5_000.0,
        total_received: 10_000.0,
    };

    assert_eq!(scorer.score(&merchant), 23.0);
}

#[test]
fn test_custom_config_disables_short_cycles() {
    let config = DetectionConfig {
        cycle_min_length: 4,
        ..Default::default()
    };
    let result = TransactionAnalyzer::with_config(config).analyze(&sample_transactions());

    assert_eq!(result.rings_of_type(RingPatternType::Cycle).count(), 0);
    assert_eq!(result.ring("RING_001").unwrap().pattern_type, RingPatternType::Smurfing);
}

#[cfg(feature = "ingest")]
#[test]
fn test_csv_file_matches_in_memory_analysis() {
    use rust_aml_network_analyzer::ingest::load_csv_file;
    use std::io::Write;

    let transactions = sample_transactions();
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "transaction_id,sender_id,receiver_id,amount,timestamp").unwrap();
    for t in &transactions {
        writeln!(
            file,
            "{},{},{},{},{}",
            t.transaction_id,
            t.sender_id,
            t.receiver_id,
            t.amount,
            t.timestamp.format("%Y-%m-%d %H:%M:%S")
        )
        .unwrap();
    }

    let report = load_csv_file(file.path()).unwrap();
    assert!(report.rejected.is_empty());
    assert_eq!(report.transactions, transactions);

    let analyzer = TransactionAnalyzer::new();
    assert_eq!(
        analyzer.analyze(&report.transactions).fraud_rings,
        analyzer.analyze(&transactions).fraud_rings
    );
}
