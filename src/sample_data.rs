//! Embedded sample dataset
//!
//! One instance of each ring-producing pattern: a three-account cycle, a five-source
//! fan-in into a mule hub that then fans out to three destinations, and a four-account
//! layered shell chain.

use crate::Transaction;
use chrono::{DateTime, Duration, TimeZone, Utc};

fn sample_start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 15, 10, 0, 0).unwrap()
}

/// The sample transactions, in chronological order per pattern
pub fn sample_transactions() -> Vec<Transaction> {
    let start = sample_start();
    let at = |minutes: i64| start + Duration::minutes(minutes);

    let mut transactions = vec![
        // Circular routing
        Transaction::new("TXN_0001", "ACC_001", "ACC_002", 5_000.0, at(0)),
        Transaction::new("TXN_0002", "ACC_002", "ACC_003", 4_800.0, at(120)),
        Transaction::new("TXN_0003", "ACC_003", "ACC_001", 4_600.0, at(240)),
    ];

    // Fan-in from five smurfs
    for i in 0..5 {
        transactions.push(Transaction::new(
            &format!("TXN_{:04}", 4 + i),
            &format!("SMURF_{:02}", i + 1),
            "MULE_HUB",
            900.0 + 20.0 * i as f64,
            at(60 * (i + 1)),
        ));
    }

    // Fan-out to three destinations
    for i in 0..3 {
        transactions.push(Transaction::new(
            &format!("TXN_{:04}", 9 + i),
            "MULE_HUB",
            &format!("DEST_{:02}", i + 1),
            1_400.0,
            at(24 * 60 + 60 * i),
        ));
    }

    // Layered shell chain
    transactions.extend([
        Transaction::new("TXN_0012", "SHELL_SRC", "SHELL_A", 20_000.0, at(48 * 60)),
        Transaction::new("TXN_0013", "SHELL_A", "SHELL_B", 19_500.0, at(49 * 60)),
        Transaction::new("TXN_0014", "SHELL_B", "SHELL_DST", 19_000.0, at(50 * 60)),
    ]);

    transactions
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_sample_shape() {
        let transactions = sample_transactions();
        assert_eq!(transactions.len(), 14);

        let ids: HashSet<&str> = transactions
            .iter()
            .map(|t| t.transaction_id.as_str())
            .collect();
        assert_eq!(ids.len(), transactions.len());
        assert!(transactions.iter().all(|t| t.amount > 0.0));
        assert_eq!(
            transactions[0].timestamp,
            Utc.with_ymd_and_hms(2024, 1, 15, 10, 0, 0).unwrap()
        );
    }
}
