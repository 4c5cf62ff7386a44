//! Transaction import
//!
//! Maps raw CSV or JSON rows to validated [`Transaction`]s. Invalid rows are
//! dropped and reported; an import with no valid rows left is an error.

use crate::Transaction;
use chrono::{DateTime, NaiveDateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use tracing::{info, warn};

/// Columns every CSV import must carry
pub const REQUIRED_COLUMNS: [&str; 5] = [
    "transaction_id",
    "sender_id",
    "receiver_id",
    "amount",
    "timestamp",
];

const NAIVE_TIMESTAMP_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

/// Import errors
#[derive(Error, Debug)]
pub enum IngestError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid field pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("Missing required column: {0}")]
    MissingColumn(String),

    #[error("No usable data: {rows_rejected} of {rows_read} rows rejected")]
    NoUsableData { rows_read: usize, rows_rejected: usize },
}

/// Why a single row was dropped
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RowError {
    #[error("Empty field: {0}")]
    EmptyField(String),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Amount must be positive, got {0}")]
    NonPositiveAmount(f64),

    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),

    #[error("Expected {expected} columns, found {found}")]
    ColumnCount { expected: usize, found: usize },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RejectedRow {
    /// 1-based line number for CSV, 1-based array position for JSON
    pub line: usize,
    pub reason: RowError,
}

/// Outcome of an import that kept at least one row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestReport {
    pub transactions: Vec<Transaction>,
    pub rejected: Vec<RejectedRow>,
    pub rows_read: usize,
}

impl IngestReport {
    fn finish(transactions: Vec<Transaction>, rejected: Vec<RejectedRow>) -> Result<Self, IngestError> {
        let rows_read = transactions.len() + rejected.len();
        if transactions.is_empty() {
            return Err(IngestError::NoUsableData {
                rows_read,
                rows_rejected: rejected.len(),
            });
        }

        info!(
            accepted = transactions.len(),
            rejected = rejected.len(),
            "transaction import complete"
        );
        Ok(Self {
            transactions,
            rejected,
            rows_read,
        })
    }
}

/// Amount as it arrives: JSON exports carry numbers or strings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawAmount {
    Number(f64),
    Text(String),
}

/// Unvalidated transaction row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawTransactionRow {
    #[serde(default)]
    pub transaction_id: String,
    #[serde(default)]
    pub sender_id: String,
    #[serde(default)]
    pub receiver_id: String,
    pub amount: Option<RawAmount>,
    #[serde(default)]
    pub timestamp: String,
}

impl RawTransactionRow {
    /// Validate into a transaction
    pub fn validate(&self) -> Result<Transaction, RowError> {
        let transaction_id = required(&self.transaction_id, "transaction_id")?;
        let sender_id = required(&self.sender_id, "sender_id")?;
        let receiver_id = required(&self.receiver_id, "receiver_id")?;

        let amount = match &self.amount {
            Some(RawAmount::Number(value)) => *value,
            Some(RawAmount::Text(text)) => text
                .trim()
                .parse::<f64>()
                .map_err(|_| RowError::InvalidAmount(text.clone()))?,
            None => return Err(RowError::EmptyField("amount".to_string())),
        };
        if !amount.is_finite() {
            return Err(RowError::InvalidAmount(amount.to_string()));
        }
        if amount <= 0.0 {
            return Err(RowError::NonPositiveAmount(amount));
        }

        let timestamp = parse_timestamp(&self.timestamp)?;

        Ok(Transaction::new(transaction_id, sender_id, receiver_id, amount, timestamp))
    }
}

fn required<'a>(value: &'a str, field: &str) -> Result<&'a str, RowError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(RowError::EmptyField(field.to_string()))
    } else {
        Ok(trimmed)
    }
}

/// Parse RFC 3339 or a naive `YYYY-MM-DD HH:MM:SS` timestamp taken as UTC
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, RowError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(RowError::EmptyField("timestamp".to_string()));
    }

    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Ok(parsed.with_timezone(&Utc));
    }

    NAIVE_TIMESTAMP_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .map(|naive| DateTime::from_naive_utc_and_offset(naive, Utc))
        .ok_or_else(|| RowError::InvalidTimestamp(raw.to_string()))
}

/// Split one CSV line, honouring double-quoted fields
fn split_fields(field_pattern: &Regex, line: &str) -> Vec<String> {
    // Every field match starts at its leading comma
    let line = format!(",{}", line);
    field_pattern
        .captures_iter(&line)
        .map(|caps| match (caps.get(1), caps.get(2)) {
            (Some(quoted), _) => quoted.as_str().replace("\"\"", "\""),
            (None, Some(bare)) => bare.as_str().trim().to_string(),
            (None, None) => String::new(),
        })
        .collect()
}

/// Parse CSV text with a header row
pub fn parse_csv(input: &str) -> Result<IngestReport, IngestError> {
    let field_pattern = Regex::new(r#",(?:\s*"((?:[^"]|"")*)"\s*|([^,]*))"#)?;

    let mut lines = input
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty());

    let Some((_, header_line)) = lines.next() else {
        return Err(IngestError::NoUsableData {
            rows_read: 0,
            rows_rejected: 0,
        });
    };

    let header: Vec<String> = split_fields(&field_pattern, header_line.trim_start_matches('\u{feff}'))
        .into_iter()
        .map(|h| h.trim().to_lowercase())
        .collect();
    let mut columns = [0usize; 5];
    for (slot, name) in columns.iter_mut().zip(REQUIRED_COLUMNS) {
        *slot = header
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| IngestError::MissingColumn(name.to_string()))?;
    }

    let mut transactions = Vec::new();
    let mut rejected = Vec::new();

    for (index, line) in lines {
        let line_number = index + 1;
        let fields = split_fields(&field_pattern, line);

        let row = if fields.len() < header.len() {
            Err(RowError::ColumnCount {
                expected: header.len(),
                found: fields.len(),
            })
        } else {
            let field = |i: usize| fields[columns[i]].clone();
            RawTransactionRow {
                transaction_id: field(0),
                sender_id: field(1),
                receiver_id: field(2),
                amount: Some(RawAmount::Text(field(3))),
                timestamp: field(4),
            }
            .validate()
        };

        match row {
            Ok(transaction) => transactions.push(transaction),
            Err(reason) => {
                warn!(line = line_number, %reason, "dropping invalid row");
                rejected.push(RejectedRow {
                    line: line_number,
                    reason,
                });
            }
        }
    }

    IngestReport::finish(transactions, rejected)
}

/// Parse a JSON array of raw rows
pub fn parse_json(input: &str) -> Result<IngestReport, IngestError> {
    let rows: Vec<RawTransactionRow> = serde_json::from_str(input)?;

    let mut transactions = Vec::new();
    let mut rejected = Vec::new();
    for (index, row) in rows.iter().enumerate() {
        match row.validate() {
            Ok(transaction) => transactions.push(transaction),
            Err(reason) => {
                warn!(row = index + 1, %reason, "dropping invalid row");
                rejected.push(RejectedRow {
                    line: index + 1,
                    reason,
                });
            }
        }
    }

    IngestReport::finish(transactions, rejected)
}

pub fn load_csv_file(path: impl AsRef<Path>) -> Result<IngestReport, IngestError> {
    parse_csv(&std::fs::read_to_string(path)?)
}

pub fn load_json_file(path: impl AsRef<Path>) -> Result<IngestReport, IngestError> {
    parse_json(&std::fs::read_to_string(path)?)
}
