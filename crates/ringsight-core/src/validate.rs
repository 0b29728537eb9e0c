//! Batch validation: column set, id uniqueness, amount and timestamp parsing.

use std::collections::{BTreeSet, HashMap, HashSet};

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::batch::RawBatch;
use crate::error::{DetectError, DetectResult};
use crate::models::{Transaction, EXPECTED_COLUMNS, TIMESTAMP_FORMAT};

/// Formatted first/last timestamps of a validated batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: String,
    pub end: String,
}

/// Summary statistics returned alongside a validated batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadSummary {
    pub total_transactions: usize,
    pub unique_accounts: usize,
    pub date_range: DateRange,
}

/// Validate a raw batch into transaction records plus a summary.
///
/// Checks, in order: non-empty input, exact column set and order, unique
/// transaction ids, parseable non-negative amounts, strict
/// `YYYY-MM-DD HH:MM:SS` timestamps. Failure messages list up to five
/// offending rows or ids.
pub fn validate_batch(batch: &RawBatch) -> DetectResult<(Vec<Transaction>, UploadSummary)> {
    if batch.is_empty() {
        return Err(DetectError::validation("Input batch is empty"));
    }

    validate_columns(&batch.columns)?;
    validate_unique_ids(batch)?;

    let mut transactions = Vec::with_capacity(batch.rows.len());
    let mut bad_amounts: Vec<usize> = Vec::new();
    let mut bad_timestamps: Vec<(usize, String)> = Vec::new();

    for (row_index, row) in batch.rows.iter().enumerate() {
        if row.len() != EXPECTED_COLUMNS.len() {
            return Err(DetectError::validation(format!(
                "Row {} has {} cells, expected {}",
                row_index,
                row.len(),
                EXPECTED_COLUMNS.len()
            )));
        }

        let amount = match row[3].trim().parse::<Decimal>() {
            Ok(value) if value >= Decimal::ZERO => Some(value),
            _ => {
                bad_amounts.push(row_index);
                None
            }
        };

        let timestamp = match NaiveDateTime::parse_from_str(row[4].trim(), TIMESTAMP_FORMAT) {
            Ok(ts) => Some(ts),
            Err(_) => {
                bad_timestamps.push((row_index, row[4].clone()));
                None
            }
        };

        if let (Some(amount), Some(timestamp)) = (amount, timestamp) {
            transactions.push(Transaction::new(
                row[0].trim(),
                row[1].trim(),
                row[2].trim(),
                amount,
                timestamp,
            ));
        }
    }

    if !bad_amounts.is_empty() {
        let shown: Vec<String> = bad_amounts.iter().take(5).map(|i| i.to_string()).collect();
        return Err(DetectError::validation(format!(
            "Invalid amount values found at rows: [{}]{}. Amount must be a non-negative number",
            shown.join(", "),
            if bad_amounts.len() > 5 { " (showing first 5)" } else { "" }
        )));
    }

    if !bad_timestamps.is_empty() {
        let rows: Vec<String> = bad_timestamps.iter().take(5).map(|(i, _)| i.to_string()).collect();
        let values: Vec<String> = bad_timestamps
            .iter()
            .take(5)
            .map(|(_, v)| format!("'{}'", v))
            .collect();
        return Err(DetectError::validation(format!(
            "Invalid timestamp format at rows [{}]. Examples: [{}]. Required format: YYYY-MM-DD HH:MM:SS",
            rows.join(", "),
            values.join(", ")
        )));
    }

    let summary = summarize(&transactions);
    info!(
        transactions = summary.total_transactions,
        accounts = summary.unique_accounts,
        "batch validated"
    );

    Ok((transactions, summary))
}

fn validate_columns(actual: &[String]) -> DetectResult<()> {
    let expected: Vec<&str> = EXPECTED_COLUMNS.to_vec();
    let actual_refs: Vec<&str> = actual.iter().map(|s| s.as_str()).collect();

    if actual_refs == expected {
        return Ok(());
    }

    let expected_set: HashSet<&str> = expected.iter().copied().collect();
    let actual_set: HashSet<&str> = actual_refs.iter().copied().collect();

    if actual.len() > expected.len() {
        let mut extra: Vec<&str> = actual_set.difference(&expected_set).copied().collect();
        extra.sort_unstable();
        return Err(DetectError::validation(format!(
            "Batch contains extra columns: {:?}. Expected exactly: {:?}",
            extra, expected
        )));
    }

    if actual.len() < expected.len() {
        let mut missing: Vec<&str> = expected_set.difference(&actual_set).copied().collect();
        missing.sort_unstable();
        return Err(DetectError::validation(format!(
            "Batch is missing required columns: {:?}. Expected exactly: {:?}",
            missing, expected
        )));
    }

    if actual_set == expected_set {
        return Err(DetectError::validation(format!(
            "Columns are in wrong order. Expected order: {:?}, but got: {:?}",
            expected, actual_refs
        )));
    }

    Err(DetectError::validation(format!(
        "Column names don't match. Expected: {:?}, but got: {:?}",
        expected, actual_refs
    )))
}

fn validate_unique_ids(batch: &RawBatch) -> DetectResult<()> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for row in &batch.rows {
        if let Some(id) = row.first() {
            *counts.entry(id.as_str()).or_insert(0) += 1;
        }
    }

    // First occurrence order, capped at five ids in the message.
    let mut seen: HashSet<&str> = HashSet::new();
    let mut duplicates: Vec<&str> = Vec::new();
    for row in &batch.rows {
        if let Some(id) = row.first() {
            if counts[id.as_str()] > 1 && seen.insert(id.as_str()) {
                duplicates.push(id.as_str());
            }
        }
    }

    if duplicates.is_empty() {
        return Ok(());
    }

    let shown: Vec<&str> = duplicates.iter().take(5).copied().collect();
    Err(DetectError::validation(format!(
        "Duplicate transaction_id values found: {:?}{}",
        shown,
        if duplicates.len() > 5 { " (showing first 5)" } else { "" }
    )))
}

fn summarize(transactions: &[Transaction]) -> UploadSummary {
    let accounts: BTreeSet<&str> = transactions
        .iter()
        .flat_map(|t| [t.sender.as_str(), t.receiver.as_str()])
        .collect();

    let min_ts = transactions.iter().map(|t| t.timestamp).min();
    let max_ts = transactions.iter().map(|t| t.timestamp).max();
    let format = |ts: Option<NaiveDateTime>| {
        ts.map(|t| t.format(TIMESTAMP_FORMAT).to_string())
            .unwrap_or_default()
    };

    UploadSummary {
        total_transactions: transactions.len(),
        unique_accounts: accounts.len(),
        date_range: DateRange {
            start: format(min_ts),
            end: format(max_ts),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn batch(rows: &[[&str; 5]]) -> RawBatch {
        RawBatch {
            columns: EXPECTED_COLUMNS.iter().map(|c| c.to_string()).collect(),
            rows: rows
                .iter()
                .map(|r| r.iter().map(|c| c.to_string()).collect())
                .collect(),
        }
    }

    #[test]
    fn test_valid_batch() {
        let input = batch(&[
            ["TXN001", "A", "B", "1000.00", "2024-01-01 10:00:00"],
            ["TXN002", "B", "C", "500.00", "2024-01-02 11:30:00"],
        ]);

        let (transactions, summary) = validate_batch(&input).unwrap();

        assert_eq!(transactions.len(), 2);
        assert_eq!(summary.total_transactions, 2);
        assert_eq!(summary.unique_accounts, 3);
        assert_eq!(summary.date_range.start, "2024-01-01 10:00:00");
        assert_eq!(summary.date_range.end, "2024-01-02 11:30:00");
    }

    #[test]
    fn test_empty_batch_fails() {
        let input = batch(&[]);
        assert!(matches!(
            validate_batch(&input),
            Err(DetectError::Validation(_))
        ));
    }

    #[test]
    fn test_wrong_column_order() {
        let mut input = batch(&[["TXN001", "A", "B", "10", "2024-01-01 10:00:00"]]);
        input.columns.swap(1, 2);

        let err = validate_batch(&input).unwrap_err();
        assert!(err.to_string().contains("wrong order"));
    }

    #[test]
    fn test_missing_column() {
        let mut input = batch(&[["TXN001", "A", "B", "10", "2024-01-01 10:00:00"]]);
        input.columns.pop();

        let err = validate_batch(&input).unwrap_err();
        assert!(err.to_string().contains("missing required columns"));
    }

    #[test]
    fn test_duplicate_ids_report_first_five() {
        let rows: Vec<[&str; 5]> = (0..7)
            .map(|_| ["DUP", "A", "B", "10", "2024-01-01 10:00:00"])
            .collect();
        let input = batch(&rows);

        let err = validate_batch(&input).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("Duplicate transaction_id"));
        assert!(message.contains("DUP"));
    }

    #[test]
    fn test_negative_amount_rejected() {
        let input = batch(&[["TXN001", "A", "B", "-5.00", "2024-01-01 10:00:00"]]);
        let err = validate_batch(&input).unwrap_err();
        assert!(err.to_string().contains("Invalid amount"));
    }

    #[test]
    fn test_malformed_timestamp_rejected() {
        let input = batch(&[["TXN001", "A", "B", "5.00", "2024/01/01 10:00"]]);
        let err = validate_batch(&input).unwrap_err();
        assert!(err.to_string().contains("YYYY-MM-DD HH:MM:SS"));
    }
}
