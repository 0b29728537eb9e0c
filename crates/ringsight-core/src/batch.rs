//! Raw, pre-validation batch shape and the CSV ingestion seam.

use std::io::Read;

use crate::error::DetectResult;

/// An unvalidated batch exactly as it arrived: a header row and positional
/// data rows. The validator checks the header against the expected column
/// set before interpreting any cell.
#[derive(Debug, Clone, Default)]
pub struct RawBatch {
    /// Header cells in file order.
    pub columns: Vec<String>,
    /// Data rows; each row's cells align positionally with `columns`.
    pub rows: Vec<Vec<String>>,
}

impl RawBatch {
    /// Read a batch from CSV in the canonical wire format
    /// (`transaction_id,sender_id,receiver_id,amount,timestamp`, UTF-8).
    pub fn from_csv_reader<R: Read>(reader: R) -> DetectResult<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let columns = csv_reader
            .headers()?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();

        let mut rows = Vec::new();
        for record in csv_reader.records() {
            let record = record?;
            rows.push(record.iter().map(|cell| cell.to_string()).collect());
        }

        Ok(Self { columns, rows })
    }

    /// Number of data rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the batch holds no data rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
