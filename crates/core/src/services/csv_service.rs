use log::{debug, warn};
use std::borrow::Borrow;

use crate::errors::CoreError;
use crate::models::date_key::DateKey;
use crate::models::observation::{validate_value, Observation};

/// Header line written by [`CsvService::serialize`].
pub const CSV_HEADER: [&str; 2] = ["date", "generation_gwh"];

/// How many row errors a UI should show before truncating the list.
pub const MAX_DISPLAYED_ERRORS: usize = 12;

/// Result of a best-effort CSV parse: every valid row plus a message per rejected row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParseOutcome {
    pub records: Vec<Observation>,
    pub errors: Vec<String>,
}

impl ParseOutcome {
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// The first [`MAX_DISPLAYED_ERRORS`] row errors.
    pub fn displayed_errors(&self) -> &[String] {
        &self.errors[..self.errors.len().min(MAX_DISPLAYED_ERRORS)]
    }
}

/// Reads and writes the `date,generation_gwh` CSV format.
///
/// Input dates may be `DD-MM-YYYY` or `YYYY-MM-DD`; output is always `DD-MM-YYYY`.
/// Quoted fields are honored, so `"4,140"` arrives as a single value column
/// whose thousands separators are then stripped.
pub struct CsvService;

impl CsvService {
    pub fn new() -> Self {
        Self
    }

    /// Parse raw CSV text. Never aborts on a bad row.
    ///
    /// The text is split into lines first and each trimmed, non-empty line is
    /// tokenised on its own, so a stray quote can only damage its own row.
    /// Rows with fewer than two columns are skipped silently. The first
    /// remaining row is dropped as a header when it names a date column and a
    /// generation (`gen` / `gwh`) column. Row numbers in error messages are
    /// 1-based over the rows left after that.
    pub fn parse(&self, text: &str) -> ParseOutcome {
        let mut rows: Vec<Vec<String>> = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(split_fields)
            .filter(|fields| fields.len() >= 2)
            .collect();

        if rows.first().is_some_and(|row| is_header(row)) {
            rows.remove(0);
        }

        let mut outcome = ParseOutcome::default();
        for (idx, row) in rows.iter().enumerate() {
            let row_number = idx + 1;
            let raw_date = row[0].as_str();
            let raw_value = row[1].as_str();

            let date = match DateKey::parse_flexible(raw_date) {
                Ok(date) => date,
                Err(_) => {
                    outcome.errors.push(format!(
                        "Row {row_number}: invalid date '{raw_date}' (expected DD-MM-YYYY)"
                    ));
                    continue;
                }
            };

            match parse_value(raw_value) {
                Some(value) => outcome.records.push(Observation::new(date, value)),
                None => outcome.errors.push(format!(
                    "Row {row_number}: invalid generation '{raw_value}' (expected non-negative number)"
                )),
            }
        }

        debug!(
            "parsed CSV: {} records, {} errors",
            outcome.records.len(),
            outcome.errors.len()
        );
        outcome
    }

    /// Write records as CSV, in the order given (callers pass ascending dates).
    pub fn serialize<I>(&self, records: I) -> Result<String, CoreError>
    where
        I: IntoIterator,
        I::Item: Borrow<Observation>,
    {
        let mut writer = csv::WriterBuilder::new()
            .terminator(csv::Terminator::Any(b'\n'))
            .from_writer(Vec::new());

        writer.write_record(CSV_HEADER)?;
        for record in records {
            let record = record.borrow();
            writer.write_record([record.date.to_display(), record.value.to_string()])?;
        }

        let bytes = writer
            .into_inner()
            .map_err(|e| CoreError::Serialization(format!("Failed to flush CSV: {}", e.error())))?;
        String::from_utf8(bytes)
            .map_err(|e| CoreError::Serialization(format!("CSV output is not UTF-8: {e}")))
    }

    /// Download file name for an export made on `today`.
    pub fn export_filename(&self, today: DateKey) -> String {
        format!("india_generation_{}.csv", today.to_iso())
    }
}

impl Default for CsvService {
    fn default() -> Self {
        Self::new()
    }
}

/// Split one line into trimmed fields.
///
/// Lines with balanced quotes go through the CSV reader so `"4,140"` stays one
/// field. A line with an unbalanced quote is split on every comma as-is.
fn split_fields(line: &str) -> Vec<String> {
    if line.matches('"').count() % 2 == 0 {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(line.as_bytes());
        match reader.records().next() {
            Some(Ok(record)) => return record.iter().map(str::to_string).collect(),
            Some(Err(e)) => warn!("falling back to plain split for CSV line: {e}"),
            None => return Vec::new(),
        }
    }
    line.split(',').map(|field| field.trim().to_string()).collect()
}

fn is_header(row: &[String]) -> bool {
    let first = row.first().map(|f| f.to_lowercase()).unwrap_or_default();
    let second = row.get(1).map(|f| f.to_lowercase()).unwrap_or_default();
    first.contains("date") && (second.contains("gen") || second.contains("gwh"))
}

/// Parse a generation value, ignoring thousands separators.
fn parse_value(raw: &str) -> Option<f64> {
    let cleaned = raw.replace(',', "");
    let value: f64 = cleaned.trim().parse().ok()?;
    validate_value(value).ok()?;
    Some(value)
}
