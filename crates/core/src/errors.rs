use thiserror::Error;

/// Unified error type for the entire generation-tracker-core library.
/// Every fallible public function returns `Result<T, CoreError>`.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Input validation ────────────────────────────────────────────
    #[error("Invalid date format: '{0}'")]
    InvalidFormat(String),

    #[error("Invalid value: {0} (expected a finite, non-negative number)")]
    InvalidValue(f64),

    // ── Queries ─────────────────────────────────────────────────────
    #[error("No data to aggregate: {0}")]
    NoData(String),

    // ── Storage / File ──────────────────────────────────────────────
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),

    // ── File I/O (native only) ──────────────────────────────────────
    #[error("File I/O error: {0}")]
    FileIO(String),
}

// ── Conversion helpers (From impls) ─────────────────────────────────

impl From<std::io::Error> for CoreError {
    fn from(e: std::io::Error) -> Self {
        CoreError::FileIO(e.to_string())
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(e: serde_json::Error) -> Self {
        CoreError::Deserialization(e.to_string())
    }
}

impl From<csv::Error> for CoreError {
    fn from(e: csv::Error) -> Self {
        CoreError::Serialization(e.to_string())
    }
}
