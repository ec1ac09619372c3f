pub mod errors;
pub mod models;
pub mod services;
pub mod storage;

use log::info;
use models::{
    chart::{AggregatedPoint, Frequency, MonthlyRecord},
    date_key::DateKey,
    observation::{Observation, ObservationStore},
    settings::{clamp_range_days, AggregationQuery, Settings},
};
use services::{
    aggregation_service::AggregationService, csv_service::CsvService,
    store_service::StoreService,
};
use storage::backend::BlobStore;
use storage::manager::StorageManager;

use errors::CoreError;

/// Outcome of a CSV import: how many rows were merged, and why the others were rejected.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImportReport {
    pub imported: usize,
    pub errors: Vec<String>,
}

/// Main entry point for the Generation Tracker core library.
/// Holds the observation store, its persistence backend, and all services
/// needed to operate on it.
///
/// Every successful mutation re-serializes the whole store to the backend
/// before it becomes visible; if saving fails the tracker keeps its prior state.
#[must_use]
pub struct GenerationTracker<B: BlobStore> {
    store: ObservationStore,
    backend: B,
    settings: Settings,
    store_service: StoreService,
    csv_service: CsvService,
    aggregation_service: AggregationService,
}

impl<B: BlobStore> std::fmt::Debug for GenerationTracker<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenerationTracker")
            .field("observations", &self.store.len())
            .field("earliest", &self.store.earliest())
            .field("latest", &self.store.latest())
            .field("settings", &self.settings)
            .finish()
    }
}

impl<B: BlobStore> GenerationTracker<B> {
    /// Start with an empty store. Nothing is written until the first mutation.
    pub fn create_new(backend: B) -> Self {
        Self::build(ObservationStore::new(), backend)
    }

    /// Hydrate the store from whatever `backend` holds.
    /// Corrupt or partially invalid data degrades to what can be salvaged.
    pub fn open(backend: B) -> Self {
        let store = StorageManager::load(&backend);
        Self::build(store, backend)
    }

    #[must_use]
    pub fn with_settings(mut self, settings: Settings) -> Self {
        self.settings = Settings {
            default_range_days: clamp_range_days(settings.default_range_days),
            ..settings
        };
        self
    }

    // ── Observations ────────────────────────────────────────────────

    /// Record the generation for one day, overwriting any earlier value.
    pub fn insert(&mut self, date: DateKey, value: f64) -> Result<(), CoreError> {
        let mut next = self.store.clone();
        self.store_service.insert(&mut next, date, value)?;
        self.commit(next)
    }

    /// Record a day given as `DD-MM-YYYY` or `YYYY-MM-DD` text.
    /// Returns the normalized date.
    pub fn insert_text(&mut self, date: &str, value: f64) -> Result<DateKey, CoreError> {
        let date = DateKey::parse_flexible(date)?;
        self.insert(date, value)?;
        Ok(date)
    }

    /// Merge a batch of records; later records win for the same date.
    /// All-or-nothing. Returns the number of records applied.
    pub fn merge(&mut self, records: &[Observation]) -> Result<usize, CoreError> {
        let next = self.store_service.merged(&self.store, records)?;
        self.commit(next)?;
        Ok(records.len())
    }

    /// Exact-match point query.
    #[must_use]
    pub fn lookup(&self, date: DateKey) -> Option<f64> {
        self.store.lookup(date)
    }

    /// Read-only snapshot of the store, for callers that query the engine directly.
    #[must_use]
    pub fn observations(&self) -> &ObservationStore {
        &self.store
    }

    #[must_use]
    pub fn observation_count(&self) -> usize {
        self.store.len()
    }

    #[must_use]
    pub fn earliest_date(&self) -> Option<DateKey> {
        self.store.earliest()
    }

    #[must_use]
    pub fn latest_date(&self) -> Option<DateKey> {
        self.store.latest()
    }

    // ── Import / Export ─────────────────────────────────────────────

    /// Parse CSV text and merge every valid row.
    /// Rejected rows are reported, not fatal.
    pub fn import_csv(&mut self, text: &str) -> Result<ImportReport, CoreError> {
        let outcome = self.csv_service.parse(text);
        let imported = if outcome.records.is_empty() {
            0
        } else {
            self.merge(&outcome.records)?
        };
        info!(
            "CSV import: {imported} rows merged, {} rejected",
            outcome.errors.len()
        );
        Ok(ImportReport {
            imported,
            errors: outcome.errors,
        })
    }

    /// Export all observations as CSV, ascending by date.
    pub fn export_csv(&self) -> Result<String, CoreError> {
        self.csv_service.serialize(self.store.sorted_entries())
    }

    /// File name for an export made on `today`.
    #[must_use]
    pub fn export_filename(&self, today: DateKey) -> String {
        self.csv_service.export_filename(today)
    }

    /// Snapshot of the store as pretty JSON (for debugging/display).
    pub fn to_json(&self) -> Result<String, CoreError> {
        serde_json::to_string_pretty(&self.store)
            .map_err(|e| CoreError::Serialization(format!("Failed to serialize observations: {e}")))
    }

    // ── Aggregation ─────────────────────────────────────────────────

    /// Daily or rolling-30 series for `query`.
    pub fn aggregate(&self, query: &AggregationQuery) -> Result<Vec<AggregatedPoint>, CoreError> {
        self.aggregation_service.aggregate(&self.store, query)
    }

    /// Series using the configured default window length and frequency.
    pub fn aggregate_with_defaults(
        &self,
        from: Option<DateKey>,
        to: Option<DateKey>,
    ) -> Result<Vec<AggregatedPoint>, CoreError> {
        let query = AggregationQuery {
            from,
            to,
            ..AggregationQuery::from_settings(&self.settings)
        };
        self.aggregate(&query)
    }

    /// Calendar-month rollup over the whole store.
    #[must_use]
    pub fn monthly(&self) -> Vec<MonthlyRecord> {
        self.aggregation_service.monthly_rollup(&self.store)
    }

    /// Monthly rollup restricted to the months spanned by `[from, to]`.
    #[must_use]
    pub fn monthly_in_range(&self, from: DateKey, to: DateKey) -> Vec<MonthlyRecord> {
        let all = self.monthly();
        self.aggregation_service.monthly_in_range(&all, from, to)
    }

    // ── Settings ────────────────────────────────────────────────────

    #[must_use]
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Set the window length used when a query gives no `from` date.
    /// Clamped to 7..=3650 days; returns the value actually stored.
    pub fn set_default_range_days(&mut self, days: u32) -> u32 {
        self.settings.default_range_days = clamp_range_days(days);
        self.settings.default_range_days
    }

    pub fn set_default_frequency(&mut self, frequency: Frequency) {
        self.settings.default_frequency = frequency;
    }

    // ── Backend ─────────────────────────────────────────────────────

    #[must_use]
    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn into_backend(self) -> B {
        self.backend
    }

    // ── Internal ────────────────────────────────────────────────────

    /// Persist `next`, then make it the current store.
    fn commit(&mut self, next: ObservationStore) -> Result<(), CoreError> {
        StorageManager::save(&mut self.backend, &next)?;
        self.store = next;
        Ok(())
    }

    fn build(store: ObservationStore, backend: B) -> Self {
        Self {
            store,
            backend,
            settings: Settings::default(),
            store_service: StoreService::new(),
            csv_service: CsvService::new(),
            aggregation_service: AggregationService::new(),
        }
    }
}
