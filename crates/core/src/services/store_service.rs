use log::debug;

use crate::errors::CoreError;
use crate::models::date_key::DateKey;
use crate::models::observation::{Observation, ObservationStore};

/// Validated mutations on an [`ObservationStore`].
///
/// Pure business logic — no I/O. Persistence is the caller's job.
pub struct StoreService;

impl StoreService {
    pub fn new() -> Self {
        Self
    }

    /// Insert a single value, overwriting any existing value for `date`.
    pub fn insert(
        &self,
        store: &mut ObservationStore,
        date: DateKey,
        value: f64,
    ) -> Result<(), CoreError> {
        store.insert(date, value)
    }

    /// Apply `records` in order; later records win for the same date.
    ///
    /// All-or-nothing: records are applied to a working copy, and `store` only
    /// changes if every record is valid. Returns the number of records applied.
    pub fn merge_all(
        &self,
        store: &mut ObservationStore,
        records: &[Observation],
    ) -> Result<usize, CoreError> {
        *store = self.merged(store, records)?;
        Ok(records.len())
    }

    /// Like [`merge_all`](Self::merge_all) but leaves `store` untouched and
    /// returns the merged copy.
    pub fn merged(
        &self,
        store: &ObservationStore,
        records: &[Observation],
    ) -> Result<ObservationStore, CoreError> {
        let mut next = store.clone();
        for record in records {
            next.insert(record.date, record.value)?;
        }
        debug!(
            "merged {} records: {} -> {} observations",
            records.len(),
            store.len(),
            next.len()
        );
        Ok(next)
    }
}

impl Default for StoreService {
    fn default() -> Self {
        Self::new()
    }
}
