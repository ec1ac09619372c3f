use serde::{Deserialize, Serialize};
use std::collections::btree_map;
use std::collections::BTreeMap;
use std::ops::Bound;

use super::date_key::DateKey;
use crate::errors::CoreError;

/// A single daily reading: generation in GWh on a calendar date.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub date: DateKey,
    pub value: f64,
}

impl Observation {
    pub fn new(date: DateKey, value: f64) -> Self {
        Self { date, value }
    }
}

/// Reject values that can never be aggregated.
pub fn validate_value(value: f64) -> Result<(), CoreError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(CoreError::InvalidValue(value))
    }
}

/// Sparse mapping from date to generation value.
///
/// Backed by a `BTreeMap` keyed on date: at most one entry per date, iteration
/// is ascending, and range scans walk only the dates inside the range.
/// Writing an existing date overwrites it.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ObservationStore {
    entries: BTreeMap<DateKey, f64>,
}

impl ObservationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite the value for `date`.
    /// Fails with `InvalidValue` for negative or non-finite values; the store is left untouched.
    pub fn insert(&mut self, date: DateKey, value: f64) -> Result<(), CoreError> {
        validate_value(value)?;
        self.entries.insert(date, value);
        Ok(())
    }

    /// Exact-match point query.
    pub fn lookup(&self, date: DateKey) -> Option<f64> {
        self.entries.get(&date).copied()
    }

    /// Point query for a date that may not exist (e.g. 29 Feb in the prior year).
    pub fn lookup_opt(&self, date: Option<DateKey>) -> Option<f64> {
        date.and_then(|d| self.lookup(d))
    }

    /// All observations, ascending by date. Restartable: each call yields a fresh iterator.
    pub fn sorted_entries(&self) -> impl Iterator<Item = Observation> + '_ {
        self.into_iter()
    }

    /// Observations with `from <= date <= to`, ascending. Empty when `from > to`.
    pub fn range(&self, from: DateKey, to: DateKey) -> impl Iterator<Item = Observation> + '_ {
        let end = if from <= to {
            Bound::Included(to)
        } else {
            Bound::Excluded(from)
        };
        self.entries
            .range((Bound::Included(from), end))
            .map(to_observation)
    }

    /// Sum and count of the present values in `[from, to]`.
    pub fn range_sum(&self, from: DateKey, to: DateKey) -> (f64, usize) {
        self.range(from, to)
            .fold((0.0, 0), |(sum, count), obs| (sum + obs.value, count + 1))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn earliest(&self) -> Option<DateKey> {
        self.entries.first_key_value().map(|(date, _)| *date)
    }

    pub fn latest(&self) -> Option<DateKey> {
        self.entries.last_key_value().map(|(date, _)| *date)
    }
}

fn to_observation((date, value): (&DateKey, &f64)) -> Observation {
    Observation::new(*date, *value)
}

impl<'a> IntoIterator for &'a ObservationStore {
    type Item = Observation;
    type IntoIter = std::iter::Map<
        btree_map::Iter<'a, DateKey, f64>,
        fn((&'a DateKey, &'a f64)) -> Observation,
    >;

    fn into_iter(self) -> Self::IntoIter {
        self.entries
            .iter()
            .map(to_observation as fn((&'a DateKey, &'a f64)) -> Observation)
    }
}
