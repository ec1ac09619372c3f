use log::warn;
use serde_json::{Map, Value};

use crate::errors::CoreError;
use crate::models::date_key::DateKey;
use crate::models::observation::ObservationStore;

/// Storage key under which the observation blob is persisted.
pub const STORAGE_KEY: &str = "india_generation_daily_v1";

/// Encode the whole store as a JSON object mapping ISO dates to values.
///
/// Layout:
/// ```text
/// {"2025-12-18":4140.0,"2025-12-19":4215.5,...}
/// ```
/// Keys come out ascending (ISO order is calendar order).
pub fn encode(store: &ObservationStore) -> Result<Vec<u8>, CoreError> {
    let map: Map<String, Value> = store
        .sorted_entries()
        .map(|obs| (obs.date.to_iso(), Value::from(obs.value)))
        .collect();

    serde_json::to_vec(&map)
        .map_err(|e| CoreError::Serialization(format!("Failed to encode observations: {e}")))
}

/// Decode a persisted blob.
///
/// Lenient by contract: a blob that is not a JSON object yields an empty
/// store, and entries with a bad date or value are dropped. Both are logged,
/// neither is an error.
pub fn decode(data: &[u8]) -> ObservationStore {
    let mut store = ObservationStore::new();

    let map = match serde_json::from_slice::<Value>(data) {
        Ok(Value::Object(map)) => map,
        Ok(other) => {
            warn!("persisted observations are not a JSON object (found {}), starting empty", kind(&other));
            return store;
        }
        Err(e) => {
            warn!("persisted observations are corrupt ({e}), starting empty");
            return store;
        }
    };

    let mut dropped = 0usize;
    for (raw_date, raw_value) in &map {
        let accepted = DateKey::parse_iso(raw_date)
            .ok()
            .zip(raw_value.as_f64())
            .is_some_and(|(date, value)| store.insert(date, value).is_ok());
        if !accepted {
            warn!("dropping persisted entry {raw_date:?}: {raw_value}");
            dropped += 1;
        }
    }
    if dropped > 0 {
        warn!("dropped {dropped} of {} persisted entries", map.len());
    }

    store
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
