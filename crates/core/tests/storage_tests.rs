// ═══════════════════════════════════════════════════════════════════
// Storage Tests — blob format, backends, StorageManager
// ═══════════════════════════════════════════════════════════════════

use generation_tracker_core::errors::CoreError;
use generation_tracker_core::models::date_key::DateKey;
use generation_tracker_core::models::observation::ObservationStore;
use generation_tracker_core::storage::backend::{BlobStore, FileBlobStore, MemoryBlobStore};
use generation_tracker_core::storage::format::{self, STORAGE_KEY};
use generation_tracker_core::storage::manager::StorageManager;

fn key(iso: &str) -> DateKey {
    DateKey::parse_iso(iso).unwrap()
}

fn sample_store() -> ObservationStore {
    let mut store = ObservationStore::new();
    store.insert(key("2025-12-19"), 4215.5).unwrap();
    store.insert(key("2025-12-18"), 4140.0).unwrap();
    store.insert(key("2024-02-29"), 0.0).unwrap();
    store
}

/// Backend whose every call fails, to exercise degradation paths.
struct BrokenBackend;

impl BlobStore for BrokenBackend {
    fn load(&self, _key: &str) -> Result<Option<Vec<u8>>, CoreError> {
        Err(CoreError::Storage("disk on fire".into()))
    }

    fn save(&mut self, _key: &str, _bytes: &[u8]) -> Result<(), CoreError> {
        Err(CoreError::Storage("disk on fire".into()))
    }
}

// ═══════════════════════════════════════════════════════════════════
// Format
// ═══════════════════════════════════════════════════════════════════

mod blob_format {
    use super::*;

    #[test]
    fn encodes_iso_keyed_object() {
        let bytes = format::encode(&sample_store()).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        let map = value.as_object().unwrap();

        assert_eq!(map.len(), 3);
        assert_eq!(map["2025-12-18"].as_f64(), Some(4140.0));
        assert_eq!(map["2025-12-19"].as_f64(), Some(4215.5));
        assert_eq!(map["2024-02-29"].as_f64(), Some(0.0));
    }

    #[test]
    fn keys_written_in_ascending_order() {
        let text = String::from_utf8(format::encode(&sample_store()).unwrap()).unwrap();
        let first = text.find("2024-02-29").unwrap();
        let second = text.find("2025-12-18").unwrap();
        let third = text.find("2025-12-19").unwrap();
        assert!(first < second && second < third);
    }

    #[test]
    fn decode_restores_store() {
        let store = sample_store();
        let decoded = format::decode(&format::encode(&store).unwrap());
        assert_eq!(decoded, store);
    }

    #[test]
    fn decode_accepts_integer_values() {
        let decoded = format::decode(br#"{"2025-01-01": 100}"#);
        assert_eq!(decoded.lookup(key("2025-01-01")), Some(100.0));
    }

    #[test]
    fn invalid_entries_dropped_silently() {
        let blob = br#"{
            "2025-01-01": 5,
            "2025-02-30": 1,
            "01-01-2025": 2,
            "2025-01-02": -1,
            "2025-01-03": "7",
            "2025-01-04": null,
            "not a date": 3
        }"#;
        let decoded = format::decode(blob);
        assert_eq!(decoded.len(), 1);
        assert_eq!(decoded.lookup(key("2025-01-01")), Some(5.0));
    }

    #[test]
    fn corrupt_blob_degrades_to_empty() {
        assert!(format::decode(b"not json at all").is_empty());
        assert!(format::decode(b"").is_empty());
        assert!(format::decode(b"{\"2025-01-01\": 5").is_empty());
    }

    #[test]
    fn non_object_blob_degrades_to_empty() {
        assert!(format::decode(b"[1, 2, 3]").is_empty());
        assert!(format::decode(b"42").is_empty());
        assert!(format::decode(b"null").is_empty());
    }

    #[test]
    fn empty_store_encodes_to_empty_object() {
        let bytes = format::encode(&ObservationStore::new()).unwrap();
        assert_eq!(bytes, b"{}");
    }
}

// ═══════════════════════════════════════════════════════════════════
// Backends
// ═══════════════════════════════════════════════════════════════════

mod backends {
    use super::*;

    #[test]
    fn memory_backend_round_trip() {
        let mut backend = MemoryBlobStore::new();
        assert_eq!(backend.load("k").unwrap(), None);
        backend.save("k", b"abc").unwrap();
        assert_eq!(backend.load("k").unwrap(), Some(b"abc".to_vec()));
        assert_eq!(backend.get("k"), Some(&b"abc"[..]));
    }

    #[test]
    fn memory_backend_overwrites() {
        let mut backend = MemoryBlobStore::new().with_blob("k", "old");
        backend.save("k", b"new").unwrap();
        assert_eq!(backend.get("k"), Some(&b"new"[..]));
    }

    #[test]
    fn file_backend_missing_key_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let backend = FileBlobStore::new(dir.path());
        assert_eq!(backend.load(STORAGE_KEY).unwrap(), None);
    }

    #[test]
    fn file_backend_round_trip_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("nested").join("data");
        let mut backend = FileBlobStore::new(&nested);

        backend.save(STORAGE_KEY, b"{}").unwrap();
        assert!(backend.path_for(STORAGE_KEY).exists());
        assert_eq!(backend.load(STORAGE_KEY).unwrap(), Some(b"{}".to_vec()));
    }

    fn file_names(dir: &std::path::Path) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(dir)
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn file_backend_overwrite_leaves_no_temp_files() {
        let dir = tempfile::tempdir().unwrap();
        let mut backend = FileBlobStore::new(dir.path());

        backend.save(STORAGE_KEY, br#"{"2025-01-01":1.0,"2025-01-02":2.0}"#).unwrap();
        backend.save(STORAGE_KEY, br#"{"2025-01-01":1.0}"#).unwrap();

        assert_eq!(
            backend.load(STORAGE_KEY).unwrap(),
            Some(br#"{"2025-01-01":1.0}"#.to_vec())
        );
        assert_eq!(file_names(dir.path()), vec![format!("{STORAGE_KEY}.json")]);
    }

    #[test]
    fn failed_file_save_keeps_previous_blobs() {
        let dir = tempfile::tempdir().unwrap();
        let mut backend = FileBlobStore::new(dir.path());
        backend.save(STORAGE_KEY, b"{\"2025-01-01\":1.0}").unwrap();

        // A directory squatting on the target path makes the final rename fail.
        std::fs::create_dir(backend.path_for("blocked")).unwrap();
        let err = backend.save("blocked", b"{}").unwrap_err();
        assert!(matches!(err, CoreError::FileIO(_)));

        assert_eq!(
            backend.load(STORAGE_KEY).unwrap(),
            Some(b"{\"2025-01-01\":1.0}".to_vec())
        );
        assert_eq!(
            file_names(dir.path()),
            vec!["blocked.json".to_string(), format!("{STORAGE_KEY}.json")]
        );
    }
}

// ═══════════════════════════════════════════════════════════════════
// StorageManager
// ═══════════════════════════════════════════════════════════════════

mod storage_manager {
    use super::*;

    #[test]
    fn save_then_load_via_backend() {
        let mut backend = MemoryBlobStore::new();
        StorageManager::save(&mut backend, &sample_store()).unwrap();
        assert!(backend.get(STORAGE_KEY).is_some());
        assert_eq!(StorageManager::load(&backend), sample_store());
    }

    #[test]
    fn load_from_empty_backend_is_empty() {
        assert!(StorageManager::load(&MemoryBlobStore::new()).is_empty());
    }

    #[test]
    fn load_from_corrupt_backend_is_empty() {
        let backend = MemoryBlobStore::new().with_blob(STORAGE_KEY, "}{");
        assert!(StorageManager::load(&backend).is_empty());
    }

    #[test]
    fn load_error_degrades_to_empty() {
        assert!(StorageManager::load(&BrokenBackend).is_empty());
    }

    #[test]
    fn save_error_propagates() {
        let err = StorageManager::save(&mut BrokenBackend, &sample_store()).unwrap_err();
        assert!(matches!(err, CoreError::Storage(_)));
    }

    #[test]
    fn bytes_round_trip() {
        let bytes = StorageManager::save_to_bytes(&sample_store()).unwrap();
        assert_eq!(StorageManager::load_from_bytes(&bytes), sample_store());
    }

    #[test]
    fn file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("observations.json");
        let path = path.to_str().unwrap();

        StorageManager::save_to_file(&sample_store(), path).unwrap();
        assert_eq!(StorageManager::load_from_file(path).unwrap(), sample_store());
    }

    #[test]
    fn load_from_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.json");
        let err = StorageManager::load_from_file(path.to_str().unwrap()).unwrap_err();
        assert!(matches!(err, CoreError::FileIO(_)));
    }
}
