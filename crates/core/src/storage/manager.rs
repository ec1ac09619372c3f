use log::{debug, warn};

use crate::errors::CoreError;
use crate::models::observation::ObservationStore;

use super::backend::BlobStore;
use super::format::{self, STORAGE_KEY};

/// High-level storage operations: load-all / save-all of the observation store.
pub struct StorageManager;

impl StorageManager {
    /// Serialize the store to raw bytes.
    ///
    /// Flow: ObservationStore → JSON object {ISO date: value} → bytes
    pub fn save_to_bytes(store: &ObservationStore) -> Result<Vec<u8>, CoreError> {
        format::encode(store)
    }

    /// Rebuild a store from raw bytes. Never fails; see [`format::decode`].
    pub fn load_from_bytes(data: &[u8]) -> ObservationStore {
        format::decode(data)
    }

    /// Hydrate the store from `backend`.
    ///
    /// A missing blob is a fresh start; an unreadable one is logged and also
    /// treated as a fresh start.
    pub fn load<B: BlobStore + ?Sized>(backend: &B) -> ObservationStore {
        match backend.load(STORAGE_KEY) {
            Ok(Some(bytes)) => {
                let store = Self::load_from_bytes(&bytes);
                debug!("loaded {} observations ({} bytes)", store.len(), bytes.len());
                store
            }
            Ok(None) => {
                debug!("no persisted observations under {STORAGE_KEY:?}");
                ObservationStore::new()
            }
            Err(e) => {
                warn!("failed to read persisted observations ({e}), starting empty");
                ObservationStore::new()
            }
        }
    }

    /// Overwrite the persisted blob with the full store.
    pub fn save<B: BlobStore + ?Sized>(backend: &mut B, store: &ObservationStore) -> Result<(), CoreError> {
        let bytes = Self::save_to_bytes(store)?;
        backend.save(STORAGE_KEY, &bytes)?;
        debug!("saved {} observations ({} bytes)", store.len(), bytes.len());
        Ok(())
    }

    /// Save the store to a JSON file on disk (native only).
    #[cfg(not(target_arch = "wasm32"))]
    pub fn save_to_file(store: &ObservationStore, path: &str) -> Result<(), CoreError> {
        let bytes = Self::save_to_bytes(store)?;
        std::fs::write(path, bytes)?;
        Ok(())
    }

    /// Load the store from a JSON file on disk (native only).
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load_from_file(path: &str) -> Result<ObservationStore, CoreError> {
        let bytes = std::fs::read(path)?;
        Ok(Self::load_from_bytes(&bytes))
    }
}
