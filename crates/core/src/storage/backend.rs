use std::collections::HashMap;
#[cfg(not(target_arch = "wasm32"))]
use std::io::Write;

use crate::errors::CoreError;

/// A key-value byte store with whole-blob load and save.
///
/// The tracker only ever reads a blob in full at startup and overwrites it in
/// full after a mutation, so this is all a host environment needs to provide
/// (browser local storage, a file, an app sandbox...).
pub trait BlobStore {
    /// Read the blob stored under `key`, or `None` if nothing was saved yet.
    fn load(&self, key: &str) -> Result<Option<Vec<u8>>, CoreError>;

    /// Replace the blob stored under `key`.
    fn save(&mut self, key: &str, bytes: &[u8]) -> Result<(), CoreError>;
}

/// In-process blob store. Useful for tests and for hosts that persist elsewhere.
#[derive(Debug, Clone, Default)]
pub struct MemoryBlobStore {
    blobs: HashMap<String, Vec<u8>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a blob directly, bypassing the tracker (e.g. to simulate a prior session).
    pub fn with_blob(mut self, key: &str, bytes: impl Into<Vec<u8>>) -> Self {
        self.blobs.insert(key.to_string(), bytes.into());
        self
    }

    /// Raw bytes stored under `key`.
    pub fn get(&self, key: &str) -> Option<&[u8]> {
        self.blobs.get(key).map(Vec::as_slice)
    }
}

impl BlobStore for MemoryBlobStore {
    fn load(&self, key: &str) -> Result<Option<Vec<u8>>, CoreError> {
        Ok(self.blobs.get(key).cloned())
    }

    fn save(&mut self, key: &str, bytes: &[u8]) -> Result<(), CoreError> {
        self.blobs.insert(key.to_string(), bytes.to_vec());
        Ok(())
    }
}

/// One file per key inside a directory: `<dir>/<key>.json` (native only).
#[cfg(not(target_arch = "wasm32"))]
#[derive(Debug, Clone)]
pub struct FileBlobStore {
    dir: std::path::PathBuf,
}

#[cfg(not(target_arch = "wasm32"))]
impl FileBlobStore {
    pub fn new(dir: impl Into<std::path::PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Path of the file backing `key`.
    pub fn path_for(&self, key: &str) -> std::path::PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl BlobStore for FileBlobStore {
    fn load(&self, key: &str) -> Result<Option<Vec<u8>>, CoreError> {
        match std::fs::read(self.path_for(key)) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Writes a temp file next to the target and renames it into place, so an
    /// interrupted save leaves the previous blob intact.
    fn save(&mut self, key: &str, bytes: &[u8]) -> Result<(), CoreError> {
        std::fs::create_dir_all(&self.dir)?;
        let mut tmp = tempfile::NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(bytes)?;
        tmp.as_file().sync_all()?;
        tmp.persist(self.path_for(key)).map_err(|e| e.error)?;
        Ok(())
    }
}
