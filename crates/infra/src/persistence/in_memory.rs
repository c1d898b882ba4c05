use std::sync::RwLock;

use super::{CatalogStore, PersistedCatalog, PersistenceError};

/// In-memory store keeping the serialized JSON blob, like browser local storage.
///
/// Intended for tests/dev. Going through JSON keeps the save/load path identical
/// to the file store.
#[derive(Debug, Default)]
pub struct InMemoryCatalogStore {
    blob: RwLock<Option<String>>,
}

impl InMemoryCatalogStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store with an existing blob (e.g. data written by an older version).
    pub fn with_blob(json: impl Into<String>) -> Self {
        Self {
            blob: RwLock::new(Some(json.into())),
        }
    }

    /// Current raw blob, if any.
    pub fn blob(&self) -> Option<String> {
        self.blob.read().ok().and_then(|b| b.clone())
    }
}

impl CatalogStore for InMemoryCatalogStore {
    fn load(&self) -> Result<Option<PersistedCatalog>, PersistenceError> {
        let blob = self
            .blob
            .read()
            .map_err(|_| PersistenceError::Unavailable("lock poisoned".to_string()))?;
        blob.as_deref().map(PersistedCatalog::from_json).transpose()
    }

    fn save(&self, catalog: &PersistedCatalog) -> Result<(), PersistenceError> {
        let json = catalog.to_json()?;
        let mut blob = self
            .blob
            .write()
            .map_err(|_| PersistenceError::Unavailable("lock poisoned".to_string()))?;
        *blob = Some(json);
        Ok(())
    }

    fn clear(&self) -> Result<(), PersistenceError> {
        let mut blob = self
            .blob
            .write()
            .map_err(|_| PersistenceError::Unavailable("lock poisoned".to_string()))?;
        *blob = None;
        Ok(())
    }
}
