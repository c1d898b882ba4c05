//! Durable storage for the whole catalog, as one serialized blob.
//!
//! The store is written after every mutation and read once at startup. It
//! makes no attempt at partial updates: every save replaces the previous blob.

pub mod format;
pub mod in_memory;
pub mod json_file;

use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;

pub use format::{PersistedCatalog, PersistedStyle};
pub use in_memory::InMemoryCatalogStore;
pub use json_file::JsonFileCatalogStore;

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// The stored catalog failed to load and has not been released for overwrite.
    #[error("stored catalog could not be loaded; refusing to overwrite it")]
    Protected,
}

impl PersistenceError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Key-value style store holding the last saved catalog.
pub trait CatalogStore: Send + Sync {
    /// The last saved catalog, or `None` if nothing was ever saved.
    fn load(&self) -> Result<Option<PersistedCatalog>, PersistenceError>;

    /// Replace the stored catalog.
    fn save(&self, catalog: &PersistedCatalog) -> Result<(), PersistenceError>;

    /// Forget the stored catalog.
    fn clear(&self) -> Result<(), PersistenceError>;
}

impl<S> CatalogStore for Arc<S>
where
    S: CatalogStore + ?Sized,
{
    fn load(&self) -> Result<Option<PersistedCatalog>, PersistenceError> {
        (**self).load()
    }

    fn save(&self, catalog: &PersistedCatalog) -> Result<(), PersistenceError> {
        (**self).save(catalog)
    }

    fn clear(&self) -> Result<(), PersistenceError> {
        (**self).clear()
    }
}
