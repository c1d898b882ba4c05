use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use super::{CatalogStore, PersistedCatalog, PersistenceError};

/// Single JSON file holding the whole catalog.
///
/// Saves write a sibling temp file and rename it over the target, so a crash
/// mid-save leaves the previous catalog intact.
#[derive(Debug, Clone)]
pub struct JsonFileCatalogStore {
    path: PathBuf,
}

impl JsonFileCatalogStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "catalog.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl CatalogStore for JsonFileCatalogStore {
    fn load(&self) -> Result<Option<PersistedCatalog>, PersistenceError> {
        let json = match fs::read_to_string(&self.path) {
            Ok(json) => json,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(PersistenceError::io(&self.path, e)),
        };
        if json.trim().is_empty() {
            return Ok(None);
        }
        PersistedCatalog::from_json(&json).map(Some)
    }

    fn save(&self, catalog: &PersistedCatalog) -> Result<(), PersistenceError> {
        let json = catalog.to_json()?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| PersistenceError::io(parent, e))?;
        }

        let tmp = self.temp_path();
        fs::write(&tmp, json).map_err(|e| PersistenceError::io(&tmp, e))?;
        fs::rename(&tmp, &self.path).map_err(|e| PersistenceError::io(&self.path, e))?;

        tracing::debug!(path = %self.path.display(), styles = catalog.styles.len(), "catalog saved");
        Ok(())
    }

    fn clear(&self) -> Result<(), PersistenceError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(PersistenceError::io(&self.path, e)),
        }
    }
}
