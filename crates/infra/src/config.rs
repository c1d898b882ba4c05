//! Configuration loading and process bootstrap.
//!
//! Configuration comes from environment variables:
//!
//! | Variable | Values | Default |
//! |---|---|---|
//! | `CARTONLEDGER_STORE` | `memory`, `file` | `file` |
//! | `CARTONLEDGER_DATA_PATH` | path to the JSON catalog | `cartonledger.json` |
//! | `CARTONLEDGER_LOG_FORMAT` | `json`, `compact` | `json` |

use std::path::PathBuf;

use anyhow::{Context, bail};

use cartonledger_observability::LogFormat;

use crate::persistence::{
    CatalogStore, InMemoryCatalogStore, JsonFileCatalogStore, PersistedCatalog, PersistenceError,
};
use crate::session::{LedgerSession, LoadReport};

pub const STORE_VAR: &str = "CARTONLEDGER_STORE";
pub const DATA_PATH_VAR: &str = "CARTONLEDGER_DATA_PATH";
pub const LOG_FORMAT_VAR: &str = "CARTONLEDGER_LOG_FORMAT";

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub enum StoreKind {
    Memory,
    #[default]
    File,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerConfig {
    pub store: StoreKind,
    pub data_path: PathBuf,
    pub log_format: LogFormat,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            store: StoreKind::File,
            data_path: PathBuf::from("cartonledger.json"),
            log_format: LogFormat::Json,
        }
    }
}

impl LedgerConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup (the environment, a map in tests...).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let mut config = Self::default();

        if let Some(store) = lookup(STORE_VAR) {
            config.store = match store.trim().to_ascii_lowercase().as_str() {
                "memory" => StoreKind::Memory,
                "file" => StoreKind::File,
                other => bail!("unknown {STORE_VAR} '{other}' (expected memory|file)"),
            };
        }

        if let Some(path) = lookup(DATA_PATH_VAR) {
            if path.trim().is_empty() {
                bail!("{DATA_PATH_VAR} is set but empty");
            }
            config.data_path = PathBuf::from(path.trim());
        }

        if let Some(format) = lookup(LOG_FORMAT_VAR) {
            config.log_format = format
                .parse()
                .map_err(anyhow::Error::msg)
                .with_context(|| format!("invalid {LOG_FORMAT_VAR}"))?;
        }

        Ok(config)
    }

    pub fn open_store(&self) -> StoreBackend {
        match self.store {
            StoreKind::Memory => StoreBackend::Memory(InMemoryCatalogStore::new()),
            StoreKind::File => StoreBackend::File(JsonFileCatalogStore::new(&self.data_path)),
        }
    }
}

/// The configured store.
#[derive(Debug)]
pub enum StoreBackend {
    Memory(InMemoryCatalogStore),
    File(JsonFileCatalogStore),
}

impl CatalogStore for StoreBackend {
    fn load(&self) -> Result<Option<PersistedCatalog>, PersistenceError> {
        match self {
            StoreBackend::Memory(store) => store.load(),
            StoreBackend::File(store) => store.load(),
        }
    }

    fn save(&self, catalog: &PersistedCatalog) -> Result<(), PersistenceError> {
        match self {
            StoreBackend::Memory(store) => store.save(catalog),
            StoreBackend::File(store) => store.save(catalog),
        }
    }

    fn clear(&self) -> Result<(), PersistenceError> {
        match self {
            StoreBackend::Memory(store) => store.clear(),
            StoreBackend::File(store) => store.clear(),
        }
    }
}

/// Initialize logging and open a session over the configured store.
pub fn bootstrap(config: &LedgerConfig) -> (LedgerSession<StoreBackend>, LoadReport) {
    cartonledger_observability::init_with(config.log_format);
    tracing::info!(store = ?config.store, path = %config.data_path.display(), "opening carton ledger");
    LedgerSession::open(config.open_store())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = LedgerConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, LedgerConfig::default());
        assert_eq!(config.store, StoreKind::File);
    }

    #[test]
    fn reads_every_variable() {
        let config = LedgerConfig::from_lookup(lookup(&[
            (STORE_VAR, "Memory"),
            (DATA_PATH_VAR, " /tmp/cartons.json "),
            (LOG_FORMAT_VAR, "compact"),
        ]))
        .unwrap();
        assert_eq!(config.store, StoreKind::Memory);
        assert_eq!(config.data_path, PathBuf::from("/tmp/cartons.json"));
        assert_eq!(config.log_format, LogFormat::Compact);
    }

    #[test]
    fn rejects_bad_values() {
        assert!(LedgerConfig::from_lookup(lookup(&[(STORE_VAR, "redis")])).is_err());
        assert!(LedgerConfig::from_lookup(lookup(&[(DATA_PATH_VAR, "  ")])).is_err());
        let err = LedgerConfig::from_lookup(lookup(&[(LOG_FORMAT_VAR, "xml")])).unwrap_err();
        assert!(format!("{err:#}").contains(LOG_FORMAT_VAR));
    }

    #[test]
    fn bootstrap_opens_file_backed_session() {
        let dir = TempDir::new().unwrap();
        let config = LedgerConfig {
            store: StoreKind::File,
            data_path: dir.path().join("cartons.json"),
            log_format: LogFormat::Compact,
        };

        let (mut session, report) = bootstrap(&config);
        assert!(report.is_clean());
        assert!(session.add_entry("TEE", &[cartonledger_cartons::ItemInput::new("M", 6)]).unwrap().is_durable());
        assert!(config.data_path.exists());

        let (reopened, report) = bootstrap(&config);
        assert_eq!(report.restored_entries, 1);
        assert_eq!(reopened.entries("tee").len(), 1);
    }

    #[test]
    fn memory_backend_round_trips() {
        let backend = LedgerConfig {
            store: StoreKind::Memory,
            ..LedgerConfig::default()
        }
        .open_store();
        assert!(matches!(backend, StoreBackend::Memory(_)));
        backend.save(&PersistedCatalog::default()).unwrap();
        assert_eq!(backend.load().unwrap(), Some(PersistedCatalog::default()));
    }
}
