//! Infrastructure layer: persistence, sessions, exporter read models, config.

pub mod config;
pub mod persistence;
pub mod read_model;
pub mod session;
pub mod shared;


pub use config::{LedgerConfig, StoreBackend, StoreKind, bootstrap};
pub use persistence::{
    CatalogStore, InMemoryCatalogStore, JsonFileCatalogStore, PersistedCatalog, PersistenceError,
};
pub use session::{Applied, FlushStatus, LedgerSession, LoadReport};
pub use shared::SharedSession;
