//! Write-through ledger session.
//!
//! A session owns one [`Catalog`] and one [`CatalogStore`]. Every successful
//! mutation is followed by a synchronous save of the whole catalog. Save
//! failures never undo the in-memory change; they come back as
//! [`FlushStatus::Failed`] so the caller can warn the user.
//!
//! When the stored catalog cannot be loaded the session starts empty and
//! leaves the store alone: saves fail with [`PersistenceError::Protected`]
//! until the caller accepts the loss through
//! [`LedgerSession::overwrite_store`] or [`LedgerSession::reset_all`].

use chrono::Utc;

use cartonledger_cartons::{
    CartonEntry, Catalog, CatalogSnapshot, EntryOrder, ItemInput, RestoreWarning, SizeSummary,
    StyleName,
};
use cartonledger_core::{DomainResult, EntryId};

use crate::persistence::{CatalogStore, PersistedCatalog, PersistenceError};

/// Outcome of persisting after a mutation.
#[derive(Debug)]
pub enum FlushStatus {
    Saved,
    Failed(PersistenceError),
}

impl FlushStatus {
    pub fn is_saved(&self) -> bool {
        matches!(self, FlushStatus::Saved)
    }

    pub fn error(&self) -> Option<&PersistenceError> {
        match self {
            FlushStatus::Saved => None,
            FlushStatus::Failed(err) => Some(err),
        }
    }
}

/// A mutation that was applied in memory, plus how the flush went.
#[derive(Debug)]
pub struct Applied<T> {
    pub value: T,
    pub flush: FlushStatus,
}

impl<T> Applied<T> {
    /// True when the change also reached the store.
    pub fn is_durable(&self) -> bool {
        self.flush.is_saved()
    }

    pub fn into_value(self) -> T {
        self.value
    }
}

/// What happened while opening a session.
#[derive(Debug, Default)]
pub struct LoadReport {
    pub restored_styles: usize,
    pub restored_entries: usize,
    pub warnings: Vec<RestoreWarning>,
    /// Set when the store could not be read; the session then starts empty
    /// and does not write to the store until released.
    pub load_error: Option<PersistenceError>,
}

impl LoadReport {
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty() && self.load_error.is_none()
    }
}

/// Catalog + store, with write-through persistence.
#[derive(Debug)]
pub struct LedgerSession<S> {
    catalog: Catalog,
    store: S,
    protected: bool,
}

impl<S> LedgerSession<S>
where
    S: CatalogStore,
{
    /// Load the last saved catalog and rebuild every summary from its log.
    pub fn open(store: S) -> (Self, LoadReport) {
        let mut report = LoadReport::default();
        let mut protected = false;

        let catalog = match store.load() {
            Ok(Some(persisted)) => {
                let (catalog, warnings) = persisted.into_catalog(Utc::now());
                report.warnings = warnings;
                catalog
            }
            Ok(None) => Catalog::new(),
            Err(err) => {
                tracing::warn!(error = %err, "failed to load catalog; starting empty, store left untouched");
                report.load_error = Some(err);
                protected = true;
                Catalog::new()
            }
        };

        report.restored_styles = catalog.list_styles().len();
        report.restored_entries = catalog.ledgers().map(|l| l.entries().len()).sum();
        tracing::info!(
            styles = report.restored_styles,
            entries = report.restored_entries,
            warnings = report.warnings.len(),
            "ledger session opened"
        );

        (
            Self {
                catalog,
                store,
                protected,
            },
            report,
        )
    }

    pub fn add_entry(&mut self, style: &str, items: &[ItemInput]) -> DomainResult<Applied<EntryId>> {
        let entry_id = self.catalog.add_entry(style, items)?;
        Ok(self.flushed(entry_id))
    }

    pub fn edit_entry(
        &mut self,
        style: &str,
        entry_id: EntryId,
        items: &[ItemInput],
    ) -> DomainResult<Applied<()>> {
        self.catalog.edit_entry(style, entry_id, items)?;
        Ok(self.flushed(()))
    }

    pub fn delete_entry(&mut self, style: &str, entry_id: EntryId) -> DomainResult<Applied<CartonEntry>> {
        let removed = self.catalog.delete_entry(style, entry_id)?;
        Ok(self.flushed(removed))
    }

    pub fn undo_last(&mut self, style: &str) -> DomainResult<Applied<CartonEntry>> {
        let removed = self.catalog.undo_last(style)?;
        Ok(self.flushed(removed))
    }

    /// Clear every style and the stored blob.
    pub fn reset_all(&mut self) -> Applied<()> {
        self.catalog.reset_all();
        self.protected = false;
        tracing::info!("catalog reset");
        let flush = match self.store.clear() {
            Ok(()) => FlushStatus::Saved,
            Err(err) => {
                tracing::warn!(error = %err, "failed to clear stored catalog");
                FlushStatus::Failed(err)
            }
        };
        Applied { value: (), flush }
    }

    /// Save the current catalog (e.g. to retry after a failed flush).
    pub fn flush(&self) -> FlushStatus {
        if self.protected {
            tracing::warn!("stored catalog failed to load; changes are kept in memory only");
            return FlushStatus::Failed(PersistenceError::Protected);
        }
        let result = PersistedCatalog::from_catalog(&self.catalog)
            .and_then(|persisted| self.store.save(&persisted));
        match result {
            Ok(()) => FlushStatus::Saved,
            Err(err) => {
                tracing::warn!(error = %err, "failed to save catalog; changes are kept in memory");
                FlushStatus::Failed(err)
            }
        }
    }

    /// Replace a stored catalog that failed to load with the current one.
    pub fn overwrite_store(&mut self) -> FlushStatus {
        if self.protected {
            tracing::warn!("overwriting stored catalog that failed to load");
            self.protected = false;
        }
        self.flush()
    }

    /// True while saves are refused because the stored catalog failed to load.
    pub fn is_store_protected(&self) -> bool {
        self.protected
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn list_styles(&self) -> Vec<&StyleName> {
        self.catalog.list_styles()
    }

    pub fn summary(&self, style: &str) -> Option<&SizeSummary> {
        self.catalog.summary(style)
    }

    pub fn entries(&self, style: &str) -> &[CartonEntry] {
        self.catalog.entries(style)
    }

    pub fn entries_sorted(&self, style: &str, order: EntryOrder) -> Vec<&CartonEntry> {
        self.catalog.entries_sorted(style, order)
    }

    pub fn snapshot(&self) -> CatalogSnapshot {
        self.catalog.snapshot()
    }

    pub fn into_parts(self) -> (Catalog, S) {
        (self.catalog, self.store)
    }

    fn flushed<T>(&self, value: T) -> Applied<T> {
        Applied {
            value,
            flush: self.flush(),
        }
    }
}
