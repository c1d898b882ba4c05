//! Thread-safe handle around a [`LedgerSession`].
//!
//! Hosts that serve the ledger to several threads (an HTTP handler pool, a
//! desktop UI plus a background exporter) share one session through this
//! handle. All mutations go through one mutex, so at most one mutation per
//! style (and per catalog) runs at a time and the append order seen by the
//! log is the order in which callers acquired the lock. Exporters take owned
//! snapshots and never hold the lock while rendering.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use cartonledger_cartons::{CartonEntry, CatalogSnapshot, EntryOrder, ItemInput, SizeSummary, StyleName};
use cartonledger_core::{DomainResult, EntryId};

use crate::persistence::CatalogStore;
use crate::session::{Applied, FlushStatus, LedgerSession};

pub struct SharedSession<S> {
    inner: Arc<Mutex<LedgerSession<S>>>,
}

impl<S> Clone for SharedSession<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S> SharedSession<S>
where
    S: CatalogStore,
{
    pub fn new(session: LedgerSession<S>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(session)),
        }
    }

    // A panic inside a ledger operation cannot leave a torn summary behind
    // (state is only changed by `apply`), so a poisoned lock is still usable.
    fn lock(&self) -> MutexGuard<'_, LedgerSession<S>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn add_entry(&self, style: &str, items: &[ItemInput]) -> DomainResult<Applied<EntryId>> {
        self.lock().add_entry(style, items)
    }

    pub fn edit_entry(
        &self,
        style: &str,
        entry_id: EntryId,
        items: &[ItemInput],
    ) -> DomainResult<Applied<()>> {
        self.lock().edit_entry(style, entry_id, items)
    }

    pub fn delete_entry(&self, style: &str, entry_id: EntryId) -> DomainResult<Applied<CartonEntry>> {
        self.lock().delete_entry(style, entry_id)
    }

    pub fn undo_last(&self, style: &str) -> DomainResult<Applied<CartonEntry>> {
        self.lock().undo_last(style)
    }

    pub fn reset_all(&self) -> Applied<()> {
        self.lock().reset_all()
    }

    pub fn flush(&self) -> FlushStatus {
        self.lock().flush()
    }

    pub fn overwrite_store(&self) -> FlushStatus {
        self.lock().overwrite_store()
    }

    pub fn list_styles(&self) -> Vec<StyleName> {
        self.lock().list_styles().into_iter().cloned().collect()
    }

    pub fn summary(&self, style: &str) -> Option<SizeSummary> {
        self.lock().summary(style).copied()
    }

    pub fn entries(&self, style: &str) -> Vec<CartonEntry> {
        self.lock().entries(style).to_vec()
    }

    pub fn entries_sorted(&self, style: &str, order: EntryOrder) -> Vec<CartonEntry> {
        self.lock()
            .entries_sorted(style, order)
            .into_iter()
            .cloned()
            .collect()
    }

    /// Point-in-time copy for long-running exports.
    pub fn snapshot(&self) -> CatalogSnapshot {
        self.lock().snapshot()
    }

    /// Run a read-only closure against the session under the lock.
    pub fn read<R>(&self, f: impl FnOnce(&LedgerSession<S>) -> R) -> R {
        f(&self.lock())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::InMemoryCatalogStore;
    use cartonledger_cartons::SizeCode;
    use std::thread;

    #[test]
    fn concurrent_writers_keep_summary_consistent() {
        let (session, _) = LedgerSession::open(InMemoryCatalogStore::new());
        let shared = SharedSession::new(session);

        let handles: Vec<_> = (0..8)
            .map(|t| {
                let shared = shared.clone();
                thread::spawn(move || {
                    let style = if t % 2 == 0 { "EVEN" } else { "ODD" };
                    for i in 0..25 {
                        let size = SizeCode::ALL[(t + i) % SizeCode::COUNT];
                        shared
                            .add_entry(style, &[ItemInput::new(size.as_str(), 1 + i as i64)])
                            .unwrap();
                        if i % 5 == 4 {
                            shared.undo_last(style).unwrap();
                        }
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        for style in ["EVEN", "ODD"] {
            let entries = shared.entries(style);
            assert_eq!(entries.len(), 4 * 20);
            let summary = shared.summary(style).unwrap();
            assert_eq!(summary, SizeSummary::rebuild(&entries));
            assert_eq!(summary.total_cartons(), entries.len() as u64);
        }
    }

    #[test]
    fn snapshot_does_not_track_later_writes() {
        let (session, _) = LedgerSession::open(InMemoryCatalogStore::new());
        let shared = SharedSession::new(session);
        shared.add_entry("S1", &[ItemInput::new("L", 2)]).unwrap();

        let snapshot = shared.snapshot();
        shared.add_entry("S1", &[ItemInput::new("L", 2)]).unwrap();

        assert_eq!(snapshot.total_cartons(), 1);
        assert_eq!(shared.entries("S1").len(), 2);
        assert_eq!(shared.list_styles(), vec![StyleName::parse("S1").unwrap()]);
        assert!(shared.read(|s| s.store().blob().is_some()));
    }
}
