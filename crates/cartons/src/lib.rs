//! Carton ledger domain module (event-driven).
//!
//! Size catalog, per-style carton logs and their derived per-size summaries,
//! implemented purely as deterministic domain logic (no IO, no storage).

pub mod catalog;
pub mod item;
pub mod ledger;
pub mod record;
pub mod size;
pub mod style;
pub mod summary;

pub use catalog::{Catalog, CatalogSnapshot, EntryOrder, StyleSnapshot};
pub use item::{CartonEntry, ItemInput, LineItem, validate_items};
pub use ledger::{
    AddEntry, DeleteEntry, EditEntry, EntryAdded, EntryDeleted, EntryEdited, LastEntryUndone,
    LedgerCommand, LedgerEvent, StyleLedger, UndoLast,
};
pub use record::{EntryRecord, ItemsRecord, RawItem, RawQuantity, RestoreWarning, SingleRecord};
pub use size::SizeCode;
pub use style::StyleName;
pub use summary::{Sign, SizeSummary, SizeTally};
