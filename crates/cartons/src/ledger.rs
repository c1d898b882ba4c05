use chrono::{DateTime, Utc};
use serde::Serialize;

use cartonledger_core::{Aggregate, AggregateRoot, DomainError, EntryId};
use cartonledger_events::Event;

use crate::item::{CartonEntry, LineItem};
use crate::style::StyleName;
use crate::summary::{Sign, SizeSummary};

/// Aggregate root: the carton log of one style plus its derived summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleLedger {
    style: StyleName,
    entries: Vec<CartonEntry>,
    summary: SizeSummary,
    version: u64,
}

impl StyleLedger {
    /// Create an empty ledger for a style.
    pub fn empty(style: StyleName) -> Self {
        Self {
            style,
            entries: Vec::new(),
            summary: SizeSummary::new(),
            version: 0,
        }
    }

    /// Restore from an already-normalized log. The summary is always rebuilt.
    pub fn restore(style: StyleName, entries: Vec<CartonEntry>) -> Self {
        let summary = SizeSummary::rebuild(&entries);
        Self {
            style,
            entries,
            summary,
            version: 0,
        }
    }

    pub fn style(&self) -> &StyleName {
        &self.style
    }

    /// Entries in append order.
    pub fn entries(&self) -> &[CartonEntry] {
        &self.entries
    }

    pub fn summary(&self) -> &SizeSummary {
        &self.summary
    }

    pub fn entry(&self, entry_id: EntryId) -> Option<&CartonEntry> {
        self.entries.iter().find(|e| e.id_typed() == entry_id)
    }

    pub fn last_entry(&self) -> Option<&CartonEntry> {
        self.entries.last()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Recompute the summary from the log.
    pub fn rebuild_summary(&mut self) {
        self.summary = SizeSummary::rebuild(&self.entries);
    }

    fn position(&self, entry_id: EntryId) -> Option<usize> {
        self.entries.iter().position(|e| e.id_typed() == entry_id)
    }
}

impl AggregateRoot for StyleLedger {
    type Id = StyleName;

    fn id(&self) -> &Self::Id {
        &self.style
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Command: AddEntry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddEntry {
    pub style: StyleName,
    pub entry_id: EntryId,
    pub items: Vec<LineItem>,
    pub occurred_at: DateTime<Utc>,
}

/// Command: EditEntry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditEntry {
    pub style: StyleName,
    pub entry_id: EntryId,
    pub items: Vec<LineItem>,
    pub occurred_at: DateTime<Utc>,
}

/// Command: DeleteEntry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteEntry {
    pub style: StyleName,
    pub entry_id: EntryId,
    pub occurred_at: DateTime<Utc>,
}

/// Command: UndoLast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UndoLast {
    pub style: StyleName,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerCommand {
    AddEntry(AddEntry),
    EditEntry(EditEntry),
    DeleteEntry(DeleteEntry),
    UndoLast(UndoLast),
}

/// Event: EntryAdded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntryAdded {
    pub style: StyleName,
    pub entry: CartonEntry,
}

/// Event: EntryEdited.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntryEdited {
    pub style: StyleName,
    pub entry_id: EntryId,
    pub items: Vec<LineItem>,
    pub occurred_at: DateTime<Utc>,
}

/// Event: EntryDeleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntryDeleted {
    pub style: StyleName,
    pub entry: CartonEntry,
    pub occurred_at: DateTime<Utc>,
}

/// Event: LastEntryUndone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LastEntryUndone {
    pub style: StyleName,
    pub entry: CartonEntry,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum LedgerEvent {
    EntryAdded(EntryAdded),
    EntryEdited(EntryEdited),
    EntryDeleted(EntryDeleted),
    LastEntryUndone(LastEntryUndone),
}

impl Event for LedgerEvent {
    fn event_type(&self) -> &'static str {
        match self {
            LedgerEvent::EntryAdded(_) => "cartons.entry.added",
            LedgerEvent::EntryEdited(_) => "cartons.entry.edited",
            LedgerEvent::EntryDeleted(_) => "cartons.entry.deleted",
            LedgerEvent::LastEntryUndone(_) => "cartons.entry.undone",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            LedgerEvent::EntryAdded(e) => e.entry.created_at(),
            LedgerEvent::EntryEdited(e) => e.occurred_at,
            LedgerEvent::EntryDeleted(e) => e.occurred_at,
            LedgerEvent::LastEntryUndone(e) => e.occurred_at,
        }
    }
}

impl Aggregate for StyleLedger {
    type Command = LedgerCommand;
    type Event = LedgerEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            LedgerEvent::EntryAdded(e) => {
                self.summary.apply_delta(e.entry.items(), Sign::Add);
                self.entries.push(e.entry.clone());
            }
            LedgerEvent::EntryEdited(e) => {
                // In-place change: the previous items are gone, so rebuild.
                if let Some(idx) = self.position(e.entry_id) {
                    self.entries[idx].replace_items(e.items.clone());
                    self.rebuild_summary();
                }
            }
            LedgerEvent::EntryDeleted(e) => {
                if let Some(idx) = self.position(e.entry.id_typed()) {
                    self.entries.remove(idx);
                    self.rebuild_summary();
                }
            }
            LedgerEvent::LastEntryUndone(e) => {
                if self.last_entry().map(CartonEntry::id_typed) == Some(e.entry.id_typed()) {
                    if let Some(removed) = self.entries.pop() {
                        self.summary.apply_delta(removed.items(), Sign::Remove);
                    }
                }
            }
        }

        self.version += 1;
        tracing::debug!(
            style = %self.style,
            event_type = event.event_type(),
            version = self.version,
            entries = self.entries.len(),
            "applied ledger event"
        );
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            LedgerCommand::AddEntry(cmd) => self.handle_add(cmd),
            LedgerCommand::EditEntry(cmd) => self.handle_edit(cmd),
            LedgerCommand::DeleteEntry(cmd) => self.handle_delete(cmd),
            LedgerCommand::UndoLast(cmd) => self.handle_undo(cmd),
        }
    }
}

impl StyleLedger {
    fn ensure_style(&self, style: &StyleName) -> Result<(), DomainError> {
        if &self.style != style {
            return Err(DomainError::not_found(format!(
                "style '{style}' (ledger holds '{}')",
                self.style
            )));
        }
        Ok(())
    }

    fn require_entry(&self, entry_id: EntryId) -> Result<&CartonEntry, DomainError> {
        self.entry(entry_id).ok_or_else(|| {
            DomainError::not_found(format!("entry {entry_id} in style '{}'", self.style))
        })
    }

    fn handle_add(&self, cmd: &AddEntry) -> Result<Vec<LedgerEvent>, DomainError> {
        self.ensure_style(&cmd.style)?;
        if self.entry(cmd.entry_id).is_some() {
            return Err(DomainError::invalid_id(format!(
                "entry {} already exists in style '{}'",
                cmd.entry_id, self.style
            )));
        }
        let entry = CartonEntry::new(cmd.entry_id, cmd.occurred_at, cmd.items.clone())?;
        Ok(vec![LedgerEvent::EntryAdded(EntryAdded {
            style: cmd.style.clone(),
            entry,
        })])
    }

    fn handle_edit(&self, cmd: &EditEntry) -> Result<Vec<LedgerEvent>, DomainError> {
        self.ensure_style(&cmd.style)?;
        self.require_entry(cmd.entry_id)?;
        if cmd.items.is_empty() {
            return Err(DomainError::validation(
                "carton must contain at least one line item",
            ));
        }
        Ok(vec![LedgerEvent::EntryEdited(EntryEdited {
            style: cmd.style.clone(),
            entry_id: cmd.entry_id,
            items: cmd.items.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_delete(&self, cmd: &DeleteEntry) -> Result<Vec<LedgerEvent>, DomainError> {
        self.ensure_style(&cmd.style)?;
        let entry = self.require_entry(cmd.entry_id)?;
        Ok(vec![LedgerEvent::EntryDeleted(EntryDeleted {
            style: cmd.style.clone(),
            entry: entry.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_undo(&self, cmd: &UndoLast) -> Result<Vec<LedgerEvent>, DomainError> {
        self.ensure_style(&cmd.style)?;
        let entry = self
            .last_entry()
            .ok_or_else(|| DomainError::empty_ledger(self.style.as_str()))?;
        Ok(vec![LedgerEvent::LastEntryUndone(LastEntryUndone {
            style: cmd.style.clone(),
            entry: entry.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::size::SizeCode;
    use crate::summary::SizeTally;

    fn style() -> StyleName {
        StyleName::parse("STYLE1").unwrap()
    }

    fn item(size: SizeCode, quantity: u32) -> LineItem {
        LineItem::new(size, quantity).unwrap()
    }

    fn add(ledger: &mut StyleLedger, items: Vec<LineItem>) -> EntryId {
        let entry_id = EntryId::new();
        ledger
            .execute(&LedgerCommand::AddEntry(AddEntry {
                style: style(),
                entry_id,
                items,
                occurred_at: Utc::now(),
            }))
            .unwrap();
        entry_id
    }

    #[test]
    fn add_emits_event_and_updates_summary() {
        let ledger = StyleLedger::empty(style());
        let entry_id = EntryId::new();
        let cmd = LedgerCommand::AddEntry(AddEntry {
            style: style(),
            entry_id,
            items: vec![item(SizeCode::M, 10)],
            occurred_at: Utc::now(),
        });

        let events = ledger.handle(&cmd).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type(), "cartons.entry.added");

        let mut ledger = ledger;
        for e in &events {
            ledger.apply(e);
        }
        assert_eq!(ledger.version(), 1);
        assert_eq!(ledger.entries().len(), 1);
        assert_eq!(ledger.entries()[0].id_typed(), entry_id);
        assert_eq!(
            ledger.summary().get(SizeCode::M),
            SizeTally {
                total_quantity: 10,
                carton_count: 1
            }
        );
    }

    #[test]
    fn handle_does_not_mutate() {
        let mut ledger = StyleLedger::empty(style());
        add(&mut ledger, vec![item(SizeCode::S, 1)]);
        let before = ledger.clone();
        let _ = ledger
            .handle(&LedgerCommand::UndoLast(UndoLast {
                style: style(),
                occurred_at: Utc::now(),
            }))
            .unwrap();
        assert_eq!(ledger, before);
    }

    #[test]
    fn add_rejects_empty_items_and_duplicate_ids() {
        let mut ledger = StyleLedger::empty(style());
        let err = ledger
            .handle(&LedgerCommand::AddEntry(AddEntry {
                style: style(),
                entry_id: EntryId::new(),
                items: vec![],
                occurred_at: Utc::now(),
            }))
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));

        let entry_id = add(&mut ledger, vec![item(SizeCode::S, 1)]);
        let err = ledger
            .handle(&LedgerCommand::AddEntry(AddEntry {
                style: style(),
                entry_id,
                items: vec![item(SizeCode::S, 1)],
                occurred_at: Utc::now(),
            }))
            .unwrap_err();
        assert!(matches!(err, DomainError::InvalidId(_)));
    }

    #[test]
    fn commands_for_another_style_are_rejected() {
        let ledger = StyleLedger::empty(style());
        let err = ledger
            .handle(&LedgerCommand::UndoLast(UndoLast {
                style: StyleName::parse("OTHER").unwrap(),
                occurred_at: Utc::now(),
            }))
            .unwrap_err();
        assert!(matches!(err, DomainError::NotFound(_)));
    }

    #[test]
    fn edit_replaces_items_and_keeps_identity() {
        let mut ledger = StyleLedger::empty(style());
        let entry_id = add(&mut ledger, vec![item(SizeCode::S, 5)]);
        let created_at = ledger.entries()[0].created_at();

        ledger
            .execute(&LedgerCommand::EditEntry(EditEntry {
                style: style(),
                entry_id,
                items: vec![item(SizeCode::L, 3)],
                occurred_at: Utc::now(),
            }))
            .unwrap();

        let entry = ledger.entry(entry_id).unwrap();
        assert_eq!(entry.created_at(), created_at);
        assert_eq!(entry.items(), &[item(SizeCode::L, 3)]);
        assert_eq!(ledger.summary().get(SizeCode::S), SizeTally::default());
        assert_eq!(
            ledger.summary().get(SizeCode::L),
            SizeTally {
                total_quantity: 3,
                carton_count: 1
            }
        );
    }

    #[test]
    fn edit_and_delete_unknown_entry_is_not_found() {
        let ledger = StyleLedger::empty(style());
        let missing = EntryId::new();
        let err = ledger
            .handle(&LedgerCommand::EditEntry(EditEntry {
                style: style(),
                entry_id: missing,
                items: vec![item(SizeCode::L, 3)],
                occurred_at: Utc::now(),
            }))
            .unwrap_err();
        assert!(matches!(err, DomainError::NotFound(_)));

        let err = ledger
            .handle(&LedgerCommand::DeleteEntry(DeleteEntry {
                style: style(),
                entry_id: missing,
                occurred_at: Utc::now(),
            }))
            .unwrap_err();
        assert!(matches!(err, DomainError::NotFound(_)));
    }

    #[test]
    fn delete_from_the_middle_rebuilds() {
        let mut ledger = StyleLedger::empty(style());
        add(&mut ledger, vec![item(SizeCode::M, 10)]);
        let middle = add(&mut ledger, vec![item(SizeCode::S, 5), item(SizeCode::M, 5)]);
        add(&mut ledger, vec![item(SizeCode::L, 1)]);

        ledger
            .execute(&LedgerCommand::DeleteEntry(DeleteEntry {
                style: style(),
                entry_id: middle,
                occurred_at: Utc::now(),
            }))
            .unwrap();

        assert_eq!(ledger.entries().len(), 2);
        assert!(ledger.entry(middle).is_none());
        assert_eq!(ledger.summary(), &SizeSummary::rebuild(ledger.entries()));
        assert_eq!(ledger.summary().get(SizeCode::S), SizeTally::default());
    }

    #[test]
    fn undo_removes_most_recent_append() {
        let mut ledger = StyleLedger::empty(style());
        let first = add(&mut ledger, vec![item(SizeCode::L, 4)]);
        add(&mut ledger, vec![item(SizeCode::TwoXs, 2)]);

        let events = ledger
            .execute(&LedgerCommand::UndoLast(UndoLast {
                style: style(),
                occurred_at: Utc::now(),
            }))
            .unwrap();
        assert_eq!(events[0].event_type(), "cartons.entry.undone");

        assert_eq!(ledger.entries().len(), 1);
        assert_eq!(ledger.entries()[0].id_typed(), first);
        assert_eq!(ledger.summary(), &SizeSummary::rebuild(ledger.entries()));
    }

    #[test]
    fn undo_on_empty_ledger_fails() {
        let ledger = StyleLedger::empty(style());
        let err = ledger
            .handle(&LedgerCommand::UndoLast(UndoLast {
                style: style(),
                occurred_at: Utc::now(),
            }))
            .unwrap_err();
        assert_eq!(err, DomainError::empty_ledger("STYLE1"));
    }

    #[test]
    fn restore_rebuilds_summary() {
        let mut ledger = StyleLedger::empty(style());
        add(&mut ledger, vec![item(SizeCode::Xl, 6)]);
        add(&mut ledger, vec![item(SizeCode::Xl, 6), item(SizeCode::S, 1)]);

        let restored = StyleLedger::restore(style(), ledger.entries().to_vec());
        assert_eq!(restored.summary(), ledger.summary());
        assert_eq!(restored.version(), 0);
    }
}
