//! The catalog: every style ledger of one session.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use cartonledger_core::{Aggregate, DomainError, DomainResult, EntryId};

use crate::item::{CartonEntry, ItemInput, validate_items};
use crate::ledger::{AddEntry, DeleteEntry, EditEntry, LedgerCommand, LedgerEvent, StyleLedger, UndoLast};
use crate::record::{EntryRecord, Normalizer, RestoreWarning};
use crate::style::StyleName;
use crate::summary::SizeSummary;

/// Sort key for [`Catalog::entries_sorted`].
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub enum EntryOrder {
    /// Append order (the log order).
    #[default]
    Appended,
    /// By primary size in catalog order; append order within a size.
    PrimarySize,
    /// By creation time; append order for equal timestamps.
    CreatedAt,
}

/// All style ledgers, keyed by normalized style name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    styles: BTreeMap<StyleName, StyleLedger>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a carton to a style, creating the style on first use.
    pub fn add_entry(&mut self, style: &str, items: &[ItemInput]) -> DomainResult<EntryId> {
        self.add_entry_at(style, items, Utc::now())
    }

    /// [`Catalog::add_entry`] with an explicit creation time.
    pub fn add_entry_at(
        &mut self,
        style: &str,
        items: &[ItemInput],
        occurred_at: DateTime<Utc>,
    ) -> DomainResult<EntryId> {
        let style = StyleName::parse(style)?;
        let items = validate_items(items)?;
        let entry_id = EntryId::new();

        let command = LedgerCommand::AddEntry(AddEntry {
            style: style.clone(),
            entry_id,
            items,
            occurred_at,
        });

        match self.styles.get_mut(&style) {
            Some(ledger) => {
                ledger.execute(&command)?;
            }
            None => {
                let mut ledger = StyleLedger::empty(style.clone());
                ledger.execute(&command)?;
                self.styles.insert(style, ledger);
            }
        }
        Ok(entry_id)
    }

    /// Replace an entry's items wholesale; id and creation time are kept.
    pub fn edit_entry(
        &mut self,
        style: &str,
        entry_id: EntryId,
        items: &[ItemInput],
    ) -> DomainResult<()> {
        let style = StyleName::parse(style)?;
        let ledger = self.ledger_mut(&style)?;
        ledger.entry(entry_id).ok_or_else(|| {
            DomainError::not_found(format!("entry {entry_id} in style '{style}'"))
        })?;
        let items = validate_items(items)?;

        ledger.execute(&LedgerCommand::EditEntry(EditEntry {
            style,
            entry_id,
            items,
            occurred_at: Utc::now(),
        }))?;
        Ok(())
    }

    /// Remove one entry from anywhere in the log.
    pub fn delete_entry(&mut self, style: &str, entry_id: EntryId) -> DomainResult<CartonEntry> {
        let style = StyleName::parse(style)?;
        let ledger = self.ledger_mut(&style)?;
        let events = ledger.execute(&LedgerCommand::DeleteEntry(DeleteEntry {
            style: style.clone(),
            entry_id,
            occurred_at: Utc::now(),
        }))?;
        self.forget_if_drained(&style);
        removed_entry(events)
    }

    /// Remove the most recently appended entry of a style.
    ///
    /// Undoing the only entry of a style removes the style as well, so an
    /// add followed by an undo leaves the catalog as it was.
    pub fn undo_last(&mut self, style: &str) -> DomainResult<CartonEntry> {
        let style = StyleName::parse(style)?;
        let Some(ledger) = self.styles.get_mut(&style) else {
            return Err(DomainError::empty_ledger(style.as_str()));
        };
        let events = ledger.execute(&LedgerCommand::UndoLast(UndoLast {
            style: style.clone(),
            occurred_at: Utc::now(),
        }))?;
        self.forget_if_drained(&style);
        removed_entry(events)
    }

    /// Drop every style.
    pub fn reset_all(&mut self) {
        self.styles.clear();
    }

    /// Style names in key order.
    pub fn list_styles(&self) -> Vec<&StyleName> {
        self.styles.keys().collect()
    }

    pub fn ledger(&self, style: &str) -> Option<&StyleLedger> {
        let style = StyleName::parse(style).ok()?;
        self.styles.get(&style)
    }

    pub fn ledgers(&self) -> impl Iterator<Item = &StyleLedger> {
        self.styles.values()
    }

    pub fn summary(&self, style: &str) -> Option<&SizeSummary> {
        self.ledger(style).map(StyleLedger::summary)
    }

    /// Entries of a style in append order (empty for unknown styles).
    pub fn entries(&self, style: &str) -> &[CartonEntry] {
        self.ledger(style).map(StyleLedger::entries).unwrap_or_default()
    }

    /// Entries of a style in the requested order. The sort is stable.
    pub fn entries_sorted(&self, style: &str, order: EntryOrder) -> Vec<&CartonEntry> {
        let mut entries: Vec<&CartonEntry> = self.entries(style).iter().collect();
        match order {
            EntryOrder::Appended => {}
            EntryOrder::PrimarySize => entries.sort_by_key(|e| e.primary_size()),
            EntryOrder::CreatedAt => entries.sort_by_key(|e| e.created_at()),
        }
        entries
    }

    pub fn is_empty(&self) -> bool {
        self.styles.is_empty()
    }

    /// Owned, point-in-time copy for exporters.
    pub fn snapshot(&self) -> CatalogSnapshot {
        CatalogSnapshot {
            taken_at: Utc::now(),
            styles: self
                .styles
                .values()
                .map(|ledger| StyleSnapshot {
                    style: ledger.style().clone(),
                    entries: ledger.entries().to_vec(),
                    summary: *ledger.summary(),
                })
                .collect(),
        }
    }

    /// Rebuild a catalog from persisted records.
    ///
    /// Every record is normalized and every summary is rebuilt from the log;
    /// problems are reported as warnings instead of failing the restore.
    pub fn restore<I, R>(styles: I, restored_at: DateTime<Utc>) -> (Self, Vec<RestoreWarning>)
    where
        I: IntoIterator<Item = (String, R)>,
        R: IntoIterator<Item = EntryRecord>,
    {
        let mut warnings = Vec::new();
        let mut logs: BTreeMap<StyleName, Vec<CartonEntry>> = BTreeMap::new();

        for (raw_style, records) in styles {
            let records: Vec<EntryRecord> = records.into_iter().collect();
            let Ok(style) = StyleName::parse(&raw_style) else {
                warnings.push(RestoreWarning::InvalidStyle {
                    style: raw_style,
                    entries: records.len(),
                });
                continue;
            };

            let log = logs.entry(style.clone()).or_default();
            let mut normalizer = Normalizer::new(style.as_str(), restored_at);
            for existing in log.iter() {
                normalizer.mark_seen(existing.id_typed());
            }
            for (idx, record) in records.into_iter().enumerate() {
                if let Some(entry) = normalizer.normalize(idx + 1, record, &mut warnings) {
                    log.push(entry);
                }
            }
        }

        for warning in &warnings {
            tracing::warn!(%warning, "restore warning");
        }

        let styles = logs
            .into_iter()
            .filter(|(_, entries)| !entries.is_empty())
            .map(|(style, entries)| (style.clone(), StyleLedger::restore(style, entries)))
            .collect();
        (Self { styles }, warnings)
    }

    /// A style exists only while it has entries.
    fn forget_if_drained(&mut self, style: &StyleName) {
        if self.styles.get(style).is_some_and(StyleLedger::is_empty) {
            self.styles.remove(style);
            tracing::debug!(%style, "last entry removed; style dropped");
        }
    }

    fn ledger_mut(&mut self, style: &StyleName) -> DomainResult<&mut StyleLedger> {
        self.styles
            .get_mut(style)
            .ok_or_else(|| DomainError::not_found(format!("style '{style}'")))
    }
}

fn removed_entry(events: Vec<LedgerEvent>) -> DomainResult<CartonEntry> {
    events
        .into_iter()
        .find_map(|event| match event {
            LedgerEvent::EntryDeleted(e) => Some(e.entry),
            LedgerEvent::LastEntryUndone(e) => Some(e.entry),
            _ => None,
        })
        .ok_or_else(|| DomainError::not_found("removed entry"))
}

/// One style inside a [`CatalogSnapshot`].
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StyleSnapshot {
    pub style: StyleName,
    pub entries: Vec<CartonEntry>,
    pub summary: SizeSummary,
}

/// Read-only copy of the whole catalog at one point in time.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogSnapshot {
    pub taken_at: DateTime<Utc>,
    pub styles: Vec<StyleSnapshot>,
}

impl CatalogSnapshot {
    pub fn style(&self, style: &str) -> Option<&StyleSnapshot> {
        let style = StyleName::parse(style).ok()?;
        self.styles.iter().find(|s| s.style == style)
    }

    /// Cartons across every style.
    pub fn total_cartons(&self) -> usize {
        self.styles.iter().map(|s| s.entries.len()).sum()
    }
}
