//! Persisted entry shapes and their normalization into [`CartonEntry`].
//!
//! Three shapes are accepted on load:
//! - canonical: `{ "id", "createdAt", "items": [{ "size", "quantity" }] }`
//! - label-style: `{ "sizes": [{ "size", "quantity" }] }`
//! - single-size counter rows: `{ "size", "qty" }`
//!
//! Quantities may be stored as numbers, fractional numbers or numeric
//! strings. Anything else is kept as [`EntryRecord::Unreadable`] so one bad
//! row never fails the whole load.
//!
//! Everything is normalized to one canonical entry before it reaches the
//! ledger; the saved form is always canonical.

use std::collections::HashSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use thiserror::Error;

use cartonledger_core::EntryId;

use crate::item::{CartonEntry, LineItem};
use crate::size::SizeCode;

/// A quantity as stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawQuantity {
    Whole(i64),
    Fractional(f64),
    Text(String),
}

impl RawQuantity {
    /// The quantity as a whole number, if it is one.
    pub fn whole(&self) -> Option<i64> {
        match self {
            RawQuantity::Whole(q) => Some(*q),
            RawQuantity::Fractional(q) => whole_float(*q),
            RawQuantity::Text(text) => {
                let text = text.trim();
                text.parse::<i64>()
                    .ok()
                    .or_else(|| text.parse::<f64>().ok().and_then(whole_float))
            }
        }
    }
}

fn whole_float(q: f64) -> Option<i64> {
    (q.is_finite() && q.fract() == 0.0 && q.abs() <= i64::MAX as f64).then_some(q as i64)
}

impl From<i64> for RawQuantity {
    fn from(q: i64) -> Self {
        RawQuantity::Whole(q)
    }
}

impl fmt::Display for RawQuantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawQuantity::Whole(q) => write!(f, "{q}"),
            RawQuantity::Fractional(q) => write!(f, "{q}"),
            RawQuantity::Text(text) => write!(f, "'{text}'"),
        }
    }
}

/// A line item as stored, before validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawItem {
    pub size: String,
    #[serde(alias = "qty")]
    pub quantity: RawQuantity,
}

/// Multi-item record (canonical and label-style).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemsRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, alias = "created_at", skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(alias = "sizes")]
    pub items: Vec<RawItem>,
}

/// Single implicit size+quantity record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SingleRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, alias = "created_at", skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    pub size: String,
    #[serde(alias = "qty")]
    pub quantity: RawQuantity,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntryRecord {
    Items(ItemsRecord),
    Single(SingleRecord),
    /// A row matching no known shape; dropped on restore with a warning.
    Unreadable(JsonValue),
}

impl From<&CartonEntry> for EntryRecord {
    fn from(entry: &CartonEntry) -> Self {
        EntryRecord::Items(ItemsRecord {
            id: Some(entry.id_typed().to_string()),
            created_at: Some(entry.created_at()),
            items: entry
                .items()
                .iter()
                .map(|item| RawItem {
                    size: item.size().as_str().to_string(),
                    quantity: RawQuantity::Whole(i64::from(item.quantity())),
                })
                .collect(),
        })
    }
}

/// Non-fatal problem found while restoring persisted data.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RestoreWarning {
    #[error("style '{style}', entry #{entry}: skipped line item with unrecognized size '{size}'")]
    UnrecognizedSize {
        style: String,
        entry: usize,
        size: String,
    },

    #[error("style '{style}', entry #{entry}: skipped {size} line item with quantity {quantity}")]
    InvalidQuantity {
        style: String,
        entry: usize,
        size: String,
        quantity: String,
    },

    #[error("style '{style}', entry #{entry}: dropped unreadable entry {raw}")]
    UnreadableEntry {
        style: String,
        entry: usize,
        raw: String,
    },

    #[error("style '{style}', entry #{entry}: dropped entry with no usable line items")]
    EmptyEntry { style: String, entry: usize },

    #[error("style '{style}', entry #{entry}: duplicate id {id}, assigned a new one")]
    DuplicateEntryId {
        style: String,
        entry: usize,
        id: String,
    },

    #[error("dropped style with blank name ({entries} entries)")]
    InvalidStyle { style: String, entries: usize },
}

/// Turns records of one style into canonical entries, remembering seen ids.
pub(crate) struct Normalizer<'a> {
    style: &'a str,
    restored_at: DateTime<Utc>,
    seen: HashSet<EntryId>,
}

impl<'a> Normalizer<'a> {
    pub(crate) fn new(style: &'a str, restored_at: DateTime<Utc>) -> Self {
        Self {
            style,
            restored_at,
            seen: HashSet::new(),
        }
    }

    /// Reserve an id already present in the style's log.
    pub(crate) fn mark_seen(&mut self, entry_id: EntryId) {
        self.seen.insert(entry_id);
    }

    /// `entry` is the 1-based position of the record in its style's log.
    pub(crate) fn normalize(
        &mut self,
        entry: usize,
        record: EntryRecord,
        warnings: &mut Vec<RestoreWarning>,
    ) -> Option<CartonEntry> {
        let (id, created_at, raw_items) = match record {
            EntryRecord::Items(r) => (r.id, r.created_at, r.items),
            EntryRecord::Single(r) => (
                r.id,
                r.created_at,
                vec![RawItem {
                    size: r.size,
                    quantity: r.quantity,
                }],
            ),
            EntryRecord::Unreadable(raw) => {
                warnings.push(RestoreWarning::UnreadableEntry {
                    style: self.style.to_string(),
                    entry,
                    raw: raw.to_string(),
                });
                return None;
            }
        };

        let mut items = Vec::with_capacity(raw_items.len());
        for raw in raw_items {
            let Some(size) = SizeCode::lookup(&raw.size) else {
                warnings.push(RestoreWarning::UnrecognizedSize {
                    style: self.style.to_string(),
                    entry,
                    size: raw.size,
                });
                continue;
            };
            match raw
                .quantity
                .whole()
                .and_then(|q| u32::try_from(q).ok())
                .and_then(|q| LineItem::new(size, q).ok())
            {
                Some(item) => items.push(item),
                None => warnings.push(RestoreWarning::InvalidQuantity {
                    style: self.style.to_string(),
                    entry,
                    size: size.as_str().to_string(),
                    quantity: raw.quantity.to_string(),
                }),
            }
        }

        let entry_id = self.assign_id(entry, id, warnings);
        match CartonEntry::new(entry_id, created_at.unwrap_or(self.restored_at), items) {
            Ok(carton) => {
                self.seen.insert(entry_id);
                Some(carton)
            }
            Err(_) => {
                warnings.push(RestoreWarning::EmptyEntry {
                    style: self.style.to_string(),
                    entry,
                });
                None
            }
        }
    }

    fn assign_id(
        &self,
        entry: usize,
        raw: Option<String>,
        warnings: &mut Vec<RestoreWarning>,
    ) -> EntryId {
        // Legacy rows carry no id at all; that is expected, not a warning.
        let Some(raw) = raw else {
            return EntryId::new();
        };
        match raw.parse::<EntryId>() {
            Ok(id) if !self.seen.contains(&id) => id,
            Ok(_) => {
                warnings.push(RestoreWarning::DuplicateEntryId {
                    style: self.style.to_string(),
                    entry,
                    id: raw,
                });
                EntryId::new()
            }
            Err(_) => {
                tracing::debug!(style = self.style, entry, id = %raw, "replacing non-uuid entry id");
                EntryId::new()
            }
        }
    }
}
