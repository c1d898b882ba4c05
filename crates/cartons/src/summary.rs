//! Per-size summary derived from a style's carton log.
//!
//! The summary is never edited by hand. It is either maintained with
//! [`SizeSummary::apply_delta`] (add / undo) or rebuilt from the log with
//! [`SizeSummary::rebuild`] (edit / delete / load).

use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::item::{CartonEntry, LineItem};
use crate::size::SizeCode;

/// Totals for one size.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SizeTally {
    pub total_quantity: u64,
    pub carton_count: u64,
}

/// Direction of an incremental update.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Sign {
    Add,
    Remove,
}

/// Per-size totals for one style. Every catalog size is always present.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct SizeSummary {
    tallies: [SizeTally; SizeCode::COUNT],
}

impl SizeSummary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild from the log, replaying entries in append order.
    pub fn rebuild<'a>(entries: impl IntoIterator<Item = &'a CartonEntry>) -> Self {
        let mut summary = Self::new();
        for entry in entries {
            summary.apply_delta(entry.items(), Sign::Add);
        }
        summary
    }

    /// Add or subtract one carton's contribution.
    ///
    /// Quantities go to each item's size; the single carton count goes to the
    /// first item's size. Subtraction saturates at zero.
    pub fn apply_delta(&mut self, items: &[LineItem], sign: Sign) {
        let Some(primary) = items.first() else {
            return;
        };

        for item in items {
            let tally = &mut self.tallies[item.size().index()];
            tally.total_quantity = step(
                tally.total_quantity,
                u64::from(item.quantity()),
                sign,
                item.size(),
                "total_quantity",
            );
        }

        let tally = &mut self.tallies[primary.size().index()];
        tally.carton_count = step(tally.carton_count, 1, sign, primary.size(), "carton_count");
    }

    pub fn get(&self, size: SizeCode) -> SizeTally {
        self.tallies[size.index()]
    }

    /// `(size, tally)` pairs in catalog order, zeros included.
    pub fn iter(&self) -> impl Iterator<Item = (SizeCode, SizeTally)> + '_ {
        SizeCode::ALL.into_iter().map(|size| (size, self.get(size)))
    }

    /// Number of cartons across all sizes ("total boxes").
    pub fn total_cartons(&self) -> u64 {
        self.tallies.iter().map(|t| t.carton_count).sum()
    }

    /// Number of units across all sizes.
    pub fn total_quantity(&self) -> u64 {
        self.tallies.iter().map(|t| t.total_quantity).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.tallies.iter().all(|t| *t == SizeTally::default())
    }
}

fn step(current: u64, amount: u64, sign: Sign, size: SizeCode, field: &'static str) -> u64 {
    match sign {
        Sign::Add => current.saturating_add(amount),
        Sign::Remove => {
            if amount > current {
                tracing::warn!(
                    size = %size,
                    field,
                    current,
                    amount,
                    "summary would go negative; clamping to zero"
                );
            }
            current.saturating_sub(amount)
        }
    }
}

impl Serialize for SizeSummary {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(SizeCode::COUNT))?;
        for (size, tally) in self.iter() {
            map.serialize_entry(size.as_str(), &tally)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cartonledger_core::EntryId;
    use chrono::Utc;

    fn item(size: SizeCode, quantity: u32) -> LineItem {
        LineItem::new(size, quantity).unwrap()
    }

    fn entry(items: Vec<LineItem>) -> CartonEntry {
        CartonEntry::new(EntryId::new(), Utc::now(), items).unwrap()
    }

    #[test]
    fn single_size_carton() {
        let mut summary = SizeSummary::new();
        summary.apply_delta(&[item(SizeCode::M, 10)], Sign::Add);
        assert_eq!(
            summary.get(SizeCode::M),
            SizeTally {
                total_quantity: 10,
                carton_count: 1
            }
        );
        assert_eq!(summary.total_cartons(), 1);
    }

    #[test]
    fn mixed_carton_counts_under_first_item() {
        let mut summary = SizeSummary::new();
        summary.apply_delta(&[item(SizeCode::S, 5), item(SizeCode::M, 5)], Sign::Add);
        assert_eq!(summary.get(SizeCode::S).total_quantity, 5);
        assert_eq!(summary.get(SizeCode::M).total_quantity, 5);
        assert_eq!(summary.get(SizeCode::S).carton_count, 1);
        assert_eq!(summary.get(SizeCode::M).carton_count, 0);
    }

    #[test]
    fn repeated_size_within_carton_counts_once() {
        let mut summary = SizeSummary::new();
        summary.apply_delta(&[item(SizeCode::L, 2), item(SizeCode::L, 3)], Sign::Add);
        assert_eq!(
            summary.get(SizeCode::L),
            SizeTally {
                total_quantity: 5,
                carton_count: 1
            }
        );
    }

    #[test]
    fn remove_inverts_add() {
        let items = [item(SizeCode::Xs, 4), item(SizeCode::TwoXl, 1)];
        let mut summary = SizeSummary::new();
        summary.apply_delta(&[item(SizeCode::Xs, 7)], Sign::Add);
        let before = summary;
        summary.apply_delta(&items, Sign::Add);
        summary.apply_delta(&items, Sign::Remove);
        assert_eq!(summary, before);
    }

    #[test]
    fn remove_clamps_at_zero() {
        let mut summary = SizeSummary::new();
        summary.apply_delta(&[item(SizeCode::S, 3)], Sign::Add);
        summary.apply_delta(&[item(SizeCode::S, 10), item(SizeCode::L, 1)], Sign::Remove);
        assert_eq!(summary.get(SizeCode::S), SizeTally::default());
        assert_eq!(summary.get(SizeCode::L), SizeTally::default());
        assert!(summary.is_empty());
    }

    #[test]
    fn empty_item_list_is_a_no_op() {
        let mut summary = SizeSummary::new();
        summary.apply_delta(&[], Sign::Add);
        assert!(summary.is_empty());
    }

    #[test]
    fn rebuild_is_idempotent() {
        let entries = vec![
            entry(vec![item(SizeCode::M, 10)]),
            entry(vec![item(SizeCode::S, 5), item(SizeCode::M, 5)]),
            entry(vec![item(SizeCode::ThreeXl, 1)]),
        ];
        let first = SizeSummary::rebuild(&entries);
        let second = SizeSummary::rebuild(&entries);
        assert_eq!(first, second);
        assert_eq!(first.total_quantity(), 21);
        assert_eq!(first.total_cartons(), 3);
        assert_eq!(first.get(SizeCode::M).carton_count, 1);
    }

    #[test]
    fn iterates_every_size_in_catalog_order() {
        let summary = SizeSummary::new();
        let sizes: Vec<_> = summary.iter().map(|(s, _)| s).collect();
        assert_eq!(sizes, SizeCode::ALL.to_vec());
    }

    #[test]
    fn serializes_as_size_keyed_map() {
        let mut summary = SizeSummary::new();
        summary.apply_delta(&[item(SizeCode::TwoXs, 2)], Sign::Add);
        let json = serde_json::to_value(summary).unwrap();
        assert_eq!(json["2XS"]["totalQuantity"], 2);
        assert_eq!(json["2XS"]["cartonCount"], 1);
        assert_eq!(json["3XL"]["cartonCount"], 0);
        assert_eq!(json.as_object().unwrap().len(), SizeCode::COUNT);
    }
}
