use serde::Serialize;

use cartonledger_cartons::{CatalogSnapshot, SizeCode, StyleName, StyleSnapshot};

/// One carton line of a packing list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PackingListRow {
    /// 1-based, continuous across styles.
    pub carton_number: usize,
    pub style: StyleName,
    /// Units per size, in catalog order.
    pub quantities: [u64; SizeCode::COUNT],
    pub total_units: u64,
}

impl PackingListRow {
    pub fn quantity(&self, size: SizeCode) -> u64 {
        self.quantities[size.index()]
    }
}

/// Packing list: one row per carton plus per-size totals.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PackingList {
    pub rows: Vec<PackingListRow>,
    pub totals: [u64; SizeCode::COUNT],
    pub total_units: u64,
}

impl PackingList {
    /// Size column headers, in catalog order.
    pub fn size_columns() -> [SizeCode; SizeCode::COUNT] {
        SizeCode::ALL
    }

    /// Every style in key order, cartons in append order.
    pub fn from_snapshot(snapshot: &CatalogSnapshot) -> Self {
        let mut list = Self::default();
        for style in &snapshot.styles {
            list.push_style(style);
        }
        list
    }

    /// A single style, numbered from 1.
    pub fn for_style(snapshot: &CatalogSnapshot, style: &str) -> Option<Self> {
        let style = snapshot.style(style)?;
        let mut list = Self::default();
        list.push_style(style);
        Some(list)
    }

    pub fn total(&self, size: SizeCode) -> u64 {
        self.totals[size.index()]
    }

    fn push_style(&mut self, style: &StyleSnapshot) {
        for entry in &style.entries {
            let mut quantities = [0u64; SizeCode::COUNT];
            for item in entry.items() {
                quantities[item.size().index()] += u64::from(item.quantity());
            }
            for (total, q) in self.totals.iter_mut().zip(quantities) {
                *total += q;
            }
            let total_units = entry.total_quantity();
            self.total_units += total_units;
            self.rows.push(PackingListRow {
                carton_number: self.rows.len() + 1,
                style: style.style.clone(),
                quantities,
                total_units,
            });
        }
    }
}
