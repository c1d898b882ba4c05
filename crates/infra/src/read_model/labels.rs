use serde::Serialize;

use cartonledger_cartons::{CatalogSnapshot, LineItem, StyleName, StyleSnapshot};

/// Data printed on one carton label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartonLabel {
    pub po_number: String,
    pub style: StyleName,
    pub carton_number: usize,
    pub carton_total: usize,
    pub contents: Vec<LineItem>,
}

/// How a run of labels is numbered.
///
/// Label runs for one shipment are often printed in batches; a batch picks up
/// where the previous one stopped and prints the shipment-wide total.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Numbering {
    /// Number on the first label of the run (at least 1).
    pub first_carton: usize,
    /// Printed total. `None` prints the number of the run's last label.
    pub carton_total: Option<usize>,
}

impl Default for Numbering {
    fn default() -> Self {
        Self {
            first_carton: 1,
            carton_total: None,
        }
    }
}

impl Numbering {
    pub fn starting_at(first_carton: usize) -> Self {
        Self {
            first_carton: first_carton.max(1),
            ..Self::default()
        }
    }

    pub fn with_total(self, carton_total: usize) -> Self {
        Self {
            carton_total: Some(carton_total),
            ..self
        }
    }

    /// Numbering for the run printed after `labels`.
    pub fn after(self, labels: &[CartonLabel]) -> Self {
        Self {
            first_carton: self.first_carton.max(1) + labels.len(),
            ..self
        }
    }
}

impl CartonLabel {
    /// `"n/total"`, as printed in the carton-number box.
    pub fn carton_of(&self) -> String {
        format!("{}/{}", self.carton_number, self.carton_total)
    }

    /// Labels for one style, numbered `1/N..N/N` in append order.
    pub fn for_style(snapshot: &CatalogSnapshot, style: &str, po_number: &str) -> Option<Vec<Self>> {
        Self::for_style_numbered(snapshot, style, po_number, Numbering::default())
    }

    /// Labels for one style with explicit numbering.
    pub fn for_style_numbered(
        snapshot: &CatalogSnapshot,
        style: &str,
        po_number: &str,
        numbering: Numbering,
    ) -> Option<Vec<Self>> {
        let style = snapshot.style(style)?;
        Some(Self::number(std::iter::once(style), style.entries.len(), po_number, numbering))
    }

    /// Labels for the whole shipment, numbered across every style.
    pub fn for_shipment(snapshot: &CatalogSnapshot, po_number: &str) -> Vec<Self> {
        Self::for_shipment_numbered(snapshot, po_number, Numbering::default())
    }

    pub fn for_shipment_numbered(snapshot: &CatalogSnapshot, po_number: &str, numbering: Numbering) -> Vec<Self> {
        Self::number(snapshot.styles.iter(), snapshot.total_cartons(), po_number, numbering)
    }

    fn number<'a>(
        styles: impl Iterator<Item = &'a StyleSnapshot>,
        count: usize,
        po_number: &str,
        numbering: Numbering,
    ) -> Vec<Self> {
        let po_number = po_number.trim();
        let first = numbering.first_carton.max(1);
        let carton_total = numbering.carton_total.unwrap_or(first - 1 + count);
        styles
            .flat_map(|style| style.entries.iter().map(move |entry| (style, entry)))
            .enumerate()
            .map(|(idx, (style, entry))| CartonLabel {
                po_number: po_number.to_string(),
                style: style.style.clone(),
                carton_number: first + idx,
                carton_total,
                contents: entry.items().to_vec(),
            })
            .collect()
    }
}
