//! Line items and carton entries.

use core::str::FromStr;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use cartonledger_core::{DomainError, DomainResult, Entity, EntryId, ValueObject};

use crate::size::SizeCode;

/// One (size, quantity) pair inside a carton. Quantity is always positive.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "ItemInput")]
pub struct LineItem {
    size: SizeCode,
    quantity: u32,
}

impl LineItem {
    pub fn new(size: SizeCode, quantity: u32) -> DomainResult<Self> {
        if quantity == 0 {
            return Err(DomainError::validation(format!(
                "quantity for size {size} must be positive"
            )));
        }
        Ok(Self { size, quantity })
    }

    pub fn size(&self) -> SizeCode {
        self.size
    }

    pub fn quantity(&self) -> u32 {
        self.quantity
    }
}

impl ValueObject for LineItem {}

impl core::fmt::Display for LineItem {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}-{}", self.size, self.quantity)
    }
}

/// Parses the carton-counter token form `SIZE-QTY` (e.g. `m-10`).
impl FromStr for LineItem {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let token = s.trim();
        let Some((size, quantity)) = token.split_once('-') else {
            return Err(DomainError::validation(format!(
                "expected SIZE-QUANTITY (e.g. M-10), got '{token}'"
            )));
        };
        let quantity: i64 = quantity.trim().parse().map_err(|_| {
            DomainError::validation(format!("non-numeric quantity in '{token}'"))
        })?;
        ItemInput::new(size.trim(), quantity).validate()
    }
}

impl TryFrom<ItemInput> for LineItem {
    type Error = DomainError;

    fn try_from(input: ItemInput) -> Result<Self, Self::Error> {
        input.validate()
    }
}

/// Raw, pre-parsed line item as handed over by an import layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemInput {
    pub size: String,
    pub quantity: i64,
}

impl ItemInput {
    pub fn new(size: impl Into<String>, quantity: i64) -> Self {
        Self {
            size: size.into(),
            quantity,
        }
    }

    /// Check size membership and quantity range.
    pub fn validate(&self) -> DomainResult<LineItem> {
        let size: SizeCode = self.size.parse()?;
        let quantity = u32::try_from(self.quantity)
            .ok()
            .filter(|q| *q > 0)
            .ok_or_else(|| {
                DomainError::validation(format!(
                    "quantity for size {size} must be a positive integer, got {}",
                    self.quantity
                ))
            })?;
        LineItem::new(size, quantity)
    }
}

impl From<LineItem> for ItemInput {
    fn from(item: LineItem) -> Self {
        Self::new(item.size.as_str(), i64::from(item.quantity))
    }
}

/// Validate a whole carton's worth of inputs.
///
/// Either every item is valid and the full list is returned, or nothing is and
/// the error lists each offending token.
pub fn validate_items(inputs: &[ItemInput]) -> DomainResult<Vec<LineItem>> {
    if inputs.is_empty() {
        return Err(DomainError::validation(
            "carton must contain at least one line item",
        ));
    }

    let mut items = Vec::with_capacity(inputs.len());
    let mut offending = Vec::new();
    for input in inputs {
        match input.validate() {
            Ok(item) => items.push(item),
            Err(_) => offending.push(format!("'{}-{}'", input.size.trim(), input.quantity)),
        }
    }

    if !offending.is_empty() {
        return Err(DomainError::validation(format!(
            "invalid line item(s): {} (sizes must be one of {}, quantities positive)",
            offending.join(", "),
            SizeCode::ALL.map(SizeCode::as_str).join("/"),
        )));
    }
    Ok(items)
}

/// One physical carton: a non-empty, ordered list of line items.
///
/// The first line item decides which size the carton is counted under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartonEntry {
    id: EntryId,
    created_at: DateTime<Utc>,
    items: Vec<LineItem>,
}

impl CartonEntry {
    pub fn new(id: EntryId, created_at: DateTime<Utc>, items: Vec<LineItem>) -> DomainResult<Self> {
        if items.is_empty() {
            return Err(DomainError::validation(
                "carton must contain at least one line item",
            ));
        }
        Ok(Self {
            id,
            created_at,
            items,
        })
    }

    pub fn id_typed(&self) -> EntryId {
        self.id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    /// Size the whole carton is attributed to for carton counts.
    pub fn primary_size(&self) -> SizeCode {
        self.items[0].size
    }

    /// Units across every line item.
    pub fn total_quantity(&self) -> u64 {
        self.items.iter().map(|i| u64::from(i.quantity)).sum()
    }

    /// Units of one size in this carton.
    pub fn quantity_of(&self, size: SizeCode) -> u64 {
        self.items
            .iter()
            .filter(|i| i.size == size)
            .map(|i| u64::from(i.quantity))
            .sum()
    }

    pub(crate) fn replace_items(&mut self, items: Vec<LineItem>) {
        debug_assert!(!items.is_empty());
        self.items = items;
    }
}

impl Entity for CartonEntry {
    type Id = EntryId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(size: &str, quantity: i64) -> ItemInput {
        ItemInput::new(size, quantity)
    }

    #[test]
    fn parses_counter_tokens() {
        let item: LineItem = " m-10 ".parse().unwrap();
        assert_eq!(item, LineItem::new(SizeCode::M, 10).unwrap());
        assert_eq!(item.to_string(), "M-10");

        let item: LineItem = "2xs - 4".parse().unwrap();
        assert_eq!(item.size(), SizeCode::TwoXs);
        assert_eq!(item.quantity(), 4);
    }

    #[test]
    fn rejects_malformed_tokens() {
        assert!(matches!("M10".parse::<LineItem>(), Err(DomainError::Validation(_))));
        assert!(matches!("M-ten".parse::<LineItem>(), Err(DomainError::Validation(_))));
        assert!(matches!("M--3".parse::<LineItem>(), Err(DomainError::Validation(_))));
        assert!(matches!("Q-3".parse::<LineItem>(), Err(DomainError::Validation(_))));
    }

    #[test]
    fn deserializing_validates_the_item() {
        let item: LineItem = serde_json::from_str(r#"{"size":"xl","quantity":3}"#).unwrap();
        assert_eq!(item, LineItem::new(SizeCode::Xl, 3).unwrap());

        assert!(serde_json::from_str::<LineItem>(r#"{"size":"M","quantity":0}"#).is_err());
        assert!(serde_json::from_str::<LineItem>(r#"{"size":"Z9","quantity":1}"#).is_err());
    }

    #[test]
    fn zero_quantity_is_rejected() {
        assert!(LineItem::new(SizeCode::S, 0).is_err());
        assert!(input("S", 0).validate().is_err());
        assert!(input("S", -2).validate().is_err());
        assert!(input("S", i64::from(u32::MAX) + 1).validate().is_err());
    }

    #[test]
    fn validate_items_lists_every_offending_token() {
        let err = validate_items(&[input("M", 1), input("Z9", 1), input("S", 0)]).unwrap_err();
        let DomainError::Validation(msg) = err else {
            panic!("expected validation error");
        };
        assert!(msg.contains("'Z9-1'"), "{msg}");
        assert!(msg.contains("'S-0'"), "{msg}");
        assert!(!msg.contains("'M-1'"), "{msg}");
    }

    #[test]
    fn validate_items_rejects_empty_cartons() {
        assert!(matches!(validate_items(&[]), Err(DomainError::Validation(_))));
    }

    #[test]
    fn entry_primary_size_is_first_item() {
        let items = validate_items(&[input("L", 2), input("S", 9)]).unwrap();
        let entry = CartonEntry::new(EntryId::new(), Utc::now(), items).unwrap();
        assert_eq!(entry.primary_size(), SizeCode::L);
        assert_eq!(entry.total_quantity(), 11);
        assert_eq!(entry.quantity_of(SizeCode::S), 9);
        assert_eq!(entry.quantity_of(SizeCode::M), 0);
    }

    #[test]
    fn entry_requires_items() {
        assert!(CartonEntry::new(EntryId::new(), Utc::now(), vec![]).is_err());
    }
}
