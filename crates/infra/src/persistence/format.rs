//! On-disk shape: `{ "<style>": { "summary": {...}, "logEntries": [...] } }`.
//!
//! `summary` is written for people and exporters reading the blob directly.
//! It is never read back: summaries are rebuilt from `logEntries` on load.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use cartonledger_cartons::{Catalog, EntryRecord, RestoreWarning};

use super::PersistenceError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedStyle {
    #[serde(default)]
    pub summary: JsonValue,
    #[serde(default)]
    pub log_entries: Vec<EntryRecord>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PersistedCatalog {
    pub styles: BTreeMap<String, PersistedStyle>,
}

impl PersistedCatalog {
    pub fn from_catalog(catalog: &Catalog) -> Result<Self, PersistenceError> {
        let mut styles = BTreeMap::new();
        for ledger in catalog.ledgers() {
            styles.insert(
                ledger.style().to_string(),
                PersistedStyle {
                    summary: serde_json::to_value(ledger.summary())?,
                    log_entries: ledger.entries().iter().map(EntryRecord::from).collect(),
                },
            );
        }
        Ok(Self { styles })
    }

    /// Normalize every record and rebuild the catalog from the logs.
    pub fn into_catalog(self, restored_at: DateTime<Utc>) -> (Catalog, Vec<RestoreWarning>) {
        Catalog::restore(
            self.styles
                .into_iter()
                .map(|(style, persisted)| (style, persisted.log_entries)),
            restored_at,
        )
    }

    pub fn to_json(&self) -> Result<String, PersistenceError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, PersistenceError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn is_empty(&self) -> bool {
        self.styles.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cartonledger_cartons::{ItemInput, SizeCode};

    #[test]
    fn writes_summary_and_canonical_log() {
        let mut catalog = Catalog::new();
        catalog
            .add_entry("style1", &[ItemInput::new("S", 5), ItemInput::new("M", 5)])
            .unwrap();

        let persisted = PersistedCatalog::from_catalog(&catalog).unwrap();
        let json: JsonValue = serde_json::from_str(&persisted.to_json().unwrap()).unwrap();

        let style = &json["STYLE1"];
        assert_eq!(style["summary"]["S"]["totalQuantity"], 5);
        assert_eq!(style["summary"]["S"]["cartonCount"], 1);
        assert_eq!(style["summary"]["M"]["cartonCount"], 0);
        assert_eq!(style["logEntries"][0]["items"][1]["size"], "M");
        assert!(style["logEntries"][0]["createdAt"].is_string());
    }

    #[test]
    fn persisted_summary_is_ignored_on_load() {
        let json = r#"{
            "STYLE1": {
                "summary": { "M": { "qty": 999, "count": 42 } },
                "logEntries": [ { "size": "M", "qty": 10 } ]
            }
        }"#;
        let (catalog, warnings) = PersistedCatalog::from_json(json)
            .unwrap()
            .into_catalog(Utc::now());
        assert!(warnings.is_empty());

        let summary = catalog.summary("STYLE1").unwrap();
        assert_eq!(summary.get(SizeCode::M).total_quantity, 10);
        assert_eq!(summary.get(SizeCode::M).carton_count, 1);
    }

    #[test]
    fn styles_without_entries_are_not_restored() {
        let (catalog, warnings) = PersistedCatalog::from_json(r#"{ "STYLE1": {}, "STYLE2": { "logEntries": [] } }"#)
            .unwrap()
            .into_catalog(Utc::now());
        assert!(warnings.is_empty());
        assert!(catalog.is_empty());
    }

    #[test]
    fn one_bad_row_does_not_fail_the_blob() {
        let json = r#"{
            "GOOD": { "logEntries": [ { "items": [ { "size": "M", "quantity": 10 }, { "size": "L", "quantity": 4 } ] } ] },
            "OLD": { "logEntries": [ { "size": "S", "qty": "7" }, { "size": "M", "quantity": 2.5 }, "garbage" ] }
        }"#;
        let (catalog, warnings) = PersistedCatalog::from_json(json)
            .unwrap()
            .into_catalog(Utc::now());

        assert_eq!(catalog.summary("GOOD").unwrap().total_quantity(), 14);
        assert_eq!(catalog.summary("OLD").unwrap().get(SizeCode::S).total_quantity, 7);
        assert_eq!(catalog.entries("OLD").len(), 1);
        assert!(matches!(
            warnings[..],
            [
                RestoreWarning::InvalidQuantity { entry: 2, .. },
                RestoreWarning::EmptyEntry { entry: 2, .. },
                RestoreWarning::UnreadableEntry { entry: 3, .. },
            ]
        ));
    }

    #[test]
    fn malformed_blob_is_a_serialization_error() {
        let err = PersistedCatalog::from_json("[1, 2, 3]").unwrap_err();
        assert!(matches!(err, PersistenceError::Serialization(_)));
    }
}
