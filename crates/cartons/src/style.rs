//! Style names: the case-normalized grouping key for cartons.

use core::str::FromStr;
use serde::{Deserialize, Serialize};

use cartonledger_core::{DomainError, DomainResult};

/// Normalized style key.
///
/// Trimmed, inner whitespace collapsed to single spaces, uppercased, so
/// `" style 1 "`, `"Style  1"` and `"STYLE 1"` are one style.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct StyleName(String);

impl StyleName {
    pub fn parse(raw: &str) -> DomainResult<Self> {
        let normalized = raw
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_uppercase();
        if normalized.is_empty() {
            return Err(DomainError::validation("style name cannot be empty"));
        }
        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for StyleName {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl<'de> Deserialize<'de> for StyleName {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

impl core::fmt::Display for StyleName {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for StyleName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
