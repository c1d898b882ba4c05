//! Size catalog: the fixed, ordered set of garment size codes.

use core::str::FromStr;
use serde::{Deserialize, Serialize};

use cartonledger_core::{DomainError, ValueObject};

/// A garment size code.
///
/// Declaration order is the catalog order used for every sort and every
/// per-size listing (`2XS < XS < ... < 3XL`).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SizeCode {
    #[serde(rename = "2XS")]
    TwoXs,
    #[serde(rename = "XS")]
    Xs,
    #[serde(rename = "S")]
    S,
    #[serde(rename = "M")]
    M,
    #[serde(rename = "L")]
    L,
    #[serde(rename = "XL")]
    Xl,
    #[serde(rename = "2XL")]
    TwoXl,
    #[serde(rename = "3XL")]
    ThreeXl,
}

impl SizeCode {
    /// Every size, in catalog order.
    pub const ALL: [SizeCode; 8] = [
        SizeCode::TwoXs,
        SizeCode::Xs,
        SizeCode::S,
        SizeCode::M,
        SizeCode::L,
        SizeCode::Xl,
        SizeCode::TwoXl,
        SizeCode::ThreeXl,
    ];

    pub const COUNT: usize = Self::ALL.len();

    /// Canonical (uppercase) code.
    pub fn as_str(self) -> &'static str {
        match self {
            SizeCode::TwoXs => "2XS",
            SizeCode::Xs => "XS",
            SizeCode::S => "S",
            SizeCode::M => "M",
            SizeCode::L => "L",
            SizeCode::Xl => "XL",
            SizeCode::TwoXl => "2XL",
            SizeCode::ThreeXl => "3XL",
        }
    }

    /// Position in the catalog (0-based).
    pub fn index(self) -> usize {
        self as usize
    }

    /// Case-insensitive lookup; `None` for codes outside the catalog.
    pub fn lookup(code: &str) -> Option<SizeCode> {
        let code = code.trim();
        Self::ALL
            .into_iter()
            .find(|size| size.as_str().eq_ignore_ascii_case(code))
    }
}

impl ValueObject for SizeCode {}

impl core::fmt::Display for SizeCode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SizeCode {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::lookup(s)
            .ok_or_else(|| DomainError::validation(format!("unknown size code '{}'", s.trim())))
    }
}
