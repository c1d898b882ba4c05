//! Exporter-facing read models built from catalog snapshots.
//!
//! These are plain data: spreadsheet writers and label renderers own layout.

pub mod labels;
pub mod packing_list;

pub use labels::{CartonLabel, Numbering};
pub use packing_list::{PackingList, PackingListRow};
