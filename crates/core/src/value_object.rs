//! Value object trait: equality by value, not identity.

/// Marker trait for value objects.
///
/// Size codes and line items are value objects: two line items with the same
/// size and quantity are interchangeable. Carton entries are not; they are
/// entities tracked by [`crate::EntryId`].
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
