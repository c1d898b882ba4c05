//! Entity trait: identity + continuity across state changes.

/// Entity marker + minimal interface.
///
/// A carton entry keeps its identity when its items are replaced by an edit.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    /// Returns the entity identifier.
    fn id(&self) -> &Self::Id;
}
