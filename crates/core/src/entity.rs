//! Entity trait: identity + continuity across state changes.

/// Entity marker + minimal interface.
///
/// An invoice becomes an entity once storage has issued its identifier.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    /// Returns the entity identifier.
    fn id(&self) -> &Self::Id;
}
