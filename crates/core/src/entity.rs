//! Entity trait: identity + continuity across state changes.

/// Entity marker + minimal interface.
///
/// Used for records that carry identity but no command/event machinery
/// (categories, switch records, disposals).
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    /// Returns the entity identifier.
    fn id(&self) -> &Self::Id;
}
