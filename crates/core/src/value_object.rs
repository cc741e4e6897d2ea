//! Value object trait: equality by value, not identity.
//!
//! A line item before persistence has no identity of its own: two items with
//! the same description, code, quantity and rate are interchangeable.

/// Marker trait for value objects.
///
/// Value objects are **immutable** and **compared by value**. To "modify" one,
/// build a new one.
///
/// ```ignore
/// #[derive(Debug, Clone, PartialEq, Eq)]
/// struct LineItem {
///     description: String,
///     quantity: Decimal,
///     unit_rate: Decimal,
/// }
///
/// impl ValueObject for LineItem {}
/// ```
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}

impl ValueObject for crate::amount::Amount {}
