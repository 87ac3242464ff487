//! Value object trait: equality by value, not identity.

/// Marker trait for value objects.
///
/// Value objects are **immutable** and **compared by value** - they represent
/// concepts where identity doesn't matter, only the values do. To "modify" a
/// value object, create a new one with the new values.
///
/// Example:
/// - `Money { amount: 100, currency: "USD" }` is a value object
/// - `Vehicle { id: VehicleId(...), vin: "..." }` is an entity
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
