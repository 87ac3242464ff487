//! Domain error model.

use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Keep this focused on deterministic business failures (validation,
/// invariants, conflicts). Infrastructure concerns belong elsewhere.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A value failed validation (e.g. malformed input, discount out of range).
    #[error("validation failed: {0}")]
    Validation(String),

    /// The requested operation is illegal for the aggregate's current status.
    #[error("invalid state transition: {0}")]
    InvalidStateTransition(String),

    /// A reservation or sale was attempted on a vehicle that is not available.
    #[error("vehicle not available: {0}")]
    VehicleNotAvailable(String),

    /// A computed price fell below the configured floor.
    #[error("price below floor: {0}")]
    PriceBelowFloor(String),

    /// An identifier was invalid (e.g. parse failure).
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// A referenced aggregate is missing or soft-deleted.
    #[error("entity not found: {0}")]
    EntityNotFound(String),

    /// Stale version detected during commit (optimistic concurrency).
    #[error("concurrency conflict: {0}")]
    ConcurrencyConflict(String),

    /// Authorization failure at the domain boundary (e.g. role check).
    #[error("unauthorized")]
    Unauthorized,
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invalid_transition(msg: impl Into<String>) -> Self {
        Self::InvalidStateTransition(msg.into())
    }

    pub fn not_available(msg: impl Into<String>) -> Self {
        Self::VehicleNotAvailable(msg.into())
    }

    pub fn below_floor(msg: impl Into<String>) -> Self {
        Self::PriceBelowFloor(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::EntityNotFound(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::ConcurrencyConflict(msg.into())
    }
}
