//! Pricing engine.
//!
//! Pure, synchronous price computation: discounting, tax, price-floor
//! validation and order totals. Configuration (tax rate, minimum margin) is
//! supplied by the composition root and read-only afterwards.

pub mod engine;

pub use engine::{LineCharge, PriceBreakdown, PricingConfig, PricingEngine};
