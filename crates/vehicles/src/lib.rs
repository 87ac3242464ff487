//! Vehicle inventory domain module.
//!
//! This crate owns a vehicle's availability: the `VehicleStatus` state machine
//! is the single source of truth for sellability, and every transition guard
//! is a pure function of current status plus the requested transition.

pub mod vehicle;

pub use vehicle::{
    Vehicle, VehicleCreated, VehicleEvent, VehicleId, VehicleRegistration,
    VehicleRegistrationCreated, VehicleSold, VehicleStatus, VehicleStatusChanged, Vin,
};
