//! Customers and employees.
//!
//! These are **resolution targets** for the sales pipeline, not workflow
//! aggregates: the engine only needs to look them up, check they are not
//! soft-deleted, and (for employees) check the selling role. Their CRUD
//! surface lives outside this repository.

pub mod party;

pub use party::{Customer, CustomerId, Employee, EmployeeId, EmployeeRole};
