//! Shared types and domain logic for the Bengkel Sparepart backend
//!
//! This crate holds everything that does not touch the database: the part and
//! transaction payloads, the access rules, the quantity adjuster and the
//! monthly report aggregation.

pub mod access;
pub mod lines;
pub mod models;
pub mod report;
pub mod stock;
pub mod types;
pub mod validation;

pub use access::*;
pub use models::*;
pub use types::*;
pub use validation::*;
