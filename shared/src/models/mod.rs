//! Domain models for the workshop inventory

mod audit;
mod catalog;
mod part;
mod restock;
mod sales;
mod service;
mod transaction;
mod user;

pub use audit::*;
pub use catalog::*;
pub use part::*;
pub use restock::*;
pub use sales::*;
pub use service::*;
pub use transaction::*;
pub use user::*;
