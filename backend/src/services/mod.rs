//! Business logic services for the Bengkel Sparepart backend

pub mod audit;
pub mod auth;
pub mod catalog;
pub mod ledger;
pub mod part;
pub mod profile;
pub mod report;
pub mod restock;
pub mod sales;
pub mod service_job;
pub mod stock;

pub use audit::AuditService;
pub use auth::AuthService;
pub use catalog::CatalogService;
pub use part::PartService;
pub use profile::ProfileService;
pub use report::ReportService;
pub use restock::RestockService;
pub use sales::SalesService;
pub use service_job::ServiceJobService;
