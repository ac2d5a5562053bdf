//! HTTP handlers

mod audit;
mod auth;
mod catalog;
mod health;
mod part;
mod profile;
mod report;
mod restock;
mod sales;
mod service_job;

pub use audit::*;
pub use auth::*;
pub use catalog::*;
pub use health::*;
pub use part::*;
pub use profile::*;
pub use report::*;
pub use restock::*;
pub use sales::*;
pub use service_job::*;

use axum::http::Uri;
use shared::{page_link, Page, PageRequest};

/// Wrap one page of results, linking neighbours through the request URI
pub(crate) fn paginated<T>(uri: &Uri, results: Vec<T>, count: i64, page: PageRequest) -> Page<T> {
    Page::new(results, count, page, |p| page_link(uri.path(), uri.query(), p))
}
