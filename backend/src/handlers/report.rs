//! Monthly report HTTP handlers

use axum::{
    extract::{Path, Query, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use axum_extra::extract::WithRejection;
use serde::Deserialize;
use shared::{Operation, TransactionFamily, ValidationCode};

use crate::context::RequestContext;
use crate::error::{AppError, AppResult};
use crate::services::report::report_csv;
use crate::services::ReportService;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ReportQuery {
    pub year: Option<i32>,
    pub month: Option<u32>,
    /// `json` (default) or `csv`
    pub format: Option<String>,
}

/// Monthly report for one family: `/report/{sales|restock|service}?year&month`
pub async fn monthly_report(
    State(state): State<AppState>,
    ctx: RequestContext,
    WithRejection(Path(family), _): WithRejection<Path<TransactionFamily>, AppError>,
    WithRejection(Query(query), _): WithRejection<Query<ReportQuery>, AppError>,
) -> AppResult<Response> {
    let ctx = ctx.require(Operation::ViewReports)?;

    let (year, month) = match (query.year, query.month) {
        (Some(year), Some(month)) => (year, month),
        _ => return Err(AppError::Validation(ValidationCode::InvalidPeriod)),
    };

    let report = ReportService::new(state.db.clone())
        .monthly(family, year, month, ctx.offset)
        .await?;

    match query.format.as_deref() {
        None | Some("json") => Ok(Json(report).into_response()),
        Some("csv") => {
            let body = report_csv(&report)?;
            let disposition = format!(
                "attachment; filename=\"report-{}-{:04}-{:02}.csv\"",
                family.as_str(),
                year,
                month
            );
            Ok((
                [
                    (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
                    (header::CONTENT_DISPOSITION, disposition),
                ],
                body,
            )
                .into_response())
        }
        Some(_) => Err(AppError::Validation(ValidationCode::Malformed)),
    }
}
