//! Audit log HTTP handlers

use axum::{
    extract::{OriginalUri, Query, State},
    Json,
};
use axum_extra::extract::WithRejection;
use serde::Deserialize;
use shared::{AuditTable, Operation, Page, PageRequest, ValidationCode};

use super::paginated;
use crate::context::RequestContext;
use crate::error::{AppError, AppResult};
use crate::services::audit::AuditEntry;
use crate::services::AuditService;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct AuditQuery {
    pub table: Option<String>,
    pub page: Option<i64>,
}

/// Audit log, newest first; `table` narrows to one table
pub async fn list_audit_log(
    State(state): State<AppState>,
    ctx: RequestContext,
    OriginalUri(uri): OriginalUri,
    WithRejection(Query(query), _): WithRejection<Query<AuditQuery>, AppError>,
) -> AppResult<Json<Page<AuditEntry>>> {
    let ctx = ctx.require(Operation::ViewAuditLog)?;

    let table = query
        .table
        .as_deref()
        .filter(|t| !t.is_empty())
        .map(|t| t.parse::<AuditTable>())
        .transpose()
        .map_err(|_| AppError::Validation(ValidationCode::Malformed))?;

    let page = PageRequest::new(query.page);
    let (entries, count) = AuditService::new(state.db.clone())
        .list(&ctx, table, page)
        .await?;

    Ok(Json(paginated(&uri, entries, count, page)))
}
