//! Service job HTTP handlers

use axum::{
    extract::{OriginalUri, Path, Query, State},
    http::StatusCode,
    Json,
};
use axum_extra::extract::WithRejection;
use shared::{Operation, Page, ServiceInput, TransactionFilter};
use uuid::Uuid;

use super::paginated;
use crate::context::RequestContext;
use crate::error::{AppError, AppResult};
use crate::services::service_job::ServiceJob;
use crate::services::ServiceJobService;
use crate::AppState;

/// List service jobs, newest first
pub async fn list_service_jobs(
    State(state): State<AppState>,
    ctx: RequestContext,
    OriginalUri(uri): OriginalUri,
    WithRejection(Query(filter), _): WithRejection<Query<TransactionFilter>, AppError>,
) -> AppResult<Json<Page<ServiceJob>>> {
    let ctx = ctx.require(Operation::ManageService)?;
    let (jobs, count) = ServiceJobService::new(state.db.clone()).list(&ctx, &filter).await?;
    Ok(Json(paginated(&uri, jobs, count, filter.page_request())))
}

pub async fn get_service_job(
    State(state): State<AppState>,
    ctx: RequestContext,
    WithRejection(Path(id), _): WithRejection<Path<Uuid>, AppError>,
) -> AppResult<Json<ServiceJob>> {
    let ctx = ctx.require(Operation::ManageService)?;
    let result = ServiceJobService::new(state.db.clone()).get(&ctx, id).await?;
    Ok(Json(result))
}

pub async fn create_service_job(
    State(state): State<AppState>,
    ctx: RequestContext,
    WithRejection(Json(input), _): WithRejection<Json<ServiceInput>, AppError>,
) -> AppResult<(StatusCode, Json<ServiceJob>)> {
    let ctx = ctx.require(Operation::ManageService)?;
    let result = ServiceJobService::new(state.db.clone()).create(&ctx, &input).await?;
    Ok((StatusCode::CREATED, Json(result)))
}

/// Replace a service job with its actions and parts
pub async fn replace_service_job(
    State(state): State<AppState>,
    ctx: RequestContext,
    WithRejection(Path(id), _): WithRejection<Path<Uuid>, AppError>,
    WithRejection(Json(input), _): WithRejection<Json<ServiceInput>, AppError>,
) -> AppResult<Json<ServiceJob>> {
    let ctx = ctx.require(Operation::ManageService)?;
    let result = ServiceJobService::new(state.db.clone()).replace(&ctx, id, &input).await?;
    Ok(Json(result))
}

pub async fn delete_service_job(
    State(state): State<AppState>,
    ctx: RequestContext,
    WithRejection(Path(id), _): WithRejection<Path<Uuid>, AppError>,
) -> AppResult<StatusCode> {
    let ctx = ctx.require(Operation::ManageService)?;
    ServiceJobService::new(state.db.clone()).delete(&ctx, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
