//! Restock HTTP handlers

use axum::{
    extract::{OriginalUri, Path, Query, State},
    http::StatusCode,
    Json,
};
use axum_extra::extract::WithRejection;
use shared::{Operation, Page, RestockInput, TransactionFilter};
use uuid::Uuid;

use super::paginated;
use crate::context::RequestContext;
use crate::error::{AppError, AppResult};
use crate::services::restock::Restock;
use crate::services::RestockService;
use crate::AppState;

/// List restocks, newest first
pub async fn list_restocks(
    State(state): State<AppState>,
    ctx: RequestContext,
    OriginalUri(uri): OriginalUri,
    WithRejection(Query(filter), _): WithRejection<Query<TransactionFilter>, AppError>,
) -> AppResult<Json<Page<Restock>>> {
    let ctx = ctx.require(Operation::ManageRestock)?;
    let (restocks, count) = RestockService::new(state.db.clone()).list(&ctx, &filter).await?;
    Ok(Json(paginated(&uri, restocks, count, filter.page_request())))
}

pub async fn get_restock(
    State(state): State<AppState>,
    ctx: RequestContext,
    WithRejection(Path(id), _): WithRejection<Path<Uuid>, AppError>,
) -> AppResult<Json<Restock>> {
    let ctx = ctx.require(Operation::ManageRestock)?;
    let result = RestockService::new(state.db.clone()).get(&ctx, id).await?;
    Ok(Json(result))
}

pub async fn create_restock(
    State(state): State<AppState>,
    ctx: RequestContext,
    WithRejection(Json(input), _): WithRejection<Json<RestockInput>, AppError>,
) -> AppResult<(StatusCode, Json<Restock>)> {
    let ctx = ctx.require(Operation::ManageRestock)?;
    let result = RestockService::new(state.db.clone()).create(&ctx, &input).await?;
    Ok((StatusCode::CREATED, Json(result)))
}

/// Replace a restock and its full line list
pub async fn replace_restock(
    State(state): State<AppState>,
    ctx: RequestContext,
    WithRejection(Path(id), _): WithRejection<Path<Uuid>, AppError>,
    WithRejection(Json(input), _): WithRejection<Json<RestockInput>, AppError>,
) -> AppResult<Json<Restock>> {
    let ctx = ctx.require(Operation::ManageRestock)?;
    let result = RestockService::new(state.db.clone()).replace(&ctx, id, &input).await?;
    Ok(Json(result))
}

pub async fn delete_restock(
    State(state): State<AppState>,
    ctx: RequestContext,
    WithRejection(Path(id), _): WithRejection<Path<Uuid>, AppError>,
) -> AppResult<StatusCode> {
    let ctx = ctx.require(Operation::ManageRestock)?;
    RestockService::new(state.db.clone()).delete(&ctx, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
