//! Sales HTTP handlers

use axum::{
    extract::{OriginalUri, Path, Query, State},
    http::StatusCode,
    Json,
};
use axum_extra::extract::WithRejection;
use shared::{Operation, Page, SalesInput, TransactionFilter};
use uuid::Uuid;

use super::paginated;
use crate::context::RequestContext;
use crate::error::{AppError, AppResult};
use crate::services::sales::Sales;
use crate::services::SalesService;
use crate::AppState;

/// List sales, newest first; `year` and `month` narrow to one local month
pub async fn list_sales(
    State(state): State<AppState>,
    ctx: RequestContext,
    OriginalUri(uri): OriginalUri,
    WithRejection(Query(filter), _): WithRejection<Query<TransactionFilter>, AppError>,
) -> AppResult<Json<Page<Sales>>> {
    let ctx = ctx.require(Operation::ManageSales)?;
    let (sales, count) = SalesService::new(state.db.clone()).list(&ctx, &filter).await?;
    Ok(Json(paginated(&uri, sales, count, filter.page_request())))
}

pub async fn get_sales(
    State(state): State<AppState>,
    ctx: RequestContext,
    WithRejection(Path(id), _): WithRejection<Path<Uuid>, AppError>,
) -> AppResult<Json<Sales>> {
    let ctx = ctx.require(Operation::ManageSales)?;
    let result = SalesService::new(state.db.clone()).get(&ctx, id).await?;
    Ok(Json(result))
}

pub async fn create_sales(
    State(state): State<AppState>,
    ctx: RequestContext,
    WithRejection(Json(input), _): WithRejection<Json<SalesInput>, AppError>,
) -> AppResult<(StatusCode, Json<Sales>)> {
    let ctx = ctx.require(Operation::ManageSales)?;
    let result = SalesService::new(state.db.clone()).create(&ctx, &input).await?;
    Ok((StatusCode::CREATED, Json(result)))
}

/// Replace a sale and its full line list
pub async fn replace_sales(
    State(state): State<AppState>,
    ctx: RequestContext,
    WithRejection(Path(id), _): WithRejection<Path<Uuid>, AppError>,
    WithRejection(Json(input), _): WithRejection<Json<SalesInput>, AppError>,
) -> AppResult<Json<Sales>> {
    let ctx = ctx.require(Operation::ManageSales)?;
    let result = SalesService::new(state.db.clone()).replace(&ctx, id, &input).await?;
    Ok(Json(result))
}

pub async fn delete_sales(
    State(state): State<AppState>,
    ctx: RequestContext,
    WithRejection(Path(id), _): WithRejection<Path<Uuid>, AppError>,
) -> AppResult<StatusCode> {
    let ctx = ctx.require(Operation::ManageSales)?;
    SalesService::new(state.db.clone()).delete(&ctx, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
