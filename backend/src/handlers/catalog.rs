//! Reference catalog HTTP handlers
//!
//! One set of handlers serves every kind; the kind is the first path segment
//! under `/catalog` (`brand`, `category`, `storage`, `supplier`, `salesman`,
//! `mechanic`, `customer`).

use axum::{
    extract::{OriginalUri, Path, Query, State},
    http::StatusCode,
    Json,
};
use axum_extra::extract::WithRejection;
use serde::Deserialize;
use shared::{CatalogInput, CatalogKind, Operation, Page, PageRequest};
use uuid::Uuid;

use super::paginated;
use crate::context::RequestContext;
use crate::error::{AppError, AppResult};
use crate::services::catalog::CatalogEntry;
use crate::services::CatalogService;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct CatalogQuery {
    pub q: Option<String>,
    pub page: Option<i64>,
}

pub async fn list_catalog(
    State(state): State<AppState>,
    ctx: RequestContext,
    OriginalUri(uri): OriginalUri,
    WithRejection(Path(kind), _): WithRejection<Path<CatalogKind>, AppError>,
    WithRejection(Query(query), _): WithRejection<Query<CatalogQuery>, AppError>,
) -> AppResult<Json<Page<CatalogEntry>>> {
    let ctx = ctx.require(Operation::ManageCatalog)?;
    let page = PageRequest::new(query.page);
    let (entries, count) = CatalogService::new(state.db.clone())
        .list(kind, query.q.as_deref(), page, ctx.offset)
        .await?;
    Ok(Json(paginated(&uri, entries, count, page)))
}

pub async fn get_catalog_entry(
    State(state): State<AppState>,
    ctx: RequestContext,
    WithRejection(Path((kind, id)), _): WithRejection<Path<(CatalogKind, Uuid)>, AppError>,
) -> AppResult<Json<CatalogEntry>> {
    let ctx = ctx.require(Operation::ManageCatalog)?;
    let entry = CatalogService::new(state.db.clone())
        .get(kind, id, ctx.offset)
        .await?;
    Ok(Json(entry))
}

pub async fn create_catalog_entry(
    State(state): State<AppState>,
    ctx: RequestContext,
    WithRejection(Path(kind), _): WithRejection<Path<CatalogKind>, AppError>,
    WithRejection(Json(input), _): WithRejection<Json<CatalogInput>, AppError>,
) -> AppResult<(StatusCode, Json<CatalogEntry>)> {
    let ctx = ctx.require(Operation::ManageCatalog)?;
    let entry = CatalogService::new(state.db.clone())
        .create(&ctx, kind, &input)
        .await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

pub async fn update_catalog_entry(
    State(state): State<AppState>,
    ctx: RequestContext,
    WithRejection(Path((kind, id)), _): WithRejection<Path<(CatalogKind, Uuid)>, AppError>,
    WithRejection(Json(input), _): WithRejection<Json<CatalogInput>, AppError>,
) -> AppResult<Json<CatalogEntry>> {
    let ctx = ctx.require(Operation::ManageCatalog)?;
    let entry = CatalogService::new(state.db.clone())
        .update(&ctx, kind, id, &input)
        .await?;
    Ok(Json(entry))
}

pub async fn delete_catalog_entry(
    State(state): State<AppState>,
    ctx: RequestContext,
    WithRejection(Path((kind, id)), _): WithRejection<Path<(CatalogKind, Uuid)>, AppError>,
) -> AppResult<StatusCode> {
    let ctx = ctx.require(Operation::ManageCatalog)?;
    CatalogService::new(state.db.clone())
        .delete(&ctx, kind, id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
