//! Spare part HTTP handlers

use axum::{
    extract::{Multipart, OriginalUri, Path, Query, State},
    http::StatusCode,
    Json,
};
use axum_extra::extract::WithRejection;
use serde::Deserialize;
use shared::{Operation, Page, PageRequest, PartFilter, PartInput, ValidationCode};
use uuid::Uuid;

use super::paginated;
use crate::context::RequestContext;
use crate::error::{AppError, AppResult};
use crate::services::part::{image_extension, Part};
use crate::services::PartService;
use crate::AppState;

fn part_service(state: &AppState) -> PartService {
    PartService::new(
        state.db.clone(),
        &state.config.media.directory,
        state.config.media.max_image_bytes,
    )
}

#[derive(Debug, Deserialize)]
pub struct FindQuery {
    pub q: Option<String>,
    pub page: Option<i64>,
}

/// Public part search; no login required
pub async fn find_parts(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    WithRejection(Query(query), _): WithRejection<Query<FindQuery>, AppError>,
) -> AppResult<Json<Page<Part>>> {
    let filter = PartFilter {
        q: query.q,
        page: query.page,
        ..Default::default()
    };
    let (parts, count) = part_service(&state).search(&filter, state.offset).await?;
    Ok(Json(paginated(&uri, parts, count, PageRequest::new(filter.page))))
}

/// List parts with search and filters
pub async fn list_parts(
    State(state): State<AppState>,
    ctx: RequestContext,
    OriginalUri(uri): OriginalUri,
    WithRejection(Query(filter), _): WithRejection<Query<PartFilter>, AppError>,
) -> AppResult<Json<Page<Part>>> {
    let ctx = ctx.require(Operation::ManageParts)?;
    let (parts, count) = part_service(&state).search(&filter, ctx.offset).await?;
    Ok(Json(paginated(&uri, parts, count, PageRequest::new(filter.page))))
}

pub async fn get_part(
    State(state): State<AppState>,
    ctx: RequestContext,
    WithRejection(Path(part_id), _): WithRejection<Path<Uuid>, AppError>,
) -> AppResult<Json<Part>> {
    let ctx = ctx.require(Operation::ManageParts)?;
    let part = part_service(&state).get(part_id, ctx.offset).await?;
    Ok(Json(part))
}

pub async fn create_part(
    State(state): State<AppState>,
    ctx: RequestContext,
    WithRejection(Json(input), _): WithRejection<Json<PartInput>, AppError>,
) -> AppResult<(StatusCode, Json<Part>)> {
    let ctx = ctx.require(Operation::ManageParts)?;
    let part = part_service(&state).create(&ctx, &input).await?;
    Ok((StatusCode::CREATED, Json(part)))
}

pub async fn update_part(
    State(state): State<AppState>,
    ctx: RequestContext,
    WithRejection(Path(part_id), _): WithRejection<Path<Uuid>, AppError>,
    WithRejection(Json(input), _): WithRejection<Json<PartInput>, AppError>,
) -> AppResult<Json<Part>> {
    let ctx = ctx.require(Operation::ManageParts)?;
    let part = part_service(&state).update(&ctx, part_id, &input).await?;
    Ok(Json(part))
}

pub async fn delete_part(
    State(state): State<AppState>,
    ctx: RequestContext,
    WithRejection(Path(part_id), _): WithRejection<Path<Uuid>, AppError>,
) -> AppResult<StatusCode> {
    let ctx = ctx.require(Operation::ManageParts)?;
    part_service(&state).delete(&ctx, part_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Upload the part image from the multipart field `image`
pub async fn upload_part_image(
    State(state): State<AppState>,
    ctx: RequestContext,
    WithRejection(Path(part_id), _): WithRejection<Path<Uuid>, AppError>,
    WithRejection(mut multipart, _): WithRejection<Multipart, AppError>,
) -> AppResult<Json<Part>> {
    let ctx = ctx.require(Operation::ManageParts)?;

    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some("image") {
            continue;
        }

        let extension = image_extension(field.content_type())
            .ok_or(AppError::Validation(ValidationCode::Malformed))?;
        let bytes = field.bytes().await?;

        let part = part_service(&state)
            .set_image(&ctx, part_id, extension, &bytes)
            .await?;
        return Ok(Json(part));
    }

    Err(AppError::Validation(ValidationCode::ImageMissing))
}
