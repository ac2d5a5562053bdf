//! Profile HTTP handlers

use axum::{
    extract::{Path, State},
    Json,
};
use axum_extra::extract::WithRejection;
use shared::{Operation, ProfileInput};
use uuid::Uuid;

use crate::context::RequestContext;
use crate::error::{AppError, AppResult};
use crate::services::profile::Profile;
use crate::services::ProfileService;
use crate::AppState;

pub async fn get_profile(
    State(state): State<AppState>,
    ctx: RequestContext,
    WithRejection(Path(user_id), _): WithRejection<Path<Uuid>, AppError>,
) -> AppResult<Json<Profile>> {
    let ctx = ctx.require(Operation::ViewProfile(user_id))?;
    let profile = ProfileService::new(state.db.clone()).get(&ctx, user_id).await?;
    Ok(Json(profile))
}

pub async fn update_profile(
    State(state): State<AppState>,
    ctx: RequestContext,
    WithRejection(Path(user_id), _): WithRejection<Path<Uuid>, AppError>,
    WithRejection(Json(input), _): WithRejection<Json<ProfileInput>, AppError>,
) -> AppResult<Json<Profile>> {
    let ctx = ctx.require(Operation::UpdateProfile(user_id))?;
    let profile = ProfileService::new(state.db.clone())
        .update(&ctx, user_id, &input)
        .await?;
    Ok(Json(profile))
}
