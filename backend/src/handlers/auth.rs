//! Authentication handlers

use axum::{extract::State, http::StatusCode, Json};
use axum_extra::extract::WithRejection;
use shared::{LoginInput, Operation};

use crate::context::RequestContext;
use crate::error::{AppError, AppResult};
use crate::services::auth::AuthTokens;
use crate::services::AuthService;
use crate::AppState;

/// Login endpoint handler
pub async fn login(
    State(state): State<AppState>,
    WithRejection(Json(body), _): WithRejection<Json<LoginInput>, AppError>,
) -> AppResult<Json<AuthTokens>> {
    let auth_service = AuthService::new(state.db.clone(), &state.config);
    let tokens = auth_service.login(&body).await?;
    Ok(Json(tokens))
}

/// Logout endpoint handler; revokes the presented token
pub async fn logout(State(state): State<AppState>, ctx: RequestContext) -> AppResult<StatusCode> {
    let ctx = ctx.require(Operation::Logout)?;
    AuthService::new(state.db.clone(), &state.config)
        .logout(&ctx)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
