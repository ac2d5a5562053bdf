//! Authentication middleware
//!
//! Resolves the bearer token into an `AuthUser` when one is presented.
//! Unusable tokens leave the request anonymous and the access gate decides
//! what it may do; only a failing token store ends the request here.

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::{IntoResponse, Response},
};
use shared::{Caller, Role};
use uuid::Uuid;

use crate::services::AuthService;
use crate::AppState;

/// Authenticated user information extracted from JWT
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub role: Role,
    /// `jti` of the presented token, used for logout
    pub token_id: String,
}

impl AuthUser {
    pub fn caller(&self) -> Caller {
        Caller {
            user_id: self.user_id,
            role: self.role,
        }
    }
}

/// Attach the authenticated user, if any, to the request extensions
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let token = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::to_owned);

    if let Some(token) = token {
        let service = AuthService::new(state.db.clone(), &state.config);
        match service.authenticate(&token).await {
            Ok(Some(user)) => {
                request.extensions_mut().insert(user);
            }
            Ok(None) => {
                tracing::debug!("Ignoring unusable bearer token");
            }
            Err(e) => return e.into_response(),
        }
    }

    next.run(request).await
}
