//! Per-request context
//!
//! Caller identity, clock and local offset are carried explicitly into the
//! services instead of being read from process-wide state.

use std::convert::Infallible;

use axum::{extract::FromRequestParts, http::request::Parts};
use chrono::{DateTime, FixedOffset, Utc};
use shared::{authorize, Caller, Operation};
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::AuthUser;
use crate::AppState;

/// Context of an incoming request, caller not yet authorized
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub user: Option<AuthUser>,
    pub now: DateTime<Utc>,
    pub offset: FixedOffset,
}

/// Context of a request whose caller passed the access gate
#[derive(Debug, Clone)]
pub struct CallerContext {
    pub caller: Caller,
    pub token_id: String,
    pub now: DateTime<Utc>,
    pub offset: FixedOffset,
}

impl RequestContext {
    /// Run the access gate for `op` and return the authorized context
    pub fn require(&self, op: Operation) -> AppResult<CallerContext> {
        let caller = self.user.as_ref().map(AuthUser::caller);
        authorize(caller.as_ref(), op)?;

        // authorize() rejects anonymous callers, so both are present here
        let user = self.user.clone().ok_or(crate::error::AppError::NotLoggedIn)?;
        Ok(CallerContext {
            caller: user.caller(),
            token_id: user.token_id,
            now: self.now,
            offset: self.offset,
        })
    }
}

impl CallerContext {
    pub fn user_id(&self) -> Uuid {
        self.caller.user_id
    }

    /// Render a stored timestamp in the configured local time
    pub fn local(&self, ts: DateTime<Utc>) -> DateTime<FixedOffset> {
        shared::to_local(ts, self.offset)
    }
}

#[axum::async_trait]
impl FromRequestParts<AppState> for RequestContext {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        Ok(RequestContext {
            user: parts.extensions.get::<AuthUser>().cloned(),
            now: Utc::now(),
            offset: state.offset,
        })
    }
}
