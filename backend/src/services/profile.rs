//! User profile service

use chrono::{DateTime, FixedOffset, Utc};
use serde::Serialize;
use shared::validation::validate_profile;
use shared::{timestamp_format, AuditOperation, AuditTable, ProfileInput, Role};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::context::CallerContext;
use crate::error::{AppError, AppResult, Entity};
use crate::services::AuditService;

/// Profile service
#[derive(Clone)]
pub struct ProfileService {
    db: PgPool,
}

/// Profile as returned by the API
#[derive(Debug, Clone, Serialize)]
pub struct Profile {
    pub user_id: Uuid,
    pub username: String,
    pub name: String,
    pub contact: Option<String>,
    pub address: Option<String>,
    pub role: Role,
    #[serde(with = "timestamp_format")]
    pub updated_at: DateTime<FixedOffset>,
}

#[derive(Debug, FromRow)]
struct ProfileRow {
    id: Uuid,
    username: String,
    name: String,
    contact: Option<String>,
    address: Option<String>,
    role: String,
    updated_at: DateTime<Utc>,
}

impl ProfileService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn get(&self, ctx: &CallerContext, user_id: Uuid) -> AppResult<Profile> {
        let row = sqlx::query_as::<_, ProfileRow>(
            r#"
            SELECT id, username, name, contact, address, role, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or(AppError::NotFound(Entity::Profile))?;

        let role: Role = row
            .role
            .parse()
            .map_err(|e| AppError::Internal(format!("Stored role invalid: {}", e)))?;

        Ok(Profile {
            user_id: row.id,
            username: row.username,
            name: row.name,
            contact: row.contact,
            address: row.address,
            role,
            updated_at: ctx.local(row.updated_at),
        })
    }

    /// Update name and contact details
    pub async fn update(
        &self,
        ctx: &CallerContext,
        user_id: Uuid,
        input: &ProfileInput,
    ) -> AppResult<Profile> {
        validate_profile(input)?;

        let mut tx = self.db.begin().await?;

        let result = sqlx::query(
            r#"
            UPDATE users
            SET name = $2, contact = $3, address = $4, updated_at = $5
            WHERE id = $1
            "#,
        )
        .bind(user_id)
        .bind(input.name.as_deref().map(str::trim))
        .bind(input.contact.as_deref().map(str::trim).filter(|v| !v.is_empty()))
        .bind(input.address.as_deref().map(str::trim).filter(|v| !v.is_empty()))
        .bind(ctx.now)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(Entity::Profile));
        }

        AuditService::append(&mut tx, ctx, AuditTable::Profile, AuditOperation::Edit).await?;
        tx.commit().await?;

        tracing::info!(profile_id = %user_id, user_id = %ctx.user_id(), "Profile updated");
        self.get(ctx, user_id).await
    }
}
