//! Audit log: one append-only entry per successful mutation

use chrono::{DateTime, FixedOffset, Utc};
use serde::Serialize;
use shared::{timestamp_format, AuditOperation, AuditTable, PageRequest};
use sqlx::{FromRow, PgConnection, PgPool};
use uuid::Uuid;

use crate::context::CallerContext;
use crate::error::AppResult;

/// Audit log service
#[derive(Clone)]
pub struct AuditService {
    db: PgPool,
}

/// Audit entry as shown to owners
#[derive(Debug, Clone, Serialize)]
pub struct AuditEntry {
    pub id: Uuid,
    #[serde(with = "timestamp_format")]
    pub timestamp: DateTime<FixedOffset>,
    pub user_id: Option<Uuid>,
    pub user_name: Option<String>,
    pub table_name: String,
    pub operation: String,
}

#[derive(Debug, FromRow)]
struct AuditRow {
    id: Uuid,
    logged_at: DateTime<Utc>,
    user_id: Option<Uuid>,
    user_name: Option<String>,
    table_name: String,
    operation: String,
}

impl AuditService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Append an entry inside the caller's database transaction
    pub async fn append(
        conn: &mut PgConnection,
        ctx: &CallerContext,
        table: AuditTable,
        operation: AuditOperation,
    ) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO audit_log (logged_at, user_id, table_name, operation)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(ctx.now)
        .bind(ctx.user_id())
        .bind(table.as_str())
        .bind(operation.as_str())
        .execute(&mut *conn)
        .await?;

        tracing::debug!(table = table.as_str(), operation = %operation, "Audit entry appended");
        Ok(())
    }

    /// Newest entries first, optionally for one table
    pub async fn list(
        &self,
        ctx: &CallerContext,
        table: Option<AuditTable>,
        page: PageRequest,
    ) -> AppResult<(Vec<AuditEntry>, i64)> {
        let table = table.map(|t| t.as_str());

        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM audit_log WHERE ($1::text IS NULL OR table_name = $1)",
        )
        .bind(table)
        .fetch_one(&self.db)
        .await?;

        let rows = sqlx::query_as::<_, AuditRow>(
            r#"
            SELECT a.id, a.logged_at, a.user_id, u.name AS user_name, a.table_name, a.operation
            FROM audit_log a
            LEFT JOIN users u ON u.id = a.user_id
            WHERE ($1::text IS NULL OR a.table_name = $1)
            ORDER BY a.logged_at DESC, a.id DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(table)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.db)
        .await?;

        let entries = rows
            .into_iter()
            .map(|r| AuditEntry {
                id: r.id,
                timestamp: ctx.local(r.logged_at),
                user_id: r.user_id,
                user_name: r.user_name,
                table_name: r.table_name,
                operation: r.operation,
            })
            .collect();

        Ok((entries, count))
    }
}
