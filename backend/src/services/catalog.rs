//! Reference catalog service
//!
//! Brands, categories, storage bins, suppliers, salesmen, mechanics and
//! customers share one shape; the kind selects the table and which optional
//! columns exist.

use chrono::{DateTime, FixedOffset, Utc};
use serde::Serialize;
use shared::validation::validate_catalog;
use shared::{timestamp_format, to_local, AuditOperation, CatalogInput, CatalogKind, PageRequest};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::context::CallerContext;
use crate::error::{AppError, AppResult, Entity};
use crate::services::AuditService;

/// Catalog service
#[derive(Clone)]
pub struct CatalogService {
    db: PgPool,
}

/// One catalog entry
#[derive(Debug, Clone, Serialize)]
pub struct CatalogEntry {
    pub id: Uuid,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub supplier_id: Option<Uuid>,
    #[serde(with = "timestamp_format")]
    pub created_at: DateTime<FixedOffset>,
    #[serde(with = "timestamp_format")]
    pub updated_at: DateTime<FixedOffset>,
}

#[derive(Debug, FromRow)]
struct CatalogRow {
    id: Uuid,
    name: String,
    contact: Option<String>,
    address: Option<String>,
    supplier_id: Option<Uuid>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl CatalogRow {
    fn into_entry(self, offset: FixedOffset) -> CatalogEntry {
        CatalogEntry {
            id: self.id,
            name: self.name,
            contact: self.contact,
            address: self.address,
            supplier_id: self.supplier_id,
            created_at: to_local(self.created_at, offset),
            updated_at: to_local(self.updated_at, offset),
        }
    }
}

/// Column list for `kind`, absent columns selected as typed nulls
fn columns(kind: CatalogKind) -> String {
    let contact = if kind.has_contact() {
        "contact, address"
    } else {
        "NULL::text AS contact, NULL::text AS address"
    };
    let supplier = if kind.has_supplier() {
        "supplier_id"
    } else {
        "NULL::uuid AS supplier_id"
    };
    format!("id, name, {}, {}, created_at, updated_at", contact, supplier)
}

fn optional(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl CatalogService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Entries ordered by name, optionally filtered by a name fragment
    pub async fn list(
        &self,
        kind: CatalogKind,
        q: Option<&str>,
        page: PageRequest,
        offset: FixedOffset,
    ) -> AppResult<(Vec<CatalogEntry>, i64)> {
        let pattern = q
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .map(|q| format!("%{}%", q.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_")));

        let count_sql = format!(
            "SELECT COUNT(*) FROM {} WHERE ($1::text IS NULL OR name ILIKE $1)",
            kind.table()
        );
        let count = sqlx::query_scalar::<_, i64>(&count_sql)
            .bind(pattern.as_deref())
            .fetch_one(&self.db)
            .await?;

        let sql = format!(
            "SELECT {} FROM {} WHERE ($1::text IS NULL OR name ILIKE $1) ORDER BY name ASC, id ASC LIMIT $2 OFFSET $3",
            columns(kind),
            kind.table()
        );
        let rows = sqlx::query_as::<_, CatalogRow>(&sql)
            .bind(pattern.as_deref())
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(&self.db)
            .await?;

        Ok((rows.into_iter().map(|r| r.into_entry(offset)).collect(), count))
    }

    pub async fn get(&self, kind: CatalogKind, id: Uuid, offset: FixedOffset) -> AppResult<CatalogEntry> {
        let sql = format!("SELECT {} FROM {} WHERE id = $1", columns(kind), kind.table());
        let row = sqlx::query_as::<_, CatalogRow>(&sql)
            .bind(id)
            .fetch_optional(&self.db)
            .await?
            .ok_or(AppError::NotFound(Entity::from(kind)))?;

        Ok(row.into_entry(offset))
    }

    pub async fn create(
        &self,
        ctx: &CallerContext,
        kind: CatalogKind,
        input: &CatalogInput,
    ) -> AppResult<CatalogEntry> {
        validate_catalog(kind, input)?;

        let mut tx = self.db.begin().await?;

        let id = match (kind.has_contact(), kind.has_supplier()) {
            (true, true) => {
                let sql = format!(
                    "INSERT INTO {} (name, contact, address, supplier_id, created_at, updated_at) VALUES ($1, $2, $3, $4, $5, $5) RETURNING id",
                    kind.table()
                );
                sqlx::query_scalar::<_, Uuid>(&sql)
                    .bind(optional(&input.name))
                    .bind(optional(&input.contact))
                    .bind(optional(&input.address))
                    .bind(input.supplier_id)
                    .bind(ctx.now)
                    .fetch_one(&mut *tx)
                    .await?
            }
            (true, false) => {
                let sql = format!(
                    "INSERT INTO {} (name, contact, address, created_at, updated_at) VALUES ($1, $2, $3, $4, $4) RETURNING id",
                    kind.table()
                );
                sqlx::query_scalar::<_, Uuid>(&sql)
                    .bind(optional(&input.name))
                    .bind(optional(&input.contact))
                    .bind(optional(&input.address))
                    .bind(ctx.now)
                    .fetch_one(&mut *tx)
                    .await?
            }
            _ => {
                let sql = format!(
                    "INSERT INTO {} (name, created_at, updated_at) VALUES ($1, $2, $2) RETURNING id",
                    kind.table()
                );
                sqlx::query_scalar::<_, Uuid>(&sql)
                    .bind(optional(&input.name))
                    .bind(ctx.now)
                    .fetch_one(&mut *tx)
                    .await?
            }
        };

        AuditService::append(&mut tx, ctx, kind.audit_table(), AuditOperation::Create).await?;
        tx.commit().await?;

        tracing::info!(kind = kind.as_str(), id = %id, user_id = %ctx.user_id(), "Catalog entry created");
        self.get(kind, id, ctx.offset).await
    }

    pub async fn update(
        &self,
        ctx: &CallerContext,
        kind: CatalogKind,
        id: Uuid,
        input: &CatalogInput,
    ) -> AppResult<CatalogEntry> {
        validate_catalog(kind, input)?;

        let mut tx = self.db.begin().await?;

        let result = match (kind.has_contact(), kind.has_supplier()) {
            (true, true) => {
                let sql = format!(
                    "UPDATE {} SET name = $2, contact = $3, address = $4, supplier_id = $5, updated_at = $6 WHERE id = $1",
                    kind.table()
                );
                sqlx::query(&sql)
                    .bind(id)
                    .bind(optional(&input.name))
                    .bind(optional(&input.contact))
                    .bind(optional(&input.address))
                    .bind(input.supplier_id)
                    .bind(ctx.now)
                    .execute(&mut *tx)
                    .await?
            }
            (true, false) => {
                let sql = format!(
                    "UPDATE {} SET name = $2, contact = $3, address = $4, updated_at = $5 WHERE id = $1",
                    kind.table()
                );
                sqlx::query(&sql)
                    .bind(id)
                    .bind(optional(&input.name))
                    .bind(optional(&input.contact))
                    .bind(optional(&input.address))
                    .bind(ctx.now)
                    .execute(&mut *tx)
                    .await?
            }
            _ => {
                let sql = format!(
                    "UPDATE {} SET name = $2, updated_at = $3 WHERE id = $1",
                    kind.table()
                );
                sqlx::query(&sql)
                    .bind(id)
                    .bind(optional(&input.name))
                    .bind(ctx.now)
                    .execute(&mut *tx)
                    .await?
            }
        };

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(Entity::from(kind)));
        }

        AuditService::append(&mut tx, ctx, kind.audit_table(), AuditOperation::Edit).await?;
        tx.commit().await?;

        tracing::info!(kind = kind.as_str(), id = %id, user_id = %ctx.user_id(), "Catalog entry updated");
        self.get(kind, id, ctx.offset).await
    }

    /// Delete an entry; references from parts and headers become null
    pub async fn delete(&self, ctx: &CallerContext, kind: CatalogKind, id: Uuid) -> AppResult<()> {
        let mut tx = self.db.begin().await?;

        let sql = format!("DELETE FROM {} WHERE id = $1", kind.table());
        let result = sqlx::query(&sql).bind(id).execute(&mut *tx).await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(Entity::from(kind)));
        }

        AuditService::append(&mut tx, ctx, kind.audit_table(), AuditOperation::Remove).await?;
        tx.commit().await?;

        tracing::info!(kind = kind.as_str(), id = %id, user_id = %ctx.user_id(), "Catalog entry deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_columns_select_typed_nulls_for_labels() {
        let cols = columns(CatalogKind::Brand);
        assert!(cols.contains("NULL::text AS contact"));
        assert!(cols.contains("NULL::uuid AS supplier_id"));

        let cols = columns(CatalogKind::Salesman);
        assert!(cols.contains("contact, address"));
        assert!(cols.contains(", supplier_id,"));
    }
}
