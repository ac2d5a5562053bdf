//! Header and line plumbing shared by sales, restocks and service jobs
//!
//! Every family stores a header row plus a table of stock-moving lines keyed
//! by the header id. Mutations take their locks in one fixed order (header,
//! then parts ascending) and finish by writing quantities and the audit entry
//! inside the same transaction.

use chrono::{DateTime, Utc};
use shared::lines::{diff_lines, LineDiff};
use shared::stock::{AdjustMode, StockLine};
use shared::{AuditOperation, TransactionFamily};
use sqlx::{FromRow, PgConnection, PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::context::CallerContext;
use crate::error::{AppError, AppResult, Entity};
use crate::services::stock::{self, PreparedAdjustment};
use crate::services::AuditService;

/// Storage layout of one family
struct Tables {
    header: &'static str,
    lines: &'static str,
    key: &'static str,
    entity: Entity,
}

fn tables(family: TransactionFamily) -> Tables {
    match family {
        TransactionFamily::Sales => Tables {
            header: "sales",
            lines: "sales_lines",
            key: "sales_id",
            entity: Entity::Sales,
        },
        TransactionFamily::Restock => Tables {
            header: "restocks",
            lines: "restock_lines",
            key: "restock_id",
            entity: Entity::Restock,
        },
        TransactionFamily::Service => Tables {
            header: "services",
            lines: "service_parts",
            key: "service_id",
            entity: Entity::Service,
        },
    }
}

pub fn not_found(family: TransactionFamily) -> AppError {
    AppError::NotFound(tables(family).entity)
}

/// Stock-moving line as stored before a mutation
#[derive(Debug, FromRow)]
pub struct StoredLine {
    pub id: Uuid,
    pub part_id: Option<Uuid>,
    pub quantity: i64,
}

/// Optional local-month filter on `{alias}.created_at`, bound to `$1` and `$2`
pub fn period_clause(alias: &str) -> String {
    format!(
        "WHERE ($1::timestamptz IS NULL OR {alias}.created_at >= $1) \
         AND ($2::timestamptz IS NULL OR {alias}.created_at < $2)"
    )
}

pub async fn count(
    db: &PgPool,
    family: TransactionFamily,
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
) -> AppResult<i64> {
    let sql = format!(
        "SELECT COUNT(*) FROM {} h {}",
        tables(family).header,
        period_clause("h")
    );
    let count = sqlx::query_scalar::<_, i64>(&sql)
        .bind(start)
        .bind(end)
        .fetch_one(db)
        .await?;
    Ok(count)
}

/// `SELECT ... FOR UPDATE` on the header; unknown ids are `NotFound`
pub async fn lock_header(
    conn: &mut PgConnection,
    family: TransactionFamily,
    id: Uuid,
) -> AppResult<()> {
    let sql = format!("SELECT id FROM {} WHERE id = $1 FOR UPDATE", tables(family).header);
    sqlx::query_scalar::<_, Uuid>(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| not_found(family))?;
    Ok(())
}

pub async fn stored_lines(
    conn: &mut PgConnection,
    family: TransactionFamily,
    id: Uuid,
) -> AppResult<Vec<StoredLine>> {
    let t = tables(family);
    let sql = format!(
        "SELECT id, part_id, quantity FROM {} WHERE {} = $1 ORDER BY position",
        t.lines, t.key
    );
    let lines = sqlx::query_as::<_, StoredLine>(&sql)
        .bind(id)
        .fetch_all(&mut *conn)
        .await?;
    Ok(lines)
}

/// Lines whose part was deleted no longer move stock
fn previous_stock(stored: &[StoredLine]) -> Vec<StockLine> {
    stored
        .iter()
        .filter_map(|l| StockLine::from_parts(l.part_id, Some(l.quantity)))
        .collect()
}

/// Lock the header, diff the incoming line ids against the stored lines and
/// lock and check every part either snapshot touches
pub async fn open_replace<I>(
    conn: &mut PgConnection,
    family: TransactionFamily,
    id: Uuid,
    incoming: I,
    current: &[StockLine],
) -> AppResult<(LineDiff, PreparedAdjustment)>
where
    I: IntoIterator<Item = Option<Uuid>>,
{
    lock_header(conn, family, id).await?;
    let stored = stored_lines(conn, family, id).await?;

    let stored_ids: Vec<Uuid> = stored.iter().map(|l| l.id).collect();
    let diff = diff_lines(&stored_ids, incoming)?;

    let adjustment = stock::prepare(
        conn,
        family,
        AdjustMode::Update,
        &previous_stock(&stored),
        current,
    )
    .await?;

    Ok((diff, adjustment))
}

pub async fn delete_lines(
    conn: &mut PgConnection,
    family: TransactionFamily,
    line_ids: &[Uuid],
) -> AppResult<()> {
    if line_ids.is_empty() {
        return Ok(());
    }
    let sql = format!("DELETE FROM {} WHERE id = ANY($1)", tables(family).lines);
    sqlx::query(&sql).bind(line_ids).execute(&mut *conn).await?;
    Ok(())
}

/// Write the quantities, append the audit entry and commit
pub async fn finish(
    mut tx: Transaction<'_, Postgres>,
    ctx: &CallerContext,
    family: TransactionFamily,
    adjustment: PreparedAdjustment,
    operation: AuditOperation,
) -> AppResult<()> {
    adjustment.commit_to(&mut tx, ctx.now).await?;
    AuditService::append(&mut tx, ctx, family.audit_table(), operation).await?;
    tx.commit().await?;
    Ok(())
}

/// Delete a header with its lines, reverting their stock movement
pub async fn delete(
    db: &PgPool,
    ctx: &CallerContext,
    family: TransactionFamily,
    id: Uuid,
) -> AppResult<()> {
    let mut tx = db.begin().await?;

    lock_header(&mut tx, family, id).await?;
    let stored = stored_lines(&mut tx, family, id).await?;

    let adjustment = stock::prepare(
        &mut tx,
        family,
        AdjustMode::Delete,
        &previous_stock(&stored),
        &[],
    )
    .await?;

    let sql = format!("DELETE FROM {} WHERE id = $1", tables(family).header);
    sqlx::query(&sql).bind(id).execute(&mut *tx).await?;

    finish(tx, ctx, family, adjustment, AuditOperation::Remove).await?;

    tracing::info!(
        family = family.as_str(),
        header_id = %id,
        user_id = %ctx.user_id(),
        lines = stored.len(),
        "Transaction deleted"
    );
    Ok(())
}
