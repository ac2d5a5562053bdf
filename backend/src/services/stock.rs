//! Stock adjustment against the database
//!
//! Wraps the pure `StockPlan` with row locks and the quantity writes. The
//! caller owns the transaction: it locks the header, calls `prepare`,
//! persists its lines and then `commit_to`, all before committing. The
//! family services go through `ledger` for that sequence.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use shared::stock::{AdjustMode, StockChange, StockLine, StockPlan};
use shared::TransactionFamily;
use sqlx::{FromRow, PgConnection};
use uuid::Uuid;

use crate::error::AppResult;

#[derive(Debug, FromRow)]
struct OnHandRow {
    id: Uuid,
    quantity: i64,
}

/// Checked quantity changes waiting to be written
#[derive(Debug)]
pub struct PreparedAdjustment {
    family: TransactionFamily,
    changes: Vec<StockChange>,
}

/// Lock every part touched by the movement and check it against on-hand stock
pub async fn prepare(
    conn: &mut PgConnection,
    family: TransactionFamily,
    mode: AdjustMode,
    previous: &[StockLine],
    current: &[StockLine],
) -> AppResult<PreparedAdjustment> {
    let plan = StockPlan::new(family, mode, previous, current);
    let on_hand = lock_parts(conn, &plan.part_ids()).await?;
    let changes = plan.apply(&on_hand)?;

    Ok(PreparedAdjustment { family, changes })
}

/// `SELECT ... FOR UPDATE` in ascending id order
pub async fn lock_parts(
    conn: &mut PgConnection,
    part_ids: &[Uuid],
) -> AppResult<HashMap<Uuid, i64>> {
    if part_ids.is_empty() {
        return Ok(HashMap::new());
    }

    let rows = sqlx::query_as::<_, OnHandRow>(
        r#"
        SELECT id, quantity
        FROM spareparts
        WHERE id = ANY($1)
        ORDER BY id
        FOR UPDATE
        "#,
    )
    .bind(part_ids)
    .fetch_all(&mut *conn)
    .await?;

    Ok(rows.into_iter().map(|r| (r.id, r.quantity)).collect())
}

impl PreparedAdjustment {
    /// Write the new quantities
    pub async fn commit_to(self, conn: &mut PgConnection, now: DateTime<Utc>) -> AppResult<()> {
        for change in &self.changes {
            sqlx::query("UPDATE spareparts SET quantity = $2, updated_at = $3 WHERE id = $1")
                .bind(change.part_id)
                .bind(change.after)
                .bind(now)
                .execute(&mut *conn)
                .await?;

            tracing::debug!(
                family = self.family.as_str(),
                part_id = %change.part_id,
                before = change.before,
                delta = change.delta,
                after = change.after,
                "Stock adjusted"
            );
        }
        Ok(())
    }
}
