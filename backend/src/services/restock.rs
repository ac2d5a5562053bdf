//! Restock service: inbound deliveries from suppliers

use std::collections::HashMap;

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use serde::Serialize;
use shared::stock::AdjustMode;
use shared::validation::validate_restock;
use shared::{
    date_format, timestamp_format, to_local, AuditOperation, MessageCode, RestockInput,
    RestockLineInput, TransactionFamily, TransactionFilter,
};
use sqlx::{FromRow, PgConnection, PgPool};
use uuid::Uuid;

use crate::context::CallerContext;
use crate::error::AppResult;
use crate::services::{ledger, stock};

const FAMILY: TransactionFamily = TransactionFamily::Restock;

/// Restock service
#[derive(Clone)]
pub struct RestockService {
    db: PgPool,
}

/// Restock header with its lines
#[derive(Debug, Clone, Serialize)]
pub struct Restock {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<MessageCode>,
    pub id: Uuid,
    pub invoice_number: String,
    #[serde(with = "date_format")]
    pub due_date: NaiveDate,
    pub supplier_id: Option<Uuid>,
    pub supplier_name: Option<String>,
    pub salesman_id: Option<Uuid>,
    pub salesman_name: Option<String>,
    pub is_paid_off: bool,
    pub deposit: i64,
    pub created_by: Option<Uuid>,
    #[serde(with = "timestamp_format")]
    pub created_at: DateTime<FixedOffset>,
    #[serde(with = "timestamp_format")]
    pub updated_at: DateTime<FixedOffset>,
    pub content: Vec<RestockLine>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct RestockLine {
    pub id: Uuid,
    #[serde(skip)]
    pub restock_id: Uuid,
    pub part_id: Option<Uuid>,
    pub part_name: String,
    pub quantity: i64,
    pub individual_price: i64,
}

#[derive(Debug, FromRow)]
struct RestockRow {
    id: Uuid,
    invoice_number: String,
    due_date: NaiveDate,
    supplier_id: Option<Uuid>,
    supplier_name: Option<String>,
    salesman_id: Option<Uuid>,
    salesman_name: Option<String>,
    is_paid_off: bool,
    deposit: i64,
    created_by: Option<Uuid>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

const RESTOCK_SELECT: &str = r#"
    SELECT r.id, r.invoice_number, r.due_date,
           r.supplier_id, sp.name AS supplier_name,
           r.salesman_id, sm.name AS salesman_name,
           r.is_paid_off, r.deposit, r.created_by, r.created_at, r.updated_at
    FROM restocks r
    LEFT JOIN suppliers sp ON sp.id = r.supplier_id
    LEFT JOIN salesmen sm ON sm.id = r.salesman_id
"#;

impl RestockRow {
    fn into_restock(self, offset: FixedOffset, content: Vec<RestockLine>) -> Restock {
        Restock {
            message: None,
            id: self.id,
            invoice_number: self.invoice_number,
            due_date: self.due_date,
            supplier_id: self.supplier_id,
            supplier_name: self.supplier_name,
            salesman_id: self.salesman_id,
            salesman_name: self.salesman_name,
            is_paid_off: self.is_paid_off,
            deposit: self.deposit,
            created_by: self.created_by,
            created_at: to_local(self.created_at, offset),
            updated_at: to_local(self.updated_at, offset),
            content,
        }
    }
}

impl RestockService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn list(
        &self,
        ctx: &CallerContext,
        filter: &TransactionFilter,
    ) -> AppResult<(Vec<Restock>, i64)> {
        let (start, end) = filter.period(ctx.offset)?.unzip();
        let page = filter.page_request();

        let count = ledger::count(&self.db, FAMILY, start, end).await?;

        let sql = format!(
            "{} {} ORDER BY r.created_at DESC, r.id DESC LIMIT $3 OFFSET $4",
            RESTOCK_SELECT,
            ledger::period_clause("r")
        );
        let rows = sqlx::query_as::<_, RestockRow>(&sql)
            .bind(start)
            .bind(end)
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(&self.db)
            .await?;

        let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
        let mut lines = fetch_lines(&self.db, &ids).await?;

        let restocks = rows
            .into_iter()
            .map(|row| {
                let content = lines.remove(&row.id).unwrap_or_default();
                row.into_restock(ctx.offset, content)
            })
            .collect();

        Ok((restocks, count))
    }

    pub async fn get(&self, ctx: &CallerContext, id: Uuid) -> AppResult<Restock> {
        let sql = format!("{} WHERE r.id = $1", RESTOCK_SELECT);
        let row = sqlx::query_as::<_, RestockRow>(&sql)
            .bind(id)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| ledger::not_found(FAMILY))?;

        let content = fetch_lines(&self.db, &[id])
            .await?
            .remove(&id)
            .unwrap_or_default();

        Ok(row.into_restock(ctx.offset, content))
    }

    pub async fn create(&self, ctx: &CallerContext, input: &RestockInput) -> AppResult<Restock> {
        validate_restock(input)?;

        let mut tx = self.db.begin().await?;

        let adjustment =
            stock::prepare(&mut tx, FAMILY, AdjustMode::Create, &[], &input.stock_lines()).await?;

        let id = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO restocks (
                invoice_number, due_date, supplier_id, salesman_id,
                is_paid_off, deposit, created_by, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $8)
            RETURNING id
            "#,
        )
        .bind(input.invoice_number.as_deref().map(str::trim))
        .bind(input.due_date)
        .bind(input.supplier_id)
        .bind(input.salesman_id)
        .bind(input.is_paid_off)
        .bind(input.deposit)
        .bind(ctx.user_id())
        .bind(ctx.now)
        .fetch_one(&mut *tx)
        .await?;

        for (position, line) in input.content.iter().enumerate() {
            insert_line(&mut tx, id, position, line).await?;
        }

        ledger::finish(tx, ctx, FAMILY, adjustment, AuditOperation::Create).await?;

        tracing::info!(
            family = FAMILY.as_str(),
            restock_id = %id,
            user_id = %ctx.user_id(),
            lines = input.content.len(),
            "Restock created"
        );

        let mut restock = self.get(ctx, id).await?;
        restock.message = Some(MessageCode::Created);
        Ok(restock)
    }

    pub async fn replace(
        &self,
        ctx: &CallerContext,
        id: Uuid,
        input: &RestockInput,
    ) -> AppResult<Restock> {
        validate_restock(input)?;

        let mut tx = self.db.begin().await?;

        let (diff, adjustment) = ledger::open_replace(
            &mut tx,
            FAMILY,
            id,
            input.content.iter().map(|l| l.id),
            &input.stock_lines(),
        )
        .await?;

        sqlx::query(
            r#"
            UPDATE restocks
            SET invoice_number = $2, due_date = $3, supplier_id = $4, salesman_id = $5,
                is_paid_off = $6, deposit = $7, updated_at = $8
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(input.invoice_number.as_deref().map(str::trim))
        .bind(input.due_date)
        .bind(input.supplier_id)
        .bind(input.salesman_id)
        .bind(input.is_paid_off)
        .bind(input.deposit)
        .bind(ctx.now)
        .execute(&mut *tx)
        .await?;

        ledger::delete_lines(&mut tx, FAMILY, &diff.delete).await?;

        for (position, line_id) in &diff.update {
            let line = &input.content[*position];
            sqlx::query(
                r#"
                UPDATE restock_lines
                SET part_id = $2,
                    part_name = (SELECT name FROM spareparts WHERE id = $2),
                    quantity = $3, individual_price = $4, position = $5
                WHERE id = $1
                "#,
            )
            .bind(*line_id)
            .bind(line.part_id)
            .bind(line.quantity)
            .bind(line.individual_price)
            .bind(*position as i32)
            .execute(&mut *tx)
            .await?;
        }

        for position in &diff.insert {
            insert_line(&mut tx, id, *position, &input.content[*position]).await?;
        }

        ledger::finish(tx, ctx, FAMILY, adjustment, AuditOperation::Edit).await?;

        tracing::info!(
            family = FAMILY.as_str(),
            restock_id = %id,
            user_id = %ctx.user_id(),
            updated = diff.update.len(),
            inserted = diff.insert.len(),
            deleted = diff.delete.len(),
            "Restock replaced"
        );

        let mut restock = self.get(ctx, id).await?;
        restock.message = Some(MessageCode::Updated);
        Ok(restock)
    }

    /// Delete the delivery; fails when the parts were already sold on
    pub async fn delete(&self, ctx: &CallerContext, id: Uuid) -> AppResult<()> {
        ledger::delete(&self.db, ctx, FAMILY, id).await
    }
}

async fn insert_line(
    conn: &mut PgConnection,
    restock_id: Uuid,
    position: usize,
    line: &RestockLineInput,
) -> AppResult<()> {
    sqlx::query(
        r#"
        INSERT INTO restock_lines (restock_id, part_id, part_name, quantity, individual_price, position)
        SELECT $1, p.id, p.name, $3, $4, $5
        FROM spareparts p
        WHERE p.id = $2
        "#,
    )
    .bind(restock_id)
    .bind(line.part_id)
    .bind(line.quantity)
    .bind(line.individual_price)
    .bind(position as i32)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

async fn fetch_lines(
    db: &PgPool,
    restock_ids: &[Uuid],
) -> AppResult<HashMap<Uuid, Vec<RestockLine>>> {
    let lines = sqlx::query_as::<_, RestockLine>(
        r#"
        SELECT id, restock_id, part_id, part_name, quantity, individual_price
        FROM restock_lines
        WHERE restock_id = ANY($1)
        ORDER BY position
        "#,
    )
    .bind(restock_ids)
    .fetch_all(db)
    .await?;

    let mut grouped: HashMap<Uuid, Vec<RestockLine>> = HashMap::new();
    for line in lines {
        grouped.entry(line.restock_id).or_default().push(line);
    }
    Ok(grouped)
}
