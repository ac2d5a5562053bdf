//! Sales service: outbound transactions that draw parts from stock

use std::collections::HashMap;

use chrono::{DateTime, FixedOffset, Utc};
use serde::Serialize;
use shared::stock::AdjustMode;
use shared::validation::validate_sales;
use shared::{
    timestamp_format, to_local, AuditOperation, MessageCode, SalesInput, SalesLineInput,
    TransactionFamily, TransactionFilter,
};
use sqlx::{FromRow, PgConnection, PgPool};
use uuid::Uuid;

use crate::context::CallerContext;
use crate::error::AppResult;
use crate::services::{ledger, stock};

const FAMILY: TransactionFamily = TransactionFamily::Sales;

/// Sales service
#[derive(Clone)]
pub struct SalesService {
    db: PgPool,
}

/// Sales header with its lines
#[derive(Debug, Clone, Serialize)]
pub struct Sales {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<MessageCode>,
    pub id: Uuid,
    pub customer_id: Option<Uuid>,
    pub customer_name: Option<String>,
    pub customer_contact: Option<String>,
    pub is_paid_off: bool,
    pub deposit: i64,
    pub created_by: Option<Uuid>,
    #[serde(with = "timestamp_format")]
    pub created_at: DateTime<FixedOffset>,
    #[serde(with = "timestamp_format")]
    pub updated_at: DateTime<FixedOffset>,
    pub content: Vec<SalesLine>,
}

/// Sales line; `part_name` is kept even after the part is deleted
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct SalesLine {
    pub id: Uuid,
    #[serde(skip)]
    pub sales_id: Uuid,
    pub part_id: Option<Uuid>,
    pub part_name: String,
    pub quantity: i64,
    pub is_workshop: bool,
}

#[derive(Debug, FromRow)]
struct SalesRow {
    id: Uuid,
    customer_id: Option<Uuid>,
    customer_name: Option<String>,
    customer_contact: Option<String>,
    is_paid_off: bool,
    deposit: i64,
    created_by: Option<Uuid>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

const SALES_SELECT: &str = r#"
    SELECT s.id, s.customer_id,
           COALESCE(c.name, s.customer_name) AS customer_name,
           COALESCE(c.contact, s.customer_contact) AS customer_contact,
           s.is_paid_off, s.deposit, s.created_by, s.created_at, s.updated_at
    FROM sales s
    LEFT JOIN customers c ON c.id = s.customer_id
"#;

impl SalesRow {
    fn into_sales(self, offset: FixedOffset, content: Vec<SalesLine>) -> Sales {
        Sales {
            message: None,
            id: self.id,
            customer_id: self.customer_id,
            customer_name: self.customer_name,
            customer_contact: self.customer_contact,
            is_paid_off: self.is_paid_off,
            deposit: self.deposit,
            created_by: self.created_by,
            created_at: to_local(self.created_at, offset),
            updated_at: to_local(self.updated_at, offset),
            content,
        }
    }
}

impl SalesService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Newest first, optionally limited to one local month
    pub async fn list(
        &self,
        ctx: &CallerContext,
        filter: &TransactionFilter,
    ) -> AppResult<(Vec<Sales>, i64)> {
        let (start, end) = filter.period(ctx.offset)?.unzip();
        let page = filter.page_request();

        let count = ledger::count(&self.db, FAMILY, start, end).await?;

        let sql = format!(
            "{} {} ORDER BY s.created_at DESC, s.id DESC LIMIT $3 OFFSET $4",
            SALES_SELECT,
            ledger::period_clause("s")
        );
        let rows = sqlx::query_as::<_, SalesRow>(&sql)
            .bind(start)
            .bind(end)
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(&self.db)
            .await?;

        let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
        let mut lines = fetch_lines(&self.db, &ids).await?;

        let sales = rows
            .into_iter()
            .map(|row| {
                let content = lines.remove(&row.id).unwrap_or_default();
                row.into_sales(ctx.offset, content)
            })
            .collect();

        Ok((sales, count))
    }

    pub async fn get(&self, ctx: &CallerContext, id: Uuid) -> AppResult<Sales> {
        let sql = format!("{} WHERE s.id = $1", SALES_SELECT);
        let row = sqlx::query_as::<_, SalesRow>(&sql)
            .bind(id)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| ledger::not_found(FAMILY))?;

        let content = fetch_lines(&self.db, &[id])
            .await?
            .remove(&id)
            .unwrap_or_default();

        Ok(row.into_sales(ctx.offset, content))
    }

    pub async fn create(&self, ctx: &CallerContext, input: &SalesInput) -> AppResult<Sales> {
        validate_sales(input)?;

        let mut tx = self.db.begin().await?;

        let adjustment =
            stock::prepare(&mut tx, FAMILY, AdjustMode::Create, &[], &input.stock_lines()).await?;

        let id = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO sales (
                customer_id, customer_name, customer_contact,
                is_paid_off, deposit, created_by, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $7)
            RETURNING id
            "#,
        )
        .bind(input.customer_id)
        .bind(input.inline_name())
        .bind(input.inline_contact())
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
            sales_id = %id,
            user_id = %ctx.user_id(),
            lines = input.content.len(),
            "Sales created"
        );

        let mut sales = self.get(ctx, id).await?;
        sales.message = Some(MessageCode::Created);
        Ok(sales)
    }

    /// Replace header fields and the whole line collection
    pub async fn replace(
        &self,
        ctx: &CallerContext,
        id: Uuid,
        input: &SalesInput,
    ) -> AppResult<Sales> {
        validate_sales(input)?;

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
            UPDATE sales
            SET customer_id = $2, customer_name = $3, customer_contact = $4,
                is_paid_off = $5, deposit = $6, updated_at = $7
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(input.customer_id)
        .bind(input.inline_name())
        .bind(input.inline_contact())
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
                UPDATE sales_lines
                SET part_id = $2,
                    part_name = (SELECT name FROM spareparts WHERE id = $2),
                    quantity = $3, is_workshop = $4, position = $5
                WHERE id = $1
                "#,
            )
            .bind(*line_id)
            .bind(line.part_id)
            .bind(line.quantity)
            .bind(line.is_workshop)
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
            sales_id = %id,
            user_id = %ctx.user_id(),
            updated = diff.update.len(),
            inserted = diff.insert.len(),
            deleted = diff.delete.len(),
            "Sales replaced"
        );

        let mut sales = self.get(ctx, id).await?;
        sales.message = Some(MessageCode::Updated);
        Ok(sales)
    }

    /// Delete the header and its lines, returning the parts to stock
    pub async fn delete(&self, ctx: &CallerContext, id: Uuid) -> AppResult<()> {
        ledger::delete(&self.db, ctx, FAMILY, id).await
    }
}

async fn insert_line(
    conn: &mut PgConnection,
    sales_id: Uuid,
    position: usize,
    line: &SalesLineInput,
) -> AppResult<()> {
    sqlx::query(
        r#"
        INSERT INTO sales_lines (sales_id, part_id, part_name, quantity, is_workshop, position)
        SELECT $1, p.id, p.name, $3, $4, $5
        FROM spareparts p
        WHERE p.id = $2
        "#,
    )
    .bind(sales_id)
    .bind(line.part_id)
    .bind(line.quantity)
    .bind(line.is_workshop)
    .bind(position as i32)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

async fn fetch_lines(db: &PgPool, sales_ids: &[Uuid]) -> AppResult<HashMap<Uuid, Vec<SalesLine>>> {
    let lines = sqlx::query_as::<_, SalesLine>(
        r#"
        SELECT id, sales_id, part_id, part_name, quantity, is_workshop
        FROM sales_lines
        WHERE sales_id = ANY($1)
        ORDER BY position
        "#,
    )
    .bind(sales_ids)
    .fetch_all(db)
    .await?;

    let mut grouped: HashMap<Uuid, Vec<SalesLine>> = HashMap::new();
    for line in lines {
        grouped.entry(line.sales_id).or_default().push(line);
    }
    Ok(grouped)
}
