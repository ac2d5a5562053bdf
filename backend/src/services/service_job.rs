//! Workshop service jobs: labor actions plus the parts the job consumed

use std::collections::HashMap;

use chrono::{DateTime, FixedOffset, Utc};
use serde::Serialize;
use shared::lines::{diff_lines, LineDiff};
use shared::stock::AdjustMode;
use shared::validation::validate_service;
use shared::{
    timestamp_format, to_local, AuditOperation, MessageCode, ServiceActionInput, ServiceInput,
    ServicePartInput, TransactionFamily, TransactionFilter,
};
use sqlx::{FromRow, PgConnection, PgPool};
use uuid::Uuid;

use crate::context::CallerContext;
use crate::error::AppResult;
use crate::services::{ledger, stock};

const FAMILY: TransactionFamily = TransactionFamily::Service;

/// Service job service
#[derive(Clone)]
pub struct ServiceJobService {
    db: PgPool,
}

/// Service job header with labor actions and consumed parts
#[derive(Debug, Clone, Serialize)]
pub struct ServiceJob {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<MessageCode>,
    pub id: Uuid,
    pub police_number: String,
    pub motor_type: String,
    pub mechanic_id: Option<Uuid>,
    pub mechanic_name: Option<String>,
    pub customer_id: Option<Uuid>,
    pub customer_name: Option<String>,
    pub is_paid_off: bool,
    pub deposit: i64,
    pub discount: i64,
    pub created_by: Option<Uuid>,
    #[serde(with = "timestamp_format")]
    pub created_at: DateTime<FixedOffset>,
    #[serde(with = "timestamp_format")]
    pub updated_at: DateTime<FixedOffset>,
    pub actions: Vec<ServiceAction>,
    pub content: Vec<ServicePart>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ServiceAction {
    pub id: Uuid,
    #[serde(skip)]
    pub service_id: Uuid,
    pub name: String,
    pub cost: i64,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ServicePart {
    pub id: Uuid,
    #[serde(skip)]
    pub service_id: Uuid,
    pub part_id: Option<Uuid>,
    pub part_name: String,
    pub quantity: i64,
}

#[derive(Debug, FromRow)]
struct ServiceRow {
    id: Uuid,
    police_number: String,
    motor_type: String,
    mechanic_id: Option<Uuid>,
    mechanic_name: Option<String>,
    customer_id: Option<Uuid>,
    customer_name: Option<String>,
    is_paid_off: bool,
    deposit: i64,
    discount: i64,
    created_by: Option<Uuid>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

const SERVICE_SELECT: &str = r#"
    SELECT sv.id, sv.police_number, sv.motor_type,
           sv.mechanic_id, m.name AS mechanic_name,
           sv.customer_id, c.name AS customer_name,
           sv.is_paid_off, sv.deposit, sv.discount,
           sv.created_by, sv.created_at, sv.updated_at
    FROM services sv
    LEFT JOIN mechanics m ON m.id = sv.mechanic_id
    LEFT JOIN customers c ON c.id = sv.customer_id
"#;

impl ServiceRow {
    fn into_job(
        self,
        offset: FixedOffset,
        actions: Vec<ServiceAction>,
        content: Vec<ServicePart>,
    ) -> ServiceJob {
        ServiceJob {
            message: None,
            id: self.id,
            police_number: self.police_number,
            motor_type: self.motor_type,
            mechanic_id: self.mechanic_id,
            mechanic_name: self.mechanic_name,
            customer_id: self.customer_id,
            customer_name: self.customer_name,
            is_paid_off: self.is_paid_off,
            deposit: self.deposit,
            discount: self.discount,
            created_by: self.created_by,
            created_at: to_local(self.created_at, offset),
            updated_at: to_local(self.updated_at, offset),
            actions,
            content,
        }
    }
}

impl ServiceJobService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn list(
        &self,
        ctx: &CallerContext,
        filter: &TransactionFilter,
    ) -> AppResult<(Vec<ServiceJob>, i64)> {
        let (start, end) = filter.period(ctx.offset)?.unzip();
        let page = filter.page_request();

        let count = ledger::count(&self.db, FAMILY, start, end).await?;

        let sql = format!(
            "{} {} ORDER BY sv.created_at DESC, sv.id DESC LIMIT $3 OFFSET $4",
            SERVICE_SELECT,
            ledger::period_clause("sv")
        );
        let rows = sqlx::query_as::<_, ServiceRow>(&sql)
            .bind(start)
            .bind(end)
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(&self.db)
            .await?;

        let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
        let mut actions = fetch_actions(&self.db, &ids).await?;
        let mut parts = fetch_parts(&self.db, &ids).await?;

        let jobs = rows
            .into_iter()
            .map(|row| {
                let id = row.id;
                row.into_job(
                    ctx.offset,
                    actions.remove(&id).unwrap_or_default(),
                    parts.remove(&id).unwrap_or_default(),
                )
            })
            .collect();

        Ok((jobs, count))
    }

    pub async fn get(&self, ctx: &CallerContext, id: Uuid) -> AppResult<ServiceJob> {
        let sql = format!("{} WHERE sv.id = $1", SERVICE_SELECT);
        let row = sqlx::query_as::<_, ServiceRow>(&sql)
            .bind(id)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| ledger::not_found(FAMILY))?;

        let actions = fetch_actions(&self.db, &[id])
            .await?
            .remove(&id)
            .unwrap_or_default();
        let parts = fetch_parts(&self.db, &[id])
            .await?
            .remove(&id)
            .unwrap_or_default();

        Ok(row.into_job(ctx.offset, actions, parts))
    }

    pub async fn create(&self, ctx: &CallerContext, input: &ServiceInput) -> AppResult<ServiceJob> {
        validate_service(input)?;

        let mut tx = self.db.begin().await?;

        let adjustment =
            stock::prepare(&mut tx, FAMILY, AdjustMode::Create, &[], &input.stock_lines()).await?;

        let id = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO services (
                police_number, motor_type, mechanic_id, customer_id,
                is_paid_off, deposit, discount, created_by, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $9)
            RETURNING id
            "#,
        )
        .bind(input.police_number.as_deref().map(str::trim))
        .bind(input.motor_type.as_deref().map(str::trim))
        .bind(input.mechanic_id)
        .bind(input.customer_id)
        .bind(input.is_paid_off)
        .bind(input.deposit)
        .bind(input.discount)
        .bind(ctx.user_id())
        .bind(ctx.now)
        .fetch_one(&mut *tx)
        .await?;

        for (position, action) in input.actions.iter().enumerate() {
            insert_action(&mut tx, id, position, action).await?;
        }
        for (position, line) in input.content.iter().enumerate() {
            insert_part(&mut tx, id, position, line).await?;
        }

        ledger::finish(tx, ctx, FAMILY, adjustment, AuditOperation::Create).await?;

        tracing::info!(
            family = FAMILY.as_str(),
            service_id = %id,
            user_id = %ctx.user_id(),
            actions = input.actions.len(),
            lines = input.content.len(),
            "Service job created"
        );

        let mut job = self.get(ctx, id).await?;
        job.message = Some(MessageCode::Created);
        Ok(job)
    }

    pub async fn replace(
        &self,
        ctx: &CallerContext,
        id: Uuid,
        input: &ServiceInput,
    ) -> AppResult<ServiceJob> {
        validate_service(input)?;

        let mut tx = self.db.begin().await?;

        let (part_diff, adjustment) = ledger::open_replace(
            &mut tx,
            FAMILY,
            id,
            input.content.iter().map(|l| l.id),
            &input.stock_lines(),
        )
        .await?;

        let stored_actions = sqlx::query_scalar::<_, Uuid>(
            "SELECT id FROM service_actions WHERE service_id = $1 ORDER BY position",
        )
        .bind(id)
        .fetch_all(&mut *tx)
        .await?;
        let action_diff = diff_lines(&stored_actions, input.actions.iter().map(|a| a.id))?;

        sqlx::query(
            r#"
            UPDATE services
            SET police_number = $2, motor_type = $3, mechanic_id = $4, customer_id = $5,
                is_paid_off = $6, deposit = $7, discount = $8, updated_at = $9
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(input.police_number.as_deref().map(str::trim))
        .bind(input.motor_type.as_deref().map(str::trim))
        .bind(input.mechanic_id)
        .bind(input.customer_id)
        .bind(input.is_paid_off)
        .bind(input.deposit)
        .bind(input.discount)
        .bind(ctx.now)
        .execute(&mut *tx)
        .await?;

        replace_actions(&mut tx, id, &action_diff, &input.actions).await?;
        replace_parts(&mut tx, id, &part_diff, &input.content).await?;

        ledger::finish(tx, ctx, FAMILY, adjustment, AuditOperation::Edit).await?;

        tracing::info!(
            family = FAMILY.as_str(),
            service_id = %id,
            user_id = %ctx.user_id(),
            "Service job replaced"
        );

        let mut job = self.get(ctx, id).await?;
        job.message = Some(MessageCode::Updated);
        Ok(job)
    }

    pub async fn delete(&self, ctx: &CallerContext, id: Uuid) -> AppResult<()> {
        ledger::delete(&self.db, ctx, FAMILY, id).await
    }
}

async fn replace_actions(
    conn: &mut PgConnection,
    service_id: Uuid,
    diff: &LineDiff,
    actions: &[ServiceActionInput],
) -> AppResult<()> {
    if !diff.delete.is_empty() {
        sqlx::query("DELETE FROM service_actions WHERE id = ANY($1)")
            .bind(&diff.delete)
            .execute(&mut *conn)
            .await?;
    }

    for (position, action_id) in &diff.update {
        let action = &actions[*position];
        sqlx::query("UPDATE service_actions SET name = $2, cost = $3, position = $4 WHERE id = $1")
            .bind(*action_id)
            .bind(action.name.as_deref().map(str::trim))
            .bind(action.cost)
            .bind(*position as i32)
            .execute(&mut *conn)
            .await?;
    }

    for position in &diff.insert {
        insert_action(conn, service_id, *position, &actions[*position]).await?;
    }
    Ok(())
}

async fn replace_parts(
    conn: &mut PgConnection,
    service_id: Uuid,
    diff: &LineDiff,
    content: &[ServicePartInput],
) -> AppResult<()> {
    ledger::delete_lines(conn, FAMILY, &diff.delete).await?;

    for (position, line_id) in &diff.update {
        let line = &content[*position];
        sqlx::query(
            r#"
            UPDATE service_parts
            SET part_id = $2,
                part_name = (SELECT name FROM spareparts WHERE id = $2),
                quantity = $3, position = $4
            WHERE id = $1
            "#,
        )
        .bind(*line_id)
        .bind(line.part_id)
        .bind(line.quantity)
        .bind(*position as i32)
        .execute(&mut *conn)
        .await?;
    }

    for position in &diff.insert {
        insert_part(conn, service_id, *position, &content[*position]).await?;
    }
    Ok(())
}

async fn insert_action(
    conn: &mut PgConnection,
    service_id: Uuid,
    position: usize,
    action: &ServiceActionInput,
) -> AppResult<()> {
    sqlx::query(
        "INSERT INTO service_actions (service_id, name, cost, position) VALUES ($1, $2, $3, $4)",
    )
    .bind(service_id)
    .bind(action.name.as_deref().map(str::trim))
    .bind(action.cost)
    .bind(position as i32)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

async fn insert_part(
    conn: &mut PgConnection,
    service_id: Uuid,
    position: usize,
    line: &ServicePartInput,
) -> AppResult<()> {
    sqlx::query(
        r#"
        INSERT INTO service_parts (service_id, part_id, part_name, quantity, position)
        SELECT $1, p.id, p.name, $3, $4
        FROM spareparts p
        WHERE p.id = $2
        "#,
    )
    .bind(service_id)
    .bind(line.part_id)
    .bind(line.quantity)
    .bind(position as i32)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

async fn fetch_actions(
    db: &PgPool,
    service_ids: &[Uuid],
) -> AppResult<HashMap<Uuid, Vec<ServiceAction>>> {
    let actions = sqlx::query_as::<_, ServiceAction>(
        r#"
        SELECT id, service_id, name, cost
        FROM service_actions
        WHERE service_id = ANY($1)
        ORDER BY position
        "#,
    )
    .bind(service_ids)
    .fetch_all(db)
    .await?;

    let mut grouped: HashMap<Uuid, Vec<ServiceAction>> = HashMap::new();
    for action in actions {
        grouped.entry(action.service_id).or_default().push(action);
    }
    Ok(grouped)
}

async fn fetch_parts(
    db: &PgPool,
    service_ids: &[Uuid],
) -> AppResult<HashMap<Uuid, Vec<ServicePart>>> {
    let parts = sqlx::query_as::<_, ServicePart>(
        r#"
        SELECT id, service_id, part_id, part_name, quantity
        FROM service_parts
        WHERE service_id = ANY($1)
        ORDER BY position
        "#,
    )
    .bind(service_ids)
    .fetch_all(db)
    .await?;

    let mut grouped: HashMap<Uuid, Vec<ServicePart>> = HashMap::new();
    for part in parts {
        grouped.entry(part.service_id).or_default().push(part);
    }
    Ok(grouped)
}
