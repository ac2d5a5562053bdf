//! Monthly report service
//!
//! Reads the headers created in the requested local month and their lines,
//! prices the lines with the shared line-value rules and hands one row per
//! header to the pure aggregator.

use std::collections::HashMap;

use chrono::{DateTime, FixedOffset, Utc};
use shared::report::{
    aggregate, month_bounds, restock_total, sales_total, service_total, MonthlyReport, ReportRow,
    SalesLineValue,
};
use shared::TransactionFamily;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::error::{AppError, AppResult};

/// Report service
#[derive(Clone)]
pub struct ReportService {
    db: PgPool,
}

#[derive(Debug, FromRow)]
struct HeaderRow {
    id: Uuid,
    created_at: DateTime<Utc>,
    deposit: i64,
    discount: i64,
}

#[derive(Debug, FromRow)]
struct SalesLineRow {
    header_id: Uuid,
    quantity: i64,
    is_workshop: bool,
    price: i64,
    workshop_price: i64,
}

#[derive(Debug, FromRow)]
struct PricedLineRow {
    header_id: Uuid,
    quantity: i64,
    price: i64,
}

#[derive(Debug, FromRow)]
struct ActionRow {
    header_id: Uuid,
    cost: i64,
}

impl ReportService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Day-by-day totals for one family in one local calendar month
    pub async fn monthly(
        &self,
        family: TransactionFamily,
        year: i32,
        month: u32,
        offset: FixedOffset,
    ) -> AppResult<MonthlyReport> {
        let (start, end) = month_bounds(year, month, offset)?;

        let rows = match family {
            TransactionFamily::Sales => self.sales_rows(start, end).await?,
            TransactionFamily::Restock => self.restock_rows(start, end).await?,
            TransactionFamily::Service => self.service_rows(start, end).await?,
        };

        let report = aggregate(family, year, month, offset, &rows)?;

        tracing::debug!(
            family = family.as_str(),
            year,
            month,
            headers = rows.len(),
            total = report.month_transaction_total,
            "Monthly report computed"
        );

        Ok(report)
    }

    async fn headers(
        &self,
        table: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> AppResult<Vec<HeaderRow>> {
        let discount = if table == "services" { "discount" } else { "0::bigint AS discount" };
        let sql = format!(
            "SELECT id, created_at, deposit, {} FROM {} WHERE created_at >= $1 AND created_at < $2",
            discount, table
        );
        let headers = sqlx::query_as::<_, HeaderRow>(&sql)
            .bind(start)
            .bind(end)
            .fetch_all(&self.db)
            .await?;
        Ok(headers)
    }

    async fn sales_rows(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> AppResult<Vec<ReportRow>> {
        let headers = self.headers("sales", start, end).await?;

        let lines = sqlx::query_as::<_, SalesLineRow>(
            r#"
            SELECT l.sales_id AS header_id, l.quantity, l.is_workshop,
                   COALESCE(p.price, 0) AS price,
                   COALESCE(p.workshop_price, 0) AS workshop_price
            FROM sales_lines l
            JOIN sales s ON s.id = l.sales_id
            LEFT JOIN spareparts p ON p.id = l.part_id
            WHERE s.created_at >= $1 AND s.created_at < $2
            "#,
        )
        .bind(start)
        .bind(end)
        .fetch_all(&self.db)
        .await?;

        let mut by_header: HashMap<Uuid, Vec<SalesLineValue>> = HashMap::new();
        for line in lines {
            by_header.entry(line.header_id).or_default().push(SalesLineValue {
                quantity: line.quantity,
                is_workshop: line.is_workshop,
                price: line.price,
                workshop_price: line.workshop_price,
            });
        }

        headers
            .into_iter()
            .map(|h| -> AppResult<ReportRow> {
                Ok(ReportRow {
                    created_at: h.created_at,
                    transaction_total: sales_total(
                        by_header.get(&h.id).map(Vec::as_slice).unwrap_or(&[]),
                    )?,
                    revenue_total: h.deposit,
                })
            })
            .collect()
    }

    async fn restock_rows(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> AppResult<Vec<ReportRow>> {
        let headers = self.headers("restocks", start, end).await?;

        let lines = sqlx::query_as::<_, PricedLineRow>(
            r#"
            SELECT l.restock_id AS header_id, l.quantity, l.individual_price AS price
            FROM restock_lines l
            JOIN restocks r ON r.id = l.restock_id
            WHERE r.created_at >= $1 AND r.created_at < $2
            "#,
        )
        .bind(start)
        .bind(end)
        .fetch_all(&self.db)
        .await?;

        let by_header = group_priced(lines);

        headers
            .into_iter()
            .map(|h| -> AppResult<ReportRow> {
                Ok(ReportRow {
                    created_at: h.created_at,
                    transaction_total: restock_total(
                        by_header.get(&h.id).map(Vec::as_slice).unwrap_or(&[]),
                    )?,
                    revenue_total: h.deposit,
                })
            })
            .collect()
    }

    async fn service_rows(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> AppResult<Vec<ReportRow>> {
        let headers = self.headers("services", start, end).await?;

        let actions = sqlx::query_as::<_, ActionRow>(
            r#"
            SELECT a.service_id AS header_id, a.cost
            FROM service_actions a
            JOIN services sv ON sv.id = a.service_id
            WHERE sv.created_at >= $1 AND sv.created_at < $2
            "#,
        )
        .bind(start)
        .bind(end)
        .fetch_all(&self.db)
        .await?;

        let parts = sqlx::query_as::<_, PricedLineRow>(
            r#"
            SELECT l.service_id AS header_id, l.quantity, COALESCE(p.install_price, 0) AS price
            FROM service_parts l
            JOIN services sv ON sv.id = l.service_id
            LEFT JOIN spareparts p ON p.id = l.part_id
            WHERE sv.created_at >= $1 AND sv.created_at < $2
            "#,
        )
        .bind(start)
        .bind(end)
        .fetch_all(&self.db)
        .await?;

        let mut costs: HashMap<Uuid, Vec<i64>> = HashMap::new();
        for action in actions {
            costs.entry(action.header_id).or_default().push(action.cost);
        }
        let parts = group_priced(parts);

        headers
            .into_iter()
            .map(|h| -> AppResult<ReportRow> {
                Ok(ReportRow {
                    created_at: h.created_at,
                    transaction_total: service_total(
                        costs.get(&h.id).map(Vec::as_slice).unwrap_or(&[]),
                        parts.get(&h.id).map(Vec::as_slice).unwrap_or(&[]),
                        h.discount,
                    )?,
                    revenue_total: h.deposit,
                })
            })
            .collect()
    }
}

fn group_priced(lines: Vec<PricedLineRow>) -> HashMap<Uuid, Vec<(i64, i64)>> {
    let mut grouped: HashMap<Uuid, Vec<(i64, i64)>> = HashMap::new();
    for line in lines {
        grouped
            .entry(line.header_id)
            .or_default()
            .push((line.quantity, line.price));
    }
    grouped
}

/// Render the day sequence as CSV, one row per calendar day
pub fn report_csv(report: &MonthlyReport) -> AppResult<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for day in &report.days {
        writer
            .serialize(day)
            .map_err(|e| AppError::Internal(format!("CSV encoding failed: {}", e)))?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| AppError::Internal(format!("CSV encoding failed: {}", e)))?;
    String::from_utf8(bytes).map_err(|e| AppError::Internal(format!("CSV encoding failed: {}", e)))
}
