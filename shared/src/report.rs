//! Monthly report aggregation
//!
//! The store hands over one row per header created in the month (with its
//! line-value total already computed); this module buckets them by local
//! calendar day. The day sequence always covers the whole month.

use std::collections::HashMap;

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, TimeZone, Utc};
use serde::Serialize;

use crate::models::TransactionFamily;
use crate::types::{date_format, local_date};
use crate::validation::{validate_period, ValidationCode};

/// One header's contribution to a report
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportRow {
    pub created_at: DateTime<Utc>,
    pub transaction_total: i64,
    pub revenue_total: i64,
}

/// Totals for one calendar day
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct DailyTotal {
    #[serde(with = "date_format")]
    pub date: NaiveDate,
    pub transaction_total: i64,
    pub revenue_total: i64,
    /// Number of headers; only reported for sales
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<i64>,
}

/// A month of activity for one family
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct MonthlyReport {
    pub family: TransactionFamily,
    pub year: i32,
    pub month: u32,
    pub days: Vec<DailyTotal>,
    pub month_transaction_total: i64,
    pub month_revenue_total: i64,
}

// ============================================================================
// Line values
// ============================================================================

/// Priced sales line
#[derive(Debug, Clone, Copy)]
pub struct SalesLineValue {
    pub quantity: i64,
    pub is_workshop: bool,
    pub price: i64,
    pub workshop_price: i64,
}

/// Checked Σ over `values`
fn checked_sum<I>(values: I) -> Result<i64, ValidationCode>
where
    I: IntoIterator<Item = Option<i64>>,
{
    values.into_iter().try_fold(0i64, |acc, value| {
        value
            .and_then(|v| acc.checked_add(v))
            .ok_or(ValidationCode::ValueTooLarge)
    })
}

/// Σ qty × (workshop price when flagged, retail price otherwise)
pub fn sales_total(lines: &[SalesLineValue]) -> Result<i64, ValidationCode> {
    checked_sum(lines.iter().map(|l| {
        l.quantity
            .checked_mul(if l.is_workshop { l.workshop_price } else { l.price })
    }))
}

/// Σ qty × individual price, `(quantity, individual_price)` pairs
pub fn restock_total(lines: &[(i64, i64)]) -> Result<i64, ValidationCode> {
    checked_sum(lines.iter().map(|(qty, price)| qty.checked_mul(*price)))
}

/// Σ action cost + Σ qty × install price − discount.
///
/// `parts` are `(quantity, install_price)` pairs.
pub fn service_total(
    action_costs: &[i64],
    parts: &[(i64, i64)],
    discount: i64,
) -> Result<i64, ValidationCode> {
    let labor = checked_sum(action_costs.iter().copied().map(Some))?;
    let installed = restock_total(parts)?;
    labor
        .checked_add(installed)
        .and_then(|total| total.checked_sub(discount))
        .ok_or(ValidationCode::ValueTooLarge)
}

// ============================================================================
// Calendar
// ============================================================================

pub fn days_in_month(year: i32, month: u32) -> Option<u32> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    u32::try_from((next - first).num_days()).ok()
}

/// UTC half-open range `[start, end)` covering the local calendar month
pub fn month_bounds(
    year: i32,
    month: u32,
    offset: FixedOffset,
) -> Result<(DateTime<Utc>, DateTime<Utc>), ValidationCode> {
    validate_period(year, month)?;
    let days = days_in_month(year, month).ok_or(ValidationCode::InvalidPeriod)?;

    let start = offset
        .with_ymd_and_hms(year, month, 1, 0, 0, 0)
        .single()
        .ok_or(ValidationCode::InvalidPeriod)?
        .with_timezone(&Utc);
    let end = start + Duration::days(i64::from(days));

    Ok((start, end))
}

/// Bucket `rows` into the days of `year`-`month` (local calendar at `offset`).
///
/// Rows falling outside the month are ignored.
pub fn aggregate(
    family: TransactionFamily,
    year: i32,
    month: u32,
    offset: FixedOffset,
    rows: &[ReportRow],
) -> Result<MonthlyReport, ValidationCode> {
    validate_period(year, month)?;
    let day_count = days_in_month(year, month).ok_or(ValidationCode::InvalidPeriod)?;

    let mut by_day: HashMap<NaiveDate, (i64, i64, i64)> = HashMap::new();
    for row in rows {
        let entry = by_day
            .entry(local_date(row.created_at, offset))
            .or_insert((0, 0, 0));
        entry.0 = entry
            .0
            .checked_add(row.transaction_total)
            .ok_or(ValidationCode::ValueTooLarge)?;
        entry.1 = entry
            .1
            .checked_add(row.revenue_total)
            .ok_or(ValidationCode::ValueTooLarge)?;
        entry.2 += 1;
    }

    let with_count = family == TransactionFamily::Sales;
    let days: Vec<DailyTotal> = (1..=day_count)
        .filter_map(|day| NaiveDate::from_ymd_opt(year, month, day))
        .map(|date| {
            let (transaction_total, revenue_total, count) =
                by_day.get(&date).copied().unwrap_or_default();
            DailyTotal {
                date,
                transaction_total,
                revenue_total,
                count: with_count.then_some(count),
            }
        })
        .collect();

    Ok(MonthlyReport {
        family,
        year,
        month,
        month_transaction_total: checked_sum(days.iter().map(|d| Some(d.transaction_total)))?,
        month_revenue_total: checked_sum(days.iter().map(|d| Some(d.revenue_total)))?,
        days,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wib() -> FixedOffset {
        FixedOffset::east_opt(7 * 3600).unwrap()
    }

    fn row(y: i32, m: u32, d: u32, h: u32, total: i64, deposit: i64) -> ReportRow {
        ReportRow {
            created_at: Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap(),
            transaction_total: total,
            revenue_total: deposit,
        }
    }

    #[test]
    fn test_days_in_month() {
        assert_eq!(days_in_month(2024, 2), Some(29));
        assert_eq!(days_in_month(2023, 2), Some(28));
        assert_eq!(days_in_month(2024, 12), Some(31));
        assert_eq!(days_in_month(2024, 4), Some(30));
        assert_eq!(days_in_month(2024, 13), None);
    }

    #[test]
    fn test_month_bounds_use_offset() {
        let (start, end) = month_bounds(2024, 3, wib()).unwrap();
        assert_eq!(start, Utc.with_ymd_and_hms(2024, 2, 29, 17, 0, 0).unwrap());
        assert_eq!(end, Utc.with_ymd_and_hms(2024, 3, 31, 17, 0, 0).unwrap());
    }

    #[test]
    fn test_empty_month_is_zero_filled() {
        let report = aggregate(TransactionFamily::Restock, 2024, 2, wib(), &[]).unwrap();
        assert_eq!(report.days.len(), 29);
        assert!(report.days.iter().all(|d| d.transaction_total == 0 && d.count.is_none()));
        assert_eq!(report.month_transaction_total, 0);
    }

    #[test]
    fn test_sales_counts_and_local_day() {
        // 18:00 UTC on the 9th is 01:00 on the 10th in UTC+7
        let rows = [
            row(2024, 5, 9, 18, 120_000, 100_000),
            row(2024, 5, 10, 3, 30_000, 30_000),
            row(2024, 5, 1, 2, 5_000, 0),
        ];
        let report = aggregate(TransactionFamily::Sales, 2024, 5, wib(), &rows).unwrap();

        assert_eq!(report.days.len(), 31);
        let tenth = &report.days[9];
        assert_eq!(tenth.transaction_total, 150_000);
        assert_eq!(tenth.revenue_total, 130_000);
        assert_eq!(tenth.count, Some(2));
        assert_eq!(report.days[8].count, Some(0));
        assert_eq!(report.month_transaction_total, 155_000);
        assert_eq!(report.month_revenue_total, 130_000);
    }

    #[test]
    fn test_rows_outside_month_ignored() {
        let rows = [row(2024, 4, 30, 17, 10, 10)]; // 1 May local
        let april = aggregate(TransactionFamily::Service, 2024, 4, wib(), &rows).unwrap();
        assert_eq!(april.month_transaction_total, 0);
    }

    #[test]
    fn test_line_values() {
        let lines = [
            SalesLineValue { quantity: 2, is_workshop: false, price: 10_000, workshop_price: 8_000 },
            SalesLineValue { quantity: 3, is_workshop: true, price: 10_000, workshop_price: 8_000 },
        ];
        assert_eq!(sales_total(&lines), Ok(44_000));
        assert_eq!(restock_total(&[(10, 7_500), (2, 1_000)]), Ok(77_000));
        assert_eq!(service_total(&[25_000, 15_000], &[(1, 5_000)], 10_000), Ok(35_000));
    }

    #[test]
    fn test_line_value_overflow() {
        let huge = SalesLineValue {
            quantity: i64::MAX,
            is_workshop: false,
            price: 2,
            workshop_price: 0,
        };
        assert_eq!(sales_total(&[huge]), Err(ValidationCode::ValueTooLarge));
        assert_eq!(
            restock_total(&[(1, i64::MAX), (1, 1)]),
            Err(ValidationCode::ValueTooLarge)
        );
        assert_eq!(
            service_total(&[i64::MAX], &[], i64::MIN),
            Err(ValidationCode::ValueTooLarge)
        );
    }

    #[test]
    fn test_day_total_overflow() {
        let rows = [
            row(2024, 5, 9, 3, i64::MAX, 0),
            row(2024, 5, 9, 4, 1, 0),
        ];
        assert_eq!(
            aggregate(TransactionFamily::Sales, 2024, 5, wib(), &rows),
            Err(ValidationCode::ValueTooLarge)
        );
    }

    #[test]
    fn test_invalid_month() {
        assert_eq!(
            aggregate(TransactionFamily::Sales, 2024, 13, wib(), &[]),
            Err(ValidationCode::InvalidPeriod)
        );
    }
}
