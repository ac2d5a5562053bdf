//! Monthly report tests
//!
//! - The month totals equal the sum over the days
//! - The day sequence covers the calendar month exactly
//! - Every header inside the month lands on exactly one day

use chrono::{Duration, FixedOffset, TimeZone, Utc};
use proptest::prelude::*;
use shared::report::{
    aggregate, days_in_month, month_bounds, restock_total, sales_total, service_total,
    ReportRow, SalesLineValue,
};
use shared::{TransactionFamily, ValidationCode};

fn offset(hours: i32) -> FixedOffset {
    FixedOffset::east_opt(hours * 3600).unwrap()
}

// ============================================================================
// Property Test Strategies
// ============================================================================

fn family_strategy() -> impl Strategy<Value = TransactionFamily> {
    prop_oneof![
        Just(TransactionFamily::Sales),
        Just(TransactionFamily::Restock),
        Just(TransactionFamily::Service),
    ]
}

/// Rows spread over the requested month and a few days either side
fn rows_strategy(year: i32, month: u32) -> impl Strategy<Value = Vec<ReportRow>> {
    let start = Utc.with_ymd_and_hms(year, month, 1, 0, 0, 0).unwrap() - Duration::days(3);
    prop::collection::vec(
        (0i64..(35 * 24 * 60), 0i64..5_000_000, 0i64..5_000_000),
        0..40,
    )
    .prop_map(move |raw| {
        raw.into_iter()
            .map(|(minutes, total, deposit)| ReportRow {
                created_at: start + Duration::minutes(minutes),
                transaction_total: total,
                revenue_total: deposit,
            })
            .collect()
    })
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[test]
    fn test_sales_total_uses_workshop_price_when_flagged() {
        let lines = [
            SalesLineValue {
                quantity: 2,
                is_workshop: false,
                price: 50_000,
                workshop_price: 45_000,
            },
            SalesLineValue {
                quantity: 1,
                is_workshop: true,
                price: 50_000,
                workshop_price: 45_000,
            },
        ];
        assert_eq!(sales_total(&lines), Ok(145_000));
    }

    #[test]
    fn test_restock_total() {
        assert_eq!(restock_total(&[(10, 12_000), (3, 5_000)]), Ok(135_000));
        assert_eq!(restock_total(&[]), Ok(0));
    }

    #[test]
    fn test_service_total_subtracts_discount() {
        assert_eq!(service_total(&[30_000, 20_000], &[(2, 15_000)], 10_000), Ok(70_000));
    }

    #[test]
    fn test_month_bounds_rejects_bad_month() {
        assert_eq!(month_bounds(2024, 13, offset(7)), Err(ValidationCode::InvalidPeriod));
        assert_eq!(month_bounds(2024, 0, offset(7)), Err(ValidationCode::InvalidPeriod));
    }

    #[test]
    fn test_late_evening_utc_counts_for_next_local_day() {
        // 2024-03-31 18:00 UTC is 2024-04-01 01:00 at +7
        let rows = [ReportRow {
            created_at: Utc.with_ymd_and_hms(2024, 3, 31, 18, 0, 0).unwrap(),
            transaction_total: 10,
            revenue_total: 5,
        }];

        let march = aggregate(TransactionFamily::Sales, 2024, 3, offset(7), &rows).unwrap();
        let april = aggregate(TransactionFamily::Sales, 2024, 4, offset(7), &rows).unwrap();

        assert_eq!(march.month_transaction_total, 0);
        assert_eq!(april.month_transaction_total, 10);
        assert_eq!(april.days[0].count, Some(1));
    }

    #[test]
    fn test_empty_month_is_zero_filled() {
        let report = aggregate(TransactionFamily::Service, 2023, 2, offset(7), &[]).unwrap();
        assert_eq!(report.days.len(), 28);
        assert!(report.days.iter().all(|d| d.transaction_total == 0 && d.revenue_total == 0));
        assert!(report.days.iter().all(|d| d.count.is_none()));
    }
}

// ============================================================================
// Property Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Month totals equal the sum over the days
        #[test]
        fn prop_month_total_is_sum_of_days(
            family in family_strategy(),
            rows in rows_strategy(2024, 2),
            hours in -12i32..=14,
        ) {
            let report = aggregate(family, 2024, 2, offset(hours), &rows).unwrap();

            let days_total: i64 = report.days.iter().map(|d| d.transaction_total).sum();
            let days_revenue: i64 = report.days.iter().map(|d| d.revenue_total).sum();

            prop_assert_eq!(report.month_transaction_total, days_total);
            prop_assert_eq!(report.month_revenue_total, days_revenue);
        }

        /// The day sequence has one entry per calendar day, in order
        #[test]
        fn prop_days_cover_calendar_month(
            family in family_strategy(),
            year in 1990i32..2100,
            month in 1u32..=12,
        ) {
            let report = aggregate(family, year, month, offset(7), &[]).unwrap();
            let expected = days_in_month(year, month).unwrap() as usize;

            prop_assert_eq!(report.days.len(), expected);
            for pair in report.days.windows(2) {
                prop_assert_eq!(pair[1].date - pair[0].date, Duration::days(1));
            }
        }

        /// Every row inside the local month is counted exactly once
        #[test]
        fn prop_rows_in_month_counted_once(
            rows in rows_strategy(2023, 7),
            hours in -12i32..=14,
        ) {
            let tz = offset(hours);
            let (start, end) = month_bounds(2023, 7, tz).unwrap();
            let report = aggregate(TransactionFamily::Sales, 2023, 7, tz, &rows).unwrap();

            let inside: Vec<&ReportRow> = rows
                .iter()
                .filter(|r| r.created_at >= start && r.created_at < end)
                .collect();

            let counted: i64 = report.days.iter().filter_map(|d| d.count).sum();
            let expected_total: i64 = inside.iter().map(|r| r.transaction_total).sum();

            prop_assert_eq!(counted, inside.len() as i64);
            prop_assert_eq!(report.month_transaction_total, expected_total);
        }
    }
}
