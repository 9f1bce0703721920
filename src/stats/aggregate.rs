//! Vehicle-level aggregates and per-record derivation
//!
//! Aggregates are pure functions of the current record snapshot: they hold no
//! state, are never persisted, and are recomputed in full on every read. At
//! logbook scale (tens to low thousands of records per vehicle) a full pass
//! is cheap and keeps the contract trivially correct under churn.

use crate::store::types::FuelRecord;
use chrono::{DateTime, Datelike, Utc};
use serde::Serialize;

/// Derived statistics for one vehicle's record set
///
/// Every field is `0` for an empty record set; no division is performed in
/// that case.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct VehicleStats {
    /// Highest odometer reading across all records
    pub latest_odometer: f64,
    /// Arithmetic mean of per-record fuel economy
    pub average_fuel_economy: f64,
    /// Sum of fuel volumes
    pub total_fuel_added: f64,
    /// Sum of purchase costs
    pub total_spent: f64,
    /// Number of refuels
    pub refuel_count: u64,
    /// Refuels per whole calendar month between first and last record
    pub refuel_per_month: f64,
    /// Average fuel volume per refuel
    pub avg_fuel_per_refuel: f64,
    /// Average spend per refuel
    pub avg_spent_per_refuel: f64,
}

/// Compute aggregates over a snapshot of one vehicle's records
///
/// The input order does not matter; every metric is order-independent.
pub fn aggregate(records: &[FuelRecord]) -> VehicleStats {
    if records.is_empty() {
        return VehicleStats::default();
    }

    let count = records.len() as f64;
    let latest_odometer = records.iter().map(|r| r.odometer).fold(f64::MIN, f64::max);
    let total_fuel_added: f64 = records.iter().map(|r| r.fuel_added).sum();
    let total_spent: f64 = records.iter().map(|r| r.total_cost).sum();
    let economy_sum: f64 = records.iter().map(|r| r.fuel_economy).sum();

    let first_date = records.iter().map(|r| r.date).min().unwrap_or(0);
    let last_date = records.iter().map(|r| r.date).max().unwrap_or(0);
    let span = month_span(first_date, last_date);

    VehicleStats {
        latest_odometer,
        average_fuel_economy: economy_sum / count,
        total_fuel_added,
        total_spent,
        refuel_count: records.len() as u64,
        refuel_per_month: count / span as f64,
        avg_fuel_per_refuel: total_fuel_added / count,
        avg_spent_per_refuel: total_spent / count,
    }
}

/// Whole-month span between two dates, inclusive of both end months
///
/// `(year(last) - year(first)) * 12 + (month(last) - month(first)) + 1`, so a
/// single month of activity yields 1 and the divisor is never zero when
/// records exist. Calendar extraction is UTC, matching how dates are stored.
fn month_span(first_ms: i64, last_ms: i64) -> i64 {
    let first = utc_date(first_ms);
    let last = utc_date(last_ms);
    (last.year() as i64 - first.year() as i64) * 12
        + (last.month() as i64 - first.month() as i64)
        + 1
}

fn utc_date(millis: i64) -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp_millis(millis).unwrap_or_else(|| {
        tracing::warn!(millis, "Timestamp outside representable range; clamping to epoch");
        DateTime::<Utc>::UNIX_EPOCH
    })
}

/// Trip distance for a candidate odometer reading, given its predecessor
///
/// `None` means "not computable" (no predecessor, or the odometer went
/// backwards) and the caller falls back to manual entry. This is a
/// recoverable condition, not an error.
pub fn derive_trip(candidate_odometer: f64, predecessor: Option<&FuelRecord>) -> Option<f64> {
    let prev = predecessor?;
    if prev.odometer > candidate_odometer {
        return None;
    }
    Some(candidate_odometer - prev.odometer)
}

/// Fuel economy for a record: volume per unit distance
///
/// `None` when the trip is not positive.
pub fn derive_economy(fuel_added: f64, trip: f64) -> Option<f64> {
    if trip > 0.0 {
        Some(fuel_added / trip)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use uuid::Uuid;

    /// Epoch millis at UTC midnight of the given calendar date
    fn date_ms(year: i32, month: u32, day: u32) -> i64 {
        NaiveDate::from_ymd_opt(year, month, day)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
            .and_utc()
            .timestamp_millis()
    }

    fn record(date: i64, odometer: f64, fuel_added: f64, cost: f64, economy: f64) -> FuelRecord {
        FuelRecord::new(Uuid::new_v4(), date, odometer, fuel_added, cost).fuel_economy(economy)
    }

    #[test]
    fn test_empty_set_yields_zero_defaults() {
        let stats = aggregate(&[]);
        assert_eq!(stats, VehicleStats::default());
        assert_eq!(stats.refuel_per_month, 0.0);
        assert_eq!(stats.avg_fuel_per_refuel, 0.0);
    }

    #[test]
    fn test_sums_and_counts() {
        let records = vec![
            record(date_ms(2024, 1, 5), 1000.0, 10.0, 40.0, 0.04),
            record(date_ms(2024, 1, 20), 1300.0, 12.0, 50.0, 0.04),
            record(date_ms(2024, 2, 3), 1650.0, 11.0, 44.0, 0.031),
        ];

        let stats = aggregate(&records);
        assert_eq!(stats.refuel_count, 3);
        assert!((stats.total_fuel_added - 33.0).abs() < 1e-9);
        assert!((stats.total_spent - 134.0).abs() < 1e-9);
        assert!((stats.avg_fuel_per_refuel - 11.0).abs() < 1e-9);
        assert!((stats.avg_spent_per_refuel - 134.0 / 3.0).abs() < 1e-9);
        assert!((stats.average_fuel_economy - (0.04 + 0.04 + 0.031) / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_latest_odometer_is_maximum_not_last() {
        // Odometer monotonicity is not enforced; the max wins regardless of date.
        let records = vec![
            record(date_ms(2024, 2, 1), 1650.0, 11.0, 44.0, 0.03),
            record(date_ms(2024, 3, 1), 1500.0, 11.0, 44.0, 0.03),
        ];
        assert_eq!(aggregate(&records).latest_odometer, 1650.0);
    }

    #[test]
    fn test_refuel_per_month_single_record() {
        let records = vec![record(date_ms(2024, 3, 15), 1000.0, 10.0, 40.0, 0.04)];
        // span = 0*12 + 0 + 1 = 1
        assert_eq!(aggregate(&records).refuel_per_month, 1.0);
    }

    #[test]
    fn test_refuel_per_month_same_month() {
        let records = vec![
            record(date_ms(2024, 1, 5), 1000.0, 10.0, 40.0, 0.04),
            record(date_ms(2024, 1, 20), 1300.0, 12.0, 50.0, 0.04),
        ];
        // Jan 5 and Jan 20: span = 1, so 2 refuels / month.
        assert_eq!(aggregate(&records).refuel_per_month, 2.0);
    }

    #[test]
    fn test_refuel_per_month_across_year_boundary() {
        let records = vec![
            record(date_ms(2023, 11, 10), 1000.0, 10.0, 40.0, 0.04),
            record(date_ms(2024, 2, 10), 1900.0, 10.0, 40.0, 0.04),
        ];
        // Nov, Dec, Jan, Feb: span = (1*12) + (2 - 11) + 1 = 4.
        assert_eq!(aggregate(&records).refuel_per_month, 0.5);
    }

    #[test]
    fn test_month_span_uses_calendar_months_not_elapsed_days() {
        // Jan 31 and Feb 1 are one day apart but two calendar months.
        assert_eq!(month_span(date_ms(2024, 1, 31), date_ms(2024, 2, 1)), 2);
        assert_eq!(month_span(date_ms(2024, 1, 1), date_ms(2024, 1, 31)), 1);
    }

    #[test]
    fn test_derive_trip() {
        let prev = record(date_ms(2024, 2, 1), 1500.0, 11.0, 44.0, 0.03);

        assert_eq!(derive_trip(1800.0, Some(&prev)), Some(300.0));
        assert_eq!(derive_trip(1500.0, Some(&prev)), Some(0.0));
        // Odometer going backwards is not computable.
        assert_eq!(derive_trip(1400.0, Some(&prev)), None);
        // No predecessor disables derivation.
        assert_eq!(derive_trip(1800.0, None), None);
    }

    #[test]
    fn test_derive_economy() {
        assert_eq!(derive_economy(12.0, 300.0), Some(0.04));
        assert_eq!(derive_economy(12.0, 0.0), None);
        assert_eq!(derive_economy(12.0, -5.0), None);
    }

    #[test]
    fn test_aggregate_ignores_input_order() {
        let a = record(date_ms(2024, 1, 5), 1000.0, 10.0, 40.0, 0.04);
        let b = record(date_ms(2024, 2, 3), 1650.0, 11.0, 44.0, 0.03);

        let forward = aggregate(&[a.clone(), b.clone()]);
        let reverse = aggregate(&[b, a]);
        assert_eq!(forward, reverse);
    }
}
