//! Fuel record ordering and predecessor lookup
//!
//! Fuel records of one vehicle form a strict total order under the key
//! `(date, created_at)`: ties on the calendar date are broken by insertion
//! timestamp. `created_at` is unique per store by construction; should a
//! duplicate ever appear, the record id is the final deterministic tie-break.
//!
//! The predecessor of a reference point is the record with the greatest key
//! strictly below it. For a record that has not been saved yet there is no
//! insertion timestamp, so the anchor treats it as later than every existing
//! record on the same date and the predecessor is simply the maximum of the
//! whole set.

use crate::store::types::FuelRecord;
use serde::Serialize;
use std::cmp::Ordering;
use uuid::Uuid;

/// Total-order key of a fuel record
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct OrderKey {
    /// Purchase date, epoch milliseconds
    pub date: i64,
    /// Insertion timestamp, epoch milliseconds
    pub created_at: i64,
}

impl OrderKey {
    pub fn of(record: &FuelRecord) -> Self {
        Self {
            date: record.date,
            created_at: record.created_at,
        }
    }
}

/// Reference point for a predecessor lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordRef {
    /// A record being entered that is not in the set yet; on its date it
    /// sorts after every existing record.
    New { date: i64 },
    /// An existing record (possibly mid-edit, carrying an updated date).
    /// Excluded from its own candidate set.
    Existing {
        id: Uuid,
        date: i64,
        created_at: i64,
    },
}

impl RecordRef {
    /// Reference for a saved record as currently stored
    pub fn existing(record: &FuelRecord) -> Self {
        Self::Existing {
            id: record.id,
            date: record.date,
            created_at: record.created_at,
        }
    }

    /// Is `record` strictly before this reference point?
    fn admits(&self, record: &FuelRecord) -> bool {
        match self {
            // Unsaved records compare after everything on the same date.
            Self::New { date } => record.date <= *date,
            Self::Existing {
                id,
                date,
                created_at,
            } => {
                if record.id == *id {
                    return false;
                }
                record.date < *date
                    || (record.date == *date && record.created_at < *created_at)
            }
        }
    }
}

/// Compare two records by `(date, created_at)`, falling back to id
///
/// The id fallback only matters when the uniqueness of `created_at` has been
/// violated; the order stays deterministic either way.
pub fn compare(a: &FuelRecord, b: &FuelRecord) -> Ordering {
    OrderKey::of(a)
        .cmp(&OrderKey::of(b))
        .then_with(|| a.id.cmp(&b.id))
}

/// Sort records into the total order (oldest first)
///
/// Idempotent: sorting a sorted slice leaves it unchanged. Logs a warning if
/// two distinct records share a full ordering key, which the store should
/// never produce.
pub fn sort_records(records: &mut [FuelRecord]) {
    records.sort_by(compare);

    for pair in records.windows(2) {
        if OrderKey::of(&pair[0]) == OrderKey::of(&pair[1]) {
            tracing::warn!(
                first = %pair[0].id,
                second = %pair[1].id,
                date = pair[0].date,
                created_at = pair[0].created_at,
                "Duplicate ordering key; falling back to id order"
            );
        }
    }
}

/// Find the record immediately preceding `reference` in the total order
///
/// Returns `None` when no record sorts strictly before the reference point,
/// which disables trip auto-calculation downstream.
pub fn predecessor_of<'a>(
    records: &'a [FuelRecord],
    reference: &RecordRef,
) -> Option<&'a FuelRecord> {
    records
        .iter()
        .filter(|r| reference.admits(r))
        .max_by(|a, b| compare(a, b))
}
