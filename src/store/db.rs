//! CarLog Record Store
//!
//! SQLite-backed keyed store for vehicles and their fuel records.
//!
//! - Write path: mutation → transaction commit → ChangeEvent broadcast
//! - Read path: plain SELECTs; callers impose their own ordering on fuel
//!   records (the store guarantees none)
//!
//! All mutations to a vehicle's record set are serialized through the
//! connection mutex, so every write completes before the next is observed.
//! A vehicle delete cascades to its fuel records inside one transaction;
//! readers never observe orphaned records.

use crate::store::error::{StoreError, StoreResult};
use crate::store::types::{ChangeEvent, ChangeKind, FuelRecord, Vehicle};
use chrono::Utc;
use rusqlite::{params, Connection, OpenFlags, Row};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tokio::sync::broadcast;
use uuid::Uuid;

/// Capacity of the change-event broadcast channel
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// SQLite-backed record store with change notifications
///
/// `Connection` is !Sync, so it lives behind a std `Mutex` (same reasoning as
/// any embedded-SQLite handle shared across async tasks).
pub struct RecordStore {
    conn: Mutex<Connection>,
    /// Last `created_at` handed out; insertion timestamps are made strictly
    /// monotonic so the ordering tie-break is unique per record.
    last_created_at: Mutex<i64>,
    events: broadcast::Sender<ChangeEvent>,
    path: Option<PathBuf>,
}

impl RecordStore {
    /// Open or create a store at the given path
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_CREATE
                | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;

        Self::init(conn, Some(path.to_path_buf()))
    }

    /// Open an in-memory store (used by tests and ephemeral sessions)
    pub fn open_in_memory() -> StoreResult<Self> {
        Self::init(Connection::open_in_memory()?, None)
    }

    fn init(conn: Connection, path: Option<PathBuf>) -> StoreResult<Self> {
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            ",
        )?;

        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS vehicles (
                id            TEXT PRIMARY KEY,
                name          TEXT NOT NULL,
                manufacturer  TEXT NOT NULL,
                model         TEXT NOT NULL,
                year          INTEGER NOT NULL,
                license_plate TEXT NOT NULL,
                vin           TEXT,
                created_at    INTEGER NOT NULL
            );

            CREATE TABLE IF NOT EXISTS fuels (
                id           TEXT PRIMARY KEY,
                vehicle_id   TEXT NOT NULL REFERENCES vehicles(id) ON DELETE CASCADE,
                date         INTEGER NOT NULL,
                created_at   INTEGER NOT NULL,
                odometer     REAL NOT NULL,
                trip         REAL NOT NULL,
                fuel_added   REAL NOT NULL,
                total_cost   REAL NOT NULL,
                fuel_economy REAL NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_fuels_vehicle ON fuels(vehicle_id);
            CREATE INDEX IF NOT EXISTS idx_fuels_order ON fuels(vehicle_id, date, created_at);
            ",
        )?;

        // Seed the insertion clock past anything already persisted so
        // monotonicity survives restarts.
        let max_persisted: i64 = conn.query_row(
            "SELECT COALESCE(MAX(created_at), 0) FROM (
                SELECT created_at FROM vehicles
                UNION ALL
                SELECT created_at FROM fuels
            )",
            [],
            |row| row.get(0),
        )?;

        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        Ok(Self {
            conn: Mutex::new(conn),
            last_created_at: Mutex::new(max_persisted),
            events,
            path,
        })
    }

    /// Path of the backing database file, if any
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Subscribe to change events
    ///
    /// Every committed write is followed by exactly one event. A lagged
    /// receiver observes `RecvError::Lagged` and should do a full refresh.
    pub fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.events.subscribe()
    }

    fn publish(&self, vehicle_id: Uuid, kind: ChangeKind) {
        // No receivers is fine; send only fails when nobody is listening.
        let _ = self.events.send(ChangeEvent::new(vehicle_id, kind));
    }

    /// Hand out the next insertion timestamp: current wall clock, bumped
    /// forward if it would collide with the previous one.
    fn next_created_at(&self) -> StoreResult<i64> {
        let mut last = self
            .last_created_at
            .lock()
            .map_err(|e| StoreError::Lock(e.to_string()))?;
        let now = Utc::now().timestamp_millis();
        *last = now.max(*last + 1);
        Ok(*last)
    }

    fn lock_conn(&self) -> StoreResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|e| StoreError::Lock(e.to_string()))
    }

    // ==================== Vehicles ====================

    /// Insert a vehicle, overwriting its `created_at` with the store clock
    ///
    /// Returns the vehicle as stored.
    pub fn insert_vehicle(&self, mut vehicle: Vehicle) -> StoreResult<Vehicle> {
        vehicle.created_at = self.next_created_at()?;

        let conn = self.lock_conn()?;
        conn.execute(
            "INSERT INTO vehicles (id, name, manufacturer, model, year, license_plate, vin, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                vehicle.id.to_string(),
                vehicle.name,
                vehicle.manufacturer,
                vehicle.model,
                vehicle.year,
                vehicle.license_plate,
                vehicle.vin,
                vehicle.created_at,
            ],
        )?;
        drop(conn);

        tracing::info!(vehicle_id = %vehicle.id, name = %vehicle.name, "Vehicle created");
        self.publish(vehicle.id, ChangeKind::VehicleCreated);
        Ok(vehicle)
    }

    /// Update a vehicle's editable fields (`created_at` is immutable)
    pub fn update_vehicle(&self, vehicle: &Vehicle) -> StoreResult<()> {
        let conn = self.lock_conn()?;
        let changed = conn.execute(
            "UPDATE vehicles
             SET name = ?2, manufacturer = ?3, model = ?4, year = ?5, license_plate = ?6, vin = ?7
             WHERE id = ?1",
            params![
                vehicle.id.to_string(),
                vehicle.name,
                vehicle.manufacturer,
                vehicle.model,
                vehicle.year,
                vehicle.license_plate,
                vehicle.vin,
            ],
        )?;
        drop(conn);

        if changed == 0 {
            return Err(StoreError::VehicleNotFound(vehicle.id));
        }

        self.publish(vehicle.id, ChangeKind::VehicleUpdated);
        Ok(())
    }

    /// Delete a vehicle and all of its fuel records atomically
    pub fn delete_vehicle(&self, id: Uuid) -> StoreResult<()> {
        let mut conn = self.lock_conn()?;
        let tx = conn.transaction()?;
        let fuels_removed: i64 = tx.query_row(
            "SELECT COUNT(*) FROM fuels WHERE vehicle_id = ?1",
            params![id.to_string()],
            |row| row.get(0),
        )?;
        let changed = tx.execute("DELETE FROM vehicles WHERE id = ?1", params![id.to_string()])?;
        tx.commit()?;
        drop(conn);

        if changed == 0 {
            return Err(StoreError::VehicleNotFound(id));
        }

        tracing::info!(vehicle_id = %id, fuels_removed, "Vehicle deleted");
        self.publish(id, ChangeKind::VehicleDeleted);
        Ok(())
    }

    /// Get a vehicle by id
    pub fn get_vehicle(&self, id: Uuid) -> StoreResult<Option<Vehicle>> {
        let conn = self.lock_conn()?;
        let mut stmt = conn.prepare_cached(
            "SELECT id, name, manufacturer, model, year, license_plate, vin, created_at
             FROM vehicles WHERE id = ?1",
        )?;
        let mut rows = stmt.query_map(params![id.to_string()], vehicle_from_row)?;
        match rows.next() {
            Some(row) => Ok(Some(row?)),
            None => Ok(None),
        }
    }

    /// List all vehicles, newest first
    pub fn list_vehicles(&self) -> StoreResult<Vec<Vehicle>> {
        let conn = self.lock_conn()?;
        let mut stmt = conn.prepare_cached(
            "SELECT id, name, manufacturer, model, year, license_plate, vin, created_at
             FROM vehicles ORDER BY created_at DESC",
        )?;
        let rows = stmt.query_map([], vehicle_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(StoreError::from)
    }

    // ==================== Fuel records ====================

    /// Insert a fuel record, assigning its `created_at`
    ///
    /// Fails with `VehicleNotFound` if the owning vehicle does not exist
    /// (enforced by the foreign key, surfaced explicitly here).
    pub fn insert_fuel(&self, mut record: FuelRecord) -> StoreResult<FuelRecord> {
        record.created_at = self.next_created_at()?;

        let conn = self.lock_conn()?;
        let vehicle_exists: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM vehicles WHERE id = ?1)",
            params![record.vehicle_id.to_string()],
            |row| row.get(0),
        )?;
        if !vehicle_exists {
            return Err(StoreError::VehicleNotFound(record.vehicle_id));
        }

        conn.execute(
            "INSERT INTO fuels (id, vehicle_id, date, created_at, odometer, trip, fuel_added, total_cost, fuel_economy)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                record.id.to_string(),
                record.vehicle_id.to_string(),
                record.date,
                record.created_at,
                record.odometer,
                record.trip,
                record.fuel_added,
                record.total_cost,
                record.fuel_economy,
            ],
        )?;
        drop(conn);

        tracing::debug!(
            fuel_id = %record.id,
            vehicle_id = %record.vehicle_id,
            date = record.date,
            "Fuel record created"
        );
        self.publish(record.vehicle_id, ChangeKind::FuelCreated);
        Ok(record)
    }

    /// Update a fuel record's editable fields
    ///
    /// `vehicle_id` and `created_at` are immutable: a record never changes
    /// owner, and its tie-break position is fixed at insertion.
    pub fn update_fuel(&self, record: &FuelRecord) -> StoreResult<()> {
        let conn = self.lock_conn()?;
        let changed = conn.execute(
            "UPDATE fuels
             SET date = ?2, odometer = ?3, trip = ?4, fuel_added = ?5, total_cost = ?6, fuel_economy = ?7
             WHERE id = ?1",
            params![
                record.id.to_string(),
                record.date,
                record.odometer,
                record.trip,
                record.fuel_added,
                record.total_cost,
                record.fuel_economy,
            ],
        )?;
        drop(conn);

        if changed == 0 {
            return Err(StoreError::FuelRecordNotFound(record.id));
        }

        self.publish(record.vehicle_id, ChangeKind::FuelUpdated);
        Ok(())
    }

    /// Delete a fuel record
    pub fn delete_fuel(&self, id: Uuid) -> StoreResult<()> {
        let mut conn = self.lock_conn()?;
        let tx = conn.transaction()?;
        let vehicle_id: Option<String> = tx
            .query_row(
                "SELECT vehicle_id FROM fuels WHERE id = ?1",
                params![id.to_string()],
                |row| row.get(0),
            )
            .map(Some)
            .or_else(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => Ok(None),
                other => Err(other),
            })?;

        let Some(vehicle_id) = vehicle_id else {
            return Err(StoreError::FuelRecordNotFound(id));
        };

        tx.execute("DELETE FROM fuels WHERE id = ?1", params![id.to_string()])?;
        tx.commit()?;
        drop(conn);

        let vehicle_id = parse_uuid_str(&vehicle_id)?;
        self.publish(vehicle_id, ChangeKind::FuelDeleted);
        Ok(())
    }

    /// Get a fuel record by id
    pub fn get_fuel(&self, id: Uuid) -> StoreResult<Option<FuelRecord>> {
        let conn = self.lock_conn()?;
        let mut stmt = conn.prepare_cached(
            "SELECT id, vehicle_id, date, created_at, odometer, trip, fuel_added, total_cost, fuel_economy
             FROM fuels WHERE id = ?1",
        )?;
        let mut rows = stmt.query_map(params![id.to_string()], fuel_from_row)?;
        match rows.next() {
            Some(row) => Ok(Some(row?)),
            None => Ok(None),
        }
    }

    /// List a vehicle's fuel records in unspecified order
    ///
    /// Callers that need the `(date, created_at)` total order sort the
    /// snapshot themselves.
    pub fn list_fuels(&self, vehicle_id: Uuid) -> StoreResult<Vec<FuelRecord>> {
        let conn = self.lock_conn()?;
        let mut stmt = conn.prepare_cached(
            "SELECT id, vehicle_id, date, created_at, odometer, trip, fuel_added, total_cost, fuel_economy
             FROM fuels WHERE vehicle_id = ?1",
        )?;
        let rows = stmt.query_map(params![vehicle_id.to_string()], fuel_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(StoreError::from)
    }

    /// Count fuel records across all vehicles (health/diagnostics)
    pub fn fuel_count(&self) -> StoreResult<i64> {
        let conn = self.lock_conn()?;
        let count = conn.query_row("SELECT COUNT(*) FROM fuels", [], |row| row.get(0))?;
        Ok(count)
    }
}

/// Map a `vehicles` row to a `Vehicle`
fn vehicle_from_row(row: &Row<'_>) -> rusqlite::Result<Vehicle> {
    Ok(Vehicle {
        id: parse_uuid(row, 0)?,
        name: row.get(1)?,
        manufacturer: row.get(2)?,
        model: row.get(3)?,
        year: row.get(4)?,
        license_plate: row.get(5)?,
        vin: row.get(6)?,
        created_at: row.get(7)?,
    })
}

/// Map a `fuels` row to a `FuelRecord`
fn fuel_from_row(row: &Row<'_>) -> rusqlite::Result<FuelRecord> {
    Ok(FuelRecord {
        id: parse_uuid(row, 0)?,
        vehicle_id: parse_uuid(row, 1)?,
        date: row.get(2)?,
        created_at: row.get(3)?,
        odometer: row.get(4)?,
        trip: row.get(5)?,
        fuel_added: row.get(6)?,
        total_cost: row.get(7)?,
        fuel_economy: row.get(8)?,
    })
}

fn parse_uuid(row: &Row<'_>, idx: usize) -> rusqlite::Result<Uuid> {
    let raw: String = row.get(idx)?;
    Uuid::parse_str(&raw).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

fn parse_uuid_str(raw: &str) -> StoreResult<Uuid> {
    Uuid::parse_str(raw).map_err(|e| {
        StoreError::Database(rusqlite::Error::FromSqlConversionFailure(
            0,
            rusqlite::types::Type::Text,
            Box::new(e),
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn sample_vehicle() -> Vehicle {
        Vehicle::new("Daily driver", "Toyota", "Corolla", 2019, "AB-123-CD")
    }

    #[test]
    fn test_vehicle_roundtrip() {
        let store = RecordStore::open_in_memory().unwrap();
        let stored = store.insert_vehicle(sample_vehicle()).unwrap();

        let fetched = store.get_vehicle(stored.id).unwrap().unwrap();
        assert_eq!(fetched, stored);

        assert!(store.get_vehicle(Uuid::new_v4()).unwrap().is_none());
    }

    #[test]
    fn test_list_vehicles_newest_first() {
        let store = RecordStore::open_in_memory().unwrap();
        let first = store.insert_vehicle(sample_vehicle()).unwrap();
        let second = store
            .insert_vehicle(Vehicle::new("Van", "Ford", "Transit", 2021, "XY-987-ZW"))
            .unwrap();

        let vehicles = store.list_vehicles().unwrap();
        assert_eq!(vehicles.len(), 2);
        assert_eq!(vehicles[0].id, second.id);
        assert_eq!(vehicles[1].id, first.id);
        assert!(second.created_at > first.created_at);
    }

    #[test]
    fn test_update_vehicle() {
        let store = RecordStore::open_in_memory().unwrap();
        let mut vehicle = store.insert_vehicle(sample_vehicle()).unwrap();

        vehicle.name = "Commuter".to_string();
        store.update_vehicle(&vehicle).unwrap();

        let fetched = store.get_vehicle(vehicle.id).unwrap().unwrap();
        assert_eq!(fetched.name, "Commuter");
        assert_eq!(fetched.created_at, vehicle.created_at);

        let ghost = sample_vehicle();
        assert!(matches!(
            store.update_vehicle(&ghost),
            Err(StoreError::VehicleNotFound(_))
        ));
    }

    #[test]
    fn test_created_at_is_strictly_monotonic() {
        let store = RecordStore::open_in_memory().unwrap();
        let vehicle = store.insert_vehicle(sample_vehicle()).unwrap();

        let mut stamps = Vec::new();
        for i in 0..50 {
            let record = store
                .insert_fuel(FuelRecord::new(
                    vehicle.id,
                    1700000000000 + i,
                    1000.0,
                    10.0,
                    40.0,
                ))
                .unwrap();
            stamps.push(record.created_at);
        }

        for pair in stamps.windows(2) {
            assert!(pair[1] > pair[0], "created_at must be strictly increasing");
        }
    }

    #[test]
    fn test_insert_fuel_requires_vehicle() {
        let store = RecordStore::open_in_memory().unwrap();
        let record = FuelRecord::new(Uuid::new_v4(), 1700000000000, 1000.0, 10.0, 40.0);

        assert!(matches!(
            store.insert_fuel(record),
            Err(StoreError::VehicleNotFound(_))
        ));
    }

    #[test]
    fn test_cascade_delete_removes_fuels() {
        let store = RecordStore::open_in_memory().unwrap();
        let vehicle = store.insert_vehicle(sample_vehicle()).unwrap();

        for i in 0..3 {
            store
                .insert_fuel(FuelRecord::new(
                    vehicle.id,
                    1700000000000 + i,
                    1000.0 + i as f64,
                    10.0,
                    40.0,
                ))
                .unwrap();
        }
        assert_eq!(store.fuel_count().unwrap(), 3);

        store.delete_vehicle(vehicle.id).unwrap();

        assert!(store.get_vehicle(vehicle.id).unwrap().is_none());
        assert_eq!(store.fuel_count().unwrap(), 0);
        assert!(store.list_fuels(vehicle.id).unwrap().is_empty());
    }

    #[test]
    fn test_delete_missing_entities() {
        let store = RecordStore::open_in_memory().unwrap();

        assert!(matches!(
            store.delete_vehicle(Uuid::new_v4()),
            Err(StoreError::VehicleNotFound(_))
        ));
        assert!(matches!(
            store.delete_fuel(Uuid::new_v4()),
            Err(StoreError::FuelRecordNotFound(_))
        ));
    }

    #[test]
    fn test_update_fuel_preserves_created_at() {
        let store = RecordStore::open_in_memory().unwrap();
        let vehicle = store.insert_vehicle(sample_vehicle()).unwrap();
        let mut record = store
            .insert_fuel(FuelRecord::new(vehicle.id, 1700000000000, 1000.0, 10.0, 40.0))
            .unwrap();
        let original_created_at = record.created_at;

        record.date = 1700086400000;
        record.odometer = 1200.0;
        store.update_fuel(&record).unwrap();

        let fetched = store.get_fuel(record.id).unwrap().unwrap();
        assert_eq!(fetched.date, 1700086400000);
        assert_eq!(fetched.odometer, 1200.0);
        assert_eq!(fetched.created_at, original_created_at);
    }

    #[test]
    fn test_change_events_per_write() {
        let store = RecordStore::open_in_memory().unwrap();
        let mut rx = store.subscribe();

        let vehicle = store.insert_vehicle(sample_vehicle()).unwrap();
        let record = store
            .insert_fuel(FuelRecord::new(vehicle.id, 1700000000000, 1000.0, 10.0, 40.0))
            .unwrap();
        store.delete_fuel(record.id).unwrap();
        store.delete_vehicle(vehicle.id).unwrap();

        let kinds: Vec<ChangeKind> = (0..4).map(|_| rx.try_recv().unwrap().kind).collect();
        assert_eq!(
            kinds,
            vec![
                ChangeKind::VehicleCreated,
                ChangeKind::FuelCreated,
                ChangeKind::FuelDeleted,
                ChangeKind::VehicleDeleted,
            ]
        );
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_persistence_across_reopen() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("carlog.db");

        let vehicle_id;
        let last_stamp;
        {
            let store = RecordStore::open(&db_path).unwrap();
            let vehicle = store.insert_vehicle(sample_vehicle()).unwrap();
            vehicle_id = vehicle.id;
            let record = store
                .insert_fuel(FuelRecord::new(vehicle.id, 1700000000000, 1000.0, 10.0, 40.0))
                .unwrap();
            last_stamp = record.created_at;
        }

        {
            let store = RecordStore::open(&db_path).unwrap();
            let vehicle = store.get_vehicle(vehicle_id).unwrap().unwrap();
            assert_eq!(vehicle.name, "Daily driver");
            assert_eq!(store.list_fuels(vehicle_id).unwrap().len(), 1);

            // Insertion clock must continue past persisted stamps.
            let record = store
                .insert_fuel(FuelRecord::new(vehicle_id, 1700000000000, 1100.0, 9.0, 38.0))
                .unwrap();
            assert!(record.created_at > last_stamp);
        }
    }
}
