//! Reactive stats feed
//!
//! Bridges the store's change notifications to a continuously-refreshed read
//! model: after every committed write the feed recomputes the full
//! `Vec<VehicleWithStats>` and publishes it on a watch channel. Consumers
//! (list views, detail views) hold a receiver and always observe a state
//! that reflects at least the latest completed write; a lagged event stream
//! still triggers a single full refresh, so no stale aggregate survives.

use crate::stats::engine::{StatsEngine, VehicleWithStats};
use crate::store::RecordStore;
use std::sync::Arc;
use tokio::sync::{broadcast::error::RecvError, watch};
use tokio::task::JoinHandle;

/// Continuously-refreshed read model of all vehicles with stats
pub struct StatsFeed {
    rx: watch::Receiver<Vec<VehicleWithStats>>,
    handle: JoinHandle<()>,
}

impl StatsFeed {
    /// Spawn the refresh task
    ///
    /// Computes an initial snapshot synchronously so subscribers never see a
    /// pre-write default, then refreshes on every store event until the store
    /// is dropped.
    pub fn spawn(store: Arc<RecordStore>, engine: Arc<StatsEngine>) -> Self {
        let initial = engine.compute_stats_for_all().unwrap_or_else(|e| {
            tracing::error!(error = %e, "Initial stats computation failed");
            Vec::new()
        });
        let (tx, rx) = watch::channel(initial);
        let mut events = store.subscribe();

        let handle = tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(event) => {
                        tracing::debug!(
                            vehicle_id = %event.vehicle_id,
                            kind = ?event.kind,
                            "Refreshing stats"
                        );
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "Stats feed lagged; running full refresh");
                    }
                    Err(RecvError::Closed) => {
                        tracing::debug!("Store event channel closed; stats feed stopping");
                        break;
                    }
                }

                match engine.compute_stats_for_all() {
                    Ok(snapshot) => {
                        if tx.send(snapshot).is_err() {
                            // All receivers gone.
                            break;
                        }
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Stats recomputation failed; keeping previous snapshot");
                    }
                }
            }
        });

        Self { rx, handle }
    }

    /// Subscribe to the read model
    pub fn subscribe(&self) -> watch::Receiver<Vec<VehicleWithStats>> {
        self.rx.clone()
    }

    /// Stop the refresh task
    pub fn abort(&self) {
        self.handle.abort();
    }
}

impl Drop for StatsFeed {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{FuelRecord, Vehicle};

    #[tokio::test]
    async fn test_feed_reflects_writes() {
        let store = Arc::new(RecordStore::open_in_memory().unwrap());
        let engine = Arc::new(StatsEngine::new(Arc::clone(&store)));
        let feed = StatsFeed::spawn(Arc::clone(&store), engine);
        let mut rx = feed.subscribe();

        assert!(rx.borrow().is_empty());

        let vehicle = store
            .insert_vehicle(Vehicle::new("Daily driver", "Toyota", "Corolla", 2019, "AB-123-CD"))
            .unwrap();
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow().len(), 1);

        store
            .insert_fuel(FuelRecord::new(vehicle.id, 1700000000000, 1000.0, 10.0, 40.0))
            .unwrap();
        rx.changed().await.unwrap();
        {
            let snapshot = rx.borrow();
            assert_eq!(snapshot[0].stats.refuel_count, 1);
            assert_eq!(snapshot[0].stats.latest_odometer, 1000.0);
        }

        store.delete_vehicle(vehicle.id).unwrap();
        rx.changed().await.unwrap();
        assert!(rx.borrow().is_empty());
    }

    #[tokio::test]
    async fn test_feed_stops_when_aborted() {
        let store = Arc::new(RecordStore::open_in_memory().unwrap());
        let engine = Arc::new(StatsEngine::new(Arc::clone(&store)));
        let feed = StatsFeed::spawn(Arc::clone(&store), engine);

        feed.abort();
        // Writes after abort still succeed; only the feed is gone.
        store
            .insert_vehicle(Vehicle::new("Van", "Ford", "Transit", 2021, "XY-987-ZW"))
            .unwrap();
    }
}
