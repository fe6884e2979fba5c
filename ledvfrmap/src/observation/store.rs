//! Shared observation cache with whole-set replacement.
//!
//! # Thread Safety
//!
//! One writer (the refresh task) swaps in complete snapshots; any number of
//! readers grab the current `Arc<ObservationSnapshot>` under a short read
//! lock. The lock only guards the pointer, never the data itself.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;

use super::types::Observation;

/// Read access to observations by station identifier.
///
/// Implemented by [`ObservationSnapshot`] and plain maps so the estimator can
/// be driven from either.
pub trait ObservationLookup {
    /// The observation for `station_id`, if any.
    fn observation(&self, station_id: &str) -> Option<&Observation>;
}

impl ObservationLookup for HashMap<String, Observation> {
    fn observation(&self, station_id: &str) -> Option<&Observation> {
        self.get(station_id)
    }
}

/// An immutable, complete set of observations from one refresh.
#[derive(Debug, Clone, Default)]
pub struct ObservationSnapshot {
    observations: HashMap<String, Observation>,
    refreshed_at: Option<DateTime<Utc>>,
}

impl ObservationSnapshot {
    /// Create a snapshot stamped with `refreshed_at`.
    pub fn new(observations: HashMap<String, Observation>, refreshed_at: DateTime<Utc>) -> Self {
        Self {
            observations,
            refreshed_at: Some(refreshed_at),
        }
    }

    /// The observation for `station_id`.
    pub fn get(&self, station_id: &str) -> Option<&Observation> {
        self.observations.get(station_id)
    }

    /// When this snapshot was installed, `None` for the initial empty one.
    pub fn refreshed_at(&self) -> Option<DateTime<Utc>> {
        self.refreshed_at
    }

    /// Age of the snapshot relative to `now`.
    pub fn age(&self, now: DateTime<Utc>) -> Option<Duration> {
        self.refreshed_at.map(|at| now - at)
    }

    /// Number of stations with an observation.
    pub fn len(&self) -> usize {
        self.observations.len()
    }

    /// Whether the snapshot holds no observations.
    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    /// Iterate over `(station_id, observation)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Observation)> {
        self.observations.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl ObservationLookup for ObservationSnapshot {
    fn observation(&self, station_id: &str) -> Option<&Observation> {
        self.get(station_id)
    }
}

/// Concurrently readable, singly written observation cache.
///
/// # Example
///
/// ```
/// use std::collections::HashMap;
/// use ledvfrmap::observation::{FlightCategory, Observation, ObservationStore};
///
/// let store = ObservationStore::new();
/// assert!(store.last_refresh_time().is_none());
///
/// let mut batch = HashMap::new();
/// batch.insert("KHPN".to_string(), Observation::new().with_category(FlightCategory::Vfr));
/// store.refresh(batch);
///
/// assert_eq!(store.get("KHPN").unwrap().flight_category, Some(FlightCategory::Vfr));
/// assert!(store.last_refresh_time().is_some());
/// ```
#[derive(Debug, Default)]
pub struct ObservationStore {
    current: RwLock<Arc<ObservationSnapshot>>,
}

impl ObservationStore {
    /// Create an empty, never-refreshed store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the entire observation set, stamped with the current time.
    pub fn refresh(&self, observations: HashMap<String, Observation>) {
        self.refresh_at(observations, Utc::now());
    }

    /// Replace the entire observation set with an explicit timestamp.
    pub fn refresh_at(&self, observations: HashMap<String, Observation>, at: DateTime<Utc>) {
        let count = observations.len();
        let snapshot = Arc::new(ObservationSnapshot::new(observations, at));
        *self.current.write() = snapshot;
        tracing::debug!(stations = count, refreshed_at = %at, "Observation set replaced");
    }

    /// The current snapshot. Stays valid and unchanged across later refreshes.
    pub fn snapshot(&self) -> Arc<ObservationSnapshot> {
        self.current.read().clone()
    }

    /// A copy of the current observation for `station_id`.
    pub fn get(&self, station_id: &str) -> Option<Observation> {
        self.current.read().get(station_id).cloned()
    }

    /// When the store was last refreshed, `None` if never.
    pub fn last_refresh_time(&self) -> Option<DateTime<Utc>> {
        self.current.read().refreshed_at()
    }

    /// Number of stations in the current snapshot.
    pub fn len(&self) -> usize {
        self.current.read().len()
    }

    /// Whether the current snapshot is empty.
    pub fn is_empty(&self) -> bool {
        self.current.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observation::FlightCategory;

    fn batch(entries: &[(&str, FlightCategory)]) -> HashMap<String, Observation> {
        entries
            .iter()
            .map(|(code, cat)| (code.to_string(), Observation::new().with_category(*cat)))
            .collect()
    }

    #[test]
    fn test_new_store_is_empty_and_unrefreshed() {
        let store = ObservationStore::new();
        assert!(store.is_empty());
        assert!(store.get("KHPN").is_none());
        assert!(store.last_refresh_time().is_none());
        assert!(store.snapshot().refreshed_at().is_none());
    }

    #[test]
    fn test_refresh_replaces_whole_set() {
        let store = ObservationStore::new();
        store.refresh(batch(&[("KHPN", FlightCategory::Vfr), ("KJFK", FlightCategory::Ifr)]));
        assert_eq!(store.len(), 2);

        store.refresh(batch(&[("KLGA", FlightCategory::Mvfr)]));
        assert_eq!(store.len(), 1);
        assert!(store.get("KHPN").is_none(), "old entries must not survive");
        assert_eq!(
            store.get("KLGA").unwrap().flight_category,
            Some(FlightCategory::Mvfr)
        );
    }

    #[test]
    fn test_snapshot_unaffected_by_later_refresh() {
        let store = ObservationStore::new();
        store.refresh(batch(&[("KHPN", FlightCategory::Vfr)]));
        let held = store.snapshot();

        store.refresh(batch(&[("KHPN", FlightCategory::Lifr)]));

        assert_eq!(
            held.get("KHPN").unwrap().flight_category,
            Some(FlightCategory::Vfr)
        );
        assert_eq!(
            store.get("KHPN").unwrap().flight_category,
            Some(FlightCategory::Lifr)
        );
    }

    #[test]
    fn test_refresh_at_records_timestamp() {
        let store = ObservationStore::new();
        let at = Utc::now() - Duration::minutes(5);
        store.refresh_at(HashMap::new(), at);
        assert_eq!(store.last_refresh_time(), Some(at));

        let age = store.snapshot().age(at + Duration::minutes(5)).unwrap();
        assert_eq!(age, Duration::minutes(5));
    }

    #[test]
    fn test_concurrent_readers_see_complete_sets() {
        use std::thread;

        let store = Arc::new(ObservationStore::new());
        // Every batch holds N stations all with the same category; a reader
        // must never see a mix.
        let stations: Vec<String> = (0..50).map(|i| format!("K{:03}", i)).collect();
        let make = |cat: FlightCategory| -> HashMap<String, Observation> {
            stations
                .iter()
                .map(|s| (s.clone(), Observation::new().with_category(cat)))
                .collect()
        };
        store.refresh(make(FlightCategory::Vfr));

        let writer = {
            let store = Arc::clone(&store);
            let batches = [make(FlightCategory::Ifr), make(FlightCategory::Vfr)];
            thread::spawn(move || {
                for i in 0..200 {
                    store.refresh(batches[i % 2].clone());
                }
            })
        };

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    for _ in 0..200 {
                        let snap = store.snapshot();
                        let first = snap.iter().next().map(|(_, o)| o.flight_category);
                        assert!(snap.iter().all(|(_, o)| Some(o.flight_category) == first));
                        assert_eq!(snap.len(), 50);
                    }
                })
            })
            .collect();

        writer.join().unwrap();
        for reader in readers {
            reader.join().unwrap();
        }
    }
}
