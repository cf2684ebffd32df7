use log::{debug, info};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use crate::geo::CoordinateSample;

use super::entity::{Telemetry, TrackedEntity};
use super::error::StoreError;

pub const DEFAULT_TRAIL_LENGTH: usize = 20;

/// Latest trail of positions per reporting identifier.
///
/// The outer lock is only taken for writing the first time an identifier
/// shows up. Each entity has its own mutex, so the append-and-truncate for
/// one identifier is atomic and reports for different identifiers do not
/// contend with each other.
pub struct LocationStore {
    capacity: usize,
    entities: RwLock<HashMap<String, Arc<Mutex<TrackedEntity>>>>,
}

impl LocationStore {
    pub fn new(capacity: usize) -> Result<Self, StoreError> {
        if capacity == 0 {
            return Err(StoreError::ZeroCapacity);
        }
        Ok(Self {
            capacity,
            entities: RwLock::new(HashMap::new()),
        })
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Appends `sample` to the trail of `identifier`. Duplicates are kept.
    /// Returns the trail length after trimming.
    pub fn record(&self, identifier: &str, sample: CoordinateSample) -> usize {
        let entity = self.entity(identifier);
        let mut entity = entity.lock().unwrap_or_else(PoisonError::into_inner);
        entity.push(sample, self.capacity);
        debug!(
            "Recorded {}, {} for {} ({} in trail)",
            sample.latitude,
            sample.longitude,
            identifier,
            entity.trail.len()
        );
        entity.trail.len()
    }

    /// Like [`record`](Self::record), also replacing the entity's latest telemetry.
    pub fn record_with_telemetry(
        &self,
        identifier: &str,
        sample: CoordinateSample,
        telemetry: Telemetry,
    ) -> usize {
        let entity = self.entity(identifier);
        let mut entity = entity.lock().unwrap_or_else(PoisonError::into_inner);
        entity.push(sample, self.capacity);
        entity.last_telemetry = (!telemetry.is_empty()).then_some(telemetry);
        entity.trail.len()
    }

    pub fn get(&self, identifier: &str) -> Option<TrackedEntity> {
        let entities = self.entities.read().unwrap_or_else(PoisonError::into_inner);
        entities
            .get(identifier)
            .map(|e| e.lock().unwrap_or_else(PoisonError::into_inner).clone())
    }

    pub fn snapshot(&self) -> BTreeMap<String, TrackedEntity> {
        let entities = self.entities.read().unwrap_or_else(PoisonError::into_inner);
        entities
            .iter()
            .map(|(id, e)| {
                let entity = e.lock().unwrap_or_else(PoisonError::into_inner).clone();
                (id.clone(), entity)
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entities
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn entity(&self, identifier: &str) -> Arc<Mutex<TrackedEntity>> {
        if let Some(entity) = self
            .entities
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(identifier)
        {
            return entity.clone();
        }

        let mut entities = self.entities.write().unwrap_or_else(PoisonError::into_inner);
        entities
            .entry(identifier.to_string())
            .or_insert_with(|| {
                info!("Tracking new identifier {}", identifier);
                Arc::new(Mutex::new(TrackedEntity::new(identifier)))
            })
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::color_for;
    use chrono::{Duration, TimeZone, Utc};
    use std::thread;

    fn sample(i: i64) -> CoordinateSample {
        let t0 = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        CoordinateSample::new(40.0 + i as f64 * 1e-4, -74.0, t0 + Duration::seconds(i)).unwrap()
    }

    #[test]
    fn zero_capacity_is_rejected() {
        assert!(matches!(LocationStore::new(0), Err(StoreError::ZeroCapacity)));
    }

    #[test]
    fn keeps_last_twenty_of_twenty_five() {
        let store = LocationStore::new(20).unwrap();
        for i in 1..=25 {
            store.record("bus7", sample(i));
        }

        let snapshot = store.snapshot();
        let trail: Vec<_> = snapshot["bus7"].trail.iter().copied().collect();
        let expected: Vec<_> = (6..=25).map(sample).collect();
        assert_eq!(trail, expected);
    }

    #[test]
    fn trail_never_exceeds_capacity() {
        for capacity in [1, 3, 20] {
            let store = LocationStore::new(capacity).unwrap();
            for i in 0..50 {
                let len = store.record("bus", sample(i));
                assert!(len <= capacity);
                assert!(store.get("bus").unwrap().trail.len() <= capacity);
            }
        }
    }

    #[test]
    fn color_is_assigned_once_and_stable() {
        let store = LocationStore::new(5).unwrap();
        store.record("bus7", sample(0));
        let first = store.get("bus7").unwrap().color;
        store.record("bus7", sample(1));
        assert_eq!(store.get("bus7").unwrap().color, first);
        assert_eq!(first, color_for("bus7"));

        let other = LocationStore::new(5).unwrap();
        other.record("bus7", sample(9));
        assert_eq!(other.get("bus7").unwrap().color, first);
    }

    #[test]
    fn duplicates_are_appended() {
        let store = LocationStore::new(5).unwrap();
        store.record("bus", sample(1));
        store.record("bus", sample(1));
        assert_eq!(store.get("bus").unwrap().trail.len(), 2);
    }

    #[test]
    fn identifiers_are_independent() {
        let store = LocationStore::new(5).unwrap();
        store.record("a", sample(1));
        store.record("b", sample(2));
        store.record("b", sample(3));

        let snapshot = store.snapshot();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot["a"].trail.len(), 1);
        assert_eq!(snapshot["b"].trail.len(), 2);
        assert_eq!(store.len(), 2);
        assert!(store.get("c").is_none());
    }

    #[test]
    fn telemetry_replaces_previous() {
        let store = LocationStore::new(5).unwrap();
        let first = Telemetry {
            battery: Some(80.0),
            ..Default::default()
        };
        store.record_with_telemetry("dev", sample(1), first);
        let second = Telemetry {
            speed: Some(3.5),
            ..Default::default()
        };
        store.record_with_telemetry("dev", sample(2), second.clone());
        assert_eq!(store.get("dev").unwrap().last_telemetry, Some(second));

        store.record_with_telemetry("dev", sample(3), Telemetry::default());
        assert_eq!(store.get("dev").unwrap().last_telemetry, None);
    }

    #[test]
    fn concurrent_writers_on_one_identifier_respect_capacity() {
        let store = Arc::new(LocationStore::new(20).unwrap());
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let store = store.clone();
                thread::spawn(move || {
                    for i in 0..100 {
                        store.record("shared", sample(t * 100 + i));
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(store.get("shared").unwrap().trail.len(), 20);
    }

    #[test]
    fn snapshot_serializes_as_identifier_map() {
        let store = LocationStore::new(5).unwrap();
        store.record("bus7", sample(0));
        let value = serde_json::to_value(store.snapshot()).unwrap();
        assert_eq!(value["bus7"]["color"], color_for("bus7"));
        assert_eq!(value["bus7"]["trail"].as_array().unwrap().len(), 1);
        assert!(value["bus7"].get("last_telemetry").is_none());
    }
}
