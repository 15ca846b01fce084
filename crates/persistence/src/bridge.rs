use std::collections::BTreeMap;

use serde::Serialize;
use tracing::{debug, warn};

use crate::slices::{
    MapDataSnapshot, Slice, SliceKeys, SnapshotError, TransformSnapshot, ValuesSnapshot,
};
use crate::store::KvStore;

/// Typed access to the three slices, with a per-view cache of the last raw
/// value this view wrote or observed.
///
/// Loads never fail: any read, parse or shape error degrades to the slice
/// default. Saves write through to the store and the cache; a store failure
/// is logged and the cache is still updated.
#[derive(Debug)]
pub struct PersistenceBridge<S> {
    store: S,
    keys: SliceKeys,
    /// `None` = never seen; `Some(None)` = seen as absent.
    cache: BTreeMap<Slice, Option<String>>,
}

impl<S: KvStore> PersistenceBridge<S> {
    pub fn new(store: S, keys: SliceKeys) -> Self {
        Self {
            store,
            keys,
            cache: BTreeMap::new(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn keys(&self) -> &SliceKeys {
        &self.keys
    }

    /// Current raw value in the shared store. Read errors count as absent.
    pub fn raw(&self, slice: Slice) -> Option<String> {
        let key = self.keys.key(slice);
        match self.store.get(key) {
            Ok(v) => v,
            Err(err) => {
                warn!(%slice, "store read failed: {err}");
                None
            }
        }
    }

    /// Last raw value this view wrote or reconciled.
    pub fn cached(&self, slice: Slice) -> Option<Option<&str>> {
        self.cache.get(&slice).map(|v| v.as_deref())
    }

    /// Records `raw` as seen without touching the store.
    pub fn remember(&mut self, slice: Slice, raw: Option<String>) {
        self.cache.insert(slice, raw);
    }

    /// Erases a stored map-data slice that cannot belong to a diagram with
    /// `unit_count` units. Returns `true` if something was erased.
    pub fn discard_stale_map_data(&mut self, unit_count: usize) -> bool {
        let Some(raw) = self.raw(Slice::MapData) else {
            return false;
        };
        let Err(err) = MapDataSnapshot::parse(&raw, unit_count) else {
            return false;
        };
        debug!(unit_count, "discarding stored map data: {err}");
        if let Err(err) = self.store.remove(self.keys.key(Slice::MapData)) {
            warn!("failed to erase stale map data: {err}");
        }
        self.cache.remove(&Slice::MapData);
        true
    }

    pub fn load_map_data(&self, unit_count: usize) -> MapDataSnapshot {
        or_default(
            Slice::MapData,
            decode_map_data(self.raw(Slice::MapData).as_deref(), unit_count),
            || MapDataSnapshot::initial(unit_count),
        )
    }

    pub fn load_values(&self) -> ValuesSnapshot {
        or_default(
            Slice::Values,
            decode_values(self.raw(Slice::Values).as_deref()),
            ValuesSnapshot::default,
        )
    }

    pub fn load_transform(&self) -> TransformSnapshot {
        or_default(
            Slice::Transform,
            decode_transform(self.raw(Slice::Transform).as_deref()),
            TransformSnapshot::default,
        )
    }

    pub fn save_map_data(&mut self, snapshot: &MapDataSnapshot) {
        self.save(Slice::MapData, snapshot);
    }

    pub fn save_values(&mut self, snapshot: &ValuesSnapshot) {
        self.save(Slice::Values, snapshot);
    }

    pub fn save_transform(&mut self, snapshot: &TransformSnapshot) {
        self.save(Slice::Transform, snapshot);
    }

    fn save<T: Serialize>(&mut self, slice: Slice, value: &T) {
        let raw = match serde_json::to_string(value) {
            Ok(raw) => raw,
            Err(err) => {
                warn!(%slice, "failed to encode slice: {err}");
                return;
            }
        };
        if let Err(err) = self.store.set(self.keys.key(slice), &raw) {
            warn!(%slice, "store write failed: {err}");
        }
        self.cache.insert(slice, Some(raw));
    }
}

/// Absent slices decode to `Ok(None)`.
pub fn decode_map_data(
    raw: Option<&str>,
    unit_count: usize,
) -> Result<Option<MapDataSnapshot>, SnapshotError> {
    raw.map(|r| MapDataSnapshot::parse(r, unit_count))
        .transpose()
}

pub fn decode_values(raw: Option<&str>) -> Result<Option<ValuesSnapshot>, SnapshotError> {
    raw.map(ValuesSnapshot::parse).transpose()
}

pub fn decode_transform(raw: Option<&str>) -> Result<Option<TransformSnapshot>, SnapshotError> {
    raw.map(TransformSnapshot::parse).transpose()
}

fn or_default<T>(
    slice: Slice,
    decoded: Result<Option<T>, SnapshotError>,
    default: impl FnOnce() -> T,
) -> T {
    match decoded {
        Ok(Some(v)) => v,
        Ok(None) => default(),
        Err(err) => {
            debug!(%slice, "using default: {err}");
            default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::PersistenceBridge;
    use crate::slices::{MapDataSnapshot, Slice, SliceKeys, TransformSnapshot, ValuesSnapshot};
    use crate::store::{InMemoryStore, KvStore, StoreError};
    use pretty_assertions::assert_eq;
    use scene::UnitState;

    fn bridge() -> (InMemoryStore, PersistenceBridge<InMemoryStore>) {
        let store = InMemoryStore::new();
        (store.clone(), PersistenceBridge::new(store, SliceKeys::default()))
    }

    #[test]
    fn empty_store_loads_defaults() {
        let (_, b) = bridge();
        assert_eq!(b.load_map_data(3), MapDataSnapshot::initial(3));
        assert_eq!(b.load_values(), ValuesSnapshot::default());
        assert_eq!(b.load_transform(), TransformSnapshot::IDENTITY);
    }

    #[test]
    fn save_writes_store_and_cache() {
        let (store, mut b) = bridge();
        b.save_transform(&TransformSnapshot::new(1.0, 2.0, 3.0));
        let raw = store.get("transform").unwrap().unwrap();
        assert_eq!(raw, r#"{"x":1.0,"y":2.0,"k":3.0}"#);
        assert_eq!(b.cached(Slice::Transform), Some(Some(raw.as_str())));
        assert_eq!(b.load_transform(), TransformSnapshot::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn partial_values_resolve_to_full_default() {
        let (store, b) = bridge();
        store
            .set(
                "values",
                r#"{"interface":"south","unitsCount":9,"meterPrice":1,"unitArea":2}"#,
            )
            .unwrap();
        assert_eq!(b.load_values(), ValuesSnapshot::default());
    }

    #[test]
    fn malformed_json_loads_default() {
        let (store, b) = bridge();
        store.set("map-data", "[\"initial\"").unwrap();
        store.set("transform", "{").unwrap();
        assert_eq!(b.load_map_data(1), MapDataSnapshot::initial(1));
        assert_eq!(b.load_transform(), TransformSnapshot::IDENTITY);
    }

    #[test]
    fn zero_scale_transform_loads_identity() {
        let (store, b) = bridge();
        store.set("transform", r#"{"x":0,"y":0,"k":0}"#).unwrap();
        assert_eq!(b.load_transform(), TransformSnapshot::IDENTITY);
    }

    #[test]
    fn stale_map_data_is_erased() {
        let (store, mut b) = bridge();
        store.set("map-data", r#"["selected","selected"]"#).unwrap();
        assert!(b.discard_stale_map_data(3));
        assert_eq!(store.get("map-data").unwrap(), None);
        assert_eq!(b.load_map_data(3), MapDataSnapshot::initial(3));
    }

    #[test]
    fn garbage_map_data_is_erased() {
        let (store, mut b) = bridge();
        store.set("map-data", "oops").unwrap();
        assert!(b.discard_stale_map_data(0));
        assert_eq!(store.get("map-data").unwrap(), None);
    }

    #[test]
    fn matching_map_data_is_kept() {
        let (store, mut b) = bridge();
        store.set("map-data", r#"["selected","initial"]"#).unwrap();
        assert!(!b.discard_stale_map_data(2));
        assert_eq!(
            b.load_map_data(2),
            MapDataSnapshot(vec![UnitState::Selected, UnitState::Initial])
        );
        assert!(!b.discard_stale_map_data(2));
    }

    #[test]
    fn custom_keys_are_used() {
        let store = InMemoryStore::new();
        let keys = SliceKeys {
            map_data: "plan.map".to_string(),
            ..SliceKeys::default()
        };
        let mut b = PersistenceBridge::new(store.clone(), keys);
        b.save_map_data(&MapDataSnapshot::initial(1));
        assert!(store.get("plan.map").unwrap().is_some());
        assert_eq!(store.get("map-data").unwrap(), None);
    }

    #[derive(Debug, Default)]
    struct BrokenStore;

    impl KvStore for BrokenStore {
        fn get(&self, _key: &str) -> Result<Option<String>, StoreError> {
            Err(StoreError::Io("quota".to_string()))
        }

        fn set(&self, _key: &str, _value: &str) -> Result<(), StoreError> {
            Err(StoreError::Io("quota".to_string()))
        }

        fn remove(&self, _key: &str) -> Result<(), StoreError> {
            Err(StoreError::Unavailable)
        }
    }

    #[test]
    fn store_failures_degrade_to_defaults() {
        let mut b = PersistenceBridge::new(BrokenStore, SliceKeys::default());
        assert_eq!(b.load_values(), ValuesSnapshot::default());
        b.save_values(&ValuesSnapshot::default().with_units_count(4));
        assert!(b.cached(Slice::Values).is_some());
        assert!(!b.discard_stale_map_data(1));
    }
}
