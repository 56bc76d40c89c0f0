//! The synchronized collection store.
//!
//! Reads resolve a collection across three tiers: the memory cache, the local
//! store, and the remote static files, falling back to seed data when all of
//! them come up empty. Writes land in the local store only and flush the whole
//! memory cache.
//!
//! Operations take `&self` and may be interleaved by the caller's executor.
//! Nothing is atomic across an await point: two overlapping writes can both
//! read the same snapshot, and the later save wins.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use rand::Rng;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::cache::{MemoryCache, DEFAULT_CACHE_TTL};
use crate::clock::{Clock, SystemClock};
use crate::defaults::{DefaultProvider, SeedData};
use crate::error::{StorageError, SyncError};
use crate::models::{Collection, CollectionName, Record, Stats};
use crate::remote::RemoteSource;
use crate::storage::{LocalStore, LocalTier};

/// Length of the random base36 suffix appended to generated ids.
const ID_SUFFIX_LEN: usize = 6;

const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Result of a mutation that reached the persistence step.
///
/// `value` is always the in-memory result. `saved` reports whether the new
/// snapshot made it into the local store; callers that only care about the
/// value can ignore it.
#[derive(Debug)]
pub struct Written<T> {
    pub value: T,
    pub saved: Result<(), StorageError>,
}

impl<T> Written<T> {
    pub fn is_saved(&self) -> bool {
        self.saved.is_ok()
    }

    pub fn into_inner(self) -> T {
        self.value
    }
}

/// Per-collection view of every tier, for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "camelCase")]
pub struct CollectionStatus {
    pub name: CollectionName,
    pub cached: bool,
    pub cache_fresh: bool,
    pub cache_age: Option<String>,
    pub cached_last_updated: Option<i64>,
    pub cached_items: Option<usize>,
    pub local_last_updated: Option<i64>,
    pub local_items: Option<usize>,
}

pub struct SyncedCollectionStore {
    local: LocalTier,
    remote: Arc<dyn RemoteSource>,
    defaults: Arc<dyn DefaultProvider>,
    clock: Arc<dyn Clock>,
    cache: Mutex<MemoryCache>,
    ttl_millis: i64,
}

impl SyncedCollectionStore {
    /// Create a store with the seed defaults, the system clock and a 5 minute TTL.
    pub fn new(local: Arc<dyn LocalStore>, remote: Arc<dyn RemoteSource>) -> Self {
        Self {
            local: LocalTier::new(local),
            remote,
            defaults: Arc::new(SeedData),
            clock: Arc::new(SystemClock),
            cache: Mutex::new(MemoryCache::new()),
            ttl_millis: DEFAULT_CACHE_TTL.as_millis() as i64,
        }
    }

    pub fn with_defaults(mut self, defaults: Arc<dyn DefaultProvider>) -> Self {
        self.defaults = defaults;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl_millis = i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX);
        self
    }

    fn cache(&self) -> MutexGuard<'_, MemoryCache> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ===== Reads =====

    /// Resolve the current snapshot of `name`. Never fails.
    ///
    /// A fresh cache entry wins unless the local store holds a strictly newer
    /// `lastUpdated`, in which case the local copy is promoted into the cache.
    /// Otherwise the remote is fetched and compared against the local copy;
    /// the remote is adopted as the new local baseline unless local is strictly
    /// newer. When the remote is unreachable, the local copy is served, and
    /// failing that the seed data.
    pub async fn read(&self, name: CollectionName) -> Collection {
        let local = self.local.load(name);
        let now = self.clock.now_millis();

        if let Some(hit) = self.check_cache(name, local.as_ref(), now) {
            return hit;
        }

        match self.remote.fetch(name).await {
            Ok(remote) => {
                let effective = match local {
                    Some(local) if local.last_updated > remote.last_updated => {
                        debug!(
                            collection = %name,
                            local = local.last_updated,
                            remote = remote.last_updated,
                            "Local store is newer than remote"
                        );
                        local
                    }
                    _ => {
                        if let Err(e) = self.local.save(&remote) {
                            warn!(collection = %name, error = %e, "Failed to adopt remote into local store");
                        }
                        remote
                    }
                };
                self.cache().insert(effective.clone(), self.clock.now_millis());
                effective
            }
            Err(e) => {
                warn!(collection = %name, error = %e, "Remote fetch failed");
                match local {
                    Some(local) => {
                        info!(collection = %name, "Offline mode: serving local store");
                        local
                    }
                    None => {
                        info!(collection = %name, "No local data: serving defaults");
                        self.defaults.default_collection(name, now)
                    }
                }
            }
        }
    }

    fn check_cache(&self, name: CollectionName, local: Option<&Collection>, now: i64) -> Option<Collection> {
        let mut cache = self.cache();
        let cached_updated = cache
            .get(name)
            .filter(|entry| entry.is_fresh(now, self.ttl_millis))
            .map(|entry| entry.data.last_updated)?;

        if let Some(local) = local.filter(|l| l.last_updated > cached_updated) {
            debug!(collection = %name, "Local store is newer than cache, promoting");
            cache.insert(local.clone(), now);
            return Some(local.clone());
        }

        cache.get(name).map(|entry| entry.data.clone())
    }

    pub async fn load_photos(&self) -> Vec<Record> {
        self.read(CollectionName::Photos).await.items
    }

    pub async fn load_members(&self) -> Vec<Record> {
        self.read(CollectionName::Members).await.items
    }

    /// Counts for both collections plus the latest record activity.
    pub async fn get_stats(&self) -> Stats {
        let (photos, members) = futures::join!(self.load_photos(), self.load_members());
        Stats::compute(&photos, &members)
    }

    // ===== Writes =====

    pub async fn add_photo(&self, fields: Map<String, Value>) -> Written<Record> {
        self.add(CollectionName::Photos, fields).await
    }

    pub async fn add_member(&self, fields: Map<String, Value>) -> Written<Record> {
        self.add(CollectionName::Members, fields).await
    }

    pub async fn update_photo(&self, id: &str, patch: &Map<String, Value>) -> Option<Written<Record>> {
        self.update(CollectionName::Photos, id, patch).await
    }

    pub async fn update_member(&self, id: &str, patch: &Map<String, Value>) -> Option<Written<Record>> {
        self.update(CollectionName::Members, id, patch).await
    }

    /// Remove a photo, returning it. `None` when no photo has `id`.
    pub async fn delete_photo(&self, id: &str) -> Option<Written<Record>> {
        self.delete(CollectionName::Photos, id).await
    }

    pub async fn delete_member(&self, id: &str) -> Option<Written<Record>> {
        self.delete(CollectionName::Members, id).await
    }

    pub async fn add(&self, name: CollectionName, fields: Map<String, Value>) -> Written<Record> {
        let mut current = self.read(name).await;
        let now = self.clock.now_millis();

        let id = generate_id(name, now, &current);
        let mut record = Record::with_id(id, fields);
        name.stamp_new(&mut record, now);
        current.items.push(record.clone());

        info!(collection = %name, id = record.id().unwrap_or_default(), "Record added");
        self.commit(current, now, record)
    }

    pub async fn update(
        &self,
        name: CollectionName,
        id: &str,
        patch: &Map<String, Value>,
    ) -> Option<Written<Record>> {
        self.write(name, |items, now| {
            let record = items.iter_mut().find(|r| r.id() == Some(id))?;
            record.merge(patch);
            name.stamp_update(record, now);
            Some(record.clone())
        })
        .await
    }

    pub async fn delete(&self, name: CollectionName, id: &str) -> Option<Written<Record>> {
        self.write(name, |items, _| {
            let index = items.iter().position(|r| r.id() == Some(id))?;
            Some(items.remove(index))
        })
        .await
    }

    /// Read `name`, apply `mutate` to its items, and commit the result.
    /// A `None` from `mutate` means the target was not found: nothing is written.
    async fn write<T>(
        &self,
        name: CollectionName,
        mutate: impl FnOnce(&mut Vec<Record>, i64) -> Option<T>,
    ) -> Option<Written<T>> {
        let mut current = self.read(name).await;
        let now = self.clock.now_millis();

        let Some(value) = mutate(&mut current.items, now) else {
            debug!(collection = %name, "Mutation target not found, nothing written");
            return None;
        };

        Some(self.commit(current, now, value))
    }

    /// Stamp, persist, and flush the entire memory cache.
    ///
    /// Every cached collection is dropped, not only the one written, so no
    /// read can observe a cache entry older than this write.
    fn commit<T>(&self, mut snapshot: Collection, now: i64, value: T) -> Written<T> {
        snapshot.last_updated = now.max(snapshot.last_updated.saturating_add(1));

        let saved = self.local.save(&snapshot);
        if let Err(e) = &saved {
            warn!(collection = %snapshot.name, error = %e, "Failed to persist collection");
        }

        self.cache().clear();
        info!(
            collection = %snapshot.name,
            last_updated = snapshot.last_updated,
            items = snapshot.items.len(),
            "Collection written, cache cleared"
        );

        Written { value, saved }
    }

    // ===== Diagnostics =====

    pub fn clear_cache(&self) {
        self.cache().clear();
        info!("Memory cache cleared");
    }

    /// Clear the memory cache and drop every collection from the local store.
    pub fn clear_all(&self) -> Result<(), StorageError> {
        self.clear_cache();
        let mut first_error = None;
        for name in CollectionName::ALL {
            if let Err(e) = self.local.remove(name) {
                warn!(collection = %name, error = %e, "Failed to remove local entry");
                first_error.get_or_insert(e);
            }
        }
        info!("Local store cleared");
        first_error.map_or(Ok(()), Err)
    }

    pub async fn force_reload(&self, name: CollectionName) -> Collection {
        self.clear_cache();
        self.read(name).await
    }

    /// Overwrite the local copy with the remote one, discarding local edits.
    pub async fn restore_from_remote(&self, name: CollectionName) -> Result<Collection, SyncError> {
        let remote = self.remote.fetch(name).await?;
        self.local.save(&remote)?;
        self.clear_cache();
        info!(collection = %name, items = remote.len(), "Restored local store from remote");
        Ok(remote)
    }

    /// The current collection as pretty JSON, ready to paste into its static file.
    pub async fn export(&self, name: CollectionName) -> Result<String, SyncError> {
        Ok(self.read(name).await.to_json_pretty()?)
    }

    pub fn cache_status(&self) -> Vec<CollectionStatus> {
        let now = self.clock.now_millis();
        let cache = self.cache();

        CollectionName::ALL
            .iter()
            .map(|&name| {
                let entry = cache.get(name);
                let local = self.local.load(name);
                CollectionStatus {
                    name,
                    cached: entry.is_some(),
                    cache_fresh: entry.is_some_and(|e| e.is_fresh(now, self.ttl_millis)),
                    cache_age: entry.map(|e| e.age_display(now)),
                    cached_last_updated: entry.map(|e| e.data.last_updated),
                    cached_items: entry.map(|e| e.data.len()),
                    local_last_updated: local.as_ref().map(|l| l.last_updated),
                    local_items: local.as_ref().map(Collection::len),
                }
            })
            .collect()
    }
}

/// `<prefix>-<now>-<random base36>`, redrawn until unique within `collection`.
fn generate_id(name: CollectionName, now: i64, collection: &Collection) -> String {
    let mut rng = rand::thread_rng();
    loop {
        let suffix: String = (0..ID_SUFFIX_LEN)
            .map(|_| BASE36[rng.gen_range(0..BASE36.len())] as char)
            .collect();
        let id = format!("{}-{}-{}", name.id_prefix(), now, suffix);
        if !collection.contains_id(&id) {
            return id;
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::remote::RemoteError;
    use crate::storage::MemoryStore;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const T0: i64 = 1_700_000_000_000;
    const MINUTE: i64 = 60_000;

    /// Remote double serving a settable document, or failing when unset.
    #[derive(Default)]
    struct StubRemote {
        response: Mutex<Option<Collection>>,
        fetches: AtomicUsize,
    }

    impl StubRemote {
        fn serving(collection: Collection) -> Self {
            let stub = Self::default();
            stub.set(Some(collection));
            stub
        }

        fn set(&self, collection: Option<Collection>) {
            *self.response.lock().unwrap() = collection;
        }

        fn fetches(&self) -> usize {
            self.fetches.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl RemoteSource for StubRemote {
        async fn fetch(&self, name: CollectionName) -> Result<Collection, RemoteError> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            match self.response.lock().unwrap().clone() {
                Some(c) if c.name == name => Ok(c),
                _ => Err(RemoteError::NotFound(name.file_name())),
            }
        }
    }

    struct Harness {
        store: SyncedCollectionStore,
        local: Arc<MemoryStore>,
        remote: Arc<StubRemote>,
        clock: Arc<ManualClock>,
    }

    impl Harness {
        fn new(remote: StubRemote) -> Self {
            Self::with_local(remote, MemoryStore::new())
        }

        fn with_local(remote: StubRemote, local: MemoryStore) -> Self {
            let local = Arc::new(local);
            let remote = Arc::new(remote);
            let clock = Arc::new(ManualClock::new(T0));
            let store = SyncedCollectionStore::new(local.clone(), remote.clone()).with_clock(clock.clone());
            Self {
                store,
                local,
                remote,
                clock,
            }
        }

        fn put_local(&self, collection: &Collection) {
            self.local
                .set(collection.name.as_str(), &collection.to_json().unwrap())
                .unwrap();
        }

        fn stored(&self, name: CollectionName) -> Option<Collection> {
            self.local
                .get(name.as_str())
                .unwrap()
                .map(|text| Collection::from_json(name, &text).unwrap())
        }

        fn cache_len(&self) -> usize {
            self.store.cache().len()
        }

        fn cached(&self, name: CollectionName) -> Option<Collection> {
            self.store.cache().get(name).map(|e| e.data.clone())
        }
    }

    fn photos(ids: &[&str], last_updated: i64) -> Collection {
        collection(CollectionName::Photos, ids, last_updated)
    }

    fn members(ids: &[&str], last_updated: i64) -> Collection {
        collection(CollectionName::Members, ids, last_updated)
    }

    fn collection(name: CollectionName, ids: &[&str], last_updated: i64) -> Collection {
        let items = ids
            .iter()
            .map(|id| Record::try_from(json!({"id": id, "createdAt": 1})).unwrap())
            .collect();
        Collection::new(name, items, last_updated)
    }

    fn fields(value: Value) -> Map<String, Value> {
        value.as_object().unwrap().clone()
    }

    // ===== read =====

    #[tokio::test]
    async fn test_scenario_a_remote_adopted_into_empty_local() {
        let h = Harness::new(StubRemote::serving(photos(&["p1", "p2"], 100)));

        let result = h.store.read(CollectionName::Photos).await;

        assert_eq!(result, photos(&["p1", "p2"], 100));
        assert_eq!(h.stored(CollectionName::Photos).unwrap().last_updated, 100);
        assert_eq!(h.cached(CollectionName::Photos), Some(result));
    }

    #[tokio::test]
    async fn test_scenario_b_newer_local_wins_over_remote() {
        let h = Harness::new(StubRemote::serving(photos(&["p1"], 100)));
        let local = photos(&["p1", "p9"], 500);
        h.put_local(&local);

        let result = h.store.read(CollectionName::Photos).await;

        assert_eq!(result, local);
        // Local store untouched, and the result is cached
        assert_eq!(h.stored(CollectionName::Photos), Some(local.clone()));
        assert_eq!(h.cached(CollectionName::Photos), Some(local));
    }

    #[tokio::test]
    async fn test_equal_timestamps_prefer_remote_over_local() {
        let h = Harness::new(StubRemote::serving(photos(&["remote"], 300)));
        h.put_local(&photos(&["local"], 300));

        let result = h.store.read(CollectionName::Photos).await;
        assert!(result.contains_id("remote"));
        assert!(h.stored(CollectionName::Photos).unwrap().contains_id("remote"));
    }

    #[tokio::test]
    async fn test_fresh_cache_served_without_fetch() {
        let h = Harness::new(StubRemote::serving(photos(&["p1"], 100)));
        h.store.read(CollectionName::Photos).await;

        h.remote.set(Some(photos(&["p1", "p2"], 200)));
        h.clock.advance(4 * MINUTE);
        let result = h.store.read(CollectionName::Photos).await;

        assert_eq!(result.last_updated, 100);
        assert_eq!(h.remote.fetches(), 1);
    }

    #[tokio::test]
    async fn test_expired_cache_refetches() {
        let h = Harness::new(StubRemote::serving(photos(&["p1"], 100)));
        h.store.read(CollectionName::Photos).await;

        h.remote.set(Some(photos(&["p1", "p2"], 200)));
        h.clock.advance(5 * MINUTE);
        let result = h.store.read(CollectionName::Photos).await;

        assert_eq!(result.last_updated, 200);
        assert_eq!(h.remote.fetches(), 2);
    }

    #[tokio::test]
    async fn test_newer_local_promoted_over_fresh_cache() {
        let h = Harness::new(StubRemote::serving(photos(&["p1"], 100)));
        h.store.read(CollectionName::Photos).await;

        // Another writer sharing the local store lands a newer snapshot
        let newer = photos(&["p1", "p2"], 150);
        h.put_local(&newer);
        h.clock.advance(MINUTE);

        let result = h.store.read(CollectionName::Photos).await;
        assert_eq!(result, newer);
        assert_eq!(h.cached(CollectionName::Photos), Some(newer));
        assert_eq!(h.store.cache().get(CollectionName::Photos).unwrap().cached_at, T0 + MINUTE);
        assert_eq!(h.remote.fetches(), 1);
    }

    #[tokio::test]
    async fn test_equal_local_keeps_cached_copy() {
        let h = Harness::new(StubRemote::serving(photos(&["p1"], 100)));
        h.store.read(CollectionName::Photos).await;
        h.put_local(&photos(&["other"], 100));

        let result = h.store.read(CollectionName::Photos).await;
        assert!(result.contains_id("p1"));
        assert_eq!(h.store.cache().get(CollectionName::Photos).unwrap().cached_at, T0);
    }

    #[tokio::test]
    async fn test_offline_fallback_returns_local_exactly() {
        let h = Harness::new(StubRemote::default());
        let local = members(&["m1", "m2"], 777);
        h.put_local(&local);

        let result = h.store.read(CollectionName::Members).await;
        assert_eq!(result, local);
        // Fallbacks are not cached; the next read retries the remote
        assert_eq!(h.cache_len(), 0);
        h.store.read(CollectionName::Members).await;
        assert_eq!(h.remote.fetches(), 2);
    }

    #[tokio::test]
    async fn test_all_tiers_failing_yields_defaults() {
        let h = Harness::new(StubRemote::default());

        let photos = h.store.read(CollectionName::Photos).await;
        assert!(photos.is_empty());
        assert_eq!(photos.last_updated, T0);

        let members = h.store.read(CollectionName::Members).await;
        assert_eq!(members.len(), 5);
    }

    #[tokio::test]
    async fn test_corrupt_local_treated_as_absent() {
        let h = Harness::new(StubRemote::default());
        h.local.set("members", "{\"members\": 12").unwrap();

        let result = h.store.read(CollectionName::Members).await;
        assert_eq!(result, SeedData.default_collection(CollectionName::Members, T0));
    }

    #[tokio::test]
    async fn test_corrupt_local_replaced_by_remote() {
        let h = Harness::new(StubRemote::serving(photos(&["p1"], 100)));
        h.local.set("photos", "not json").unwrap();

        let result = h.store.read(CollectionName::Photos).await;
        assert_eq!(result.last_updated, 100);
        assert_eq!(h.stored(CollectionName::Photos).unwrap().last_updated, 100);
    }

    // ===== write =====

    #[tokio::test]
    async fn test_scenario_c_add_member() {
        let h = Harness::new(StubRemote::serving(members(&[], 10)));
        h.clock.set(T0 + 42);

        let written = h.store.add_member(fields(json!({"name": "X"}))).await;
        assert!(written.is_saved());
        let member = written.into_inner();

        assert!(member.id().unwrap().starts_with("member-"));
        assert_eq!(member.get("status"), Some(&json!("active")));
        assert_eq!(member.timestamp("joinDate"), Some(T0 + 42));
        assert_eq!(member.get("name"), Some(&json!("X")));

        let stored = h.stored(CollectionName::Members).unwrap();
        assert_eq!(stored.last_updated, T0 + 42);
        assert_eq!(stored.items, vec![member]);
        assert_eq!(h.cache_len(), 0);
    }

    #[tokio::test]
    async fn test_add_photo_stamps_times_and_ignores_caller_id() {
        let h = Harness::new(StubRemote::serving(photos(&["p1"], 10)));

        let photo = h
            .store
            .add_photo(fields(json!({"id": "p1", "title": "Boss clear"})))
            .await
            .into_inner();

        assert_ne!(photo.id(), Some("p1"));
        assert!(photo.id().unwrap().starts_with(&format!("photo-{}-", T0)));
        assert_eq!(photo.timestamp("createdAt"), Some(T0));
        assert_eq!(photo.timestamp("updatedAt"), Some(T0));

        let stored = h.stored(CollectionName::Photos).unwrap();
        assert_eq!(stored.len(), 2);
        assert_eq!(stored.items.last(), Some(&photo));
    }

    #[tokio::test]
    async fn test_same_millisecond_adds_get_distinct_ids() {
        let h = Harness::new(StubRemote::serving(photos(&[], 10)));

        let a = h.store.add_photo(Map::new()).await.into_inner();
        let b = h.store.add_photo(Map::new()).await.into_inner();

        assert_ne!(a.id(), b.id());
        assert_eq!(h.stored(CollectionName::Photos).unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_write_flushes_every_cached_collection() {
        let h = Harness::new(StubRemote::default());
        h.put_local(&photos(&["p1"], 100));
        h.remote.set(Some(members(&["m1"], 100)));
        h.store.read(CollectionName::Members).await;
        assert_eq!(h.cache_len(), 1);

        h.store.delete_photo("p1").await.unwrap();
        assert_eq!(h.cache_len(), 0);
    }

    #[tokio::test]
    async fn test_read_after_write_sees_the_write() {
        let h = Harness::new(StubRemote::serving(photos(&["p1", "p2"], 100)));
        h.store.read(CollectionName::Photos).await;

        h.clock.advance(1_000);
        let patch = fields(json!({"title": "renamed"}));
        h.store.update_photo("p2", &patch).await.unwrap();

        // Remote still says 100; the local write is newer and must win
        let result = h.store.read(CollectionName::Photos).await;
        assert_eq!(result.last_updated, T0 + 1_000);
        assert_eq!(result.find("p2").unwrap().get("title"), Some(&json!("renamed")));
    }

    #[tokio::test]
    async fn test_update_photo_refreshes_updated_at() {
        let h = Harness::new(StubRemote::serving(photos(&["p1"], 100)));
        h.clock.set(T0 + 5);

        let patch = fields(json!({"title": "new", "id": "hijack"}));
        let updated = h.store.update_photo("p1", &patch).await.unwrap().into_inner();

        assert_eq!(updated.id(), Some("p1"));
        assert_eq!(updated.get("title"), Some(&json!("new")));
        assert_eq!(updated.timestamp("updatedAt"), Some(T0 + 5));
        assert_eq!(updated.timestamp("createdAt"), Some(1));
    }

    #[tokio::test]
    async fn test_update_member_merges_without_update_stamp() {
        let h = Harness::new(StubRemote::serving(members(&["m1"], 100)));

        let patch = fields(json!({"role": "officer"}));
        let updated = h.store.update_member("m1", &patch).await.unwrap().into_inner();

        assert_eq!(updated.get("role"), Some(&json!("officer")));
        assert_eq!(updated.get("updatedAt"), None);
        assert_eq!(h.stored(CollectionName::Members).unwrap().last_updated, T0);
    }

    #[tokio::test]
    async fn test_unknown_id_changes_nothing() {
        let h = Harness::new(StubRemote::default());
        let local = photos(&["p1", "p2"], 500);
        h.put_local(&local);

        let patch = fields(json!({"title": "x"}));
        assert!(h.store.update_photo("missing-id", &patch).await.is_none());
        assert!(h.store.update_member("missing-id", &patch).await.is_none());
        assert!(h.store.delete_member("missing-id").await.is_none());
        assert_eq!(h.stored(CollectionName::Members), None);
        assert_eq!(h.stored(CollectionName::Photos), Some(local));
    }

    #[tokio::test]
    async fn test_scenario_d_delete_missing_photo() {
        let h = Harness::new(StubRemote::serving(photos(&["p1", "p2", "p3"], 100)));

        assert!(h.store.delete_photo("missing-id").await.is_none());
        let stored = h.stored(CollectionName::Photos).unwrap();
        assert_eq!(stored.len(), 3);
        assert_eq!(stored.last_updated, 100);
    }

    #[tokio::test]
    async fn test_delete_returns_removed_record_and_keeps_order() {
        let h = Harness::new(StubRemote::serving(members(&["m1", "m2", "m3"], 100)));

        let removed = h.store.delete_member("m2").await.unwrap().into_inner();
        assert_eq!(removed.id(), Some("m2"));

        let ids: Vec<_> = h
            .stored(CollectionName::Members)
            .unwrap()
            .items
            .iter()
            .map(|r| r.id().unwrap().to_string())
            .collect();
        assert_eq!(ids, vec!["m1", "m3"]);
    }

    #[tokio::test]
    async fn test_last_updated_never_goes_backwards() {
        let h = Harness::new(StubRemote::default());
        // A snapshot stamped ahead of this machine's clock
        h.put_local(&photos(&["p1"], T0 + 10 * MINUTE));

        h.store.delete_photo("p1").await.unwrap();
        assert_eq!(h.stored(CollectionName::Photos).unwrap().last_updated, T0 + 10 * MINUTE + 1);
    }

    #[tokio::test]
    async fn test_out_of_range_local_stamp_is_ignored() {
        let h = Harness::new(StubRemote::default());
        h.local
            .set("photos", r#"{"photos":[{"id":"p1"}],"lastUpdated":1e300}"#)
            .unwrap();

        let result = h.store.read(CollectionName::Photos).await;
        assert!(result.is_empty());
        assert_eq!(result.last_updated, T0);

        // Nothing to delete in the defaults; the write path must not overflow
        assert!(h.store.delete_photo("p1").await.is_none());
        let added = h.store.add_photo(Map::new()).await;
        assert!(added.is_saved());
        assert_eq!(h.stored(CollectionName::Photos).unwrap().last_updated, T0 + 1);
    }

    #[test]
    fn test_commit_stamp_saturates() {
        let h = Harness::new(StubRemote::default());
        let written = h.store.commit(photos(&["p1"], i64::MAX), T0, ());
        assert!(written.is_saved());
        assert_eq!(h.stored(CollectionName::Photos).unwrap().last_updated, i64::MAX);
    }

    #[tokio::test]
    async fn test_delete_under_max_stamp_does_not_overflow() {
        let h = Harness::new(StubRemote::default());
        h.local
            .set("photos", r#"{"photos":[{"id":"p1"}],"lastUpdated":9223372036854775807}"#)
            .unwrap();

        let removed = h.store.delete_photo("p1").await.unwrap();
        assert!(removed.is_saved());
        let stored = h.stored(CollectionName::Photos).unwrap();
        assert!(stored.is_empty());
        assert_eq!(stored.last_updated, i64::MAX);
    }

    #[tokio::test]
    async fn test_failed_adoption_still_returns_and_caches_remote() {
        let remote = photos(&["p1", "p2"], 100);
        let h = Harness::with_local(StubRemote::serving(remote.clone()), MemoryStore::with_quota(16));

        let result = h.store.read(CollectionName::Photos).await;

        assert_eq!(result, remote);
        assert_eq!(h.cached(CollectionName::Photos), Some(remote));
        assert_eq!(h.stored(CollectionName::Photos), None);
        assert!(h.local.is_empty());
    }

    #[tokio::test]
    async fn test_storage_failure_reported_but_value_returned() {
        let h = Harness::with_local(StubRemote::default(), MemoryStore::with_quota(64));

        let written = h
            .store
            .add_photo(fields(json!({"caption": "x".repeat(100)})))
            .await;

        assert!(matches!(written.saved, Err(StorageError::QuotaExceeded { .. })));
        assert_eq!(written.value.get("caption"), Some(&json!("x".repeat(100))));
        assert_eq!(h.stored(CollectionName::Photos), None);
        assert_eq!(h.cache_len(), 0);
    }

    // ===== stats =====

    #[tokio::test]
    async fn test_get_stats() {
        let h = Harness::new(StubRemote::default());
        let mut ph = photos(&["p1"], 100);
        ph.items[0].set("updatedAt", json!(900));
        h.put_local(&ph);
        let mut mb = members(&["m1", "m2"], 100);
        mb.items[0].set("joinDate", json!(950));
        h.put_local(&mb);

        let stats = h.store.get_stats().await;
        assert_eq!(
            stats,
            Stats {
                photo_count: 1,
                member_count: 2,
                last_updated: 950
            }
        );
    }

    // ===== diagnostics =====

    #[tokio::test]
    async fn test_clear_all_and_force_reload() {
        let h = Harness::new(StubRemote::serving(members(&["m1"], 100)));
        h.put_local(&members(&["local"], 500));
        h.put_local(&photos(&["p1"], 500));
        h.store.read(CollectionName::Members).await;

        h.store.clear_all().unwrap();
        assert_eq!(h.cache_len(), 0);
        assert!(h.local.is_empty());

        let reloaded = h.store.force_reload(CollectionName::Members).await;
        assert!(reloaded.contains_id("m1"));
    }

    #[tokio::test]
    async fn test_restore_from_remote_discards_newer_local() {
        let h = Harness::new(StubRemote::serving(members(&["m1"], 100)));
        h.put_local(&members(&["edited"], 900));
        h.store.read(CollectionName::Members).await;

        let restored = h.store.restore_from_remote(CollectionName::Members).await.unwrap();
        assert_eq!(restored.last_updated, 100);
        assert_eq!(h.stored(CollectionName::Members).unwrap().last_updated, 100);
        assert_eq!(h.cache_len(), 0);
    }

    #[tokio::test]
    async fn test_restore_from_remote_surfaces_fetch_error() {
        let h = Harness::new(StubRemote::default());
        h.put_local(&photos(&["p1"], 900));

        let err = h.store.restore_from_remote(CollectionName::Photos).await.unwrap_err();
        assert!(matches!(err, SyncError::Remote(RemoteError::NotFound(_))));
        assert_eq!(h.stored(CollectionName::Photos).unwrap().last_updated, 900);
    }

    #[tokio::test]
    async fn test_cache_status() {
        let h = Harness::new(StubRemote::serving(photos(&["p1", "p2"], 100)));
        h.store.read(CollectionName::Photos).await;
        h.clock.advance(6 * MINUTE);

        let status = h.store.cache_status();
        let photos_status = status.iter().find(|s| s.name == CollectionName::Photos).unwrap();
        assert!(photos_status.cached);
        assert!(!photos_status.cache_fresh);
        assert_eq!(photos_status.cache_age.as_deref(), Some("6m ago"));
        assert_eq!(photos_status.cached_items, Some(2));
        assert_eq!(photos_status.local_last_updated, Some(100));

        let members_status = status.iter().find(|s| s.name == CollectionName::Members).unwrap();
        assert!(!members_status.cached);
        assert_eq!(members_status.local_last_updated, None);
    }

    #[tokio::test]
    async fn test_export_is_wire_form() {
        let h = Harness::new(StubRemote::serving(photos(&["p1"], 100)));
        let text = h.store.export(CollectionName::Photos).await.unwrap();
        let value: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["photos"][0]["id"], "p1");
        assert_eq!(value["lastUpdated"], 100);
    }

    #[test]
    fn test_generate_id_format() {
        let existing = photos(&[], 1);
        let id = generate_id(CollectionName::Photos, 123, &existing);
        let suffix = id.strip_prefix("photo-123-").unwrap();
        assert_eq!(suffix.len(), ID_SUFFIX_LEN);
        assert!(suffix.bytes().all(|b| BASE36.contains(&b)));
    }
}
