//! The public cache facade: one in-memory [`LruIndex`] write-through-mirrored
//! in one [`SqliteStore`], coordinated behind a single mutex.

use crate::codec;
use crate::config::CacheConfig;
use crate::errors::{CacheError, StoreError};
use crate::fsutil;
use crate::index::{IndexEntry, LruIndex};
use crate::key::CacheKey;
use crate::logger;
use crate::metrics::{CacheMetrics, CacheMetricsSnapshot};
use crate::store::SqliteStore;
use parking_lot::Mutex;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// A persistently-backed LRU cache over values of type `V`.
///
/// Handles are cheap to clone and share one index, one store connection and
/// one metrics block. Reads hit the in-memory index first and fall through to
/// the store; writes go through to the store before returning. Dropping every
/// handle closes the store file; the entries stay on disk for the next open.
pub struct Cache<V> {
    shared: Arc<Shared<V>>,
}

impl<V> Clone for Cache<V> {
    fn clone(&self) -> Self {
        Self { shared: Arc::clone(&self.shared) }
    }
}

struct Shared<V> {
    namespace: String,
    store_path: PathBuf,
    compression_threshold: usize,
    metrics: CacheMetrics,
    state: Mutex<Inner<V>>,
}

struct Inner<V> {
    index: LruIndex<V>,
    store: SqliteStore,
    next_recency: u64,
}

impl<V> Inner<V> {
    fn next_token(&mut self) -> u64 {
        let token = self.next_recency;
        self.next_recency += 1;
        token
    }

    /// Cascade index evictions to the store so evicted keys leave no row
    /// behind.
    fn cascade_evictions(&mut self, metrics: &CacheMetrics, evicted: Vec<String>) {
        for key in evicted {
            CacheMetrics::incr(&metrics.evictions);
            if let Err(err) = self.store.delete(&key) {
                CacheMetrics::incr(&metrics.store_errors);
                log::error!("failed to delete evicted entry '{key}': {err}");
            }
        }
    }
}

impl<V> Cache<V>
where
    V: Serialize + DeserializeOwned + Clone,
{
    /// Opens (or creates) the cache for `config.namespace`, wiping persisted
    /// entries on a version mismatch and rehydrating the in-memory index from
    /// the surviving rows, newest first, up to the configured budgets.
    ///
    /// # Errors
    /// Fails when the namespace is empty, the store file cannot be opened or
    /// its schema applied, or the file belongs to a different namespace.
    pub fn open(config: CacheConfig) -> Result<Self, CacheError> {
        if config.namespace.is_empty() {
            return Err(CacheError::InvalidNamespace(config.namespace));
        }

        let store_path = fsutil::store_path(config.root_dir.as_deref(), &config.namespace);
        if config.log_to_disk {
            if let Some(dir) = store_path.parent() {
                let _ = logger::init_in(dir, &config.namespace);
            }
        }

        let mut store = SqliteStore::open(&store_path)?;
        let wiped = store.ensure_version(&config.namespace, config.version)?;
        if wiped {
            log::info!(
                "namespace '{}' bumped to version {}, persisted entries wiped",
                config.namespace,
                config.version
            );
        }

        let metrics = CacheMetrics::default();
        let mut index = LruIndex::new(config.count_limit, config.total_bytes_limit);

        let rows = store.scan_by_recency()?;
        let max_recency = rows.first().map_or(0, |row| row.recency);

        // Admit the newest rows while both budgets hold; the newest row is
        // always admitted, mirroring put-time eviction which never drops the
        // last remaining entry. The rest of the scan is over budget and gets
        // pruned from the store right away.
        let mut kept = Vec::new();
        let mut kept_bytes: u64 = 0;
        let mut prune_from = None;
        for row in rows {
            let fits_count = config.count_limit.map_or(true, |limit| kept.len() < limit.get());
            let fits_bytes = config.total_bytes_limit.map_or(true, |limit| {
                kept_bytes.saturating_add(row.size) <= limit.get()
            });
            if kept.is_empty() || (fits_count && fits_bytes) {
                kept_bytes = kept_bytes.saturating_add(row.size);
                kept.push(row);
            } else {
                prune_from = Some(row.recency);
                break;
            }
        }
        if let Some(recency) = prune_from {
            let pruned = store.delete_up_to(recency)?;
            CacheMetrics::add(&metrics.pruned, pruned as u64);
            log::info!("namespace '{}': pruned {pruned} over-budget rows", config.namespace);
        }

        // Oldest kept row goes in first so the index recency order matches
        // the persisted order.
        for row in kept.into_iter().rev() {
            match codec::decode_value::<V>(&row.payload) {
                Ok(value) => {
                    let evicted = index.put(row.key, IndexEntry { value, size: row.size });
                    for key in evicted {
                        let _ = store.delete(&key);
                    }
                }
                Err(err) => {
                    CacheMetrics::incr(&metrics.decode_failures);
                    log::warn!("dropping undecodable entry '{}': {err}", row.key);
                    if let Err(err) = store.delete(&row.key) {
                        log::error!("failed to drop entry '{}': {err}", row.key);
                    }
                }
            }
        }
        CacheMetrics::add(&metrics.rehydrated, index.len() as u64);
        log::debug!(
            "namespace '{}' ready: {} entries, {} bytes resident",
            config.namespace,
            index.len(),
            index.resident_bytes()
        );

        Ok(Self {
            shared: Arc::new(Shared {
                namespace: config.namespace,
                store_path,
                compression_threshold: config.compression_threshold,
                metrics,
                state: Mutex::new(Inner {
                    index,
                    store,
                    next_recency: max_recency.saturating_add(1),
                }),
            }),
        })
    }

    /// Retrieves the value cached for `key`, refreshing its recency.
    ///
    /// Returns `None` on a miss and for tombstoned keys (use
    /// [`contains_key`](Self::contains_key) to tell the two apart). A row
    /// resident only in the store is decoded and promoted into the index;
    /// rows that fail to decode are dropped and read as misses.
    pub fn get<K>(&self, key: &K) -> Option<V>
    where
        K: CacheKey + ?Sized,
    {
        let storage_key = key.storage_key();
        let metrics = &self.shared.metrics;
        let mut inner = self.shared.state.lock();

        if let Some(entry) = inner.index.get(&storage_key) {
            CacheMetrics::incr(&metrics.hits);
            return entry.value.clone();
        }

        match inner.store.get(&storage_key) {
            Ok(Some(row)) => match codec::decode_value::<V>(&row.payload) {
                Ok(value) => {
                    CacheMetrics::incr(&metrics.hits);
                    let result = value.clone();
                    let token = inner.next_token();
                    let evicted =
                        inner.index.put(storage_key.clone(), IndexEntry { value, size: row.size });
                    inner.cascade_evictions(metrics, evicted);
                    if let Err(err) = inner.store.touch(&storage_key, token) {
                        CacheMetrics::incr(&metrics.store_errors);
                        log::warn!("failed to touch promoted entry '{storage_key}': {err}");
                    }
                    result
                }
                Err(err) => {
                    CacheMetrics::incr(&metrics.decode_failures);
                    CacheMetrics::incr(&metrics.misses);
                    log::warn!("dropping undecodable entry '{storage_key}': {err}");
                    if let Err(err) = inner.store.delete(&storage_key) {
                        CacheMetrics::incr(&metrics.store_errors);
                        log::error!("failed to drop entry '{storage_key}': {err}");
                    }
                    None
                }
            },
            Ok(None) => {
                CacheMetrics::incr(&metrics.misses);
                None
            }
            Err(err) => {
                CacheMetrics::incr(&metrics.store_errors);
                CacheMetrics::incr(&metrics.misses);
                log::error!("store lookup for '{storage_key}' failed: {err}");
                None
            }
        }
    }

    /// Caches `value` for `key`, overwriting any previous entry. Passing
    /// `None` stores a tombstone: the key reads as `None` but counts as
    /// present, recording explicit absence.
    ///
    /// The entry is durable once this returns. Entries evicted to make room
    /// are deleted from the store as well. A store write failure keeps the
    /// entry resident in memory and is reported through the log and the
    /// `store_errors` counter.
    pub fn insert<K>(&self, key: &K, value: impl Into<Option<V>>)
    where
        K: CacheKey + ?Sized,
    {
        let storage_key = key.storage_key();
        let value = value.into();
        let payload = match codec::encode_value(value.as_ref(), self.shared.compression_threshold)
        {
            Ok(payload) => payload,
            Err(err) => {
                log::error!("failed to encode value for '{storage_key}': {err}");
                return;
            }
        };
        let size = payload.len() as u64;
        let tombstone = value.is_none();
        let metrics = &self.shared.metrics;

        let mut inner = self.shared.state.lock();
        let token = inner.next_token();
        let evicted = inner.index.put(storage_key.clone(), IndexEntry { value, size });
        if let Err(err) = inner.store.put(&storage_key, &payload, size, token, tombstone) {
            CacheMetrics::incr(&metrics.store_errors);
            log::error!("failed to persist '{storage_key}': {err}");
        }
        inner.cascade_evictions(metrics, evicted);
        CacheMetrics::incr(&metrics.inserts);
    }

    /// Removes the entry for `key` from index and store. Returns whether an
    /// entry (value or tombstone) was present.
    pub fn remove<K>(&self, key: &K) -> bool
    where
        K: CacheKey + ?Sized,
    {
        let storage_key = key.storage_key();
        let metrics = &self.shared.metrics;
        let mut inner = self.shared.state.lock();

        let in_index = inner.index.remove(&storage_key).is_some();
        let in_store = match inner.store.delete(&storage_key) {
            Ok(deleted) => deleted,
            Err(err) => {
                CacheMetrics::incr(&metrics.store_errors);
                log::error!("failed to delete '{storage_key}': {err}");
                false
            }
        };
        let removed = in_index || in_store;
        if removed {
            CacheMetrics::incr(&metrics.removes);
        }
        removed
    }

    /// Drops every entry in the namespace, in memory and on disk.
    ///
    /// # Errors
    /// Unlike the per-key operations this surfaces store failures, since a
    /// half-cleared namespace would silently resurface on the next open.
    pub fn clear(&self) -> Result<(), StoreError> {
        let mut inner = self.shared.state.lock();
        inner.index.clear();
        inner.store.delete_all()
    }

    /// Whether a live entry (value or tombstone) exists for `key`, without
    /// refreshing recency.
    pub fn contains_key<K>(&self, key: &K) -> bool
    where
        K: CacheKey + ?Sized,
    {
        let storage_key = key.storage_key();
        let inner = self.shared.state.lock();
        if inner.index.contains(&storage_key) {
            return true;
        }
        match inner.store.exists(&storage_key) {
            Ok(found) => found,
            Err(err) => {
                CacheMetrics::incr(&self.shared.metrics.store_errors);
                log::error!("store presence check for '{storage_key}' failed: {err}");
                false
            }
        }
    }

    /// Point-in-time metrics, including residency gauges.
    #[must_use]
    pub fn metrics_snapshot(&self) -> CacheMetricsSnapshot {
        let inner = self.shared.state.lock();
        self.shared.metrics.snapshot(inner.index.len() as u64, inner.index.resident_bytes())
    }

    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.shared.namespace
    }

    /// Path of the backing store file.
    #[must_use]
    pub fn store_path(&self) -> &Path {
        &self.shared.store_path
    }

    /// Tears the cache down: closes the store and deletes its files. Meant
    /// for tests and explicit resets, not normal operation.
    ///
    /// # Errors
    /// Returns [`CacheError::Busy`] while other handles exist, and surfaces
    /// file removal failures.
    pub fn destroy(self) -> Result<(), CacheError> {
        let shared = Arc::try_unwrap(self.shared).map_err(|_| CacheError::Busy)?;
        let inner = shared.state.into_inner();
        let path = inner.store.into_path();
        fsutil::remove_store_files(&path).map_err(StoreError::Io)?;
        Ok(())
    }
}
