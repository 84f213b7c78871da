use larder::{Cache, CacheConfig, CacheError};
use serde::{Deserialize, Serialize};
use std::num::{NonZeroU64, NonZeroUsize};
use tempfile::TempDir;

fn config_in(dir: &TempDir, namespace: &str) -> CacheConfig {
    CacheConfig { root_dir: Some(dir.path().to_path_buf()), ..CacheConfig::new(namespace) }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
struct Thumbnail {
    id: u64,
    label: String,
    pixels: Vec<u8>,
}

#[test]
fn insert_and_get_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let cache: Cache<String> = Cache::open(config_in(&dir, "roundtrip")).unwrap();

    cache.insert("greeting", "hello".to_string());
    assert_eq!(cache.get("greeting"), Some("hello".to_string()));
    assert_eq!(cache.get("other"), None);
}

#[test]
fn structured_values_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let cache: Cache<Thumbnail> = Cache::open(config_in(&dir, "structs")).unwrap();

    let thumb = Thumbnail { id: 7, label: "cover".into(), pixels: vec![1, 2, 3, 4] };
    cache.insert("cover", thumb.clone());
    assert_eq!(cache.get("cover"), Some(thumb));
}

#[test]
fn integer_keys_work() {
    let dir = tempfile::tempdir().unwrap();
    let cache: Cache<String> = Cache::open(config_in(&dir, "intkeys")).unwrap();

    cache.insert(&42u64, "answer".to_string());
    assert_eq!(cache.get(&42u64), Some("answer".to_string()));
    assert!(!cache.contains_key(&43u64));
}

#[test]
fn overwrite_replaces_value() {
    let dir = tempfile::tempdir().unwrap();
    let cache: Cache<String> = Cache::open(config_in(&dir, "overwrite")).unwrap();

    cache.insert("k", "first".to_string());
    cache.insert("k", "second".to_string());
    assert_eq!(cache.get("k"), Some("second".to_string()));
    assert_eq!(cache.metrics_snapshot().resident_entries, 1);
}

#[test]
fn tombstone_reads_as_none_but_counts_as_present() {
    let dir = tempfile::tempdir().unwrap();
    let cache: Cache<String> = Cache::open(config_in(&dir, "tombstone")).unwrap();

    cache.insert("gone", None);
    assert_eq!(cache.get("gone"), None);
    assert!(cache.contains_key("gone"), "cached absence should register as present");
    assert!(!cache.contains_key("never-set"));

    assert!(cache.remove("gone"));
    assert!(!cache.contains_key("gone"));
}

#[test]
fn tombstone_can_be_overwritten_with_value() {
    let dir = tempfile::tempdir().unwrap();
    let cache: Cache<String> = Cache::open(config_in(&dir, "revive")).unwrap();

    cache.insert("k", None);
    cache.insert("k", "back".to_string());
    assert_eq!(cache.get("k"), Some("back".to_string()));
}

#[test]
fn count_budget_evicts_least_recently_used() {
    let dir = tempfile::tempdir().unwrap();
    let config = CacheConfig {
        count_limit: NonZeroUsize::new(2),
        ..config_in(&dir, "count_lru")
    };
    let cache: Cache<String> = Cache::open(config).unwrap();

    cache.insert("k1", "v1".to_string());
    cache.insert("k2", "v2".to_string());
    cache.insert("k3", "v3".to_string());

    // Eviction cascades to the store, so k1 is gone entirely.
    assert_eq!(cache.get("k1"), None);
    assert!(!cache.contains_key("k1"));
    assert_eq!(cache.get("k2"), Some("v2".to_string()));
    assert_eq!(cache.get("k3"), Some("v3".to_string()));
    assert_eq!(cache.metrics_snapshot().evictions, 1);
}

#[test]
fn get_refreshes_recency_for_eviction() {
    let dir = tempfile::tempdir().unwrap();
    let config = CacheConfig {
        count_limit: NonZeroUsize::new(2),
        ..config_in(&dir, "refresh")
    };
    let cache: Cache<String> = Cache::open(config).unwrap();

    cache.insert("k1", "v1".to_string());
    cache.insert("k2", "v2".to_string());
    assert_eq!(cache.get("k1"), Some("v1".to_string()));
    cache.insert("k3", "v3".to_string());

    assert!(cache.contains_key("k1"), "freshly read key should survive");
    assert!(!cache.contains_key("k2"));
}

#[test]
fn contains_key_leaves_recency_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let config = CacheConfig {
        count_limit: NonZeroUsize::new(2),
        ..config_in(&dir, "neutral")
    };
    let cache: Cache<String> = Cache::open(config).unwrap();

    cache.insert("k1", "v1".to_string());
    cache.insert("k2", "v2".to_string());
    assert!(cache.contains_key("k1"));
    cache.insert("k3", "v3".to_string());

    assert!(!cache.contains_key("k1"), "presence check must not refresh recency");
    assert!(cache.contains_key("k2"));
}

#[test]
fn byte_budget_evicts_until_it_fits() {
    let dir = tempfile::tempdir().unwrap();
    let config = CacheConfig {
        count_limit: None,
        total_bytes_limit: NonZeroU64::new(150),
        ..config_in(&dir, "bytes")
    };
    let cache: Cache<Vec<u8>> = Cache::open(config).unwrap();

    // Each envelope is ~70 bytes, so two fit and the third forces an eviction.
    cache.insert("k1", vec![1u8; 64]);
    cache.insert("k2", vec![2u8; 64]);
    cache.insert("k3", vec![3u8; 64]);

    assert!(!cache.contains_key("k1"));
    assert_eq!(cache.get("k2"), Some(vec![2u8; 64]));
    assert_eq!(cache.get("k3"), Some(vec![3u8; 64]));
    let snapshot = cache.metrics_snapshot();
    assert_eq!(snapshot.resident_entries, 2);
    assert!(snapshot.resident_bytes <= 150);
}

#[test]
fn single_oversized_entry_is_cached_then_evicted_next() {
    let dir = tempfile::tempdir().unwrap();
    let config = CacheConfig {
        count_limit: None,
        total_bytes_limit: NonZeroU64::new(64),
        ..config_in(&dir, "oversized")
    };
    let cache: Cache<Vec<u8>> = Cache::open(config).unwrap();

    // Alone over the whole budget, but the last entry is never evicted.
    cache.insert("big", vec![9u8; 256]);
    assert_eq!(cache.get("big"), Some(vec![9u8; 256]));
    assert_eq!(cache.metrics_snapshot().resident_entries, 1);

    cache.insert("small", vec![1u8; 8]);
    assert!(!cache.contains_key("big"), "oversized entry goes first on the next insert");
    assert_eq!(cache.get("small"), Some(vec![1u8; 8]));
}

#[test]
fn remove_reports_presence_and_is_isolated() {
    let dir = tempfile::tempdir().unwrap();
    let cache: Cache<String> = Cache::open(config_in(&dir, "remove")).unwrap();

    cache.insert("keep", "a".to_string());
    cache.insert("drop", "b".to_string());

    assert!(cache.remove("drop"));
    assert!(!cache.remove("drop"), "second remove finds nothing");
    assert!(!cache.remove("never-set"));
    assert_eq!(cache.get("keep"), Some("a".to_string()));
}

#[test]
fn clear_empties_index_and_store() {
    let dir = tempfile::tempdir().unwrap();
    let cache: Cache<String> = Cache::open(config_in(&dir, "clear")).unwrap();

    cache.insert("k1", "v1".to_string());
    cache.insert("k2", "v2".to_string());
    cache.clear().unwrap();

    assert_eq!(cache.get("k1"), None);
    assert!(!cache.contains_key("k2"));
    let snapshot = cache.metrics_snapshot();
    assert_eq!(snapshot.resident_entries, 0);
    assert_eq!(snapshot.resident_bytes, 0);
}

#[test]
fn metrics_track_basic_operations() {
    let dir = tempfile::tempdir().unwrap();
    let cache: Cache<String> = Cache::open(config_in(&dir, "metrics")).unwrap();

    assert_eq!(cache.get("missing"), None);
    cache.insert("k", "v".to_string());
    assert_eq!(cache.get("k"), Some("v".to_string()));
    cache.remove("k");

    let snapshot = cache.metrics_snapshot();
    assert_eq!(snapshot.misses, 1);
    assert_eq!(snapshot.inserts, 1);
    assert_eq!(snapshot.hits, 1);
    assert_eq!(snapshot.removes, 1);
    assert_eq!(snapshot.resident_entries, 0);
}

#[test]
fn cloned_handles_share_state() {
    let dir = tempfile::tempdir().unwrap();
    let cache: Cache<String> = Cache::open(config_in(&dir, "clones")).unwrap();
    let other = cache.clone();

    cache.insert("shared", "yes".to_string());
    assert_eq!(other.get("shared"), Some("yes".to_string()));
    assert_eq!(other.metrics_snapshot().inserts, 1);
    assert_eq!(cache.namespace(), other.namespace());
}

#[test]
fn destroy_requires_exclusive_handle_and_deletes_files() {
    let dir = tempfile::tempdir().unwrap();
    let cache: Cache<String> = Cache::open(config_in(&dir, "doomed")).unwrap();
    cache.insert("k", "v".to_string());
    let path = cache.store_path().to_path_buf();
    assert!(path.exists());

    let survivor = cache.clone();
    assert!(matches!(cache.destroy(), Err(CacheError::Busy)));

    survivor.destroy().unwrap();
    assert!(!path.exists());

    // A fresh open starts from nothing.
    let reopened: Cache<String> = Cache::open(config_in(&dir, "doomed")).unwrap();
    assert_eq!(reopened.get("k"), None);
}
