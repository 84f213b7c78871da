use larder::codec::{self, FLAG_COMPRESSED};
use larder::{Cache, CacheConfig};
use proptest::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
struct Record {
    id: u64,
    name: String,
    tags: Vec<String>,
    score: Option<i32>,
}

proptest! {
    #[test]
    fn prop_string_round_trip(s in ".*") {
        let envelope = codec::encode_value(Some(&s), 256 * 1024).unwrap();
        let back: Option<String> = codec::decode_value(&envelope).unwrap();
        prop_assert_eq!(back, Some(s));
    }

    #[test]
    fn prop_bytes_round_trip_at_any_threshold(
        bytes in proptest::collection::vec(any::<u8>(), 0..2048),
        threshold in 1usize..4096,
    ) {
        let envelope = codec::encode_value(Some(&bytes), threshold).unwrap();
        let back: Option<Vec<u8>> = codec::decode_value(&envelope).unwrap();
        prop_assert_eq!(back, Some(bytes));
    }

    #[test]
    fn prop_structured_round_trip(
        id in any::<u64>(),
        name in ".*",
        tags in proptest::collection::vec("[a-z]{0,8}", 0..5),
        score in proptest::option::of(any::<i32>()),
    ) {
        let record = Record { id, name, tags, score };
        let envelope = codec::encode_value(Some(&record), 64).unwrap();
        let back: Option<Record> = codec::decode_value(&envelope).unwrap();
        prop_assert_eq!(back, Some(record));
    }

    #[test]
    fn prop_repetitive_payloads_compress(byte in any::<u8>(), len in 512usize..4096) {
        let bytes = vec![byte; len];
        let envelope = codec::encode_value(Some(&bytes), 64).unwrap();
        prop_assert_eq!(envelope[0], FLAG_COMPRESSED);
        prop_assert!(envelope.len() < bytes.len());
        let back: Option<Vec<u8>> = codec::decode_value(&envelope).unwrap();
        prop_assert_eq!(back, Some(bytes));
    }

    #[test]
    fn prop_decode_never_panics_on_junk(bytes in proptest::collection::vec(any::<u8>(), 0..512)) {
        // Any outcome is fine as long as it is a Result, not a panic.
        let _ = codec::decode_value::<String>(&bytes);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn prop_cache_round_trip_survives_reopen(
        key in "[a-zA-Z0-9_-]{1,24}",
        value in ".*",
    ) {
        let dir = tempfile::tempdir().unwrap();
        let config = CacheConfig {
            root_dir: Some(dir.path().to_path_buf()),
            ..CacheConfig::new("prop")
        };
        {
            let cache: Cache<String> = Cache::open(config.clone()).unwrap();
            cache.insert(&key, value.clone());
            prop_assert_eq!(cache.get(&key), Some(value.clone()));
        }
        let cache: Cache<String> = Cache::open(config).unwrap();
        prop_assert_eq!(cache.get(&key), Some(value));
    }
}
