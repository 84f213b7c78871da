//! Process-local LRU cache with a durable SQLite mirror.
//!
//! Values live in an in-memory recency index for hot reads and are written
//! through to an embedded store, so a namespace filled in one run is warm in
//! the next. Values are serialized with `serde`/`bincode`, large payloads are
//! lz4-compressed, and explicit absence can be cached as a tombstone.
//!
//! ```
//! use larder::{Cache, CacheConfig};
//!
//! let dir = tempfile::tempdir()?;
//! let config = CacheConfig { root_dir: Some(dir.path().into()), ..CacheConfig::new("demo") };
//! let cache: Cache<String> = Cache::open(config)?;
//!
//! cache.insert("greeting", "hello".to_string());
//! assert_eq!(cache.get("greeting"), Some("hello".to_string()));
//!
//! // Cache that a lookup came back empty, distinct from never asked.
//! cache.insert("absent", None);
//! assert_eq!(cache.get("absent"), None);
//! assert!(cache.contains_key("absent"));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod cache;
pub mod codec;
pub mod config;
pub mod errors;
pub mod key;
pub mod logger;
pub mod metrics;
pub mod store;

mod fsutil;
mod index;

pub use crate::cache::Cache;
pub use crate::config::CacheConfig;
pub use crate::errors::{CacheError, CodecError, StoreError};
pub use crate::key::CacheKey;
pub use crate::metrics::CacheMetricsSnapshot;
