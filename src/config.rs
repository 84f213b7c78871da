//! Cache construction parameters.

use std::num::{NonZeroU64, NonZeroUsize};
use std::path::PathBuf;

/// Default cache format version recorded in the store's meta table.
pub const DEFAULT_VERSION: u32 = 1;
/// Default maximum number of resident entries.
pub const DEFAULT_COUNT_LIMIT: usize = 1024;
/// Default aggregate byte budget for stored envelopes (64 MiB).
pub const DEFAULT_TOTAL_BYTES_LIMIT: u64 = 64 * 1024 * 1024;
/// Serialized bodies at or above this size are lz4-compressed (256 KiB).
pub const DEFAULT_COMPRESSION_THRESHOLD: usize = 256 * 1024;

/// Configuration for one cache namespace.
///
/// Construct with [`CacheConfig::new`] and override fields with struct-update
/// syntax:
///
/// ```
/// use larder::CacheConfig;
///
/// let config = CacheConfig { version: 3, count_limit: None, ..CacheConfig::new("thumbnails") };
/// assert_eq!(config.namespace, "thumbnails");
/// assert!(config.count_limit.is_none());
/// ```
#[derive(Clone, Debug)]
pub struct CacheConfig {
    /// Logical partition name; determines the on-disk store file.
    pub namespace: String,
    /// Bumping this wipes any persisted entries recorded under another version.
    pub version: u32,
    /// Maximum resident entries; `None` disables count-based eviction.
    pub count_limit: Option<NonZeroUsize>,
    /// Maximum aggregate envelope bytes; `None` disables byte-based eviction.
    pub total_bytes_limit: Option<NonZeroU64>,
    /// Serialized bodies at or above this many bytes are compressed.
    pub compression_threshold: usize,
    /// Directory holding the store file. Defaults to the OS cache directory.
    pub root_dir: Option<PathBuf>,
    /// When set, [`Cache::open`](crate::Cache::open) routes `log` output to a
    /// rolling file next to the store (best effort, first namespace wins).
    pub log_to_disk: bool,
}

impl CacheConfig {
    #[must_use]
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            version: DEFAULT_VERSION,
            count_limit: NonZeroUsize::new(DEFAULT_COUNT_LIMIT),
            total_bytes_limit: NonZeroU64::new(DEFAULT_TOTAL_BYTES_LIMIT),
            compression_threshold: DEFAULT_COMPRESSION_THRESHOLD,
            root_dir: None,
            log_to_disk: false,
        }
    }
}
