//! Caller-supplied keys and their stable storage form.

/// A cache key: any value that can be deterministically rendered as a stable
/// storage key.
///
/// The storage key is what the in-memory index and the SQLite rows are keyed
/// by, so the conversion must be injective within one namespace: two keys that
/// render to the same string are the same entry. Implementations must return
/// the same string across process restarts (no per-process hashing).
pub trait CacheKey {
    fn storage_key(&self) -> String;
}

impl CacheKey for str {
    fn storage_key(&self) -> String {
        self.to_owned()
    }
}

impl CacheKey for String {
    fn storage_key(&self) -> String {
        self.clone()
    }
}

impl CacheKey for u64 {
    fn storage_key(&self) -> String {
        self.to_string()
    }
}

impl CacheKey for i64 {
    fn storage_key(&self) -> String {
        self.to_string()
    }
}

impl CacheKey for u32 {
    fn storage_key(&self) -> String {
        self.to_string()
    }
}

impl<K: CacheKey + ?Sized> CacheKey for &K {
    fn storage_key(&self) -> String {
        (**self).storage_key()
    }
}
