use thiserror::Error;

/// Failures while turning a value into its stored byte envelope or back.
///
/// Read paths treat every variant as a cache miss; nothing here ever
/// propagates as a panic.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("Encode error: {0}")]
    Encode(#[from] bincode::error::EncodeError),

    #[error("Decode error: {0}")]
    Decode(#[from] bincode::error::DecodeError),

    #[error("Compression error: {0}")]
    Compress(std::io::Error),

    #[error("Decompression error: {0}")]
    Decompress(std::io::Error),

    #[error("Payload checksum mismatch")]
    ChecksumMismatch,

    #[error("Envelope truncated or malformed")]
    Malformed,

    #[error("Unknown envelope flag: {0:#04x}")]
    UnknownFlag(u8),
}

/// Failures in the durable SQLite layer.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Store file belongs to namespace {found:?}, not {requested:?}")]
    NamespaceMismatch { found: String, requested: String },
}

/// Top-level error type returned by the cache facade.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error("Invalid namespace: {0}")]
    InvalidNamespace(String),

    #[error("Cache handle is still shared; destroy requires exclusive ownership")]
    Busy,
}
