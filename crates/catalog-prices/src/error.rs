use thiserror::Error;

/// Errors returned by the [`PriceStore`](crate::PriceStore).
#[derive(Debug, Error)]
pub enum PriceStoreError {
    /// The price file could not be read or written.
    #[error("price file I/O error at {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The price file exists but is not a valid price document.
    #[error("price file {path} is corrupt: {source}")]
    Corrupt {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    /// The embedded price database failed to open, read or commit.
    #[error("price database error at {path}: {source}")]
    Database {
        path: String,
        #[source]
        source: Box<redb::Error>,
    },

    #[error("failed to encode price file: {0}")]
    Encode(#[source] serde_json::Error),

    /// A write was rejected before touching the file.
    #[error("invalid price for '{sku}': {reason}")]
    Invalid { sku: String, reason: String },
}
