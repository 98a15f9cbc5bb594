use thiserror::Error;

/// Errors returned by the [`PriceFeedClient`](crate::PriceFeedClient).
///
/// Any of these aborts a sync before the price store is touched.
#[derive(Debug, Error)]
pub enum FeedError {
    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("price feed returned HTTP {status}: {body}")]
    UnexpectedStatus { status: u16, body: String },

    /// The body parsed as JSON but not in the expected layout.
    #[error("unexpected price feed response: {0}")]
    UnexpectedShape(String),

    #[error("invalid price feed URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },
}
