use thiserror::Error;

/// Errors surfaced by supplier adapters.
///
/// `search` never returns these (it degrades to an empty result set);
/// detail fetch and order placement propagate them so callers can tell a
/// missing product from a quota problem from a transient outage.
#[derive(Debug, Error)]
pub enum SupplierError {
    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The response body could not be deserialized into the expected shape.
    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    /// The supplier reports that the identifier does not exist. Not
    /// retryable.
    #[error("{supplier}: product {external_id} not found")]
    NotFound {
        supplier: &'static str,
        external_id: String,
    },

    /// The supplier rejected the request (or its authentication) due to
    /// quota. Callers must apply a cooldown instead of retrying.
    #[error("{supplier}: rate limited (retry after {retry_after_secs}s)")]
    RateLimited {
        supplier: &'static str,
        retry_after_secs: u64,
    },

    /// Any other non-2xx status.
    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    /// The adapter was constructed without its credential. The adapter
    /// stays alive and disconnected rather than failing process startup.
    #[error("{supplier}: missing credential {var}")]
    MissingCredential {
        supplier: &'static str,
        var: &'static str,
    },

    /// An adapter was handed an unusable base URL at construction.
    #[error("invalid base URL \"{url}\": {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    /// The registry was configured with a default supplier name that
    /// matches none of its entries.
    #[error("default supplier {name:?} is not registered")]
    UnknownDefaultSupplier { name: String },

    /// The supplier returned an application-level error envelope.
    #[error("{supplier}: API error: {message}")]
    Api {
        supplier: &'static str,
        message: String,
    },
}
