//! Feed fetcher error types.

/// Errors that abort a refresh cycle.
///
/// Undecodable payloads and timed-out requests are not errors: the fetcher
/// skips that one feed and carries on with the rest.
#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    /// HTTP request failed (connection refused, TLS, etc.)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API key was rejected
    #[error("unauthorized fetching {url}: check TRANSIT_API_KEY")]
    Unauthorized { url: String },

    /// Rate limited by the feed provider
    #[error("rate limited fetching {url}")]
    RateLimited { url: String },

    /// Feed returned a non-success status code
    #[error("feed {url} returned {status}: {message}")]
    Api {
        url: String,
        status: u16,
        message: String,
    },

    /// API key contains characters not allowed in a header
    #[error("invalid API key format")]
    InvalidApiKey,

    /// Local feed files could not be read
    #[error("failed to read feed file {path}: {message}")]
    File { path: String, message: String },

    /// The fetcher was shut down while a request was waiting
    #[error("feed fetcher closed")]
    Closed,
}
