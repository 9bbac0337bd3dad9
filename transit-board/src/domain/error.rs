//! Lookup errors.
//!
//! Raised when a caller names a station, stop or route the catalog does not
//! know. These are the only errors a query can surface; feed problems never
//! reach the caller.

/// A reference that does not resolve against the static catalog.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LookupError {
    /// No station has this display name
    #[error("unknown station name: {0}")]
    UnknownStationName(String),

    /// No station has this id
    #[error("unknown station id: {0}")]
    UnknownStation(String),

    /// No platform has this id
    #[error("unknown stop id: {0}")]
    UnknownStop(String),
}
