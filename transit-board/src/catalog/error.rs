//! Static catalog error types.

use std::path::PathBuf;

/// Errors that can occur while loading the static reference data.
///
/// All of these are fatal at startup: they mean the reference tables are
/// missing, unreadable, or inconsistent with themselves.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// A table could not be opened or parsed
    #[error("failed to read {}: {source}", path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// A platform row names a parent station that is not in the stops table
    #[error("stop {stop} references unknown parent station {parent}")]
    UnknownParent { stop: String, parent: String },

    /// The same id appears twice in one table
    #[error("duplicate {kind} id: {id}")]
    DuplicateId { kind: &'static str, id: String },
}
