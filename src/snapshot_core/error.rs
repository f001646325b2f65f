//! Store error type

use thiserror::Error;

/// Failure of the snapshot store itself
///
/// Always fatal to the current operation. Missing history is NOT an error:
/// analyses return an empty result instead.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Schema migration {name} failed: {source}")]
    Migration {
        name: &'static str,
        #[source]
        source: rusqlite::Error,
    },
}
