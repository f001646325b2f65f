use thiserror::Error;

/// Failure to obtain one fund's holdings
///
/// Isolated per fund: the run records it and moves on.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Source returned status {0}")]
    Status(u16),

    #[error("Malformed holdings payload: {0}")]
    Decode(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum CollectError {
    #[error("A collection run is already in progress")]
    AlreadyRunning,
}
