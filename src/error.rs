use thiserror::Error;

/// Failure to bring the service-area dataset into memory.
///
/// Every variant is recoverable: the controller turns it into the fixed
/// advisory message and keeps rendering reference points.
#[derive(Error, Debug)]
pub enum LoadError {
    /// Request never produced a response (DNS, connect, TLS, reset...)
    #[error("network error fetching dataset: {0}")]
    Network(#[from] reqwest::Error),

    /// Endpoint answered with a non-success status
    #[error("dataset endpoint returned HTTP {status}")]
    Status { status: u16 },

    /// Response arrived but its body could not be read as text
    #[error("dataset body unreadable: {0}")]
    Body(String),

    /// Local file source could not be read
    #[error("I/O error reading dataset: {0}")]
    Io(#[from] std::io::Error),
}

impl LoadError {
    /// Short machine-friendly tag, used in logs and the API.
    pub fn kind(&self) -> &'static str {
        match self {
            LoadError::Network(_) => "network",
            LoadError::Status { .. } => "status",
            LoadError::Body(_) => "body",
            LoadError::Io(_) => "io",
        }
    }
}

/// The store task has stopped; no further events can be applied.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("map store is no longer running")]
pub struct StoreClosed;
