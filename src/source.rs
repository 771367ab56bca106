//! Where the dataset text comes from
//!
//! The published sheet is fetched over HTTP once per controller lifetime.
//! No retries, no caching; any failure comes back as a `LoadError` value.

use std::future::Future;
use std::path::PathBuf;

use tracing::{debug, info, warn};

use crate::error::LoadError;

/// Published CSV export of the service-area sheet
pub const DEFAULT_DATASET_URL: &str = "https://docs.google.com/spreadsheets/d/e/2PACX-1vRXoaqswBMLcSrhngyOK4xxHG_5131cdiarnJrTcfJ7YZiCFnzaGDj0z5qvTuQ5P4lB3rB_1u1EnX1h/pub?gid=2052220952&single=true&output=csv";

pub trait DatasetSource: Send + Sync + 'static {
    /// Raw CSV text of the whole dataset
    fn fetch(&self) -> impl Future<Output = Result<String, LoadError>> + Send;

    /// Human-readable origin, for logs
    fn describe(&self) -> String;
}

// ============================================================================
// HTTP
// ============================================================================

pub struct HttpSource {
    url: String,
    client: reqwest::Client,
}

impl HttpSource {
    pub fn new(url: &str) -> Self {
        let client = reqwest::Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_else(|e| {
                warn!("Falling back to default HTTP client: {}", e);
                reqwest::Client::new()
            });
        Self::with_client(url, client)
    }

    pub fn with_client(url: &str, client: reqwest::Client) -> Self {
        Self {
            url: url.to_string(),
            client,
        }
    }
}

impl DatasetSource for HttpSource {
    async fn fetch(&self) -> Result<String, LoadError> {
        info!("Fetching service area dataset from {}", self.url);
        let response = self.client.get(&self.url).send().await?;

        let status = response.status();
        if !status.is_success() {
            warn!("Dataset request failed: {}", status);
            return Err(LoadError::Status {
                status: status.as_u16(),
            });
        }

        let text = response
            .text()
            .await
            .map_err(|e| LoadError::Body(e.to_string()))?;
        debug!("Dataset response: {} bytes", text.len());
        Ok(text)
    }

    fn describe(&self) -> String {
        self.url.clone()
    }
}

// ============================================================================
// Local file
// ============================================================================

/// CSV export saved on disk, read fresh on every fetch
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl DatasetSource for FileSource {
    async fn fetch(&self) -> Result<String, LoadError> {
        info!("Reading service area dataset from {:?}", self.path);
        Ok(tokio::fs::read_to_string(&self.path).await?)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

// ============================================================================
// In-memory
// ============================================================================

/// Canned response, for demos and tests
#[derive(Debug, Clone)]
pub enum StaticSource {
    Csv(String),
    HttpStatus(u16),
}

impl StaticSource {
    pub fn csv(text: &str) -> Self {
        StaticSource::Csv(text.to_string())
    }
}

impl DatasetSource for StaticSource {
    async fn fetch(&self) -> Result<String, LoadError> {
        match self {
            StaticSource::Csv(text) => Ok(text.clone()),
            StaticSource::HttpStatus(status) => Err(LoadError::Status { status: *status }),
        }
    }

    fn describe(&self) -> String {
        match self {
            StaticSource::Csv(text) => format!("static ({} bytes)", text.len()),
            StaticSource::HttpStatus(status) => format!("static (HTTP {})", status),
        }
    }
}
