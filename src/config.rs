//! Runtime configuration shared by the binaries
//!
//! The library never reads the environment itself; only these argument
//! structs do, through clap's `env` fallbacks.

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::error::LoadError;
use crate::source::{DatasetSource, FileSource, HttpSource, DEFAULT_DATASET_URL};

/// Where to load the service-area dataset from
#[derive(Args, Debug, Clone)]
pub struct DatasetArgs {
    /// Published CSV URL of the service-area sheet
    #[arg(long, env = "SERVICE_AREA_CSV_URL", default_value = DEFAULT_DATASET_URL)]
    pub csv_url: String,

    /// Read the dataset from a local CSV export; takes precedence over the URL
    #[arg(long)]
    pub csv_file: Option<PathBuf>,
}

/// Either source, chosen at startup
pub enum ConfiguredSource {
    Http(HttpSource),
    File(FileSource),
}

impl DatasetArgs {
    pub fn source(&self) -> ConfiguredSource {
        match &self.csv_file {
            Some(path) => ConfiguredSource::File(FileSource::new(path)),
            None => ConfiguredSource::Http(HttpSource::new(&self.csv_url)),
        }
    }
}

impl DatasetSource for ConfiguredSource {
    async fn fetch(&self) -> std::result::Result<String, LoadError> {
        match self {
            ConfiguredSource::Http(source) => source.fetch().await,
            ConfiguredSource::File(source) => source.fetch().await,
        }
    }

    fn describe(&self) -> String {
        match self {
            ConfiguredSource::Http(source) => source.describe(),
            ConfiguredSource::File(source) => source.describe(),
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct ServerArgs {
    /// Port to listen on
    #[arg(long, env = "SERVICE_AREA_PORT", default_value = "8080")]
    pub port: u16,

    /// Interface to bind
    #[arg(long, default_value = "0.0.0.0")]
    pub host: String,
}

impl ServerArgs {
    pub fn addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("invalid bind address {}:{}", self.host, self.port))
    }
}

/// Install the fmt subscriber; `RUST_LOG` overrides the default filter.
pub fn init_tracing(default_filter: &str) {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| default_filter.into()),
        ))
        .init();
}
