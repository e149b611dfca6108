//! nexus-server: HTTP server for recording car-sharing deposit agreements
//!
//! Usage: `nexus-server [config.yaml]` (or set `NEXUS_CONFIG`). With no
//! config file the defaults apply; `NEXUS_*` variables override either.

use anyhow::{Context, Result};
use nexus::config::{CONFIG_ENV, NexusConfig};
use nexus::server::ServerBuilder;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

const DEFAULT_LOG_FILTER: &str = "nexus=info,nexus_server=info,tower_http=info";

#[tokio::main]
async fn main() -> Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config_path = std::env::args()
        .nth(1)
        .or_else(|| std::env::var(CONFIG_ENV).ok());

    let config = NexusConfig::load(config_path.as_deref()).with_context(|| match &config_path {
        Some(path) => format!("invalid configuration ({})", path),
        None => "invalid configuration".to_string(),
    })?;

    tracing::info!(
        bind = %config.server.bind,
        backend = %config.storage.backend,
        public_origin = %config.server.public_origin,
        "starting nexus-server v{}",
        env!("CARGO_PKG_VERSION")
    );

    ServerBuilder::new().with_config(config).serve().await
}
