//! Gateway binary entrypoint.

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use chatgate::api::{self, AppState};
use chatgate::settings::Settings;
use chatgate::store::JsonFileStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let settings = Settings::parse();
    let data_dir = settings.data_dir();
    let store = JsonFileStore::new(&data_dir)
        .with_context(|| format!("failed to open document store at {}", data_dir.display()))?;

    tracing::info!(data_dir = %data_dir.display(), "document store ready");

    let state = AppState::new(Arc::new(store));
    api::start_server(&settings, state)
        .await
        .map_err(|e| anyhow::anyhow!(e))
        .context("server error")
}
