#[macro_use]
extern crate serde_with;
#[macro_use]
extern crate tracing;

use anyhow::{Context, Result as AnyResult};
use components::{CatalogServer, MetricsExporter, SharedStore};
use configs::ApplicationConfig;
use std::{num::NonZeroUsize, sync::Arc};
use store::{load_default_dataset, CertificateStore};
use tokio::sync::RwLock;

mod components;
mod configs;
mod error;
mod store;
mod types;

fn main() -> AnyResult<()> {
    // Load environment variables from the `.env` file
    dotenvy::dotenv().ok();
    // Initialize the logger after loading the environment variables
    tracing_subscriber::fmt::init();

    let app_config =
        ApplicationConfig::load_config().context("Failed to parse configuration files")?;

    // Setup async runtime
    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    if let Some(worker) = app_config.workers.and_then(NonZeroUsize::new) {
        runtime_builder.worker_threads(worker.into());
    }
    runtime_builder
        .enable_all()
        .build()
        .context("Failed to bootstrap the Tokio runtime")?
        .block_on(server_loop(app_config))
}

async fn server_loop(app_config: ApplicationConfig) -> AnyResult<()> {
    let defaults = load_default_dataset(app_config.seed.as_ref())
        .await
        .context("Failed to load the default certificates")?;
    let store: SharedStore = Arc::new(RwLock::new(CertificateStore::load(
        app_config.storage.build(),
        defaults,
    )));

    let server = CatalogServer::new(store.clone(), &app_config);
    let exporter = MetricsExporter::new(store)?;

    tokio::try_join!(
        server.run(app_config.listen, shutdown_signal()),
        exporter.run(app_config.metrics_listen, shutdown_signal()),
    )?;

    info!("Shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for the shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
