mod catalog_server;
mod metrics_exporter;

pub use catalog_server::CatalogServer;
pub use metrics_exporter::MetricsExporter;

use crate::store::{CatalogStorage, CertificateStore};
use std::sync::Arc;
use tokio::sync::RwLock;

pub type SharedStore = Arc<RwLock<CertificateStore<Box<dyn CatalogStorage>>>>;
