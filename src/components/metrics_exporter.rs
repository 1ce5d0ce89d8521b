use super::SharedStore;
use anyhow::Result as AnyResult;
use axum::{extract::State, http::StatusCode, routing::get, Router};
use chrono::Utc;
use prometheus::{IntGauge, IntGaugeVec, Opts, Registry, TextEncoder};
use std::{future::Future, net::SocketAddr};
use tokio::net::TcpListener;

#[derive(Clone, Debug)]
struct ExporterState {
    pub store: SharedStore,
    pub registry: Registry,
    pub metric_records: IntGauge,
    pub metric_expired: IntGauge,
    pub metric_expiration: IntGaugeVec,
}

#[derive(Clone, Debug)]
pub struct MetricsExporter {
    state: ExporterState,
}

impl MetricsExporter {
    pub fn new(store: SharedStore) -> AnyResult<Self> {
        let registry = Registry::new_custom(None, None)?;
        let cert_labels = ["id", "title", "issuer", "category"];

        let metric_records = IntGauge::with_opts(
            Opts::new("records", "Certificates in the catalog")
                .namespace("certcat")
                .subsystem("catalog"),
        )?;
        registry.register(Box::new(metric_records.clone()))?;
        let metric_expired = IntGauge::with_opts(
            Opts::new("expired_records", "Certificates past their expiration date")
                .namespace("certcat")
                .subsystem("catalog"),
        )?;
        registry.register(Box::new(metric_expired.clone()))?;
        let metric_expiration = IntGaugeVec::new(
            Opts::new("expiration_timestamp", "Certificate expiration timestamp")
                .namespace("certcat")
                .subsystem("cert"),
            &cert_labels,
        )?;
        registry.register(Box::new(metric_expiration.clone()))?;

        Ok(Self {
            state: ExporterState {
                store,
                registry,
                metric_records,
                metric_expired,
                metric_expiration,
            },
        })
    }

    pub fn router(&self) -> Router {
        Router::new()
            .route("/metrics", get(Self::handle_metrics))
            .with_state(self.state.clone())
    }

    pub async fn run<F>(&self, listen: SocketAddr, shutdown: F) -> AnyResult<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let listener = TcpListener::bind(listen).await?;
        info!("Serving metrics on {}", listen);
        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown)
            .await?;
        Ok(())
    }

    async fn handle_metrics(state: State<ExporterState>) -> Result<String, StatusCode> {
        let store = state.store.read().await;
        let now = Utc::now();

        // Deleted certificates must not linger between scrapes
        state.metric_expiration.reset();
        let mut expired = 0;
        for cert in store.records() {
            if cert.is_expired(now) {
                expired += 1;
            }
            let Some(expires_at) = cert.expires_at() else {
                continue;
            };

            let label_values = [
                cert.id.as_str(),
                cert.title.as_str(),
                cert.issuer.as_str(),
                cert.category.as_str(),
            ];
            match state
                .metric_expiration
                .get_metric_with_label_values(&label_values)
            {
                Ok(metric) => metric.set(expires_at.timestamp()),
                Err(e) => {
                    error!("Failed to get metric: {}", e);
                }
            }
        }
        state.metric_records.set(store.records().len() as i64);
        state.metric_expired.set(expired);
        drop(store);

        let encoder = TextEncoder::new();
        let resp = encoder
            .encode_to_string(&state.registry.gather())
            .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

        Ok(resp)
    }
}
