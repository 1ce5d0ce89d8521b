use super::SharedStore;
use crate::{
    configs::ApplicationConfig,
    error::{AppError, ErrorReason},
    store::MutationOutcome,
    types::{categories, visible, CertificatePatch, CertificateRecord, FilterCriteria, Notice},
};
use anyhow::Result as AnyResult;
use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::{future::Future, net::SocketAddr, time::Duration};
use tokio::net::TcpListener;
use uuid::Uuid;

#[derive(Clone, Debug)]
struct ServerState {
    store: SharedStore,
    notice_ttl: Duration,
    skill_preview: usize,
}

/// JSON front of the certificate store.
#[derive(Clone, Debug)]
pub struct CatalogServer {
    state: ServerState,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CertificateCard {
    #[serde(flatten)]
    record: CertificateRecord,
    preview_skills: Vec<String>,
    hidden_skills: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CatalogView {
    certificates: Vec<CertificateCard>,
    categories: Vec<String>,
    total: usize,
}

#[derive(Debug, Deserialize)]
struct NewCertificate {
    #[serde(default)]
    id: Option<String>,
    #[serde(flatten)]
    fields: CertificatePatch,
}

#[derive(Debug, Serialize)]
struct MutationResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    certificate: Option<CertificateRecord>,
    notice: Notice,
}

#[derive(Debug)]
struct ApiError {
    status: StatusCode,
    notice: Notice,
}

impl ApiError {
    fn new(err: AppError, ttl: Duration) -> Self {
        let status = match err.reason() {
            ErrorReason::DuplicateId(_) => StatusCode::CONFLICT,
            ErrorReason::MissingField(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ErrorReason::NotFound(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if err.reason().is_validation() {
            debug!("Rejected certificate: {}", err);
        } else if status == StatusCode::INTERNAL_SERVER_ERROR {
            error!("Request failed: {}", err);
        }
        Self {
            status,
            notice: Notice::error(err.to_string(), ttl),
        }
    }

    fn rejected(rejection: JsonRejection, ttl: Duration) -> Self {
        debug!("Rejected request body: {}", rejection);
        Self {
            status: rejection.status(),
            notice: Notice::error(rejection.body_text(), ttl),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = MutationResponse {
            certificate: None,
            notice: self.notice,
        };
        (self.status, Json(body)).into_response()
    }
}

impl CatalogServer {
    pub fn new(store: SharedStore, config: &ApplicationConfig) -> Self {
        Self {
            state: ServerState {
                store,
                notice_ttl: config.notice_ttl,
                skill_preview: config.skill_preview,
            },
        }
    }

    pub fn router(&self) -> Router {
        Router::new()
            .route(
                "/certificates",
                get(Self::handle_list).post(Self::handle_create),
            )
            .route(
                "/certificates/:id",
                get(Self::handle_get)
                    .put(Self::handle_update)
                    .delete(Self::handle_delete),
            )
            .route("/categories", get(Self::handle_categories))
            .route("/healthz", get(|| async { "ok" }))
            .with_state(self.state.clone())
    }

    pub async fn run<F>(&self, listen: SocketAddr, shutdown: F) -> AnyResult<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let listener = TcpListener::bind(listen).await?;
        info!("Serving the certificate catalog on {}", listen);
        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown)
            .await?;
        Ok(())
    }

    async fn handle_list(
        State(state): State<ServerState>,
        Query(criteria): Query<FilterCriteria>,
    ) -> Json<CatalogView> {
        let store = state.store.read().await;
        let records = store.records();

        let certificates: Vec<CertificateCard> = visible(records, &criteria, Utc::now())
            .into_iter()
            .map(|record| {
                let preview = record.skill_preview(state.skill_preview);
                CertificateCard {
                    preview_skills: preview.shown.to_vec(),
                    hidden_skills: preview.hidden,
                    record: record.clone(),
                }
            })
            .collect();
        trace!("{} of {} certificates visible for {:?}", certificates.len(), records.len(), criteria);

        Json(CatalogView {
            certificates,
            categories: categories(records),
            total: records.len(),
        })
    }

    async fn handle_categories(State(state): State<ServerState>) -> Json<Vec<String>> {
        let store = state.store.read().await;
        Json(categories(store.records()))
    }

    async fn handle_get(
        State(state): State<ServerState>,
        Path(id): Path<String>,
    ) -> Result<Json<CertificateRecord>, ApiError> {
        let store = state.store.read().await;
        match store.get(&id) {
            Some(record) => Ok(Json(record.clone())),
            None => Err(ApiError::new(
                ErrorReason::NotFound(id).into(),
                state.notice_ttl,
            )),
        }
    }

    async fn handle_create(
        State(state): State<ServerState>,
        body: Result<Json<NewCertificate>, JsonRejection>,
    ) -> Result<(StatusCode, Json<MutationResponse>), ApiError> {
        let Json(new) = body.map_err(|e| ApiError::rejected(e, state.notice_ttl))?;
        let id = new.id.unwrap_or_else(|| Uuid::new_v4().to_string());
        let mut record = CertificateRecord::new(id, "", "");
        record.apply(new.fields);

        let mut store = state.store.write().await;
        let outcome = store
            .create(record.clone())
            .map_err(|e| ApiError::new(e, state.notice_ttl))?;

        let response = state.respond(
            Some(record),
            &outcome,
            "New certificate added successfully.",
        );
        Ok((StatusCode::CREATED, Json(response)))
    }

    async fn handle_update(
        State(state): State<ServerState>,
        Path(id): Path<String>,
        body: Result<Json<CertificatePatch>, JsonRejection>,
    ) -> Result<Json<MutationResponse>, ApiError> {
        let Json(patch) = body.map_err(|e| ApiError::rejected(e, state.notice_ttl))?;
        let mut store = state.store.write().await;
        let outcome = store
            .update(&id, patch)
            .map_err(|e| ApiError::new(e, state.notice_ttl))?;

        let updated = store.get(&id).cloned();
        Ok(Json(state.respond(
            updated,
            &outcome,
            "Certificate updated successfully.",
        )))
    }

    async fn handle_delete(
        State(state): State<ServerState>,
        Path(id): Path<String>,
    ) -> Json<MutationResponse> {
        let outcome = state.store.write().await.delete(&id);
        Json(state.respond(None, &outcome, "Certificate deleted successfully."))
    }
}

impl ServerState {
    fn respond(
        &self,
        certificate: Option<CertificateRecord>,
        outcome: &MutationOutcome,
        success: &str,
    ) -> MutationResponse {
        let notice = match &outcome.persist_warning {
            Some(warning) => Notice::error(
                format!("Failed to save changes to storage: {warning}"),
                self.notice_ttl,
            ),
            None => Notice::success(success, self.notice_ttl),
        };
        MutationResponse {
            certificate,
            notice,
        }
    }
}
