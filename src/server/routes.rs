use crate::client::{IngestDispatcher, IngestOutcome, Payload};
use crate::models::IngestRecord;
use crate::Error;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{instrument, warn};

/// Body of `POST /ingest/`
#[derive(Debug, Deserialize)]
pub struct IngestRequest {
    pub provider: String,
    #[serde(default)]
    pub payload: Value,
}

/// `{"detail": ...}` error body with the status derived from the error category
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    detail: String,
}

impl From<Error> for ApiError {
    fn from(error: Error) -> Self {
        let status =
            StatusCode::from_u16(error.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        Self {
            status,
            detail: error.detail(),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            detail: rejection.body_text(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "detail": self.detail }))).into_response()
    }
}

/// Build the HTTP application around a dispatcher
pub fn router(dispatcher: Arc<IngestDispatcher>) -> Router {
    Router::new()
        .route("/ingest/", post(ingest_handler))
        .route("/data/", get(data_handler))
        .route("/health", get(super::health::health_handler))
        .with_state(dispatcher)
        .layer(TraceLayer::new_for_http())
}

#[instrument(skip_all)]
async fn ingest_handler(
    State(dispatcher): State<Arc<IngestDispatcher>>,
    request: Result<Json<IngestRequest>, JsonRejection>,
) -> Result<Json<IngestOutcome>, ApiError> {
    let Json(request) = request?;
    let payload = Payload::from_value(request.payload).map_err(|source| Error::Ingestion {
        provider: request.provider.clone(),
        source,
    })?;

    match dispatcher.ingest(&request.provider, payload).await {
        Ok(outcome) => Ok(Json(outcome)),
        Err(e) => {
            warn!("Ingestion request for {} rejected: {}", request.provider, e);
            Err(e.into())
        }
    }
}

async fn data_handler(State(dispatcher): State<Arc<IngestDispatcher>>) -> Json<Vec<IngestRecord>> {
    Json(dispatcher.records().await)
}
