// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use axum::{
    body::Bytes,
    extract::State,
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use base64::Engine;
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::application::{DispatchError, RequestDispatcher};
use crate::domain::artifact::{ArtifactLocator, StorageError};
use crate::domain::diagram::RenderError;
use crate::domain::identity::AuthError;

/// Message returned for every 500; the detail only goes to the log.
const INTERNAL_MESSAGE: &str = "Internal server error";

pub struct AppState {
    pub dispatcher: Arc<RequestDispatcher>,
    /// Answer missing artifacts with 500 instead of 404
    pub legacy_not_found: bool,
}

pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/diagrams/generate", post(generate_handler))
        .route("/diagrams/fetch", post(fetch_handler))
        .route("/health", get(health_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(Arc::new(state))
}

#[derive(Debug, Serialize)]
pub struct GenerateResponse {
    #[serde(rename = "imageUrl")]
    pub image_url: ArtifactLocator,
    pub archivo_id: String,
}

#[derive(Debug, Serialize)]
pub struct FetchResponse {
    pub imagen_base64: String,
}

fn authorization(headers: &HeaderMap) -> Option<&str> {
    headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok())
}

async fn generate_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<GenerateResponse>, ApiError> {
    let generated = state
        .dispatcher
        .generate_from_body(authorization(&headers), &body)
        .await
        .map_err(|e| ApiError::new(e, state.legacy_not_found))?;

    Ok(Json(GenerateResponse {
        image_url: generated.locator,
        archivo_id: generated.artifact_id.to_string(),
    }))
}

async fn fetch_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<FetchResponse>, ApiError> {
    let fetched = state
        .dispatcher
        .fetch_from_body(authorization(&headers), &body)
        .await
        .map_err(|e| ApiError::new(e, state.legacy_not_found))?;

    let payload = base64::engine::general_purpose::STANDARD.encode(&fetched.bytes);
    Ok(Json(FetchResponse {
        imagen_base64: format!("data:image/png;base64,{}", payload),
    }))
}

async fn health_handler(State(state): State<Arc<AppState>>) -> Response {
    match state.dispatcher.artifact_store().health_check().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({ "status": "ok", "artifact_store": "ok" })),
        )
            .into_response(),
        Err(e) => {
            tracing::warn!(error = %e, "Artifact store health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "status": "degraded", "artifact_store": "unavailable" })),
            )
                .into_response()
        }
    }
}

/// HTTP rendering of a [`DispatchError`].
#[derive(Debug)]
pub struct ApiError {
    error: DispatchError,
    legacy_not_found: bool,
}

impl ApiError {
    pub fn new(error: DispatchError, legacy_not_found: bool) -> Self {
        Self {
            error,
            legacy_not_found,
        }
    }

    /// Status and machine code; `None` as message means the generic one.
    fn classify(&self) -> (StatusCode, &'static str, Option<String>) {
        let message = Some(self.error.to_string());
        match &self.error {
            DispatchError::Auth(AuthError::Missing) => (StatusCode::UNAUTHORIZED, "MISSING_TOKEN", message),
            DispatchError::Auth(AuthError::InvalidOrExpired) => (StatusCode::FORBIDDEN, "INVALID_TOKEN", message),
            DispatchError::Validation(v) => (StatusCode::BAD_REQUEST, v.code(), message),
            DispatchError::Render(RenderError::InvalidDocument(_)) => {
                (StatusCode::BAD_REQUEST, "MALFORMED_DOCUMENT", message)
            }
            DispatchError::Storage(StorageError::NotFound(_)) if self.legacy_not_found => {
                (StatusCode::INTERNAL_SERVER_ERROR, "NOT_FOUND", None)
            }
            DispatchError::Storage(StorageError::NotFound(_)) => (StatusCode::NOT_FOUND, "NOT_FOUND", message),
            _ => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", None),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.classify();
        let message = match message {
            Some(message) => message,
            None => {
                tracing::error!(error = %self.error, "Request failed");
                INTERNAL_MESSAGE.to_string()
            }
        };
        (status, Json(json!({ "error": message, "code": code }))).into_response()
    }
}
