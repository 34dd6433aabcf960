// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! End-to-end router tests over in-memory collaborators.

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use base64::Engine;
use serde_json::{json, Value};
use std::str::FromStr;
use std::sync::Arc;
use tower::ServiceExt;

use diagram_service_core::application::{DiagramRenderer, RequestDispatcher, TokenAuthenticator};
use diagram_service_core::domain::artifact::{
    ArtifactId, ArtifactKey, ArtifactStore, LocatorBuilder, StorageError,
};
use diagram_service_core::domain::diagram::DiagramType;
use diagram_service_core::domain::identity::OwnerId;
use diagram_service_core::infrastructure::rendering::SimulatedRenderingBackend;
use diagram_service_core::infrastructure::storage::InMemoryArtifactStore;
use diagram_service_core::infrastructure::token_store::InMemoryTokenStore;
use diagram_service_core::presentation::api::{app, AppState};

const BASE_URL: &str = "https://diagrams.example.com";

fn router_with(store: Arc<dyn ArtifactStore>, legacy_not_found: bool) -> Router {
    let tokens = InMemoryTokenStore::with_tokens([("abc", "u1"), ("xyz", "u2")]);
    let dispatcher = RequestDispatcher::new(
        TokenAuthenticator::new(Arc::new(tokens)),
        DiagramRenderer::new(Arc::new(SimulatedRenderingBackend)),
        store,
        LocatorBuilder::new(Some(BASE_URL.to_string())),
    );
    app(AppState {
        dispatcher: Arc::new(dispatcher),
        legacy_not_found,
    })
}

fn post(uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

#[tokio::test]
async fn generate_then_fetch_returns_the_stored_image() {
    let store = Arc::new(InMemoryArtifactStore::new());
    let router = router_with(store.clone(), false);

    let (status, body) = send(
        &router,
        post("/diagrams/generate", Some("abc"), json!({ "source": "A >> B", "diagram_type": "aws" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let archivo_id = body["archivo_id"].as_str().unwrap().to_string();
    let id = ArtifactId::from_str(&archivo_id).unwrap();
    let key = ArtifactKey::build(&OwnerId::new("u1").unwrap(), DiagramType::InfraDiagram, id);
    assert_eq!(key.as_str(), format!("u1/aws/{}.png", archivo_id));
    assert_eq!(body["imageUrl"], format!("{}/{}", BASE_URL, key));

    let (stored, content_type) = store.object(&key).unwrap();
    assert_eq!(content_type, "image/png");

    let (status, body) = send(
        &router,
        post("/diagrams/fetch", Some("abc"), json!({ "archivo_id": archivo_id, "tipo": "aws" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let data_uri = body["imagen_base64"].as_str().unwrap();
    let payload = data_uri.strip_prefix("data:image/png;base64,").unwrap();
    let decoded = base64::engine::general_purpose::STANDARD.decode(payload).unwrap();
    assert_eq!(decoded, stored);
}

#[tokio::test]
async fn fetch_is_idempotent() {
    let router = router_with(Arc::new(InMemoryArtifactStore::new()), false);
    let (_, generated) = send(
        &router,
        post("/diagrams/generate", Some("abc"), json!({ "source": "[users]\n*id", "diagram_type": "er" })),
    )
    .await;
    let fetch = json!({ "archivo_id": generated["archivo_id"], "tipo": "er" });

    let (_, first) = send(&router, post("/diagrams/fetch", Some("abc"), fetch.clone())).await;
    let (_, second) = send(&router, post("/diagrams/fetch", Some("abc"), fetch)).await;
    assert_eq!(first, second);
}

#[tokio::test]
async fn missing_token_is_unauthorized_without_side_effects() {
    let store = Arc::new(InMemoryArtifactStore::new());
    let router = router_with(store.clone(), false);

    let (status, body) = send(
        &router,
        post("/diagrams/generate", None, json!({ "source": "A >> B", "diagram_type": "aws" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "MISSING_TOKEN");

    let (status, _) = send(
        &router,
        post("/diagrams/fetch", None, json!({ "archivo_id": "whatever", "tipo": "aws" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    assert!(store.is_empty());
    assert_eq!(store.reads(), 0);
}

#[tokio::test]
async fn missing_token_wins_over_a_garbage_body() {
    let router = router_with(Arc::new(InMemoryArtifactStore::new()), false);
    let request = Request::builder()
        .method("POST")
        .uri("/diagrams/generate")
        .body(Body::from("not json at all"))
        .unwrap();

    let (status, _) = send(&router, request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn unknown_token_is_forbidden() {
    let router = router_with(Arc::new(InMemoryArtifactStore::new()), false);
    let (status, body) = send(
        &router,
        post("/diagrams/generate", Some("nope"), json!({ "source": "A >> B", "diagram_type": "aws" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "INVALID_TOKEN");
}

#[tokio::test]
async fn caller_input_errors_are_bad_request() {
    let store = Arc::new(InMemoryArtifactStore::new());
    let router = router_with(store.clone(), false);

    let cases = [
        (json!({ "diagram_type": "aws" }), "MISSING_FIELD"),
        (json!({ "source": "A >> B" }), "MISSING_FIELD"),
        (json!({ "source": "A >> B", "diagram_type": "uml" }), "UNSUPPORTED_TYPE"),
        (json!({ "source": "{\"a\": ", "diagram_type": "json" }), "MALFORMED_DOCUMENT"),
    ];
    for (body, code) in cases {
        let (status, response) = send(&router, post("/diagrams/generate", Some("abc"), body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(response["code"], code);
    }

    let request = Request::builder()
        .method("POST")
        .uri("/diagrams/generate")
        .header("authorization", "Bearer abc")
        .body(Body::from("[1, 2"))
        .unwrap();
    let (status, response) = send(&router, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(response["code"], "MALFORMED_DOCUMENT");

    assert!(store.is_empty());
}

#[tokio::test]
async fn json_documents_are_rendered() {
    let store = Arc::new(InMemoryArtifactStore::new());
    let router = router_with(store.clone(), false);
    let (status, _) = send(
        &router,
        post(
            "/diagrams/generate",
            Some("abc"),
            json!({ "source": "{\"name\": \"x\", \"tags\": []}", "diagram_type": "json" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(store.len(), 1);
}

#[tokio::test]
async fn other_owners_artifacts_are_not_found() {
    let router = router_with(Arc::new(InMemoryArtifactStore::new()), false);
    let (_, generated) = send(
        &router,
        post("/diagrams/generate", Some("abc"), json!({ "source": "A >> B", "diagram_type": "aws" })),
    )
    .await;

    let (status, body) = send(
        &router,
        post("/diagrams/fetch", Some("xyz"), json!({ "archivo_id": generated["archivo_id"], "tipo": "aws" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");
}

#[tokio::test]
async fn unknown_id_status_depends_on_compat_mode() {
    let fetch = json!({ "archivo_id": ArtifactId::new().to_string(), "tipo": "aws" });

    let router = router_with(Arc::new(InMemoryArtifactStore::new()), false);
    let (status, _) = send(&router, post("/diagrams/fetch", Some("abc"), fetch.clone())).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let legacy = router_with(Arc::new(InMemoryArtifactStore::new()), true);
    let (status, body) = send(&legacy, post("/diagrams/fetch", Some("abc"), fetch)).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Internal server error");
    assert_eq!(body["code"], "NOT_FOUND");
    assert!(!body.to_string().contains("u1/aws"));
}

#[tokio::test]
async fn fetch_type_is_validated() {
    let router = router_with(Arc::new(InMemoryArtifactStore::new()), false);
    let id = ArtifactId::new().to_string();

    let (status, body) = send(
        &router,
        post("/diagrams/fetch", Some("abc"), json!({ "archivo_id": id, "tipo": "uml" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "UNSUPPORTED_TYPE");

    let (status, body) = send(
        &router,
        post("/diagrams/fetch", Some("abc"), json!({ "archivo_id": id, "tipo": "  " })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "MISSING_FIELD");
}

struct BrokenStore;

#[async_trait]
impl ArtifactStore for BrokenStore {
    async fn put(&self, key: &ArtifactKey, _bytes: Vec<u8>, _content_type: &str) -> Result<(), StorageError> {
        Err(StorageError::WriteFailed {
            key: key.to_string(),
            reason: "volume /dev/sdb1 read-only".to_string(),
        })
    }

    async fn get(&self, _key: &ArtifactKey) -> Result<Vec<u8>, StorageError> {
        Err(StorageError::Unavailable("connection refused".to_string()))
    }

    async fn health_check(&self) -> Result<(), StorageError> {
        Err(StorageError::Unavailable("connection refused".to_string()))
    }
}

#[tokio::test]
async fn storage_failures_are_opaque_500s() {
    let router = router_with(Arc::new(BrokenStore), false);
    let (status, body) = send(
        &router,
        post("/diagrams/generate", Some("abc"), json!({ "source": "A >> B", "diagram_type": "aws" })),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["code"], "INTERNAL_ERROR");
    assert!(!body["error"].as_str().unwrap().contains("sdb1"));
}

#[tokio::test]
async fn health_reflects_artifact_store() {
    let healthy = router_with(Arc::new(InMemoryArtifactStore::new()), false);
    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let (status, body) = send(&healthy, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");

    let broken = router_with(Arc::new(BrokenStore), false);
    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let (status, body) = send(&broken, request).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["artifact_store"], "unavailable");
}
