// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Composition root for the `diagramd` binary.
//!
//! Turns a validated [`ServiceConfigManifest`] into the router state by
//! selecting one adapter per collaborator.

use anyhow::{Context, Result};
use std::sync::Arc;

use diagram_service_core::application::{DiagramRenderer, RequestDispatcher, TokenAuthenticator};
use diagram_service_core::domain::artifact::LocatorBuilder;
use diagram_service_core::domain::service_config::ServiceConfigManifest;
use diagram_service_core::infrastructure::rendering::create_rendering_backend;
use diagram_service_core::infrastructure::storage::create_artifact_store;
use diagram_service_core::infrastructure::token_store::create_token_store;
use diagram_service_core::presentation::api::AppState;

pub fn build_state(config: &ServiceConfigManifest) -> Result<AppState> {
    let spec = &config.spec;

    let token_store = create_token_store(&spec.tokens).context("Failed to initialize token store")?;
    let artifact_store =
        create_artifact_store(&spec.storage).context("Failed to initialize artifact store")?;
    let backend =
        create_rendering_backend(&spec.rendering).context("Failed to initialize rendering backend")?;

    let dispatcher = RequestDispatcher::new(
        TokenAuthenticator::new(token_store),
        DiagramRenderer::new(backend),
        artifact_store,
        LocatorBuilder::new(spec.storage.public_base_url.clone()),
    );

    Ok(AppState {
        dispatcher: Arc::new(dispatcher),
        legacy_not_found: spec.compat.legacy_not_found_status,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use diagram_service_core::domain::service_config::{StaticToken, StorageBackendKind};
    use diagram_service_core::presentation::api::app;
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_default_config_serves_health() {
        let dir = tempfile::TempDir::new().unwrap();
        let mut config = ServiceConfigManifest::default();
        config.spec.storage.base_path = dir.path().join("artifacts");

        let router = app(build_state(&config).unwrap());
        let response = router
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_static_tokens_are_wired() {
        let mut config = ServiceConfigManifest::default();
        config.spec.storage.backend = StorageBackendKind::Memory;
        config.spec.tokens.tokens.push(StaticToken {
            token: "abc".to_string(),
            owner_id: "u1".to_string(),
        });
        config.spec.compat.legacy_not_found_status = true;

        let state = build_state(&config).unwrap();
        assert!(state.legacy_not_found);
        let generated = state
            .dispatcher
            .generate(Some("Bearer abc"), "aws", "A >> B")
            .await
            .unwrap();
        assert!(generated.locator.as_str().starts_with("artifact://u1/aws/"));
    }

    #[test]
    fn test_unresolvable_token_fails_startup() {
        let mut config = ServiceConfigManifest::default();
        config.spec.storage.backend = StorageBackendKind::Memory;
        config.spec.tokens.tokens.push(StaticToken {
            token: "env:DIAGRAMS_TEST_TOKEN_THAT_IS_NEVER_SET".to_string(),
            owner_id: "u1".to_string(),
        });
        assert!(build_state(&config).is_err());
    }
}
