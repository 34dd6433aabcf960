// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Request Dispatcher
//!
//! Application service behind both public operations.
//!
//! # DDD Pattern: Application Service
//!
//! - **Layer:** Application
//! - **Responsibility:** Fail-fast Generate / Fetch pipelines
//! - **Collaborators:**
//!   - Application: `TokenAuthenticator`, `DiagramRenderer`
//!   - Domain: `ArtifactKey`, `LocatorBuilder`
//!   - Infrastructure: `ArtifactStore`
//!
//! Authentication always runs first: a request without a valid token never
//! touches the renderer or the store. The dispatcher keeps no state between
//! requests.

use serde::Deserialize;
use std::sync::Arc;
use thiserror::Error;
use tracing::Instrument;

use crate::application::authenticator::TokenAuthenticator;
use crate::application::renderer::DiagramRenderer;
use crate::domain::artifact::{
    Artifact, ArtifactId, ArtifactKey, ArtifactLocator, ArtifactStore, LocatorBuilder, StorageError,
};
use crate::domain::diagram::{DiagramSource, DiagramType, RenderError};
use crate::domain::identity::{AuthError, OwnerId};
use crate::domain::validation::ValidationError;

/// Catch-all for failures outside the classified taxonomy.
#[derive(Debug, Error)]
pub enum InternalError {
    #[error("Unexpected internal error: {0}")]
    Unexpected(String),
}

/// Every way a Generate or Fetch call can fail.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Internal(#[from] InternalError),
}

impl DispatchError {
    /// Outcome label used in metrics
    fn outcome(&self) -> &'static str {
        match self {
            DispatchError::Auth(AuthError::Missing) => "auth_missing",
            DispatchError::Auth(AuthError::InvalidOrExpired) => "auth_invalid",
            DispatchError::Auth(AuthError::StoreUnavailable(_)) => "token_store_unavailable",
            DispatchError::Validation(_) => "invalid_request",
            DispatchError::Render(RenderError::InvalidDocument(_)) => "invalid_document",
            DispatchError::Render(RenderError::BackendFailure(_)) => "render_failed",
            DispatchError::Storage(StorageError::NotFound(_)) => "not_found",
            DispatchError::Storage(_) => "storage_failed",
            DispatchError::Internal(_) => "internal_error",
        }
    }
}

/// Generate request body fields. Missing fields deserialize as empty.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GenerateBody {
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub diagram_type: Option<String>,
}

/// Fetch request body fields. Missing fields deserialize as empty.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FetchBody {
    #[serde(default)]
    pub archivo_id: Option<String>,
    #[serde(default)]
    pub tipo: Option<String>,
}

#[derive(Debug, Clone)]
pub struct GeneratedArtifact {
    pub artifact_id: ArtifactId,
    pub key: ArtifactKey,
    pub locator: ArtifactLocator,
}

#[derive(Debug, Clone)]
pub struct FetchedArtifact {
    pub key: ArtifactKey,
    pub bytes: Vec<u8>,
}

pub struct RequestDispatcher {
    authenticator: TokenAuthenticator,
    renderer: DiagramRenderer,
    artifact_store: Arc<dyn ArtifactStore>,
    locators: LocatorBuilder,
}

impl RequestDispatcher {
    pub fn new(
        authenticator: TokenAuthenticator,
        renderer: DiagramRenderer,
        artifact_store: Arc<dyn ArtifactStore>,
        locators: LocatorBuilder,
    ) -> Self {
        Self {
            authenticator,
            renderer,
            artifact_store,
            locators,
        }
    }

    pub fn artifact_store(&self) -> &Arc<dyn ArtifactStore> {
        &self.artifact_store
    }

    /// Render `content` as a `diagram_type` diagram and persist it for the
    /// caller.
    ///
    /// # Errors
    ///
    /// - `Auth`: missing/invalid token (checked before anything else)
    /// - `Validation::MissingField`: blank `diagram_type` or `content`
    /// - `Validation::UnsupportedType`: type outside `aws`/`er`/`json`
    /// - `Render`: invalid structured document or backend failure
    /// - `Storage`: the artifact could not be written
    pub async fn generate(
        &self,
        auth_header: Option<&str>,
        diagram_type: &str,
        content: &str,
    ) -> Result<GeneratedArtifact, DispatchError> {
        let result = match self.authenticator.authenticate(auth_header).await {
            Ok(owner) => self.generate_as(owner, diagram_type, content).await,
            Err(e) => Err(e.into()),
        };
        record_outcome("diagram_generate_total", &result);
        result
    }

    /// Generate from a raw request body. The body is parsed only after the
    /// caller has been authenticated; an empty body counts as `{}`.
    pub async fn generate_from_body(
        &self,
        auth_header: Option<&str>,
        body: &[u8],
    ) -> Result<GeneratedArtifact, DispatchError> {
        let result = self.generate_from_body_inner(auth_header, body).await;
        record_outcome("diagram_generate_total", &result);
        result
    }

    /// Load a previously generated artifact owned by the caller.
    ///
    /// The key is derived from the authenticated owner, so an id belonging to
    /// another owner resolves to a key that does not exist.
    ///
    /// # Errors
    ///
    /// - `Auth`: missing/invalid token
    /// - `Validation`: blank, unparseable or unsupported fields
    /// - `Storage::NotFound`: nothing stored under the derived key
    pub async fn fetch(
        &self,
        auth_header: Option<&str>,
        artifact_id: &str,
        diagram_type: &str,
    ) -> Result<FetchedArtifact, DispatchError> {
        let result = match self.authenticator.authenticate(auth_header).await {
            Ok(owner) => self.fetch_as(owner, artifact_id, diagram_type).await,
            Err(e) => Err(e.into()),
        };
        record_outcome("diagram_fetch_total", &result);
        result
    }

    /// Fetch from a raw request body, parsed after authentication.
    pub async fn fetch_from_body(
        &self,
        auth_header: Option<&str>,
        body: &[u8],
    ) -> Result<FetchedArtifact, DispatchError> {
        let result = self.fetch_from_body_inner(auth_header, body).await;
        record_outcome("diagram_fetch_total", &result);
        result
    }

    async fn generate_from_body_inner(
        &self,
        auth_header: Option<&str>,
        body: &[u8],
    ) -> Result<GeneratedArtifact, DispatchError> {
        let owner = self.authenticator.authenticate(auth_header).await?;
        let body: GenerateBody = parse_body(body)?;
        self.generate_as(
            owner,
            body.diagram_type.as_deref().unwrap_or_default(),
            body.source.as_deref().unwrap_or_default(),
        )
        .await
    }

    async fn fetch_from_body_inner(
        &self,
        auth_header: Option<&str>,
        body: &[u8],
    ) -> Result<FetchedArtifact, DispatchError> {
        let owner = self.authenticator.authenticate(auth_header).await?;
        let body: FetchBody = parse_body(body)?;
        self.fetch_as(
            owner,
            body.archivo_id.as_deref().unwrap_or_default(),
            body.tipo.as_deref().unwrap_or_default(),
        )
        .await
    }

    async fn generate_as(
        &self,
        owner: OwnerId,
        diagram_type: &str,
        content: &str,
    ) -> Result<GeneratedArtifact, DispatchError> {
        if diagram_type.trim().is_empty() {
            return Err(ValidationError::MissingField("diagram_type").into());
        }
        if content.trim().is_empty() {
            return Err(ValidationError::MissingField("source").into());
        }
        let diagram_type: DiagramType = diagram_type.parse()?;
        let source = DiagramSource::new(diagram_type, content)?;

        let span = tracing::info_span!(
            "generate",
            owner_id = %owner,
            diagram_type = %diagram_type,
            artifact_id = tracing::field::Empty,
        );

        async move {
            let bytes = self.renderer.render(&source).await?;

            let artifact = Artifact::new(owner, diagram_type, bytes);
            let key = artifact.key();
            tracing::Span::current().record("artifact_id", tracing::field::display(artifact.id));

            self.artifact_store
                .put(&key, artifact.bytes, artifact.content_type)
                .await
                .map_err(|e| {
                    tracing::error!(key = %key, error = %e, "Failed to persist artifact");
                    e
                })?;

            tracing::info!(key = %key, "Artifact generated");

            Ok::<_, DispatchError>(GeneratedArtifact {
                artifact_id: artifact.id,
                locator: self.locators.locate(&key),
                key,
            })
        }
        .instrument(span)
        .await
    }

    async fn fetch_as(
        &self,
        owner: OwnerId,
        artifact_id: &str,
        diagram_type: &str,
    ) -> Result<FetchedArtifact, DispatchError> {
        if artifact_id.trim().is_empty() {
            return Err(ValidationError::MissingField("archivo_id").into());
        }
        if diagram_type.trim().is_empty() {
            return Err(ValidationError::MissingField("tipo").into());
        }
        let artifact_id: ArtifactId = artifact_id.parse()?;
        let diagram_type: DiagramType = diagram_type.parse()?;

        let key = ArtifactKey::build(&owner, diagram_type, artifact_id);
        let span = tracing::info_span!("fetch", owner_id = %owner, key = %key);

        async move {
            let bytes = self.artifact_store.get(&key).await.map_err(|e| {
                match &e {
                    StorageError::NotFound(_) => tracing::info!("Artifact not found"),
                    other => tracing::error!(error = %other, "Failed to read artifact"),
                }
                e
            })?;

            if bytes.is_empty() {
                tracing::error!("Artifact store returned an empty object");
                return Err(InternalError::Unexpected(format!("empty object at {}", key)).into());
            }

            Ok::<_, DispatchError>(FetchedArtifact { key, bytes })
        }
        .instrument(span)
        .await
    }
}

fn parse_body<T>(body: &[u8]) -> Result<T, ValidationError>
where
    T: for<'de> Deserialize<'de> + Default,
{
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    serde_json::from_slice(body).map_err(|e| ValidationError::MalformedDocument(e.to_string()))
}

fn record_outcome<T>(metric: &'static str, result: &Result<T, DispatchError>) {
    let outcome = match result {
        Ok(_) => "ok",
        Err(e) => e.outcome(),
    };
    metrics::counter!(metric, "outcome" => outcome).increment(1);
}
