// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! HTTP rendering service client.
//!
//! Speaks the Kroki-style API: `POST {endpoint}/{format}/png` with the
//! script as a plain-text body, PNG bytes in the response.

use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::Client;
use std::collections::HashMap;
use std::time::Duration;

use crate::domain::artifact::PNG_CONTENT_TYPE;
use crate::domain::diagram::{BackendError, DiagramType, RenderJob, RenderingBackend};

pub struct HttpRenderingBackend {
    client: Client,
    endpoint: String,
    formats: HashMap<DiagramType, String>,
    timeout: Duration,
}

impl HttpRenderingBackend {
    pub fn new(
        endpoint: impl Into<String>,
        formats: HashMap<DiagramType, String>,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            formats,
            timeout,
        })
    }

    fn url_for(&self, diagram_type: DiagramType) -> Result<String, BackendError> {
        let format = self
            .formats
            .get(&diagram_type)
            .ok_or_else(|| BackendError::Rejected(format!("No rendering format configured for {}", diagram_type)))?;
        Ok(format!("{}/{}/png", self.endpoint, format))
    }
}

#[async_trait]
impl RenderingBackend for HttpRenderingBackend {
    async fn render(&self, job: &RenderJob) -> Result<Vec<u8>, BackendError> {
        let url = self.url_for(job.diagram_type)?;

        let response = self
            .client
            .post(&url)
            .header(CONTENT_TYPE, "text/plain")
            .header(ACCEPT, PNG_CONTENT_TYPE)
            .body(job.script.clone())
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    BackendError::Timeout(self.timeout.as_secs())
                } else {
                    BackendError::from(e)
                }
            })?;

        let status = response.status();
        if status.is_client_error() {
            let body = response.text().await.unwrap_or_default();
            return Err(BackendError::Rejected(format!("HTTP {}: {}", status, body.trim())));
        }
        if !status.is_success() {
            return Err(BackendError::Network(format!("Rendering service returned {}", status)));
        }

        Ok(response.bytes().await?.to_vec())
    }

    fn name(&self) -> &'static str {
        "http"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn formats() -> HashMap<DiagramType, String> {
        HashMap::from([
            (DiagramType::InfraDiagram, "graphviz".to_string()),
            (DiagramType::EntityRelationship, "erd".to_string()),
        ])
    }

    fn job(diagram_type: DiagramType, script: &str) -> RenderJob {
        RenderJob {
            diagram_type,
            script: script.to_string(),
        }
    }

    #[tokio::test]
    async fn test_posts_script_to_format_route() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/graphviz/png")
            .match_header("content-type", "text/plain")
            .match_body("A >> B")
            .with_status(200)
            .with_header("content-type", PNG_CONTENT_TYPE)
            .with_body(b"\x89PNG-bytes")
            .create_async()
            .await;

        let backend = HttpRenderingBackend::new(server.url(), formats(), Duration::from_secs(5)).unwrap();
        let bytes = backend.render(&job(DiagramType::InfraDiagram, "A >> B")).await.unwrap();

        assert_eq!(bytes, b"\x89PNG-bytes");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_client_error_is_rejected() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/erd/png")
            .with_status(400)
            .with_body("syntax error at line 1")
            .create_async()
            .await;

        let backend = HttpRenderingBackend::new(server.url(), formats(), Duration::from_secs(5)).unwrap();
        let err = backend.render(&job(DiagramType::EntityRelationship, "???")).await.unwrap_err();
        assert!(matches!(err, BackendError::Rejected(msg) if msg.contains("syntax error")));
    }

    #[tokio::test]
    async fn test_server_error_is_network() {
        let mut server = mockito::Server::new_async().await;
        server.mock("POST", "/erd/png").with_status(503).create_async().await;

        let backend = HttpRenderingBackend::new(server.url(), formats(), Duration::from_secs(5)).unwrap();
        let err = backend.render(&job(DiagramType::EntityRelationship, "[a]")).await.unwrap_err();
        assert!(matches!(err, BackendError::Network(_)));
    }

    #[tokio::test]
    async fn test_unmapped_type_is_rejected_without_a_request() {
        let backend = HttpRenderingBackend::new("http://127.0.0.1:9", formats(), Duration::from_secs(1)).unwrap();
        let err = backend.render(&job(DiagramType::StructuredDocument, "graph TD;")).await.unwrap_err();
        assert!(matches!(err, BackendError::Rejected(_)));
    }
}
