// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! SeaweedFS Artifact Store Implementation
//!
//! Stores rendered images as files on a SeaweedFS filer. Every artifact key
//! becomes a filer path under a configurable bucket directory.
//!
//! # API Endpoints
//!
//! - `PUT /{bucket}/{key}` - Upload file (parent directories are implicit)
//! - `GET /{bucket}/{key}` - Download file
//! - `GET /` - Health check

use async_trait::async_trait;
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, StatusCode};
use std::time::Duration;

use crate::domain::artifact::{ArtifactKey, ArtifactStore, StorageError};

/// Key segments already carry `%XX` escapes; they are escaped again so the
/// filer sees the literal segment instead of decoding it back into `/`.
const URL_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'?')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// SeaweedFS Filer adapter
pub struct SeaweedFsArtifactStore {
    /// HTTP client for communicating with filer
    client: Client,

    /// Filer base URL (e.g., "http://localhost:8888")
    filer_url: String,

    /// Top-level directory holding all artifacts
    bucket: String,
}

impl SeaweedFsArtifactStore {
    pub fn new(filer_url: impl Into<String>, bucket: impl Into<String>) -> Result<Self, StorageError> {
        Self::with_timeout(filer_url, bucket, Duration::from_secs(30))
    }

    /// Create adapter with custom timeout
    pub fn with_timeout(
        filer_url: impl Into<String>,
        bucket: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, StorageError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| StorageError::Unavailable(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            filer_url: filer_url.into().trim_end_matches('/').to_string(),
            bucket: bucket.into().trim_matches('/').to_string(),
        })
    }

    fn object_url(&self, key: &ArtifactKey) -> String {
        let path: Vec<String> = key
            .segments()
            .map(|segment| utf8_percent_encode(segment, URL_SEGMENT).to_string())
            .collect();
        format!("{}/{}/{}", self.filer_url, self.bucket, path.join("/"))
    }
}

#[async_trait]
impl ArtifactStore for SeaweedFsArtifactStore {
    async fn put(&self, key: &ArtifactKey, bytes: Vec<u8>, content_type: &str) -> Result<(), StorageError> {
        let url = self.object_url(key);

        let response = self
            .client
            .put(&url)
            .header(CONTENT_TYPE, content_type)
            .body(bytes)
            .send()
            .await?;

        match response.status() {
            StatusCode::CREATED | StatusCode::OK | StatusCode::NO_CONTENT => Ok(()),
            status => {
                let error_msg = response
                    .text()
                    .await
                    .unwrap_or_else(|_| format!("HTTP {}", status));
                Err(StorageError::WriteFailed {
                    key: key.to_string(),
                    reason: format!("HTTP {}: {}", status, error_msg),
                })
            }
        }
    }

    async fn get(&self, key: &ArtifactKey) -> Result<Vec<u8>, StorageError> {
        let url = self.object_url(key);

        let response = self.client.get(&url).send().await?;

        match response.status() {
            StatusCode::OK => Ok(response.bytes().await?.to_vec()),
            StatusCode::NOT_FOUND => Err(StorageError::NotFound(key.to_string())),
            status => {
                let error_msg = response
                    .text()
                    .await
                    .unwrap_or_else(|_| format!("HTTP {}", status));
                Err(StorageError::Unavailable(format!(
                    "Failed to read {}: {}",
                    key, error_msg
                )))
            }
        }
    }

    async fn health_check(&self) -> Result<(), StorageError> {
        let url = format!("{}/", self.filer_url);
        let response = self.client.get(&url).send().await?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(StorageError::Unavailable(format!(
                "Filer returned status {}",
                response.status()
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::artifact::{ArtifactId, PNG_CONTENT_TYPE};
    use crate::domain::diagram::DiagramType;
    use crate::domain::identity::OwnerId;

    fn key(owner: &str) -> ArtifactKey {
        ArtifactKey::build(&OwnerId::new(owner).unwrap(), DiagramType::InfraDiagram, ArtifactId::new())
    }

    #[test]
    fn test_url_building() {
        let store = SeaweedFsArtifactStore::new("http://localhost:8888/", "/diagrams/").unwrap();
        let key = key("u1");
        assert_eq!(
            store.object_url(&key),
            format!("http://localhost:8888/diagrams/{}", key.as_str())
        );
    }

    #[test]
    fn test_escaped_owner_survives_url_decoding() {
        let store = SeaweedFsArtifactStore::new("http://localhost:8888", "diagrams").unwrap();
        let url = store.object_url(&key("team/a"));
        assert!(url.starts_with("http://localhost:8888/diagrams/team%252Fa/aws/"));
    }

    #[tokio::test]
    async fn test_put_sends_content_type() {
        let mut server = mockito::Server::new_async().await;
        let key = key("u1");
        let mock = server
            .mock("PUT", format!("/diagrams/{}", key.as_str()).as_str())
            .match_header("content-type", PNG_CONTENT_TYPE)
            .match_body("png")
            .with_status(201)
            .create_async()
            .await;

        let store = SeaweedFsArtifactStore::new(server.url(), "diagrams").unwrap();
        store.put(&key, b"png".to_vec(), PNG_CONTENT_TYPE).await.unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_put_failure_is_write_failed() {
        let mut server = mockito::Server::new_async().await;
        let key = key("u1");
        server
            .mock("PUT", format!("/diagrams/{}", key.as_str()).as_str())
            .with_status(500)
            .with_body("disk full")
            .create_async()
            .await;

        let store = SeaweedFsArtifactStore::new(server.url(), "diagrams").unwrap();
        let err = store.put(&key, b"png".to_vec(), PNG_CONTENT_TYPE).await.unwrap_err();
        assert!(matches!(err, StorageError::WriteFailed { .. }));
    }

    #[tokio::test]
    async fn test_get_maps_status_codes() {
        let mut server = mockito::Server::new_async().await;
        let present = key("u1");
        let absent = key("u1");
        server
            .mock("GET", format!("/diagrams/{}", present.as_str()).as_str())
            .with_status(200)
            .with_body(b"\x89PNG")
            .create_async()
            .await;
        server
            .mock("GET", format!("/diagrams/{}", absent.as_str()).as_str())
            .with_status(404)
            .create_async()
            .await;

        let store = SeaweedFsArtifactStore::new(server.url(), "diagrams").unwrap();
        assert_eq!(store.get(&present).await.unwrap(), b"\x89PNG");
        assert!(matches!(store.get(&absent).await, Err(StorageError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_unreachable_filer_is_unavailable() {
        let store = SeaweedFsArtifactStore::with_timeout("http://127.0.0.1:9", "diagrams", Duration::from_secs(2)).unwrap();
        assert!(matches!(store.get(&key("u1")).await, Err(StorageError::Unavailable(_))));
        assert!(store.health_check().await.is_err());
    }
}
