// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Storage Infrastructure Module
//!
//! Provides concrete implementations of the ArtifactStore trait.

pub mod seaweedfs;
pub mod local;

pub use seaweedfs::SeaweedFsArtifactStore;
pub use local::LocalArtifactStore;

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::domain::artifact::{ArtifactKey, ArtifactStore, StorageError};
use crate::domain::service_config::{StorageBackendKind, StorageConfig};

/// Factory function to create an artifact store from configuration
pub fn create_artifact_store(config: &StorageConfig) -> Result<Arc<dyn ArtifactStore>, StorageError> {
    match config.backend {
        StorageBackendKind::SeaweedFS => {
            let filer_url = config.filer_url.clone().ok_or_else(|| {
                StorageError::Unavailable("storage.filer_url is required for the seaweedfs backend".to_string())
            })?;
            tracing::info!(filer_url = %filer_url, bucket = %config.bucket, "Using SeaweedFS artifact store");
            Ok(Arc::new(SeaweedFsArtifactStore::with_timeout(
                filer_url,
                config.bucket.clone(),
                Duration::from_secs(config.timeout_secs),
            )?))
        }
        StorageBackendKind::Local => {
            tracing::info!(base_path = %config.base_path.display(), "Using local artifact store");
            Ok(Arc::new(LocalArtifactStore::new(&config.base_path)?))
        }
        StorageBackendKind::Memory => {
            tracing::warn!("Using in-memory artifact store; artifacts are lost on restart");
            Ok(Arc::new(InMemoryArtifactStore::new()))
        }
    }
}

/// Process-local artifact store for development and tests.
#[derive(Default)]
pub struct InMemoryArtifactStore {
    objects: Mutex<HashMap<String, (Vec<u8>, String)>>,
    reads: AtomicUsize,
}

impl InMemoryArtifactStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored objects
    pub fn len(&self) -> usize {
        self.objects.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of `get` calls served, hits and misses alike
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    /// Stored bytes and content type, bypassing the read counter
    pub fn object(&self, key: &ArtifactKey) -> Option<(Vec<u8>, String)> {
        self.objects
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(key.as_str())
            .cloned()
    }
}

#[async_trait]
impl ArtifactStore for InMemoryArtifactStore {
    async fn put(&self, key: &ArtifactKey, bytes: Vec<u8>, content_type: &str) -> Result<(), StorageError> {
        let mut objects = self.objects.lock().unwrap_or_else(|e| e.into_inner());
        objects.insert(key.as_str().to_string(), (bytes, content_type.to_string()));
        Ok(())
    }

    async fn get(&self, key: &ArtifactKey) -> Result<Vec<u8>, StorageError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        let objects = self.objects.lock().unwrap_or_else(|e| e.into_inner());
        objects
            .get(key.as_str())
            .map(|(bytes, _)| bytes.clone())
            .ok_or_else(|| StorageError::NotFound(key.to_string()))
    }
}
