// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Local Filesystem Artifact Store
//!
//! Filesystem-backed implementation of ArtifactStore for single-node
//! deployments and development. Artifact keys map directly onto
//! `<base>/<owner>/<type>/<id>.png`.
//!
//! **Limitations:**
//! - No replication; artifacts live on one machine
//! - No lifecycle policy; old artifacts must be pruned externally

use async_trait::async_trait;
use std::path::{Component, Path, PathBuf};
use uuid::Uuid;

use crate::domain::artifact::{ArtifactKey, ArtifactStore, StorageError};

pub struct LocalArtifactStore {
    /// Base directory for all artifacts (e.g., "/var/lib/diagrams/artifacts")
    base_path: PathBuf,
}

impl LocalArtifactStore {
    /// Create new local artifact store, creating `base_path` if needed
    pub fn new(base_path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let base_path = base_path.into();

        std::fs::create_dir_all(&base_path).map_err(|e| {
            StorageError::Unavailable(format!(
                "Failed to create base directory {}: {}",
                base_path.display(),
                e
            ))
        })?;

        // Verify directory is writable
        let probe = base_path.join(".diagrams-storage-test");
        std::fs::write(&probe, b"test").map_err(|e| {
            StorageError::Unavailable(format!(
                "Base directory {} is not writable: {}",
                base_path.display(),
                e
            ))
        })?;
        std::fs::remove_file(&probe)
            .map_err(|e| StorageError::Unavailable(format!("Failed to cleanup probe file: {}", e)))?;

        Ok(Self { base_path })
    }

    /// Resolve a key to its file path. Keys never contain `..` segments, but
    /// the check is repeated here at the filesystem boundary.
    fn resolve_path(&self, key: &ArtifactKey) -> Result<PathBuf, StorageError> {
        let relative = Path::new(key.as_str());
        let only_normal = relative
            .components()
            .all(|c| matches!(c, Component::Normal(_)));
        if !only_normal {
            tracing::warn!(key = %key, "Rejected artifact key escaping the base directory");
            return Err(StorageError::Unavailable(format!("Invalid artifact key: {}", key)));
        }
        Ok(self.base_path.join(relative))
    }
}

#[async_trait]
impl ArtifactStore for LocalArtifactStore {
    async fn put(&self, key: &ArtifactKey, bytes: Vec<u8>, _content_type: &str) -> Result<(), StorageError> {
        let path = self.resolve_path(key)?;
        let write_failed = |reason: String| StorageError::WriteFailed {
            key: key.to_string(),
            reason,
        };

        let parent = path
            .parent()
            .ok_or_else(|| write_failed("artifact path has no parent".to_string()))?;
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| write_failed(format!("Failed to create {}: {}", parent.display(), e)))?;

        // Write to a sibling temp file first so readers never see a partial image.
        let tmp = parent.join(format!(".{}.partial", Uuid::new_v4()));
        if let Err(e) = tokio::fs::write(&tmp, &bytes).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(write_failed(e.to_string()));
        }
        if let Err(e) = tokio::fs::rename(&tmp, &path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(write_failed(e.to_string()));
        }

        Ok(())
    }

    async fn get(&self, key: &ArtifactKey) -> Result<Vec<u8>, StorageError> {
        let path = self.resolve_path(key)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(StorageError::NotFound(key.to_string())),
            Err(e) => Err(StorageError::Unavailable(format!("Failed to read {}: {}", key, e))),
        }
    }

    async fn health_check(&self) -> Result<(), StorageError> {
        match tokio::fs::metadata(&self.base_path).await {
            Ok(meta) if meta.is_dir() => Ok(()),
            Ok(_) => Err(StorageError::Unavailable(format!(
                "{} is not a directory",
                self.base_path.display()
            ))),
            Err(e) => Err(StorageError::Unavailable(e.to_string())),
        }
    }
}
