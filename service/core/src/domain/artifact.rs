// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Artifact Addressing and Artifact Store Trait
//!
//! Every rendered image is written once under a key derived from
//! `(owner, diagram type, artifact id)`. Keys are owner-partitioned, so a
//! caller can only ever address artifacts under their own identity.
//!
//! The store itself is external; [`ArtifactStore`] is the Anti-Corruption
//! Layer over it.

use async_trait::async_trait;
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::diagram::DiagramType;
use crate::domain::identity::OwnerId;
use crate::domain::validation::ValidationError;

/// Content type of every persisted artifact.
pub const PNG_CONTENT_TYPE: &str = "image/png";

/// Separator between key segments.
pub const KEY_SEPARATOR: char = '/';

const ARTIFACT_EXTENSION: &str = ".png";

/// Characters escaped inside a key segment. `%` is included so the encoding
/// stays injective; `.` is included so no segment can become `.` or `..`.
const SEGMENT: &AsciiSet = &CONTROLS.add(b'/').add(b'\\').add(b'%').add(b'.');

/// Artifact identifier. Always generated by the service as a UUIDv4.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ArtifactId(pub Uuid);

impl ArtifactId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ArtifactId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ArtifactId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for ArtifactId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim())
            .map(ArtifactId)
            .map_err(|_| ValidationError::InvalidArtifactId(s.trim().to_string()))
    }
}

/// Storage key of a single artifact: `<owner>/<type>/<id>.png`.
///
/// Only [`ArtifactKey::build`] creates keys, so every key has exactly three
/// non-empty segments.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ArtifactKey(String);

impl ArtifactKey {
    /// Derive the key for an artifact. Pure and total.
    pub fn build(owner: &OwnerId, diagram_type: DiagramType, id: ArtifactId) -> Self {
        let owner = utf8_percent_encode(owner.as_str(), SEGMENT);
        let id = id.0.as_hyphenated().to_string();
        Self(format!(
            "{owner}{sep}{ty}{sep}{id}{ext}",
            sep = KEY_SEPARATOR,
            ty = diagram_type.as_str(),
            ext = ARTIFACT_EXTENSION,
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The three path segments, in order.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split(KEY_SEPARATOR)
    }
}

impl fmt::Display for ArtifactKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Reference to a persisted artifact returned from Generate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ArtifactLocator(String);

impl ArtifactLocator {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Builds public locators for stored artifacts.
#[derive(Debug, Clone, Default)]
pub struct LocatorBuilder {
    public_base_url: Option<String>,
}

impl LocatorBuilder {
    pub fn new(public_base_url: Option<String>) -> Self {
        Self {
            public_base_url: public_base_url
                .map(|url| url.trim_end_matches('/').to_string())
                .filter(|url| !url.is_empty()),
        }
    }

    pub fn locate(&self, key: &ArtifactKey) -> ArtifactLocator {
        match &self.public_base_url {
            Some(base) => ArtifactLocator(format!("{}/{}", base, key)),
            None => ArtifactLocator(format!("artifact://{}", key)),
        }
    }
}

/// A rendered image, ready to be persisted.
#[derive(Debug, Clone)]
pub struct Artifact {
    pub id: ArtifactId,
    pub owner_id: OwnerId,
    pub diagram_type: DiagramType,
    pub bytes: Vec<u8>,
    pub content_type: &'static str,
}

impl Artifact {
    pub fn new(owner_id: OwnerId, diagram_type: DiagramType, bytes: Vec<u8>) -> Self {
        Self {
            id: ArtifactId::new(),
            owner_id,
            diagram_type,
            bytes,
            content_type: PNG_CONTENT_TYPE,
        }
    }

    pub fn key(&self) -> ArtifactKey {
        ArtifactKey::build(&self.owner_id, self.diagram_type, self.id)
    }
}

/// Object store contract consumed by the core.
///
/// Writes are single-key and at-least-once; there is no update or delete.
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Persist `bytes` under `key`.
    ///
    /// # Returns
    /// * `Ok(())` once the object is fully written
    /// * `Err(StorageError::WriteFailed)` if the store rejected the write
    /// * `Err(StorageError::Unavailable)` if the store could not be reached
    async fn put(&self, key: &ArtifactKey, bytes: Vec<u8>, content_type: &str) -> Result<(), StorageError>;

    /// Read the object stored under `key`.
    ///
    /// # Returns
    /// * `Ok(Vec<u8>)` - The stored bytes
    /// * `Err(StorageError::NotFound)` - Nothing is stored under `key`
    /// * `Err(StorageError::Unavailable)` - The store could not be reached
    async fn get(&self, key: &ArtifactKey) -> Result<Vec<u8>, StorageError>;

    /// Check health of the storage backend
    async fn health_check(&self) -> Result<(), StorageError> {
        Ok(())
    }
}

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Artifact not found: {0}")]
    NotFound(String),

    #[error("Storage backend unavailable: {0}")]
    Unavailable(String),

    #[error("Failed to write artifact {key}: {reason}")]
    WriteFailed { key: String, reason: String },
}

impl From<reqwest::Error> for StorageError {
    fn from(err: reqwest::Error) -> Self {
        StorageError::Unavailable(err.to_string())
    }
}
