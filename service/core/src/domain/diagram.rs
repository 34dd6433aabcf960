// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Diagram
//!
//! Diagram families, sources and the rendering backend interface.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Closed set of diagram families and the Anti-Corruption Layer
//!   over the external rendering backend

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::domain::validation::ValidationError;

/// Diagram families the service can render.
///
/// Dispatch over this enum is always exhaustive; an unknown wire value is
/// rejected by [`DiagramType::from_str`] before any rendering happens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DiagramType {
    /// Infrastructure-as-code script (wire name `aws`)
    #[serde(rename = "aws")]
    InfraDiagram,
    /// Entity-relationship description (wire name `er`)
    #[serde(rename = "er")]
    EntityRelationship,
    /// Schema-less JSON document summarised into a diagram (wire name `json`)
    #[serde(rename = "json")]
    StructuredDocument,
}

impl DiagramType {
    pub const ALL: [DiagramType; 3] = [
        DiagramType::InfraDiagram,
        DiagramType::EntityRelationship,
        DiagramType::StructuredDocument,
    ];

    /// Wire name, also used as the middle segment of artifact keys.
    pub fn as_str(&self) -> &'static str {
        match self {
            DiagramType::InfraDiagram => "aws",
            DiagramType::EntityRelationship => "er",
            DiagramType::StructuredDocument => "json",
        }
    }
}

impl fmt::Display for DiagramType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DiagramType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "aws" => Ok(DiagramType::InfraDiagram),
            "er" => Ok(DiagramType::EntityRelationship),
            "json" => Ok(DiagramType::StructuredDocument),
            _ => Err(ValidationError::UnsupportedType(s.trim().to_string())),
        }
    }
}

/// A validated diagram source: known family, non-blank content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagramSource {
    pub diagram_type: DiagramType,
    content: String,
}

impl DiagramSource {
    /// Build a source from raw input. Content is trimmed.
    pub fn new(diagram_type: DiagramType, content: &str) -> Result<Self, ValidationError> {
        let content = content.trim();
        if content.is_empty() {
            return Err(ValidationError::MissingField("source"));
        }
        Ok(Self {
            diagram_type,
            content: content.to_string(),
        })
    }

    pub fn content(&self) -> &str {
        &self.content
    }
}

/// Job handed to the rendering backend.
///
/// For `StructuredDocument` the script is the derived skeleton, not the
/// caller's raw document.
#[derive(Debug, Clone)]
pub struct RenderJob {
    pub diagram_type: DiagramType,
    pub script: String,
}

/// External rendering backend.
///
/// Converts a family-specific script into PNG bytes. Implementations own
/// their timeout policy.
#[async_trait]
pub trait RenderingBackend: Send + Sync {
    async fn render(&self, job: &RenderJob) -> Result<Vec<u8>, BackendError>;

    /// Short name used in logs and health output
    fn name(&self) -> &'static str;
}

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("Backend rejected the script: {0}")]
    Rejected(String),

    #[error("Backend process failed: {0}")]
    Process(String),

    #[error("Backend unreachable: {0}")]
    Network(String),

    #[error("Backend timed out after {0}s")]
    Timeout(u64),
}

impl From<reqwest::Error> for BackendError {
    fn from(err: reqwest::Error) -> Self {
        BackendError::Network(err.to_string())
    }
}

/// Failures produced while turning a source into image bytes.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Structured document is not valid JSON: {0}")]
    InvalidDocument(String),

    #[error("Rendering backend failed: {0}")]
    BackendFailure(String),
}

impl From<BackendError> for RenderError {
    fn from(err: BackendError) -> Self {
        RenderError::BackendFailure(err.to_string())
    }
}
