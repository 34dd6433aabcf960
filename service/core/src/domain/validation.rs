// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Caller input validation errors.

use thiserror::Error;

/// Rejections of caller-supplied input. All map to `400 Bad Request`.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Field '{0}' is required")]
    MissingField(&'static str),

    #[error("Document is not valid JSON: {0}")]
    MalformedDocument(String),

    #[error("Diagram type '{0}' is not supported")]
    UnsupportedType(String),

    #[error("'{0}' is not a valid artifact id")]
    InvalidArtifactId(String),
}

impl ValidationError {
    /// Machine-readable code returned to callers.
    pub fn code(&self) -> &'static str {
        match self {
            ValidationError::MissingField(_) => "MISSING_FIELD",
            ValidationError::MalformedDocument(_) => "MALFORMED_DOCUMENT",
            ValidationError::UnsupportedType(_) => "UNSUPPORTED_TYPE",
            ValidationError::InvalidArtifactId(_) => "INVALID_ARTIFACT_ID",
        }
    }
}
