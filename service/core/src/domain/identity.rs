// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Identity Types - Anti-Corruption Layer for the Token Store
//!
//! A bearer token resolves to exactly one owner identity. The token store
//! itself is external (issuance, rotation and expiry live there); this module
//! only defines the read contract the core depends on.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Identity a bearer token resolves to. Partitions every stored artifact.
///
/// Never empty: construct through [`OwnerId::new`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct OwnerId(String);

impl OwnerId {
    pub fn new(value: impl Into<String>) -> Result<Self, IdentityError> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(IdentityError::EmptyOwner);
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for OwnerId {
    type Error = IdentityError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<OwnerId> for String {
    fn from(owner: OwnerId) -> Self {
        owner.0
    }
}

/// Bearer credential extracted from an `Authorization` header.
///
/// The raw value is kept out of `Debug` output so it never lands in logs.
#[derive(Clone, PartialEq, Eq)]
pub struct BearerToken(String);

impl BearerToken {
    /// Extract the credential from a raw header value.
    ///
    /// The `Bearer` scheme prefix is matched case-insensitively and stripped,
    /// then surrounding whitespace is trimmed. A header without the prefix is
    /// taken as the bare credential.
    pub fn from_header(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        let credential = match trimmed.get(..7) {
            Some(scheme) if scheme.eq_ignore_ascii_case("bearer ") => &trimmed[7..],
            _ if trimmed.eq_ignore_ascii_case("bearer") => "",
            _ => trimmed,
        };
        let credential = credential.trim();
        if credential.is_empty() {
            None
        } else {
            Some(Self(credential.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("BearerToken(***)")
    }
}

/// Record held by the token store, keyed by token value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenRecord {
    pub token: String,
    pub owner_id: String,
}

/// Read-only view of the external token store.
///
/// Implementations perform a single point-read per call. Whether a token is
/// expired is decided entirely by whether the store still holds a record.
#[async_trait]
pub trait TokenStore: Send + Sync {
    /// Look up the record for `token`.
    ///
    /// # Returns
    /// * `Ok(Some(record))` - The token is currently valid
    /// * `Ok(None)` - No such token (never issued, revoked or expired)
    /// * `Err(TokenStoreError)` - The store could not be reached
    async fn lookup(&self, token: &BearerToken) -> Result<Option<TokenRecord>, TokenStoreError>;
}

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("Owner identity must not be empty")]
    EmptyOwner,
}

#[derive(Debug, Error)]
pub enum TokenStoreError {
    #[error("Token store unavailable: {0}")]
    Unavailable(String),

    #[error("Token store returned a malformed record: {0}")]
    Malformed(String),
}

/// Authentication failures, in the order they are checked.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Bearer token required")]
    Missing,

    #[error("Invalid or expired token")]
    InvalidOrExpired,

    #[error("Token store unavailable: {0}")]
    StoreUnavailable(#[from] TokenStoreError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bearer_prefix_is_stripped() {
        let token = BearerToken::from_header("Bearer abc").unwrap();
        assert_eq!(token.as_str(), "abc");

        let token = BearerToken::from_header("  bearer   abc  ").unwrap();
        assert_eq!(token.as_str(), "abc");
    }

    #[test]
    fn test_bare_credential_is_accepted() {
        let token = BearerToken::from_header("abc").unwrap();
        assert_eq!(token.as_str(), "abc");
    }

    #[test]
    fn test_empty_credentials_are_missing() {
        assert!(BearerToken::from_header("").is_none());
        assert!(BearerToken::from_header("   ").is_none());
        assert!(BearerToken::from_header("Bearer").is_none());
        assert!(BearerToken::from_header("Bearer    ").is_none());
    }

    #[test]
    fn test_token_debug_is_redacted() {
        let token = BearerToken::from_header("Bearer super-secret").unwrap();
        assert!(!format!("{:?}", token).contains("super-secret"));
    }

    #[test]
    fn test_owner_id_rejects_blank() {
        assert!(OwnerId::new("").is_err());
        assert!(OwnerId::new("  ").is_err());
        assert_eq!(OwnerId::new("u1").unwrap().as_str(), "u1");
    }
}
