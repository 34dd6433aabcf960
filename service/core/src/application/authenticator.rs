// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Token Authenticator
//!
//! Resolves the `Authorization` header of a request to an owner identity.
//!
//! # DDD Pattern: Application Service
//!
//! - **Layer:** Application
//! - **Responsibility:** Bearer credential extraction and a single token-store read
//! - **Collaborators:**
//!   - Domain: `BearerToken`, `OwnerId`
//!   - Infrastructure: `TokenStore`

use std::sync::Arc;

use crate::domain::identity::{AuthError, BearerToken, OwnerId, TokenStore};

pub struct TokenAuthenticator {
    token_store: Arc<dyn TokenStore>,
}

impl TokenAuthenticator {
    pub fn new(token_store: Arc<dyn TokenStore>) -> Self {
        Self { token_store }
    }

    /// Resolve a raw `Authorization` header to its owner.
    ///
    /// # Errors
    ///
    /// - `Missing`: header absent or empty once the scheme is stripped
    /// - `InvalidOrExpired`: the store holds no record for the token
    /// - `StoreUnavailable`: the store could not be read
    pub async fn authenticate(&self, raw_header: Option<&str>) -> Result<OwnerId, AuthError> {
        let token = raw_header
            .and_then(BearerToken::from_header)
            .ok_or(AuthError::Missing)?;

        let record = self
            .token_store
            .lookup(&token)
            .await?
            .ok_or(AuthError::InvalidOrExpired)?;

        OwnerId::new(record.owner_id).map_err(|_| {
            tracing::warn!("Token record resolved to an empty owner identity; rejecting");
            AuthError::InvalidOrExpired
        })
    }
}
