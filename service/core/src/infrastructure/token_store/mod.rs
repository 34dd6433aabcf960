// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Token Store Implementations
//!
//! Concrete read-side adapters for the external token store.
//!
//! - **InMemoryTokenStore** - tokens from the service manifest, or seeded by tests
//! - **FileTokenStore** - YAML/JSON token file re-read on every lookup, so
//!   rotation by an external process is picked up without a restart
//! - **PostgresTokenStore** - point-read against a `token` / `owner_id` table

pub mod file;
pub mod postgres;

pub use file::FileTokenStore;
pub use postgres::PostgresTokenStore;

use anyhow::Context;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::domain::identity::{BearerToken, TokenRecord, TokenStore, TokenStoreError};
use crate::domain::service_config::{resolve_env_value, TokenBackendKind, TokenStoreConfig};

#[derive(Clone, Default)]
pub struct InMemoryTokenStore {
    tokens: Arc<RwLock<HashMap<String, String>>>,
}

impl InMemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tokens<I, K, V>(tokens: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let tokens = tokens
            .into_iter()
            .map(|(token, owner)| (token.into(), owner.into()))
            .collect();
        Self {
            tokens: Arc::new(RwLock::new(tokens)),
        }
    }

    pub fn insert(&self, token: impl Into<String>, owner_id: impl Into<String>) {
        let mut tokens = self.tokens.write().unwrap_or_else(|e| e.into_inner());
        tokens.insert(token.into(), owner_id.into());
    }

    pub fn revoke(&self, token: &str) {
        let mut tokens = self.tokens.write().unwrap_or_else(|e| e.into_inner());
        tokens.remove(token);
    }
}

#[async_trait]
impl TokenStore for InMemoryTokenStore {
    async fn lookup(&self, token: &BearerToken) -> Result<Option<TokenRecord>, TokenStoreError> {
        let tokens = self.tokens.read().unwrap_or_else(|e| e.into_inner());
        Ok(tokens.get(token.as_str()).map(|owner| TokenRecord {
            token: token.as_str().to_string(),
            owner_id: owner.clone(),
        }))
    }
}

/// Factory function to create a token store from configuration
pub fn create_token_store(config: &TokenStoreConfig) -> anyhow::Result<Arc<dyn TokenStore>> {
    match config.backend {
        TokenBackendKind::Memory => {
            let store = InMemoryTokenStore::new();
            for entry in &config.tokens {
                let token = resolve_env_value(&entry.token)
                    .with_context(|| format!("Failed to resolve token for owner '{}'", entry.owner_id))?;
                store.insert(token, entry.owner_id.clone());
            }
            tracing::info!(count = config.tokens.len(), "Using in-memory token store");
            Ok(Arc::new(store))
        }
        TokenBackendKind::File => {
            let path = config
                .path
                .clone()
                .context("tokens.path is required for the file token backend")?;
            tracing::info!(path = %path.display(), "Using file token store");
            Ok(Arc::new(FileTokenStore::new(path)))
        }
        TokenBackendKind::Postgres => {
            let url = config
                .database_url
                .as_deref()
                .context("tokens.database_url is required for the postgres token backend")?;
            let url = resolve_env_value(url).context("Failed to resolve tokens.database_url")?;
            let store = PostgresTokenStore::connect_lazy(&url, &config.table)
                .context("Failed to configure PostgreSQL token store")?;
            tracing::info!(table = %config.table, "Using PostgreSQL token store");
            Ok(Arc::new(store))
        }
    }
}
