// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # PostgreSQL Token Store
//!
//! Read-only `TokenStore` backed by a table with `token` and `owner_id`
//! text columns. Rows are written and expired by the token issuer; this
//! adapter only performs a point-read per request.
//!
//! ```sql
//! CREATE TABLE tokens (
//!     token    TEXT PRIMARY KEY,
//!     owner_id TEXT NOT NULL
//! );
//! ```

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::Row;

use crate::domain::identity::{BearerToken, TokenRecord, TokenStore, TokenStoreError};
use crate::domain::service_config::is_valid_table_name;

pub struct PostgresTokenStore {
    pool: PgPool,
    query: String,
}

impl PostgresTokenStore {
    /// `table` is interpolated into the query and must be a bare identifier.
    pub fn new(pool: PgPool, table: &str) -> anyhow::Result<Self> {
        check_table(table)?;
        Ok(Self {
            pool,
            query: format!("SELECT token, owner_id FROM {} WHERE token = $1", table),
        })
    }

    /// Build a store whose pool connects on first use.
    pub fn connect_lazy(database_url: &str, table: &str) -> anyhow::Result<Self> {
        check_table(table)?;
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect_lazy(database_url)?;
        Self::new(pool, table)
    }
}

fn check_table(table: &str) -> anyhow::Result<()> {
    if !is_valid_table_name(table) {
        anyhow::bail!("'{}' is not a valid token table name", table);
    }
    Ok(())
}

#[async_trait]
impl TokenStore for PostgresTokenStore {
    async fn lookup(&self, token: &BearerToken) -> Result<Option<TokenRecord>, TokenStoreError> {
        let row = sqlx::query(&self.query)
            .bind(token.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| TokenStoreError::Unavailable(e.to_string()))?;

        match row {
            Some(row) => {
                let token: String = row
                    .try_get("token")
                    .map_err(|e| TokenStoreError::Malformed(e.to_string()))?;
                let owner_id: String = row
                    .try_get("owner_id")
                    .map_err(|e| TokenStoreError::Malformed(e.to_string()))?;
                Ok(Some(TokenRecord { token, owner_id }))
            }
            None => Ok(None),
        }
    }
}
