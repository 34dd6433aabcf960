// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! File-backed token store.
//!
//! The file is owned by whatever issues and rotates tokens. It is read on
//! every lookup and never cached, so a removed entry stops authenticating on
//! the next request. JSON files are accepted since JSON is valid YAML.
//!
//! ```yaml
//! tokens:
//!   - token: abc
//!     owner_id: u1
//! ```

use async_trait::async_trait;
use serde::Deserialize;
use std::path::PathBuf;

use crate::domain::identity::{BearerToken, TokenRecord, TokenStore, TokenStoreError};

#[derive(Debug, Deserialize)]
struct TokenFile {
    #[serde(default)]
    tokens: Vec<TokenRecord>,
}

pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl TokenStore for FileTokenStore {
    async fn lookup(&self, token: &BearerToken) -> Result<Option<TokenRecord>, TokenStoreError> {
        let content = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            TokenStoreError::Unavailable(format!("Failed to read {}: {}", self.path.display(), e))
        })?;

        let file: TokenFile = serde_yaml::from_str(&content).map_err(|e| {
            TokenStoreError::Malformed(format!("{}: {}", self.path.display(), e))
        })?;

        Ok(file.tokens.into_iter().find(|r| r.token == token.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn token(s: &str) -> BearerToken {
        BearerToken::from_header(s).unwrap()
    }

    #[tokio::test]
    async fn test_lookup_reads_current_file_contents() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tokens.yaml");
        std::fs::write(&path, "tokens:\n  - token: abc\n    owner_id: u1\n").unwrap();

        let store = FileTokenStore::new(&path);
        let record = store.lookup(&token("abc")).await.unwrap().unwrap();
        assert_eq!(record.owner_id, "u1");

        // Rotated externally
        std::fs::write(&path, r#"{"tokens": [{"token": "def", "owner_id": "u1"}]}"#).unwrap();
        assert!(store.lookup(&token("abc")).await.unwrap().is_none());
        assert!(store.lookup(&token("def")).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_missing_file_is_unavailable() {
        let dir = TempDir::new().unwrap();
        let store = FileTokenStore::new(dir.path().join("absent.yaml"));
        let err = store.lookup(&token("abc")).await.unwrap_err();
        assert!(matches!(err, TokenStoreError::Unavailable(_)));
    }

    #[tokio::test]
    async fn test_garbage_file_is_malformed() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tokens.yaml");
        std::fs::write(&path, "tokens: 42\n").unwrap();

        let err = FileTokenStore::new(&path).lookup(&token("abc")).await.unwrap_err();
        assert!(matches!(err, TokenStoreError::Malformed(_)));
    }
}
