// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Service Configuration Types
//
// Defines the configuration schema for a diagram service node:
// - Kubernetes-style manifest format (apiVersion/kind/metadata/spec)
// - Token store, artifact store and rendering backend selection
// - Compatibility switches for the legacy HTTP surface
// - Server bind address and observability settings

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::domain::diagram::DiagramType;

pub const API_VERSION: &str = "diagrams.io/v1";
pub const KIND: &str = "ServiceConfig";

/// Top-level Kubernetes-style service configuration manifest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfigManifest {
    /// API version (must be "diagrams.io/v1")
    #[serde(rename = "apiVersion")]
    pub api_version: String,

    /// Resource kind (must be "ServiceConfig")
    pub kind: String,

    pub metadata: ManifestMetadata,

    pub spec: ServiceConfigSpec,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestMetadata {
    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<HashMap<String, String>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServiceConfigSpec {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub tokens: TokenStoreConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub rendering: RenderingConfig,

    #[serde(default)]
    pub compat: CompatConfig,

    #[serde(default)]
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Network bind address (e.g. "0.0.0.0" or "127.0.0.1")
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// HTTP API port
    #[serde(default = "default_api_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_api_port(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenBackendKind {
    /// Tokens listed inline in this manifest
    #[default]
    Memory,
    /// YAML/JSON token file, re-read on every lookup
    File,
    /// `tokens` table in PostgreSQL
    Postgres,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenStoreConfig {
    #[serde(default)]
    pub backend: TokenBackendKind,

    /// Inline tokens for the memory backend. Values support "env:VAR_NAME".
    #[serde(default)]
    pub tokens: Vec<StaticToken>,

    /// Token file for the file backend
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,

    /// Connection URL for the postgres backend (supports "env:VAR_NAME")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database_url: Option<String>,

    /// Table holding `token` / `owner_id` columns
    #[serde(default = "default_token_table")]
    pub table: String,
}

impl Default for TokenStoreConfig {
    fn default() -> Self {
        Self {
            backend: TokenBackendKind::default(),
            tokens: Vec::new(),
            path: None,
            database_url: None,
            table: default_token_table(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StaticToken {
    pub token: String,
    pub owner_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackendKind {
    /// Process-local map (development/testing)
    Memory,
    /// Local filesystem directory
    #[default]
    Local,
    /// SeaweedFS filer HTTP API
    SeaweedFS,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackendKind,

    /// Base directory for the local backend
    #[serde(default = "default_storage_path")]
    pub base_path: PathBuf,

    /// Filer base URL for the seaweedfs backend (e.g. "http://localhost:8888")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filer_url: Option<String>,

    /// Top-level filer directory artifacts are written under
    #[serde(default = "default_bucket")]
    pub bucket: String,

    /// Public base URL prepended to artifact keys when building locators
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_base_url: Option<String>,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackendKind::default(),
            base_path: default_storage_path(),
            filer_url: None,
            bucket: default_bucket(),
            public_base_url: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderingBackendKind {
    /// Deterministic placeholder bytes; no external renderer
    #[default]
    Simulated,
    /// External program reading the script on stdin, writing PNG on stdout
    Command,
    /// HTTP rendering service (`POST {endpoint}/{format}/png`)
    Http,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderingConfig {
    #[serde(default)]
    pub backend: RenderingBackendKind,

    /// Program for the command backend
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,

    /// Extra arguments; `{type}` is replaced with the diagram wire name
    #[serde(default)]
    pub args: Vec<String>,

    /// Base URL for the http backend
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,

    /// Diagram type -> rendering service format (e.g. aws -> graphviz)
    #[serde(default = "default_formats")]
    pub formats: HashMap<DiagramType, String>,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for RenderingConfig {
    fn default() -> Self {
        Self {
            backend: RenderingBackendKind::default(),
            command: None,
            args: Vec::new(),
            endpoint: None,
            formats: default_formats(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompatConfig {
    /// Report a missing artifact on Fetch as 500 instead of 404
    #[serde(default)]
    pub legacy_not_found_status: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// "compact" or "json"
    #[serde(default = "default_log_format")]
    pub log_format: String,

    /// Prometheus exporter port; disabled when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metrics_port: Option<u16>,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: default_log_format(),
            metrics_port: None,
        }
    }
}

fn default_bind_address() -> String {
    "127.0.0.1".to_string()
}

fn default_api_port() -> u16 {
    8080
}

fn default_token_table() -> String {
    "tokens".to_string()
}

fn default_storage_path() -> PathBuf {
    PathBuf::from("./artifacts")
}

fn default_bucket() -> String {
    "diagrams".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_formats() -> HashMap<DiagramType, String> {
    HashMap::from([
        (DiagramType::InfraDiagram, "graphviz".to_string()),
        (DiagramType::EntityRelationship, "erd".to_string()),
        (DiagramType::StructuredDocument, "mermaid".to_string()),
    ])
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "compact".to_string()
}

impl Default for ServiceConfigManifest {
    fn default() -> Self {
        Self {
            api_version: API_VERSION.to_string(),
            kind: KIND.to_string(),
            metadata: ManifestMetadata {
                name: "diagram-service".to_string(),
                labels: None,
            },
            spec: ServiceConfigSpec::default(),
        }
    }
}

/// A bare SQL identifier: ASCII letters, digits and `_`, not starting with a digit.
pub fn is_valid_table_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

/// Resolve "env:VAR_NAME" references, passing literal values through.
pub fn resolve_env_value(value: &str) -> anyhow::Result<String> {
    match value.strip_prefix("env:") {
        Some(var) => std::env::var(var)
            .map_err(|_| anyhow::anyhow!("Environment variable '{}' is not set", var)),
        None => Ok(value.to_string()),
    }
}

impl ServiceConfigManifest {
    /// Load configuration from YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Parse configuration from YAML string
    pub fn from_yaml_str(yaml: &str) -> anyhow::Result<Self> {
        let config = serde_yaml::from_str(yaml)?;
        Ok(config)
    }

    pub fn to_yaml_string(&self) -> anyhow::Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Discover configuration file using precedence order
    /// 1. DIAGRAMS_CONFIG_PATH environment variable
    /// 2. ./diagrams-config.yaml (working directory)
    /// 3. ~/.diagrams/config.yaml (user home)
    /// 4. /etc/diagrams/config.yaml (system, Unix)
    pub fn discover_config() -> Option<PathBuf> {
        if let Ok(path) = std::env::var("DIAGRAMS_CONFIG_PATH") {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        let cwd = PathBuf::from("./diagrams-config.yaml");
        if cwd.exists() {
            return Some(cwd);
        }

        if let Some(home) = dirs::home_dir() {
            let user_config = home.join(".diagrams").join("config.yaml");
            if user_config.exists() {
                return Some(user_config);
            }
        }

        #[cfg(unix)]
        {
            let system_config = PathBuf::from("/etc/diagrams/config.yaml");
            if system_config.exists() {
                return Some(system_config);
            }
        }

        None
    }

    /// Load configuration with discovery, fallback to default
    pub fn load_or_default(cli_path: Option<PathBuf>) -> anyhow::Result<Self> {
        // Explicit CLI path: fail if missing/invalid
        if let Some(path) = cli_path {
            tracing::info!("Loading configuration from explicit path: {:?}", path);
            let mut config = Self::from_yaml_file(&path)
                .map_err(|e| anyhow::anyhow!("Failed to load config at {:?}: {}", path, e))?;
            config.apply_env_overrides();
            return Ok(config);
        }

        let mut config = match Self::discover_config() {
            Some(config_path) => {
                tracing::info!("Loading configuration from discovered path: {:?}", config_path);
                Self::from_yaml_file(config_path)?
            }
            None => {
                tracing::warn!("No configuration file found in standard locations. Using defaults.");
                Self::default()
            }
        };
        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides to configuration
    pub fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("DIAGRAMS_PUBLIC_BASE_URL") {
            tracing::info!("Environment override: DIAGRAMS_PUBLIC_BASE_URL={}", val);
            self.spec.storage.public_base_url = Some(val);
        }

        if let Ok(val) = std::env::var("DIAGRAMS_STORAGE_PATH") {
            tracing::info!("Environment override: DIAGRAMS_STORAGE_PATH={}", val);
            self.spec.storage.base_path = PathBuf::from(val);
        }

        if let Ok(val) = std::env::var("DIAGRAMS_LEGACY_NOT_FOUND") {
            match val.to_lowercase().as_str() {
                "true" | "1" | "yes" | "on" => self.spec.compat.legacy_not_found_status = true,
                "false" | "0" | "no" | "off" => self.spec.compat.legacy_not_found_status = false,
                _ => {
                    tracing::warn!(
                        "Invalid value for DIAGRAMS_LEGACY_NOT_FOUND: '{}'. Expected true/false. Ignoring.",
                        val
                    );
                }
            }
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.api_version != API_VERSION {
            anyhow::bail!(
                "Invalid apiVersion: '{}'. Must be '{}'",
                self.api_version,
                API_VERSION
            );
        }

        if self.kind != KIND {
            anyhow::bail!("Invalid kind: '{}'. Must be '{}'", self.kind, KIND);
        }

        let tokens = &self.spec.tokens;
        match tokens.backend {
            TokenBackendKind::Memory => {
                if let Some(entry) = tokens
                    .tokens
                    .iter()
                    .find(|t| t.token.trim().is_empty() || t.owner_id.trim().is_empty())
                {
                    anyhow::bail!(
                        "Static token entries need a token and an owner_id (owner '{}')",
                        entry.owner_id
                    );
                }
            }
            TokenBackendKind::File => {
                if tokens.path.is_none() {
                    anyhow::bail!("tokens.path is required for the file token backend");
                }
            }
            TokenBackendKind::Postgres => {
                if tokens.database_url.is_none() {
                    anyhow::bail!("tokens.database_url is required for the postgres token backend");
                }
                if !is_valid_table_name(&tokens.table) {
                    anyhow::bail!("tokens.table '{}' is not a valid table name", tokens.table);
                }
            }
        }

        let storage = &self.spec.storage;
        if storage.backend == StorageBackendKind::SeaweedFS && storage.filer_url.is_none() {
            anyhow::bail!("storage.filer_url is required for the seaweedfs backend");
        }

        let rendering = &self.spec.rendering;
        match rendering.backend {
            RenderingBackendKind::Simulated => {}
            RenderingBackendKind::Command => {
                if rendering.command.as_deref().map_or(true, |c| c.trim().is_empty()) {
                    anyhow::bail!("rendering.command is required for the command backend");
                }
            }
            RenderingBackendKind::Http => {
                if rendering.endpoint.is_none() {
                    anyhow::bail!("rendering.endpoint is required for the http backend");
                }
                if let Some(missing) = DiagramType::ALL
                    .iter()
                    .find(|ty| !rendering.formats.contains_key(ty))
                {
                    anyhow::bail!("rendering.formats has no entry for '{}'", missing);
                }
            }
        }

        match self.spec.observability.log_format.as_str() {
            "compact" | "json" => {}
            other => anyhow::bail!("Invalid observability.log_format: '{}'", other),
        }

        Ok(())
    }
}
