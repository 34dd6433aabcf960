// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Configuration management commands
//!
//! Commands: show, validate, generate

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;
use std::path::PathBuf;

use diagram_service_core::domain::diagram::DiagramType;
use diagram_service_core::domain::service_config::{
    RenderingBackendKind, ServiceConfigManifest, StorageBackendKind, TokenBackendKind,
};

const MINIMAL_TEMPLATE: &str = include_str!("../../templates/config-minimal.yaml");
const EXAMPLES_TEMPLATE: &str = include_str!("../../templates/config-with-examples.yaml");

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Show config file paths checked
        #[arg(long)]
        paths: bool,

        /// Print the effective manifest as YAML
        #[arg(long)]
        yaml: bool,
    },

    /// Validate configuration file
    Validate {
        /// Path to config file (default: discover)
        #[arg(value_name = "FILE")]
        file: Option<PathBuf>,
    },

    /// Generate sample configuration
    Generate {
        /// Output path (default: ./diagrams-config.yaml)
        #[arg(short, long, default_value = "./diagrams-config.yaml")]
        output: PathBuf,

        /// Include examples and comments
        #[arg(long)]
        examples: bool,
    },
}

pub async fn handle_command(command: ConfigCommand, config_override: Option<PathBuf>) -> Result<()> {
    match command {
        ConfigCommand::Show { paths, yaml } => show(config_override, paths, yaml).await,
        ConfigCommand::Validate { file } => validate(file.or(config_override)).await,
        ConfigCommand::Generate { output, examples } => generate(output, examples).await,
    }
}

async fn show(config_override: Option<PathBuf>, show_paths: bool, as_yaml: bool) -> Result<()> {
    let config = ServiceConfigManifest::load_or_default(config_override.clone())
        .context("Failed to load configuration")?;

    if as_yaml {
        print!("{}", config.to_yaml_string()?);
        return Ok(());
    }

    if show_paths {
        println!("{}", "Configuration discovery paths:".bold());
        if let Some(path) = &config_override {
            println!("  1. --config flag: {}", path.display());
        } else {
            println!("  1. --config flag: {}", "(not set)".dimmed());
        }
        println!(
            "  2. DIAGRAMS_CONFIG_PATH: {}",
            std::env::var("DIAGRAMS_CONFIG_PATH")
                .unwrap_or_else(|_| "(not set)".to_string())
                .dimmed()
        );
        println!("  3. ./diagrams-config.yaml");
        println!("  4. ~/.diagrams/config.yaml");
        println!("  5. /etc/diagrams/config.yaml");
        println!();
    }

    let spec = &config.spec;

    println!("{}", "Current configuration:".bold());
    println!("  Name: {}", config.metadata.name);
    println!(
        "  Listen: {}:{}",
        spec.server.bind_address, spec.server.port
    );
    println!();

    println!("{}", "Token Store:".bold());
    match spec.tokens.backend {
        TokenBackendKind::Memory => println!("  Backend: memory ({} static tokens)", spec.tokens.tokens.len()),
        TokenBackendKind::File => println!(
            "  Backend: file ({})",
            spec.tokens
                .path
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "(path not set)".to_string())
        ),
        TokenBackendKind::Postgres => println!("  Backend: postgres (table {})", spec.tokens.table),
    }
    println!();

    println!("{}", "Artifact Store:".bold());
    match spec.storage.backend {
        StorageBackendKind::Memory => println!("  Backend: memory"),
        StorageBackendKind::Local => println!("  Backend: local ({})", spec.storage.base_path.display()),
        StorageBackendKind::SeaweedFS => println!(
            "  Backend: seaweedfs ({}/{})",
            spec.storage.filer_url.as_deref().unwrap_or("(filer_url not set)"),
            spec.storage.bucket
        ),
    }
    println!(
        "  Public base URL: {}",
        spec.storage.public_base_url.as_deref().unwrap_or("(none, artifact:// locators)")
    );
    println!();

    println!("{}", "Rendering:".bold());
    match spec.rendering.backend {
        RenderingBackendKind::Simulated => println!("  Backend: simulated"),
        RenderingBackendKind::Command => println!(
            "  Backend: command ({} {})",
            spec.rendering.command.as_deref().unwrap_or("(command not set)"),
            spec.rendering.args.join(" ")
        ),
        RenderingBackendKind::Http => {
            println!(
                "  Backend: http ({})",
                spec.rendering.endpoint.as_deref().unwrap_or("(endpoint not set)")
            );
            for ty in DiagramType::ALL {
                if let Some(format) = spec.rendering.formats.get(&ty) {
                    println!("    {} → {}", ty, format);
                }
            }
        }
    }
    println!("  Timeout: {}s", spec.rendering.timeout_secs);
    println!();

    if spec.compat.legacy_not_found_status {
        println!("{}", "Compatibility:".bold());
        println!("  Missing artifacts answer 500 (legacy)");
        println!();
    }

    Ok(())
}

async fn validate(config_path: Option<PathBuf>) -> Result<()> {
    println!("Validating configuration...");

    let config = ServiceConfigManifest::load_or_default(config_path)
        .context("Failed to load configuration")?;

    config
        .validate()
        .context("Configuration validation failed")?;

    println!("{}", "✓ Configuration is valid".green());

    Ok(())
}

async fn generate(output: PathBuf, with_examples: bool) -> Result<()> {
    let sample = if with_examples {
        EXAMPLES_TEMPLATE
    } else {
        MINIMAL_TEMPLATE
    };

    std::fs::write(&output, sample)
        .with_context(|| format!("Failed to write config to {:?}", output))?;

    println!(
        "{}",
        format!("✓ Configuration generated: {}", output.display()).green()
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_templates_are_valid_manifests() {
        for template in [MINIMAL_TEMPLATE, EXAMPLES_TEMPLATE] {
            let config = ServiceConfigManifest::from_yaml_str(template).unwrap();
            config.validate().unwrap();
        }
    }

    #[tokio::test]
    async fn test_generate_then_validate() {
        let dir = tempfile::TempDir::new().unwrap();
        let output = dir.path().join("diagrams-config.yaml");

        generate(output.clone(), true).await.unwrap();
        validate(Some(output)).await.unwrap();
    }
}
