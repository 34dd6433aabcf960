// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Rendering Infrastructure Module
//!
//! Concrete implementations of the RenderingBackend trait.

pub mod command;
pub mod http;
pub mod simulated;

pub use command::CommandRenderingBackend;
pub use http::HttpRenderingBackend;
pub use simulated::SimulatedRenderingBackend;

use anyhow::Context;
use std::sync::Arc;
use std::time::Duration;

use crate::domain::diagram::RenderingBackend;
use crate::domain::service_config::{RenderingBackendKind, RenderingConfig};

/// Factory function to create a rendering backend from configuration
pub fn create_rendering_backend(config: &RenderingConfig) -> anyhow::Result<Arc<dyn RenderingBackend>> {
    let timeout = Duration::from_secs(config.timeout_secs);

    match config.backend {
        RenderingBackendKind::Simulated => {
            tracing::warn!("Using simulated rendering backend; images are placeholders");
            Ok(Arc::new(SimulatedRenderingBackend))
        }
        RenderingBackendKind::Command => {
            let program = config
                .command
                .clone()
                .context("rendering.command is required for the command backend")?;
            tracing::info!(command = %program, "Using command rendering backend");
            Ok(Arc::new(CommandRenderingBackend::new(program, config.args.clone(), timeout)))
        }
        RenderingBackendKind::Http => {
            let endpoint = config
                .endpoint
                .clone()
                .context("rendering.endpoint is required for the http backend")?;
            tracing::info!(endpoint = %endpoint, "Using HTTP rendering backend");
            let backend = HttpRenderingBackend::new(endpoint, config.formats.clone(), timeout)
                .context("Failed to create HTTP rendering client")?;
            Ok(Arc::new(backend))
        }
    }
}
