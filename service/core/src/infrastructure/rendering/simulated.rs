// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Placeholder renderer for development and tests.

use async_trait::async_trait;

use crate::domain::diagram::{BackendError, RenderJob, RenderingBackend};

/// PNG file signature
pub const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

/// Produces `PNG_SIGNATURE` followed by `SIMULATED-<TYPE>: <script>`.
///
/// Output is a pure function of the job, which makes stored artifacts easy to
/// assert on. It is not a decodable image.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimulatedRenderingBackend;

#[async_trait]
impl RenderingBackend for SimulatedRenderingBackend {
    async fn render(&self, job: &RenderJob) -> Result<Vec<u8>, BackendError> {
        let mut bytes = PNG_SIGNATURE.to_vec();
        bytes.extend_from_slice(
            format!("SIMULATED-{}: {}", job.diagram_type.as_str().to_uppercase(), job.script).as_bytes(),
        );
        Ok(bytes)
    }

    fn name(&self) -> &'static str {
        "simulated"
    }
}
