// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Diagram Renderer
//!
//! Single dispatch point from a validated [`DiagramSource`] to the rendering
//! backend. Infra and ER sources are passed through as scripts; structured
//! documents are first projected onto a flat skeleton diagram.
//!
//! The renderer never writes to the artifact store.

use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;

use crate::domain::diagram::{DiagramSource, DiagramType, RenderError, RenderJob, RenderingBackend};

/// Label of the synthetic node every structured-document skeleton hangs from.
pub const SKELETON_ROOT: &str = "root";

pub struct DiagramRenderer {
    backend: Arc<dyn RenderingBackend>,
}

impl DiagramRenderer {
    pub fn new(backend: Arc<dyn RenderingBackend>) -> Self {
        Self { backend }
    }

    /// Render `source` into non-empty PNG bytes.
    pub async fn render(&self, source: &DiagramSource) -> Result<Vec<u8>, RenderError> {
        let script = match source.diagram_type {
            DiagramType::InfraDiagram | DiagramType::EntityRelationship => source.content().to_string(),
            DiagramType::StructuredDocument => {
                let document: Value = serde_json::from_str(source.content())
                    .map_err(|e| RenderError::InvalidDocument(e.to_string()))?;
                derive_skeleton(&document)
            }
        };

        let job = RenderJob {
            diagram_type: source.diagram_type,
            script,
        };

        let started = Instant::now();
        let result = self.backend.render(&job).await;
        metrics::histogram!(
            "diagram_render_duration_seconds",
            "type" => source.diagram_type.as_str()
        )
        .record(started.elapsed().as_secs_f64());

        let bytes = result.map_err(|e| {
            tracing::warn!(
                backend = self.backend.name(),
                diagram_type = %source.diagram_type,
                error = %e,
                "Rendering backend failed"
            );
            RenderError::from(e)
        })?;

        if bytes.is_empty() {
            return Err(RenderError::BackendFailure(format!(
                "{} backend returned an empty image",
                self.backend.name()
            )));
        }

        Ok(bytes)
    }
}

/// Project a JSON document onto a Mermaid flowchart: one `root` node with a
/// child per top-level key (objects) or per index (arrays). Scalars yield the
/// root alone. Nested structure is not followed.
pub fn derive_skeleton(document: &Value) -> String {
    let labels: Vec<String> = match document {
        Value::Object(map) => map.keys().cloned().collect(),
        Value::Array(items) => (0..items.len()).map(|i| format!("[{}]", i)).collect(),
        _ => Vec::new(),
    };

    let mut script = format!("graph TD;\n    n0[\"{}\"];\n", SKELETON_ROOT);
    for (i, label) in labels.iter().enumerate() {
        script.push_str(&format!(
            "    n0 --> n{}[\"{}\"];\n",
            i + 1,
            escape_label(label)
        ));
    }
    script
}

// Mermaid labels are quoted: `"` and `#` become entity codes, newlines become spaces.
fn escape_label(label: &str) -> String {
    let mut escaped = String::with_capacity(label.len());
    for c in label.chars() {
        match c {
            '"' => escaped.push_str("#quot;"),
            '#' => escaped.push_str("#35;"),
            '\n' | '\r' => escaped.push(' '),
            c => escaped.push(c),
        }
    }
    escaped
}
