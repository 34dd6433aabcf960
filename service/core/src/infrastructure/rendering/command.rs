// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Command Rendering Backend
//!
//! Runs a local renderer once per job. The script is written to the child's
//! stdin and the PNG is read back from stdout. Any `{type}` placeholder in the
//! configured arguments is replaced by the diagram's wire name, so a single
//! wrapper script can dispatch on family.
//!
//! The child is killed if it outlives the configured timeout.

use async_trait::async_trait;
use std::io::ErrorKind;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use crate::domain::diagram::{BackendError, RenderJob, RenderingBackend};

const TYPE_PLACEHOLDER: &str = "{type}";

pub struct CommandRenderingBackend {
    program: String,
    args: Vec<String>,
    timeout: Duration,
}

impl CommandRenderingBackend {
    pub fn new(program: impl Into<String>, args: Vec<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            args,
            timeout,
        }
    }

    fn args_for(&self, job: &RenderJob) -> Vec<String> {
        self.args
            .iter()
            .map(|arg| arg.replace(TYPE_PLACEHOLDER, job.diagram_type.as_str()))
            .collect()
    }

    async fn run(&self, job: &RenderJob) -> Result<Vec<u8>, BackendError> {
        let mut child = Command::new(&self.program)
            .args(self.args_for(job))
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| BackendError::Process(format!("Failed to spawn {}: {}", self.program, e)))?;

        // Feed stdin while stdout is drained, so neither side can fill a pipe
        // and block the other.
        let stdin = child.stdin.take();
        let script = job.script.as_bytes();
        let feed = async move {
            if let Some(mut stdin) = stdin {
                match stdin.write_all(script).await {
                    // The renderer stopped reading early; its exit status decides.
                    Err(e) if e.kind() == ErrorKind::BrokenPipe => {}
                    other => other?,
                }
            }
            Ok::<_, std::io::Error>(())
        };

        let (fed, output) = tokio::join!(feed, child.wait_with_output());
        let output = output.map_err(|e| BackendError::Process(e.to_string()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(BackendError::Process(format!(
                "{} exited with {}: {}",
                self.program,
                output.status,
                stderr.trim()
            )));
        }

        fed.map_err(|e| BackendError::Process(format!("Failed to write script: {}", e)))?;

        Ok(output.stdout)
    }
}

#[async_trait]
impl RenderingBackend for CommandRenderingBackend {
    async fn render(&self, job: &RenderJob) -> Result<Vec<u8>, BackendError> {
        match tokio::time::timeout(self.timeout, self.run(job)).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(program = %self.program, timeout_secs = self.timeout.as_secs(), "Renderer timed out");
                Err(BackendError::Timeout(self.timeout.as_secs()))
            }
        }
    }

    fn name(&self) -> &'static str {
        "command"
    }
}
