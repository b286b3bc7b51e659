//! Engine backed by the `esbuild` executable.
//!
//! Transform runs `esbuild --loader=<tag>` with the source on stdin and the
//! result on stdout. Build runs `esbuild <entries> --bundle --outfile=<path>`,
//! which writes the bundle itself. In both cases diagnostics are recovered
//! from stderr by [`diagnostics::parse`](super::diagnostics::parse).

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};
use std::time::Instant;

use super::diagnostics;
use super::{Engine, EngineOutput, TransformInput};
use crate::error::{BindError, Result};
use crate::message::Message;
use crate::request::BuildOptions;

/// Drives one esbuild executable. Each call spawns a fresh process.
#[derive(Debug, Clone)]
pub struct EsbuildEngine {
    binary: PathBuf,
}

impl EsbuildEngine {
    /// Use the executable at `binary` without checking that it exists.
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    /// Find esbuild: `explicit` if given (resolved through `PATH` when it is
    /// a bare name), otherwise `esbuild` on `PATH`.
    pub fn locate(explicit: Option<&Path>) -> Result<Self> {
        let wanted = explicit.unwrap_or_else(|| Path::new("esbuild"));
        which::which(wanted)
            .map(Self::new)
            .map_err(|e| BindError::EsbuildNotFound(format!("{}: {e}", wanted.display())))
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }

    /// The version string esbuild reports (`esbuild --version`).
    pub fn version(&self) -> Result<String> {
        let output = Command::new(&self.binary).arg("--version").output()?;
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.binary);
        cmd.arg("--log-level=warning").arg("--color=false");
        cmd
    }

    /// Spawn `cmd`, feed `stdin` on a separate thread, and collect output.
    fn run(&self, mut cmd: Command, stdin: Option<&str>) -> std::io::Result<Output> {
        cmd.stdin(if stdin.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        })
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

        let mut child = cmd.spawn()?;
        let pipe = child.stdin.take();
        std::thread::scope(|scope| {
            let writer = match (pipe, stdin) {
                (Some(mut pipe), Some(text)) => {
                    Some(scope.spawn(move || pipe.write_all(text.as_bytes())))
                }
                _ => None,
            };
            let output = child.wait_with_output()?;
            if let Some(writer) = writer {
                // A closed pipe just means esbuild exited early; its stderr says why.
                if let Ok(Err(e)) = writer.join() {
                    tracing::debug!(error = %e, "esbuild stdin write failed");
                }
            }
            Ok(output)
        })
    }

    /// Turn a finished process into messages. A failing exit with nothing
    /// parseable on stderr still produces one error.
    fn collect(&self, output: &Output) -> EngineOutput {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let parsed = diagnostics::parse(&stderr);
        let mut result = EngineOutput {
            code: String::from_utf8_lossy(&output.stdout).into_owned(),
            errors: parsed.errors,
            warnings: parsed.warnings,
        };
        if !output.status.success() && result.errors.is_empty() {
            let detail = stderr.trim();
            result.errors.push(Message::new(if detail.is_empty() {
                format!("esbuild exited with {}", output.status)
            } else {
                detail.to_string()
            }));
        }
        result
    }

    fn spawn_failure(&self, e: &std::io::Error) -> EngineOutput {
        tracing::warn!(binary = %self.binary.display(), error = %e, "failed to run esbuild");
        EngineOutput::error(Message::new(format!("Failed to run esbuild: {e}")))
    }
}

impl Engine for EsbuildEngine {
    fn name(&self) -> &'static str {
        "esbuild"
    }

    fn transform(&self, input: &TransformInput<'_>) -> EngineOutput {
        let mut cmd = self.command();
        cmd.arg(format!("--loader={}", input.loader));
        if let Some(name) = input.sourcefile {
            cmd.arg(format!("--sourcefile={name}"));
        }

        let started = Instant::now();
        let result = match self.run(cmd, Some(input.source)) {
            Ok(output) => self.collect(&output),
            Err(e) => return self.spawn_failure(&e),
        };
        tracing::debug!(
            loader = %input.loader,
            errors = result.errors.len(),
            elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
            "esbuild transform finished"
        );
        result
    }

    fn build(&self, options: &BuildOptions) -> EngineOutput {
        let mut cmd = self.command();
        cmd.args(&options.entry_points)
            .arg("--bundle")
            .arg(format!("--outfile={}", options.outfile));

        let started = Instant::now();
        let mut result = match self.run(cmd, None) {
            Ok(output) => self.collect(&output),
            Err(e) => return self.spawn_failure(&e),
        };
        // The bundle went to disk; stdout carries nothing for the host.
        result.code.clear();
        tracing::debug!(
            entries = options.entry_points.len(),
            errors = result.errors.len(),
            elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
            "esbuild build finished"
        );
        result
    }
}
