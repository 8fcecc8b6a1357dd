//! Quality-gate runner.
//!
//! The gate is an opaque subprocess (type checks, a test suite, `just ci`)
//! configured by the operator. The controller only looks at the exit
//! status; the captured output is kept so failures can be fed back into
//! the progress notes.

use std::path::PathBuf;
use std::process::Command;
use std::time::Duration;

use anyhow::Result;
use tracing::{debug, instrument};

use crate::core::types::GateOutcome;
use crate::io::process::run_command_with_timeout;

/// Parameters for a gate invocation.
#[derive(Debug, Clone)]
pub struct GateRequest {
    /// Working directory for the gate process.
    pub workdir: PathBuf,
    /// Maximum time to wait for the gate to complete.
    pub timeout: Duration,
    /// Truncate captured gate output beyond this many bytes.
    pub output_limit_bytes: usize,
}

/// Outcome plus captured output of one gate invocation.
#[derive(Debug, Clone)]
pub struct GateReport {
    pub outcome: GateOutcome,
    pub log: String,
}

/// Abstraction over gate execution. Tests use scripted runners that return
/// predetermined outcomes without spawning processes.
pub trait GateRunner {
    fn run(&self, request: &GateRequest) -> Result<GateReport>;
}

/// Gate runner that spawns the configured command.
pub struct CommandGateRunner {
    command: Vec<String>,
}

impl CommandGateRunner {
    pub fn new(command: Vec<String>) -> Self {
        Self { command }
    }
}

impl GateRunner for CommandGateRunner {
    #[instrument(skip_all, fields(timeout_secs = request.timeout.as_secs()))]
    fn run(&self, request: &GateRequest) -> Result<GateReport> {
        let Some((program, args)) = self.command.split_first() else {
            debug!("no gate command configured, skipping");
            return Ok(GateReport {
                outcome: GateOutcome::Skipped,
                log: String::new(),
            });
        };

        let mut cmd = Command::new(program);
        cmd.args(args).current_dir(&request.workdir);
        let output = run_command_with_timeout(
            cmd,
            None,
            request.timeout,
            request.output_limit_bytes,
        )?;

        let mut log = format!(
            "=== stdout ===\n{}\n=== stderr ===\n{}",
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        );

        if output.timed_out {
            log.push_str("\n[gate timed out]");
            return Ok(GateReport {
                outcome: GateOutcome::Fail,
                log,
            });
        }

        let outcome = if output.status.success() {
            GateOutcome::Pass
        } else {
            GateOutcome::Fail
        };
        debug!(?outcome, "gate finished");
        Ok(GateReport { outcome, log })
    }
}
