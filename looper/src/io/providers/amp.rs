//! Amp backend: the `amp` CLI driven over stdin.

use std::process::Command;

use anyhow::{Result, bail};
use tracing::instrument;

use crate::io::process::run_command_with_timeout;
use crate::io::provider::{ChatRequest, Provider};
use crate::io::providers::clamp_output;

/// Backend that spawns the `amp` CLI once per iteration.
pub struct AmpProvider;

impl Provider for AmpProvider {
    fn name(&self) -> &'static str {
        "amp"
    }

    #[instrument(skip_all)]
    fn chat(&self, request: &ChatRequest) -> Result<String> {
        let mut cmd = Command::new("amp");
        cmd.arg("--dangerously-allow-all");

        let output = run_command_with_timeout(
            cmd,
            Some(request.prompt.as_bytes()),
            request.timeout,
            request.output_limit_bytes,
        )?;

        if output.timed_out {
            bail!("amp timed out after {:?}", request.timeout);
        }

        // The agent writes to both streams; the exit status carries no
        // signal, so the combined text is returned either way.
        let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
        text.push_str(&String::from_utf8_lossy(&output.stderr));
        Ok(clamp_output(text, request.output_limit_bytes))
    }
}
