//! Shared deterministic types for controller core logic.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Agent backend selected for a run.
///
/// `Auto` is only valid in configuration; it resolves to a concrete kind
/// during provider detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Auto,
    Ollama,
    Claude,
    Amp,
}

impl ProviderKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ProviderKind::Auto => "auto",
            ProviderKind::Ollama => "ollama",
            ProviderKind::Claude => "claude",
            ProviderKind::Amp => "amp",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of running the quality gate after a story-completion claim.
///
/// `Fail` is also used when the controller cannot complete the gate phase
/// (timeout), i.e. the claimed story must not be marked passed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GateOutcome {
    /// Gate command completed successfully.
    Pass,
    /// Gate command failed or timed out.
    Fail,
    /// No gate command is configured; completion claims are accepted as-is.
    Skipped,
}

impl GateOutcome {
    /// True when a completion claim may be applied to the task list.
    pub fn accepts_completion(self) -> bool {
        matches!(self, GateOutcome::Pass | GateOutcome::Skipped)
    }
}
