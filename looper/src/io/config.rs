//! Controller configuration stored in `config.toml`.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

use crate::core::types::ProviderKind;

/// Controller configuration (TOML).
///
/// This file is intended to be edited by humans. Missing fields default to
/// the original script's values, and a missing file yields the defaults
/// wholesale so a bare checkout still runs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LoopConfig {
    /// Iteration budget used when `looper run` gets no positional argument.
    pub max_iterations_default: u32,

    /// Wall-clock budget for a single provider invocation, in seconds.
    pub iteration_timeout_secs: u64,

    /// Wall-clock budget for the quality gate, in seconds.
    pub gate_timeout_secs: u64,

    /// Pause between iterations, in seconds.
    pub sleep_between_iterations_secs: u64,

    /// Truncate captured provider/gate output beyond this many bytes.
    pub output_limit_bytes: usize,

    /// How much of the progress log tail to feed into the prompt.
    pub progress_tail_bytes: usize,

    pub llm: LlmConfig,
    pub gate: GateConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LlmConfig {
    /// Backend to use; `auto` probes Ollama, then Claude, then Amp.
    pub provider: ProviderKind,
    pub model: String,
    /// Claude API key; falls back to `ANTHROPIC_API_KEY` when empty.
    pub api_key: String,
    pub ollama_url: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct GateConfig {
    /// Quality-gate command (e.g. `["just", "ci"]`). Empty means no gate:
    /// completion claims are accepted without checks.
    pub command: Vec<String>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: ProviderKind::Auto,
            model: "llama3.1".to_string(),
            api_key: String::new(),
            ollama_url: "http://localhost:11434".to_string(),
        }
    }
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            max_iterations_default: 10,
            iteration_timeout_secs: 30 * 60,
            gate_timeout_secs: 30 * 60,
            sleep_between_iterations_secs: 2,
            output_limit_bytes: 1_000_000,
            progress_tail_bytes: 8_000,
            llm: LlmConfig::default(),
            gate: GateConfig::default(),
        }
    }
}

impl LoopConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_iterations_default == 0 {
            return Err(anyhow!("max_iterations_default must be > 0"));
        }
        if self.iteration_timeout_secs == 0 {
            return Err(anyhow!("iteration_timeout_secs must be > 0"));
        }
        if self.gate_timeout_secs == 0 {
            return Err(anyhow!("gate_timeout_secs must be > 0"));
        }
        if self.output_limit_bytes == 0 {
            return Err(anyhow!("output_limit_bytes must be > 0"));
        }
        if self.progress_tail_bytes == 0 {
            return Err(anyhow!("progress_tail_bytes must be > 0"));
        }
        if self.llm.model.trim().is_empty() {
            return Err(anyhow!("llm.model must be non-empty"));
        }
        if self.llm.ollama_url.trim().is_empty() {
            return Err(anyhow!("llm.ollama_url must be non-empty"));
        }
        if let Some(program) = self.gate.command.first()
            && program.trim().is_empty()
        {
            return Err(anyhow!("gate.command must start with a program name"));
        }
        Ok(())
    }
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `LoopConfig::default()`.
pub fn load_config(path: &Path) -> Result<LoopConfig> {
    if !path.exists() {
        let cfg = LoopConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: LoopConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()?;
    Ok(cfg)
}

/// Atomically write config to disk (temp file + rename).
pub fn write_config(path: &Path, cfg: &LoopConfig) -> Result<()> {
    cfg.validate()?;
    let mut buf = toml::to_string_pretty(cfg).context("serialize config toml")?;
    buf.push('\n');
    write_atomic(path, &buf)
}

fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let parent = path
        .parent()
        .with_context(|| format!("config path missing parent {}", path.display()))?;
    fs::create_dir_all(parent).with_context(|| format!("create directory {}", parent.display()))?;
    let tmp_path = path.with_extension("toml.tmp");
    fs::write(&tmp_path, contents)
        .with_context(|| format!("write temp config {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path).with_context(|| format!("replace config {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_missing_returns_default() {
        let temp = tempfile::tempdir().expect("tempdir");
        let cfg = load_config(&temp.path().join("missing.toml")).expect("load");
        assert_eq!(cfg, LoopConfig::default());
    }

    #[test]
    fn write_then_load_round_trips() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("config.toml");
        let mut cfg = LoopConfig::default();
        cfg.llm.provider = ProviderKind::Amp;
        cfg.gate.command = vec!["just".to_string(), "ci".to_string()];
        write_config(&path, &cfg).expect("write");
        let loaded = load_config(&path).expect("load");
        assert_eq!(loaded, cfg);
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("config.toml");
        fs::write(&path, "[llm]\nprovider = \"claude\"\nmodel = \"claude-sonnet-4-5\"\n")
            .expect("write partial");

        let cfg = load_config(&path).expect("load");
        assert_eq!(cfg.llm.provider, ProviderKind::Claude);
        assert_eq!(cfg.llm.model, "claude-sonnet-4-5");
        assert_eq!(
            cfg.iteration_timeout_secs,
            LoopConfig::default().iteration_timeout_secs
        );
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let cfg = LoopConfig {
            iteration_timeout_secs: 0,
            ..LoopConfig::default()
        };
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("iteration_timeout_secs"));
    }
}
