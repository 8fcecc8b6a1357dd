//! Provider abstraction and backend auto-detection.
//!
//! The [`Provider`] trait decouples loop orchestration from the actual
//! agent backend (a local Ollama server, the Claude Messages API, or the
//! `amp` CLI). Tests use scripted providers that return predetermined
//! outputs without network or process calls.
//!
//! Detection probes in fixed priority order: a reachable Ollama server
//! that serves the configured model, then a Claude API key, then an `amp`
//! executable on `PATH`.

use std::env;
use std::ffi::OsStr;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Result, bail};
use tracing::{debug, info, instrument};

use crate::core::types::ProviderKind;
use crate::io::config::LlmConfig;
use crate::io::providers::{amp::AmpProvider, claude::ClaudeProvider, ollama::OllamaProvider};

/// How long a detection probe may take before the backend is considered
/// unavailable.
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(2);

/// Parameters for a single provider invocation.
#[derive(Debug, Clone)]
pub struct ChatRequest {
    /// Rendered prompt text to feed to the agent.
    pub prompt: String,
    /// Maximum time to wait for the invocation to complete.
    pub timeout: Duration,
    /// Truncate captured output beyond this many bytes.
    pub output_limit_bytes: usize,
}

/// Abstraction over agent backends. One call is one iteration.
pub trait Provider {
    fn name(&self) -> &'static str;
    /// Send the prompt and return the agent's textual output.
    fn chat(&self, request: &ChatRequest) -> Result<String>;
}

/// Resolve the backend to use for this run.
///
/// A concrete `provider` in config wins; `auto` probes in priority order.
#[instrument(skip_all)]
pub fn detect_provider(cfg: &LlmConfig) -> Result<ProviderKind> {
    if cfg.provider != ProviderKind::Auto {
        debug!(provider = %cfg.provider, "provider pinned by config");
        return Ok(cfg.provider);
    }

    if ollama_model_available(&cfg.ollama_url, &cfg.model) {
        info!(url = %cfg.ollama_url, "detected ollama");
        return Ok(ProviderKind::Ollama);
    }
    if resolve_api_key(cfg).is_some() {
        info!("detected claude api key");
        return Ok(ProviderKind::Claude);
    }
    if find_in_path("amp").is_some() {
        info!("detected amp on PATH");
        return Ok(ProviderKind::Amp);
    }

    bail!(
        "no agent backend available: Ollama is unreachable at {} (or lacks model '{}'), \
         no Claude API key is configured (set ANTHROPIC_API_KEY or llm.api_key), \
         and `amp` is not on PATH",
        cfg.ollama_url,
        cfg.model
    )
}

/// Construct the backend for a resolved provider kind.
pub fn build_provider(kind: ProviderKind, cfg: &LlmConfig) -> Result<Box<dyn Provider>> {
    match kind {
        ProviderKind::Auto => bail!("provider must be resolved before construction"),
        ProviderKind::Ollama => Ok(Box::new(OllamaProvider::new(
            cfg.ollama_url.clone(),
            cfg.model.clone(),
        )?)),
        ProviderKind::Claude => {
            let api_key = resolve_api_key(cfg).ok_or_else(|| {
                anyhow::anyhow!(
                    "claude provider selected but no API key configured \
                     (set ANTHROPIC_API_KEY or llm.api_key)"
                )
            })?;
            Ok(Box::new(ClaudeProvider::new(api_key, cfg.model.clone())?))
        }
        ProviderKind::Amp => Ok(Box::new(AmpProvider)),
    }
}

/// Configured key first, `ANTHROPIC_API_KEY` as fallback.
pub fn resolve_api_key(cfg: &LlmConfig) -> Option<String> {
    if !cfg.api_key.trim().is_empty() {
        return Some(cfg.api_key.clone());
    }
    env::var("ANTHROPIC_API_KEY")
        .ok()
        .filter(|key| !key.trim().is_empty())
}

fn ollama_model_available(url: &str, model: &str) -> bool {
    match crate::io::providers::ollama::list_models(url, PROBE_TIMEOUT) {
        Ok(models) => model_available(&models, model),
        Err(err) => {
            debug!(err = %err, "ollama probe failed");
            false
        }
    }
}

/// True when the served model list covers `wanted`: an exact match, the
/// `:latest` suffix, or any `wanted:tag` variant.
pub(crate) fn model_available(models: &[String], wanted: &str) -> bool {
    models.iter().any(|name| {
        name == wanted
            || *name == format!("{wanted}:latest")
            || name.starts_with(&format!("{wanted}:"))
    })
}

/// Locate an executable on `PATH`, like `which`.
pub fn find_in_path(name: &str) -> Option<PathBuf> {
    find_in_path_var(name, &env::var_os("PATH")?)
}

fn find_in_path_var(name: &str, path_var: &OsStr) -> Option<PathBuf> {
    env::split_paths(path_var)
        .map(|dir| dir.join(name))
        .find(|candidate| candidate.is_file())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn models(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| (*n).to_string()).collect()
    }

    #[test]
    fn model_matching_accepts_tag_variants() {
        let served = models(&["llama3.1:latest", "qwen2:7b"]);
        assert!(model_available(&served, "llama3.1"));
        assert!(model_available(&served, "llama3.1:latest"));
        assert!(model_available(&served, "qwen2"));
        assert!(!model_available(&served, "llama3"));
        assert!(!model_available(&served, "mistral"));
    }

    #[test]
    fn find_in_path_var_scans_directories_in_order() {
        let temp = tempfile::tempdir().expect("tempdir");
        let bin = temp.path().join("amp");
        std::fs::write(&bin, "#!/bin/sh\n").expect("write");

        let path_var = env::join_paths([temp.path().to_path_buf(), PathBuf::from("/nonexistent")])
            .expect("join paths");
        assert_eq!(find_in_path_var("amp", &path_var), Some(bin));
        assert!(find_in_path_var("missing", &path_var).is_none());
    }

    #[test]
    fn pinned_provider_skips_probing() {
        let cfg = LlmConfig {
            provider: ProviderKind::Amp,
            ..LlmConfig::default()
        };
        assert_eq!(detect_provider(&cfg).expect("detect"), ProviderKind::Amp);
    }

    #[test]
    fn configured_key_wins_over_environment() {
        let cfg = LlmConfig {
            api_key: "sk-config".to_string(),
            ..LlmConfig::default()
        };
        assert_eq!(resolve_api_key(&cfg).as_deref(), Some("sk-config"));
    }
}
