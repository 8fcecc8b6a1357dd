//! Test-only fixtures: scripted provider/gate doubles and a git-backed
//! workspace with a seeded task list.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::path::Path;
use std::process::Command;

use anyhow::{Context, Result, bail, ensure};

use crate::core::prd::{Prd, UserStory};
use crate::core::types::GateOutcome;
use crate::io::config::{LoopConfig, write_config};
use crate::io::gate::{GateReport, GateRequest, GateRunner};
use crate::io::prd_store::{load_prd, write_prd};
use crate::io::provider::{ChatRequest, Provider};

/// Create a deterministic story with default text fields.
pub fn story(id: &str, priority: u32, passes: bool) -> UserStory {
    UserStory {
        id: id.to_string(),
        title: format!("{id} title"),
        description: format!("{id} description"),
        acceptance_criteria: Vec::new(),
        priority,
        passes,
    }
}

/// Two-story task list on the given feature branch.
pub fn sample_prd(branch: &str) -> Prd {
    Prd {
        project: "fixture".to_string(),
        branch_name: branch.to_string(),
        user_stories: vec![story("US-001", 1, false), story("US-002", 2, false)],
    }
}

/// Config suitable for tests: no sleeping, no gate command.
pub fn test_config() -> LoopConfig {
    LoopConfig {
        sleep_between_iterations_secs: 0,
        ..LoopConfig::default()
    }
}

/// Provider double that replays a fixed sequence of outputs.
pub struct ScriptedProvider {
    outputs: RefCell<VecDeque<String>>,
}

impl ScriptedProvider {
    pub fn new<I, S>(outputs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            outputs: RefCell::new(outputs.into_iter().map(Into::into).collect()),
        }
    }
}

impl Provider for ScriptedProvider {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn chat(&self, _request: &ChatRequest) -> Result<String> {
        match self.outputs.borrow_mut().pop_front() {
            Some(output) => Ok(output),
            None => bail!("scripted provider has no outputs left"),
        }
    }
}

/// Gate double that replays a fixed sequence of outcomes.
pub struct ScriptedGate {
    outcomes: RefCell<VecDeque<GateOutcome>>,
}

impl ScriptedGate {
    pub fn new<I: IntoIterator<Item = GateOutcome>>(outcomes: I) -> Self {
        Self {
            outcomes: RefCell::new(outcomes.into_iter().collect()),
        }
    }
}

impl GateRunner for ScriptedGate {
    fn run(&self, _request: &GateRequest) -> Result<GateReport> {
        match self.outcomes.borrow_mut().pop_front() {
            Some(outcome) => Ok(GateReport {
                outcome,
                log: "scripted gate".to_string(),
            }),
            None => bail!("scripted gate has no outcomes left"),
        }
    }
}

/// Temporary git repository seeded with a task list and test config.
pub struct TestRepo {
    temp: tempfile::TempDir,
}

impl TestRepo {
    pub fn new() -> Result<Self> {
        let temp = tempfile::tempdir().context("create tempdir")?;
        let repo = Self { temp };

        repo.git(&["init"])?;
        repo.git(&["config", "user.email", "fixture@example.com"])?;
        repo.git(&["config", "user.name", "Fixture"])?;

        write_prd(&repo.root().join("prd.json"), &sample_prd("feature/fixture"))?;
        write_config(&repo.root().join("config.toml"), &test_config())?;

        repo.git(&["add", "-A"])?;
        repo.git(&["commit", "-m", "chore: seed fixture"])?;
        Ok(repo)
    }

    pub fn root(&self) -> &Path {
        self.temp.path()
    }

    pub fn read_prd(&self) -> Result<Prd> {
        load_prd(&self.root().join("prd.json"))
    }

    pub fn write_prd(&self, prd: &Prd) -> Result<()> {
        write_prd(&self.root().join("prd.json"), prd)
    }

    /// Run a git command in the repo, asserting success.
    pub fn git(&self, args: &[&str]) -> Result<()> {
        let status = Command::new("git")
            .args(args)
            .current_dir(self.root())
            .output()
            .with_context(|| format!("spawn git {}", args.join(" ")))?;
        ensure!(
            status.status.success(),
            "git {} failed: {}",
            args.join(" "),
            String::from_utf8_lossy(&status.stderr).trim()
        );
        Ok(())
    }

    /// Capture a git command's stdout.
    pub fn git_capture(&self, args: &[&str]) -> Result<String> {
        let output = Command::new("git")
            .args(args)
            .current_dir(self.root())
            .output()
            .with_context(|| format!("spawn git {}", args.join(" ")))?;
        ensure!(
            output.status.success(),
            "git {} failed: {}",
            args.join(" "),
            String::from_utf8_lossy(&output.stderr).trim()
        );
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}
