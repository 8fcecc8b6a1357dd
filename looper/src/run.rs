//! Orchestration for the `looper run` loop.
//!
//! One iteration: reload the task list, select the next open story, render
//! the prompt, invoke the provider once, scan the output for completion
//! markers, gate and apply any claims, note progress. The loop is a
//! bounded retry: an iteration error is recorded and the next iteration
//! proceeds, because the agent frequently recovers on its own.

use std::path::Path;
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Local;
use tracing::{info, instrument, warn};

use crate::core::marker::{completed_story_ids, contains_run_complete};
use crate::core::prd::summarize_stories;
use crate::core::selector::next_open_story;
use crate::core::types::GateOutcome;
use crate::io::archive::{archive_previous_run, track_current_branch};
use crate::io::config::LoopConfig;
use crate::io::gate::{GateRequest, GateRunner};
use crate::io::git::{Git, ensure_run_branch};
use crate::io::init::LoopPaths;
use crate::io::prd_store::{load_prd, write_prd};
use crate::io::progress::{append_note, init_progress, read_tail, tail_str};
use crate::io::prompt::{PromptInputs, render_iteration};
use crate::io::provider::{ChatRequest, Provider};

/// How much of a failing gate log is fed back into the progress notes.
const GATE_NOTE_LIMIT_BYTES: usize = 2_000;

/// Reason why the loop stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunStop {
    /// Every story passes, or the agent printed the run-complete promise.
    Complete,
    /// The iteration budget ran out with stories still open.
    BudgetExhausted { max_iterations: u32 },
}

/// Summary of a loop invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOutcome {
    pub iterations_run: u32,
    pub stop: RunStop,
}

/// What happened in one successful iteration.
#[derive(Debug, Clone)]
pub struct IterationReport {
    /// Iteration number (1-indexed).
    pub iter: u32,
    /// Story the prompt was built for.
    pub story_id: String,
    /// Raw agent output.
    pub output: String,
    /// Stories marked passed this iteration (gated claims only).
    pub completed: Vec<String>,
    /// Gate outcome, when the output carried completion claims.
    pub gate: Option<GateOutcome>,
    /// The agent printed the run-complete promise.
    pub run_complete: bool,
}

enum IterationOutcome {
    /// No open story remained when the iteration started.
    AllPassed,
    Ran(IterationReport),
}

/// Run the loop until every story passes or `max_iterations` is reached.
///
/// Setup happens once: archive a prior run if the feature branch changed,
/// record the current branch, make sure the progress log and the feature
/// branch exist. Setup errors abort the run; per-iteration errors do not.
#[instrument(skip_all, fields(max_iterations))]
pub fn run_loop<P, G, F>(
    root: &Path,
    provider: &P,
    gate_runner: &G,
    cfg: &LoopConfig,
    max_iterations: u32,
    mut on_iteration: F,
) -> Result<RunOutcome>
where
    P: Provider + ?Sized,
    G: GateRunner,
    F: FnMut(&IterationReport),
{
    let paths = LoopPaths::new(root);

    archive_previous_run(&paths)?;
    track_current_branch(&paths)?;
    if !paths.progress_path.exists() {
        init_progress(&paths.progress_path)?;
    }

    let prd = load_prd(&paths.prd_path)?;
    let git = Git::new(root);
    ensure_run_branch(&git, &prd.branch_name)?;
    info!(provider = provider.name(), branch = %prd.branch_name, "loop starting");

    let mut iterations_run = 0u32;
    for iter in 1..=max_iterations {
        match run_iteration(&paths, provider, gate_runner, cfg, &git, iter) {
            Ok(IterationOutcome::AllPassed) => {
                return Ok(RunOutcome {
                    iterations_run,
                    stop: RunStop::Complete,
                });
            }
            Ok(IterationOutcome::Ran(report)) => {
                iterations_run += 1;
                let run_complete = report.run_complete;
                on_iteration(&report);
                if run_complete {
                    return Ok(RunOutcome {
                        iterations_run,
                        stop: RunStop::Complete,
                    });
                }
            }
            Err(err) => {
                iterations_run += 1;
                warn!(iter, err = %err, "iteration failed");
                append_note(
                    &paths.progress_path,
                    &format!("iteration {iter} failed: {err:#}"),
                )?;
            }
        }

        if iter < max_iterations && cfg.sleep_between_iterations_secs > 0 {
            thread::sleep(Duration::from_secs(cfg.sleep_between_iterations_secs));
        }
    }

    // One last check: the final iteration may have closed the last story.
    let prd = load_prd(&paths.prd_path)?;
    if next_open_story(&prd).is_none() {
        return Ok(RunOutcome {
            iterations_run,
            stop: RunStop::Complete,
        });
    }

    Ok(RunOutcome {
        iterations_run,
        stop: RunStop::BudgetExhausted { max_iterations },
    })
}

fn run_iteration<P, G>(
    paths: &LoopPaths,
    provider: &P,
    gate_runner: &G,
    cfg: &LoopConfig,
    git: &Git,
    iter: u32,
) -> Result<IterationOutcome>
where
    P: Provider + ?Sized,
    G: GateRunner,
{
    // Reload every iteration: the agent is allowed to rewrite the task list.
    let prd = load_prd(&paths.prd_path)?;
    let Some(story) = next_open_story(&prd) else {
        return Ok(IterationOutcome::AllPassed);
    };
    let story = story.clone();

    let prompt = render_iteration(&PromptInputs {
        project: prd.project.clone(),
        branch: prd.branch_name.clone(),
        story: story.clone(),
        summary: summarize_stories(&prd),
        progress_tail: read_tail(&paths.progress_path, cfg.progress_tail_bytes)?,
    })?;

    let output = provider
        .chat(&ChatRequest {
            prompt,
            timeout: Duration::from_secs(cfg.iteration_timeout_secs),
            output_limit_bytes: cfg.output_limit_bytes,
        })
        .with_context(|| format!("invoke {} provider", provider.name()))?;

    let run_complete = contains_run_complete(&output);

    // Claims only count against stories that are currently open; the agent
    // may have updated the task list itself during the invocation.
    let current = load_prd(&paths.prd_path)?;
    let claimed: Vec<String> = completed_story_ids(&output)
        .into_iter()
        .filter(|id| current.story(id).is_some_and(|s| !s.passes))
        .collect();

    let mut note = format!(
        "\n## iteration {iter}: {} ({})",
        story.id,
        Local::now().format("%Y-%m-%d %H:%M:%S")
    );

    let mut gate = None;
    let mut completed = Vec::new();
    if !claimed.is_empty() {
        let report = gate_runner.run(&GateRequest {
            workdir: paths.root.clone(),
            timeout: Duration::from_secs(cfg.gate_timeout_secs),
            output_limit_bytes: cfg.output_limit_bytes,
        })?;
        gate = Some(report.outcome);

        if report.outcome.accepts_completion() {
            let mut updated = current;
            updated.mark_passed(&claimed);
            write_prd(&paths.prd_path, &updated)?;
            note.push_str(&format!("\ncompleted: {}", claimed.join(", ")));

            git.add_all()?;
            git.commit_staged(&format!("feat: complete {}", claimed.join(", ")))?;
            completed = claimed;
        } else {
            note.push_str(&format!(
                "\ngate failed for {}; stories left open\n{}",
                claimed.join(", "),
                tail_str(&report.log, GATE_NOTE_LIMIT_BYTES)
            ));
        }
    }

    if run_complete {
        note.push_str("\nagent declared the run complete");
    }
    append_note(&paths.progress_path, &note)?;

    Ok(IterationOutcome::Ran(IterationReport {
        iter,
        story_id: story.id,
        output,
        completed,
        gate,
        run_complete,
    }))
}
