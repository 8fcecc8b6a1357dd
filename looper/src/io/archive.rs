//! Archival of prior run artifacts when the feature branch changes.
//!
//! `.last-branch` records which branch the previous run worked on. When
//! `prd.json` names a different branch, the old task list and progress log
//! are copied into `archive/<date>-<branch short name>/` and the progress
//! log is reset for the new feature.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Local;
use serde_json::Value;
use tracing::{debug, info, instrument};

use crate::io::init::LoopPaths;
use crate::io::progress::init_progress;

/// Archive the previous run if the branch named by the task list differs
/// from the one recorded in `.last-branch`.
///
/// Returns the archive directory when something was archived. The task
/// list is read leniently here (only `branchName` matters) so a document
/// with broken stories can still be archived out of the way.
#[instrument(skip_all)]
pub fn archive_previous_run(paths: &LoopPaths) -> Result<Option<PathBuf>> {
    if !paths.prd_path.exists() || !paths.last_branch_path.exists() {
        return Ok(None);
    }

    let current = read_branch_name(paths)?;
    let last = fs::read_to_string(&paths.last_branch_path)
        .with_context(|| format!("read {}", paths.last_branch_path.display()))?
        .trim()
        .to_string();
    if current.is_empty() || last.is_empty() || current == last {
        debug!(branch = %current, "no archive needed");
        return Ok(None);
    }

    let folder = format!(
        "{}-{}",
        Local::now().format("%Y-%m-%d"),
        archive_folder_name(&last)
    );
    let archive_dir = paths.archive_dir.join(folder);
    info!(from = %last, to = %current, dir = %archive_dir.display(), "archiving previous run");
    fs::create_dir_all(&archive_dir)
        .with_context(|| format!("create archive dir {}", archive_dir.display()))?;

    fs::copy(&paths.prd_path, archive_dir.join("prd.json"))
        .with_context(|| format!("archive {}", paths.prd_path.display()))?;
    if paths.progress_path.exists() {
        fs::copy(&paths.progress_path, archive_dir.join("progress.txt"))
            .with_context(|| format!("archive {}", paths.progress_path.display()))?;
    }

    // The old log belongs to the archived feature; start the new one clean.
    init_progress(&paths.progress_path)?;

    Ok(Some(archive_dir))
}

/// Record the branch named by the current task list into `.last-branch`.
pub fn track_current_branch(paths: &LoopPaths) -> Result<()> {
    if !paths.prd_path.exists() {
        return Ok(());
    }
    let branch = read_branch_name(paths)?;
    if branch.is_empty() {
        return Ok(());
    }
    fs::write(&paths.last_branch_path, &branch)
        .with_context(|| format!("write {}", paths.last_branch_path.display()))?;
    Ok(())
}

/// Folder-safe short name for a branch: the part after the first `/`
/// (e.g. `feature/search` becomes `search`), remaining separators dashed.
pub(crate) fn archive_folder_name(branch: &str) -> String {
    let short = branch
        .split_once('/')
        .map(|(_, rest)| rest)
        .unwrap_or(branch);
    short.replace('/', "-")
}

fn read_branch_name(paths: &LoopPaths) -> Result<String> {
    let contents = fs::read_to_string(&paths.prd_path)
        .with_context(|| format!("read {}", paths.prd_path.display()))?;
    let value: Value = serde_json::from_str(&contents)
        .with_context(|| format!("parse {}", paths.prd_path.display()))?;
    Ok(value
        .get("branchName")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .trim()
        .to_string())
}
