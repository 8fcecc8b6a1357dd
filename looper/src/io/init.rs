//! Workspace scaffolding and canonical artifact paths.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};

use crate::core::prd::default_prd;
use crate::io::config::{LoopConfig, write_config};
use crate::io::prd_store::write_prd;
use crate::io::progress::init_progress;

/// Canonical run-artifact paths inside a workspace root.
///
/// Artifacts live flat at the root (not in a dot-directory) because the
/// external collaborators that read them expect them there.
#[derive(Debug, Clone)]
pub struct LoopPaths {
    pub root: PathBuf,
    pub prd_path: PathBuf,
    pub progress_path: PathBuf,
    pub config_path: PathBuf,
    pub archive_dir: PathBuf,
    pub last_branch_path: PathBuf,
}

impl LoopPaths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            prd_path: root.join("prd.json"),
            progress_path: root.join("progress.txt"),
            config_path: root.join("config.toml"),
            archive_dir: root.join("archive"),
            last_branch_path: root.join(".last-branch"),
            root,
        }
    }
}

/// Options for [`init_loop`].
#[derive(Debug, Clone)]
pub struct InitOptions {
    /// If true, overwrite existing controller-owned files.
    pub force: bool,
}

/// Scaffold a workspace: placeholder `prd.json`, default `config.toml`,
/// fresh progress log, and the archive directory.
///
/// Fails if `prd.json` already exists unless `options.force` is set.
pub fn init_loop(root: &Path, options: &InitOptions) -> Result<LoopPaths> {
    let paths = LoopPaths::new(root);
    if paths.prd_path.exists() && !options.force {
        return Err(anyhow!(
            "init: {} already exists (use --force to overwrite)",
            paths.prd_path.display()
        ));
    }

    fs::create_dir_all(&paths.archive_dir)
        .with_context(|| format!("create directory {}", paths.archive_dir.display()))?;
    write_prd(&paths.prd_path, &default_prd())?;
    write_config(&paths.config_path, &LoopConfig::default())?;
    init_progress(&paths.progress_path)?;

    Ok(paths)
}
