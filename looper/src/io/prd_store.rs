//! Load and store the task list with schema and invariant validation.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use jsonschema::Draft;
use serde_json::Value;
use tracing::debug;

use crate::core::invariants::validate_invariants;
use crate::core::prd::Prd;

const PRD_SCHEMA: &str = include_str!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/schemas/prd/v1.schema.json"
));

/// Read and validate `prd.json`: JSON Schema conformance first, then the
/// semantic invariants (unique ids, usable branch name, sane priorities).
pub fn load_prd(path: &Path) -> Result<Prd> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("read task list {}", path.display()))?;
    let instance: Value = serde_json::from_str(&contents)
        .with_context(|| format!("parse task list {}", path.display()))?;
    validate_schema(&instance)?;
    let prd: Prd = serde_json::from_str(&contents)
        .with_context(|| format!("parse {} as v1 task list", path.display()))?;
    let errors = validate_invariants(&prd);
    if !errors.is_empty() {
        bail!("task list invariant violations:\n- {}", errors.join("\n- "));
    }
    debug!(stories = prd.user_stories.len(), branch = %prd.branch_name, "task list loaded");
    Ok(prd)
}

/// Atomically write the task list (temp file + rename), pretty-printed
/// with a trailing newline so diffs stay clean.
pub fn write_prd(path: &Path, prd: &Prd) -> Result<()> {
    let mut buf = serde_json::to_string_pretty(prd).context("serialize task list")?;
    buf.push('\n');
    write_atomic(path, &buf)
}

/// Validate a JSON instance against the embedded v1 schema (Draft 2020-12).
fn validate_schema(instance: &Value) -> Result<()> {
    let schema: Value = serde_json::from_str(PRD_SCHEMA).context("parse embedded prd schema")?;
    let compiled = jsonschema::options()
        .with_draft(Draft::Draft202012)
        .build(&schema)
        .context("compile prd schema")?;
    let messages: Vec<String> = compiled
        .iter_errors(instance)
        .map(|err| err.to_string())
        .collect();
    if !messages.is_empty() {
        bail!("schema validation failed:\n- {}", messages.join("\n- "));
    }
    Ok(())
}

fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .with_context(|| format!("create directory {}", parent.display()))?;
    }
    let tmp_path = path.with_extension("json.tmp");
    fs::write(&tmp_path, contents)
        .with_context(|| format!("write temp task list {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path)
        .with_context(|| format!("replace task list {}", path.display()))?;
    Ok(())
}
