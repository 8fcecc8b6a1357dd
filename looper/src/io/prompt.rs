//! Iteration prompt rendering.
//!
//! The prompt is a fixed embedded template plus the selected story, the
//! story checklist, and a bounded tail of the progress log. Inputs are
//! already size-bounded by the caller, so rendering is deterministic for
//! a given task-list state.

use anyhow::Result;
use minijinja::{Environment, context};
use serde::Serialize;

use crate::core::prd::UserStory;

const ITERATION_TEMPLATE: &str = include_str!("prompts/iteration.md");

/// Selected story context for template rendering.
#[derive(Debug, Clone, Serialize)]
struct StoryContext {
    id: String,
    title: String,
    description: String,
    priority: u32,
    acceptance: Vec<String>,
}

impl StoryContext {
    fn from_story(story: &UserStory) -> Self {
        Self {
            id: story.id.clone(),
            title: story.title.clone(),
            description: story.description.clone(),
            priority: story.priority,
            acceptance: story.acceptance_criteria.clone(),
        }
    }
}

/// All inputs needed to render one iteration prompt.
#[derive(Debug, Clone)]
pub struct PromptInputs {
    pub project: String,
    pub branch: String,
    /// The story selected for this iteration.
    pub story: UserStory,
    /// One-line-per-story checklist of the whole task list.
    pub summary: String,
    /// Bounded tail of the progress log, if any.
    pub progress_tail: Option<String>,
}

/// Render the iteration prompt.
pub fn render_iteration(input: &PromptInputs) -> Result<String> {
    let mut env = Environment::new();
    env.add_template("iteration", ITERATION_TEMPLATE)
        .expect("iteration template should be valid");
    let template = env.get_template("iteration")?;
    let rendered = template.render(context! {
        project => input.project.trim(),
        branch => input.branch.trim(),
        story => StoryContext::from_story(&input.story),
        summary => input.summary.trim(),
        progress => input.progress_tail.as_deref().map(str::trim).filter(|s| !s.is_empty()),
    })?;
    Ok(rendered)
}
