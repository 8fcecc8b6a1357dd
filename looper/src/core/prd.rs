//! Task list document types.
//!
//! The task list (`prd.json`) is the single source of truth for a run: the
//! feature branch to work on and the prioritized user stories with their
//! completion flags. Field names are camelCase on disk so the file stays
//! interchangeable with the external tools that read it.

use serde::{Deserialize, Serialize};

/// Product-requirements document: the structured task list for one feature.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Prd {
    pub project: String,
    /// Feature branch the run works on (e.g. `feature/search`).
    pub branch_name: String,
    pub user_stories: Vec<UserStory>,
}

/// A single prioritized user story with a boolean completion flag.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserStory {
    pub id: String,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub acceptance_criteria: Vec<String>,
    /// Lower number means higher priority; 1 is worked first.
    pub priority: u32,
    pub passes: bool,
}

impl Prd {
    pub fn story(&self, id: &str) -> Option<&UserStory> {
        self.user_stories.iter().find(|story| story.id == id)
    }

    /// Set `passes = true` for every story named in `ids`. Unknown ids are
    /// ignored; the caller filters claims against known open stories first.
    pub fn mark_passed(&mut self, ids: &[String]) {
        for story in &mut self.user_stories {
            if ids.iter().any(|id| id == &story.id) {
                story.passes = true;
            }
        }
    }
}

/// One-line-per-story checklist rendered into the iteration prompt.
pub fn summarize_stories(prd: &Prd) -> String {
    prd.user_stories
        .iter()
        .map(|story| {
            format!(
                "- [{}] {}: {} (priority {})",
                if story.passes { "x" } else { " " },
                story.id,
                story.title,
                story.priority
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Placeholder document written by `looper init`.
pub fn default_prd() -> Prd {
    Prd {
        project: "example".to_string(),
        branch_name: "feature/example".to_string(),
        user_stories: vec![UserStory {
            id: "US-001".to_string(),
            title: "Example story".to_string(),
            description: "Replace this with a real user story.".to_string(),
            acceptance_criteria: vec!["Describe how to verify this story".to_string()],
            priority: 1,
            passes: false,
        }],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::story;

    #[test]
    fn mark_passed_flips_only_named_stories() {
        let mut prd = default_prd();
        prd.user_stories = vec![story("a", 1, false), story("b", 2, false)];

        prd.mark_passed(&["b".to_string(), "missing".to_string()]);

        assert!(!prd.story("a").expect("story a").passes);
        assert!(prd.story("b").expect("story b").passes);
    }

    #[test]
    fn summary_marks_passed_stories() {
        let mut prd = default_prd();
        prd.user_stories = vec![story("a", 1, true), story("b", 2, false)];

        let summary = summarize_stories(&prd);
        assert!(summary.contains("- [x] a"));
        assert!(summary.contains("- [ ] b"));
    }
}
