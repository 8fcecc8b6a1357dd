//! Deterministic selection logic for the task list.

use crate::core::prd::{Prd, UserStory};

/// Find the next eligible story: lowest `priority` number among stories
/// with `passes=false`, ties broken by document order.
///
/// Returns `None` if every story passes (run is complete). An empty story
/// list counts as complete.
pub fn next_open_story(prd: &Prd) -> Option<&UserStory> {
    prd.user_stories
        .iter()
        .filter(|story| !story.passes)
        .min_by_key(|story| story.priority)
}

/// Number of stories still open.
pub fn open_story_count(prd: &Prd) -> usize {
    prd.user_stories.iter().filter(|story| !story.passes).count()
}
