//! Sentinel markers scanned out of agent output.
//!
//! The agent signals progress through two markers embedded in its free-text
//! output: a per-story completion claim and a whole-run completion promise.
//! Everything else in the output is opaque to the controller.

use std::sync::LazyLock;

use regex::Regex;

/// Emitted by the agent when every story in the task list passes.
pub const RUN_COMPLETE_MARKER: &str = "<promise>COMPLETE</promise>";

static STORY_MARKER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<story-complete>\s*([A-Za-z0-9][A-Za-z0-9._-]*)\s*</story-complete>")
        .expect("story marker regex should be valid")
});

/// True when the output claims the whole run is done.
pub fn contains_run_complete(output: &str) -> bool {
    output.contains(RUN_COMPLETE_MARKER)
}

/// Story ids the output claims as complete, deduplicated in order of first
/// appearance. Claims are validated against the task list by the caller.
pub fn completed_story_ids(output: &str) -> Vec<String> {
    let mut ids = Vec::new();
    for caps in STORY_MARKER_RE.captures_iter(output) {
        let id = caps[1].to_string();
        if !ids.contains(&id) {
            ids.push(id);
        }
    }
    ids
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_marker_is_detected_verbatim() {
        assert!(contains_run_complete(
            "all stories pass\n<promise>COMPLETE</promise>\n"
        ));
        assert!(!contains_run_complete("<promise>complete</promise>"));
    }

    #[test]
    fn extracts_story_ids_with_surrounding_whitespace() {
        let ids = completed_story_ids(
            "done\n<story-complete> US-001 </story-complete>\n<story-complete>US-002</story-complete>",
        );
        assert_eq!(ids, vec!["US-001".to_string(), "US-002".to_string()]);
    }

    #[test]
    fn repeated_claims_are_deduplicated() {
        let ids = completed_story_ids(
            "<story-complete>US-001</story-complete> again <story-complete>US-001</story-complete>",
        );
        assert_eq!(ids, vec!["US-001".to_string()]);
    }

    #[test]
    fn plain_output_yields_no_claims() {
        assert!(completed_story_ids("still working on it").is_empty());
    }
}
