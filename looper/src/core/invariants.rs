//! Semantic invariants for the task list, checked after schema validation.

use std::collections::HashSet;

use crate::core::prd::Prd;

/// Validate semantic invariants the JSON Schema cannot express.
///
/// Returns a list of violation messages; an empty list means the document
/// is valid. All violations are collected so the operator can fix the file
/// in one pass.
pub fn validate_invariants(prd: &Prd) -> Vec<String> {
    let mut errors = Vec::new();

    if prd.branch_name.trim().is_empty() {
        errors.push("branchName must be non-empty".to_string());
    } else if prd.branch_name.contains(char::is_whitespace) {
        errors.push(format!(
            "branchName '{}' must not contain whitespace",
            prd.branch_name
        ));
    }

    let mut seen: HashSet<&str> = HashSet::new();
    for story in &prd.user_stories {
        if story.id.trim().is_empty() {
            errors.push("story id must be non-empty".to_string());
        } else if !seen.insert(story.id.as_str()) {
            errors.push(format!("duplicate story id '{}'", story.id));
        }
        if story.title.trim().is_empty() {
            errors.push(format!("story '{}' title must be non-empty", story.id));
        }
        if story.priority == 0 {
            errors.push(format!("story '{}' priority must be >= 1", story.id));
        }
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::prd::default_prd;
    use crate::test_support::story;

    #[test]
    fn valid_prd_has_no_violations() {
        assert!(validate_invariants(&default_prd()).is_empty());
    }

    #[test]
    fn reports_all_violations_together() {
        let mut prd = default_prd();
        prd.branch_name = "has space".to_string();
        prd.user_stories = vec![story("dup", 1, false), story("dup", 0, false)];

        let errors = validate_invariants(&prd);
        assert!(errors.iter().any(|e| e.contains("whitespace")));
        assert!(errors.iter().any(|e| e.contains("duplicate story id")));
        assert!(errors.iter().any(|e| e.contains("priority must be >= 1")));
    }

    #[test]
    fn empty_branch_is_rejected() {
        let mut prd = default_prd();
        prd.branch_name = "  ".to_string();

        let errors = validate_invariants(&prd);
        assert!(errors.iter().any(|e| e.contains("non-empty")));
    }
}
