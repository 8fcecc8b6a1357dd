//! Integration tests for the iteration loop against a real git workspace.
//!
//! Providers and gates are scripted; everything else (task list, progress
//! log, branch creation, commits) runs for real in a temp repository.

use std::fs;

use looper::core::types::GateOutcome;
use looper::run::{RunStop, run_loop};
use looper::test_support::{ScriptedGate, ScriptedProvider, TestRepo, test_config};

#[test]
fn loop_completes_when_agent_finishes_all_stories() {
    let repo = TestRepo::new().expect("repo");
    let provider = ScriptedProvider::new([
        "implemented the first story\n<story-complete>US-001</story-complete>",
        "implemented the rest\n<story-complete>US-002</story-complete>\n<promise>COMPLETE</promise>",
    ]);
    let gate = ScriptedGate::new([GateOutcome::Pass, GateOutcome::Pass]);

    let mut seen = Vec::new();
    let outcome = run_loop(
        repo.root(),
        &provider,
        &gate,
        &test_config(),
        5,
        |report| seen.push(report.story_id.clone()),
    )
    .expect("run loop");

    assert_eq!(outcome.stop, RunStop::Complete);
    assert_eq!(outcome.iterations_run, 2);
    assert_eq!(seen, vec!["US-001".to_string(), "US-002".to_string()]);

    let prd = repo.read_prd().expect("read prd");
    assert!(prd.user_stories.iter().all(|story| story.passes));

    // The loop switched onto the feature branch and committed the gated
    // completions there.
    let branch = repo
        .git_capture(&["rev-parse", "--abbrev-ref", "HEAD"])
        .expect("branch");
    assert_eq!(branch, "feature/fixture");
    let log = repo
        .git_capture(&["log", "--pretty=%s"])
        .expect("log");
    assert!(log.contains("feat: complete US-001"));
    assert!(log.contains("feat: complete US-002"));

    let progress = fs::read_to_string(repo.root().join("progress.txt")).expect("progress");
    assert!(progress.contains("## iteration 1: US-001"));
    assert!(progress.contains("completed: US-002"));

    // `.last-branch` now tracks the feature this run worked on.
    let last = fs::read_to_string(repo.root().join(".last-branch")).expect("last branch");
    assert_eq!(last, "feature/fixture");
}

#[test]
fn loop_exhausts_budget_when_agent_never_claims_completion() {
    let repo = TestRepo::new().expect("repo");
    let provider = ScriptedProvider::new(["still working", "still working", "still working"]);
    let gate = ScriptedGate::new([]);

    let outcome = run_loop(repo.root(), &provider, &gate, &test_config(), 3, |_| {})
        .expect("run loop");

    assert_eq!(
        outcome.stop,
        RunStop::BudgetExhausted { max_iterations: 3 }
    );
    assert_eq!(outcome.iterations_run, 3);

    let prd = repo.read_prd().expect("read prd");
    assert!(prd.user_stories.iter().all(|story| !story.passes));
}

#[test]
fn gate_failure_leaves_the_story_open() {
    let repo = TestRepo::new().expect("repo");
    let provider = ScriptedProvider::new([
        "claiming early\n<story-complete>US-001</story-complete>",
        "no claim this time",
    ]);
    let gate = ScriptedGate::new([GateOutcome::Fail]);

    let outcome = run_loop(repo.root(), &provider, &gate, &test_config(), 2, |_| {})
        .expect("run loop");

    assert_eq!(
        outcome.stop,
        RunStop::BudgetExhausted { max_iterations: 2 }
    );

    let prd = repo.read_prd().expect("read prd");
    assert!(!prd.story("US-001").expect("story").passes);

    let progress = fs::read_to_string(repo.root().join("progress.txt")).expect("progress");
    assert!(progress.contains("gate failed for US-001"));
}

#[test]
fn provider_errors_are_recorded_and_the_loop_continues() {
    let repo = TestRepo::new().expect("repo");
    // One scripted output only: the second iteration errors out.
    let provider = ScriptedProvider::new(["still working"]);
    let gate = ScriptedGate::new([]);

    let outcome = run_loop(repo.root(), &provider, &gate, &test_config(), 2, |_| {})
        .expect("run loop");

    assert_eq!(
        outcome.stop,
        RunStop::BudgetExhausted { max_iterations: 2 }
    );
    assert_eq!(outcome.iterations_run, 2);

    let progress = fs::read_to_string(repo.root().join("progress.txt")).expect("progress");
    assert!(progress.contains("iteration 2 failed"));
}

#[test]
fn claims_for_unknown_or_passed_stories_are_ignored() {
    let repo = TestRepo::new().expect("repo");
    let mut prd = repo.read_prd().expect("read prd");
    prd.user_stories[0].passes = true;
    repo.write_prd(&prd).expect("write prd");
    repo.git(&["add", "-A"]).expect("add");
    repo.git(&["commit", "-m", "chore: pass first story"])
        .expect("commit");

    let provider = ScriptedProvider::new([
        "<story-complete>US-001</story-complete>\n<story-complete>US-999</story-complete>",
    ]);
    // No gate outcomes scripted: the run fails if the gate is consulted.
    let gate = ScriptedGate::new([]);

    let outcome = run_loop(repo.root(), &provider, &gate, &test_config(), 1, |_| {})
        .expect("run loop");

    assert_eq!(
        outcome.stop,
        RunStop::BudgetExhausted { max_iterations: 1 }
    );
    let prd = repo.read_prd().expect("read prd");
    assert!(!prd.story("US-002").expect("story").passes);
}

#[test]
fn already_complete_task_list_stops_before_invoking_the_provider() {
    let repo = TestRepo::new().expect("repo");
    let mut prd = repo.read_prd().expect("read prd");
    for story in &mut prd.user_stories {
        story.passes = true;
    }
    repo.write_prd(&prd).expect("write prd");
    repo.git(&["add", "-A"]).expect("add");
    repo.git(&["commit", "-m", "chore: all passed"]).expect("commit");

    // A scripted provider with no outputs errors if invoked at all.
    let provider = ScriptedProvider::new(Vec::<String>::new());
    let gate = ScriptedGate::new([]);

    let outcome = run_loop(repo.root(), &provider, &gate, &test_config(), 5, |_| {})
        .expect("run loop");

    assert_eq!(outcome.stop, RunStop::Complete);
    assert_eq!(outcome.iterations_run, 0);
}
