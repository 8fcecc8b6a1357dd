//! CLI tests for `looper select` and `looper validate`.
//!
//! Spawns the looper binary and verifies stdout and exit codes for open,
//! complete, and invalid task lists.

use std::process::Command;

use looper::exit_codes;
use looper::io::init::{InitOptions, init_loop};
use looper::io::prd_store::write_prd;
use looper::test_support::sample_prd;

#[test]
fn select_prints_the_next_open_story() {
    let temp = tempfile::tempdir().expect("tempdir");
    init_loop(temp.path(), &InitOptions { force: false }).expect("init");
    write_prd(&temp.path().join("prd.json"), &sample_prd("feature/cli")).expect("write prd");

    let output = Command::new(env!("CARGO_BIN_EXE_looper"))
        .current_dir(temp.path())
        .arg("select")
        .output()
        .expect("looper select");

    assert_eq!(output.status.code(), Some(exit_codes::OK));
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "US-001");
}

#[test]
fn select_complete_exits_with_complete_code() {
    let temp = tempfile::tempdir().expect("tempdir");
    init_loop(temp.path(), &InitOptions { force: false }).expect("init");
    let mut prd = sample_prd("feature/cli");
    for story in &mut prd.user_stories {
        story.passes = true;
    }
    write_prd(&temp.path().join("prd.json"), &prd).expect("write prd");

    let status = Command::new(env!("CARGO_BIN_EXE_looper"))
        .current_dir(temp.path())
        .arg("select")
        .status()
        .expect("looper select");

    assert_eq!(status.code(), Some(exit_codes::COMPLETE));
}

#[test]
fn validate_rejects_a_broken_task_list() {
    let temp = tempfile::tempdir().expect("tempdir");
    init_loop(temp.path(), &InitOptions { force: false }).expect("init");
    std::fs::write(temp.path().join("prd.json"), "{\"project\": \"p\"}").expect("write");

    let status = Command::new(env!("CARGO_BIN_EXE_looper"))
        .current_dir(temp.path())
        .arg("validate")
        .status()
        .expect("looper validate");

    assert_eq!(status.code(), Some(exit_codes::INVALID));
}
