//! Stable exit codes for looper CLI commands.

/// Command succeeded or an open story was selected.
pub const OK: i32 = 0;
/// Command failed due to invalid config/task list or other errors.
pub const INVALID: i32 = 1;
/// `looper select` found no open story (every story passes).
pub const COMPLETE: i32 = 2;
/// `looper run` hit the iteration budget with stories still open.
pub const EXHAUSTED: i32 = 3;
