//! Stable exit codes for intake CLI commands.

/// Command succeeded.
pub const OK: i32 = 0;
/// Invalid config, catalog or answers file, or any other error.
pub const INVALID: i32 = 1;
/// Answers have validation errors (`check`, `submit`) or the form was left unfinished (`fill`).
pub const INCOMPLETE: i32 = 2;
/// The remote submission failed; the draft is kept.
pub const SUBMIT_FAILED: i32 = 3;
