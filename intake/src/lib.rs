//! Client intake questionnaire engine.
//!
//! A declarative catalog of questions drives a section-by-section form:
//! conditional visibility, per-section validation, derived answers, local
//! draft persistence and a single remote submission. The crate keeps a
//! strict separation:
//!
//! - **[`core`]**: Pure, deterministic logic (catalog, visibility,
//!   validation, session state). No I/O, fully testable in isolation.
//! - **[`io`]**: Side-effecting adapters (config file, draft file, HTTP
//!   submission, summary templates). Behind traits where tests need fakes.
//!
//! [`flow`] couples the two; [`console`] renders a flow on a terminal and
//! [`check`] validates answer files for the non-interactive commands.

pub mod check;
pub mod console;
pub mod core;
pub mod exit_codes;
pub mod flow;
pub mod io;
pub mod logging;
pub mod questionnaire;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
