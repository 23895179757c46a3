//! I/O adapters: configuration, draft persistence, remote submission and
//! summary rendering.

pub mod config;
pub mod draft_store;
pub mod submit;
pub mod summary;
