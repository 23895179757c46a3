//! Deterministic, pure logic for the intake questionnaire.
//!
//! Core modules must be free of I/O side effects. They operate on in-memory
//! catalogs and answer sets and return deterministic outputs suitable for tests.

pub mod catalog;
pub mod derived;
pub mod invariants;
pub mod record;
pub mod resolver;
pub mod rules;
pub mod session;
pub mod types;
