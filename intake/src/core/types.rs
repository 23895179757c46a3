//! Shared deterministic types for the intake core.
//!
//! Answers are typed once, at the catalog boundary
//! ([`Question::coerce`](crate::core::catalog::Question::coerce)); everything
//! downstream works on [`Answer`] and never on raw renderer input.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Message shown for a required question without an answer.
pub const REQUIRED_MESSAGE: &str = "שדה חובה";
/// Fallback message when a failing rule supplies none.
pub const INVALID_MESSAGE: &str = "ערך לא תקין";

/// A stored answer for one question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Answer {
    Text(String),
    Number(f64),
    Date(NaiveDate),
    Flag(bool),
    Choices(Vec<String>),
}

impl Answer {
    pub fn text(value: impl Into<String>) -> Self {
        Answer::Text(value.into())
    }

    /// True when the answer cannot satisfy a required question.
    ///
    /// Numbers and dates are never empty; a `false` flag is (required toggles
    /// must be switched on).
    pub fn is_empty(&self) -> bool {
        match self {
            Answer::Text(text) => text.trim().is_empty(),
            Answer::Choices(values) => values.is_empty(),
            Answer::Flag(value) => !value,
            Answer::Number(_) | Answer::Date(_) => false,
        }
    }

    /// Numeric view: numbers directly, text when it parses as a finite number.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Answer::Number(value) => Some(*value),
            Answer::Text(text) => text
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|value| value.is_finite()),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Answer::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Exact match against a literal from a conditional rule.
    pub fn matches_literal(&self, literal: &str) -> bool {
        match self {
            Answer::Text(text) => text == literal,
            Answer::Number(value) => literal.parse::<f64>() == Ok(*value),
            Answer::Date(date) => date.format("%Y-%m-%d").to_string() == literal,
            Answer::Flag(value) => literal == if *value { "true" } else { "false" },
            Answer::Choices(values) => values.len() == 1 && values[0] == literal,
        }
    }

    /// Human-readable rendering used by summaries and pattern checks.
    pub fn display(&self) -> String {
        match self {
            Answer::Text(text) => text.clone(),
            Answer::Number(value) => format_number(*value),
            Answer::Date(date) => date.format("%Y-%m-%d").to_string(),
            Answer::Flag(value) => (if *value { "כן" } else { "לא" }).to_string(),
            Answer::Choices(values) => values.join(", "),
        }
    }

    /// Plain JSON value (no kind tag) for schema checks and submission records.
    pub fn to_json(&self) -> Value {
        match self {
            Answer::Text(text) => Value::String(text.clone()),
            Answer::Number(value) => number_value(*value),
            Answer::Date(date) => Value::String(date.format("%Y-%m-%d").to_string()),
            Answer::Flag(value) => Value::Bool(*value),
            Answer::Choices(values) => {
                Value::Array(values.iter().cloned().map(Value::String).collect())
            }
        }
    }
}

/// JSON number, written as an integer when the value has no fractional part.
pub fn number_value(value: f64) -> Value {
    if value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
        Value::from(value as i64)
    } else {
        serde_json::Number::from_f64(value)
            .map(Value::Number)
            .unwrap_or(Value::Null)
    }
}

fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
        (value as i64).to_string()
    } else {
        value.to_string()
    }
}

/// Raw value reported by a renderer for a single change event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawInput {
    Text(String),
    Toggle(bool),
    Selection(Vec<String>),
}

/// Current answers for one session, keyed by question id.
///
/// Ordered by id so serialized drafts are stable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnswerSet {
    answers: BTreeMap<String, Answer>,
}

impl AnswerSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &str) -> Option<&Answer> {
        self.answers.get(id)
    }

    pub fn insert(&mut self, id: impl Into<String>, answer: Answer) -> Option<Answer> {
        self.answers.insert(id.into(), answer)
    }

    pub fn remove(&mut self, id: &str) -> Option<Answer> {
        self.answers.remove(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.answers.contains_key(id)
    }

    pub fn is_empty(&self) -> bool {
        self.answers.is_empty()
    }

    pub fn len(&self) -> usize {
        self.answers.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Answer)> {
        self.answers.iter().map(|(id, answer)| (id.as_str(), answer))
    }

    /// True when `id` has an answer that satisfies a required question.
    pub fn is_answered(&self, id: &str) -> bool {
        self.get(id).is_some_and(|answer| !answer.is_empty())
    }
}

impl<K: Into<String>> FromIterator<(K, Answer)> for AnswerSet {
    fn from_iter<I: IntoIterator<Item = (K, Answer)>>(iter: I) -> Self {
        Self {
            answers: iter.into_iter().map(|(id, answer)| (id.into(), answer)).collect(),
        }
    }
}

/// Why a field failed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldErrorKind {
    Required,
    Pattern,
    Range,
    Schema,
    /// The answer does not fit the question's input kind (e.g. text in a number field).
    Invalid,
}

/// Inline error for one question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub kind: FieldErrorKind,
    pub message: String,
}

impl FieldError {
    pub fn new(kind: FieldErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn required() -> Self {
        Self::new(FieldErrorKind::Required, REQUIRED_MESSAGE)
    }
}

/// Per-question errors for a section; empty means the section is complete.
pub type ErrorMap = BTreeMap<String, FieldError>;
