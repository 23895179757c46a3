//! Per-answer checks: input-kind conformance, then the question's rule.

use regex::Regex;

use crate::core::catalog::{InputKind, Question, ValidationRule};
use crate::core::types::{Answer, FieldError, FieldErrorKind, INVALID_MESSAGE};

/// Check a present answer against its question.
///
/// Returns the first violation, if any. Never panics on malformed rules;
/// a rule that cannot be evaluated reports the fallback message.
pub fn check_answer(question: &Question, answer: &Answer) -> Option<FieldError> {
    if let Some(error) = check_kind(question, answer) {
        return Some(error);
    }
    let rule = question.rule.as_ref()?;
    check_rule(rule, answer)
}

fn check_kind(question: &Question, answer: &Answer) -> Option<FieldError> {
    let fits = match (question.kind, answer) {
        (InputKind::Number, Answer::Number(_)) => true,
        (InputKind::Number, _) => false,
        (InputKind::Date, Answer::Date(_)) => true,
        (InputKind::Date, _) => false,
        (InputKind::Toggle, Answer::Flag(_)) => true,
        (InputKind::Toggle, _) => false,
        (InputKind::Select | InputKind::Radio, Answer::Text(value)) => {
            question.option_label(value).is_some()
        }
        (InputKind::Select | InputKind::Radio, _) => false,
        (InputKind::MultiSelect, Answer::Choices(values)) => values
            .iter()
            .all(|value| question.option_label(value).is_some()),
        (InputKind::MultiSelect, _) => false,
        _ => true,
    };
    if fits {
        return None;
    }
    let message = question
        .rule
        .as_ref()
        .and_then(ValidationRule::custom_message)
        .unwrap_or(INVALID_MESSAGE);
    Some(FieldError::new(FieldErrorKind::Invalid, message))
}

fn check_rule(rule: &ValidationRule, answer: &Answer) -> Option<FieldError> {
    match rule {
        ValidationRule::Range { min, max, message } => {
            let in_range = answer.as_number().is_some_and(|value| {
                min.is_none_or(|min| value >= min) && max.is_none_or(|max| value <= max)
            });
            (!in_range).then(|| failure(FieldErrorKind::Range, message.as_deref(), None))
        }
        ValidationRule::Length { min, max, message } => {
            let count = answer.display().chars().count();
            let in_range =
                min.is_none_or(|min| count >= min) && max.is_none_or(|max| count <= max);
            (!in_range).then(|| failure(FieldErrorKind::Range, message.as_deref(), None))
        }
        ValidationRule::Pattern { pattern, message } => {
            let matched = Regex::new(pattern)
                .map(|re| re.is_match(&answer.display()))
                .unwrap_or(false);
            (!matched).then(|| failure(FieldErrorKind::Pattern, message.as_deref(), None))
        }
        ValidationRule::Schema { schema, message } => {
            let violation = match jsonschema::validator_for(schema) {
                Ok(validator) => validator
                    .iter_errors(&answer.to_json())
                    .next()
                    .map(|err| Some(err.to_string())),
                Err(_) => Some(None),
            };
            violation.map(|first| failure(FieldErrorKind::Schema, message.as_deref(), first))
        }
    }
}

/// Custom message first, then the violation's own message, then the fallback.
fn failure(kind: FieldErrorKind, custom: Option<&str>, violation: Option<String>) -> FieldError {
    let message = custom
        .map(str::to_string)
        .or(violation)
        .unwrap_or_else(|| INVALID_MESSAGE.to_string());
    FieldError::new(kind, message)
}
