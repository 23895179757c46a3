//! Catalog integrity checks run once at startup.

use std::collections::{HashMap, HashSet};

use regex::Regex;

use crate::core::catalog::{Derivation, InputKind, Question, SectionInfo, ValidationRule};

/// Check catalog invariants the type system cannot express:
/// - No duplicate question ids, section keys or record keys
/// - Conditional dependencies refer to an earlier question
/// - Every question belongs to a declared section; every section has a question
/// - Section runs are contiguous and follow the declared order
/// - Choice kinds declare options; derived kinds declare a derivation over earlier questions
/// - Patterns and JSON schemas compile
pub fn validate_catalog(sections: &[SectionInfo], questions: &[Question]) -> Vec<String> {
    let mut errors = Vec::new();

    let mut section_order = HashMap::new();
    for (ordinal, section) in sections.iter().enumerate() {
        if section_order.insert(section.key.as_str(), ordinal).is_some() {
            errors.push(format!("duplicate section '{}'", section.key));
        }
    }

    let mut positions: HashMap<&str, usize> = HashMap::new();
    let mut record_keys = HashSet::new();
    for (position, question) in questions.iter().enumerate() {
        if positions.insert(question.id.as_str(), position).is_some() {
            errors.push(format!("duplicate id '{}'", question.id));
        }
        if let Some(record) = &question.record {
            if !record_keys.insert(record.key.as_str()) {
                errors.push(format!(
                    "question '{}': duplicate record key '{}'",
                    question.id, record.key
                ));
            }
        }
    }

    for (position, question) in questions.iter().enumerate() {
        validate_question(question, position, &positions, questions, &mut errors);
    }

    validate_section_runs(sections, &section_order, questions, &mut errors);
    errors
}

fn validate_question(
    question: &Question,
    position: usize,
    positions: &HashMap<&str, usize>,
    questions: &[Question],
    errors: &mut Vec<String>,
) {
    if let Some(rule) = &question.conditional {
        match positions.get(rule.depends_on.as_str()) {
            None => errors.push(format!(
                "question '{}': depends on unknown question '{}'",
                question.id, rule.depends_on
            )),
            Some(&target) if target >= position => errors.push(format!(
                "question '{}': depends on later question '{}'",
                question.id, rule.depends_on
            )),
            Some(_) => {}
        }
    }

    if question.kind.has_options() && question.options.is_empty() {
        errors.push(format!("question '{}': choice kind without options", question.id));
    }

    match (question.kind, &question.derivation) {
        (InputKind::Derived, None) => errors.push(format!(
            "question '{}': derived kind without derivation",
            question.id
        )),
        (InputKind::Derived, Some(derivation)) => {
            validate_derivation(question, derivation, position, positions, questions, errors);
        }
        (_, Some(_)) => errors.push(format!(
            "question '{}': derivation on non-derived kind",
            question.id
        )),
        (_, None) => {}
    }

    match &question.rule {
        Some(ValidationRule::Pattern { pattern, .. }) => {
            if let Err(err) = Regex::new(pattern) {
                errors.push(format!("question '{}': invalid pattern: {}", question.id, err));
            }
        }
        Some(ValidationRule::Schema { schema, .. }) => {
            if let Err(err) = jsonschema::validator_for(schema) {
                errors.push(format!("question '{}': invalid schema: {}", question.id, err));
            }
        }
        Some(ValidationRule::Range { min: Some(min), max: Some(max), .. }) if min > max => {
            errors.push(format!("question '{}': range min exceeds max", question.id));
        }
        Some(ValidationRule::Length { min: Some(min), max: Some(max), .. }) if min > max => {
            errors.push(format!("question '{}': length min exceeds max", question.id));
        }
        _ => {}
    }
}

fn validate_derivation(
    question: &Question,
    derivation: &Derivation,
    position: usize,
    positions: &HashMap<&str, usize>,
    questions: &[Question],
    errors: &mut Vec<String>,
) {
    for input in derivation.inputs() {
        match positions.get(input) {
            None => errors.push(format!(
                "question '{}': derivation reads unknown question '{}'",
                question.id, input
            )),
            Some(&target) if target >= position => errors.push(format!(
                "question '{}': derivation reads later question '{}'",
                question.id, input
            )),
            Some(&target) if questions[target].kind != InputKind::Number => errors.push(format!(
                "question '{}': derivation input '{}' is not numeric",
                question.id, input
            )),
            Some(_) => {}
        }
    }
}

fn validate_section_runs(
    sections: &[SectionInfo],
    section_order: &HashMap<&str, usize>,
    questions: &[Question],
    errors: &mut Vec<String>,
) {
    let mut seen = HashSet::new();
    let mut previous: Option<(&str, usize)> = None;
    for question in questions {
        let Some(&ordinal) = section_order.get(question.section.as_str()) else {
            errors.push(format!(
                "question '{}': undeclared section '{}'",
                question.id, question.section
            ));
            continue;
        };
        match previous {
            Some((key, _)) if key == question.section => {}
            Some((_, last)) if ordinal < last || seen.contains(question.section.as_str()) => {
                errors.push(format!(
                    "question '{}': section '{}' out of declared order",
                    question.id, question.section
                ));
            }
            _ => {}
        }
        seen.insert(question.section.as_str());
        previous = Some((question.section.as_str(), ordinal));
    }

    for section in sections {
        if !seen.contains(section.key.as_str()) {
            errors.push(format!("section '{}' has no questions", section.key));
        }
    }
}
