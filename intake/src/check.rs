//! Answer-file loading and validation for `intake check` and `intake submit`.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow, bail};
use serde_json::Value;
use tracing::debug;

use crate::core::catalog::{Catalog, InputKind};
use crate::core::derived::compute;
use crate::core::resolver::{
    progress, section_questions, sections_of, validate_section, visible_questions,
};
use crate::core::types::{AnswerSet, ErrorMap, RawInput};

/// Validation result for one visible section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionReport {
    pub index: usize,
    pub key: String,
    pub title: String,
    pub errors: ErrorMap,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckReport {
    pub sections: Vec<SectionReport>,
    /// Visible section count, including unchecked ones.
    pub visible_sections: usize,
    pub progress: u8,
}

impl CheckReport {
    pub fn error_count(&self) -> usize {
        self.sections.iter().map(|section| section.errors.len()).sum()
    }

    pub fn is_complete(&self) -> bool {
        self.error_count() == 0
    }
}

/// Read an answers file: a JSON object of question id → raw value.
pub fn load_answers(catalog: &Catalog, path: &Path) -> Result<AnswerSet> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("read answers {}", path.display()))?;
    parse_answers(catalog, &contents).with_context(|| format!("load answers {}", path.display()))
}

/// Parse raw answers and type them through each question's coercion.
///
/// Strings become text input, numbers their decimal text, booleans toggles
/// and string arrays selections; `null` leaves the question unanswered.
pub fn parse_answers(catalog: &Catalog, raw: &str) -> Result<AnswerSet> {
    let value: Value = serde_json::from_str(raw).context("parse answers json")?;
    let Value::Object(entries) = value else {
        bail!("answers must be a JSON object");
    };
    let mut answers = AnswerSet::new();
    for (id, value) in entries {
        let question = catalog
            .question(&id)
            .ok_or_else(|| anyhow!("unknown question '{}'", id))?;
        if question.kind == InputKind::Derived {
            bail!("question '{}' is computed and cannot be answered", id);
        }
        let raw = match value {
            Value::Null => continue,
            Value::String(text) => RawInput::Text(text),
            Value::Number(number) => RawInput::Text(number.to_string()),
            Value::Bool(flag) => RawInput::Toggle(flag),
            Value::Array(items) => RawInput::Selection(
                items
                    .into_iter()
                    .map(|item| match item {
                        Value::String(text) => Ok(text),
                        other => Err(anyhow!(
                            "question '{}': list items must be strings, got {}",
                            id,
                            other
                        )),
                    })
                    .collect::<Result<Vec<_>>>()?,
            ),
            Value::Object(_) => bail!("question '{}': objects are not valid answers", id),
        };
        answers.insert(id.as_str(), question.coerce(raw));
    }
    for question in catalog.derived_questions() {
        if let Some(answer) = question
            .derivation
            .as_ref()
            .and_then(|derivation| compute(derivation, &answers))
        {
            answers.insert(question.id.as_str(), answer);
        }
    }
    debug!(answers = answers.len(), "answers parsed");
    Ok(answers)
}

/// Validate one visible section (by index) or all of them.
pub fn check_answers(
    catalog: &Catalog,
    answers: &AnswerSet,
    section: Option<usize>,
) -> Result<CheckReport> {
    let visible = visible_questions(catalog, answers);
    let keys = sections_of(&visible);
    if let Some(index) = section {
        if index >= keys.len() {
            bail!(
                "section {} out of range: {} visible sections",
                index,
                keys.len()
            );
        }
    }

    let sections = keys
        .iter()
        .enumerate()
        .filter(|(index, _)| section.is_none_or(|wanted| wanted == *index))
        .map(|(index, key)| SectionReport {
            index,
            key: key.to_string(),
            title: catalog.section_title(key).to_string(),
            errors: validate_section(&section_questions(&visible, key), answers),
        })
        .collect();

    Ok(CheckReport {
        sections,
        visible_sections: keys.len(),
        progress: progress(catalog, answers),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{Answer, FieldErrorKind};
    use crate::questionnaire::default_catalog;

    #[test]
    fn parse_types_answers_by_question_kind() {
        let catalog = default_catalog().expect("catalog");
        let answers = parse_answers(
            &catalog,
            r#"{"height": 170, "house_number": 12, "consent_data_processing": true,
                "focus_areas": ["pension"], "birth_date": "1985-03-14", "city": null}"#,
        )
        .expect("parse");

        assert_eq!(answers.get("height"), Some(&Answer::Number(170.0)));
        assert_eq!(answers.get("house_number"), Some(&Answer::text("12")));
        assert_eq!(answers.get("consent_data_processing"), Some(&Answer::Flag(true)));
        assert_eq!(
            answers.get("focus_areas"),
            Some(&Answer::Choices(vec!["pension".into()]))
        );
        assert!(matches!(answers.get("birth_date"), Some(Answer::Date(_))));
        assert!(!answers.contains("city"));
    }

    #[test]
    fn parse_computes_bmi_and_rejects_setting_it() {
        let catalog = default_catalog().expect("catalog");
        let answers =
            parse_answers(&catalog, r#"{"height": 180, "weight": 70}"#).expect("parse");
        assert_eq!(answers.get("bmi"), Some(&Answer::text("21.6")));

        let err = parse_answers(&catalog, r#"{"bmi": "20"}"#).expect_err("derived");
        assert!(err.to_string().contains("computed"));
    }

    #[test]
    fn parse_rejects_unknown_questions() {
        let catalog = default_catalog().expect("catalog");
        let err = parse_answers(&catalog, r#"{"nickname": "dd"}"#).expect_err("unknown");
        assert!(err.to_string().contains("unknown question 'nickname'"));
    }

    #[test]
    fn check_single_section_reports_required_fields() {
        let catalog = default_catalog().expect("catalog");
        let answers = parse_answers(&catalog, r#"{"first_name": ""}"#).expect("parse");
        let report = check_answers(&catalog, &answers, Some(0)).expect("check");

        assert_eq!(report.sections.len(), 1);
        assert_eq!(report.sections[0].key, "personal");
        assert_eq!(
            report.sections[0].errors["first_name"].kind,
            FieldErrorKind::Required
        );
        assert!(!report.is_complete());
    }

    #[test]
    fn check_rejects_out_of_range_section() {
        let catalog = default_catalog().expect("catalog");
        let err = check_answers(&catalog, &AnswerSet::new(), Some(42)).expect_err("range");
        assert!(err.to_string().contains("out of range"));
    }
}
