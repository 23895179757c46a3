//! Flat submission record built from an answer set.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::core::catalog::{Catalog, Coercion};
use crate::core::types::{Answer, AnswerSet, number_value};

/// Column name → JSON value, ready for the remote insert.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ClientRecord(Map<String, Value>);

impl ClientRecord {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_inner(self) -> Map<String, Value> {
        self.0
    }
}

/// Rename and coerce every mapped question into a record column.
///
/// Unanswered columns are written as `null`. Fails only when a bracketed
/// list cannot be parsed.
pub fn build_record(catalog: &Catalog, answers: &AnswerSet) -> Result<ClientRecord, String> {
    let mut columns = Map::new();
    for question in catalog.questions() {
        let Some(field) = &question.record else {
            continue;
        };
        let value = coerce(&field.coercion, answers.get(&question.id))
            .map_err(|reason| format!("{}: {}", field.key, reason))?;
        columns.insert(field.key.clone(), value);
    }
    Ok(ClientRecord(columns))
}

fn coerce(coercion: &Coercion, answer: Option<&Answer>) -> Result<Value, String> {
    let value = match coercion {
        Coercion::Verbatim => answer.map(Answer::to_json).unwrap_or(Value::Null),
        Coercion::Number => answer
            .and_then(Answer::as_number)
            .map(number_value)
            .unwrap_or(Value::Null),
        Coercion::StrictBool => Value::Bool(matches!(answer, Some(Answer::Flag(true)))),
        Coercion::Equals(literal) => {
            Value::Bool(answer.is_some_and(|answer| answer.matches_literal(literal)))
        }
        Coercion::BracketedList => match answer {
            None => Value::Null,
            Some(Answer::Choices(values)) if values.is_empty() => Value::Null,
            Some(Answer::Choices(values)) => {
                Value::Array(values.iter().cloned().map(Value::String).collect())
            }
            Some(Answer::Text(text)) if text.trim().is_empty() => Value::Null,
            Some(Answer::Text(text)) => parse_bracketed(text)?,
            Some(other) => Value::Array(vec![other.to_json()]),
        },
    };
    Ok(value)
}

/// Parse `text` as the body of a JSON array literal: `"a","b"` → `["a","b"]`.
fn parse_bracketed(text: &str) -> Result<Value, String> {
    serde_json::from_str::<Value>(&format!("[{}]", text))
        .map_err(|err| format!("malformed list: {}", err))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::catalog::{InputKind, Question, SectionInfo};
    use serde_json::json;

    fn catalog() -> Catalog {
        let sections = vec![SectionInfo::new("s", "S")];
        let questions = vec![
            Question::new("name", "s", "Name", InputKind::ShortText)
                .record("first_name", Coercion::Verbatim),
            Question::new("kids", "s", "Kids", InputKind::Number)
                .record("children_count", Coercion::Number),
            Question::new("spouse", "s", "Spouse", InputKind::Radio)
                .options(&[("yes", "כן"), ("no", "לא")])
                .record("has_spouse", Coercion::Equals("yes".into())),
            Question::new("terms", "s", "Terms", InputKind::Toggle)
                .record("consent_terms", Coercion::StrictBool),
            Question::new("areas", "s", "Areas", InputKind::ShortText)
                .record("focus_areas", Coercion::BracketedList),
            Question::new("note", "s", "Note", InputKind::FreeText),
        ];
        Catalog::new(sections, questions).expect("catalog")
    }

    #[test]
    fn coerces_numbers_booleans_and_lists() {
        let answers: AnswerSet = [
            ("name", Answer::text("דוד")),
            ("kids", Answer::text("2")),
            ("spouse", Answer::text("yes")),
            ("terms", Answer::Flag(true)),
            ("areas", Answer::text(r#""pension","health""#)),
            ("note", Answer::text("not mapped")),
        ]
        .into_iter()
        .collect();

        let record = build_record(&catalog(), &answers).expect("record");
        assert_eq!(
            serde_json::to_value(&record).expect("json"),
            json!({
                "first_name": "דוד",
                "children_count": 2,
                "has_spouse": true,
                "consent_terms": true,
                "focus_areas": ["pension", "health"],
            })
        );
    }

    #[test]
    fn absent_answers_become_null_or_false() {
        let record = build_record(&catalog(), &AnswerSet::new()).expect("record");
        assert_eq!(record.get("first_name"), Some(&Value::Null));
        assert_eq!(record.get("children_count"), Some(&Value::Null));
        assert_eq!(record.get("has_spouse"), Some(&Value::Bool(false)));
        assert_eq!(record.get("consent_terms"), Some(&Value::Bool(false)));
        assert_eq!(record.get("focus_areas"), Some(&Value::Null));
    }

    #[test]
    fn malformed_list_is_an_error() {
        let answers: AnswerSet = [("areas", Answer::text("pension, health"))]
            .into_iter()
            .collect();
        let err = build_record(&catalog(), &answers).expect_err("malformed");
        assert!(err.starts_with("focus_areas: malformed list"));
    }
}
