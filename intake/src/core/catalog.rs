//! Question definitions and the validated, read-only catalog.

use std::collections::HashMap;
use std::fmt;

use chrono::NaiveDate;
use serde_json::Value;

use crate::core::invariants::validate_catalog;
use crate::core::types::{Answer, RawInput};

/// Input kinds a renderer knows how to draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    ShortText,
    Number,
    Date,
    /// Drop-down with a single selected value.
    Select,
    /// Radio group with a single selected value.
    Radio,
    MultiSelect,
    Toggle,
    FreeText,
    File,
    Signature,
    /// Read-only, computed from other answers.
    Derived,
}

impl InputKind {
    pub fn has_options(self) -> bool {
        matches!(
            self,
            InputKind::Select | InputKind::Radio | InputKind::MultiSelect
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            InputKind::ShortText => "short_text",
            InputKind::Number => "number",
            InputKind::Date => "date",
            InputKind::Select => "select",
            InputKind::Radio => "radio",
            InputKind::MultiSelect => "multi_select",
            InputKind::Toggle => "toggle",
            InputKind::FreeText => "free_text",
            InputKind::File => "file",
            InputKind::Signature => "signature",
            InputKind::Derived => "derived",
        }
    }
}

/// One selectable option: the stored value and the label shown to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChoiceOption {
    pub value: String,
    pub label: String,
}

/// Comparison strategy applied to the dependency's current answer.
#[derive(Clone)]
pub enum Condition {
    Equals(String),
    OneOf(Vec<String>),
    /// Arbitrary check; receives `None` when the dependency is unanswered.
    Predicate(fn(Option<&Answer>) -> bool),
}

impl Condition {
    pub fn matches(&self, answer: Option<&Answer>) -> bool {
        match self {
            Condition::Equals(literal) => answer.is_some_and(|a| a.matches_literal(literal)),
            Condition::OneOf(literals) => answer.is_some_and(|a| {
                literals.iter().any(|literal| a.matches_literal(literal))
            }),
            Condition::Predicate(check) => check(answer),
        }
    }
}

impl fmt::Debug for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Condition::Equals(literal) => f.debug_tuple("Equals").field(literal).finish(),
            Condition::OneOf(literals) => f.debug_tuple("OneOf").field(literals).finish(),
            Condition::Predicate(_) => f.write_str("Predicate(..)"),
        }
    }
}

/// Visibility rule: show the question only while `condition` holds for `depends_on`.
#[derive(Debug, Clone)]
pub struct ConditionalRule {
    pub depends_on: String,
    pub condition: Condition,
}

/// Check applied to a present answer.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationRule {
    /// Numeric bounds, inclusive.
    Range {
        min: Option<f64>,
        max: Option<f64>,
        message: Option<String>,
    },
    /// Character-count bounds on the textual value, inclusive.
    Length {
        min: Option<usize>,
        max: Option<usize>,
        message: Option<String>,
    },
    /// Regular expression the textual value must match.
    Pattern {
        pattern: String,
        message: Option<String>,
    },
    /// JSON Schema the answer's JSON value must satisfy.
    Schema {
        schema: Value,
        message: Option<String>,
    },
}

impl ValidationRule {
    pub fn range(min: f64, max: f64) -> Self {
        ValidationRule::Range {
            min: Some(min),
            max: Some(max),
            message: None,
        }
    }

    pub fn length(min: usize, max: usize) -> Self {
        ValidationRule::Length {
            min: Some(min),
            max: Some(max),
            message: None,
        }
    }

    pub fn pattern(pattern: impl Into<String>) -> Self {
        ValidationRule::Pattern {
            pattern: pattern.into(),
            message: None,
        }
    }

    pub fn schema(schema: Value) -> Self {
        ValidationRule::Schema {
            schema,
            message: None,
        }
    }

    /// Attach the message shown when this rule fails.
    pub fn message(mut self, text: impl Into<String>) -> Self {
        let text = Some(text.into());
        match &mut self {
            ValidationRule::Range { message, .. }
            | ValidationRule::Length { message, .. }
            | ValidationRule::Pattern { message, .. }
            | ValidationRule::Schema { message, .. } => *message = text,
        }
        self
    }

    pub fn custom_message(&self) -> Option<&str> {
        match self {
            ValidationRule::Range { message, .. }
            | ValidationRule::Length { message, .. }
            | ValidationRule::Pattern { message, .. }
            | ValidationRule::Schema { message, .. } => message.as_deref(),
        }
    }
}

/// How an answer is written into the submitted record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Coercion {
    Verbatim,
    /// Parsed to a number; `null` when absent or unparseable.
    Number,
    /// `true` only for a switched-on toggle.
    StrictBool,
    /// `true` when the answer equals the literal.
    Equals(String),
    /// JSON array: selections as-is, text parsed as the body of `[...]`.
    BracketedList,
}

/// Target column for a question in the submitted record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordField {
    pub key: String,
    pub coercion: Coercion,
}

/// Computation behind a derived question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Derivation {
    /// Body-mass index from height (cm) and weight (kg), one decimal place.
    Bmi { height: String, weight: String },
}

impl Derivation {
    pub fn inputs(&self) -> Vec<&str> {
        match self {
            Derivation::Bmi { height, weight } => vec![height.as_str(), weight.as_str()],
        }
    }
}

/// Immutable question definition.
#[derive(Debug, Clone)]
pub struct Question {
    /// Stable answer key and dependency target.
    pub id: String,
    /// Key of the section this question belongs to.
    pub section: String,
    pub prompt: String,
    pub kind: InputKind,
    pub required: bool,
    pub placeholder: Option<String>,
    pub help: Option<String>,
    pub options: Vec<ChoiceOption>,
    pub rule: Option<ValidationRule>,
    pub conditional: Option<ConditionalRule>,
    pub record: Option<RecordField>,
    pub derivation: Option<Derivation>,
}

impl Question {
    pub fn new(
        id: impl Into<String>,
        section: impl Into<String>,
        prompt: impl Into<String>,
        kind: InputKind,
    ) -> Self {
        Self {
            id: id.into(),
            section: section.into(),
            prompt: prompt.into(),
            kind,
            required: false,
            placeholder: None,
            help: None,
            options: Vec::new(),
            rule: None,
            conditional: None,
            record: None,
            derivation: None,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn placeholder(mut self, text: impl Into<String>) -> Self {
        self.placeholder = Some(text.into());
        self
    }

    pub fn help(mut self, text: impl Into<String>) -> Self {
        self.help = Some(text.into());
        self
    }

    /// Options whose stored value differs from the displayed label.
    pub fn options(mut self, options: &[(&str, &str)]) -> Self {
        self.options = options
            .iter()
            .map(|(value, label)| ChoiceOption {
                value: value.to_string(),
                label: label.to_string(),
            })
            .collect();
        self
    }

    /// Options stored exactly as displayed.
    pub fn choices(mut self, values: &[&str]) -> Self {
        self.options = values
            .iter()
            .map(|value| ChoiceOption {
                value: value.to_string(),
                label: value.to_string(),
            })
            .collect();
        self
    }

    pub fn rule(mut self, rule: ValidationRule) -> Self {
        self.rule = Some(rule);
        self
    }

    pub fn shown_when(mut self, depends_on: impl Into<String>, condition: Condition) -> Self {
        self.conditional = Some(ConditionalRule {
            depends_on: depends_on.into(),
            condition,
        });
        self
    }

    pub fn record(mut self, key: impl Into<String>, coercion: Coercion) -> Self {
        self.record = Some(RecordField {
            key: key.into(),
            coercion,
        });
        self
    }

    pub fn derived(mut self, derivation: Derivation) -> Self {
        self.derivation = Some(derivation);
        self
    }

    pub fn option_label(&self, value: &str) -> Option<&str> {
        self.options
            .iter()
            .find(|option| option.value == value)
            .map(|option| option.label.as_str())
    }

    /// Type a raw renderer value according to this question's kind.
    ///
    /// Text that does not parse for numeric or date kinds is kept as text so
    /// validation can report it instead of silently dropping the input.
    pub fn coerce(&self, raw: RawInput) -> Answer {
        match (self.kind, raw) {
            (InputKind::Number, RawInput::Text(text)) => text
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|value| value.is_finite())
                .map(Answer::Number)
                .unwrap_or(Answer::Text(text)),
            (InputKind::Date, RawInput::Text(text)) => {
                NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d")
                    .map(Answer::Date)
                    .unwrap_or(Answer::Text(text))
            }
            (InputKind::Toggle, RawInput::Toggle(value)) => Answer::Flag(value),
            (InputKind::Toggle, RawInput::Text(text)) => match text.trim() {
                "true" => Answer::Flag(true),
                "false" => Answer::Flag(false),
                _ => Answer::Text(text),
            },
            (InputKind::MultiSelect, RawInput::Selection(values)) => Answer::Choices(values),
            (InputKind::MultiSelect, RawInput::Text(text)) => Answer::Choices(
                text.split(',')
                    .map(str::trim)
                    .filter(|value| !value.is_empty())
                    .map(str::to_string)
                    .collect(),
            ),
            (_, RawInput::Text(text)) => Answer::Text(text),
            (_, RawInput::Toggle(value)) => Answer::Flag(value),
            (_, RawInput::Selection(values)) => Answer::Text(values.join(",")),
        }
    }
}

/// Declared section: stable key and display title.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionInfo {
    pub key: String,
    pub title: String,
}

impl SectionInfo {
    pub fn new(key: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            title: title.into(),
        }
    }
}

/// Integrity violations found while building a catalog.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("catalog invariant violations:\n- {}", .violations.join("\n- "))]
pub struct CatalogError {
    pub violations: Vec<String>,
}

/// Ordered, read-only question catalog.
///
/// Construction runs the integrity pass, so a `Catalog` value always has
/// unique ids and backward-only conditional dependencies.
#[derive(Debug, Clone)]
pub struct Catalog {
    sections: Vec<SectionInfo>,
    questions: Vec<Question>,
    index: HashMap<String, usize>,
}

impl Catalog {
    pub fn new(sections: Vec<SectionInfo>, questions: Vec<Question>) -> Result<Self, CatalogError> {
        let violations = validate_catalog(&sections, &questions);
        if !violations.is_empty() {
            return Err(CatalogError { violations });
        }
        let index = questions
            .iter()
            .enumerate()
            .map(|(position, question)| (question.id.clone(), position))
            .collect();
        Ok(Self {
            sections,
            questions,
            index,
        })
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn sections(&self) -> &[SectionInfo] {
        &self.sections
    }

    pub fn question(&self, id: &str) -> Option<&Question> {
        self.index.get(id).map(|&position| &self.questions[position])
    }

    /// Display title for a section key; falls back to the key itself.
    pub fn section_title<'a>(&'a self, key: &'a str) -> &'a str {
        self.sections
            .iter()
            .find(|section| section.key == key)
            .map(|section| section.title.as_str())
            .unwrap_or(key)
    }

    /// Derived questions that read `input_id`.
    pub fn derived_from<'a>(&'a self, input_id: &'a str) -> impl Iterator<Item = &'a Question> + 'a {
        self.questions.iter().filter(move |question| {
            question
                .derivation
                .as_ref()
                .is_some_and(|derivation| derivation.inputs().contains(&input_id))
        })
    }

    pub fn derived_questions(&self) -> impl Iterator<Item = &Question> {
        self.questions
            .iter()
            .filter(|question| question.derivation.is_some())
    }
}
