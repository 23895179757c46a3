//! Form session state machine.
//!
//! A [`FormSession`] is an explicit context object: it owns one answer set,
//! the current section index and the inline error map. Nothing here performs
//! I/O. Submission is split into [`FormSession::begin_submit`] (validate, build
//! the record, mark busy) and [`FormSession::finish_submit`] (settle with the
//! adapter's result) so the network call can live outside the core.

use std::sync::Arc;

use crate::core::catalog::{Catalog, InputKind, Question};
use crate::core::derived::compute;
use crate::core::record::{ClientRecord, build_record};
use crate::core::resolver::{
    progress, section_questions, sections_of, validate_section, visible_questions,
};
use crate::core::types::{Answer, AnswerSet, ErrorMap, FieldError, RawInput};

/// Generic notice shown when the remote submission fails.
pub const SUBMIT_FAILED_NOTICE: &str = "אירעה שגיאה בשליחת הטופס. אנא נסה שנית.";

/// Where the session is in its lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Phase {
    Editing,
    /// Remote submission in flight; input and re-submission are disabled.
    Submitting,
    Submitted,
    /// Last submission failed; the session is back on the last section.
    SubmitFailed { notice: String },
}

/// Result of a `next`/`back` navigation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    Moved { to: usize },
    /// Validation failed; the error map holds the reasons.
    Blocked { errors: usize },
    /// Already on the first (back) or last (next) section.
    Stayed,
}

/// Why an input change was refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputRejected {
    UnknownQuestion(String),
    ReadOnly(String),
    Locked,
}

impl InputRejected {
    /// Message shown to the client when a change is refused.
    pub fn message(&self) -> &'static str {
        match self {
            Self::UnknownQuestion(_) => "שדה לא מוכר",
            Self::ReadOnly(_) => "שדה זה מחושב אוטומטית ואינו ניתן לעריכה",
            Self::Locked => "הטופס בשליחה, לא ניתן לערוך כעת",
        }
    }
}

/// Why a submission could not start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitRejected {
    Busy,
    AlreadySubmitted,
    NotLastSection,
    Invalid { errors: usize },
    /// The record could not be built from the answers.
    Record(String),
}

/// Everything a renderer needs to draw one visible question.
#[derive(Debug, Clone)]
pub struct FieldView<'a> {
    pub question: &'a Question,
    pub kind: InputKind,
    pub value: Option<&'a Answer>,
    pub error: Option<&'a FieldError>,
}

/// One in-progress intake session.
#[derive(Debug, Clone)]
pub struct FormSession {
    catalog: Arc<Catalog>,
    answers: AnswerSet,
    section: usize,
    errors: ErrorMap,
    phase: Phase,
}

impl FormSession {
    /// Start on the first section, hydrated from `draft` when present.
    pub fn new(catalog: Arc<Catalog>, draft: Option<AnswerSet>) -> Self {
        let mut session = Self {
            catalog,
            answers: draft.unwrap_or_default(),
            section: 0,
            errors: ErrorMap::new(),
            phase: Phase::Editing,
        };
        let derived: Vec<Question> = session.catalog.derived_questions().cloned().collect();
        for question in &derived {
            session.recompute(question);
        }
        session
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn answers(&self) -> &AnswerSet {
        &self.answers
    }

    pub fn errors(&self) -> &ErrorMap {
        &self.errors
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn is_busy(&self) -> bool {
        self.phase == Phase::Submitting
    }

    pub fn visible_questions(&self) -> Vec<&Question> {
        visible_questions(&self.catalog, &self.answers)
    }

    /// Visible section keys, recomputed from the current answers.
    pub fn sections(&self) -> Vec<&str> {
        sections_of(&self.visible_questions())
    }

    pub fn section_count(&self) -> usize {
        self.sections().len()
    }

    /// Current section index, clamped to the live section list.
    pub fn current_section(&self) -> usize {
        self.section.min(self.section_count().saturating_sub(1))
    }

    pub fn current_section_key(&self) -> Option<&str> {
        self.sections().get(self.current_section()).copied()
    }

    pub fn current_section_title(&self) -> Option<&str> {
        self.current_section_key()
            .map(|key| self.catalog.section_title(key))
    }

    pub fn current_questions(&self) -> Vec<&Question> {
        let visible = self.visible_questions();
        match sections_of(&visible).get(self.current_section()) {
            Some(key) => section_questions(&visible, key),
            None => Vec::new(),
        }
    }

    /// True when the current section is the last visible one.
    pub fn is_last_section(&self) -> bool {
        self.current_section() + 1 >= self.section_count()
    }

    /// Percentage of visible required questions answered.
    pub fn progress(&self) -> u8 {
        progress(&self.catalog, &self.answers)
    }

    pub fn field_view(&self, id: &str) -> Option<FieldView<'_>> {
        let question = self.catalog.question(id)?;
        Some(FieldView {
            question,
            kind: question.kind,
            value: self.answers.get(id),
            error: self.errors.get(id),
        })
    }

    /// Apply one input change.
    ///
    /// Clears the error for that question only and recomputes derived
    /// answers that read it. Section state is untouched.
    pub fn set_answer(&mut self, id: &str, raw: RawInput) -> Result<(), InputRejected> {
        if matches!(self.phase, Phase::Submitting | Phase::Submitted) {
            return Err(InputRejected::Locked);
        }
        let question = self
            .catalog
            .question(id)
            .ok_or_else(|| InputRejected::UnknownQuestion(id.to_string()))?;
        if question.kind == InputKind::Derived {
            return Err(InputRejected::ReadOnly(id.to_string()));
        }
        let answer = question.coerce(raw);
        self.answers.insert(id, answer);
        self.errors.remove(id);

        let catalog = Arc::clone(&self.catalog);
        for derived in catalog.derived_from(id) {
            self.recompute(derived);
        }
        Ok(())
    }

    /// Validate the current section; advance when it is complete.
    pub fn next(&mut self) -> Step {
        let errors = validate_section(&self.current_questions(), &self.answers);
        let count = errors.len();
        self.errors = errors;
        if count > 0 {
            return Step::Blocked { errors: count };
        }
        let current = self.current_section();
        if current + 1 < self.section_count() {
            self.section = current + 1;
            Step::Moved { to: self.section }
        } else {
            self.section = current;
            Step::Stayed
        }
    }

    /// Move to the previous section without validating.
    pub fn back(&mut self) -> Step {
        let current = self.current_section();
        if current == 0 {
            self.section = 0;
            return Step::Stayed;
        }
        self.section = current - 1;
        Step::Moved { to: self.section }
    }

    /// Validate the last section and build the record to hand to the adapter.
    ///
    /// On success the session is busy until [`finish_submit`](Self::finish_submit).
    pub fn begin_submit(&mut self) -> Result<ClientRecord, SubmitRejected> {
        match self.phase {
            Phase::Submitting => return Err(SubmitRejected::Busy),
            Phase::Submitted => return Err(SubmitRejected::AlreadySubmitted),
            Phase::Editing | Phase::SubmitFailed { .. } => {}
        }
        if !self.is_last_section() {
            return Err(SubmitRejected::NotLastSection);
        }
        let errors = validate_section(&self.current_questions(), &self.answers);
        let count = errors.len();
        self.errors = errors;
        if count > 0 {
            return Err(SubmitRejected::Invalid { errors: count });
        }
        match build_record(&self.catalog, &self.answers) {
            Ok(record) => {
                self.phase = Phase::Submitting;
                Ok(record)
            }
            Err(reason) => {
                self.phase = Phase::SubmitFailed {
                    notice: SUBMIT_FAILED_NOTICE.to_string(),
                };
                Err(SubmitRejected::Record(reason))
            }
        }
    }

    /// Settle an in-flight submission. Answers are never modified here.
    pub fn finish_submit<E>(&mut self, result: Result<(), E>) -> &Phase {
        if self.phase != Phase::Submitting {
            return &self.phase;
        }
        self.phase = match result {
            Ok(()) => Phase::Submitted,
            Err(_) => Phase::SubmitFailed {
                notice: SUBMIT_FAILED_NOTICE.to_string(),
            },
        };
        &self.phase
    }

    fn recompute(&mut self, question: &Question) {
        let Some(derivation) = &question.derivation else {
            return;
        };
        match compute(derivation, &self.answers) {
            Some(answer) => {
                self.answers.insert(question.id.as_str(), answer);
            }
            None => {
                self.answers.remove(&question.id);
            }
        }
    }
}
