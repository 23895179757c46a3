//! Visibility and validation resolution over a catalog and an answer set.
//!
//! Every function here is pure: results depend only on the catalog and the
//! answers passed in, and catalog order is always preserved. Callers must
//! recompute after each answer change instead of caching results.

use crate::core::catalog::{Catalog, Question};
use crate::core::rules::check_answer;
use crate::core::types::{AnswerSet, ErrorMap, FieldError};

/// True unless the question's conditional rule evaluates false.
pub fn is_visible(question: &Question, answers: &AnswerSet) -> bool {
    match &question.conditional {
        None => true,
        Some(rule) => rule.condition.matches(answers.get(&rule.depends_on)),
    }
}

/// Questions currently visible, in catalog order.
pub fn visible_questions<'a>(catalog: &'a Catalog, answers: &AnswerSet) -> Vec<&'a Question> {
    catalog
        .questions()
        .iter()
        .filter(|question| is_visible(question, answers))
        .collect()
}

/// Distinct section keys in first-occurrence order.
pub fn sections_of<'a>(visible: &[&'a Question]) -> Vec<&'a str> {
    let mut sections: Vec<&str> = Vec::new();
    for question in visible {
        if !sections.contains(&question.section.as_str()) {
            sections.push(question.section.as_str());
        }
    }
    sections
}

/// Visible questions belonging to `section`, in catalog order.
pub fn section_questions<'a>(visible: &[&'a Question], section: &str) -> Vec<&'a Question> {
    visible
        .iter()
        .copied()
        .filter(|question| question.section == section)
        .collect()
}

/// Validate the given questions against the answers.
///
/// A required question without a non-empty answer gets a required-field
/// error; any present answer is checked against its kind and rule. An empty
/// map means the section is complete.
pub fn validate_section(questions: &[&Question], answers: &AnswerSet) -> ErrorMap {
    let mut errors = ErrorMap::new();
    for question in questions {
        match answers.get(&question.id) {
            Some(answer) if !answer.is_empty() => {
                if let Some(error) = check_answer(question, answer) {
                    errors.insert(question.id.clone(), error);
                }
            }
            _ if question.required => {
                errors.insert(question.id.clone(), FieldError::required());
            }
            _ => {}
        }
    }
    errors
}

/// Share of visible required questions that are answered, as a whole percentage.
pub fn progress(catalog: &Catalog, answers: &AnswerSet) -> u8 {
    let required: Vec<&Question> = visible_questions(catalog, answers)
        .into_iter()
        .filter(|question| question.required)
        .collect();
    if required.is_empty() {
        return 100;
    }
    let answered = required
        .iter()
        .filter(|question| answers.is_answered(&question.id))
        .count();
    ((answered * 100 + required.len() / 2) / required.len()) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::catalog::{Condition, InputKind, SectionInfo, ValidationRule};
    use crate::core::types::{Answer, FieldErrorKind};

    fn catalog() -> Catalog {
        let sections = vec![
            SectionInfo::new("work", "Work"),
            SectionInfo::new("extra", "Extra"),
        ];
        let questions = vec![
            Question::new("status", "work", "Status", InputKind::Select)
                .required()
                .choices(&["employed", "self", "none"]),
            Question::new("employer", "work", "Employer", InputKind::ShortText)
                .required()
                .shown_when("status", Condition::OneOf(vec!["employed".into()])),
            Question::new("years", "work", "Years", InputKind::Number)
                .rule(ValidationRule::range(0.0, 50.0)),
            Question::new("business", "extra", "Business", InputKind::ShortText)
                .shown_when("status", Condition::Equals("self".into())),
        ];
        Catalog::new(sections, questions).expect("catalog")
    }

    fn ids(questions: &[&Question]) -> Vec<String> {
        questions.iter().map(|q| q.id.clone()).collect()
    }

    #[test]
    fn hidden_questions_are_excluded_even_with_answers() {
        let catalog = catalog();
        let answers: AnswerSet = [
            ("status", Answer::text("none")),
            ("employer", Answer::text("Acme")),
        ]
        .into_iter()
        .collect();

        let visible = visible_questions(&catalog, &answers);
        assert_eq!(ids(&visible), vec!["status", "years"]);
    }

    #[test]
    fn unanswered_dependency_hides_literal_conditions() {
        let catalog = catalog();
        let visible = visible_questions(&catalog, &AnswerSet::new());
        assert_eq!(ids(&visible), vec!["status", "years"]);
        assert_eq!(sections_of(&visible), vec!["work"]);
    }

    #[test]
    fn sections_follow_first_occurrence() {
        let catalog = catalog();
        let answers: AnswerSet = [("status", Answer::text("self"))].into_iter().collect();
        let visible = visible_questions(&catalog, &answers);
        assert_eq!(sections_of(&visible), vec!["work", "extra"]);
    }

    #[test]
    fn hidden_required_question_is_not_enforced() {
        let catalog = catalog();
        let answers: AnswerSet = [("status", Answer::text("none"))].into_iter().collect();
        let visible = visible_questions(&catalog, &answers);
        let work = section_questions(&visible, "work");
        assert!(validate_section(&work, &answers).is_empty());
    }

    #[test]
    fn validate_reports_required_then_rule_errors() {
        let catalog = catalog();
        let answers: AnswerSet = [
            ("status", Answer::text("employed")),
            ("employer", Answer::text("  ")),
            ("years", Answer::Number(60.0)),
        ]
        .into_iter()
        .collect();
        let visible = visible_questions(&catalog, &answers);
        let errors = validate_section(&section_questions(&visible, "work"), &answers);

        assert_eq!(errors.len(), 2);
        assert_eq!(errors["employer"].kind, FieldErrorKind::Required);
        assert_eq!(errors["years"].kind, FieldErrorKind::Range);
    }

    #[test]
    fn progress_counts_visible_required_only() {
        let catalog = catalog();
        let answers: AnswerSet = [("status", Answer::text("none"))].into_iter().collect();
        assert_eq!(progress(&catalog, &answers), 100);

        let employed: AnswerSet = [("status", Answer::text("employed"))].into_iter().collect();
        assert_eq!(progress(&catalog, &employed), 50);
    }
}
