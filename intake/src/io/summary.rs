//! Markdown review of the answers, rendered through minijinja.

use anyhow::{Context, Result};
use minijinja::{Environment, context};
use serde::Serialize;

use crate::core::catalog::{Catalog, InputKind, Question};
use crate::core::resolver::{progress, section_questions, sections_of, visible_questions};
use crate::core::types::{Answer, AnswerSet};
use crate::questionnaire::TITLE;

const SUMMARY_TEMPLATE: &str = include_str!("templates/summary.md");

#[derive(Debug, Clone, Serialize)]
struct SummaryItem {
    prompt: String,
    value: String,
}

#[derive(Debug, Clone, Serialize)]
struct SummarySection {
    title: String,
    items: Vec<SummaryItem>,
}

/// Render every visible, answered question grouped by section title.
pub fn render_summary(catalog: &Catalog, answers: &AnswerSet) -> Result<String> {
    let mut env = Environment::new();
    env.add_template("summary", SUMMARY_TEMPLATE)
        .context("load summary template")?;
    let template = env.get_template("summary")?;

    let visible = visible_questions(catalog, answers);
    let sections: Vec<SummarySection> = sections_of(&visible)
        .into_iter()
        .map(|key| SummarySection {
            title: catalog.section_title(key).to_string(),
            items: section_questions(&visible, key)
                .into_iter()
                .filter_map(|question| summary_item(question, answers))
                .collect(),
        })
        .filter(|section| !section.items.is_empty())
        .collect();

    let rendered = template
        .render(context! {
            title => TITLE,
            sections => sections,
            progress => progress(catalog, answers),
        })
        .context("render summary")?;
    Ok(rendered)
}

fn summary_item(question: &Question, answers: &AnswerSet) -> Option<SummaryItem> {
    let answer = answers.get(&question.id).filter(|answer| !answer.is_empty())?;
    Some(SummaryItem {
        prompt: question.prompt.clone(),
        value: display_value(question, answer),
    })
}

/// Show option labels instead of stored values for choice questions.
fn display_value(question: &Question, answer: &Answer) -> String {
    match (question.kind, answer) {
        (InputKind::Select | InputKind::Radio, Answer::Text(value)) => question
            .option_label(value)
            .unwrap_or(value)
            .to_string(),
        (InputKind::MultiSelect, Answer::Choices(values)) => values
            .iter()
            .map(|value| question.option_label(value).unwrap_or(value))
            .collect::<Vec<_>>()
            .join(", "),
        _ => answer.display(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::questionnaire::default_catalog;

    #[test]
    fn summary_groups_answers_by_section_with_labels() {
        let catalog = default_catalog().expect("catalog");
        let answers: AnswerSet = [
            ("first_name", Answer::text("דוד")),
            ("has_spouse", Answer::text("yes")),
            ("spouse_first_name", Answer::text("רות")),
            (
                "focus_areas",
                Answer::Choices(vec!["pension".into(), "health".into()]),
            ),
        ]
        .into_iter()
        .collect();

        let summary = render_summary(&catalog, &answers).expect("render");
        assert!(summary.starts_with("# NOA - טופס קליטת לקוח חדש"));
        assert!(summary.contains("## פרטים אישיים"));
        assert!(summary.contains("- **מה השם הפרטי שלך?**: דוד"));
        assert!(summary.contains("- **האם יש לך בן/בת זוג?**: כן"));
        assert!(summary.contains("פנסיה, ביטוח בריאות"));
        assert!(!summary.contains("## בריאות"));
    }

    #[test]
    fn hidden_answers_are_left_out() {
        let catalog = default_catalog().expect("catalog");
        let answers: AnswerSet = [
            ("has_spouse", Answer::text("no")),
            ("spouse_first_name", Answer::text("רות")),
        ]
        .into_iter()
        .collect();

        let summary = render_summary(&catalog, &answers).expect("render");
        assert!(!summary.contains("רות"));
    }
}
