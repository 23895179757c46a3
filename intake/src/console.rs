//! Line-oriented console renderer for an [`IntakeFlow`].
//!
//! Each visible question of the current section is asked in catalog order.
//! Visibility is recomputed after every answer, so follow-up questions appear
//! as soon as their dependency is answered. An empty line keeps the current
//! answer; `:back` returns to the previous section and `:quit` stops (the
//! draft is already saved). A failed submission returns to the last section
//! so the client can edit and submit again.

use std::collections::HashSet;
use std::io::{BufRead, Write};

use anyhow::{Context, Result};

use crate::core::catalog::{InputKind, Question};
use crate::core::session::Step;
use crate::core::types::{ErrorMap, RawInput};
use crate::flow::{IntakeFlow, SubmitOutcome};
use crate::io::draft_store::DraftStore;
use crate::io::submit::Submitter;
use crate::io::summary::render_summary;
use crate::questionnaire::TITLE;

const BACK: &str = ":back";
const QUIT: &str = ":quit";

/// How a console session ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleOutcome {
    Submitted,
    /// The client left after a failed submission; the draft is kept.
    SubmitFailed,
    /// Input ended or the user quit before submitting.
    Quit,
}

enum Control {
    Done,
    Back,
    Quit,
}

pub fn run_console<D, S, R, W>(
    flow: &mut IntakeFlow<D, S>,
    input: &mut R,
    output: &mut W,
) -> Result<ConsoleOutcome>
where
    D: DraftStore,
    S: Submitter,
    R: BufRead,
    W: Write,
{
    writeln!(output, "{TITLE}")?;
    writeln!(output, "({BACK} לחזרה, {QUIT} ליציאה)")?;
    let mut only: Option<ErrorMap> = None;
    let mut failed = false;
    let stopped = |failed: bool| {
        if failed {
            ConsoleOutcome::SubmitFailed
        } else {
            ConsoleOutcome::Quit
        }
    };

    loop {
        write_header(flow, output)?;
        match fill_section(flow, only.take(), input, output)? {
            Control::Quit => return Ok(stopped(failed)),
            Control::Back => {
                flow.back();
                continue;
            }
            Control::Done => {}
        }

        if !flow.session().is_last_section() {
            if let Step::Blocked { .. } = flow.next() {
                write_errors(flow, output)?;
                only = Some(flow.session().errors().clone());
            }
            continue;
        }

        let summary = render_summary(flow.session().catalog(), flow.session().answers())?;
        writeln!(output, "\n{summary}")?;
        writeln!(output, "לשלוח את הטופס? (כן/לא)")?;
        let Some(line) = read_line(input)? else {
            return Ok(stopped(failed));
        };
        match line.trim() {
            QUIT => return Ok(stopped(failed)),
            BACK => {
                flow.back();
                continue;
            }
            answer if !is_yes(answer) => continue,
            _ => {}
        }
        match flow.submit() {
            SubmitOutcome::Submitted => {
                writeln!(output, "הטופס נשלח בהצלחה. תודה!")?;
                return Ok(ConsoleOutcome::Submitted);
            }
            SubmitOutcome::Failed { notice } => {
                writeln!(output, "{notice}")?;
                failed = true;
            }
            SubmitOutcome::Rejected(_) => {
                write_errors(flow, output)?;
                only = Some(flow.session().errors().clone());
            }
        }
    }
}

fn write_header<D, S, W>(flow: &IntakeFlow<D, S>, output: &mut W) -> Result<()>
where
    D: DraftStore,
    S: Submitter,
    W: Write,
{
    let session = flow.session();
    writeln!(
        output,
        "\nשלב {} מתוך {}: {} ({}%)",
        session.current_section() + 1,
        session.section_count(),
        session.current_section_title().unwrap_or_default(),
        session.progress()
    )?;
    Ok(())
}

/// Ask every pending question of the current section once.
///
/// With `only`, just the questions that failed validation are asked again.
fn fill_section<D, S, R, W>(
    flow: &mut IntakeFlow<D, S>,
    only: Option<ErrorMap>,
    input: &mut R,
    output: &mut W,
) -> Result<Control>
where
    D: DraftStore,
    S: Submitter,
    R: BufRead,
    W: Write,
{
    let mut asked: HashSet<String> = HashSet::new();
    loop {
        let pending = flow
            .session()
            .current_questions()
            .into_iter()
            .find(|question| {
                !asked.contains(&question.id)
                    && only
                        .as_ref()
                        .is_none_or(|errors| errors.contains_key(&question.id))
            })
            .cloned();
        let Some(question) = pending else {
            return Ok(Control::Done);
        };
        asked.insert(question.id.clone());

        if question.kind == InputKind::Derived {
            if let Some(view) = flow.session().field_view(&question.id) {
                let value = view.value.map(|answer| answer.display()).unwrap_or_default();
                writeln!(output, "{}: {}", question.prompt, value)?;
            }
            continue;
        }

        write_prompt(flow, &question, output)?;
        let Some(line) = read_line(input)? else {
            return Ok(Control::Quit);
        };
        match line.trim() {
            BACK => return Ok(Control::Back),
            QUIT => return Ok(Control::Quit),
            "" if flow.session().answers().is_answered(&question.id) => continue,
            _ => {}
        }
        if let Err(rejected) = flow.change(&question.id, parse_input(&question, &line)) {
            writeln!(output, "! {}", rejected.message())?;
        }
    }
}

fn write_prompt<D, S, W>(flow: &IntakeFlow<D, S>, question: &Question, output: &mut W) -> Result<()>
where
    D: DraftStore,
    S: Submitter,
    W: Write,
{
    let marker = if question.required { " *" } else { "" };
    writeln!(output, "{}{}", question.prompt, marker)?;
    if let Some(help) = &question.help {
        writeln!(output, "  {help}")?;
    }
    for (position, option) in question.options.iter().enumerate() {
        writeln!(output, "  {}. {}", position + 1, option.label)?;
    }
    if question.kind == InputKind::Toggle {
        writeln!(output, "  (כן/לא)")?;
    }
    if let Some(view) = flow.session().field_view(&question.id) {
        if let Some(error) = view.error {
            writeln!(output, "  ! {}", error.message)?;
        }
        if let Some(value) = view.value.filter(|answer| !answer.is_empty()) {
            writeln!(output, "  [{}]", value.display())?;
        } else if let Some(placeholder) = &question.placeholder {
            writeln!(output, "  ({placeholder})")?;
        }
    }
    write!(output, "> ")?;
    output.flush().context("flush console output")?;
    Ok(())
}

fn write_errors<D, S, W>(flow: &IntakeFlow<D, S>, output: &mut W) -> Result<()>
where
    D: DraftStore,
    S: Submitter,
    W: Write,
{
    let session = flow.session();
    for (id, error) in session.errors() {
        let prompt = session
            .catalog()
            .question(id)
            .map(|question| question.prompt.as_str())
            .unwrap_or(id);
        writeln!(output, "! {}: {}", prompt, error.message)?;
    }
    Ok(())
}

/// Translate a console line into the raw input a renderer would report.
///
/// Choice questions accept either the option number or the stored value.
pub fn parse_input(question: &Question, line: &str) -> RawInput {
    let line = line.trim();
    match question.kind {
        InputKind::Toggle => RawInput::Toggle(is_yes(line)),
        InputKind::Select | InputKind::Radio => RawInput::Text(option_value(question, line)),
        InputKind::MultiSelect => RawInput::Selection(
            line.split(',')
                .map(str::trim)
                .filter(|token| !token.is_empty())
                .map(|token| option_value(question, token))
                .collect(),
        ),
        _ => RawInput::Text(line.to_string()),
    }
}

fn option_value(question: &Question, token: &str) -> String {
    token
        .parse::<usize>()
        .ok()
        .and_then(|number| number.checked_sub(1))
        .and_then(|index| question.options.get(index))
        .map(|option| option.value.clone())
        .or_else(|| {
            question
                .options
                .iter()
                .find(|option| option.label == token)
                .map(|option| option.value.clone())
        })
        .unwrap_or_else(|| token.to_string())
}

fn is_yes(line: &str) -> bool {
    matches!(
        line.trim().to_lowercase().as_str(),
        "כן" | "y" | "yes" | "true" | "1"
    )
}

fn read_line<R: BufRead>(input: &mut R) -> Result<Option<String>> {
    let mut line = String::new();
    let read = input.read_line(&mut line).context("read console input")?;
    if read == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
}
