//! Client intake questionnaire CLI.
//!
//! Fill the questionnaire interactively (`fill`), or validate, summarize and
//! submit a JSON answers file. Drafts live under the configured `draft_dir`.

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Result, bail};
use clap::{Parser, Subcommand};
use intake::check::{check_answers, load_answers};
use intake::console::{ConsoleOutcome, run_console};
use intake::core::catalog::Catalog;
use intake::core::session::{Step, SubmitRejected};
use intake::core::types::ErrorMap;
use intake::exit_codes;
use intake::flow::{IntakeFlow, SubmitOutcome};
use intake::io::config::{DEFAULT_CONFIG_PATH, IntakeConfig, load_config, write_config};
use intake::io::draft_store::{DraftStore, FileDraftStore, MemoryDraftStore};
use intake::io::submit::{ConfiguredSubmitter, RestSubmitter};
use intake::io::summary::render_summary;
use intake::logging;
use intake::questionnaire::{TITLE, default_catalog};
use tracing::warn;

#[derive(Parser)]
#[command(name = "intake", version, about = "Client intake questionnaire")]
struct Cli {
    /// Path to the TOML config file.
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Write a default config file at `--config`.
    Init {
        /// Replace an existing config file.
        #[arg(long)]
        force: bool,
    },
    /// Check catalog integrity and list its sections.
    Catalog,
    /// Validate an answers file; exits 2 when any visible section has errors.
    Check {
        #[arg(long)]
        answers: PathBuf,
        /// Only check this visible section (0-based).
        #[arg(long)]
        section: Option<usize>,
    },
    /// Print a Markdown review of an answers file.
    Summary {
        #[arg(long)]
        answers: PathBuf,
    },
    /// Fill the questionnaire interactively, resuming any saved draft.
    Fill,
    /// Validate an answers file and submit it to the configured backend.
    Submit {
        #[arg(long)]
        answers: PathBuf,
    },
    /// Inspect or clear the local draft.
    Draft {
        #[command(subcommand)]
        action: DraftAction,
    },
}

#[derive(Subcommand)]
enum DraftAction {
    /// Print the saved draft as JSON.
    Show,
    /// Delete the saved draft.
    Clear,
}

fn main() {
    logging::init();
    let code = match run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{:#}", err);
            exit_codes::INVALID
        }
    };
    std::process::exit(code);
}

fn run() -> Result<i32> {
    let cli = Cli::parse();
    let command = match cli.command {
        Command::Init { force } => return cmd_init(&cli.config, force),
        command => command,
    };
    let cfg = load_config(&cli.config)?;
    match command {
        Command::Init { force } => cmd_init(&cli.config, force),
        Command::Catalog => cmd_catalog(),
        Command::Check { answers, section } => cmd_check(&answers, section),
        Command::Summary { answers } => cmd_summary(&answers),
        Command::Fill => cmd_fill(&cfg),
        Command::Submit { answers } => cmd_submit(&cfg, &answers),
        Command::Draft { action } => cmd_draft(&cfg, action),
    }
}

fn cmd_init(path: &Path, force: bool) -> Result<i32> {
    if path.exists() && !force {
        bail!("{} already exists (use --force to replace it)", path.display());
    }
    write_config(path, &IntakeConfig::default())?;
    println!("wrote {}", path.display());
    Ok(exit_codes::OK)
}

fn cmd_catalog() -> Result<i32> {
    let catalog = default_catalog()?;
    println!("{TITLE}");
    for (ordinal, section) in catalog.sections().iter().enumerate() {
        let count = catalog
            .questions()
            .iter()
            .filter(|question| question.section == section.key)
            .count();
        println!(
            "{}. {} ({}): {} questions",
            ordinal + 1,
            section.title,
            section.key,
            count
        );
    }
    println!("total: {} questions", catalog.questions().len());
    Ok(exit_codes::OK)
}

fn cmd_check(answers_path: &Path, section: Option<usize>) -> Result<i32> {
    let catalog = default_catalog()?;
    let answers = load_answers(&catalog, answers_path)?;
    let report = check_answers(&catalog, &answers, section)?;
    println!(
        "visible sections: {}, progress: {}%",
        report.visible_sections, report.progress
    );
    for section in &report.sections {
        if section.errors.is_empty() {
            println!("[{}] {}: ok", section.index, section.title);
        } else {
            println!("[{}] {}:", section.index, section.title);
            print_errors(&catalog, &section.errors);
        }
    }
    if report.is_complete() {
        Ok(exit_codes::OK)
    } else {
        Ok(exit_codes::INCOMPLETE)
    }
}

fn cmd_summary(answers_path: &Path) -> Result<i32> {
    let catalog = default_catalog()?;
    let answers = load_answers(&catalog, answers_path)?;
    print!("{}", render_summary(&catalog, &answers)?);
    Ok(exit_codes::OK)
}

fn cmd_fill(cfg: &IntakeConfig) -> Result<i32> {
    let catalog = default_catalog()?;
    let submitter = ConfiguredSubmitter::new(cfg.submit.clone());
    if let Err(err) = submitter.check() {
        warn!(
            error = %format!("{err:#}"),
            "submission backend unavailable, answers are kept as a draft"
        );
    }
    let drafts = FileDraftStore::new(&cfg.draft_dir);
    let mut flow = IntakeFlow::open(catalog, drafts, submitter);

    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut output = io::stdout().lock();
    let outcome = run_console(&mut flow, &mut input, &mut output)?;
    output.flush()?;
    Ok(match outcome {
        ConsoleOutcome::Submitted => exit_codes::OK,
        ConsoleOutcome::SubmitFailed => exit_codes::SUBMIT_FAILED,
        ConsoleOutcome::Quit => exit_codes::INCOMPLETE,
    })
}

fn cmd_submit(cfg: &IntakeConfig, answers_path: &Path) -> Result<i32> {
    let catalog = default_catalog()?;
    let answers = load_answers(&catalog, answers_path)?;
    let report = check_answers(&catalog, &answers, None)?;
    if !report.is_complete() {
        for section in report.sections.iter().filter(|s| !s.errors.is_empty()) {
            println!("[{}] {}:", section.index, section.title);
            print_errors(&catalog, &section.errors);
        }
        return Ok(exit_codes::INCOMPLETE);
    }

    let submitter = RestSubmitter::from_config(&cfg.submit)?;
    let mut flow = IntakeFlow::open(
        catalog.clone(),
        MemoryDraftStore::with_draft(answers),
        submitter,
    );

    if let Step::Blocked { .. } = flow.advance_to_last() {
        report_blocked(&catalog, &flow);
        return Ok(exit_codes::INCOMPLETE);
    }
    match flow.submit() {
        SubmitOutcome::Submitted => {
            println!("submitted");
            Ok(exit_codes::OK)
        }
        SubmitOutcome::Failed { notice } => {
            eprintln!("{notice}");
            Ok(exit_codes::SUBMIT_FAILED)
        }
        SubmitOutcome::Rejected(SubmitRejected::Invalid { .. }) => {
            report_blocked(&catalog, &flow);
            Ok(exit_codes::INCOMPLETE)
        }
        SubmitOutcome::Rejected(rejected) => bail!("submission rejected: {:?}", rejected),
    }
}

fn cmd_draft(cfg: &IntakeConfig, action: DraftAction) -> Result<i32> {
    let store = FileDraftStore::new(&cfg.draft_dir);
    match action {
        DraftAction::Show => match store.load_draft() {
            Some(answers) => println!("{}", serde_json::to_string_pretty(&answers)?),
            None => println!("no draft at {}", store.path().display()),
        },
        DraftAction::Clear => {
            store.clear_draft();
            println!("draft cleared");
        }
    }
    Ok(exit_codes::OK)
}

fn report_blocked<D: DraftStore>(catalog: &Catalog, flow: &IntakeFlow<D, RestSubmitter>) {
    let session = flow.session();
    println!(
        "section {} ({}) is incomplete:",
        session.current_section(),
        session.current_section_title().unwrap_or_default()
    );
    print_errors(catalog, session.errors());
}

fn print_errors(catalog: &Catalog, errors: &ErrorMap) {
    for (id, error) in errors {
        let prompt = catalog
            .question(id)
            .map(|question| question.prompt.as_str())
            .unwrap_or(id);
        println!("  - {} ({}): {}", id, prompt, error.message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_check_with_section() {
        let cli = Cli::parse_from(["intake", "check", "--answers", "a.json", "--section", "2"]);
        assert!(matches!(
            cli.command,
            Command::Check { section: Some(2), .. }
        ));
        assert_eq!(cli.config, PathBuf::from(DEFAULT_CONFIG_PATH));
    }

    #[test]
    fn parse_global_config_after_subcommand() {
        let cli = Cli::parse_from(["intake", "draft", "clear", "--config", "other.toml"]);
        assert!(matches!(
            cli.command,
            Command::Draft {
                action: DraftAction::Clear
            }
        ));
        assert_eq!(cli.config, PathBuf::from("other.toml"));
    }

    #[test]
    fn parse_init_force() {
        let cli = Cli::parse_from(["intake", "init", "--force"]);
        assert!(matches!(cli.command, Command::Init { force: true }));
    }

    #[test]
    fn parse_fill() {
        let cli = Cli::parse_from(["intake", "fill"]);
        assert!(matches!(cli.command, Command::Fill));
    }
}
