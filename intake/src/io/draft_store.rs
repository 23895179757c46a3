//! Local draft persistence.
//!
//! Drafts are best-effort: every failure is logged and swallowed so a broken
//! disk never blocks filling in the form. A draft that cannot be read back is
//! treated as no draft at all.

use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use jsonschema::validator_for;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, instrument, warn};

use crate::core::types::AnswerSet;

/// Fixed storage key for the questionnaire draft.
pub const DRAFT_KEY: &str = "noa-questionnaire-progress";
pub const DRAFT_VERSION: u32 = 1;

const DRAFT_SCHEMA: &str = include_str!("../../schemas/draft/v1.schema.json");

/// Abstraction over draft backends. None of the operations fail.
pub trait DraftStore {
    fn load_draft(&self) -> Option<AnswerSet>;
    fn save_draft(&self, answers: &AnswerSet);
    fn clear_draft(&self);
}

#[derive(Debug, Serialize, Deserialize)]
struct DraftDocument {
    version: u32,
    answers: AnswerSet,
}

/// Draft stored as `<dir>/noa-questionnaire-progress.json`.
#[derive(Debug, Clone)]
pub struct FileDraftStore {
    path: PathBuf,
}

impl FileDraftStore {
    pub fn new(dir: &Path) -> Self {
        Self {
            path: dir.join(format!("{DRAFT_KEY}.json")),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<Option<AnswerSet>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let contents = fs::read_to_string(&self.path)
            .with_context(|| format!("read draft {}", self.path.display()))?;
        let value: Value = serde_json::from_str(&contents)
            .with_context(|| format!("parse draft {}", self.path.display()))?;
        validate_schema(&value)?;
        let document: DraftDocument = serde_json::from_value(value)
            .with_context(|| format!("deserialize draft {}", self.path.display()))?;
        Ok(Some(document.answers))
    }

    fn write(&self, answers: &AnswerSet) -> Result<()> {
        let document = DraftDocument {
            version: DRAFT_VERSION,
            answers: answers.clone(),
        };
        let mut buf = serde_json::to_string_pretty(&document).context("serialize draft")?;
        buf.push('\n');
        write_atomic(&self.path, &buf)
    }
}

impl DraftStore for FileDraftStore {
    #[instrument(skip_all, fields(path = %self.path.display()))]
    fn load_draft(&self) -> Option<AnswerSet> {
        match self.read() {
            Ok(Some(answers)) => {
                debug!(answers = answers.len(), "draft loaded");
                Some(answers)
            }
            Ok(None) => None,
            Err(err) => {
                warn!(error = %format!("{err:#}"), "ignoring unreadable draft");
                None
            }
        }
    }

    #[instrument(skip_all, fields(path = %self.path.display()))]
    fn save_draft(&self, answers: &AnswerSet) {
        if answers.is_empty() {
            return;
        }
        match self.write(answers) {
            Ok(()) => debug!(answers = answers.len(), "draft saved"),
            Err(err) => warn!(error = %format!("{err:#}"), "failed to save draft"),
        }
    }

    #[instrument(skip_all, fields(path = %self.path.display()))]
    fn clear_draft(&self) {
        match fs::remove_file(&self.path) {
            Ok(()) => debug!("draft cleared"),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
            Err(err) => warn!(error = %err, "failed to clear draft"),
        }
    }
}

/// Draft kept in memory; useful for tests and for runs without a draft dir.
#[derive(Debug, Default)]
pub struct MemoryDraftStore {
    draft: RefCell<Option<AnswerSet>>,
    saves: RefCell<usize>,
}

impl MemoryDraftStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_draft(answers: AnswerSet) -> Self {
        Self {
            draft: RefCell::new(Some(answers)),
            saves: RefCell::new(0),
        }
    }

    pub fn current(&self) -> Option<AnswerSet> {
        self.draft.borrow().clone()
    }

    /// Number of non-empty saves so far.
    pub fn saves(&self) -> usize {
        *self.saves.borrow()
    }
}

impl DraftStore for MemoryDraftStore {
    fn load_draft(&self) -> Option<AnswerSet> {
        self.current()
    }

    fn save_draft(&self, answers: &AnswerSet) {
        if answers.is_empty() {
            return;
        }
        *self.draft.borrow_mut() = Some(answers.clone());
        *self.saves.borrow_mut() += 1;
    }

    fn clear_draft(&self) {
        *self.draft.borrow_mut() = None;
    }
}

fn validate_schema(value: &Value) -> Result<()> {
    let schema: Value = serde_json::from_str(DRAFT_SCHEMA).context("parse draft schema")?;
    let compiled = validator_for(&schema).map_err(|err| anyhow!("invalid schema: {}", err))?;
    if !compiled.is_valid(value) {
        let messages = compiled
            .iter_errors(value)
            .map(|err| err.to_string())
            .collect::<Vec<_>>();
        return Err(anyhow!(
            "draft schema validation failed: {}",
            messages.join("; ")
        ));
    }
    Ok(())
}

fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let parent = path
        .parent()
        .with_context(|| format!("draft path missing parent {}", path.display()))?;
    fs::create_dir_all(parent).with_context(|| format!("create directory {}", parent.display()))?;
    let tmp_path = path.with_extension("json.tmp");
    fs::write(&tmp_path, contents)
        .with_context(|| format!("write temp draft {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path).with_context(|| format!("replace draft {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Answer;

    fn answers() -> AnswerSet {
        [
            ("first_name", Answer::text("דוד")),
            ("height", Answer::Number(170.0)),
            ("consent_data_processing", Answer::Flag(true)),
            (
                "focus_areas",
                Answer::Choices(vec!["pension".into(), "health".into()]),
            ),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn draft_round_trips() {
        let temp = tempfile::tempdir().expect("tempdir");
        let store = FileDraftStore::new(temp.path());
        store.save_draft(&answers());
        assert_eq!(store.load_draft(), Some(answers()));
    }

    #[test]
    fn draft_file_uses_fixed_key() {
        let temp = tempfile::tempdir().expect("tempdir");
        let store = FileDraftStore::new(temp.path());
        assert_eq!(
            store.path(),
            temp.path().join("noa-questionnaire-progress.json")
        );
    }

    #[test]
    fn empty_answers_are_not_written() {
        let temp = tempfile::tempdir().expect("tempdir");
        let store = FileDraftStore::new(temp.path());
        store.save_draft(&AnswerSet::new());
        assert!(!store.path().exists());
    }

    #[test]
    fn corrupt_draft_is_treated_as_missing() {
        let temp = tempfile::tempdir().expect("tempdir");
        let store = FileDraftStore::new(temp.path());
        fs::write(store.path(), "{not json").expect("write");
        assert_eq!(store.load_draft(), None);

        fs::write(store.path(), r#"{"version":2,"answers":{}}"#).expect("write");
        assert_eq!(store.load_draft(), None);

        fs::write(
            store.path(),
            r#"{"version":1,"answers":{"height":{"kind":"number","value":"tall"}}}"#,
        )
        .expect("write");
        assert_eq!(store.load_draft(), None);
    }

    #[test]
    fn clear_removes_file_and_tolerates_missing() {
        let temp = tempfile::tempdir().expect("tempdir");
        let store = FileDraftStore::new(temp.path());
        store.save_draft(&answers());
        store.clear_draft();
        assert!(!store.path().exists());
        store.clear_draft();
    }

    #[test]
    fn memory_store_skips_empty_saves() {
        let store = MemoryDraftStore::new();
        store.save_draft(&AnswerSet::new());
        assert_eq!(store.saves(), 0);
        store.save_draft(&answers());
        assert_eq!(store.load_draft(), Some(answers()));
        store.clear_draft();
        assert_eq!(store.load_draft(), None);
    }
}
