//! Session orchestration: couples a [`FormSession`] with draft persistence
//! and remote submission.
//!
//! Every accepted answer change is auto-saved to the draft store. A
//! successful submission clears the draft; a failed one keeps it so the
//! client can retry later.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::core::catalog::Catalog;
use crate::core::session::{FormSession, InputRejected, Phase, Step, SubmitRejected};
use crate::core::types::RawInput;
use crate::io::draft_store::DraftStore;
use crate::io::submit::Submitter;

/// Result of a submission attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Submitted,
    /// The remote insert failed; answers and draft are kept.
    Failed { notice: String },
    /// Submission never started (not last section, validation errors, busy).
    Rejected(SubmitRejected),
}

pub struct IntakeFlow<D, S> {
    session: FormSession,
    drafts: D,
    submitter: S,
}

impl<D: DraftStore, S: Submitter> IntakeFlow<D, S> {
    /// Start a session, hydrated from the stored draft when one exists.
    pub fn open(catalog: Arc<Catalog>, drafts: D, submitter: S) -> Self {
        let draft = drafts.load_draft();
        debug!(hydrated = draft.is_some(), "opening intake session");
        Self {
            session: FormSession::new(catalog, draft),
            drafts,
            submitter,
        }
    }

    pub fn session(&self) -> &FormSession {
        &self.session
    }

    pub fn drafts(&self) -> &D {
        &self.drafts
    }

    pub fn submitter(&self) -> &S {
        &self.submitter
    }

    /// Apply one input change and auto-save the draft.
    pub fn change(&mut self, id: &str, raw: RawInput) -> Result<(), InputRejected> {
        if let Err(rejected) = self.session.set_answer(id, raw) {
            warn!(question = id, reason = ?rejected, "input rejected");
            return Err(rejected);
        }
        self.drafts.save_draft(self.session.answers());
        Ok(())
    }

    pub fn next(&mut self) -> Step {
        let step = self.session.next();
        debug!(?step, section = self.session.current_section(), "next");
        step
    }

    pub fn back(&mut self) -> Step {
        let step = self.session.back();
        debug!(?step, section = self.session.current_section(), "back");
        step
    }

    /// Advance section by section until the last one, stopping at the first
    /// section that fails validation.
    pub fn advance_to_last(&mut self) -> Step {
        let mut last = Step::Stayed;
        while !self.session.is_last_section() {
            last = self.next();
            if let Step::Blocked { .. } = last {
                break;
            }
        }
        last
    }

    /// Validate, build the record and hand it to the submitter.
    pub fn submit(&mut self) -> SubmitOutcome {
        let record = match self.session.begin_submit() {
            Ok(record) => record,
            Err(SubmitRejected::Record(reason)) => {
                warn!(%reason, "could not build submission record");
                return self.failed_outcome();
            }
            Err(rejected) => {
                debug!(reason = ?rejected, "submission rejected");
                return SubmitOutcome::Rejected(rejected);
            }
        };

        let result = self.submitter.submit(&record);
        if let Err(err) = &result {
            warn!(error = %format!("{err:#}"), "submission failed");
        }
        if self.session.finish_submit(result) != &Phase::Submitted {
            return self.failed_outcome();
        }
        info!(columns = record.len(), "questionnaire submitted");
        self.drafts.clear_draft();
        SubmitOutcome::Submitted
    }

    fn failed_outcome(&self) -> SubmitOutcome {
        match self.session.phase() {
            Phase::SubmitFailed { notice } => SubmitOutcome::Failed {
                notice: notice.clone(),
            },
            _ => SubmitOutcome::Rejected(SubmitRejected::Busy),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::session::SUBMIT_FAILED_NOTICE;
    use crate::core::types::{Answer, AnswerSet};
    use crate::io::draft_store::MemoryDraftStore;
    use crate::test_support::{ScriptedSubmitter, two_section_catalog};

    fn text(value: &str) -> RawInput {
        RawInput::Text(value.to_string())
    }

    #[test]
    fn change_auto_saves_draft() {
        let mut flow = IntakeFlow::open(
            two_section_catalog(),
            MemoryDraftStore::new(),
            ScriptedSubmitter::succeeding(),
        );
        flow.change("first_name", text("דוד")).expect("change");
        assert_eq!(
            flow.drafts().current().and_then(|d| d.get("first_name").cloned()),
            Some(Answer::text("דוד"))
        );
        assert!(flow.change("missing", text("x")).is_err());
        assert_eq!(flow.drafts().saves(), 1);
    }

    #[test]
    fn open_hydrates_from_draft() {
        let draft: AnswerSet = [("first_name", Answer::text("דוד"))].into_iter().collect();
        let flow = IntakeFlow::open(
            two_section_catalog(),
            MemoryDraftStore::with_draft(draft.clone()),
            ScriptedSubmitter::succeeding(),
        );
        assert_eq!(flow.session().answers(), &draft);
        assert_eq!(flow.session().current_section(), 0);
    }

    #[test]
    fn failed_submission_keeps_draft_and_answers() {
        let mut flow = IntakeFlow::open(
            two_section_catalog(),
            MemoryDraftStore::new(),
            ScriptedSubmitter::failing("HTTP 500"),
        );
        flow.change("first_name", text("דוד")).expect("change");
        assert_eq!(flow.next(), Step::Moved { to: 1 });
        flow.change("terms", RawInput::Toggle(true)).expect("change");

        let outcome = flow.submit();
        assert_eq!(
            outcome,
            SubmitOutcome::Failed {
                notice: SUBMIT_FAILED_NOTICE.to_string()
            }
        );
        assert!(flow.drafts().current().is_some());
        assert_eq!(flow.submitter().calls(), 1);
        assert!(flow.session().is_last_section());
    }

    #[test]
    fn advance_to_last_stops_at_first_invalid_section() {
        let mut flow = IntakeFlow::open(
            two_section_catalog(),
            MemoryDraftStore::new(),
            ScriptedSubmitter::succeeding(),
        );
        assert_eq!(flow.advance_to_last(), Step::Blocked { errors: 1 });
        assert_eq!(flow.session().current_section(), 0);

        flow.change("first_name", text("דוד")).expect("change");
        assert_eq!(flow.advance_to_last(), Step::Moved { to: 1 });
        assert!(flow.session().is_last_section());
    }

    #[test]
    fn successful_submission_clears_draft() {
        let mut flow = IntakeFlow::open(
            two_section_catalog(),
            MemoryDraftStore::new(),
            ScriptedSubmitter::succeeding(),
        );
        flow.change("first_name", text("דוד")).expect("change");
        flow.next();
        flow.change("terms", RawInput::Toggle(true)).expect("change");

        assert_eq!(flow.submit(), SubmitOutcome::Submitted);
        assert_eq!(flow.drafts().current(), None);
        assert_eq!(flow.submit(), SubmitOutcome::Rejected(SubmitRejected::AlreadySubmitted));
        assert_eq!(flow.submitter().calls(), 1);
    }
}
