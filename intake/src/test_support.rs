//! Test-only fixtures: small catalogs, complete answer sets and a scripted
//! submitter.

use std::cell::RefCell;
use std::sync::Arc;

use anyhow::{Result, anyhow};
use chrono::NaiveDate;

use crate::core::catalog::{Catalog, Coercion, InputKind, Question, SectionInfo};
use crate::core::record::ClientRecord;
use crate::core::types::{Answer, AnswerSet};
use crate::io::submit::Submitter;

/// Two sections: a required name, then a required consent toggle.
pub fn two_section_catalog() -> Arc<Catalog> {
    let sections = vec![
        SectionInfo::new("personal", "פרטים אישיים"),
        SectionInfo::new("consents", "הסכמות"),
    ];
    let questions = vec![
        Question::new("first_name", "personal", "שם פרטי", InputKind::ShortText)
            .required()
            .record("first_name", Coercion::Verbatim),
        Question::new("terms", "consents", "אישור תנאים", InputKind::Toggle)
            .required()
            .record("consent_terms", Coercion::StrictBool),
    ];
    match Catalog::new(sections, questions) {
        Ok(catalog) => Arc::new(catalog),
        Err(err) => panic!("fixture catalog invalid: {err}"),
    }
}

/// Answers satisfying every required question of the built-in catalog.
pub fn complete_answers() -> AnswerSet {
    let date = |y, m, d| match NaiveDate::from_ymd_opt(y, m, d) {
        Some(date) => Answer::Date(date),
        None => panic!("fixture date invalid"),
    };
    [
        ("first_name", Answer::text("דוד")),
        ("last_name", Answer::text("כהן")),
        ("id_number", Answer::text("123456789")),
        ("birth_date", date(1985, 3, 14)),
        ("gender", Answer::text("זכר")),
        ("phone", Answer::text("050-1234567")),
        ("email", Answer::text("david@example.com")),
        ("city", Answer::text("תל אביב")),
        ("street", Answer::text("הרצל")),
        ("house_number", Answer::text("12")),
        ("marital_status", Answer::text("נשוי/אה")),
        ("has_spouse", Answer::text("yes")),
        ("spouse_first_name", Answer::text("רות")),
        ("children_count", Answer::Number(2.0)),
        ("children_ages", Answer::text("3, 7")),
        ("employment_status", Answer::text("שכיר")),
        ("monthly_income", Answer::Number(15000.0)),
        ("height", Answer::Number(170.0)),
        ("weight", Answer::Number(70.0)),
        (
            "focus_areas",
            Answer::Choices(vec!["pension".to_string(), "health".to_string()]),
        ),
        ("id_photo_front", Answer::text("id-front.jpg")),
        ("consent_data_processing", Answer::Flag(true)),
        ("consent_insurance_reports", Answer::Flag(true)),
        ("digital_signature", Answer::text("דוד כהן")),
    ]
    .into_iter()
    .collect()
}

/// Submitter that returns a scripted result and records every call.
#[derive(Debug, Default)]
pub struct ScriptedSubmitter {
    failure: Option<String>,
    received: RefCell<Vec<ClientRecord>>,
}

impl ScriptedSubmitter {
    pub fn succeeding() -> Self {
        Self::default()
    }

    pub fn failing(reason: &str) -> Self {
        Self {
            failure: Some(reason.to_string()),
            received: RefCell::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.received.borrow().len()
    }

    pub fn received(&self) -> Vec<ClientRecord> {
        self.received.borrow().clone()
    }
}

impl Submitter for ScriptedSubmitter {
    fn submit(&self, record: &ClientRecord) -> Result<()> {
        self.received.borrow_mut().push(record.clone());
        match &self.failure {
            Some(reason) => Err(anyhow!("{}", reason)),
            None => Ok(()),
        }
    }
}
