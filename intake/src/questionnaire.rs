//! Built-in client intake questionnaire: 58 questions in 8 sections.

use std::sync::Arc;

use serde_json::json;

use crate::core::catalog::{
    Catalog, CatalogError, Coercion, Condition, Derivation, InputKind, Question, SectionInfo,
    ValidationRule,
};
use crate::core::types::Answer;

pub const TITLE: &str = "NOA - טופס קליטת לקוח חדש";

const ID_PATTERN: &str = "^[0-9]{9}$";
const ID_MESSAGE: &str = "תעודת זהות חייבת להיות 9 ספרות";
const MOBILE_PATTERN: &str = "^05[0-9]-?[0-9]{7}$";
const PHONE_PATTERN: &str = "^0[0-9]{1,2}-?[0-9]{7}$";
const PHONE_MESSAGE: &str = "מספר טלפון לא תקין";
const EMAIL_MESSAGE: &str = "כתובת אימייל לא תקינה";
const NUMBER_MESSAGE: &str = "מספר לא תקין";

const YES_NO: &[(&str, &str)] = &[("yes", "כן"), ("no", "לא")];
const EMPLOYED: &[&str] = &["שכיר", "עצמאי", "שכיר ועצמאי"];

pub fn sections() -> Vec<SectionInfo> {
    vec![
        SectionInfo::new("personal", "פרטים אישיים"),
        SectionInfo::new("contact", "פרטי התקשרות וכתובת"),
        SectionInfo::new("family", "מצב משפחתי"),
        SectionInfo::new("employment", "תעסוקה"),
        SectionInfo::new("health", "בריאות"),
        SectionInfo::new("needs", "צרכים ביטוחיים"),
        SectionInfo::new("bank", "פרטי בנק"),
        SectionInfo::new("consents", "מסמכים והסכמות"),
    ]
}

pub fn questions() -> Vec<Question> {
    let mut questions = Vec::with_capacity(58);
    questions.extend(personal());
    questions.extend(contact());
    questions.extend(family());
    questions.extend(employment());
    questions.extend(health());
    questions.extend(needs());
    questions.extend(bank());
    questions.extend(consents());
    questions
}

/// The built-in catalog, integrity-checked.
pub fn default_catalog() -> Result<Arc<Catalog>, CatalogError> {
    Catalog::new(sections(), questions()).map(Arc::new)
}

fn has_children(answer: Option<&Answer>) -> bool {
    answer
        .and_then(Answer::as_number)
        .is_some_and(|count| count > 0.0)
}

fn born_abroad(answer: Option<&Answer>) -> bool {
    answer
        .and_then(Answer::as_text)
        .map(str::trim)
        .is_some_and(|country| !country.is_empty() && country != "ישראל")
}

fn email_rule() -> ValidationRule {
    ValidationRule::schema(json!({
        "type": "string",
        "maxLength": 254,
        "pattern": "^[^@\\s]+@[^@\\s]+\\.[^@\\s]+$"
    }))
    .message(EMAIL_MESSAGE)
}

fn employed() -> Condition {
    Condition::OneOf(EMPLOYED.iter().map(|status| status.to_string()).collect())
}

fn personal() -> Vec<Question> {
    let s = "personal";
    vec![
        Question::new("first_name", s, "מה השם הפרטי שלך?", InputKind::ShortText)
            .required()
            .placeholder("דוד")
            .rule(ValidationRule::length(2, 30).message("שם חייב להיות בין 2-30 תווים"))
            .record("first_name", Coercion::Verbatim),
        Question::new("last_name", s, "מה שם המשפחה?", InputKind::ShortText)
            .required()
            .placeholder("כהן")
            .rule(ValidationRule::length(2, 30).message("שם משפחה חייב להיות בין 2-30 תווים"))
            .record("last_name", Coercion::Verbatim),
        Question::new("id_number", s, "מה מספר תעודת הזהות שלך?", InputKind::ShortText)
            .required()
            .placeholder("123456789")
            .help("9 ספרות ללא מקפים")
            .rule(ValidationRule::pattern(ID_PATTERN).message(ID_MESSAGE))
            .record("id_number", Coercion::Verbatim),
        Question::new("id_issue_date", s, "מה תאריך הנפקת תעודת הזהות?", InputKind::Date)
            .record("id_issue_date", Coercion::Verbatim),
        Question::new("birth_date", s, "מה תאריך הלידה שלך?", InputKind::Date)
            .required()
            .help("יש להיות מעל גיל 18")
            .record("birth_date", Coercion::Verbatim),
        Question::new("gender", s, "מה המגדר שלך?", InputKind::Select)
            .required()
            .choices(&["זכר", "נקבה", "אחר"])
            .record("gender", Coercion::Verbatim),
        Question::new("birth_country", s, "מה ארץ הלידה שלך?", InputKind::ShortText)
            .placeholder("ישראל")
            .record("birth_country", Coercion::Verbatim),
        Question::new("immigration_year", s, "באיזו שנה עלית לארץ?", InputKind::Number)
            .placeholder("1995")
            .shown_when("birth_country", Condition::Predicate(born_abroad))
            .rule(ValidationRule::range(1920.0, 2100.0).message("שנה לא תקינה"))
            .record("immigration_year", Coercion::Number),
        Question::new("citizenship", s, "מה האזרחות שלך?", InputKind::ShortText)
            .placeholder("ישראלית")
            .record("citizenship", Coercion::Verbatim),
    ]
}

fn contact() -> Vec<Question> {
    let s = "contact";
    vec![
        Question::new("phone", s, "מה מספר הטלפון הנייד שלך?", InputKind::ShortText)
            .required()
            .placeholder("050-1234567")
            .rule(ValidationRule::pattern(MOBILE_PATTERN).message(PHONE_MESSAGE))
            .record("phone", Coercion::Verbatim),
        Question::new("alternative_phone", s, "טלפון נוסף", InputKind::ShortText)
            .placeholder("03-1234567")
            .rule(ValidationRule::pattern(PHONE_PATTERN).message(PHONE_MESSAGE))
            .record("alternative_phone", Coercion::Verbatim),
        Question::new("email", s, "מה כתובת האימייל שלך?", InputKind::ShortText)
            .required()
            .placeholder("david@example.com")
            .rule(email_rule())
            .record("email", Coercion::Verbatim),
        Question::new(
            "preferred_contact_method",
            s,
            "איך נוח לך שניצור קשר?",
            InputKind::Radio,
        )
        .choices(&["טלפון", "וואטסאפ", "אימייל"])
        .record("preferred_contact_method", Coercion::Verbatim),
        Question::new("city", s, "עיר מגורים", InputKind::ShortText)
            .required()
            .placeholder("תל אביב")
            .record("city", Coercion::Verbatim),
        Question::new("street", s, "רחוב", InputKind::ShortText)
            .required()
            .placeholder("הרצל")
            .record("street", Coercion::Verbatim),
        Question::new("house_number", s, "מספר בית", InputKind::ShortText)
            .required()
            .placeholder("1")
            .record("house_number", Coercion::Verbatim),
        Question::new("postal_code", s, "מיקוד", InputKind::ShortText)
            .placeholder("6100001")
            .rule(ValidationRule::pattern("^[0-9]{7}$").message("מיקוד חייב להיות 7 ספרות"))
            .record("postal_code", Coercion::Verbatim),
    ]
}

fn family() -> Vec<Question> {
    let s = "family";
    let married = || Condition::Equals("yes".to_string());
    vec![
        Question::new("marital_status", s, "מה המצב המשפחתי שלך?", InputKind::Select)
            .required()
            .choices(&["רווק/ה", "נשוי/אה", "גרוש/ה", "אלמן/ה"])
            .record("marital_status", Coercion::Verbatim),
        Question::new("has_spouse", s, "האם יש לך בן/בת זוג?", InputKind::Radio)
            .required()
            .options(YES_NO)
            .record("has_spouse", Coercion::Equals("yes".to_string())),
        Question::new("spouse_first_name", s, "שם פרטי של בן/בת הזוג", InputKind::ShortText)
            .shown_when("has_spouse", married())
            .record("spouse_first_name", Coercion::Verbatim),
        Question::new("spouse_last_name", s, "שם משפחה של בן/בת הזוג", InputKind::ShortText)
            .shown_when("has_spouse", married())
            .record("spouse_last_name", Coercion::Verbatim),
        Question::new("spouse_id_number", s, "תעודת זהות של בן/בת הזוג", InputKind::ShortText)
            .placeholder("987654321")
            .shown_when("has_spouse", married())
            .rule(ValidationRule::pattern(ID_PATTERN).message(ID_MESSAGE))
            .record("spouse_id_number", Coercion::Verbatim),
        Question::new("spouse_birth_date", s, "תאריך לידה של בן/בת הזוג", InputKind::Date)
            .shown_when("has_spouse", married())
            .record("spouse_birth_date", Coercion::Verbatim),
        Question::new("spouse_phone", s, "טלפון של בן/בת הזוג", InputKind::ShortText)
            .shown_when("has_spouse", married())
            .rule(ValidationRule::pattern(MOBILE_PATTERN).message(PHONE_MESSAGE))
            .record("spouse_phone", Coercion::Verbatim),
        Question::new("spouse_email", s, "אימייל של בן/בת הזוג", InputKind::ShortText)
            .shown_when("has_spouse", married())
            .rule(email_rule())
            .record("spouse_email", Coercion::Verbatim),
        Question::new("children_count", s, "כמה ילדים יש לך?", InputKind::Number)
            .required()
            .placeholder("0")
            .rule(ValidationRule::range(0.0, 20.0).message(NUMBER_MESSAGE))
            .record("children_count", Coercion::Number),
        Question::new("children_ages", s, "גילאי הילדים", InputKind::ShortText)
            .placeholder("3, 7, 12")
            .help("מופרדים בפסיקים")
            .shown_when("children_count", Condition::Predicate(has_children))
            .rule(
                ValidationRule::pattern(r"^[0-9]{1,2}(\s*,\s*[0-9]{1,2})*$")
                    .message("יש להזין גילאים מופרדים בפסיקים"),
            )
            .record("children_ages", Coercion::Verbatim),
    ]
}

fn employment() -> Vec<Question> {
    let s = "employment";
    vec![
        Question::new("employment_status", s, "מה הסטטוס התעסוקתי שלך?", InputKind::Select)
            .required()
            .choices(&["שכיר", "עצמאי", "שכיר ועצמאי", "לא עובד/ת", "פנסיונר/ית"])
            .record("employment_status", Coercion::Verbatim),
        Question::new("profession", s, "מה המקצוע שלך?", InputKind::ShortText)
            .placeholder("מהנדס תוכנה")
            .shown_when("employment_status", employed())
            .record("profession", Coercion::Verbatim),
        Question::new("workplace_name", s, "מה שם מקום העבודה?", InputKind::ShortText)
            .placeholder("שם החברה")
            .shown_when("employment_status", employed())
            .record("workplace_name", Coercion::Verbatim),
        Question::new("workplace_seniority", s, "כמה שנים אתה עובד במקום הנוכחי?", InputKind::Number)
            .placeholder("5")
            .shown_when("employment_status", employed())
            .rule(ValidationRule::range(0.0, 50.0).message(NUMBER_MESSAGE))
            .record("workplace_seniority", Coercion::Number),
        Question::new("monthly_income", s, "מה ההכנסה החודשית ברוטו? (בשקלים)", InputKind::Number)
            .placeholder("15000")
            .help("לפני ניכויים")
            .shown_when("employment_status", employed())
            .rule(ValidationRule::range(0.0, 999_999.0))
            .record("monthly_income", Coercion::Number),
    ]
}

fn health() -> Vec<Question> {
    let s = "health";
    vec![
        Question::new("height", s, "מה הגובה שלך? (בס\"מ)", InputKind::Number)
            .placeholder("175")
            .rule(ValidationRule::range(100.0, 250.0))
            .record("height", Coercion::Number),
        Question::new("weight", s, "מה המשקל שלך? (בק\"ג)", InputKind::Number)
            .placeholder("75")
            .rule(ValidationRule::range(30.0, 300.0))
            .record("weight", Coercion::Number),
        Question::new("bmi", s, "BMI (מחושב אוטומטית)", InputKind::Derived)
            .derived(Derivation::Bmi {
                height: "height".to_string(),
                weight: "weight".to_string(),
            })
            .record("bmi", Coercion::Number),
        Question::new("smoking_status", s, "האם אתה מעשן?", InputKind::Select)
            .choices(&["כן", "לא", "הפסקתי"])
            .record("smoking_status", Coercion::Verbatim),
        Question::new("smoking_quantity", s, "כמה סיגריות ביום?", InputKind::Number)
            .shown_when("smoking_status", Condition::Equals("כן".to_string()))
            .rule(ValidationRule::range(0.0, 100.0).message(NUMBER_MESSAGE))
            .record("smoking_quantity", Coercion::Number),
        Question::new("health_fund", s, "באיזו קופת חולים אתה חבר?", InputKind::Select)
            .choices(&["כללית", "מכבי", "מאוחדת", "לאומית"])
            .record("health_fund", Coercion::Verbatim),
        Question::new("supplementary_insurance", s, "האם יש לך ביטוח משלים?", InputKind::Radio)
            .choices(&["כן", "לא", "לא יודע"])
            .record("supplementary_insurance", Coercion::Verbatim),
    ]
}

fn needs() -> Vec<Question> {
    let s = "needs";
    vec![
        Question::new("contact_reason", s, "מה הסיבה העיקרית לפנייה?", InputKind::Select)
            .choices(&["בדיקת תיק ביטוחי", "חיסכון ופנסיה", "ביטוח חדש", "אחר"])
            .record("contact_reason", Coercion::Verbatim),
        Question::new("focus_areas", s, "באילו תחומים תרצה להתמקד?", InputKind::MultiSelect)
            .options(&[
                ("pension", "פנסיה"),
                ("life", "ביטוח חיים"),
                ("health", "ביטוח בריאות"),
                ("disability", "אובדן כושר עבודה"),
                ("nursing", "ביטוח סיעודי"),
                ("savings", "חיסכון והשקעות"),
            ])
            .record("focus_areas", Coercion::BracketedList),
        Question::new("insurance_priority", s, "מה חשוב לך יותר?", InputKind::Select)
            .choices(&["תשואה גבוהה", "איזון", "בטחון מקסימלי"])
            .record("insurance_priority", Coercion::Verbatim),
        Question::new("monthly_budget", s, "מה התקציב החודשי לביטוח? (בשקלים)", InputKind::Number)
            .placeholder("1000")
            .rule(ValidationRule::range(0.0, 100_000.0))
            .record("monthly_budget", Coercion::Number),
        Question::new("additional_notes", s, "הערות נוספות", InputKind::FreeText),
    ]
}

fn bank() -> Vec<Question> {
    let s = "bank";
    let joint = || Condition::Equals("joint".to_string());
    vec![
        Question::new("bank_name", s, "באיזה בנק החשבון?", InputKind::Select)
            .choices(&["הפועלים", "לאומי", "דיסקונט", "מזרחי טפחות", "הבינלאומי", "אחר"])
            .record("bank_name", Coercion::Verbatim),
        Question::new("bank_branch", s, "מספר סניף", InputKind::Number)
            .rule(ValidationRule::range(1.0, 999.0).message("מספר סניף לא תקין"))
            .record("bank_branch", Coercion::Number),
        Question::new("bank_account_number", s, "מספר חשבון", InputKind::ShortText)
            .rule(ValidationRule::pattern("^[0-9]{4,9}$").message("מספר חשבון לא תקין"))
            .record("bank_account_number", Coercion::Verbatim),
        Question::new("bank_account_type", s, "סוג החשבון", InputKind::Radio)
            .choices(&["עו\"ש", "חיסכון"])
            .record("bank_account_type", Coercion::Verbatim),
        Question::new("bank_account_ownership", s, "בעלות על החשבון", InputKind::Radio)
            .options(&[("single", "בעלים יחיד"), ("joint", "חשבון משותף")])
            .record("bank_account_ownership", Coercion::Verbatim),
        Question::new("bank_joint_owner_name", s, "שם השותף בחשבון", InputKind::ShortText)
            .shown_when("bank_account_ownership", joint())
            .record("bank_joint_owner_name", Coercion::Verbatim),
        Question::new("bank_joint_owner_id", s, "תעודת זהות של השותף", InputKind::ShortText)
            .shown_when("bank_account_ownership", joint())
            .rule(ValidationRule::pattern(ID_PATTERN).message(ID_MESSAGE))
            .record("bank_joint_owner_id", Coercion::Verbatim),
    ]
}

fn consents() -> Vec<Question> {
    let s = "consents";
    vec![
        Question::new("id_photo_front", s, "צילום תעודת זהות (צד קדמי)", InputKind::File)
            .required()
            .record("id_photo_front", Coercion::Verbatim),
        Question::new("id_photo_back", s, "צילום תעודת זהות (צד אחורי)", InputKind::File)
            .record("id_photo_back", Coercion::Verbatim),
        Question::new(
            "consent_data_processing",
            s,
            "אני מאשר/ת עיבוד של המידע שמסרתי",
            InputKind::Toggle,
        )
        .required()
        .help("חובה לאשר")
        .record("consent_data_processing", Coercion::StrictBool),
        Question::new(
            "consent_insurance_reports",
            s,
            "אני מאשר/ת מתן ייפוי כוח לצורך שליפת מידע",
            InputKind::Toggle,
        )
        .required()
        .help("נדרש לשליפת מידע מהמסלקה והר הביטוח")
        .record("consent_insurance_reports", Coercion::StrictBool),
        Question::new(
            "consent_summary_delivery",
            s,
            "אני מאשר/ת קבלת סיכום הפגישה באימייל",
            InputKind::Toggle,
        )
        .record("consent_summary_delivery", Coercion::StrictBool),
        Question::new("consent_marketing", s, "אני מאשר/ת קבלת מידע שיווקי", InputKind::Toggle),
        Question::new("digital_signature", s, "חתימה דיגיטלית", InputKind::Signature)
            .required()
            .help("הקלד את שמך המלא")
            .rule(ValidationRule::length(2, 60))
            .record("digital_signature", Coercion::Verbatim),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::resolver::{sections_of, visible_questions};
    use crate::core::types::AnswerSet;

    #[test]
    fn default_catalog_passes_integrity_checks() {
        let catalog = default_catalog().expect("catalog");
        assert_eq!(catalog.questions().len(), 58);
        assert_eq!(catalog.sections().len(), 8);
    }

    #[test]
    fn every_section_is_visible_with_no_answers() {
        let catalog = default_catalog().expect("catalog");
        let visible = visible_questions(&catalog, &AnswerSet::new());
        let keys: Vec<String> = sections()
            .into_iter()
            .map(|section| section.key)
            .collect();
        let visible_keys: Vec<String> = sections_of(&visible)
            .into_iter()
            .map(str::to_string)
            .collect();
        assert_eq!(visible_keys, keys);
    }

    #[test]
    fn predicates_handle_missing_answers() {
        assert!(!has_children(None));
        assert!(has_children(Some(&Answer::Number(2.0))));
        assert!(!born_abroad(None));
        assert!(!born_abroad(Some(&Answer::text("ישראל"))));
        assert!(born_abroad(Some(&Answer::text("צרפת"))));
    }
}
