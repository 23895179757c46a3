//! CLI tests for the `intake` binary.
//!
//! Spawns the binary in a temp directory and verifies exit codes for the
//! non-interactive commands. No command here reaches the network.

use std::fs::{self, File};
use std::path::Path;
use std::process::{Command, Output, Stdio};

use intake::exit_codes;

const COMPLETE_ANSWERS: &str = r#"{
  "first_name": "דוד",
  "last_name": "כהן",
  "id_number": "123456789",
  "birth_date": "1985-03-14",
  "gender": "זכר",
  "phone": "050-1234567",
  "email": "david@example.com",
  "city": "תל אביב",
  "street": "הרצל",
  "house_number": 12,
  "marital_status": "נשוי/אה",
  "has_spouse": "yes",
  "children_count": 0,
  "employment_status": "לא עובד/ת",
  "id_photo_front": "id-front.jpg",
  "consent_data_processing": true,
  "consent_insurance_reports": true,
  "digital_signature": "דוד כהן"
}"#;

fn intake(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_intake"))
        .current_dir(dir)
        .args(args)
        .output()
        .expect("run intake")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[test]
fn catalog_lists_all_sections() {
    let temp = tempfile::tempdir().expect("tempdir");
    let output = intake(temp.path(), &["catalog"]);
    assert_eq!(output.status.code(), Some(exit_codes::OK));
    let out = stdout(&output);
    assert!(out.contains("total: 58 questions"));
    assert!(out.contains("8. מסמכים והסכמות (consents)"));
}

#[test]
fn check_reports_missing_required_field() {
    let temp = tempfile::tempdir().expect("tempdir");
    fs::write(temp.path().join("answers.json"), r#"{"first_name": ""}"#).expect("write");

    let output = intake(
        temp.path(),
        &["check", "--answers", "answers.json", "--section", "0"],
    );
    assert_eq!(output.status.code(), Some(exit_codes::INCOMPLETE));
    assert!(stdout(&output).contains("first_name"));
    assert!(stdout(&output).contains("שדה חובה"));
}

#[test]
fn check_complete_answers_succeeds() {
    let temp = tempfile::tempdir().expect("tempdir");
    fs::write(temp.path().join("answers.json"), COMPLETE_ANSWERS).expect("write");

    let output = intake(temp.path(), &["check", "--answers", "answers.json"]);
    assert_eq!(output.status.code(), Some(exit_codes::OK));
    assert!(stdout(&output).contains("progress: 100%"));
}

#[test]
fn summary_prints_answers() {
    let temp = tempfile::tempdir().expect("tempdir");
    fs::write(temp.path().join("answers.json"), COMPLETE_ANSWERS).expect("write");

    let output = intake(temp.path(), &["summary", "--answers", "answers.json"]);
    assert_eq!(output.status.code(), Some(exit_codes::OK));
    assert!(stdout(&output).contains("## פרטים אישיים"));
    assert!(stdout(&output).contains("david@example.com"));
}

#[test]
fn submit_incomplete_answers_exits_incomplete() {
    let temp = tempfile::tempdir().expect("tempdir");
    fs::write(temp.path().join("answers.json"), r#"{"first_name": "דוד"}"#).expect("write");

    let output = intake(temp.path(), &["submit", "--answers", "answers.json"]);
    assert_eq!(output.status.code(), Some(exit_codes::INCOMPLETE));
}

#[test]
fn submit_without_endpoint_is_invalid() {
    let temp = tempfile::tempdir().expect("tempdir");
    fs::write(temp.path().join("answers.json"), COMPLETE_ANSWERS).expect("write");

    let output = intake(temp.path(), &["submit", "--answers", "answers.json"]);
    assert_eq!(output.status.code(), Some(exit_codes::INVALID));
    assert!(String::from_utf8_lossy(&output.stderr).contains("submit.endpoint"));
}

#[test]
fn unreachable_endpoint_exits_submit_failed() {
    let temp = tempfile::tempdir().expect("tempdir");
    fs::write(temp.path().join("answers.json"), COMPLETE_ANSWERS).expect("write");
    fs::write(
        temp.path().join("intake.toml"),
        "[submit]\nendpoint = \"http://127.0.0.1:9\"\napi_key_env = \"INTAKE_CLI_TEST_KEY\"\n",
    )
    .expect("write");

    let output = Command::new(env!("CARGO_BIN_EXE_intake"))
        .current_dir(temp.path())
        .env("INTAKE_CLI_TEST_KEY", "anon")
        .args(["submit", "--answers", "answers.json"])
        .output()
        .expect("run intake");
    assert_eq!(output.status.code(), Some(exit_codes::SUBMIT_FAILED));
    assert!(String::from_utf8_lossy(&output.stderr).contains("אירעה שגיאה בשליחת הטופס"));
}

#[test]
fn invalid_config_is_rejected() {
    let temp = tempfile::tempdir().expect("tempdir");
    fs::write(temp.path().join("intake.toml"), "[submit]\ntable = \"\"\n").expect("write");

    let output = intake(temp.path(), &["catalog"]);
    assert_eq!(output.status.code(), Some(exit_codes::INVALID));
}

#[test]
fn init_writes_default_config_once() {
    let temp = tempfile::tempdir().expect("tempdir");
    let output = intake(temp.path(), &["init"]);
    assert_eq!(output.status.code(), Some(exit_codes::OK));
    let written = fs::read_to_string(temp.path().join("intake.toml")).expect("config");
    assert!(written.contains("table = \"clients\""));

    let output = intake(temp.path(), &["init"]);
    assert_eq!(output.status.code(), Some(exit_codes::INVALID));
    assert!(String::from_utf8_lossy(&output.stderr).contains("already exists"));

    let output = intake(temp.path(), &["init", "--force"]);
    assert_eq!(output.status.code(), Some(exit_codes::OK));
}

#[test]
fn fill_without_backend_still_saves_a_draft() {
    let temp = tempfile::tempdir().expect("tempdir");
    let script = temp.path().join("input.txt");
    fs::write(&script, "דוד\n").expect("write");

    let output = Command::new(env!("CARGO_BIN_EXE_intake"))
        .current_dir(temp.path())
        .arg("fill")
        .stdin(Stdio::from(File::open(&script).expect("open input")))
        .output()
        .expect("run intake");
    assert_eq!(output.status.code(), Some(exit_codes::INCOMPLETE));
    let draft = temp.path().join(".intake/noa-questionnaire-progress.json");
    assert!(fs::read_to_string(draft).expect("draft").contains("דוד"));
}

#[test]
fn draft_show_and_clear() {
    let temp = tempfile::tempdir().expect("tempdir");
    let output = intake(temp.path(), &["draft", "show"]);
    assert_eq!(output.status.code(), Some(exit_codes::OK));
    assert!(stdout(&output).contains("no draft"));

    let draft_dir = temp.path().join(".intake");
    fs::create_dir_all(&draft_dir).expect("mkdir");
    let draft_path = draft_dir.join("noa-questionnaire-progress.json");
    fs::write(
        &draft_path,
        r#"{"version":1,"answers":{"first_name":{"kind":"text","value":"דוד"}}}"#,
    )
    .expect("write");

    let output = intake(temp.path(), &["draft", "show"]);
    assert!(stdout(&output).contains("דוד"));

    let output = intake(temp.path(), &["draft", "clear"]);
    assert_eq!(output.status.code(), Some(exit_codes::OK));
    assert!(!draft_path.exists());
}
