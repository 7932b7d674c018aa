//! CLI integration tests using assert_cmd.

use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::{json, Value};
use tempfile::TempDir;

/// A `quizforge` command isolated from the user's configuration.
fn quizforge(dir: &Path) -> Command {
    #[allow(deprecated)]
    let mut cmd = Command::cargo_bin("quizforge").unwrap();
    cmd.current_dir(dir)
        .env("HOME", dir)
        .env_remove("QUIZFORGE_OPENAI_KEY")
        .env_remove("QUIZFORGE_GEMINI_KEY")
        .env_remove("RUST_LOG");
    cmd
}

fn generate_offline_session(dir: &Path) -> std::path::PathBuf {
    let session = dir.join("session.json");
    quizforge(dir)
        .args(["generate", "--offline", "--count", "6", "--seed", "3"])
        .args(["--topics", "algorithms,cryptography"])
        .arg("--output")
        .arg(&session)
        .assert()
        .success()
        .stdout(predicate::str::contains("6 questions (6 placeholders)"))
        .stdout(predicate::str::contains("Session saved to"));
    session
}

/// Answer every question of a session, correctly when `correct(i)` holds.
fn write_answers(session: &Path, path: &Path, correct: impl Fn(usize) -> bool) {
    let session: Value = serde_json::from_str(&std::fs::read_to_string(session).unwrap()).unwrap();
    let answers: Vec<Value> = session["questions"]
        .as_array()
        .unwrap()
        .iter()
        .enumerate()
        .map(|(i, q)| {
            let right = q["correctOptionIndex"].as_u64().unwrap();
            let selected = if correct(i) { right } else { (right + 1) % 4 };
            json!({
                "questionId": q["id"],
                "selectedOptionIndex": selected,
                "isCorrect": correct(i),
            })
        })
        .collect();
    std::fs::write(path, serde_json::to_string_pretty(&answers).unwrap()).unwrap();
}

#[test]
fn init_creates_config() {
    let dir = TempDir::new().unwrap();

    quizforge(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Created quizforge.toml"));

    assert!(dir.path().join("quizforge.toml").exists());
}

#[test]
fn init_skips_existing() {
    let dir = TempDir::new().unwrap();

    quizforge(dir.path()).arg("init").assert().success();

    quizforge(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("already exists"));
}

#[test]
fn plan_all_topics() {
    let dir = TempDir::new().unwrap();

    quizforge(dir.path())
        .args(["plan", "--topics", "all", "--count", "20", "--seed", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "20 questions requested, 20 planned across 10 topics",
        ))
        .stdout(predicate::str::contains("computer_networks"))
        .stdout(predicate::str::contains("Tier total"));
}

#[test]
fn plan_is_reproducible_with_seed() {
    let dir = TempDir::new().unwrap();

    let run = || {
        quizforge(dir.path())
            .args(["plan", "--count", "17", "--seed", "42"])
            .output()
            .unwrap()
            .stdout
    };
    assert_eq!(run(), run());
}

#[test]
fn plan_rejects_bad_percentage() {
    let dir = TempDir::new().unwrap();

    quizforge(dir.path())
        .args(["plan", "--easy", "150"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("percentage"));
}

#[test]
fn plan_with_empty_catalog() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("quizforge.toml"), "topics = []\n").unwrap();

    quizforge(dir.path())
        .arg("plan")
        .assert()
        .success()
        .stdout(predicate::str::contains("plan is empty"));
}

#[test]
fn generate_validate_analyze_offline() {
    let dir = TempDir::new().unwrap();
    let session = generate_offline_session(dir.path());

    quizforge(dir.path())
        .arg("validate")
        .arg("--session")
        .arg(&session)
        .assert()
        .success()
        .stdout(predicate::str::contains("6 questions"))
        .stdout(predicate::str::contains("All questions valid."));

    let answers = dir.path().join("answers.json");
    write_answers(&session, &answers, |_| true);
    let scorecard = dir.path().join("scorecard.json");

    quizforge(dir.path())
        .arg("analyze")
        .arg("--session")
        .arg(&session)
        .arg("--answers")
        .arg(&answers)
        .arg("--output")
        .arg(&scorecard)
        .assert()
        .success()
        .stdout(predicate::str::contains("Overall score: 100%"))
        .stdout(predicate::str::contains("Strengths: algorithms, cryptography"));

    let saved: Value =
        serde_json::from_str(&std::fs::read_to_string(&scorecard).unwrap()).unwrap();
    assert_eq!(saved["analysis"]["overallScore"], 100);
    assert_eq!(saved["answeredCount"], 6);
    assert!(saved["feedback"].is_null());
}

#[test]
fn analyze_with_self_report_and_template_feedback() {
    let dir = TempDir::new().unwrap();
    let session = generate_offline_session(dir.path());

    let answers = dir.path().join("answers.json");
    write_answers(&session, &answers, |_| false);
    let scorecard = dir.path().join("scorecard.json");

    quizforge(dir.path())
        .arg("analyze")
        .arg("--session")
        .arg(&session)
        .arg("--answers")
        .arg(&answers)
        .args(["--strong", "data_structures", "--weak", "compilers"])
        .args(["--self-rating", "strong on theory"])
        .args(["--feedback", "--offline", "--learning-style", "auditory"])
        .arg("--output")
        .arg(&scorecard)
        .assert()
        .success()
        .stdout(predicate::str::contains("Overall score: 0%"))
        .stdout(predicate::str::contains("Strengths: data_structures"))
        .stdout(predicate::str::contains(
            "You scored 0% overall in the diagnostic assessment.",
        ))
        .stdout(predicate::str::contains("auditory"))
        .stdout(predicate::str::contains("Self-rating: strong on theory"));

    let saved: Value =
        serde_json::from_str(&std::fs::read_to_string(&scorecard).unwrap()).unwrap();
    assert_eq!(saved["selfRating"], "strong on theory");
}

#[test]
fn analyze_rejects_unknown_question() {
    let dir = TempDir::new().unwrap();
    let session = generate_offline_session(dir.path());

    let answers = dir.path().join("answers.json");
    std::fs::write(
        &answers,
        r#"[{"questionId": "not_in_session", "selectedOptionIndex": 0, "isCorrect": true}]"#,
    )
    .unwrap();

    quizforge(dir.path())
        .arg("analyze")
        .arg("--session")
        .arg(&session)
        .arg("--answers")
        .arg(&answers)
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown question id: not_in_session"));
}

#[test]
fn generate_without_provider_fails() {
    let dir = TempDir::new().unwrap();

    quizforge(dir.path())
        .args(["generate", "--output", "session.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("provider 'openai' is not configured"));
}

#[test]
fn validate_nonexistent_session() {
    let dir = TempDir::new().unwrap();

    quizforge(dir.path())
        .args(["validate", "--session", "missing.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to read session"));
}

#[test]
fn list_models_from_config() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("quizforge.toml"),
        r#"
[providers.gemini]
type = "gemini"
api_key = "test"
"#,
    )
    .unwrap();

    quizforge(dir.path())
        .arg("list-models")
        .assert()
        .success()
        .stdout(predicate::str::contains("Provider: gemini"))
        .stdout(predicate::str::contains("gemini-2.5-flash"));
}

#[test]
fn list_models_without_providers() {
    let dir = TempDir::new().unwrap();

    quizforge(dir.path())
        .arg("list-models")
        .assert()
        .success()
        .stdout(predicate::str::contains("No providers configured"));
}

#[test]
fn help_output() {
    let dir = TempDir::new().unwrap();

    quizforge(dir.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Diagnostic quiz builder"));
}

#[test]
fn version_output() {
    let dir = TempDir::new().unwrap();

    quizforge(dir.path())
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("quizforge"));
}
