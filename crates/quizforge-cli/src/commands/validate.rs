//! The `quizforge validate` command.

use std::path::PathBuf;

use anyhow::Result;

use quizforge_core::parser::{validate_questions, ValidationWarning};
use quizforge_core::report::DiagnosticSession;

pub fn execute(session_path: PathBuf) -> Result<()> {
    let session = DiagnosticSession::load_json(&session_path)?;

    println!(
        "Session {} ({} questions, {} topics, {} placeholders)",
        session.id,
        session.questions.len(),
        session.plan.topics.len(),
        session.fallback_count(),
    );

    let mut warnings = validate_questions(&session.questions);

    let planned = session.plan.total() as usize;
    if session.questions.len() != planned {
        warnings.push(ValidationWarning {
            question_id: None,
            message: format!(
                "plan calls for {planned} questions, session has {}",
                session.questions.len()
            ),
        });
    }

    for w in &warnings {
        let prefix = w
            .question_id
            .as_ref()
            .map(|id| format!("  [{id}]"))
            .unwrap_or_else(|| "  ".to_string());
        println!("{prefix} WARNING: {}", w.message);
    }

    if warnings.is_empty() {
        println!("All questions valid.");
    } else {
        println!("\n{} warning(s) found.", warnings.len());
    }

    Ok(())
}
