//! The `quizforge generate` command.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;

use quizforge_core::allocator::Slot;
use quizforge_core::engine::{DiagnosticEngine, ProgressReporter};
use quizforge_core::report::{DiagnosticSession, SlotOutcome};
use quizforge_providers::config::load_config_from;

use super::PlanArgs;

pub struct GenerateOptions {
    pub plan: PlanArgs,
    pub provider: Option<String>,
    pub model: Option<String>,
    pub parallelism: Option<usize>,
    pub offline: bool,
    pub output: Option<PathBuf>,
    pub config: Option<PathBuf>,
}

/// Console progress reporter.
struct ConsoleReporter;

impl ProgressReporter for ConsoleReporter {
    fn on_slot_start(&self, slot: &Slot) {
        eprintln!(
            "  Starting: {} [{}] x{}",
            slot.topic_id, slot.difficulty, slot.count
        );
    }

    fn on_slot_complete(&self, outcome: &SlotOutcome) {
        let slot = &outcome.slot;
        match &outcome.error {
            Some(error) => eprintln!(
                "  Done: {} [{}] {} generated, {} placeholder ({error})",
                slot.topic_id, slot.difficulty, outcome.generated, outcome.fallback
            ),
            None => eprintln!(
                "  Done: {} [{}] {} generated",
                slot.topic_id, slot.difficulty, outcome.generated
            ),
        }
    }

    fn on_plan_complete(&self, slots: usize, fallback_slots: usize, elapsed: Duration) {
        eprintln!(
            "\nComplete: {slots} slots, {fallback_slots} used placeholders ({:.1}s)",
            elapsed.as_secs_f64()
        );
    }
}

pub async fn execute(options: GenerateOptions) -> Result<()> {
    if let Some(parallelism) = options.parallelism {
        anyhow::ensure!(parallelism >= 1, "parallelism must be at least 1");
    }

    let config = load_config_from(options.config.as_deref())?;
    let (settings, plan) = options.plan.build_plan(&config)?;
    anyhow::ensure!(
        !plan.is_empty(),
        "no topics available: configure `topics` or pass --catalog"
    );

    let mut engine_config = config.engine_config(options.model.as_deref());
    if let Some(parallelism) = options.parallelism {
        engine_config.parallelism = parallelism;
    }

    let engine = if options.offline {
        DiagnosticEngine::offline(engine_config)
    } else {
        let provider = config.provider(options.provider.as_deref())?;
        eprintln!(
            "quizforge v{}: generating {} questions with {}/{}",
            env!("CARGO_PKG_VERSION"),
            plan.total(),
            provider.name(),
            engine_config.model,
        );
        DiagnosticEngine::new(provider, engine_config)
    };

    let session = engine.run(&plan, &settings, &ConsoleReporter).await;

    let output = options.output.unwrap_or_else(|| {
        let timestamp = session.created_at.format("%Y-%m-%dT%H%M%S");
        config.output_dir.join(format!("session-{timestamp}.json"))
    });
    session.save_json(&output)?;

    print_summary(&session);
    println!("Session saved to: {}", output.display());
    Ok(())
}

fn print_summary(session: &DiagnosticSession) {
    use comfy_table::{Cell, Table};

    let mut table = Table::new();
    table.set_header(vec!["Topic", "Tier", "Generated", "Placeholder", "Tokens"]);

    for outcome in &session.outcomes {
        table.add_row(vec![
            Cell::new(&outcome.slot.topic_id),
            Cell::new(outcome.slot.difficulty),
            Cell::new(outcome.generated),
            Cell::new(outcome.fallback),
            Cell::new(outcome.token_usage.total_tokens),
        ]);
    }

    println!("{table}");
    println!(
        "{} questions ({} placeholders), {} tokens, {}ms",
        session.questions.len(),
        session.fallback_count(),
        session.total_tokens(),
        session.duration_ms,
    );
}
