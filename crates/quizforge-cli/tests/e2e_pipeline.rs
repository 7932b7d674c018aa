//! End-to-end pipeline tests: allocate, generate through a mock provider,
//! answer, and analyze.

use std::sync::Arc;
use std::time::Duration;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use quizforge_core::allocator::allocate;
use quizforge_core::analyzer::{analyze, analyze_with_self_report};
use quizforge_core::engine::{DiagnosticEngine, EngineConfig, NoopReporter};
use quizforge_core::feedback::FeedbackWriter;
use quizforge_core::model::{
    AnswerRecord, DiagnosticSettings, DifficultyDistribution, SelfReport, TopicSelection,
};
use quizforge_core::report::{AnswerSheet, DiagnosticSession, Scorecard};
use quizforge_providers::mock::MockProvider;

fn catalog() -> Vec<String> {
    ["algorithms", "operating_systems", "cryptography"]
        .iter()
        .map(|t| t.to_string())
        .collect()
}

/// A reply with `n` well-formed questions whose correct answer is option 1.
fn reply(topic: &str, n: usize) -> String {
    let items: Vec<String> = (0..n)
        .map(|i| {
            format!(
                r#"{{"text": "{topic} question {i}?", "options": ["w", "right", "x", "y"], "correctOptionIndex": 1, "explanation": "Option two.", "tags": ["{topic}"]}}"#
            )
        })
        .collect();
    format!("```json\n[{}]\n```", items.join(",\n"))
}

fn engine_config() -> EngineConfig {
    EngineConfig {
        model: "mock-model".into(),
        parallelism: 3,
        max_retries_per_slot: 1,
        retry_delay: Duration::from_millis(1),
        ..EngineConfig::default()
    }
}

fn settings(count: u32) -> DiagnosticSettings {
    DiagnosticSettings {
        question_count: count,
        topic_selection: TopicSelection::All,
        difficulty_distribution: DifficultyDistribution::new(30, 50, 20),
        time_limit: Some(600),
    }
}

#[tokio::test]
async fn e2e_generated_session_scores_by_topic() {
    // Algorithms and OS reply in full; cryptography fails and falls back.
    let provider = Arc::new(
        MockProvider::failing(503, "overloaded")
            .with_response("about algorithms", &reply("algorithms", 10))
            .with_response("about operating systems", &reply("operating_systems", 10)),
    );

    let settings = settings(12);
    let plan = allocate(&settings, &catalog(), &mut ChaCha8Rng::seed_from_u64(5)).unwrap();
    let engine = DiagnosticEngine::new(provider.clone(), engine_config());
    let session = engine.run(&plan, &settings, &NoopReporter).await;

    assert_eq!(session.questions.len(), 12);
    assert_eq!(session.outcomes.len(), plan.slots.len());
    assert!(provider.call_count() >= plan.slots.len() as u32);

    let crypto_fallback: u32 = session
        .outcomes
        .iter()
        .filter(|o| o.slot.topic_id == "cryptography")
        .map(|o| o.fallback)
        .sum();
    let crypto_planned: u32 = plan
        .slots
        .iter()
        .filter(|s| s.topic_id == "cryptography")
        .map(|s| s.count)
        .sum();
    assert_eq!(crypto_fallback, crypto_planned);
    assert_eq!(session.fallback_count(), crypto_planned);

    // Right on algorithms, wrong on everything else.
    let answers: Vec<AnswerRecord> = session
        .questions
        .iter()
        .map(|q| {
            let pick = if q.topic_id == "algorithms" {
                q.correct_option_index
            } else {
                (q.correct_option_index + 1) % 4
            };
            AnswerRecord::grade(q, pick)
        })
        .collect();

    let result = analyze(&session.questions, &answers).unwrap();
    assert_eq!(result.topic_scores["algorithms"], 100);
    assert_eq!(result.topic_scores["operating_systems"], 0);
    assert_eq!(result.topic_scores["cryptography"], 0);
    assert_eq!(result.strengths, vec!["algorithms"]);
    assert_eq!(result.weaknesses, vec!["cryptography", "operating_systems"]);
}

#[tokio::test]
async fn e2e_session_survives_disk_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let provider = Arc::new(MockProvider::with_fixed_response(&reply("any", 5)));

    let settings = settings(8);
    let plan = allocate(&settings, &catalog(), &mut ChaCha8Rng::seed_from_u64(9)).unwrap();
    let session = DiagnosticEngine::new(provider, engine_config())
        .run(&plan, &settings, &NoopReporter)
        .await;

    let session_path = dir.path().join("session.json");
    session.save_json(&session_path).unwrap();
    let loaded = DiagnosticSession::load_json(&session_path).unwrap();
    assert_eq!(loaded.questions, session.questions);
    assert_eq!(loaded.plan, plan);

    // Leave the first question unanswered.
    let sheet = AnswerSheet {
        session_id: Some(loaded.id),
        answers: loaded
            .questions
            .iter()
            .skip(1)
            .map(|q| AnswerRecord::grade(q, q.correct_option_index))
            .collect(),
    };
    let answers_path = dir.path().join("answers.json");
    sheet.save_json(&answers_path).unwrap();
    let sheet = AnswerSheet::load_json(&answers_path).unwrap();

    let self_report = SelfReport {
        strong_topics: vec![],
        weak_topics: vec!["algorithms".into()],
        self_rating: Some("quick with theory, slow at proofs".into()),
    };
    let analysis =
        analyze_with_self_report(&loaded.questions, &sheet.answers, &self_report).unwrap();
    // 7 of 8 correct, the unanswered one counts against the overall score.
    assert_eq!(analysis.overall_score, 88);
    // Measured as strong, so the self-reported weakness is overruled.
    assert!(analysis.strengths.contains(&"algorithms".to_string()));
    assert!(!analysis.weaknesses.contains(&"algorithms".to_string()));

    let feedback = FeedbackWriter::offline()
        .write(&analysis, "visual", self_report.self_rating.as_deref())
        .await;
    let scorecard = Scorecard {
        session_id: loaded.id,
        created_at: chrono::Utc::now(),
        question_count: loaded.questions.len(),
        answered_count: sheet.answers.len(),
        self_rating: self_report.self_rating.clone(),
        analysis,
        feedback: Some(feedback),
    };
    let scorecard_path = dir.path().join("scorecard.json");
    scorecard.save_json(&scorecard_path).unwrap();
    let reloaded = Scorecard::load_json(&scorecard_path).unwrap();
    assert_eq!(reloaded.analysis.overall_score, 88);
    assert_eq!(
        reloaded.self_rating.as_deref(),
        Some("quick with theory, slow at proofs")
    );
    assert_eq!(
        reloaded.feedback.unwrap().overall_assessment,
        "You scored 88% overall in the diagnostic assessment."
    );
}

#[tokio::test]
async fn e2e_offline_session_is_complete() {
    let settings = DiagnosticSettings {
        question_count: 25,
        ..DiagnosticSettings::default()
    };
    let topics: Vec<String> = quizforge_core::model::DEFAULT_TOPICS
        .iter()
        .map(|t| t.to_string())
        .collect();
    let plan = allocate(&settings, &topics, &mut ChaCha8Rng::seed_from_u64(1)).unwrap();
    assert_eq!(plan.topics.len(), 5);

    let session = DiagnosticEngine::offline(engine_config())
        .run(&plan, &settings, &NoopReporter)
        .await;

    assert_eq!(session.questions.len(), 25);
    assert_eq!(session.fallback_count(), 25);
    assert_eq!(session.total_tokens(), 0);
    assert!(session
        .questions
        .iter()
        .all(|q| plan.topics.contains(&q.topic_id)));
}
