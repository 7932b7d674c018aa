//! The `quizforge analyze` command.

use std::collections::HashSet;
use std::path::PathBuf;

use anyhow::{Context, Result};
use comfy_table::{Cell, Table};

use quizforge_core::analyzer::{analyze_with_self_report, AnalysisResult};
use quizforge_core::feedback::{Feedback, FeedbackWriter};
use quizforge_core::model::SelfReport;
use quizforge_core::report::{AnswerSheet, DiagnosticSession, Scorecard};
use quizforge_providers::config::load_config_from;

pub struct AnalyzeOptions {
    pub session: PathBuf,
    pub answers: PathBuf,
    pub strong: Option<String>,
    pub weak: Option<String>,
    pub self_rating: Option<String>,
    pub feedback: bool,
    pub learning_style: String,
    pub offline: bool,
    pub provider: Option<String>,
    pub output: Option<PathBuf>,
    pub config: Option<PathBuf>,
}

fn split_topics(list: Option<&str>) -> Vec<String> {
    list.map(|l| {
        l.split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(String::from)
            .collect()
    })
    .unwrap_or_default()
}

pub async fn execute(options: AnalyzeOptions) -> Result<()> {
    let config = load_config_from(options.config.as_deref())?;
    let session = DiagnosticSession::load_json(&options.session)?;
    let sheet = AnswerSheet::load_json(&options.answers)?;

    if let Some(id) = sheet.session_id {
        if id != session.id {
            tracing::warn!(answers = %id, session = %session.id, "answer sheet was recorded for another session");
        }
    }

    let self_report = SelfReport {
        strong_topics: split_topics(options.strong.as_deref()),
        weak_topics: split_topics(options.weak.as_deref()),
        self_rating: options
            .self_rating
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty()),
    };

    let analysis = analyze_with_self_report(&session.questions, &sheet.answers, &self_report)
        .context("failed to analyze answers")?;

    let feedback = if options.feedback {
        let writer = if options.offline {
            FeedbackWriter::offline()
        } else {
            let provider = config.provider(options.provider.as_deref())?;
            FeedbackWriter::new(provider, &config.default_model, config.default_temperature)
        };
        Some(
            writer
                .write(
                    &analysis,
                    &options.learning_style,
                    self_report.self_rating.as_deref(),
                )
                .await,
        )
    } else {
        None
    };

    let answered: HashSet<&str> = sheet
        .answers
        .iter()
        .map(|a| a.question_id.as_str())
        .collect();

    let scorecard = Scorecard {
        session_id: session.id,
        created_at: chrono::Utc::now(),
        question_count: session.questions.len(),
        answered_count: answered.len(),
        self_rating: self_report.self_rating,
        analysis,
        feedback,
    };

    print_scorecard(&scorecard);

    let output = options.output.unwrap_or_else(|| {
        config
            .output_dir
            .join(format!("scorecard-{}.json", scorecard.session_id))
    });
    scorecard.save_json(&output)?;
    println!("Scorecard saved to: {}", output.display());

    Ok(())
}

fn topic_status(analysis: &AnalysisResult, topic: &str) -> &'static str {
    if analysis.strengths.iter().any(|t| t == topic) {
        "strength"
    } else if analysis.weaknesses.iter().any(|t| t == topic) {
        "weakness"
    } else {
        ""
    }
}

fn print_scorecard(scorecard: &Scorecard) {
    let analysis = &scorecard.analysis;

    let mut table = Table::new();
    table.set_header(vec!["Topic", "Score", "Status"]);
    for (topic, score) in &analysis.topic_scores {
        table.add_row(vec![
            Cell::new(topic),
            Cell::new(format!("{score}%")),
            Cell::new(topic_status(analysis, topic)),
        ]);
    }

    println!("{table}");
    println!(
        "Overall score: {}% ({} of {} questions answered)",
        analysis.overall_score, scorecard.answered_count, scorecard.question_count
    );
    println!("Strengths: {}", list_or_none(&analysis.strengths));
    println!("Weaknesses: {}", list_or_none(&analysis.weaknesses));
    if let Some(rating) = &scorecard.self_rating {
        println!("Self-rating: {rating}");
    }

    if let Some(feedback) = &scorecard.feedback {
        print_feedback(feedback);
    }
}

fn print_feedback(feedback: &Feedback) {
    println!();
    println!("{}", feedback.overall_assessment);
    for line in [
        &feedback.strengths_analysis,
        &feedback.weaknesses_analysis,
        &feedback.learning_style_recommendations,
        &feedback.study_plan_suggestion,
    ] {
        if !line.is_empty() {
            println!("  {line}");
        }
    }
    println!(
        "Estimated preparation time: {} (confidence {}/10)",
        feedback.estimated_preparation_time, feedback.confidence_score
    );
}

fn list_or_none(topics: &[String]) -> String {
    if topics.is_empty() {
        "none".into()
    } else {
        topics.join(", ")
    }
}
