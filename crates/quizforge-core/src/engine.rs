//! Diagnostic generation engine.
//!
//! Fills every slot of a [`GenerationPlan`] through an LLM provider with
//! bounded parallelism and retries. Each slot falls back to placeholder
//! questions on its own failure, so a run always yields exactly the planned
//! number of questions.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::stream::{FuturesUnordered, StreamExt};
use tokio::sync::Semaphore;
use uuid::Uuid;

use crate::allocator::{GenerationPlan, Slot};
use crate::error::ProviderError;
use crate::fallback::{fallback_questions, synthesize_id};
use crate::model::{DiagnosticSettings, Question};
use crate::parser::parse_generated_questions;
use crate::report::{DiagnosticSession, SlotOutcome};
use crate::traits::{GenerateRequest, LlmProvider, TokenUsage};

/// Upper bound on any wait between retries, including provider hints.
const MAX_RETRY_DELAY: Duration = Duration::from_secs(60);

/// Configuration for the generation engine.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Model identifier passed to the provider.
    pub model: String,
    /// Maximum concurrent slot requests.
    pub parallelism: usize,
    /// Temperature for generation.
    pub temperature: f64,
    /// Max tokens for generation.
    pub max_tokens: u32,
    /// Retries on transient provider errors.
    pub max_retries_per_slot: u32,
    /// Delay before the first retry; doubles on each further retry.
    pub retry_delay: Duration,
    /// Optional system prompt override.
    pub system_prompt_override: Option<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4.1".into(),
            parallelism: 4,
            temperature: 0.7,
            max_tokens: 2000,
            max_retries_per_slot: 2,
            retry_delay: Duration::from_secs(1),
            system_prompt_override: None,
        }
    }
}

/// Progress reporting trait.
pub trait ProgressReporter: Send + Sync {
    fn on_slot_start(&self, slot: &Slot);
    fn on_slot_complete(&self, outcome: &SlotOutcome);
    fn on_plan_complete(&self, slots: usize, fallback_slots: usize, elapsed: Duration);
}

/// No-op progress reporter.
pub struct NoopReporter;

impl ProgressReporter for NoopReporter {
    fn on_slot_start(&self, _: &Slot) {}
    fn on_slot_complete(&self, _: &SlotOutcome) {}
    fn on_plan_complete(&self, _: usize, _: usize, _: Duration) {}
}

/// The generation engine.
pub struct DiagnosticEngine {
    provider: Option<Arc<dyn LlmProvider>>,
    config: EngineConfig,
}

impl DiagnosticEngine {
    pub fn new(provider: Arc<dyn LlmProvider>, config: EngineConfig) -> Self {
        Self {
            provider: Some(provider),
            config,
        }
    }

    /// An engine with no provider: every slot is filled with placeholders.
    pub fn offline(config: EngineConfig) -> Self {
        Self {
            provider: None,
            config,
        }
    }

    /// Generate questions for every slot of `plan`.
    pub async fn run(
        &self,
        plan: &GenerationPlan,
        settings: &DiagnosticSettings,
        progress: &dyn ProgressReporter,
    ) -> DiagnosticSession {
        let start = Instant::now();
        let semaphore = Arc::new(Semaphore::new(self.config.parallelism.max(1)));

        let mut futures = FuturesUnordered::new();

        for (index, slot) in plan.slots.iter().enumerate() {
            let provider = self.provider.clone();
            let semaphore = Arc::clone(&semaphore);
            let config = self.config.clone();
            let slot = slot.clone();

            futures.push(async move {
                let Some(provider) = provider else {
                    return (index, placeholder_slot(&slot, "offline".into()));
                };

                let _permit = match semaphore.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(_) => {
                        return (index, fill_slot(&slot, Err(anyhow::anyhow!("semaphore closed"))))
                    }
                };

                progress.on_slot_start(&slot);
                let generated = generate_slot(provider.as_ref(), &slot, &config).await;
                (index, fill_slot(&slot, generated))
            });
        }

        let mut filled: Vec<Option<(SlotOutcome, Vec<Question>)>> = vec![None; plan.slots.len()];
        while let Some((index, (outcome, questions))) = futures.next().await {
            progress.on_slot_complete(&outcome);
            filled[index] = Some((outcome, questions));
        }

        let mut outcomes = Vec::with_capacity(filled.len());
        let mut questions = Vec::with_capacity(plan.total() as usize);
        for (outcome, slot_questions) in filled.into_iter().flatten() {
            outcomes.push(outcome);
            questions.extend(slot_questions);
        }
        ensure_unique_ids(&mut questions);

        let elapsed = start.elapsed();
        let fallback_slots = outcomes.iter().filter(|o| o.used_fallback()).count();
        progress.on_plan_complete(outcomes.len(), fallback_slots, elapsed);

        DiagnosticSession {
            id: Uuid::new_v4(),
            created_at: chrono::Utc::now(),
            settings: settings.clone(),
            plan: plan.clone(),
            questions,
            outcomes,
            duration_ms: elapsed.as_millis() as u64,
        }
    }
}

/// Ask the provider for one slot, retrying transient errors with
/// exponential backoff.
async fn generate_slot(
    provider: &dyn LlmProvider,
    slot: &Slot,
    config: &EngineConfig,
) -> anyhow::Result<(Vec<Question>, TokenUsage)> {
    let request = GenerateRequest {
        model: config.model.clone(),
        prompt: slot_prompt(slot),
        system_prompt: config.system_prompt_override.clone(),
        max_tokens: config.max_tokens,
        temperature: config.temperature,
    };

    let mut last_error = None;
    let mut retry_delay = config.retry_delay;
    for retry in 0..=config.max_retries_per_slot {
        if retry > 0 {
            tokio::time::sleep(retry_delay).await;
            retry_delay = (retry_delay * 2).min(MAX_RETRY_DELAY);
        }
        match provider.generate(&request).await {
            Ok(response) => {
                let batch = parse_generated_questions(&response.content, slot)?;
                if batch.rejected > 0 {
                    tracing::debug!(
                        "{} malformed questions dropped for {}/{}",
                        batch.rejected,
                        slot.topic_id,
                        slot.difficulty
                    );
                }
                return Ok((batch.questions, response.token_usage));
            }
            Err(e) => {
                if let Some(provider_error) = e.downcast_ref::<ProviderError>() {
                    if provider_error.is_permanent() {
                        return Err(e);
                    }
                    if let Some(ms) = provider_error.retry_after_ms() {
                        retry_delay = Duration::from_millis(ms).min(MAX_RETRY_DELAY);
                    }
                }
                last_error = Some(e);
            }
        }
    }

    Err(last_error.unwrap_or_else(|| anyhow::anyhow!("unknown error")))
}

/// Bring a slot's generated questions to exactly `slot.count`, topping up
/// with placeholders.
fn fill_slot(
    slot: &Slot,
    generated: anyhow::Result<(Vec<Question>, TokenUsage)>,
) -> (SlotOutcome, Vec<Question>) {
    let (mut questions, token_usage) = match generated {
        Ok(generated) => generated,
        Err(e) => {
            tracing::warn!(
                "generation failed for {}/{}, using placeholders: {e:#}",
                slot.topic_id,
                slot.difficulty
            );
            return placeholder_slot(slot, format!("{e:#}"));
        }
    };

    questions.truncate(slot.count as usize);
    let generated = questions.len() as u32;
    let missing = slot.count - generated;
    let error = (missing > 0).then(|| format!("generator returned {missing} too few questions"));
    questions.extend(fallback_questions(&slot.topic_id, slot.difficulty, missing));

    let outcome = SlotOutcome {
        slot: slot.clone(),
        generated,
        fallback: missing,
        error,
        token_usage,
    };
    (outcome, questions)
}

/// Fill a whole slot with placeholders.
fn placeholder_slot(slot: &Slot, reason: String) -> (SlotOutcome, Vec<Question>) {
    let outcome = SlotOutcome {
        slot: slot.clone(),
        generated: 0,
        fallback: slot.count,
        error: Some(reason),
        token_usage: TokenUsage::default(),
    };
    (outcome, fallback_questions(&slot.topic_id, slot.difficulty, slot.count))
}

/// Re-key questions whose id was already used earlier in the session.
fn ensure_unique_ids(questions: &mut [Question]) {
    let mut seen = HashSet::with_capacity(questions.len());
    for question in questions.iter_mut() {
        while !seen.insert(question.id.clone()) {
            question.id = synthesize_id(&question.topic_id, question.difficulty);
        }
    }
}

/// The task handed to the content generator for one slot.
pub fn slot_prompt(slot: &Slot) -> String {
    let topic = slot.topic_id.replace('_', " ");
    format!(
        "Generate {count} multiple-choice diagnostic questions about {topic} at {difficulty} \
         difficulty.\n\
         Each question must have exactly 4 options with exactly one correct answer and a brief \
         explanation of the correct answer.\n\
         Respond with a JSON array of objects with the fields \"text\", \"options\" (4 strings), \
         \"correctOptionIndex\" (0-based), \"explanation\" and \"tags\".",
        count = slot.count,
        difficulty = slot.difficulty,
    )
}
