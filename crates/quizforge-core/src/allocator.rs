//! Question allocation.
//!
//! Turns [`DiagnosticSettings`] and a topic catalog into a [`GenerationPlan`]:
//! an ordered list of `(topic, difficulty, count)` slots whose counts add up
//! to exactly the requested question count.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::SettingsError;
use crate::model::{DiagnosticSettings, Difficulty, DifficultyDistribution, TopicSelection};

/// Upper bound on topics picked by [`TopicSelection::Random`].
pub const RANDOM_TOPIC_LIMIT: usize = 5;

/// Tier that absorbs any rounding shortfall.
const SHORTFALL_TIER: Difficulty = Difficulty::Medium;

/// Tiers that give up questions when rounding overshoots, in order.
const EXCESS_REMOVAL_ORDER: [Difficulty; 3] =
    [Difficulty::Hard, Difficulty::Medium, Difficulty::Easy];

/// A single unit of generation work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Slot {
    pub topic_id: String,
    pub difficulty: Difficulty,
    pub count: u32,
}

/// Question count per difficulty tier, indexed by [`Difficulty::index`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierCounts([u32; 3]);

impl TierCounts {
    pub fn new(easy: u32, medium: u32, hard: u32) -> Self {
        Self([easy, medium, hard])
    }

    pub fn get(&self, difficulty: Difficulty) -> u32 {
        self.0[difficulty.index()]
    }

    pub fn total(&self) -> u32 {
        self.0.iter().sum()
    }

    /// `(tier, count)` pairs, easiest first.
    pub fn iter(&self) -> impl Iterator<Item = (Difficulty, u32)> + '_ {
        Difficulty::ALL.into_iter().map(|d| (d, self.get(d)))
    }

    fn get_mut(&mut self, difficulty: Difficulty) -> &mut u32 {
        &mut self.0[difficulty.index()]
    }
}

/// The allocator's output: every slot that must be filled before a
/// diagnostic session can run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationPlan {
    /// The question count the settings asked for.
    pub requested: u32,
    /// Topics chosen for this plan, selection order.
    pub topics: Vec<String>,
    /// Questions per tier after reconciliation.
    pub tier_counts: TierCounts,
    /// Slots, tier-major (easy, medium, hard), then topic order.
    pub slots: Vec<Slot>,
}

impl GenerationPlan {
    fn empty(requested: u32) -> Self {
        Self {
            requested,
            topics: Vec::new(),
            tier_counts: TierCounts::default(),
            slots: Vec::new(),
        }
    }

    /// Sum of all slot counts.
    pub fn total(&self) -> u32 {
        self.slots.iter().map(|s| s.count).sum()
    }

    /// `true` when no questions can be generated (no topics available).
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

/// Build a generation plan.
///
/// Settings are validated first. An empty topic catalog yields an empty plan
/// rather than an error; callers must handle "no questions available".
pub fn allocate<R: Rng + ?Sized>(
    settings: &DiagnosticSettings,
    available_topics: &[String],
    rng: &mut R,
) -> Result<GenerationPlan, SettingsError> {
    settings.validate()?;

    if available_topics.is_empty() {
        tracing::warn!("topic catalog is empty, producing an empty plan");
        return Ok(GenerationPlan::empty(settings.question_count));
    }

    let topics = select_topics(&settings.topic_selection, available_topics, rng);
    let tier_counts = difficulty_counts(settings.question_count, &settings.difficulty_distribution);

    let mut slots = Vec::new();
    for (difficulty, count) in tier_counts.iter() {
        slots.extend(distribute_across_topics(difficulty, count, &topics, rng));
    }

    tracing::debug!(
        requested = settings.question_count,
        topics = topics.len(),
        slots = slots.len(),
        "allocated generation plan"
    );

    Ok(GenerationPlan {
        requested: settings.question_count,
        topics,
        tier_counts,
        slots,
    })
}

/// Resolve a topic selection against the catalog.
pub fn select_topics<R: Rng + ?Sized>(
    selection: &TopicSelection,
    available_topics: &[String],
    rng: &mut R,
) -> Vec<String> {
    match selection {
        TopicSelection::All => available_topics.to_vec(),
        TopicSelection::Random => {
            let mut shuffled = available_topics.to_vec();
            shuffled.shuffle(rng);
            shuffled.truncate(RANDOM_TOPIC_LIMIT.min(available_topics.len()));
            shuffled
        }
        TopicSelection::Explicit(topics) if topics.is_empty() => available_topics.to_vec(),
        TopicSelection::Explicit(topics) => topics.clone(),
    }
}

/// Split `question_count` across the three tiers.
///
/// Each tier gets `round(percentage / 100 * question_count)`, rounding half
/// up. A shortfall goes to medium; an excess is taken from hard, then medium,
/// then easy, never below zero.
pub fn difficulty_counts(question_count: u32, distribution: &DifficultyDistribution) -> TierCounts {
    let mut counts = TierCounts::default();
    for difficulty in Difficulty::ALL {
        *counts.get_mut(difficulty) =
            percent_of(distribution.percentage(difficulty), question_count);
    }

    let assigned = u64::from(counts.0[0]) + u64::from(counts.0[1]) + u64::from(counts.0[2]);
    let target = u64::from(question_count);

    if assigned < target {
        *counts.get_mut(SHORTFALL_TIER) += (target - assigned) as u32;
    } else if assigned > target {
        let mut excess = assigned - target;
        for difficulty in EXCESS_REMOVAL_ORDER {
            if excess == 0 {
                break;
            }
            let tier = counts.get_mut(difficulty);
            let taken = excess.min(u64::from(*tier));
            *tier -= taken as u32;
            excess -= taken;
        }
    }

    counts
}

/// `round(percentage / 100 * total)` with half-up rounding, in integers.
fn percent_of(percentage: u32, total: u32) -> u32 {
    let scaled = 2 * u64::from(percentage) * u64::from(total) + 100;
    (scaled / 200) as u32
}

/// Spread `count` questions of one tier across `topics`.
///
/// Every topic gets `max(1, count / topics)` in selection order until the
/// count runs out. Whatever is left after one pass goes, entire, to one extra
/// slot for a randomly chosen topic, so the spread is only approximately even.
pub fn distribute_across_topics<R: Rng + ?Sized>(
    difficulty: Difficulty,
    count: u32,
    topics: &[String],
    rng: &mut R,
) -> Vec<Slot> {
    if count == 0 || topics.is_empty() {
        return Vec::new();
    }

    let per_topic = (count as usize / topics.len()).max(1) as u32;
    let mut remaining = count;
    let mut slots = Vec::new();

    for topic in topics {
        if remaining == 0 {
            break;
        }
        let assigned = per_topic.min(remaining);
        slots.push(Slot {
            topic_id: topic.clone(),
            difficulty,
            count: assigned,
        });
        remaining -= assigned;
    }

    if remaining > 0 {
        if let Some(topic) = topics.choose(rng) {
            slots.push(Slot {
                topic_id: topic.clone(),
                difficulty,
                count: remaining,
            });
        }
    }

    slots
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::*;
    use crate::model::DEFAULT_TOPICS;

    fn catalog(n: usize) -> Vec<String> {
        DEFAULT_TOPICS.iter().take(n).map(|t| t.to_string()).collect()
    }

    fn settings(count: u32, selection: TopicSelection, dist: (u32, u32, u32)) -> DiagnosticSettings {
        DiagnosticSettings {
            question_count: count,
            topic_selection: selection,
            difficulty_distribution: DifficultyDistribution::new(dist.0, dist.1, dist.2),
            time_limit: None,
        }
    }

    #[test]
    fn ten_questions_with_default_distribution() {
        let counts = difficulty_counts(10, &DifficultyDistribution::new(30, 50, 20));
        assert_eq!(counts, TierCounts::new(3, 5, 2));
    }

    #[test]
    fn single_question_lands_in_one_tier() {
        let counts = difficulty_counts(1, &DifficultyDistribution::new(30, 50, 20));
        assert_eq!(counts, TierCounts::new(0, 1, 0));

        // Rounds to 1 + 1 + 0, the excess comes out of medium since hard is empty.
        let counts = difficulty_counts(1, &DifficultyDistribution::new(50, 50, 0));
        assert_eq!(counts, TierCounts::new(1, 0, 0));

        let counts = difficulty_counts(1, &DifficultyDistribution::new(0, 0, 0));
        assert_eq!(counts, TierCounts::new(0, 1, 0));
    }

    #[test]
    fn excess_is_removed_hard_first() {
        // 34 + 33 + 34 rounds to 2 + 2 + 2 for 5 questions: one too many.
        let counts = difficulty_counts(5, &DifficultyDistribution::new(34, 33, 34));
        assert_eq!(counts, TierCounts::new(2, 2, 1));
    }

    #[test]
    fn excess_spills_past_an_emptied_tier() {
        let counts = difficulty_counts(4, &DifficultyDistribution::new(100, 100, 50));
        // 4 + 4 + 2 = 10, remove 6: hard 2 -> 0, medium 4 -> 0.
        assert_eq!(counts, TierCounts::new(4, 0, 0));
    }

    #[test]
    fn shortfall_goes_to_medium() {
        let counts = difficulty_counts(10, &DifficultyDistribution::new(10, 10, 10));
        assert_eq!(counts, TierCounts::new(1, 8, 1));
    }

    #[test]
    fn tier_counts_always_sum_to_request() {
        let distributions = [
            (30, 50, 20),
            (0, 0, 0),
            (100, 100, 100),
            (33, 33, 33),
            (34, 33, 34),
            (1, 98, 1),
            (100, 0, 0),
            (45, 10, 45),
            (55, 55, 55),
        ];
        for (easy, medium, hard) in distributions {
            let dist = DifficultyDistribution::new(easy, medium, hard);
            for count in 1..=1000 {
                let counts = difficulty_counts(count, &dist);
                assert_eq!(
                    counts.total(),
                    count,
                    "count {count} with {easy}/{medium}/{hard}"
                );
            }
        }
    }

    #[test]
    fn plan_total_matches_request() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let topics = catalog(10);
        for count in [1, 2, 3, 7, 10, 13, 50, 99, 1000] {
            for selection in [
                TopicSelection::All,
                TopicSelection::Random,
                TopicSelection::Explicit(vec!["algorithms".into(), "cryptography".into()]),
            ] {
                let plan = allocate(&settings(count, selection, (30, 50, 20)), &topics, &mut rng)
                    .unwrap();
                assert_eq!(plan.total(), count);
                assert_eq!(plan.tier_counts.total(), count);
                assert!(plan.slots.iter().all(|s| s.count > 0));
            }
        }
    }

    #[test]
    fn random_selection_is_bounded_and_distinct() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);

        let picked = select_topics(&TopicSelection::Random, &catalog(10), &mut rng);
        assert_eq!(picked.len(), 5);
        assert_eq!(picked.iter().collect::<HashSet<_>>().len(), 5);

        let picked = select_topics(&TopicSelection::Random, &catalog(3), &mut rng);
        assert_eq!(picked.len(), 3);
        assert_eq!(picked.iter().collect::<HashSet<_>>().len(), 3);
    }

    #[test]
    fn random_selection_is_reproducible_with_a_seed() {
        let topics = catalog(10);
        let a = select_topics(
            &TopicSelection::Random,
            &topics,
            &mut ChaCha8Rng::seed_from_u64(1),
        );
        let b = select_topics(
            &TopicSelection::Random,
            &topics,
            &mut ChaCha8Rng::seed_from_u64(1),
        );
        assert_eq!(a, b);
    }

    #[test]
    fn empty_explicit_selection_means_all() {
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let topics = catalog(4);
        let picked = select_topics(&TopicSelection::Explicit(vec![]), &topics, &mut rng);
        assert_eq!(picked, topics);
    }

    #[test]
    fn explicit_selection_keeps_order_and_duplicates() {
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let explicit = vec!["b".to_string(), "a".to_string(), "b".to_string()];
        let picked = select_topics(
            &TopicSelection::Explicit(explicit.clone()),
            &catalog(10),
            &mut rng,
        );
        assert_eq!(picked, explicit);
    }

    #[test]
    fn empty_catalog_gives_empty_plan() {
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let plan = allocate(&settings(10, TopicSelection::All, (30, 50, 20)), &[], &mut rng)
            .unwrap();
        assert!(plan.is_empty());
        assert_eq!(plan.total(), 0);
        assert_eq!(plan.requested, 10);
    }

    #[test]
    fn invalid_settings_are_rejected_before_allocation() {
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let err = allocate(&settings(0, TopicSelection::All, (30, 50, 20)), &catalog(3), &mut rng)
            .unwrap_err();
        assert_eq!(err, SettingsError::ZeroQuestionCount);
    }

    #[test]
    fn tier_spreads_evenly_when_divisible() {
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let slots = distribute_across_topics(Difficulty::Medium, 6, &catalog(3), &mut rng);
        assert_eq!(slots.len(), 3);
        assert!(slots.iter().all(|s| s.count == 2));
    }

    #[test]
    fn fewer_questions_than_topics_uses_leading_topics() {
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let topics = catalog(5);
        let slots = distribute_across_topics(Difficulty::Hard, 2, &topics, &mut rng);
        assert_eq!(slots.len(), 2);
        assert_eq!(slots[0].topic_id, topics[0]);
        assert_eq!(slots[1].topic_id, topics[1]);
        assert!(slots.iter().all(|s| s.count == 1));
    }

    #[test]
    fn remainder_goes_to_one_extra_slot() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let topics = catalog(3);
        let slots = distribute_across_topics(Difficulty::Easy, 8, &topics, &mut rng);
        // 8 / 3 = 2 per topic, then one extra slot with the remaining 2.
        assert_eq!(slots.len(), 4);
        assert!(slots[..3].iter().all(|s| s.count == 2));
        assert_eq!(slots[3].count, 2);
        assert!(topics.contains(&slots[3].topic_id));
        assert!(slots.iter().all(|s| s.difficulty == Difficulty::Easy));
    }

    #[test]
    fn slots_are_tier_major() {
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let plan = allocate(
            &settings(10, TopicSelection::All, (30, 50, 20)),
            &catalog(2),
            &mut rng,
        )
        .unwrap();
        let tiers: Vec<Difficulty> = plan.slots.iter().map(|s| s.difficulty).collect();
        let mut sorted = tiers.clone();
        sorted.sort();
        assert_eq!(tiers, sorted);
    }
}
