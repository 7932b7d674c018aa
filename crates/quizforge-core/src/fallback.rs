//! Placeholder questions used when content generation fails.
//!
//! Pure string templating: this never fails and never performs I/O.

use uuid::Uuid;

use crate::model::{Difficulty, Question};

/// Exactly `count` placeholder questions for a slot.
///
/// Option 0 is always the correct one.
pub fn fallback_questions(topic: &str, difficulty: Difficulty, count: u32) -> Vec<Question> {
    (0..count)
        .map(|_| fallback_question(topic, difficulty))
        .collect()
}

/// One placeholder question with a fresh id.
pub fn fallback_question(topic: &str, difficulty: Difficulty) -> Question {
    let readable = topic.replace('_', " ");
    Question {
        id: synthesize_id(topic, difficulty),
        topic_id: topic.to_string(),
        text: format!("Sample {difficulty} question about {readable}"),
        options: vec![
            format!("Correct answer for {topic}"),
            format!("Wrong answer 1 for {topic}"),
            format!("Wrong answer 2 for {topic}"),
            format!("Wrong answer 3 for {topic}"),
        ],
        correct_option_index: 0,
        explanation: format!("This is the explanation for the correct answer about {readable}"),
        difficulty,
        tags: vec![topic.to_string()],
    }
}

/// `<topic>_<difficulty>_<random suffix>`.
pub fn synthesize_id(topic: &str, difficulty: Difficulty) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("{topic}_{difficulty}_{}", &suffix[..12])
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn returns_exactly_count_well_formed_questions() {
        for count in [0, 1, 4, 25] {
            let questions = fallback_questions("computer_networks", Difficulty::Hard, count);
            assert_eq!(questions.len(), count as usize);
            for q in &questions {
                assert!(q.is_well_formed());
                assert_eq!(q.correct_option_index, 0);
                assert_eq!(q.topic_id, "computer_networks");
                assert_eq!(q.difficulty, Difficulty::Hard);
            }
        }
    }

    #[test]
    fn options_are_marked() {
        let q = fallback_question("cryptography", Difficulty::Easy);
        assert_eq!(q.options[0], "Correct answer for cryptography");
        assert!(q.options[1..].iter().all(|o| o.starts_with("Wrong answer")));
        assert_eq!(q.text, "Sample easy question about cryptography");
        assert_eq!(q.tags, vec!["cryptography"]);
    }

    #[test]
    fn underscores_read_as_spaces_in_prose() {
        let q = fallback_question("operating_systems", Difficulty::Medium);
        assert!(q.text.ends_with("about operating systems"));
        assert!(q.explanation.ends_with("about operating systems"));
    }

    #[test]
    fn ids_carry_topic_and_tier_and_are_unique() {
        let questions = fallback_questions("algorithms", Difficulty::Medium, 50);
        assert!(questions
            .iter()
            .all(|q| q.id.starts_with("algorithms_medium_")));
        let ids: HashSet<_> = questions.iter().map(|q| &q.id).collect();
        assert_eq!(ids.len(), 50);
    }
}
