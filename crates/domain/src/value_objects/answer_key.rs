//! Answer key extracted from an experience's level steps.

use serde::{Deserialize, Serialize};

use crate::value_objects::{GameData, Step};

/// Placeholder used when a level carries no usable answer.
const ANSWER_UNAVAILABLE: &str = "(answer unavailable)";

/// One solved level in the answer key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerKeyEntry {
    /// 1-based position of the level within the document.
    pub number: u32,
    pub title: String,
    pub answer: String,
}

/// The full answer key for an experience, in level order.
///
/// Extraction never fails: levels with blank answers degrade to a
/// placeholder entry rather than aborting the walk.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerKey {
    pub entries: Vec<AnswerKeyEntry>,
}

impl AnswerKey {
    /// Walk the level steps in order and collect each declared answer,
    /// numbered by level position.
    pub fn from_game_data(data: &GameData) -> Self {
        let entries = data
            .levels()
            .enumerate()
            .filter_map(|(i, step)| match step {
                Step::Level {
                    level_title,
                    answer,
                    ..
                } => {
                    let answer = answer.trim();
                    Some(AnswerKeyEntry {
                        number: (i + 1) as u32,
                        title: level_title.trim().to_string(),
                        answer: if answer.is_empty() {
                            ANSWER_UNAVAILABLE.to_string()
                        } else {
                            answer.to_string()
                        },
                    })
                }
                Step::Intro { .. } => None,
            })
            .collect();
        Self { entries }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value_objects::VisualConfig;

    fn doc(steps: Vec<Step>) -> GameData {
        GameData {
            visual_config: VisualConfig::default(),
            title: "t".to_string(),
            steps,
        }
    }

    #[test]
    fn collects_answers_in_level_order() {
        let data = doc(vec![
            Step::Intro {
                title: "i".to_string(),
                subtitle: "s".to_string(),
            },
            Step::Level {
                level_number: 1,
                level_title: "The Gate".to_string(),
                question: "q1".to_string(),
                answer: "sunrise".to_string(),
            },
            Step::Level {
                level_number: 2,
                level_title: "The Vault".to_string(),
                question: "q2".to_string(),
                answer: " echo ".to_string(),
            },
        ]);

        let key = AnswerKey::from_game_data(&data);
        assert_eq!(key.entries.len(), 2);
        assert_eq!(key.entries[0].number, 1);
        assert_eq!(key.entries[0].answer, "sunrise");
        assert_eq!(key.entries[1].number, 2);
        assert_eq!(key.entries[1].answer, "echo");
    }

    #[test]
    fn blank_answer_degrades_to_placeholder() {
        let data = doc(vec![
            Step::Intro {
                title: "i".to_string(),
                subtitle: "s".to_string(),
            },
            Step::Level {
                level_number: 1,
                level_title: "Silent Room".to_string(),
                question: "q".to_string(),
                answer: "   ".to_string(),
            },
        ]);

        let key = AnswerKey::from_game_data(&data);
        assert_eq!(key.entries[0].answer, ANSWER_UNAVAILABLE);
    }

    #[test]
    fn document_without_levels_yields_empty_key() {
        let key = AnswerKey::from_game_data(&GameData::initial());
        assert!(key.is_empty());
    }
}
