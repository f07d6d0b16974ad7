//! Value objects - Immutable objects defined by their attributes

mod answer_key;
mod game_data;

pub use answer_key::{AnswerKey, AnswerKeyEntry};
pub use game_data::{GameData, Step, VisualConfig, DEFAULT_TEMPLATE, LEVEL_COUNT};
