//! GiftWrap domain types.
//!
//! Core types for puzzle gift experiences: the persisted [`Experience`]
//! record, the [`GameData`] document exchanged with the LLM, and the
//! invariants both must uphold. No I/O lives here.

pub mod entities;
pub mod error;
pub mod ids;
pub mod value_objects;

pub use entities::Experience;
pub use error::DomainError;
pub use ids::ExperienceId;
pub use value_objects::{
    AnswerKey, AnswerKeyEntry, GameData, Step, VisualConfig, DEFAULT_TEMPLATE, LEVEL_COUNT,
};
