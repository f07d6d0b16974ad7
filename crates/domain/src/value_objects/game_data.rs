//! The structured state document exchanged with the LLM and persisted
//! per experience.

use serde::{Deserialize, Serialize};

use crate::DomainError;

/// Number of level steps a finished experience is expected to carry.
///
/// The prompt instructs the model to produce exactly this many levels;
/// merge-time validation accepts any contiguous count so the creator can
/// build the experience up over several turns.
pub const LEVEL_COUNT: usize = 5;

/// Presentation/template identifier assigned to new experiences.
pub const DEFAULT_TEMPLATE: &str = "theme-default";

/// Visual identity of an experience, chosen by the model alongside the
/// narrative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisualConfig {
    pub primary_color: String,
    pub bg_color: String,
    pub font_family: String,
    pub theme_icon: String,
}

impl Default for VisualConfig {
    fn default() -> Self {
        Self {
            primary_color: "#9333EA".to_string(),
            bg_color: "#0F172A".to_string(),
            font_family: "Montserrat".to_string(),
            theme_icon: "fa-wand-magic-sparkles".to_string(),
        }
    }
}

/// One unit of the experience's narrative structure.
///
/// The wire format is a tagged union on `type`, matching the schema the
/// model is instructed to produce.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Step {
    Intro {
        title: String,
        subtitle: String,
    },
    Level {
        level_number: u32,
        level_title: String,
        question: String,
        answer: String,
    },
}

impl Step {
    pub fn is_intro(&self) -> bool {
        matches!(self, Step::Intro { .. })
    }

    pub fn is_level(&self) -> bool {
        matches!(self, Step::Level { .. })
    }
}

/// The canonical structured state of an experience.
///
/// Replaced wholesale on every successful merge; a document is only ever
/// accepted after [`GameData::validate`] passes, so persisted state is
/// always fully formed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameData {
    pub visual_config: VisualConfig,
    pub title: String,
    pub steps: Vec<Step>,
}

impl GameData {
    /// The document seeded into a freshly created experience.
    ///
    /// Carries a placeholder intro so the one-intro invariant holds from
    /// birth, before the model has produced anything.
    pub fn initial() -> Self {
        Self {
            visual_config: VisualConfig::default(),
            title: "New Experience".to_string(),
            steps: vec![Step::Intro {
                title: "Your experience awaits".to_string(),
                subtitle: "Chat with the creative director to design it".to_string(),
            }],
        }
    }

    /// Validate the structural invariants:
    /// - exactly one intro step, and it comes first
    /// - level steps numbered contiguously starting at 1, in order
    pub fn validate(&self) -> Result<(), DomainError> {
        let mut steps = self.steps.iter();
        match steps.next() {
            Some(step) if step.is_intro() => {}
            _ => {
                return Err(DomainError::validation(
                    "steps must begin with exactly one intro step",
                ))
            }
        }

        let mut expected = 1u32;
        for step in steps {
            match step {
                Step::Intro { .. } => {
                    return Err(DomainError::validation(
                        "only the first step may be an intro",
                    ))
                }
                Step::Level { level_number, .. } => {
                    if *level_number != expected {
                        return Err(DomainError::validation(format!(
                            "level steps must be numbered contiguously from 1: expected {expected}, found {level_number}"
                        )));
                    }
                    expected += 1;
                }
            }
        }

        Ok(())
    }

    /// Level steps in document order.
    pub fn levels(&self) -> impl Iterator<Item = &Step> {
        self.steps.iter().filter(|s| s.is_level())
    }
}
