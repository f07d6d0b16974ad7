//! Conversation-turn orchestrator.
//!
//! Drives one creator turn: composes the model input from the behavioral
//! directive, the current game document and the conversation history,
//! invokes the LLM, parses the reply, and merges a valid document into
//! the store wholesale. The orchestrator holds no state between calls;
//! the caller owns the history and passes it in every turn.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use giftwrap_domain::{ExperienceId, GameData};

use crate::infrastructure::ports::{
    ChatMessage, ExperienceRepo, LlmError, LlmPort, LlmRequest, RepoError,
};
use crate::prompt_templates;
use crate::use_cases::chat::parse_reply;

/// Fixed creativity parameter for creator chat.
const CHAT_TEMPERATURE: f32 = 0.7;

/// Side of the two-party creator dialogue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    Creator,
    Assistant,
}

/// One prior turn of the conversation, supplied by the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub speaker: Speaker,
    pub text: String,
}

/// Input for one conversation turn.
#[derive(Debug, Clone)]
pub struct ChatTurnInput {
    pub experience_id: ExperienceId,
    /// The creator's new message.
    pub message: String,
    /// Prior turns, oldest first.
    pub history: Vec<HistoryEntry>,
    /// The caller's view of the current document, if it has one.
    pub current_state: Option<GameData>,
    /// The revision the caller's view is based on.
    pub revision: Option<i64>,
}

/// Result of one conversation turn.
#[derive(Debug, Clone)]
pub struct ChatTurnOutput {
    /// Narrative chat reply to show the creator.
    pub reply: String,
    /// The replacement document, when the model produced a valid one.
    pub new_state: Option<GameData>,
    /// Revision after this turn (unchanged when nothing was persisted).
    pub revision: Option<i64>,
}

#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("Experience not found")]
    ExperienceNotFound,
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error(transparent)]
    Llm(#[from] LlmError),
    #[error(transparent)]
    Repo(#[from] RepoError),
}

/// Conversation turn use case.
///
/// Orchestrates: state lookup, prompt composition, LLM call, reply
/// parsing, wholesale merge.
pub struct ChatTurn {
    experiences: Arc<dyn ExperienceRepo>,
    llm: Arc<dyn LlmPort>,
}

impl ChatTurn {
    pub fn new(experiences: Arc<dyn ExperienceRepo>, llm: Arc<dyn LlmPort>) -> Self {
        Self { experiences, llm }
    }

    /// Run one creator turn.
    ///
    /// The persisted state after this call is always either the prior
    /// document or a fully validated replacement. An LLM failure leaves
    /// both store and caller history untouched.
    pub async fn execute(&self, input: ChatTurnInput) -> Result<ChatTurnOutput, ChatError> {
        // 1. Establish the base document and its revision.
        let (current_state, revision) = match (input.current_state, input.revision) {
            (Some(state), Some(revision)) => (state, Some(revision)),
            (maybe_state, _) => match self.experiences.get(input.experience_id.clone()).await? {
                Some(record) => {
                    let revision = record.revision;
                    (maybe_state.unwrap_or(record.game_data), Some(revision))
                }
                None => match maybe_state {
                    // Session lost its binding: still converse, never persist.
                    Some(state) => (state, None),
                    None => return Err(ChatError::ExperienceNotFound),
                },
            },
        };

        // 2. Compose the model input.
        let state_json = serde_json::to_string(&current_state)
            .map_err(|e| ChatError::Serialization(e.to_string()))?;
        let system_prompt = format!(
            "{}\n\nCURRENT GAME JSON (use it as the base to modify, do not invent from scratch):\n{}",
            prompt_templates::mini_escape(),
            state_json
        );

        let mut messages: Vec<ChatMessage> = input
            .history
            .iter()
            .map(|entry| match entry.speaker {
                Speaker::Creator => ChatMessage::user(entry.text.clone()),
                Speaker::Assistant => ChatMessage::assistant(entry.text.clone()),
            })
            .collect();
        messages.push(ChatMessage::user(input.message));

        // 3. Single LLM attempt; a failure surfaces as a retryable error.
        let response = self
            .llm
            .generate(
                LlmRequest::new(messages)
                    .with_system_prompt(system_prompt)
                    .with_temperature(CHAT_TEMPERATURE),
            )
            .await?;

        // 4. Split narrative from candidate document.
        let parsed = parse_reply(&response.content);

        // 5. Merge a valid document wholesale, guarded by the revision.
        let mut new_revision = revision;
        if let Some(data) = &parsed.data {
            match revision {
                Some(expected) => {
                    match self
                        .experiences
                        .update_game_data(input.experience_id.clone(), data.clone(), expected)
                        .await
                    {
                        Ok(bumped) => new_revision = Some(bumped),
                        Err(RepoError::Conflict) => {
                            tracing::warn!(
                                experience_id = %input.experience_id,
                                "concurrent edit won the merge; returning state unpersisted"
                            );
                        }
                        Err(RepoError::NotFound) => {
                            tracing::warn!(
                                experience_id = %input.experience_id,
                                "experience disappeared mid-turn; returning state unpersisted"
                            );
                        }
                        Err(e) => return Err(e.into()),
                    }
                }
                None => {
                    tracing::warn!(
                        experience_id = %input.experience_id,
                        "no stored record for experience; returning state unpersisted"
                    );
                }
            }
        }

        Ok(ChatTurnOutput {
            reply: parsed.narrative,
            new_state: parsed.data,
            revision: new_revision,
        })
    }
}
