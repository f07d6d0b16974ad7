//! Save experience use case.
//!
//! Handles both the silent editor save (wholesale game data replacement)
//! and finalization (attaching the real gift, which stamps the
//! finalization timestamp once).

use std::sync::Arc;

use giftwrap_domain::{DomainError, ExperienceId, GameData};

use crate::infrastructure::ports::{ClockPort, ExperienceRepo, RepoError};

/// What the creator wants saved. Both fields optional; an empty request
/// is a no-op that still verifies the record exists.
#[derive(Debug, Clone, Default)]
pub struct SaveRequest {
    pub game_data: Option<GameData>,
    /// Revision the caller's copy of the document is based on; defaults
    /// to the stored revision when absent.
    pub revision: Option<i64>,
    pub real_gift: Option<String>,
}

#[derive(Debug, Clone)]
pub struct SaveOutcome {
    /// Revision after the save.
    pub revision: i64,
}

#[derive(Debug, thiserror::Error)]
pub enum SaveError {
    #[error("Experience not found")]
    NotFound,
    #[error("Concurrent edit conflict")]
    Conflict,
    #[error(transparent)]
    Validation(#[from] DomainError),
    #[error(transparent)]
    Repo(RepoError),
}

impl From<RepoError> for SaveError {
    fn from(e: RepoError) -> Self {
        match e {
            RepoError::NotFound => SaveError::NotFound,
            RepoError::Conflict => SaveError::Conflict,
            other => SaveError::Repo(other),
        }
    }
}

/// Save experience use case.
pub struct SaveExperience {
    experiences: Arc<dyn ExperienceRepo>,
    clock: Arc<dyn ClockPort>,
}

impl SaveExperience {
    pub fn new(experiences: Arc<dyn ExperienceRepo>, clock: Arc<dyn ClockPort>) -> Self {
        Self { experiences, clock }
    }

    pub async fn execute(
        &self,
        id: ExperienceId,
        request: SaveRequest,
    ) -> Result<SaveOutcome, SaveError> {
        let record = self
            .experiences
            .get(id.clone())
            .await?
            .ok_or(SaveError::NotFound)?;

        let mut revision = record.revision;
        if let Some(data) = request.game_data {
            data.validate()?;
            let expected = request.revision.unwrap_or(revision);
            revision = self
                .experiences
                .update_game_data(id.clone(), data, expected)
                .await?;
        }

        if let Some(gift) = request.real_gift {
            self.experiences
                .set_real_gift(id.clone(), gift, self.clock.now())
                .await?;
            tracing::info!(experience_id = %id, "experience finalized");
        }

        Ok(SaveOutcome { revision })
    }
}
