//! Create experience use case.

use std::sync::Arc;

use giftwrap_domain::Experience;

use crate::infrastructure::ports::{ClockPort, ExperienceRepo, RepoError};

/// Mints a fresh draft experience with the seed document.
pub struct CreateExperience {
    experiences: Arc<dyn ExperienceRepo>,
    clock: Arc<dyn ClockPort>,
}

impl CreateExperience {
    pub fn new(experiences: Arc<dyn ExperienceRepo>, clock: Arc<dyn ClockPort>) -> Self {
        Self { experiences, clock }
    }

    pub async fn execute(&self) -> Result<Experience, RepoError> {
        let experience = Experience::new(self.clock.now());
        self.experiences.insert(experience.clone()).await?;
        tracing::info!(experience_id = %experience.id, "created draft experience");
        Ok(experience)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::ports::{MockClockPort, MockExperienceRepo};
    use chrono::{TimeZone, Utc};

    #[tokio::test]
    async fn inserts_a_fresh_draft() {
        let mut experiences = MockExperienceRepo::new();
        let mut clock = MockClockPort::new();
        let created = Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).single().expect("ts");

        clock.expect_now().returning(move || created);
        experiences
            .expect_insert()
            .withf(move |exp| {
                !exp.is_paid && exp.revision == 0 && exp.created_at == created
            })
            .returning(|_| Ok(()));

        let use_case = CreateExperience::new(Arc::new(experiences), Arc::new(clock));
        let experience = use_case.execute().await.expect("create");
        assert!(experience.game_data.validate().is_ok());
    }
}
