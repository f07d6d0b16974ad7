//! View experience use case.
//!
//! Resolves what a visitor gets to see. The paid branch is evaluated on
//! every request, never cached: until payment confirms, the play route
//! serves the demo variant and withholds the real gift.

use std::sync::Arc;

use serde::Serialize;

use giftwrap_domain::{ExperienceId, GameData};

use crate::infrastructure::ports::{ExperienceRepo, RepoError};

/// What the player-facing renderer receives.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayView {
    pub id: ExperienceId,
    pub template_name: String,
    pub game_data: GameData,
    /// True until the experience is paid for.
    pub is_demo: bool,
    /// Present only on the full (paid) rendering.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub real_gift: Option<String>,
}

/// View experience use case.
pub struct ViewExperience {
    experiences: Arc<dyn ExperienceRepo>,
}

impl ViewExperience {
    pub fn new(experiences: Arc<dyn ExperienceRepo>) -> Self {
        Self { experiences }
    }

    /// Resolve the play view for an id. `force_demo` serves the preview
    /// variant even for paid experiences (the demo route).
    pub async fn execute(
        &self,
        id: ExperienceId,
        force_demo: bool,
    ) -> Result<Option<PlayView>, RepoError> {
        let Some(record) = self.experiences.get(id).await? else {
            return Ok(None);
        };

        let full_reveal = record.is_paid && !force_demo;
        Ok(Some(PlayView {
            id: record.id,
            template_name: record.template_name,
            game_data: record.game_data,
            is_demo: !full_reveal,
            real_gift: if full_reveal { record.real_gift } else { None },
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::ports::MockExperienceRepo;
    use chrono::{TimeZone, Utc};
    use giftwrap_domain::Experience;

    fn stored(id: &str, paid: bool) -> Experience {
        let created = Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).single().expect("ts");
        let mut exp = Experience::new(created);
        exp.id = ExperienceId::from_string(id);
        exp.real_gift = Some("Concert tickets".to_string());
        exp.is_paid = paid;
        exp
    }

    #[tokio::test]
    async fn unpaid_experience_serves_the_demo() {
        let mut experiences = MockExperienceRepo::new();
        experiences
            .expect_get()
            .returning(|id| Ok(Some(stored(id.as_str(), false))));

        let use_case = ViewExperience::new(Arc::new(experiences));
        let view = use_case
            .execute(ExperienceId::from_string("ab12cd34"), false)
            .await
            .expect("view")
            .expect("some");

        assert!(view.is_demo);
        assert!(view.real_gift.is_none());
    }

    #[tokio::test]
    async fn paid_experience_unlocks_the_full_reveal() {
        let mut experiences = MockExperienceRepo::new();
        experiences
            .expect_get()
            .returning(|id| Ok(Some(stored(id.as_str(), true))));

        let use_case = ViewExperience::new(Arc::new(experiences));
        let view = use_case
            .execute(ExperienceId::from_string("ab12cd34"), false)
            .await
            .expect("view")
            .expect("some");

        assert!(!view.is_demo);
        assert_eq!(view.real_gift.as_deref(), Some("Concert tickets"));
    }

    #[tokio::test]
    async fn demo_route_never_reveals_the_gift_even_when_paid() {
        let mut experiences = MockExperienceRepo::new();
        experiences
            .expect_get()
            .returning(|id| Ok(Some(stored(id.as_str(), true))));

        let use_case = ViewExperience::new(Arc::new(experiences));
        let view = use_case
            .execute(ExperienceId::from_string("ab12cd34"), true)
            .await
            .expect("view")
            .expect("some");

        assert!(view.is_demo);
        assert!(view.real_gift.is_none());
    }

    #[tokio::test]
    async fn unknown_id_is_none() {
        let mut experiences = MockExperienceRepo::new();
        experiences.expect_get().returning(|_| Ok(None));

        let use_case = ViewExperience::new(Arc::new(experiences));
        let view = use_case
            .execute(ExperienceId::from_string("gone1234"), false)
            .await
            .expect("view");
        assert!(view.is_none());
    }
}
