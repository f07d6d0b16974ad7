//! Start checkout use case.

use std::sync::Arc;

use giftwrap_domain::ExperienceId;

use crate::infrastructure::ports::{
    CheckoutPort, CheckoutRequest, ExperienceRepo, PaymentError, RepoError,
};
use crate::infrastructure::share::ShareLinkBuilder;

/// Price of unlocking one experience, in euro cents.
const UNLOCK_PRICE_MINOR: i64 = 249;
const UNLOCK_CURRENCY: &str = "eur";

/// Metadata key carrying the experience id through the gateway and back
/// on the confirmation webhook.
pub const METADATA_EXPERIENCE_ID: &str = "experience_id";

#[derive(Debug, thiserror::Error)]
pub enum CheckoutStartError {
    #[error("Experience not found")]
    NotFound,
    #[error(transparent)]
    Payment(#[from] PaymentError),
    #[error(transparent)]
    Repo(#[from] RepoError),
}

/// Creates a gateway checkout session for one experience and returns the
/// redirect URL. The experience id rides along as opaque metadata so the
/// confirmation webhook can find its way back.
pub struct StartCheckout {
    experiences: Arc<dyn ExperienceRepo>,
    checkout: Arc<dyn CheckoutPort>,
    share: ShareLinkBuilder,
}

impl StartCheckout {
    pub fn new(
        experiences: Arc<dyn ExperienceRepo>,
        checkout: Arc<dyn CheckoutPort>,
        share: ShareLinkBuilder,
    ) -> Self {
        Self {
            experiences,
            checkout,
            share,
        }
    }

    pub async fn execute(&self, id: ExperienceId) -> Result<String, CheckoutStartError> {
        let record = self
            .experiences
            .get(id.clone())
            .await?
            .ok_or(CheckoutStartError::NotFound)?;

        let session = self
            .checkout
            .create_session(CheckoutRequest {
                amount_minor: UNLOCK_PRICE_MINOR,
                currency: UNLOCK_CURRENCY.to_string(),
                product_name: format!("Full Access: {}", record.game_data.title),
                success_url: self.share.play_url(&id),
                cancel_url: self.share.demo_url(&id),
                metadata: vec![(METADATA_EXPERIENCE_ID.to_string(), id.to_string())],
            })
            .await?;

        Ok(session.url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::ports::{CheckoutSession, MockCheckoutPort, MockExperienceRepo};
    use chrono::{TimeZone, Utc};
    use giftwrap_domain::Experience;

    fn stored(id: &str) -> Experience {
        let created = Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).single().expect("ts");
        let mut exp = Experience::new(created);
        exp.id = ExperienceId::from_string(id);
        exp.game_data.title = "The Birthday Heist".to_string();
        exp
    }

    #[tokio::test]
    async fn builds_the_session_with_metadata_and_redirects() {
        let mut experiences = MockExperienceRepo::new();
        let mut checkout = MockCheckoutPort::new();

        experiences
            .expect_get()
            .returning(|id| Ok(Some(stored(id.as_str()))));
        checkout
            .expect_create_session()
            .withf(|request| {
                request.amount_minor == 249
                    && request.currency == "eur"
                    && request.product_name == "Full Access: The Birthday Heist"
                    && request.success_url.ends_with("/experience/ab12cd34")
                    && request.cancel_url.ends_with("/demo/ab12cd34")
                    && request
                        .metadata
                        .contains(&("experience_id".to_string(), "ab12cd34".to_string()))
            })
            .returning(|_| {
                Ok(CheckoutSession {
                    url: "https://pay.example/session/cs_123".to_string(),
                })
            });

        let use_case = StartCheckout::new(
            Arc::new(experiences),
            Arc::new(checkout),
            ShareLinkBuilder::new("https://giftwrap.example"),
        );
        let url = use_case
            .execute(ExperienceId::from_string("ab12cd34"))
            .await
            .expect("checkout");
        assert_eq!(url, "https://pay.example/session/cs_123");
    }

    #[tokio::test]
    async fn unknown_id_is_not_found() {
        let mut experiences = MockExperienceRepo::new();
        let checkout = MockCheckoutPort::new();

        experiences.expect_get().returning(|_| Ok(None));

        let use_case = StartCheckout::new(
            Arc::new(experiences),
            Arc::new(checkout),
            ShareLinkBuilder::new("https://giftwrap.example"),
        );
        let result = use_case.execute(ExperienceId::from_string("gone1234")).await;
        assert!(matches!(result, Err(CheckoutStartError::NotFound)));
    }
}
