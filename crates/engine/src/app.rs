//! Application state and composition.

use std::sync::Arc;

use crate::infrastructure::ports::{CheckoutPort, ClockPort, ExperienceRepo, LlmPort, MailerPort};
use crate::infrastructure::share::ShareLinkBuilder;
use crate::infrastructure::stripe::WebhookVerifier;
use crate::use_cases;

/// Main application state.
///
/// Holds the wired use cases plus the boundary pieces the HTTP layer
/// needs directly (webhook verification, the access gate, the clock).
/// Passed to handlers via Axum state.
pub struct App {
    pub use_cases: UseCases,
    pub experiences: Arc<dyn ExperienceRepo>,
    pub clock: Arc<dyn ClockPort>,
    pub webhook_verifier: WebhookVerifier,
    /// Shared code required on write-capable creator routes.
    pub access_code: String,
}

/// Container for all use cases.
pub struct UseCases {
    pub create_experience: use_cases::CreateExperience,
    pub save_experience: use_cases::SaveExperience,
    pub view_experience: use_cases::ViewExperience,
    pub chat_turn: use_cases::ChatTurn,
    pub start_checkout: use_cases::StartCheckout,
    pub fulfill_payment: use_cases::FulfillPayment,
}

impl App {
    /// Create a new App with all dependencies wired up.
    pub fn new(
        experiences: Arc<dyn ExperienceRepo>,
        llm: Arc<dyn LlmPort>,
        checkout: Arc<dyn CheckoutPort>,
        mailer: Arc<dyn MailerPort>,
        clock: Arc<dyn ClockPort>,
        share: ShareLinkBuilder,
        webhook_verifier: WebhookVerifier,
        access_code: String,
    ) -> Self {
        let use_cases = UseCases {
            create_experience: use_cases::CreateExperience::new(
                experiences.clone(),
                clock.clone(),
            ),
            save_experience: use_cases::SaveExperience::new(experiences.clone(), clock.clone()),
            view_experience: use_cases::ViewExperience::new(experiences.clone()),
            chat_turn: use_cases::ChatTurn::new(experiences.clone(), llm),
            start_checkout: use_cases::StartCheckout::new(
                experiences.clone(),
                checkout,
                share.clone(),
            ),
            fulfill_payment: use_cases::FulfillPayment::new(
                experiences.clone(),
                mailer,
                share,
            ),
        };

        Self {
            use_cases,
            experiences,
            clock,
            webhook_verifier,
            access_code,
        }
    }
}
