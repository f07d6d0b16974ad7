//! Payment fulfillment pipeline.
//!
//! Runs on every verified payment confirmation. The paid transition is a
//! datastore compare-and-set, so replayed or concurrent confirmations
//! produce exactly one delivery. Delivery itself is best-effort: a mail
//! failure is logged and never rolls back the committed transition, and
//! the webhook is acknowledged either way.

use std::sync::Arc;

use giftwrap_domain::{AnswerKey, Experience, ExperienceId};

use crate::infrastructure::ports::{
    ExperienceRepo, InlineAttachment, MailerPort, OutboundEmail, PaymentConfirmation, RepoError,
};
use crate::infrastructure::share::ShareLinkBuilder;

/// Content-id the HTML body uses to reference the inline QR image.
const QR_CONTENT_ID: &str = "qr-code";

/// What a confirmation event amounted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FulfillmentOutcome {
    /// Event carried no experience id; acknowledged without action.
    NotApplicable,
    /// No record for the id; acknowledged without action.
    UnknownExperience,
    /// Paid flag was already set; no side effect repeated.
    AlreadyPaid,
    /// Paid flag flipped by this event.
    Fulfilled {
        /// Whether the delivery mail went out.
        delivery_dispatched: bool,
    },
}

/// Fulfillment pipeline use case.
pub struct FulfillPayment {
    experiences: Arc<dyn ExperienceRepo>,
    mailer: Arc<dyn MailerPort>,
    share: ShareLinkBuilder,
}

impl FulfillPayment {
    pub fn new(
        experiences: Arc<dyn ExperienceRepo>,
        mailer: Arc<dyn MailerPort>,
        share: ShareLinkBuilder,
    ) -> Self {
        Self {
            experiences,
            mailer,
            share,
        }
    }

    /// Process one verified confirmation.
    ///
    /// Only a storage failure is an error; every other path acknowledges
    /// the event (the gateway must not retry on delivery-side faults).
    pub async fn execute(
        &self,
        confirmation: PaymentConfirmation,
    ) -> Result<FulfillmentOutcome, RepoError> {
        let Some(id) = confirmation.experience_id else {
            tracing::debug!("confirmation without experience metadata; ignoring");
            return Ok(FulfillmentOutcome::NotApplicable);
        };
        let id = ExperienceId::from_string(id);

        let Some(record) = self.experiences.get(id.clone()).await? else {
            tracing::warn!(experience_id = %id, "confirmation for unknown experience; ignoring");
            return Ok(FulfillmentOutcome::UnknownExperience);
        };

        // The conditional update is the idempotency guard; this earlier
        // read only feeds the delivery content.
        let transitioned = match self
            .experiences
            .mark_paid(id.clone(), confirmation.recipient_email.clone())
            .await
        {
            Ok(transitioned) => transitioned,
            Err(RepoError::NotFound) => return Ok(FulfillmentOutcome::UnknownExperience),
            Err(e) => return Err(e),
        };
        if !transitioned {
            tracing::info!(experience_id = %id, "repeated confirmation; already paid");
            return Ok(FulfillmentOutcome::AlreadyPaid);
        }

        tracing::info!(experience_id = %id, "payment confirmed; experience unlocked");

        let recipient = confirmation
            .recipient_email
            .or_else(|| record.recipient_email.clone());
        let delivery_dispatched = self.dispatch_delivery(&id, &record, recipient).await;

        Ok(FulfillmentOutcome::Fulfilled {
            delivery_dispatched,
        })
    }

    /// Best-effort delivery. Returns whether the mail went out.
    async fn dispatch_delivery(
        &self,
        id: &ExperienceId,
        record: &Experience,
        recipient: Option<String>,
    ) -> bool {
        let Some(recipient) = recipient else {
            tracing::warn!(experience_id = %id, "no recipient contact; skipping delivery");
            return false;
        };

        let answer_key = AnswerKey::from_game_data(&record.game_data);

        // A QR render failure downgrades to a link-only mail.
        let (play_url, attachment) = match self.share.build(id) {
            Ok(artifacts) => (
                artifacts.play_url,
                Some(InlineAttachment {
                    filename: "experience-qr.png".to_string(),
                    content_id: QR_CONTENT_ID.to_string(),
                    content_type: "image/png".to_string(),
                    data: artifacts.qr_png,
                }),
            ),
            Err(e) => {
                tracing::error!(experience_id = %id, error = %e, "QR rendering failed");
                (self.share.play_url(id), None)
            }
        };

        let email = OutboundEmail {
            to: recipient,
            subject: format!("Your experience is ready: {}", record.game_data.title),
            html_body: delivery_body(
                &record.game_data.title,
                &play_url,
                &answer_key,
                attachment.is_some(),
            ),
            inline_attachment: attachment,
        };

        match self.mailer.send(email).await {
            Ok(()) => true,
            Err(e) => {
                // Paid stays committed; delivery is retriable out of band.
                tracing::error!(experience_id = %id, error = %e, "delivery dispatch failed");
                false
            }
        }
    }
}

fn delivery_body(title: &str, play_url: &str, answer_key: &AnswerKey, with_qr: bool) -> String {
    let mut body = format!(
        "<h1>{title}</h1>\
         <p>The experience is unlocked. Share this link with the player:</p>\
         <p><a href=\"{play_url}\">{play_url}</a></p>"
    );

    if with_qr {
        body.push_str(&format!(
            "<p><img src=\"cid:{QR_CONTENT_ID}\" alt=\"Scan to play\" width=\"240\"></p>"
        ));
    }

    body.push_str("<h2>Answer key</h2>");
    if answer_key.is_empty() {
        body.push_str("<p>No levels were found; the answer key is unavailable.</p>");
    } else {
        body.push_str("<ol>");
        for entry in &answer_key.entries {
            body.push_str(&format!(
                "<li><strong>{}</strong>: {}</li>",
                entry.title, entry.answer
            ));
        }
        body.push_str("</ol>");
    }

    body
}
