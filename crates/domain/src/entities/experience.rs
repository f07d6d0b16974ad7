//! Experience entity - one persisted puzzle gift artifact.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::value_objects::{GameData, DEFAULT_TEMPLATE};
use crate::ExperienceId;

/// One puzzle experience, keyed by its short id.
///
/// Lifecycle: `Draft` (created, editable) -> `Finalized` (creator attached
/// the real gift) -> `Paid` (payment confirmed, terminal for the flag).
/// The paid flag is monotonic; nothing ever sets it back to false.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Experience {
    pub id: ExperienceId,
    pub template_name: String,
    pub game_data: GameData,
    /// Free-form text revealed only after payment.
    pub real_gift: Option<String>,
    pub is_paid: bool,
    /// Buyer contact captured from the payment event, if present.
    pub recipient_email: Option<String>,
    /// Optimistic-concurrency token, bumped on every game data write.
    pub revision: i64,
    pub created_at: DateTime<Utc>,
    pub finalized_at: Option<DateTime<Utc>>,
}

impl Experience {
    /// Create a draft experience with a fresh id and the seed document.
    pub fn new(created_at: DateTime<Utc>) -> Self {
        Self {
            id: ExperienceId::new(),
            template_name: DEFAULT_TEMPLATE.to_string(),
            game_data: GameData::initial(),
            real_gift: None,
            is_paid: false,
            recipient_email: None,
            revision: 0,
            created_at,
            finalized_at: None,
        }
    }

    pub fn is_finalized(&self) -> bool {
        self.finalized_at.is_some()
    }

    /// Attach the real gift. Stamps `finalized_at` the first time only;
    /// later edits replace the gift text without moving the timestamp.
    pub fn finalize(&mut self, real_gift: impl Into<String>, at: DateTime<Utc>) {
        self.real_gift = Some(real_gift.into());
        if self.finalized_at.is_none() {
            self.finalized_at = Some(at);
        }
    }

    /// Flip the paid flag. Returns `true` on the first transition and
    /// `false` when already paid (repeated confirmations are no-ops).
    pub fn mark_paid(&mut self, recipient_email: Option<String>) -> bool {
        if self.is_paid {
            return false;
        }
        self.is_paid = true;
        if recipient_email.is_some() {
            self.recipient_email = recipient_email;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_experience_is_an_unpaid_draft() {
        let exp = Experience::new(Utc::now());
        assert!(!exp.is_paid);
        assert!(!exp.is_finalized());
        assert!(exp.real_gift.is_none());
        assert_eq!(exp.revision, 0);
        assert_eq!(exp.template_name, DEFAULT_TEMPLATE);
        assert!(exp.game_data.validate().is_ok());
    }

    #[test]
    fn finalize_stamps_timestamp_once() {
        let mut exp = Experience::new(Utc::now());
        let first = Utc::now();
        exp.finalize("A trip to the coast", first);
        assert_eq!(exp.finalized_at, Some(first));

        let later = first + chrono::Duration::hours(1);
        exp.finalize("A bigger trip", later);
        assert_eq!(exp.finalized_at, Some(first));
        assert_eq!(exp.real_gift.as_deref(), Some("A bigger trip"));
    }

    #[test]
    fn mark_paid_is_monotonic() {
        let mut exp = Experience::new(Utc::now());
        assert!(exp.mark_paid(Some("buyer@example.com".to_string())));
        assert!(exp.is_paid);
        assert_eq!(exp.recipient_email.as_deref(), Some("buyer@example.com"));

        // Second confirmation is a no-op and keeps the original contact.
        assert!(!exp.mark_paid(Some("other@example.com".to_string())));
        assert!(exp.is_paid);
        assert_eq!(exp.recipient_email.as_deref(), Some("buyer@example.com"));
    }
}
