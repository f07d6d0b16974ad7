//! Stripe payment gateway adapter.
//!
//! Outbound: checkout-session creation against the form-encoded REST API.
//! Inbound: webhook signature verification (`Stripe-Signature` header,
//! HMAC-SHA256 over `"{timestamp}.{raw body}"`) and event payload parsing.

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use hmac::{Hmac, Mac};
use reqwest::Client;
use serde::Deserialize;
use sha2::Sha256;
use std::time::Duration;

use crate::infrastructure::ports::{
    CheckoutPort, CheckoutRequest, CheckoutSession, PaymentConfirmation, PaymentError,
};

type HmacSha256 = Hmac<Sha256>;

/// Default Stripe API base URL.
pub const DEFAULT_STRIPE_BASE_URL: &str = "https://api.stripe.com";

/// Webhook event type that confirms a completed payment.
pub const CHECKOUT_COMPLETED: &str = "checkout.session.completed";

/// Maximum accepted distance between the signature timestamp and now.
const SIGNATURE_TOLERANCE_SECS: i64 = 300;

// =============================================================================
// Outbound: checkout sessions
// =============================================================================

/// Client for creating Stripe checkout sessions.
#[derive(Clone)]
pub struct StripeClient {
    client: Client,
    base_url: String,
    secret_key: String,
}

impl StripeClient {
    pub fn new(secret_key: &str) -> Self {
        Self::with_base_url(secret_key, DEFAULT_STRIPE_BASE_URL)
    }

    /// Point the client at a different endpoint (for testing).
    pub fn with_base_url(secret_key: &str, base_url: &str) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            secret_key: secret_key.to_string(),
        }
    }
}

#[async_trait]
impl CheckoutPort for StripeClient {
    async fn create_session(
        &self,
        request: CheckoutRequest,
    ) -> Result<CheckoutSession, PaymentError> {
        let mut form: Vec<(String, String)> = vec![
            ("mode".to_string(), "payment".to_string()),
            (
                "payment_method_types[0]".to_string(),
                "card".to_string(),
            ),
            (
                "line_items[0][price_data][currency]".to_string(),
                request.currency,
            ),
            (
                "line_items[0][price_data][product_data][name]".to_string(),
                request.product_name,
            ),
            (
                "line_items[0][price_data][unit_amount]".to_string(),
                request.amount_minor.to_string(),
            ),
            ("line_items[0][quantity]".to_string(), "1".to_string()),
            ("success_url".to_string(), request.success_url),
            ("cancel_url".to_string(), request.cancel_url),
        ];
        for (key, value) in request.metadata {
            form.push((format!("metadata[{key}]"), value));
        }

        let response = self
            .client
            .post(format!("{}/v1/checkout/sessions", self.base_url))
            .bearer_auth(&self.secret_key)
            .form(&form)
            .send()
            .await
            .map_err(|e| PaymentError::RequestFailed(e.to_string()))?;

        if !response.status().is_success() {
            let error_text = response
                .text()
                .await
                .map_err(|e| PaymentError::RequestFailed(e.to_string()))?;
            return Err(PaymentError::RequestFailed(error_text));
        }

        let session: SessionResponse = response
            .json()
            .await
            .map_err(|e| PaymentError::InvalidResponse(e.to_string()))?;

        let url = session
            .url
            .ok_or_else(|| PaymentError::InvalidResponse("session has no redirect URL".into()))?;

        Ok(CheckoutSession { url })
    }
}

#[derive(Debug, Deserialize)]
struct SessionResponse {
    url: Option<String>,
}

// =============================================================================
// Inbound: webhook verification
// =============================================================================

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum WebhookError {
    #[error("Malformed signature header")]
    MalformedHeader,
    #[error("Signature timestamp outside tolerance")]
    StaleTimestamp,
    #[error("Signature mismatch")]
    SignatureMismatch,
    #[error("Malformed event payload: {0}")]
    Payload(String),
}

/// A parsed, signature-verified webhook event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookEvent {
    /// A completed checkout, ready for the fulfillment pipeline.
    CheckoutCompleted(PaymentConfirmation),
    /// Any other event type; acknowledged without action.
    Other { event_type: String },
}

/// Verifies `Stripe-Signature` headers against the shared endpoint secret.
#[derive(Clone)]
pub struct WebhookVerifier {
    secret: String,
}

impl WebhookVerifier {
    pub fn new(secret: &str) -> Self {
        Self {
            secret: secret.to_string(),
        }
    }

    /// Verify the signature over the raw body, then parse the event.
    ///
    /// Nothing about the payload is trusted before the HMAC check passes;
    /// callers must reject with a client error on any `WebhookError`.
    pub fn verify_and_parse(
        &self,
        payload: &[u8],
        signature_header: &str,
        now: DateTime<Utc>,
    ) -> Result<WebhookEvent, WebhookError> {
        let (timestamp, candidates) = parse_signature_header(signature_header)?;

        let age = (now - timestamp).num_seconds().abs();
        if age > SIGNATURE_TOLERANCE_SECS {
            return Err(WebhookError::StaleTimestamp);
        }

        let ts_prefix = format!("{}.", timestamp.timestamp());
        let verified = candidates.iter().any(|candidate| {
            let Ok(expected) = hex::decode(candidate) else {
                return false;
            };
            let Ok(mut mac) = HmacSha256::new_from_slice(self.secret.as_bytes()) else {
                return false;
            };
            mac.update(ts_prefix.as_bytes());
            mac.update(payload);
            mac.verify_slice(&expected).is_ok()
        });
        if !verified {
            return Err(WebhookError::SignatureMismatch);
        }

        parse_event(payload)
    }
}

/// Split a `t=<unix>,v1=<hex>[,v1=<hex>...]` header into its parts.
fn parse_signature_header(
    header: &str,
) -> Result<(DateTime<Utc>, Vec<String>), WebhookError> {
    let mut timestamp = None;
    let mut candidates = Vec::new();

    for item in header.split(',') {
        let Some((key, value)) = item.trim().split_once('=') else {
            continue;
        };
        match key {
            "t" => {
                let secs: i64 = value.parse().map_err(|_| WebhookError::MalformedHeader)?;
                timestamp = Utc.timestamp_opt(secs, 0).single();
            }
            "v1" => candidates.push(value.to_string()),
            _ => {}
        }
    }

    match (timestamp, candidates.is_empty()) {
        (Some(ts), false) => Ok((ts, candidates)),
        _ => Err(WebhookError::MalformedHeader),
    }
}

fn parse_event(payload: &[u8]) -> Result<WebhookEvent, WebhookError> {
    let event: EventPayload =
        serde_json::from_slice(payload).map_err(|e| WebhookError::Payload(e.to_string()))?;

    if event.event_type != CHECKOUT_COMPLETED {
        return Ok(WebhookEvent::Other {
            event_type: event.event_type,
        });
    }

    let object = event.data.map(|d| d.object).unwrap_or_default();
    let recipient_email = object
        .customer_details
        .and_then(|d| d.email)
        .or(object.customer_email);

    Ok(WebhookEvent::CheckoutCompleted(PaymentConfirmation {
        experience_id: object.metadata.and_then(|m| m.experience_id),
        recipient_email,
    }))
}

#[derive(Debug, Deserialize)]
struct EventPayload {
    #[serde(rename = "type")]
    event_type: String,
    data: Option<EventData>,
}

#[derive(Debug, Deserialize)]
struct EventData {
    object: EventObject,
}

#[derive(Debug, Default, Deserialize)]
struct EventObject {
    metadata: Option<EventMetadata>,
    customer_details: Option<CustomerDetails>,
    customer_email: Option<String>,
}

#[derive(Debug, Deserialize)]
struct EventMetadata {
    experience_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CustomerDetails {
    email: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "whsec_test_secret";

    fn sign(payload: &[u8], secret: &str, timestamp: i64) -> String {
        let mut mac =
            HmacSha256::new_from_slice(secret.as_bytes()).expect("hmac accepts any key length");
        mac.update(format!("{timestamp}.").as_bytes());
        mac.update(payload);
        let digest = hex::encode(mac.finalize().into_bytes());
        format!("t={timestamp},v1={digest}")
    }

    fn completed_event(id: &str) -> Vec<u8> {
        serde_json::json!({
            "type": CHECKOUT_COMPLETED,
            "data": {
                "object": {
                    "metadata": {"experience_id": id},
                    "customer_details": {"email": "buyer@example.com"}
                }
            }
        })
        .to_string()
        .into_bytes()
    }

    #[test]
    fn accepts_a_valid_signature() {
        let now = Utc::now();
        let payload = completed_event("ab12cd34");
        let header = sign(&payload, SECRET, now.timestamp());

        let event = WebhookVerifier::new(SECRET)
            .verify_and_parse(&payload, &header, now)
            .expect("verification");

        assert_eq!(
            event,
            WebhookEvent::CheckoutCompleted(PaymentConfirmation {
                experience_id: Some("ab12cd34".to_string()),
                recipient_email: Some("buyer@example.com".to_string()),
            })
        );
    }

    #[test]
    fn rejects_a_tampered_body() {
        let now = Utc::now();
        let payload = completed_event("ab12cd34");
        let header = sign(&payload, SECRET, now.timestamp());

        let tampered = completed_event("zz99zz99");
        let result = WebhookVerifier::new(SECRET).verify_and_parse(&tampered, &header, now);
        assert_eq!(result, Err(WebhookError::SignatureMismatch));
    }

    #[test]
    fn rejects_the_wrong_secret() {
        let now = Utc::now();
        let payload = completed_event("ab12cd34");
        let header = sign(&payload, "whsec_other", now.timestamp());

        let result = WebhookVerifier::new(SECRET).verify_and_parse(&payload, &header, now);
        assert_eq!(result, Err(WebhookError::SignatureMismatch));
    }

    #[test]
    fn rejects_a_stale_timestamp() {
        let now = Utc::now();
        let stale = now.timestamp() - SIGNATURE_TOLERANCE_SECS - 10;
        let payload = completed_event("ab12cd34");
        let header = sign(&payload, SECRET, stale);

        let result = WebhookVerifier::new(SECRET).verify_and_parse(&payload, &header, now);
        assert_eq!(result, Err(WebhookError::StaleTimestamp));
    }

    #[test]
    fn rejects_a_malformed_header() {
        let now = Utc::now();
        let payload = completed_event("ab12cd34");

        let result = WebhookVerifier::new(SECRET).verify_and_parse(&payload, "garbage", now);
        assert_eq!(result, Err(WebhookError::MalformedHeader));
    }

    #[test]
    fn other_event_types_parse_as_other() {
        let now = Utc::now();
        let payload = serde_json::json!({"type": "invoice.paid", "data": {"object": {}}})
            .to_string()
            .into_bytes();
        let header = sign(&payload, SECRET, now.timestamp());

        let event = WebhookVerifier::new(SECRET)
            .verify_and_parse(&payload, &header, now)
            .expect("verification");
        assert_eq!(
            event,
            WebhookEvent::Other {
                event_type: "invoice.paid".to_string()
            }
        );
    }

    #[test]
    fn missing_metadata_yields_no_experience_id() {
        let now = Utc::now();
        let payload = serde_json::json!({
            "type": CHECKOUT_COMPLETED,
            "data": {"object": {"customer_email": "buyer@example.com"}}
        })
        .to_string()
        .into_bytes();
        let header = sign(&payload, SECRET, now.timestamp());

        let event = WebhookVerifier::new(SECRET)
            .verify_and_parse(&payload, &header, now)
            .expect("verification");
        assert_eq!(
            event,
            WebhookEvent::CheckoutCompleted(PaymentConfirmation {
                experience_id: None,
                recipient_email: Some("buyer@example.com".to_string()),
            })
        );
    }

    #[test]
    fn extra_v1_candidates_are_tried() {
        let now = Utc::now();
        let payload = completed_event("ab12cd34");
        let good = sign(&payload, SECRET, now.timestamp());
        // Prepend a bogus candidate before the valid one.
        let header = good.replace(",v1=", ",v1=deadbeef,v1=");

        let result = WebhookVerifier::new(SECRET).verify_and_parse(&payload, &header, now);
        assert!(result.is_ok());
    }
}
