//! Delivery mail client (HTTP mail API, Resend-compatible).

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;

use crate::infrastructure::ports::{MailError, MailerPort, OutboundEmail};

/// Default mail API base URL.
pub const DEFAULT_MAIL_API_URL: &str = "https://api.resend.com";

/// Client for an HTTP mail API with inline-attachment support.
#[derive(Clone)]
pub struct HttpMailer {
    client: Client,
    base_url: String,
    api_key: String,
    from: String,
}

impl HttpMailer {
    pub fn new(base_url: &str, api_key: &str, from: &str) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            from: from.to_string(),
        }
    }
}

#[async_trait]
impl MailerPort for HttpMailer {
    async fn send(&self, email: OutboundEmail) -> Result<(), MailError> {
        let attachments = email
            .inline_attachment
            .map(|a| {
                vec![ApiAttachment {
                    filename: a.filename,
                    content: BASE64.encode(&a.data),
                    content_type: a.content_type,
                    content_id: Some(a.content_id),
                }]
            })
            .unwrap_or_default();

        let api_request = SendRequest {
            from: self.from.clone(),
            to: vec![email.to],
            subject: email.subject,
            html: email.html_body,
            attachments,
        };

        let response = self
            .client
            .post(format!("{}/emails", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&api_request)
            .send()
            .await
            .map_err(|e| MailError::DispatchFailed(e.to_string()))?;

        if !response.status().is_success() {
            let error_text = response
                .text()
                .await
                .map_err(|e| MailError::DispatchFailed(e.to_string()))?;
            return Err(MailError::DispatchFailed(error_text));
        }

        Ok(())
    }
}

// =============================================================================
// Mail API types
// =============================================================================

#[derive(Debug, Serialize)]
struct SendRequest {
    from: String,
    to: Vec<String>,
    subject: String,
    html: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    attachments: Vec<ApiAttachment>,
}

#[derive(Debug, Serialize)]
struct ApiAttachment {
    filename: String,
    content: String,
    content_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    content_id: Option<String>,
}
