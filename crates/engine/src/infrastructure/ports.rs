//! Port traits for infrastructure boundaries.
//!
//! These are the ONLY abstractions in the engine. Everything else is
//! concrete types. Ports exist for:
//! - Experience storage (could swap SQLite -> Postgres)
//! - LLM calls (could swap the chat-completions endpoint)
//! - Checkout session creation (payment gateway)
//! - Delivery mail dispatch
//! - Clock (for testing)

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use giftwrap_domain::{Experience, ExperienceId, GameData};

// =============================================================================
// Error Types
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    #[error("Not found")]
    NotFound,
    /// Versioned write lost the race: the stored revision moved on.
    #[error("Revision conflict")]
    Conflict,
    #[error("Database error: {0}")]
    Database(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
}

#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("LLM request failed: {0}")]
    RequestFailed(String),
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

#[derive(Debug, thiserror::Error)]
pub enum PaymentError {
    #[error("Payment gateway request failed: {0}")]
    RequestFailed(String),
    #[error("Invalid gateway response: {0}")]
    InvalidResponse(String),
}

#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("Mail dispatch failed: {0}")]
    DispatchFailed(String),
}

// =============================================================================
// Experience storage
// =============================================================================

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ExperienceRepo: Send + Sync {
    async fn get(&self, id: ExperienceId) -> Result<Option<Experience>, RepoError>;

    async fn insert(&self, experience: Experience) -> Result<(), RepoError>;

    /// Replace the structured state wholesale, guarded by the revision
    /// token. Returns the new revision, or [`RepoError::Conflict`] when
    /// `expected_revision` no longer matches the stored one.
    async fn update_game_data(
        &self,
        id: ExperienceId,
        data: GameData,
        expected_revision: i64,
    ) -> Result<i64, RepoError>;

    /// Attach the delivery payload. Stamps `finalized_at` only the first
    /// time a gift is attached.
    async fn set_real_gift(
        &self,
        id: ExperienceId,
        real_gift: String,
        finalized_at: DateTime<Utc>,
    ) -> Result<(), RepoError>;

    /// Atomic false->true transition of the paid flag (compare-and-set at
    /// the datastore). Returns `true` iff this call performed the
    /// transition; concurrent callers cannot both see `true`.
    async fn mark_paid(
        &self,
        id: ExperienceId,
        recipient_email: Option<String>,
    ) -> Result<bool, RepoError>;
}

// =============================================================================
// LLM port
// =============================================================================

/// LLM request type
#[derive(Debug, Clone)]
pub struct LlmRequest {
    /// The conversation history
    pub messages: Vec<ChatMessage>,
    /// System prompt / context
    pub system_prompt: Option<String>,
    /// Temperature for response generation (0.0 - 2.0)
    pub temperature: Option<f32>,
    /// Maximum tokens to generate
    pub max_tokens: Option<u32>,
}

impl LlmRequest {
    pub fn new(messages: Vec<ChatMessage>) -> Self {
        Self {
            messages,
            system_prompt: None,
            temperature: None,
            max_tokens: None,
        }
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    pub fn with_temperature(mut self, temp: f32) -> Self {
        self.temperature = Some(temp);
        self
    }
}

/// A message in the conversation
#[derive(Debug, Clone)]
pub struct ChatMessage {
    pub role: MessageRole,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
        }
    }
}

/// Role of a message sender
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageRole {
    User,
    Assistant,
    System,
}

/// Response from the LLM
#[derive(Debug, Clone)]
pub struct LlmResponse {
    /// The generated text content
    pub content: String,
    /// Token usage, when the service reports it
    pub usage: Option<TokenUsage>,
}

/// Token usage information
#[derive(Debug, Clone)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LlmPort: Send + Sync {
    async fn generate(&self, request: LlmRequest) -> Result<LlmResponse, LlmError>;
}

// =============================================================================
// Payment gateway port (outbound)
// =============================================================================

/// Parameters for a checkout session.
#[derive(Debug, Clone)]
pub struct CheckoutRequest {
    /// Price in minor units (cents).
    pub amount_minor: i64,
    pub currency: String,
    pub product_name: String,
    pub success_url: String,
    pub cancel_url: String,
    /// Opaque metadata echoed back on the confirmation webhook.
    pub metadata: Vec<(String, String)>,
}

/// A created checkout session the buyer is redirected to.
#[derive(Debug, Clone)]
pub struct CheckoutSession {
    pub url: String,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CheckoutPort: Send + Sync {
    async fn create_session(&self, request: CheckoutRequest)
        -> Result<CheckoutSession, PaymentError>;
}

/// A verified, gateway-neutral payment confirmation handed to the
/// fulfillment pipeline. Signature checking happens at the API boundary
/// before one of these is constructed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentConfirmation {
    /// Experience id carried in the event metadata, when present.
    pub experience_id: Option<String>,
    /// Buyer contact captured by the gateway, when present.
    pub recipient_email: Option<String>,
}

// =============================================================================
// Delivery mail port
// =============================================================================

/// An image attached inline to a delivery mail, referenced from the HTML
/// body by content-id.
#[derive(Debug, Clone)]
pub struct InlineAttachment {
    pub filename: String,
    pub content_id: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

/// One outbound delivery message.
#[derive(Debug, Clone)]
pub struct OutboundEmail {
    pub to: String,
    pub subject: String,
    pub html_body: String,
    pub inline_attachment: Option<InlineAttachment>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MailerPort: Send + Sync {
    async fn send(&self, email: OutboundEmail) -> Result<(), MailError>;
}

// =============================================================================
// Testability Ports
// =============================================================================

#[cfg_attr(test, mockall::automock)]
pub trait ClockPort: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}
