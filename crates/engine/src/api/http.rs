//! HTTP routes.

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::HeaderMap,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use giftwrap_domain::{Experience, ExperienceId, GameData};

use crate::app::App;
use crate::infrastructure::stripe::WebhookEvent;
use crate::use_cases::chat::{ChatError, ChatTurnInput, HistoryEntry};
use crate::use_cases::checkout::CheckoutStartError;
use crate::use_cases::experience::{PlayView, SaveError, SaveRequest};

/// Header carrying the creator access code on write-capable routes.
const ACCESS_CODE_HEADER: &str = "x-access-code";

/// Header carrying the payment gateway signature on webhook calls.
const SIGNATURE_HEADER: &str = "stripe-signature";

/// Create all HTTP routes.
pub fn routes() -> Router<Arc<App>> {
    Router::new()
        .route("/", get(health))
        .route("/api/health", get(health))
        .route("/api/experiences", post(create_experience))
        .route(
            "/api/experiences/{id}",
            get(get_experience).put(save_experience),
        )
        .route("/api/experiences/{id}/chat", post(chat))
        .route("/api/experiences/{id}/play", get(play_experience))
        .route("/api/experiences/{id}/demo", get(demo_experience))
        .route("/api/experiences/{id}/checkout", post(start_checkout))
        .route("/api/webhooks/payment", post(payment_webhook))
}

async fn health() -> &'static str {
    "OK"
}

// =============================================================================
// Creator routes (access-gated)
// =============================================================================

async fn create_experience(
    State(app): State<Arc<App>>,
    headers: HeaderMap,
) -> Result<Json<Experience>, ApiError> {
    require_access(&app, &headers)?;
    let experience = app
        .use_cases
        .create_experience
        .execute()
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    Ok(Json(experience))
}

async fn get_experience(
    State(app): State<Arc<App>>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<Experience>, ApiError> {
    require_access(&app, &headers)?;
    let experience = app
        .experiences
        .get(ExperienceId::from_string(id))
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?
        .ok_or(ApiError::NotFound)?;
    Ok(Json(experience))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SaveExperienceRequest {
    game_data: Option<GameData>,
    revision: Option<i64>,
    real_gift: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SaveExperienceResponse {
    success: bool,
    revision: i64,
}

async fn save_experience(
    State(app): State<Arc<App>>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(request): Json<SaveExperienceRequest>,
) -> Result<Json<SaveExperienceResponse>, ApiError> {
    require_access(&app, &headers)?;
    let outcome = app
        .use_cases
        .save_experience
        .execute(
            ExperienceId::from_string(id),
            SaveRequest {
                game_data: request.game_data,
                revision: request.revision,
                real_gift: request.real_gift,
            },
        )
        .await
        .map_err(|e| match e {
            SaveError::NotFound => ApiError::NotFound,
            SaveError::Conflict => ApiError::Conflict("document was edited concurrently".into()),
            SaveError::Validation(e) => ApiError::BadRequest(e.to_string()),
            SaveError::Repo(e) => ApiError::Internal(e.to_string()),
        })?;

    Ok(Json(SaveExperienceResponse {
        success: true,
        revision: outcome.revision,
    }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChatRequest {
    message: String,
    /// Prior turns, oldest first; the client owns the history.
    #[serde(default)]
    history: Vec<HistoryEntry>,
    current_state: Option<GameData>,
    revision: Option<i64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ChatResponse {
    reply: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    new_state: Option<GameData>,
    #[serde(skip_serializing_if = "Option::is_none")]
    revision: Option<i64>,
}

async fn chat(
    State(app): State<Arc<App>>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    require_access(&app, &headers)?;
    let output = app
        .use_cases
        .chat_turn
        .execute(ChatTurnInput {
            experience_id: ExperienceId::from_string(id),
            message: request.message,
            history: request.history,
            current_state: request.current_state,
            revision: request.revision,
        })
        .await
        .map_err(|e| match e {
            ChatError::ExperienceNotFound => ApiError::NotFound,
            ChatError::Llm(e) => {
                tracing::error!(error = %e, "LLM call failed");
                ApiError::ModelUnavailable
            }
            other => ApiError::Internal(other.to_string()),
        })?;

    Ok(Json(ChatResponse {
        reply: output.reply,
        new_state: output.new_state,
        revision: output.revision,
    }))
}

// =============================================================================
// Player routes (public)
// =============================================================================

async fn play_experience(
    State(app): State<Arc<App>>,
    Path(id): Path<String>,
) -> Result<Json<PlayView>, ApiError> {
    resolve_view(&app, id, false).await
}

async fn demo_experience(
    State(app): State<Arc<App>>,
    Path(id): Path<String>,
) -> Result<Json<PlayView>, ApiError> {
    resolve_view(&app, id, true).await
}

async fn resolve_view(
    app: &App,
    id: String,
    force_demo: bool,
) -> Result<Json<PlayView>, ApiError> {
    let view = app
        .use_cases
        .view_experience
        .execute(ExperienceId::from_string(id), force_demo)
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?
        .ok_or(ApiError::NotFound)?;
    Ok(Json(view))
}

// =============================================================================
// Payment routes
// =============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CheckoutResponse {
    redirect_url: String,
}

async fn start_checkout(
    State(app): State<Arc<App>>,
    Path(id): Path<String>,
) -> Result<Json<CheckoutResponse>, ApiError> {
    let redirect_url = app
        .use_cases
        .start_checkout
        .execute(ExperienceId::from_string(id))
        .await
        .map_err(|e| match e {
            CheckoutStartError::NotFound => ApiError::NotFound,
            CheckoutStartError::Payment(e) => {
                tracing::error!(error = %e, "checkout session creation failed");
                ApiError::Internal(e.to_string())
            }
            CheckoutStartError::Repo(e) => ApiError::Internal(e.to_string()),
        })?;
    Ok(Json(CheckoutResponse { redirect_url }))
}

#[derive(Debug, Serialize)]
struct WebhookAck {
    success: bool,
}

/// Payment confirmation webhook.
///
/// The signature over the raw body is the trust boundary; nothing is
/// read from the payload before it verifies. Duplicate, unknown-id and
/// delivery-side faults all acknowledge with 200 so the gateway does not
/// retry.
async fn payment_webhook(
    State(app): State<Arc<App>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<WebhookAck>, ApiError> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::BadRequest("missing signature header".into()))?;

    let event = app
        .webhook_verifier
        .verify_and_parse(&body, signature, app.clock.now())
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;

    match event {
        WebhookEvent::CheckoutCompleted(confirmation) => {
            app.use_cases
                .fulfill_payment
                .execute(confirmation)
                .await
                .map_err(|e| ApiError::Internal(e.to_string()))?;
        }
        WebhookEvent::Other { event_type } => {
            tracing::debug!(event_type, "ignoring webhook event type");
        }
    }

    Ok(Json(WebhookAck { success: true }))
}

// =============================================================================
// Access gate
// =============================================================================

fn require_access(app: &App, headers: &HeaderMap) -> Result<(), ApiError> {
    let supplied = headers
        .get(ACCESS_CODE_HEADER)
        .and_then(|v| v.to_str().ok());
    if supplied == Some(app.access_code.as_str()) {
        Ok(())
    } else {
        Err(ApiError::Unauthorized)
    }
}

// =============================================================================
// Error mapping
// =============================================================================

#[derive(Debug)]
pub enum ApiError {
    NotFound,
    Unauthorized,
    BadRequest(String),
    Conflict(String),
    /// The generative model could not be reached; the creator should retry.
    ModelUnavailable,
    Internal(String),
}

impl axum::response::IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        match self {
            ApiError::NotFound => {
                (axum::http::StatusCode::NOT_FOUND, "Not found").into_response()
            }
            ApiError::Unauthorized => {
                (axum::http::StatusCode::UNAUTHORIZED, "Unauthorized").into_response()
            }
            ApiError::BadRequest(msg) => {
                (axum::http::StatusCode::BAD_REQUEST, msg).into_response()
            }
            ApiError::Conflict(msg) => {
                (axum::http::StatusCode::CONFLICT, msg).into_response()
            }
            ApiError::ModelUnavailable => (
                axum::http::StatusCode::BAD_GATEWAY,
                "The creative director is unreachable right now. Try again in a moment.",
            )
                .into_response(),
            ApiError::Internal(_) => (
                axum::http::StatusCode::INTERNAL_SERVER_ERROR,
                "Internal error",
            )
                .into_response(),
        }
    }
}

impl From<crate::infrastructure::ports::RepoError> for ApiError {
    fn from(e: crate::infrastructure::ports::RepoError) -> Self {
        ApiError::Internal(e.to_string())
    }
}
