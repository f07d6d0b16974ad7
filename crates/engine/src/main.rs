//! GiftWrap Engine - Main entry point.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use giftwrap_engine::api;
use giftwrap_engine::app::App;
use giftwrap_engine::infrastructure::{
    clock::SystemClock,
    llm::{ChatCompletionsClient, DEFAULT_LLM_BASE_URL, DEFAULT_LLM_MODEL},
    mailer::{HttpMailer, DEFAULT_MAIL_API_URL},
    persistence::SqliteExperienceRepo,
    share::ShareLinkBuilder,
    stripe::{StripeClient, WebhookVerifier},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "giftwrap_engine=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting GiftWrap Engine");

    // Load configuration
    let database_path =
        std::env::var("DATABASE_PATH").unwrap_or_else(|_| "giftwrap.db".into());
    let llm_base_url =
        std::env::var("LLM_BASE_URL").unwrap_or_else(|_| DEFAULT_LLM_BASE_URL.into());
    let llm_model = std::env::var("LLM_MODEL").unwrap_or_else(|_| DEFAULT_LLM_MODEL.into());
    let llm_api_key = std::env::var("LLM_API_KEY").ok();
    let stripe_secret_key =
        std::env::var("STRIPE_SECRET_KEY").context("STRIPE_SECRET_KEY must be set")?;
    let stripe_webhook_secret =
        std::env::var("STRIPE_WEBHOOK_SECRET").context("STRIPE_WEBHOOK_SECRET must be set")?;
    let mail_api_url =
        std::env::var("MAIL_API_URL").unwrap_or_else(|_| DEFAULT_MAIL_API_URL.into());
    let mail_api_key = std::env::var("MAIL_API_KEY").context("MAIL_API_KEY must be set")?;
    let mail_from = std::env::var("MAIL_FROM")
        .unwrap_or_else(|_| "GiftWrap <experiences@giftwrap.example>".into());
    let public_base_url =
        std::env::var("PUBLIC_BASE_URL").unwrap_or_else(|_| "http://localhost:3000".into());
    let access_code = std::env::var("ACCESS_CODE").context("ACCESS_CODE must be set")?;
    let server_host = std::env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".into());
    let server_port: u16 = std::env::var("SERVER_PORT")
        .or_else(|_| std::env::var("PORT"))
        .unwrap_or_else(|_| "3000".into())
        .parse()
        .unwrap_or(3000);

    // Open the store
    tracing::info!("Opening experience store at {}", database_path);
    let experiences = Arc::new(SqliteExperienceRepo::new(&database_path).await?);

    // Create infrastructure clients
    let llm = Arc::new(ChatCompletionsClient::new(
        &llm_base_url,
        &llm_model,
        llm_api_key,
    ));
    let checkout = Arc::new(StripeClient::new(&stripe_secret_key));
    let mailer = Arc::new(HttpMailer::new(&mail_api_url, &mail_api_key, &mail_from));
    let clock = Arc::new(SystemClock::new());
    let share = ShareLinkBuilder::new(&public_base_url);
    let webhook_verifier = WebhookVerifier::new(&stripe_webhook_secret);

    // Create application
    let app = Arc::new(App::new(
        experiences,
        llm,
        checkout,
        mailer,
        clock,
        share,
        webhook_verifier,
        access_code,
    ));

    // Build router
    let router = api::routes()
        .with_state(app)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        );

    // Start server
    let addr: SocketAddr = format!("{server_host}:{server_port}").parse()?;
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router).await?;

    Ok(())
}
